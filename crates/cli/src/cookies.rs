//! Cookie jar persistence between invocations.
//!
//! Only name/value pairs for the API origin are kept; the server re-issues
//! attributes on every refresh.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use tracing::debug;
use url::Url;

/// Load cookies saved by [`save`] into a fresh jar.
pub fn load(path: &Path, origin: &Url) -> Result<Arc<Jar>> {
    let jar = Arc::new(Jar::default());
    let contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(jar),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read {}", path.display()));
        }
    };

    let mut count = 0;
    for pair in contents.lines().map(str::trim).filter(|l| !l.is_empty()) {
        jar.add_cookie_str(&format!("{pair}; Path=/"), origin);
        count += 1;
    }
    debug!(count, "cookies restored");
    Ok(jar)
}

/// Write the jar's cookies for `origin`, one `name=value` pair per line.
pub fn save(jar: &Jar, path: &Path, origin: &Url) -> Result<()> {
    let pairs = jar
        .cookies(origin)
        .and_then(|header| header.to_str().ok().map(str::to_string))
        .unwrap_or_default();

    let lines: Vec<&str> = pairs
        .split(';')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, lines.join("\n"))
        .with_context(|| format!("failed to write {}", path.display()))?;
    debug!(count = lines.len(), "cookies saved");
    Ok(())
}
