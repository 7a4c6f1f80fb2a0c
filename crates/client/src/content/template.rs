//! Exhibition layout templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Layout template applied to an exhibition. Photos always use `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Template {
    #[default]
    Default,
    Classic,
    Grey,
    Art,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Default,
        Template::Classic,
        Template::Grey,
        Template::Art,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Template::Default => "default",
            Template::Classic => "classic",
            Template::Grey => "grey",
            Template::Art => "art",
        }
    }

    /// Resolve a stored key, falling back to `Default` for unknown ones.
    pub fn from_key_lossy(key: &str) -> Self {
        key.parse().unwrap_or_default()
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Template {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Template::ALL
            .into_iter()
            .find(|t| t.key().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown template '{s}'"))
    }
}

impl Serialize for Template {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Template {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = Option::<String>::deserialize(deserializer)?;
        Ok(key.as_deref().map(Template::from_key_lossy).unwrap_or_default())
    }
}
