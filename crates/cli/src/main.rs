//! Photo gallery command line client.
//!
//! Usage:
//!   gallery login --email kim@mail.com --password ****
//!   gallery publish --title "Harbour" --exhibition --image a.jpg --image b.jpg --text 1:left="low tide"

mod cookies;
mod render;

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use gallery_client::editor::InMemoryPreviews;
use gallery_client::gateway::LoginRedirect;
use gallery_client::models::LikeTarget;
use gallery_client::{
    Align, Editor, EditorMode, GalleryClient, GalleryConfig, JoinRequest, LocalImage,
    MediaInsertion, ReqwestTransport, Template,
};
use tracing::{debug, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Photo gallery client.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GALLERY_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session.
    Logout,
    /// Create an account.
    Join {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GALLERY_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        nickname: String,
    },
    /// Print the URL that starts a social login.
    OauthUrl { provider: String },
    /// Finish a social login once the provider has redirected back.
    OauthComplete,
    /// Show the signed-in user.
    Whoami,
    /// List exhibitions and photos.
    Feed,
    /// Show a photo.
    Photo { id: i64 },
    /// Show an exhibition.
    Exhibition { id: i64 },
    /// Show a user's public archive.
    User { id: i64 },
    /// Show or toggle a like.
    Like {
        kind: Kind,
        id: i64,
        #[arg(long)]
        toggle: bool,
    },
    /// List comments on a photo.
    Comments { photo_id: i64 },
    /// Comment on a photo.
    Comment { photo_id: i64, content: String },
    /// Delete one of your comments.
    DeleteComment { id: i64 },
    /// Delete one of your photos or exhibitions.
    Delete { kind: Kind, id: i64 },
    /// Upload a photo, or several as an exhibition.
    Publish {
        #[arg(long)]
        title: String,
        /// Image file; repeat for an exhibition.
        #[arg(long = "image", required = true)]
        images: Vec<PathBuf>,
        /// Publish as an exhibition.
        #[arg(long)]
        exhibition: bool,
        /// Exhibition template.
        #[arg(long, default_value = "default")]
        template: Template,
        /// Text block as SLOT[:ALIGN]=TEXT; slot 0 precedes the first image.
        #[arg(long = "text")]
        texts: Vec<TextArg>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Photo,
    Exhibition,
}

impl Kind {
    fn target(self, id: i64) -> LikeTarget {
        match self {
            Kind::Photo => LikeTarget::Photo(id),
            Kind::Exhibition => LikeTarget::Exhibition(id),
        }
    }
}

/// A `--text` argument.
#[derive(Clone, Debug, PartialEq)]
struct TextArg {
    slot: usize,
    align: Align,
    text: String,
}

impl FromStr for TextArg {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (key, text) = s
            .split_once('=')
            .ok_or_else(|| format!("expected SLOT[:ALIGN]=TEXT, got '{s}'"))?;
        let (slot, align) = match key.split_once(':') {
            Some((slot, align)) => (slot, align.parse()?),
            None => (key, Align::Center),
        };
        let slot = slot
            .trim()
            .parse()
            .map_err(|_| format!("slot must be a number, got '{slot}'"))?;
        Ok(Self {
            slot,
            align,
            text: text.to_string(),
        })
    }
}

/// Tells the user to sign in again when the session cannot be recovered.
struct TerminalRedirect;

impl LoginRedirect for TerminalRedirect {
    fn redirect_to_login(&self, _location: &str) {
        eprintln!("Session expired. Run `gallery login` to sign in again.");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = GalleryConfig::from_env().context("failed to load configuration")?;
    debug!(api_url = %config.api_url, state_dir = %config.state_dir.display(), "configuration loaded");

    let jar = cookies::load(&config.cookie_path(), &config.api_url)?;
    let transport = ReqwestTransport::with_jar(jar.clone()).context("failed to build HTTP client")?;
    let client = GalleryClient::from_config(&config, Arc::new(transport), Arc::new(TerminalRedirect))?;

    let result = run(&client, cli.command).await;
    cookies::save(&jar, &config.cookie_path(), &config.api_url)?;
    result
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,gallery_client=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(client: &GalleryClient, command: Command) -> Result<()> {
    match command {
        Command::Login { email, password } => {
            client.login(&email, &password).await.context("login failed")?;
            println!("Signed in as {email}");
        }
        Command::Logout => {
            client.logout().await?;
            println!("Signed out");
        }
        Command::Join {
            email,
            password,
            username,
            nickname,
        } => {
            let form = JoinRequest {
                email,
                password,
                username,
                nickname,
            };
            if client.email_exists(&form.email).await? {
                bail!("{} is already registered", form.email);
            }
            client.join(&form).await.context("sign-up failed")?;
            println!("Account created; run `gallery login` to sign in");
        }
        Command::OauthUrl { provider } => {
            println!("{}", client.oauth_authorization_url(&provider)?);
        }
        Command::OauthComplete => {
            client
                .complete_oauth()
                .await
                .context("social login failed; start again with `gallery oauth-url`")?;
            println!("Signed in");
        }
        Command::Whoami => {
            let me = client.user_info().await?;
            println!("{} ({}) <{}> #{}", me.nickname, me.username, me.email, me.user_id);
        }
        Command::Feed => print!("{}", render::feed(&client.feed().await?)),
        Command::Photo { id } => print!("{}", render::photo(&client.photo(id).await?)),
        Command::Exhibition { id } => {
            print!("{}", render::exhibition(&client.exhibition(id).await?));
        }
        Command::User { id } => print!("{}", render::archive(&client.user_archive(id).await?)),
        Command::Like { kind, id, toggle } => {
            let target = kind.target(id);
            let status = if toggle {
                client.toggle_like(target).await?
            } else {
                client.like_status(target).await?
            };
            let state = if status.liked { "liked" } else { "not liked" };
            println!("{state}, {} likes", status.like_count);
        }
        Command::Comments { photo_id } => {
            print!("{}", render::comments(&client.comments(photo_id).await?));
        }
        Command::Comment { photo_id, content } => {
            client.create_comment(photo_id, &content).await?;
            println!("Comment posted");
        }
        Command::DeleteComment { id } => {
            client.delete_comment(id).await?;
            println!("Comment deleted");
        }
        Command::Delete { kind, id } => {
            match kind {
                Kind::Photo => client.delete_photo(id).await?,
                Kind::Exhibition => client.delete_exhibition(id).await?,
            }
            println!("Deleted");
        }
        Command::Publish {
            title,
            images,
            exhibition,
            template,
            texts,
        } => {
            let editor = build_editor(title, &images, exhibition, template, texts)?;
            let published = client.publisher().publish(&editor).await?;
            info!(path = %published.path(), "published");
            println!("Published: {}", published.path());
        }
    }
    Ok(())
}

fn build_editor(
    title: String,
    images: &[PathBuf],
    exhibition: bool,
    template: Template,
    texts: Vec<TextArg>,
) -> Result<Editor> {
    let mut editor = Editor::new(Arc::new(InMemoryPreviews::new()));
    if exhibition {
        editor.set_mode(EditorMode::Exhibition, |_| true);
        editor.set_template(template);
    }
    editor.set_title(title);

    let images = images
        .iter()
        .map(|path| {
            LocalImage::from_path(path).with_context(|| format!("cannot use {}", path.display()))
        })
        .collect::<Result<Vec<_>>>()?;
    if let MediaInsertion::Rejected(advisory) = editor.insert_media(None, images) {
        bail!("{advisory} Pass --exhibition to upload several photos.");
    }

    // Blocks are prepended within a slot, so add them last to first
    for arg in texts.into_iter().rev() {
        if !editor.add_text_block(arg.slot) {
            bail!(
                "text slot {} is past the last image (max {})",
                arg.slot,
                editor.media_count()
            );
        }
        editor.update_text_block(arg.slot, 0, arg.text, arg.align);
    }
    Ok(editor)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn text_arg_parsing() {
        let arg: TextArg = "1:left=low tide".parse().unwrap();
        assert_eq!(
            arg,
            TextArg {
                slot: 1,
                align: Align::Start,
                text: "low tide".to_string()
            }
        );

        let arg: TextArg = "0=a=b".parse().unwrap();
        assert_eq!(arg.align, Align::Center);
        assert_eq!(arg.text, "a=b");

        assert!("x=hi".parse::<TextArg>().is_err());
        assert!("1:diagonal=hi".parse::<TextArg>().is_err());
        assert!("no separator".parse::<TextArg>().is_err());
    }

    #[test]
    fn cli_parses_publish() {
        let cli = Cli::try_parse_from([
            "gallery",
            "publish",
            "--title",
            "Harbour",
            "--exhibition",
            "--template",
            "grey",
            "--image",
            "a.png",
            "--image",
            "b.png",
            "--text",
            "2:right=end",
        ])
        .unwrap();
        match cli.command {
            Command::Publish {
                images,
                template,
                texts,
                ..
            } => {
                assert_eq!(images.len(), 2);
                assert_eq!(template, Template::Grey);
                assert_eq!(texts[0].slot, 2);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn single_photo_publish_rejects_two_images() {
        let dir = tempfile::tempdir().unwrap();
        let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
        let a = dir.path().join("a.png");
        let b = dir.path().join("b.png");
        std::fs::write(&a, png).unwrap();
        std::fs::write(&b, png).unwrap();

        let err = build_editor("t".to_string(), &[a.clone(), b], false, Template::Default, vec![])
            .unwrap_err();
        assert!(err.to_string().contains("--exhibition"));

        let editor = build_editor(
            "t".to_string(),
            &[a],
            false,
            Template::Default,
            vec!["1=caption".parse().unwrap()],
        )
        .unwrap();
        assert_eq!(editor.content().slot(1)[0].text, "caption");
    }
}
