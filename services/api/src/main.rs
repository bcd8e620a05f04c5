//! Aora command-line client.
//!
//! # Usage
//!
//! ```bash
//! # Sign up, then look at the latest videos
//! aora register --email alice@x.com --password pw123456 --username alice
//! aora posts --latest 5
//!
//! # Publish a video
//! aora upload-post --title T --prompt P --thumbnail t.png --video v.mp4 --user <user id>
//! ```
//!
//! Backend coordinates come from the `APPWRITE_*` environment variables.

use anyhow::Result;
use api::{BackendFacade, PostForm};
use clap::{Parser, Subcommand};
use common::BackendConfig;
use media::FileHandle;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Aora backend client
#[derive(Parser, Debug)]
#[command(name = "aora")]
#[command(about = "Command-line client for the Aora video sharing backend")]
#[command(version)]
struct Args {
    /// File keeping the session between invocations
    #[arg(long, default_value = ".aora-session")]
    session_file: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and its profile, leaving it signed in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        username: String,
    },
    /// Sign in with email and password
    SignIn {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Close the current session
    SignOut,
    /// Show the signed-in user
    Whoami,
    /// List posts: all of them, the latest, a search or one user's
    Posts {
        /// Only the N most recent posts
        #[arg(long, conflicts_with_all = ["search", "user"])]
        latest: Option<u32>,
        /// Full-text search on titles
        #[arg(long, conflicts_with = "user")]
        search: Option<String>,
        /// Posts of one user document
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the URL of a stored asset
    AssetUrl {
        asset_id: String,
        /// image or video
        kind: String,
    },
    /// Upload a thumbnail and a video and publish them as a post
    UploadPost {
        #[arg(long)]
        title: String,
        #[arg(long)]
        prompt: String,
        #[arg(long)]
        thumbnail: PathBuf,
        #[arg(long)]
        video: PathBuf,
        /// User document id of the creator
        #[arg(long)]
        user: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = BackendConfig::from_env()?;
    let facade = BackendFacade::connect(config)?;

    restore_session(&facade, &args.session_file).await?;
    let result = run(&facade, args.command).await;
    save_session(&facade, &args.session_file).await?;

    result
}

async fn run(facade: &BackendFacade, command: Command) -> Result<()> {
    match command {
        Command::Register {
            email,
            password,
            username,
        } => print_json(&facade.register_user(&email, &password, &username).await?),
        Command::SignIn { email, password } => {
            print_json(&facade.sign_in(&email, &password).await?)
        }
        Command::SignOut => {
            facade.sign_out().await?;
            info!("Signed out");
            Ok(())
        }
        Command::Whoami => print_json(&facade.get_current_user().await?),
        Command::Posts {
            latest,
            search,
            user,
        } => {
            let posts = match (latest, search, user) {
                (Some(limit), _, _) => facade.list_latest_posts(limit).await?,
                (_, Some(query), _) => facade.search_posts(&query).await?,
                (_, _, Some(user_id)) => facade.list_user_posts(&user_id).await?,
                _ => facade.list_all_posts().await?,
            };
            print_json(&posts)
        }
        Command::AssetUrl { asset_id, kind } => {
            println!("{}", facade.get_asset_url(&asset_id, &kind).await?);
            Ok(())
        }
        Command::UploadPost {
            title,
            prompt,
            thumbnail,
            video,
            user,
        } => {
            let form = PostForm {
                title,
                prompt,
                thumbnail: FileHandle::from_path(thumbnail),
                video: FileHandle::from_path(video),
                user_id: user,
            };
            print_json(&facade.upload_post(form).await?)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn restore_session(facade: &BackendFacade, path: &Path) -> Result<()> {
    match tokio::fs::read_to_string(path).await {
        Ok(cookie) if !cookie.trim().is_empty() => {
            facade
                .client()
                .set_session_cookie(Some(cookie.trim().to_string()))
                .await;
            Ok(())
        }
        Ok(_) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

async fn save_session(facade: &BackendFacade, path: &Path) -> Result<()> {
    match facade.client().session_cookie().await {
        Some(cookie) => write_session_file(path, &cookie).await?,
        None => match tokio::fs::remove_file(path).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => return Err(e.into()),
            _ => {}
        },
    }
    Ok(())
}

/// Write the session cookie readable by the owner only
async fn write_session_file(path: &Path, cookie: &str) -> std::io::Result<()> {
    let mut options = tokio::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(path).await?;

    // A file left by an older run keeps its mode on reopen
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .await?;
    }

    file.write_all(cookie.as_bytes()).await?;
    file.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_session_file_round_trip() {
        let path = temp_path("aora-session-round-trip");

        write_session_file(&path, "a_session_aora=secret")
            .await
            .unwrap();
        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(saved, "a_session_aora=secret");

        write_session_file(&path, "short").await.unwrap();
        let saved = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(saved, "short");

        tokio::fs::remove_file(&path).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_session_file_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let path = temp_path("aora-session-mode");
        tokio::fs::write(&path, "old").await.unwrap();
        tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
            .await
            .unwrap();

        write_session_file(&path, "a_session_aora=secret")
            .await
            .unwrap();

        let mode = tokio::fs::metadata(&path).await.unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        tokio::fs::remove_file(&path).await.unwrap();
    }
}

