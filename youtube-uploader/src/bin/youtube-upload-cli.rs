use eyre::Context;
use std::io::IsTerminal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use youtube_uploader::oauth::OAuthManager;
use youtube_uploader::{UploadMetadata, UploadProgress, VideoUploader, setup_youtube_client};

const TOKENS_FILE: &str = "tokens.json";

const USAGE: &str = "usage: youtube-upload-cli <command>

commands:
  upload <file> [title]
  thumbnail <video-id> <image>
  categories [region]
  playlists
  add <video-id> <playlist-id>
  quota";

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_ansi(std::io::stderr().is_terminal())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    if args.is_empty() {
        eprintln!("{USAGE}");
        std::process::exit(2);
    }

    let client_id = std::env::var("YOUTUBE_CLIENT_ID").context("read YOUTUBE_CLIENT_ID")?;
    let client_secret =
        std::env::var("YOUTUBE_CLIENT_SECRET").context("read YOUTUBE_CLIENT_SECRET")?;
    let oauth_manager = Arc::new(OAuthManager::new(client_id, client_secret));

    let stored = if tokio::fs::try_exists(TOKENS_FILE)
        .await
        .context("check for stored tokens")?
    {
        Some(
            tokio::fs::read_to_string(TOKENS_FILE)
                .await
                .context("read stored tokens")?,
        )
    } else {
        None
    };

    let (client, token) = setup_youtube_client(
        oauth_manager,
        reqwest::Client::new(),
        stored.as_deref(),
        |msg| eprintln!("{msg}"),
    )
    .await?;
    let json = serde_json::to_string(&token).context("serialize token")?;
    tokio::fs::write(TOKENS_FILE, &json)
        .await
        .context("save tokens")?;

    let uploader = VideoUploader::new(client);
    match args.as_slice() {
        ["upload", file, rest @ ..] => {
            let metadata = UploadMetadata {
                title: rest.first().map(|t| t.to_string()),
                ..Default::default()
            };
            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    on_ctrl_c.cancel();
                }
            });
            let mut on_progress = |p: UploadProgress| {
                eprintln!(
                    "{:>3}% {} {:.2} MiB/s, {}",
                    p.percentage, p.status, p.speed_mbps, p.eta
                );
            };
            let video = uploader
                .upload_video(file, &metadata, Some(&mut on_progress), &cancel)
                .await?;
            println!("{}", serde_json::to_string_pretty(&video)?);
        }
        ["thumbnail", video_id, image] => {
            let response = uploader.set_thumbnail(video_id, image).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        ["categories", rest @ ..] => {
            for category in uploader.get_video_categories(rest.first().copied()).await? {
                let title = category
                    .snippet
                    .as_ref()
                    .and_then(|s| s.title.as_deref())
                    .unwrap_or("");
                println!("{}\t{}", category.id, title);
            }
        }
        ["playlists"] => {
            for playlist in uploader.get_my_playlists().await? {
                let title = playlist
                    .snippet
                    .as_ref()
                    .and_then(|s| s.title.as_deref())
                    .unwrap_or("");
                println!("{}\t{}", playlist.id, title);
            }
        }
        ["add", video_id, playlist_id] => {
            let item = uploader.add_video_to_playlist(video_id, playlist_id).await?;
            println!("{}", item.id);
        }
        ["quota"] => {
            let quota = uploader.get_upload_quota().await?;
            println!("{}", serde_json::to_string_pretty(&quota)?);
        }
        _ => {
            eprintln!("{USAGE}");
            std::process::exit(2);
        }
    }

    Ok(())
}
