//! Mic Send
//!
//! Posts a local file to a receiver and prints the server's reply.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mic_receiver::client::{send_file, SendMode, SendOptions, DEFAULT_URL};
use mic_receiver::upload::FILE_FIELD;

#[derive(Parser, Debug)]
#[command(name = "mic-send", version, about = "Upload a file to a mic-receiver server")]
struct Cli {
    /// File to upload
    file: PathBuf,

    /// Endpoint to POST to
    #[arg(long, default_value = DEFAULT_URL)]
    url: String,

    /// Send the file bytes as the request body instead of a multipart form
    #[arg(long)]
    raw: bool,

    /// Content-Type header for --raw uploads
    #[arg(long, requires = "raw")]
    content_type: Option<String>,

    /// Multipart field name
    #[arg(long, default_value = FILE_FIELD, conflicts_with = "raw")]
    field: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mic_receiver=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let mode = if cli.raw {
        SendMode::Raw {
            content_type: cli.content_type,
        }
    } else {
        SendMode::Multipart { field: cli.field }
    };
    let options = SendOptions {
        path: cli.file,
        url: cli.url,
        mode,
    };

    match send_file(&options).await {
        Ok(outcome) => {
            tracing::debug!(status = %outcome.status, "Server replied");
            println!("{}", outcome.body);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error sending file: {:#}", anyhow::Error::from(e));
            ExitCode::FAILURE
        }
    }
}
