//! JSON-lines server over stdin/stdout.
//!
//! Each input line is a request; responses and update broadcasts are written
//! back one JSON object per line. A single view is attached for the process
//! lifetime, which is enough for one embedded editor panel per process.

use anyhow::{Context, Result};
use kvedit_workspace::{DocumentSession, Request, ViewMessage};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::unbounded_channel;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let source = match std::env::args().nth(1) {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("reading {path}"))?,
        None => String::new(),
    };

    let mut session = DocumentSession::open(&source).context("parsing document")?;
    let (tx, mut rx) = unbounded_channel::<ViewMessage>();
    let view = session.attach_view(tx);
    tracing::info!("session open, waiting for requests");

    let mut lines = BufReader::new(io::stdin()).lines();
    let mut stdout = io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(error) => {
                tracing::warn!(%error, "dropping malformed request line");
                continue;
            }
        };

        session.handle_request(view, request);

        // Drain everything the request produced before reading the next line.
        while let Ok(message) = rx.try_recv() {
            let mut encoded = serde_json::to_vec(&message)?;
            encoded.push(b'\n');
            stdout.write_all(&encoded).await?;
        }
        stdout.flush().await?;
    }

    tracing::info!("stdin closed, shutting down");
    Ok(())
}
