use anyhow::Context;
use chat_relay::client::session::FAILED_TURN;
use chat_relay::client::{ChatClient, HttpTransport, SubmitResult};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("chat_relay=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let api_url =
        std::env::var("CHAT_API_URL").unwrap_or_else(|_| "http://localhost:5000".to_string());
    let client = ChatClient::new(HttpTransport::new(&api_url));

    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(format!("Connected to {api_url} (thread {})\n", client.thread_id()).as_bytes())
        .await?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await.context("reading input")? else {
            break;
        };

        if let Some(reply) = reply_text(client.submit(&line).await) {
            stdout.write_all(format!("bot> {reply}\n").as_bytes()).await?;
        }
    }
    Ok(())
}

/// What to print for a settled turn; ignored submissions print nothing.
fn reply_text(result: SubmitResult) -> Option<String> {
    match result {
        SubmitResult::Ignored => None,
        SubmitResult::Replied(content) => Some(content),
        SubmitResult::Failed(_) => Some(FAILED_TURN.to_string()),
    }
}
