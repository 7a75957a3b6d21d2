//! `wayfarer ask`: one-shot send.

use std::io::Write;

use wf_client::{ChatSession, HttpTransport};

/// Send `message` to `url` and stream the reply to stdout.
pub async fn ask(url: String, message: String) -> anyhow::Result<()> {
    let session = ChatSession::new(HttpTransport::new(url.clone())?);

    let mut printed = 0usize;
    let result = session
        .send_with(&message, |turn| {
            if let Some(fresh) = turn.content.get(printed..) {
                print!("{fresh}");
                std::io::stdout().flush().ok();
            }
            printed = turn.content.len();
        })
        .await;
    println!();

    result
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!("chat request to {url} failed: {e}"))
}
