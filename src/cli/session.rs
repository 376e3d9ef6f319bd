//! Interactive question loop.
//!
//! Reads one line per cycle, relays it and prints the answer. Ends on
//! `exit`, `quit` or end of input.

use super::print_reply;
use crate::llm::Completion;
use crate::relay::Relay;
use crate::sales::SalesSource;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

const BANNER: &str = "\n--- Welcome to the Sales Insight Agent ---\n\
Ask me about your sales! (e.g., 'What were our best-selling items yesterday?')\n\
Type 'exit' to quit.\n";

fn is_quit(line: &str) -> bool {
    matches!(line.to_lowercase().as_str(), "exit" | "quit")
}

/// Run the loop until the user quits or input ends.
///
/// Replies go to `output`. The banner, the `> ` marker, hints and errors go
/// to `console`, so piped output holds answers only. `show_prompt` controls
/// the `> ` marker, which is noise when stdin is not a terminal.
pub async fn run_session<L, S, R, W, C>(
    relay: &Relay<L, S>,
    input: R,
    output: &mut W,
    console: &mut C,
    show_prompt: bool,
) -> std::io::Result<()>
where
    L: Completion,
    S: SalesSource,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: AsyncWrite + Unpin,
{
    console.write_all(BANNER.as_bytes()).await?;
    console.write_all(b"\n").await?;

    let mut lines = input.lines();
    loop {
        if show_prompt {
            console.write_all(b"> ").await?;
        }
        console.flush().await?;

        let Some(line) = lines.next_line().await? else {
            debug!("End of input");
            console.write_all(b"\nGoodbye!\n").await?;
            break;
        };
        let query = line.trim();

        if is_quit(query) {
            console.write_all(b"Goodbye!\n").await?;
            break;
        }
        if query.is_empty() {
            console
                .write_all(b"Please enter a question (or 'exit' to quit).\n")
                .await?;
            continue;
        }

        match relay.relay(query).await {
            Ok(reply) => {
                print_reply(output, query, &reply).await?;
                output.flush().await?;
            }
            Err(e) => {
                let message = format!("\nError: {}\nPlease try your query again.\n\n", e);
                console.write_all(message.as_bytes()).await?;
            }
        }
    }

    output.flush().await?;
    console.flush().await
}
