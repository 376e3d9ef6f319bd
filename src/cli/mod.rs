//! Command-line front-end.
//!
//! Two modes:
//! - One-shot: a single prompt from the command line
//! - Interactive: a read-relay-print loop over stdin

pub mod session;

pub use session::run_session;

use crate::error::RelayError;
use crate::llm::Completion;
use crate::relay::{Relay, Reply};
use crate::sales::SalesSource;
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Answer a single prompt and print the reply.
///
/// An empty prompt is rejected before the relay is involved.
pub async fn run_once<L, S, W>(relay: &Relay<L, S>, prompt: &str, output: &mut W) -> anyhow::Result<()>
where
    L: Completion,
    S: SalesSource,
    W: AsyncWrite + Unpin,
{
    let prompt = prompt.trim();
    if prompt.is_empty() {
        return Err(RelayError::EmptyPrompt.into());
    }

    let reply = relay.relay(prompt).await?;
    print_reply(output, prompt, &reply).await?;
    output.flush().await?;
    Ok(())
}

/// Print a reply. Order analyses are framed with the period they cover.
pub(crate) async fn print_reply<W>(output: &mut W, question: &str, reply: &Reply) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut text = String::new();
    if let Some(range) = &reply.range {
        text.push_str(&format!("\nAnalysis for '{}' ({}):\n---\n", question, range));
    }
    if reply.text.is_empty() {
        text.push_str("No analysis available.");
    } else {
        text.push_str(&reply.text);
    }
    if !text.ends_with('\n') {
        text.push('\n');
    }
    if reply.range.is_some() {
        text.push_str("---\n");
    }
    output.write_all(text.as_bytes()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relay::tests::{StubLlm, StubSales};
    use crate::relay::SalesIntent;
    use crate::sales::DateRange;
    use chrono::NaiveDate;

    #[tokio::test]
    async fn test_run_once_rejects_empty_prompt() {
        let relay = Relay::new(StubLlm::default(), StubSales::failing(), SalesIntent::Always);
        let mut output = Vec::new();

        let err = run_once(&relay, "  ", &mut output).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<RelayError>(),
            Some(RelayError::EmptyPrompt)
        ));
        assert_eq!(relay.llm().calls(), 0);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_run_once_prints_reply() {
        let relay = Relay::new(
            StubLlm::with(vec![Ok("42")]),
            StubSales::failing(),
            SalesIntent::Never,
        );
        let mut output = Vec::new();

        run_once(&relay, "meaning of life", &mut output).await.unwrap();
        assert_eq!(String::from_utf8(output).unwrap(), "42\n");
    }

    #[tokio::test]
    async fn test_run_once_error_prints_nothing() {
        let relay = Relay::new(
            StubLlm::with(vec![Err(401)]),
            StubSales::failing(),
            SalesIntent::Never,
        );
        let mut output = Vec::new();

        assert!(run_once(&relay, "hello", &mut output).await.is_err());
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_print_reply_with_range() {
        let day = NaiveDate::from_ymd_opt(2025, 11, 4).unwrap();
        let reply = Reply {
            text: "Total: $9.06".to_string(),
            range: Some(DateRange::day(day)),
        };
        let mut output = Vec::new();
        print_reply(&mut output, "revenue yesterday?", &reply)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "\nAnalysis for 'revenue yesterday?' (2025-11-04 to 2025-11-04):\n---\nTotal: $9.06\n---\n"
        );
    }
}
