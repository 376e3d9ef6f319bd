//! Date range resolution.
//!
//! The model turns phrases like "yesterday" or "last week" into concrete
//! dates. Any failure falls back to today.

use super::prompts;
use crate::llm::Completion;
use crate::sales::DateRange;
use chrono::NaiveDate;
use tracing::{info, warn};

/// Ask the model which dates `question` refers to.
pub async fn resolve_range<L>(llm: &L, question: &str, today: NaiveDate) -> DateRange
where
    L: Completion + ?Sized,
{
    info!("Parsing date range for query: '{}'", question);

    let request = prompts::date_range_request(question, today);
    let reply = match llm.complete(prompts::DATE_INSTRUCTION, &request).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Date range request failed: {}. Defaulting to today.", e);
            return DateRange::day(today);
        }
    };

    match parse_range(&reply) {
        Ok(range) => {
            info!("Date range parsed: {}", range);
            range
        }
        Err(e) => {
            warn!("Failed to parse date range from {:?}: {}. Defaulting to today.", reply, e);
            DateRange::day(today)
        }
    }
}

/// Parse a `{"start_date": ..., "end_date": ...}` reply.
fn parse_range(reply: &str) -> Result<DateRange, serde_json::Error> {
    let raw: DateRange = serde_json::from_str(strip_code_fence(reply))?;
    Ok(DateRange::new(raw.start, raw.end))
}

/// Remove a surrounding markdown code block, if the model added one.
fn strip_code_fence(reply: &str) -> &str {
    let mut text = reply.trim();

    if let Some(rest) = text.strip_prefix("```") {
        // Drop the language tag line
        text = rest.split_once('\n').map(|(_, body)| body).unwrap_or("");
        if let Some(end) = text.rfind("```") {
            text = &text[..end];
        }
    }

    text.trim().trim_matches('`').trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ApiError;
    use async_trait::async_trait;

    struct Fixed(Result<&'static str, ()>);

    #[async_trait]
    impl Completion for Fixed {
        async fn complete(&self, _system: &str, _prompt: &str) -> Result<String, ApiError> {
            self.0
                .map(str::to_string)
                .map_err(|_| ApiError::Empty { service: "stub" })
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_strip_code_fence_plain() {
        assert_eq!(strip_code_fence("  {\"a\": 1}\n"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_with_language() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
    }

    #[test]
    fn test_strip_code_fence_inline_backticks() {
        assert_eq!(strip_code_fence("`{\"a\": 1}`"), "{\"a\": 1}");
    }

    #[tokio::test]
    async fn test_resolve_range_from_fenced_json() {
        let llm = Fixed(Ok(
            "```json\n{\"start_date\": \"2025-10-27\", \"end_date\": \"2025-11-02\"}\n```",
        ));
        let range = resolve_range(&llm, "last week", date(2025, 11, 5)).await;
        assert_eq!(range, DateRange::new(date(2025, 10, 27), date(2025, 11, 2)));
    }

    #[tokio::test]
    async fn test_resolve_range_swaps_reversed() {
        let llm = Fixed(Ok(r#"{"start_date": "2025-11-02", "end_date": "2025-10-27"}"#));
        let range = resolve_range(&llm, "last week", date(2025, 11, 5)).await;
        assert_eq!(range.start, date(2025, 10, 27));
    }

    #[tokio::test]
    async fn test_resolve_range_falls_back_on_garbage() {
        let today = date(2025, 11, 5);
        let llm = Fixed(Ok("I think you mean last week"));
        assert_eq!(resolve_range(&llm, "q", today).await, DateRange::day(today));

        let llm = Fixed(Ok(r#"{"start_date": "2025-13-40", "end_date": "2025-11-02"}"#));
        assert_eq!(resolve_range(&llm, "q", today).await, DateRange::day(today));
    }

    #[tokio::test]
    async fn test_resolve_range_falls_back_on_error() {
        let today = date(2025, 11, 5);
        let llm = Fixed(Err(()));
        assert_eq!(resolve_range(&llm, "q", today).await, DateRange::day(today));
    }
}
