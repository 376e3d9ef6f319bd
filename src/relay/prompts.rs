//! Prompt templates sent to the model.

use chrono::{Datelike, Duration, NaiveDate};
use serde_json::Value;

/// Instruction used when no sales data is involved.
pub const ASSISTANT_INSTRUCTION: &str = "You are a friendly and knowledgeable sales assistant. \
Answer the user's question clearly and concisely. Use markdown for formatting where it helps.";

/// Instruction used when the prompt carries an order list.
pub const ANALYST_INSTRUCTION: &str = r#"You are a friendly and expert sales analysis assistant.
You will be given a user's question and a list of sales orders in JSON format.
Your task is to analyze the JSON data to answer the user's question.

CRITICAL INSTRUCTIONS:
1. All currency values in the JSON (like 'total' and 'lineItems[].price') are in CENTS.
2. When you present your answer, ALWAYS convert these cents to dollars (e.g., 906 cents is $9.06).
3. Only use the provided JSON data for your analysis.
4. Answer in a clear, natural, and friendly tone. Use markdown for formatting (like lists).
5. If the question is about 'best-selling items', analyze the 'lineItems' across all orders.
6. If the JSON list is empty, inform the user you found no sales data for that period.
7. The 'state' field 'locked' means the order is completed. You will only receive locked orders."#;

/// Instruction used when the Sales API returned something other than orders.
pub const CONTEXT_INSTRUCTION: &str = "You are a friendly and expert sales analysis assistant. \
You will be given a user's question and context data fetched from the company's Sales API. \
Base your answer on that context and say so when it does not contain what is needed.";

/// Instruction for turning a question into a date range.
pub const DATE_INSTRUCTION: &str =
    "You are a date parsing assistant. Respond ONLY with the requested JSON object.";

/// Ask the model to pick the date range a question refers to.
pub fn date_range_request(question: &str, today: NaiveDate) -> String {
    let yesterday = today - Duration::days(1);
    let month_start = today.with_day(1).unwrap_or(today);
    let last_monday =
        today - Duration::days(i64::from(today.weekday().num_days_from_monday()) + 7);
    let last_sunday = last_monday + Duration::days(6);

    format!(
        r#"Today's date is {today}.
Analyze the user's query and determine the start date and end date (inclusive) for their request.

User Query: "{question}"

Respond ONLY with a JSON object in the format:
{{"start_date": "YYYY-MM-DD", "end_date": "YYYY-MM-DD"}}

Examples:
- Query "yesterday": {{"start_date": "{yesterday}", "end_date": "{yesterday}"}}
- Query "today": {{"start_date": "{today}", "end_date": "{today}"}}
- Query "this month": {{"start_date": "{month_start}", "end_date": "{today}"}}
- Query "last week" (assume Mon-Sun): {{"start_date": "{last_monday}", "end_date": "{last_sunday}"}}
- Query "how much revenue?": {{"start_date": "{today}", "end_date": "{today}"}} (defaults to today)"#
    )
}

/// Question plus the filtered orders for the analyst instruction.
pub fn analysis_request(question: &str, orders: &[Value]) -> String {
    let data = serde_json::to_string_pretty(orders).unwrap_or_else(|_| "[]".to_string());
    format!(
        "User Question: \"{question}\"\n\n\
         Here is the sales data for the relevant period. Please analyze it:\n{data}"
    )
}

/// Question plus opaque context text.
pub fn context_request(question: &str, context: &Value) -> String {
    format!("{question}\n\nContext: {context}")
}
