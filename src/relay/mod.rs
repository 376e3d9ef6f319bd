//! The prompt relay.
//!
//! Mediates between the front-end, the Sales API and the LLM:
//! - Validates the prompt
//! - Decides whether sales data is needed and fetches it
//! - For order lists, resolves a date range and filters completed orders
//! - Sends the (possibly augmented) prompt to the model

pub mod dates;
pub mod prompts;

use crate::error::RelayError;
use crate::llm::Completion;
use crate::sales::{filter_orders, DateRange, SalesPayload, SalesSource};
use chrono::{Local, NaiveDate};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Word stems that make `auto` mode consult the Sales API. A word in the
/// prompt matches when it starts with one of these.
const SALES_STEMS: [&str; 9] = [
    "sale",
    "sell",
    "revenue",
    "order",
    "profit",
    "earning",
    "transaction",
    "purchas",
    "customer",
];

/// Words matched exactly, since their stems also start unrelated words.
const SALES_WORDS: [&str; 1] = ["sold"];

/// Words that, right before "order", mean sequence rather than a sale.
const NON_SALES_ORDER_CONTEXT: [&str; 9] = [
    "alphabetical",
    "chronological",
    "numerical",
    "reverse",
    "ascending",
    "descending",
    "random",
    "in",
    "of",
];

fn is_sales_word(word: &str, previous: Option<&str>) -> bool {
    if SALES_WORDS.contains(&word) {
        return true;
    }
    let Some(stem) = SALES_STEMS.iter().find(|stem| word.starts_with(*stem)) else {
        return false;
    };
    *stem != "order" || !previous.is_some_and(|p| NON_SALES_ORDER_CONTEXT.contains(&p))
}

/// When to enrich a prompt with Sales API data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SalesIntent {
    /// Fetch when the prompt talks about sales.
    #[default]
    Auto,
    /// Fetch for every prompt.
    Always,
    /// Never fetch.
    Never,
}

impl SalesIntent {
    pub fn wants_sales(self, prompt: &str) -> bool {
        match self {
            SalesIntent::Always => true,
            SalesIntent::Never => false,
            SalesIntent::Auto => {
                let prompt = prompt.to_lowercase();
                let words: Vec<&str> = prompt
                    .split(|c: char| !c.is_alphanumeric())
                    .filter(|w| !w.is_empty())
                    .collect();
                words.iter().enumerate().any(|(i, word)| {
                    let previous = i.checked_sub(1).map(|j| words[j]);
                    is_sales_word(word, previous)
                })
            }
        }
    }
}

/// The model's answer to one prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    /// Completion text, unmodified.
    pub text: String,
    /// Period the orders were filtered to, when an order list was analysed.
    pub range: Option<DateRange>,
}

/// Stateless relay over a completion backend and a sales source.
pub struct Relay<L, S> {
    llm: L,
    sales: S,
    intent: SalesIntent,
}

impl<L, S> Relay<L, S>
where
    L: Completion,
    S: SalesSource,
{
    pub fn new(llm: L, sales: S, intent: SalesIntent) -> Self {
        Self { llm, sales, intent }
    }

    /// Answer a prompt, using today's local date for relative periods.
    pub async fn relay(&self, prompt: &str) -> Result<Reply, RelayError> {
        self.relay_on(prompt, Local::now().date_naive()).await
    }

    /// Answer a prompt as if today were `today`.
    pub async fn relay_on(&self, prompt: &str, today: NaiveDate) -> Result<Reply, RelayError> {
        let question = prompt.trim();
        if question.is_empty() {
            return Err(RelayError::EmptyPrompt);
        }

        if !self.intent.wants_sales(question) {
            debug!("No sales context needed");
            let text = self.complete(prompts::ASSISTANT_INSTRUCTION, question).await?;
            return Ok(Reply { text, range: None });
        }

        let payload = self.sales.fetch().await.map_err(RelayError::Sales)?;
        match payload {
            SalesPayload::Orders(orders) => {
                let range = dates::resolve_range(&self.llm, question, today).await;
                let filtered = filter_orders(&orders, range);
                info!("Sending {} orders for analysis", filtered.len());
                let request = prompts::analysis_request(question, &filtered);
                let text = self.complete(prompts::ANALYST_INSTRUCTION, &request).await?;
                Ok(Reply {
                    text,
                    range: Some(range),
                })
            }
            SalesPayload::Opaque(context) => {
                let request = prompts::context_request(question, &context);
                let text = self.complete(prompts::CONTEXT_INSTRUCTION, &request).await?;
                Ok(Reply { text, range: None })
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn llm(&self) -> &L {
        &self.llm
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<String, RelayError> {
        self.llm
            .complete(system, prompt)
            .await
            .map_err(RelayError::Llm)
    }
}
