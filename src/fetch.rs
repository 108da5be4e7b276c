use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing::{debug, info};

use crate::api_types::{ApiFeed, ChatRequest, ChatResponse};
use crate::config::{Endpoints, Settings};
use crate::models::Record;
use crate::normalize::Normalizer;

/// Reply shown when the assistant answers with an empty string.
pub const EMPTY_ANSWER: &str = "Извините, не могу обработать запрос";

/// HTTP side of the registry: feed pull, CSV pass-through and assistant Q&A.
pub struct FeedClient {
    client: Client,
    endpoints: Endpoints,
    feed_limit: usize,
}

impl FeedClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .context("building HTTP client")?;
        Ok(Self {
            client,
            endpoints: settings.endpoints.clone(),
            feed_limit: settings.feed_limit,
        })
    }

    /// Pull the whole feed in one request.
    pub async fn fetch_feed(&self) -> Result<ApiFeed> {
        let url = &self.endpoints.data;
        let start = std::time::Instant::now();
        debug!("Fetching feed - url={}, limit={}", url, self.feed_limit);

        let resp = self
            .client
            .get(url.clone())
            .query(&[("limit", self.feed_limit)])
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?;

        let resp = resp
            .error_for_status()
            .with_context(|| format!("HTTP error for {}", url))?;

        let feed: ApiFeed = resp
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {}", url))?;

        info!(
            "Feed fetch completed - duration={:.2}s, items={}, total={:?}",
            start.elapsed().as_secs_f32(),
            feed.data.len(),
            feed.total
        );
        Ok(feed)
    }

    /// Fetch and normalize as one atomic step: either a full batch or an error.
    pub async fn fetch_records(&self, normalizer: &Normalizer) -> Result<Vec<Record>> {
        let feed = self.fetch_feed().await?;
        Ok(normalizer.normalize_all(&feed.data))
    }

    /// Raw CSV bytes from the export endpoint; never parsed here.
    pub async fn export_csv(&self) -> Result<Vec<u8>> {
        let url = &self.endpoints.export;
        let start = std::time::Instant::now();
        debug!("Requesting CSV export - url={}", url);

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {}", url))?;

        let bytes = resp
            .bytes()
            .await
            .with_context(|| format!("Reading body of {}", url))?;

        info!(
            "CSV export completed - duration={:.2}s, bytes={}",
            start.elapsed().as_secs_f32(),
            bytes.len()
        );
        Ok(bytes.to_vec())
    }

    /// Ask the analytics assistant, passing the filtered records as context.
    pub async fn ask(&self, question: &str, context: &[Record]) -> Result<String> {
        let question = question.trim();
        if question.is_empty() {
            bail!("question is empty");
        }
        let url = &self.endpoints.chat;
        let start = std::time::Instant::now();
        debug!(
            "Assistant request - question_length={} chars, context_records={}",
            question.len(),
            context.len()
        );

        let body = ChatRequest { question, context };
        let reply: ChatResponse = self
            .client
            .post(url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("Request failed for {}", url))?
            .error_for_status()
            .with_context(|| format!("HTTP error for {}", url))?
            .json()
            .await
            .with_context(|| format!("Decoding JSON for {}", url))?;

        info!(
            "Assistant reply received - duration={:.2}s, answer_length={} chars",
            start.elapsed().as_secs_f32(),
            reply.answer.len()
        );
        Ok(answer_or_apology(reply.answer))
    }
}

pub fn answer_or_apology(answer: String) -> String {
    if answer.trim().is_empty() {
        EMPTY_ANSWER.to_string()
    } else {
        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Overrides;

    #[test]
    fn test_empty_answer_is_replaced() {
        assert_eq!(answer_or_apology(String::new()), EMPTY_ANSWER);
        assert_eq!(answer_or_apology("  ".into()), EMPTY_ANSWER);
        assert_eq!(answer_or_apology("42 posts".into()), "42 posts");
    }

    #[test]
    fn test_client_builds_from_settings() {
        let settings = Settings::resolve_with(&Overrides::default(), |_| None).unwrap();
        let client = FeedClient::new(&settings).unwrap();
        assert_eq!(client.feed_limit, settings.feed_limit);
        assert_eq!(client.endpoints, settings.endpoints);
    }

    #[tokio::test]
    async fn test_blank_question_is_not_sent() {
        let settings = Settings::resolve_with(&Overrides::default(), |_| None).unwrap();
        let client = FeedClient::new(&settings).unwrap();
        assert!(client.ask("   ", &[]).await.is_err());
    }
}
