//! Sentiment providers.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::lexicon::LexiconScorer;

const SEARCH_URL: &str = "https://api.twitter.com/2/tweets/search/recent";
const MAX_RESULTS: usize = 10;

/// Source of one aggregate sentiment score per evaluation.
///
/// Implementations resolve their own failures to a neutral 0; the caller
/// never handles a sentiment error.
#[async_trait]
pub trait SentimentProvider: Send + Sync {
    /// Aggregate sentiment for `coin`, roughly in [-1, 1].
    async fn score(&self, coin: &str) -> f64;
}

/// Always-neutral provider, used when no credentials are configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSentiment;

#[async_trait]
impl SentimentProvider for NullSentiment {
    async fn score(&self, _coin: &str) -> f64 {
        0.0
    }
}

/// Scores recent posts mentioning the coin via the recent-search API.
pub struct TwitterSentiment {
    http: reqwest::Client,
    bearer_token: String,
    scorer: LexiconScorer,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<Post>,
}

#[derive(Debug, Deserialize)]
struct Post {
    text: String,
}

impl TwitterSentiment {
    pub fn new(bearer_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            bearer_token: bearer_token.into(),
            scorer: LexiconScorer::new(),
        }
    }

    async fn fetch_score(&self, coin: &str) -> anyhow::Result<f64> {
        let max_results = MAX_RESULTS.to_string();
        let response = self
            .http
            .get(SEARCH_URL)
            .bearer_auth(&self.bearer_token)
            .query(&[("query", coin), ("max_results", max_results.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let parsed: SearchResponse = response.json().await?;
        if parsed.data.is_empty() {
            debug!(coin, "no recent posts, neutral sentiment");
            return Ok(0.0);
        }
        let score = self
            .scorer
            .score_many(parsed.data.iter().map(|p| p.text.as_str()));
        debug!(coin, score, posts = parsed.data.len(), "scored recent posts");
        Ok(score)
    }
}

#[async_trait]
impl SentimentProvider for TwitterSentiment {
    async fn score(&self, coin: &str) -> f64 {
        match self.fetch_score(coin).await {
            Ok(score) => score,
            Err(e) => {
                warn!(error = %e, "sentiment fetch failed, defaulting to neutral");
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_provider_is_neutral() {
        assert_eq!(NullSentiment.score("BTC").await, 0.0);
    }

    #[test]
    fn search_response_tolerates_missing_data() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.data.is_empty());

        let parsed: SearchResponse =
            serde_json::from_str(r#"{"data":[{"id":"1","text":"bullish rally"}]}"#).unwrap();
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.data[0].text, "bullish rally");
    }
}
