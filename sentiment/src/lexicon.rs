//! Keyword polarity scoring.
//!
//! Simple lexicon matching over lowercased text. Crude next to a real NLP
//! model, but it needs no credentials, no network and no weights, and the
//! pipeline only consumes the sign and rough magnitude.

const NEGATIVE_WORDS: &[&str] = &[
    "crash", "dump", "selloff", "sell-off", "drop", "fall", "decline", "plunge",
    "bearish", "bear", "liquidation", "liquidated", "rekt", "scam", "hack",
    "exploit", "fear", "panic", "capitulation", "risk", "losses", "weak",
    "downtrend", "correction", "collapse",
];

const POSITIVE_WORDS: &[&str] = &[
    "rally", "pump", "surge", "breakout", "moon", "bullish", "bull", "ath",
    "all-time high", "accumulate", "accumulation", "gain", "gains", "profit",
    "recovery", "strong", "uptrend", "adoption", "halving", "inflow", "buy",
    "long", "support",
];

/// Lexicon-based text polarity scorer.
#[derive(Debug, Clone, Default)]
pub struct LexiconScorer;

impl LexiconScorer {
    pub fn new() -> Self {
        Self
    }

    /// Polarity of one text in [-1, 1]; 0 when nothing matches.
    pub fn score_text(&self, text: &str) -> f64 {
        let text = text.to_lowercase();

        let mut score: f64 = 0.0;
        let mut hits: f64 = 0.0;
        for word in NEGATIVE_WORDS {
            if text.contains(word) {
                score -= 1.0;
                hits += 1.0;
            }
        }
        for word in POSITIVE_WORDS {
            if text.contains(word) {
                score += 1.0;
                hits += 1.0;
            }
        }

        if hits > 0.0 {
            (score / hits).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }

    /// Average polarity over a batch of texts. Texts without matches count
    /// as neutral, mirroring a per-post polarity average.
    pub fn score_many<'a>(&self, texts: impl IntoIterator<Item = &'a str>) -> f64 {
        let mut total = 0.0;
        let mut count = 0.0;
        for text in texts {
            total += self.score_text(text);
            count += 1.0;
        }
        if count > 0.0 {
            (total / count).clamp(-1.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullish_text_scores_positive() {
        let scorer = LexiconScorer::new();
        assert!(scorer.score_text("BTC breakout incoming, very bullish rally") > 0.0);
    }

    #[test]
    fn bearish_text_scores_negative() {
        let scorer = LexiconScorer::new();
        assert!(scorer.score_text("massive liquidation cascade, panic selloff") < 0.0);
    }

    #[test]
    fn unmatched_text_is_neutral() {
        let scorer = LexiconScorer::new();
        assert_eq!(scorer.score_text("the weather is nice today"), 0.0);
    }

    #[test]
    fn mixed_text_stays_bounded() {
        let scorer = LexiconScorer::new();
        let score = scorer.score_text("bullish rally into a bearish crash");
        assert!((-1.0..=1.0).contains(&score));
    }

    #[test]
    fn batch_average_includes_neutral_posts() {
        let scorer = LexiconScorer::new();
        let score = scorer.score_many(["huge pump and rally", "nothing to see here"]);
        assert!(score > 0.0);
        assert!(score < 1.0);
    }

    #[test]
    fn empty_batch_is_neutral() {
        let scorer = LexiconScorer::new();
        assert_eq!(scorer.score_many(std::iter::empty::<&str>()), 0.0);
    }
}
