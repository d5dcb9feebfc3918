//! Sentiment collaborator (Layer 1)
//!
//! Supplies one aggregate sentiment score per evaluation, roughly in
//! [-1, 1]. When the upstream source is unavailable the score is 0, never
//! an error: the signal pipeline treats missing sentiment as neutral.

pub mod lexicon;
pub mod provider;

pub use lexicon::LexiconScorer;
pub use provider::{NullSentiment, SentimentProvider, TwitterSentiment};
