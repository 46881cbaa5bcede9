//! Boundaries to the outside world: the HTTP fetch client and the scoring
//! functions applied to fetched content.

pub mod client;
pub mod score;

pub use client::{FetchClient, FetchError, HttpFetchClient};
pub use score::{LinkScorer, Scorer, SubstringScorer};
