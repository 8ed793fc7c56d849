//! Structured extraction from archived, hand-written subreddit wiki pages:
//! rewatch series, episode-discussion threads and writing-club posts.

pub mod config;
pub mod db;
pub mod error;
pub mod parser;

pub use error::ParseError;
