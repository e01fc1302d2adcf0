pub mod client;
pub mod normalizer;
pub mod types;

pub use client::{FeedClient, FeedClientError};
pub use normalizer::{normalize, NormalizeError};
