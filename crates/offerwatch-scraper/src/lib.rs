pub mod engine;
pub mod error;
pub mod extract;
pub mod fetcher;
pub mod types;

pub use engine::ScrapeEngine;
pub use error::FetchError;
pub use types::{RawFields, ScrapeConfig, ScrapeResult};
