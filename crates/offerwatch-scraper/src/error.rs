use thiserror::Error;

/// Total failure to load the target page.
///
/// Missing sub-fields after a successful load are never an error — the
/// extractor degrades to partial [`RawFields`](crate::types::RawFields)
/// instead. Only the transport layer produces `FetchError`.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure: connect error, TLS failure, or the per-attempt
    /// timeout firing mid-load.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
}
