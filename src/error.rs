use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid JSON input: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    /// Document assembly failed; no partial output is produced.
    #[error("PDF assembly failed: {0}")]
    Pdf(String),

    /// The placement pass disagreed with the page estimate.
    #[error("layout error: {0}")]
    Layout(String),

    #[error("no content sections and no fallback view to capture")]
    NothingToRender,
}
