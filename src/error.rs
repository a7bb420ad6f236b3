use crate::stats::Readiness;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Explorer answered with a non-success envelope.
    #[error("{0}")]
    Upstream(String),
    #[error("explorer request: {0}")]
    Explorer(#[from] reqwest::Error),
    #[error("invalid abi payload: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("node call failed: {0}")]
    Node(String),
    #[error("circulating supply is zero")]
    EmptySupply,
    #[error("contracts not ready ({0})")]
    NotReady(Readiness),
    #[error("render: {0}")]
    Render(String),
    #[error("config: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable name used in error bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Upstream(_) => "upstream",
            Error::Explorer(_) => "explorer",
            Error::Parse(_) => "parse",
            Error::Node(_) => "node",
            Error::EmptySupply => "empty_supply",
            Error::NotReady(_) => "not_ready",
            Error::Render(_) => "render",
            Error::Config(_) => "config",
        }
    }
}
