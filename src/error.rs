// =============================================================================
// Error types for the indicator engine and the market-data adapters
// =============================================================================
//
// The engine raises only structural input errors; insufficient history and
// degenerate arithmetic are represented as "no value" entries instead.
// Adapter failures are kept as distinct kinds so the HTTP layer can map each
// one to its own status code.
// =============================================================================

use chrono::NaiveDate;
use thiserror::Error;

/// Structural problems with engine input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// Bar dates must be strictly increasing (and therefore unique).
    #[error("bar {index} dated {current} does not follow previous bar dated {previous}")]
    NonIncreasingDates {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },

    /// A rolling window must cover at least one position.
    #[error("window size must be at least 1")]
    InvalidWindow,
}

/// Failures while obtaining a bar series from a remote source.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("'{0}' is not a valid ticker symbol")]
    InvalidSymbol(String),

    #[error("symbol '{0}' was not found by the data provider")]
    SymbolNotFound(String),

    #[error("request for '{0}' timed out")]
    FetchTimeout(String),

    #[error("data provider returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("request to data provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("malformed provider response: {0}")]
    Malformed(String),

    #[error("no bars available for '{0}' in the requested range")]
    NoData(String),

    #[error("provider returned an invalid series: {0}")]
    InvalidSeries(#[from] EngineError),
}

impl DataSourceError {
    /// Short machine-readable name of the error kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidSymbol(_) => "invalid_symbol",
            Self::SymbolNotFound(_) => "symbol_not_found",
            Self::FetchTimeout(_) => "fetch_timeout",
            Self::Http { .. } => "http",
            Self::Request(_) => "request",
            Self::Malformed(_) => "malformed_response",
            Self::NoData(_) => "no_data",
            Self::InvalidSeries(_) => "invalid_series",
        }
    }
}
