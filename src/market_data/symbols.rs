// =============================================================================
// Ticker Directory — S&P 500 constituents with an in-memory TTL cache
// =============================================================================
//
// The constituent table is a CSV with a `Symbol` column.  A failed refresh
// keeps serving the previous list; if nothing was ever fetched the configured
// fallback list is served instead.  The lock is never held across `.await`.
// =============================================================================

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use parking_lot::RwLock;
use serde::Deserialize;
use tracing::{info, instrument, warn};

pub const DEFAULT_SYMBOL_LIST_URL: &str =
    "https://raw.githubusercontent.com/datasets/s-and-p-500-companies/main/data/constituents.csv";

/// Longest ticker accepted at the API boundary.
const MAX_SYMBOL_LEN: usize = 10;

/// Return `true` for 1–10 characters of `[A-Za-z0-9.-]`.
pub fn is_valid_symbol(symbol: &str) -> bool {
    !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
}

#[derive(Debug, Deserialize)]
struct ConstituentRow {
    #[serde(rename = "Symbol")]
    symbol: String,
}

/// Parse the constituent CSV into a sorted, deduplicated, upper-case list.
pub fn parse_symbol_csv(data: &[u8]) -> Result<Vec<String>> {
    let mut reader = csv::Reader::from_reader(data);
    let mut symbols = Vec::new();

    for row in reader.deserialize::<ConstituentRow>() {
        let row = row.context("failed to parse constituent row")?;
        let symbol = row.symbol.trim().to_uppercase();
        if is_valid_symbol(&symbol) {
            symbols.push(symbol);
        } else {
            warn!(symbol = %row.symbol, "skipping malformed ticker in constituent list");
        }
    }

    symbols.sort();
    symbols.dedup();
    Ok(symbols)
}

struct CachedList {
    symbols: Vec<String>,
    fetched_at: Instant,
}

/// Cached view of the valid ticker list.
pub struct SymbolDirectory {
    url: String,
    ttl: Duration,
    fallback: Vec<String>,
    client: reqwest::Client,
    cache: RwLock<Option<CachedList>>,
}

impl SymbolDirectory {
    pub fn new(url: impl Into<String>, ttl: Duration, fallback: Vec<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build reqwest client for symbol directory")?;

        let mut fallback: Vec<String> = fallback.into_iter().map(|s| s.trim().to_uppercase()).collect();
        fallback.sort();
        fallback.dedup();

        Ok(Self {
            url: url.into(),
            ttl,
            fallback,
            client,
            cache: RwLock::new(None),
        })
    }

    /// Current ticker list, refreshing from the remote table when the cache
    /// is empty or stale.
    pub async fn symbols(&self) -> Vec<String> {
        if let Some(fresh) = self.cached(true) {
            return fresh;
        }

        match self.fetch().await {
            Ok(symbols) if !symbols.is_empty() => {
                info!(count = symbols.len(), "symbol directory refreshed");
                *self.cache.write() = Some(CachedList {
                    symbols: symbols.clone(),
                    fetched_at: Instant::now(),
                });
                symbols
            }
            Ok(_) => {
                warn!(url = %self.url, "symbol directory returned no symbols");
                self.cached(false).unwrap_or_else(|| self.fallback.clone())
            }
            Err(e) => {
                warn!(error = %e, url = %self.url, "symbol directory refresh failed");
                self.cached(false).unwrap_or_else(|| self.fallback.clone())
            }
        }
    }

    fn cached(&self, require_fresh: bool) -> Option<Vec<String>> {
        let cache = self.cache.read();
        cache
            .as_ref()
            .filter(|c| !require_fresh || c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.symbols.clone())
    }

    #[instrument(skip(self), name = "symbols::fetch")]
    async fn fetch(&self) -> Result<Vec<String>> {
        let resp = self
            .client
            .get(&self.url)
            .send()
            .await
            .context("GET constituent list request failed")?;

        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("constituent list returned {status}");
        }

        let bytes = resp.bytes().await.context("failed to read constituent list body")?;
        parse_symbol_csv(&bytes)
    }
}

impl std::fmt::Debug for SymbolDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymbolDirectory")
            .field("url", &self.url)
            .field("ttl", &self.ttl)
            .field("fallback", &self.fallback.len())
            .finish()
    }
}
