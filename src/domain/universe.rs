//! Symbol list parsing.

use std::collections::HashSet;

use tracing::debug;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in symbol list")]
    EmptyToken,

    #[error("symbol list is empty")]
    NoSymbols,

    #[error("invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Split a comma separated list into upper-cased symbols.
///
/// Order is kept; repeated symbols are dropped after their first occurrence.
pub fn parse_symbols(input: &str) -> Result<Vec<String>, UniverseError> {
    if input.trim().is_empty() {
        return Err(UniverseError::NoSymbols);
    }

    let mut symbols = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '^' | '='))
        {
            return Err(UniverseError::InvalidSymbol(trimmed.to_string()));
        }
        let symbol = trimmed.to_uppercase();
        if !seen.insert(symbol.clone()) {
            debug!(symbol = %symbol, "dropping repeated symbol");
            continue;
        }
        symbols.push(symbol);
    }

    Ok(symbols)
}
