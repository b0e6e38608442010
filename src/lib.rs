/// Immutable cash and stock transactions, validated on construction.
pub mod transaction;

/// Exchange listings and the share holdings that point at them.
pub mod listing;

/// Registry of listings keyed by ticker symbol.
pub mod exchange;

/// Savings and brokerage accounts. A brokerage trade coordinates the
/// listing's share pool, the patron's savings balance and the holdings.
pub mod account;

/// Bank customers and the two account slots each of them owns.
pub mod patron;

/// Bank interface, plus "in memory" implementation.
/// Issues patrons and accounts and routes transactions to them.
pub mod bank;

/// Failure classification shared by every error type in the crate.
pub mod error;

/// Scenario runner used by the binary and the integration test.
/// Reads bank operations from CSV and prints patron summaries as CSV.
pub mod bin_utils;
