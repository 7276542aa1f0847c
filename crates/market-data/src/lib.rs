//! Upstream market-data collaborator: fetches fundamentals and price history
//! and hands the rest of the system fully defaulted records.

pub mod yahoo_finance;

pub use yahoo_finance::{bars_from_chart, snapshot_from_summary, YahooFinanceClient};
