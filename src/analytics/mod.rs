//! The analytics view: the dashboard's aggregates plus the per-category
//! breakdown and the raw records behind them.

pub mod endpoint;

pub use endpoint::analytics_endpoint;
