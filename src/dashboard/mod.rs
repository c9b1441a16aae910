//! The monthly dashboard: headline spending figures, the daily trend and
//! the most recent expenses.

pub mod endpoint;

pub use endpoint::dashboard_endpoint;
