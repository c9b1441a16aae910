//! Monthly insights: spending comparisons, budget alerts and rule-based
//! recommendations.

pub mod core;
pub mod endpoint;

pub use endpoint::insights_endpoint;
