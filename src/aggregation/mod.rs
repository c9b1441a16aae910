//! Period-aware aggregation over expenses: SQL aggregates and daily
//! bucketing strategies.

pub mod bucketer;
pub mod engine;

pub use bucketer::{
    DailyBucketer, DailyTotal, RawRecordLocalBucketer, ServerGroupedBucketer, local_day_total,
};
pub use engine::{
    CategorySpend, CategoryTotal, category_totals, count_for_period, highest_category,
    top_categories, total_for_day, total_for_period,
};
