//! Savings goals: amounts to put aside by a deadline, with derived
//! progress and a one-way completion latch.

pub mod core;
pub mod create_endpoint;
pub mod delete_endpoint;
pub mod goals_endpoint;
pub mod update_endpoint;

pub use core::create_savings_goal_table;
pub use create_endpoint::create_goal_endpoint;
pub use delete_endpoint::delete_goal_endpoint;
pub use goals_endpoint::goals_endpoint;
pub use update_endpoint::update_goal_endpoint;
