//! Purging every record that belongs to an owner.

pub mod endpoint;

pub use endpoint::delete_profile_endpoint;
