//! Batch partial updates
//!
//! Shape validation for changesets before they are sent to the activity
//! batch endpoint.

pub mod validator;

pub use validator::validate_changes;
