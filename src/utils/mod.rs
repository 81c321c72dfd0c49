//! Shared helpers.

pub mod ids;

pub use ids::{generate_batch_id, generate_request_id, REQUEST_ID_LENGTH};
