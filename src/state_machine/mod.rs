// State machine module for print request fulfillment
//
// Status vocabulary, the bureau step/outcome lookup table, and the append-only
// transition helpers used by batching and response processing.

pub mod errors;
pub mod events;
pub mod print_request_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::{status_for_batch_outcome, status_for_step, ResponseOutcome, StatusStep};
pub use states::PrintRequestStatus;
pub use print_request_state_machine::{
    advance, apply_batch_outcome, apply_step_response, assign_to_batch, release_from_batch,
    reset_for_rebatching,
};
