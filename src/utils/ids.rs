/*!
 * Identifier generation for batches and bureau-facing request ids.
 *
 * Both are lowercase hex strings derived from a v4 UUID: batch ids use the
 * full 32 characters, request ids the first 24 so they stay within the
 * bureau's field width.
 */

use uuid::Uuid;

pub const REQUEST_ID_LENGTH: usize = 24;

/// New unique batch identifier
pub fn generate_batch_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// New bureau-facing request identifier
pub fn generate_request_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(REQUEST_ID_LENGTH);
    id
}
