//! Voter-record construction for the write path.
//!
//! Builds a fresh `VoterRecord` from the raw write arguments, enforcing
//! the provisional-mode invariant and decoding the verification code
//! before any card I/O is attempted.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::domain::{AppError, Result, VoterRecord, TIMESTAMP_FORMAT};

/// Builds the record that a write request will put on the card.
///
/// `provisional_code` is honored only when `provisional_mode > 0`; for
/// mode 0 the stored code is forced empty regardless of what was
/// supplied, so the invalid combination never reaches the card.
///
/// # Errors
/// Returns `AppError::Decode` when the verification code is not valid
/// base64; no write is attempted in that case.
pub fn build_voter_record(
    voter_session_id: &str,
    provisional_mode: i32,
    verification_code_b64: &str,
    avs_mode: &str,
    provisional_code: Option<&str>,
) -> Result<VoterRecord> {
    // Message text is what deployed wrappers already match on, even though
    // the field being decoded here is the verification code.
    let verification_code = STANDARD
        .decode(verification_code_b64)
        .map_err(|e| AppError::decode("Failed to decode Election Signature", e))?;

    let provisional_code = if provisional_mode > 0 {
        provisional_code.unwrap_or_default().to_string()
    } else {
        String::new()
    };

    Ok(VoterRecord {
        voter_session_id: voter_session_id.to_string(),
        provisional_mode,
        provisional_code,
        verification_code,
        avs_mode: avs_mode.to_string(),
        language: None,
        voting_session_status: 0,
        error_code: String::new(),
        creation_time_stamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
        voting_end_time: None,
        tabulator_number: None,
    })
}
