//! Status report rendering.
//!
//! Renders a record (or the absence of one) as the tagged-segment text
//! consumed by the surrounding election tooling. Field values are
//! inserted verbatim; segment order is part of the contract.

use crate::domain::{AdministratorRecord, CardType, VoterRecord};

/// Renders the type-name-only report used by the `check` operation.
#[must_use]
pub fn describe_card_type(card_type: CardType) -> String {
    card_type.to_string()
}

/// Renders the full status report for a pollworker card.
///
/// The signature is rendered as uppercase hex here; the setup-read path
/// emits the same bytes base64-encoded. Both encodings have external
/// consumers, so they are kept distinct.
#[must_use]
pub fn describe_administrator(record: Option<&AdministratorRecord>) -> String {
    match record {
        Some(record) if record.is_ok() => {
            format!(
                "<cardType>pollworker</cardType><signature>{}</signature>",
                hex::encode_upper(&record.election_signature)
            )
        }
        Some(record) => format!(
            "Error: Reading Pollworker Card - {}",
            record.error_code.as_deref().unwrap_or_default()
        ),
        None => "Error: Reading Pollworker Card".to_string(),
    }
}

/// Renders the full status report for a voter card.
///
/// Segment order is fixed; optional fields render as empty strings
/// rather than being omitted.
#[must_use]
pub fn describe_voter(record: Option<&VoterRecord>) -> String {
    let Some(record) = record else {
        return "Error: Reading Voter Card".to_string();
    };

    let mut out = String::from("<cardType>voter</cardType>");
    push_segment(&mut out, "voterSessionId", &record.voter_session_id);
    push_segment(
        &mut out,
        "provisionalMode",
        &record.provisional_mode.to_string(),
    );
    push_segment(&mut out, "provisionalCode", &record.provisional_code);
    push_segment(&mut out, "avsMode", &record.avs_mode);
    push_segment(&mut out, "language", record.language.as_deref().unwrap_or(""));
    push_segment(
        &mut out,
        "votingSessionStatus",
        &record.voting_session_status.to_string(),
    );
    push_segment(&mut out, "errorCode", &record.error_code);
    push_segment(&mut out, "creationTimeStamp", &record.creation_time_stamp);
    push_segment(
        &mut out,
        "votedTimeStamp",
        record.voting_end_time.as_deref().unwrap_or(""),
    );
    push_segment(
        &mut out,
        "votedMachine",
        &record
            .tabulator_number
            .map(|n| n.to_string())
            .unwrap_or_default(),
    );
    push_segment(
        &mut out,
        "signature",
        &hex::encode_upper(&record.verification_code),
    );
    out
}

/// Fixed report for a blank card.
#[must_use]
pub fn describe_empty() -> String {
    "<cardType>empty</cardType>".to_string()
}

/// Fixed report for an unclassifiable card.
#[must_use]
pub fn describe_unknown() -> String {
    "<cardType>unknown</cardType>".to_string()
}

fn push_segment(out: &mut String, name: &str, value: &str) {
    out.push('<');
    out.push_str(name);
    out.push('>');
    out.push_str(value);
    out.push_str("</");
    out.push_str(name);
    out.push('>');
}
