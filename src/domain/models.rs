//! Domain models for card records.
//!
//! These models represent the two record kinds stored on the physical
//! cards plus the card classification reported by the Card Access Service.

use serde::{Deserialize, Serialize};

/// Timestamp format stamped into voter records at creation.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Classification of the inserted card.
///
/// Determined solely by the Card Access Service and immutable for the
/// duration of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardType {
    /// Privileged pollworker token carrying the election signature.
    Administrator,
    /// Token carrying one voter's session record.
    Voter,
    /// Blank card with no recognized applet data.
    Empty,
    /// Card that could not be classified.
    Unknown,
}

impl std::fmt::Display for CardType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Administrator => write!(f, "Pollworker Card"),
            Self::Voter => write!(f, "Voter Card"),
            Self::Empty => write!(f, "Empty Card"),
            Self::Unknown => write!(f, "Unknown Card"),
        }
    }
}

/// Record stored on a pollworker (administrator) card.
///
/// Read-only from this system's perspective; never written here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdministratorRecord {
    /// Opaque election signature blob.
    pub election_signature: Vec<u8>,
    /// Set by the Card Access Service if the read failed; `None` or empty
    /// means success.
    #[serde(default)]
    pub error_code: Option<String>,
}

impl AdministratorRecord {
    /// Whether the service reported a clean read.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.error_code.as_deref().is_none_or(str::is_empty)
    }
}

/// Record stored on a voter card.
///
/// Built fresh on every write request (no read-modify-write); a write
/// fully overwrites whatever was previously on the card.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoterRecord {
    pub voter_session_id: String,
    /// 0 = regular, > 0 = provisional (variant-specific).
    pub provisional_mode: i32,
    /// Non-empty iff `provisional_mode > 0`.
    pub provisional_code: String,
    /// Opaque verification blob, supplied base64-encoded on the CLI.
    pub verification_code: Vec<u8>,
    pub avs_mode: String,
    #[serde(default)]
    pub language: Option<String>,
    /// 0 at creation, otherwise only ever read back from the card.
    pub voting_session_status: i32,
    /// Empty at creation.
    pub error_code: String,
    /// `YYYYMMDDhhmmss`, stamped once at creation, never recomputed.
    pub creation_time_stamp: String,
    /// Populated only by a prior voting event; never set by this system.
    #[serde(default)]
    pub voting_end_time: Option<String>,
    /// Populated only by a prior voting event; never set by this system.
    #[serde(default)]
    pub tabulator_number: Option<i32>,
}

/// Outcome of a voter-record write reported by the Card Access Service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WriteOutcome {
    Ok,
    Failed,
}
