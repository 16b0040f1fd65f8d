//! Port (interface) for the Card Access Service.
//!
//! The router talks to card hardware exclusively through this trait; any
//! concrete backend (PC/SC driver, in-memory simulator, test mock)
//! satisfies it. All calls are synchronous and blocking.

use super::error::Result;
use super::models::{AdministratorRecord, CardType, VoterRecord, WriteOutcome};

/// Capability surface exposed by the Card Access Service.
///
/// The `u8` returned alongside records is the PIN retry counter reported
/// by the card. It is surfaced to callers but not consulted by the
/// router; retry policy, if any, belongs to the service itself.
pub trait CardService {
    /// Enumerates attached reader identifiers.
    fn list_readers(&self) -> Result<Vec<String>>;

    /// Selects a reader for the session, or deselects with `None`.
    fn select_reader(&mut self, reader: Option<&str>) -> Result<()>;

    /// Whether a card is inserted in the selected reader.
    fn is_card_present(&self) -> Result<bool>;

    /// Classifies the inserted card.
    fn classify_card(&self) -> Result<CardType>;

    /// Reads the administrator record from a pollworker card.
    ///
    /// `None` means the read failed below the record layer (the record
    /// could not be materialized at all).
    fn read_administrator_record(&self, pin: &str)
        -> Result<(Option<AdministratorRecord>, u8)>;

    /// Reads the voter record from a voter card.
    fn read_voter_record(&self, pin: &str) -> Result<(Option<VoterRecord>, u8)>;

    /// Writes a voter record, overwriting the card when `overwrite` is set.
    fn write_voter_record(
        &mut self,
        pin: &str,
        record: &VoterRecord,
        overwrite: bool,
    ) -> Result<WriteOutcome>;
}
