//! In-memory Card Access Service.
//!
//! Backs the test suite and doubles as a simulator backend: with a state
//! file configured, the card contents survive between invocations so an
//! operator can rehearse a full check-in flow without hardware.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::domain::{
    AdministratorRecord, AppError, CardService, CardType, Result, VoterRecord, WriteOutcome,
};

/// Retry count reported alongside reads; informational only.
const DEFAULT_PIN_RETRIES: u8 = 3;

/// Contents of the simulated card slot.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum CardSlot {
    /// No card inserted in the reader.
    #[default]
    Absent,
    /// Provisioned but unwritten card.
    Empty,
    /// Card that answers no known applet.
    Unrecognized,
    Administrator(AdministratorRecord),
    Voter(VoterRecord),
}

/// In-memory Card Access Service adapter.
#[derive(Debug, Default)]
pub struct MemoryCardService {
    readers: Vec<String>,
    selected: Option<String>,
    slot: CardSlot,
    state_path: Option<PathBuf>,
    fail_next_write: bool,
}

impl MemoryCardService {
    /// A service with one reader and the given card slot.
    #[must_use]
    pub fn new(slot: CardSlot) -> Self {
        Self {
            readers: vec!["Simulated Reader 0".to_string()],
            slot,
            ..Self::default()
        }
    }

    /// A service whose state is loaded from (and written back to) a JSON
    /// file, so the simulated card persists across invocations.
    ///
    /// A missing file starts with an empty card.
    ///
    /// # Errors
    /// Returns a service error when the file exists but cannot be parsed.
    pub fn with_state_file(path: &Path) -> Result<Self> {
        let slot = if path.exists() {
            let content = fs::read_to_string(path).map_err(|e| {
                AppError::service(format!("Failed to read state file {}: {e}", path.display()))
            })?;
            serde_json::from_str(&content).map_err(|e| {
                AppError::service(format!("Malformed state file {}: {e}", path.display()))
            })?
        } else {
            CardSlot::Empty
        };
        let mut service = Self::new(slot);
        service.state_path = Some(path.to_path_buf());
        Ok(service)
    }

    /// A service with no readers attached.
    #[must_use]
    pub fn without_readers() -> Self {
        Self::default()
    }

    /// A service with a reader but no card inserted.
    #[must_use]
    pub fn with_no_card() -> Self {
        Self::new(CardSlot::Absent)
    }

    /// A service holding a provisioned but unwritten card.
    #[must_use]
    pub fn with_empty_card() -> Self {
        Self::new(CardSlot::Empty)
    }

    /// A service holding a card that answers no known applet.
    #[must_use]
    pub fn with_unrecognized_card() -> Self {
        Self::new(CardSlot::Unrecognized)
    }

    /// A service holding a pollworker card with the given record.
    #[must_use]
    pub fn with_administrator_card(record: AdministratorRecord) -> Self {
        Self::new(CardSlot::Administrator(record))
    }

    /// A service holding a voter card with the given record.
    #[must_use]
    pub fn with_voter_card(record: VoterRecord) -> Self {
        Self::new(CardSlot::Voter(record))
    }

    /// Makes the next write report a non-Ok outcome.
    pub fn fail_next_write(&mut self) {
        self.fail_next_write = true;
    }

    /// Currently selected reader, if any.
    #[must_use]
    pub fn selected_reader(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// The voter record on the card, if one was written.
    #[must_use]
    pub fn written_record(&self) -> Option<&VoterRecord> {
        match &self.slot {
            CardSlot::Voter(record) => Some(record),
            _ => None,
        }
    }

    fn persist(&self) -> Result<()> {
        let Some(path) = &self.state_path else {
            return Ok(());
        };
        let content = serde_json::to_string_pretty(&self.slot)
            .map_err(|e| AppError::service(format!("Failed to encode state: {e}")))?;
        fs::write(path, content).map_err(|e| {
            AppError::service(format!("Failed to write state file {}: {e}", path.display()))
        })
    }

    fn require_selected(&self) -> Result<()> {
        if self.selected.is_none() {
            return Err(AppError::service("No reader selected"));
        }
        Ok(())
    }
}

impl CardService for MemoryCardService {
    fn list_readers(&self) -> Result<Vec<String>> {
        Ok(self.readers.clone())
    }

    fn select_reader(&mut self, reader: Option<&str>) -> Result<()> {
        match reader {
            Some(name) => {
                if !self.readers.iter().any(|r| r == name) {
                    return Err(AppError::service(format!("Unknown reader: {name}")));
                }
                self.selected = Some(name.to_string());
            }
            None => self.selected = None,
        }
        Ok(())
    }

    fn is_card_present(&self) -> Result<bool> {
        self.require_selected()?;
        Ok(!matches!(self.slot, CardSlot::Absent))
    }

    fn classify_card(&self) -> Result<CardType> {
        self.require_selected()?;
        Ok(match &self.slot {
            CardSlot::Administrator(_) => CardType::Administrator,
            CardSlot::Voter(_) => CardType::Voter,
            CardSlot::Empty => CardType::Empty,
            CardSlot::Unrecognized => CardType::Unknown,
            CardSlot::Absent => return Err(AppError::NoCard),
        })
    }

    fn read_administrator_record(
        &self,
        _pin: &str,
    ) -> Result<(Option<AdministratorRecord>, u8)> {
        self.require_selected()?;
        match &self.slot {
            CardSlot::Administrator(record) => Ok((Some(record.clone()), DEFAULT_PIN_RETRIES)),
            _ => Ok((None, DEFAULT_PIN_RETRIES)),
        }
    }

    fn read_voter_record(&self, _pin: &str) -> Result<(Option<VoterRecord>, u8)> {
        self.require_selected()?;
        match &self.slot {
            CardSlot::Voter(record) => Ok((Some(record.clone()), DEFAULT_PIN_RETRIES)),
            _ => Ok((None, DEFAULT_PIN_RETRIES)),
        }
    }

    fn write_voter_record(
        &mut self,
        _pin: &str,
        record: &VoterRecord,
        overwrite: bool,
    ) -> Result<WriteOutcome> {
        self.require_selected()?;
        if self.fail_next_write {
            self.fail_next_write = false;
            return Ok(WriteOutcome::Failed);
        }
        if !overwrite && matches!(self.slot, CardSlot::Voter(_)) {
            return Ok(WriteOutcome::Failed);
        }
        self.slot = CardSlot::Voter(record.clone());
        self.persist()?;
        Ok(WriteOutcome::Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn voter_record() -> VoterRecord {
        VoterRecord {
            voter_session_id: "V-1".into(),
            provisional_mode: 0,
            provisional_code: String::new(),
            verification_code: vec![0xAB, 0xCD],
            avs_mode: "standard".into(),
            language: None,
            voting_session_status: 0,
            error_code: String::new(),
            creation_time_stamp: "20260829120000".into(),
            voting_end_time: None,
            tabulator_number: None,
        }
    }

    #[test]
    fn selecting_unknown_reader_fails() {
        let mut service = MemoryCardService::with_empty_card();
        assert!(service.select_reader(Some("No Such Reader")).is_err());
    }

    #[test]
    fn operations_require_a_selected_reader() {
        let service = MemoryCardService::with_empty_card();
        assert!(service.is_card_present().is_err());
        assert!(service.classify_card().is_err());
    }

    #[test]
    fn classification_follows_slot() {
        let mut service = MemoryCardService::with_empty_card();
        let reader = service.list_readers().unwrap().remove(0);
        service.select_reader(Some(&reader)).unwrap();
        assert_eq!(service.classify_card().unwrap(), CardType::Empty);
    }

    #[test]
    fn write_without_overwrite_refuses_written_card() {
        let mut service = MemoryCardService::with_voter_card(voter_record());
        let reader = service.list_readers().unwrap().remove(0);
        service.select_reader(Some(&reader)).unwrap();
        let outcome = service
            .write_voter_record("1234", &voter_record(), false)
            .unwrap();
        assert_eq!(outcome, WriteOutcome::Failed);
    }

    #[test]
    fn state_file_round_trips_the_card() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.json");

        let mut service = MemoryCardService::with_state_file(&path).unwrap();
        let reader = service.list_readers().unwrap().remove(0);
        service.select_reader(Some(&reader)).unwrap();
        assert_eq!(service.classify_card().unwrap(), CardType::Empty);
        service
            .write_voter_record("1234", &voter_record(), true)
            .unwrap();

        let mut reopened = MemoryCardService::with_state_file(&path).unwrap();
        let reader = reopened.list_readers().unwrap().remove(0);
        reopened.select_reader(Some(&reader)).unwrap();
        assert_eq!(reopened.classify_card().unwrap(), CardType::Voter);
        assert_eq!(
            reopened.read_voter_record("1234").unwrap().0.unwrap().voter_session_id,
            "V-1"
        );
    }

    #[test]
    fn malformed_state_file_is_a_service_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("card.json");
        fs::write(&path, "not json").unwrap();
        assert!(MemoryCardService::with_state_file(&path).is_err());
    }
}
