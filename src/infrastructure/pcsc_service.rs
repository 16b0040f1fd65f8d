//! PC/SC adapter for the Card Access Service.
//!
//! Talks to the helper applets through a PC/SC stack. Both applets store
//! their record as a length-prefixed JSON blob in one transparent file;
//! reads and writes are chunked READ/UPDATE BINARY exchanges after PIN
//! verification.

use std::cell::RefCell;
use std::ffi::CString;
use std::time::Duration;

use pcsc::{Card, Context, Disposition, Protocols, ReaderState, Scope, ShareMode, State};

use crate::domain::{
    AdministratorRecord, AppError, CardService, CardType, Result, VoterRecord, WriteOutcome,
};

use super::apdu::{self, CardResponse, Sw, CHUNK_SIZE};

/// Retry count reported alongside reads when the card itself does not
/// volunteer one. Callers treat the counter as informational only.
const DEFAULT_PIN_RETRIES: u8 = 3;

/// Production Card Access Service over PC/SC.
pub struct PcscCardService {
    ctx: Context,
    reader: Option<String>,
    // Connection is lazy: `&self` record operations connect on first use.
    card: RefCell<Option<Card>>,
}

impl PcscCardService {
    /// Establishes a PC/SC context.
    ///
    /// # Errors
    /// Returns a service error when no PC/SC stack is available.
    pub fn new() -> Result<Self> {
        let ctx = Context::establish(Scope::User)
            .map_err(|e| AppError::pcsc("Failed to establish PC/SC context", e))?;
        Ok(Self {
            ctx,
            reader: None,
            card: RefCell::new(None),
        })
    }

    /// Connects to the selected reader if not already connected.
    fn ensure_connected(&self) -> Result<()> {
        if self.card.borrow().is_some() {
            return Ok(());
        }
        let reader = self
            .reader
            .as_deref()
            .ok_or_else(|| AppError::service("No reader selected"))?;
        let name = reader_cstring(reader)?;
        let card = self
            .ctx
            .connect(&name, ShareMode::Shared, Protocols::ANY)
            .map_err(|e| AppError::pcsc(format!("Failed to connect to reader {reader}"), e))?;
        self.card.borrow_mut().replace(card);
        Ok(())
    }

    /// Transmits one APDU and splits the response.
    fn transmit(&self, send: &[u8]) -> Result<CardResponse> {
        self.ensure_connected()?;
        let card_ref = self.card.borrow();
        let card = card_ref
            .as_ref()
            .ok_or_else(|| AppError::service("No card connection"))?;
        let mut buffer = [0u8; pcsc::MAX_BUFFER_SIZE];
        let raw = card
            .transmit(send, &mut buffer)
            .map_err(|e| AppError::pcsc("Card transmission failed", e))?;
        CardResponse::parse(raw)
    }

    /// Selects an applet; `Ok(true)` when the applet answered success.
    fn select_applet(&self, aid: &[u8]) -> Result<bool> {
        Ok(self.transmit(&apdu::select_aid(aid))?.is_success())
    }

    /// Verifies the PIN against the selected applet.
    ///
    /// `Ok(None)` means verified; `Ok(Some(tries))` means rejected with
    /// that many tries remaining (0 when blocked).
    fn verify_pin(&self, pin: &str) -> Result<Option<u8>> {
        let resp = self.transmit(&apdu::verify_pin(pin))?;
        if resp.is_success() {
            return Ok(None);
        }
        if let Some(tries) = Sw::pin_tries_remaining(resp.sw) {
            return Ok(Some(tries));
        }
        if resp.sw == Sw::AUTH_METHOD_BLOCKED {
            return Ok(Some(0));
        }
        Err(AppError::service(format!(
            "PIN verification failed (SW {:04X})",
            resp.sw
        )))
    }

    /// Reads the record blob: two-byte big-endian length, then payload.
    fn read_record_blob(&self) -> Result<Vec<u8>> {
        let header = self.transmit(&apdu::read_binary(0, 2))?;
        if !header.is_success() || header.data.len() < 2 {
            return Err(AppError::service(format!(
                "Failed to read record header (SW {:04X})",
                header.sw
            )));
        }
        let length = usize::from(u16::from_be_bytes([header.data[0], header.data[1]]));
        let mut blob = Vec::with_capacity(length);
        let mut offset = 2usize;
        while blob.len() < length {
            let want = (length - blob.len()).min(CHUNK_SIZE) as u8;
            let resp = self.transmit(&apdu::read_binary(offset as u16, want))?;
            if !resp.is_success() || resp.data.is_empty() {
                return Err(AppError::service(format!(
                    "Failed to read record at offset {offset} (SW {:04X})",
                    resp.sw
                )));
            }
            offset += resp.data.len();
            blob.extend_from_slice(&resp.data);
        }
        Ok(blob)
    }

    /// Writes the record blob with its length prefix, chunked.
    fn write_record_blob(&self, payload: &[u8]) -> Result<bool> {
        if payload.len() > usize::from(u16::MAX) - 2 {
            return Err(AppError::service("Record too large for card storage"));
        }
        let mut framed = Vec::with_capacity(payload.len() + 2);
        framed.extend_from_slice(&(payload.len() as u16).to_be_bytes());
        framed.extend_from_slice(payload);

        let mut offset = 0usize;
        for chunk in framed.chunks(CHUNK_SIZE) {
            let resp = self.transmit(&apdu::update_binary(offset as u16, chunk))?;
            if !resp.is_success() {
                tracing::warn!("Write rejected at offset {} (SW {:04X})", offset, resp.sw);
                return Ok(false);
            }
            offset += chunk.len();
        }
        Ok(true)
    }

    fn disconnect(&self) {
        if let Some(card) = self.card.borrow_mut().take() {
            if let Err((_, e)) = card.disconnect(Disposition::LeaveCard) {
                tracing::warn!("Failed to disconnect card: {}", e);
            }
        }
    }
}

impl CardService for PcscCardService {
    fn list_readers(&self) -> Result<Vec<String>> {
        let mut buffer = vec![0u8; 4096];
        let readers = self
            .ctx
            .list_readers(&mut buffer)
            .map_err(|e| AppError::pcsc("Failed to list readers", e))?;
        Ok(readers
            .map(|r| r.to_string_lossy().into_owned())
            .collect())
    }

    fn select_reader(&mut self, reader: Option<&str>) -> Result<()> {
        self.disconnect();
        self.reader = reader.map(ToString::to_string);
        Ok(())
    }

    fn is_card_present(&self) -> Result<bool> {
        let reader = self
            .reader
            .as_deref()
            .ok_or_else(|| AppError::service("No reader selected"))?;
        let name = reader_cstring(reader)?;
        let mut states = [ReaderState::new(name, State::UNAWARE)];
        self.ctx
            .get_status_change(Duration::ZERO, &mut states)
            .map_err(|e| AppError::pcsc("Failed to query reader status", e))?;
        Ok(states[0].event_state().contains(State::PRESENT))
    }

    fn classify_card(&self) -> Result<CardType> {
        if self.select_applet(apdu::ADMIN_AID)? {
            return Ok(CardType::Administrator);
        }
        if self.select_applet(apdu::VOTER_AID)? {
            // A provisioned but unwritten card answers with a zero-length
            // record; that is the "empty" classification.
            let header = self.transmit(&apdu::read_binary(0, 2))?;
            if header.is_success() && header.data.len() >= 2 {
                let length = u16::from_be_bytes([header.data[0], header.data[1]]);
                return Ok(if length == 0 {
                    CardType::Empty
                } else {
                    CardType::Voter
                });
            }
            return Ok(CardType::Voter);
        }
        Ok(CardType::Unknown)
    }

    fn read_administrator_record(
        &self,
        pin: &str,
    ) -> Result<(Option<AdministratorRecord>, u8)> {
        if !self.select_applet(apdu::ADMIN_AID)? {
            return Ok((None, DEFAULT_PIN_RETRIES));
        }
        if let Some(tries) = self.verify_pin(pin)? {
            let record = AdministratorRecord {
                election_signature: Vec::new(),
                error_code: Some("PIN verification failed".to_string()),
            };
            return Ok((Some(record), tries));
        }
        let blob = self.read_record_blob()?;
        let record: AdministratorRecord = serde_json::from_slice(&blob)
            .map_err(|e| AppError::service(format!("Malformed administrator record: {e}")))?;
        Ok((Some(record), DEFAULT_PIN_RETRIES))
    }

    fn read_voter_record(&self, pin: &str) -> Result<(Option<VoterRecord>, u8)> {
        if !self.select_applet(apdu::VOTER_AID)? {
            return Ok((None, DEFAULT_PIN_RETRIES));
        }
        if let Some(tries) = self.verify_pin(pin)? {
            return Ok((None, tries));
        }
        let blob = self.read_record_blob()?;
        let record: VoterRecord = serde_json::from_slice(&blob)
            .map_err(|e| AppError::service(format!("Malformed voter record: {e}")))?;
        Ok((Some(record), DEFAULT_PIN_RETRIES))
    }

    fn write_voter_record(
        &mut self,
        pin: &str,
        record: &VoterRecord,
        overwrite: bool,
    ) -> Result<WriteOutcome> {
        if !overwrite && self.classify_card()? == CardType::Voter {
            return Ok(WriteOutcome::Failed);
        }
        if !self.select_applet(apdu::VOTER_AID)? {
            return Ok(WriteOutcome::Failed);
        }
        if self.verify_pin(pin)?.is_some() {
            return Ok(WriteOutcome::Failed);
        }
        let payload = serde_json::to_vec(record)
            .map_err(|e| AppError::service(format!("Failed to encode voter record: {e}")))?;
        if self.write_record_blob(&payload)? {
            Ok(WriteOutcome::Ok)
        } else {
            Ok(WriteOutcome::Failed)
        }
    }
}

impl Drop for PcscCardService {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn reader_cstring(reader: &str) -> Result<CString> {
    CString::new(reader)
        .map_err(|_| AppError::service(format!("Reader name contains NUL: {reader}")))
}
