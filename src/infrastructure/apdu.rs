//! ISO 7816-4 command framing for the PC/SC adapter.
//!
//! The helper applets on both card types expose a single transparent
//! data object holding the record as a JSON blob; this module builds the
//! SELECT / VERIFY / READ BINARY / UPDATE BINARY commands that move it,
//! and decodes the status word trailer of each response.

use crate::domain::{AppError, Result};

/// Applet identifier for the pollworker (administrator) applet.
pub const ADMIN_AID: &[u8] = &[0xA0, 0x00, 0x00, 0x07, 0x56, 0x01];
/// Applet identifier for the voter applet.
pub const VOTER_AID: &[u8] = &[0xA0, 0x00, 0x00, 0x07, 0x56, 0x02];

/// Largest chunk moved by one READ/UPDATE BINARY exchange.
pub const CHUNK_SIZE: usize = 0xFF;

/// Status word constants (ISO 7816-4 subset used here).
pub struct Sw;

impl Sw {
    pub const SUCCESS: u16 = 0x9000;
    pub const AUTH_METHOD_BLOCKED: u16 = 0x6983;

    /// Whether a status word is a PIN counter warning (63Cx); returns the
    /// remaining tries when it is.
    #[must_use]
    pub fn pin_tries_remaining(sw: u16) -> Option<u8> {
        if sw & 0xFFF0 == 0x63C0 {
            Some((sw & 0x000F) as u8)
        } else {
            None
        }
    }
}

/// A card response split into payload and status word.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardResponse {
    pub data: Vec<u8>,
    pub sw: u16,
}

impl CardResponse {
    /// Splits a raw response into payload and trailing status word.
    ///
    /// # Errors
    /// Returns a service error when fewer than two bytes came back.
    pub fn parse(raw: &[u8]) -> Result<Self> {
        if raw.len() < 2 {
            return Err(AppError::service(format!(
                "Card returned a truncated response ({} bytes)",
                raw.len()
            )));
        }
        let (data, trailer) = raw.split_at(raw.len() - 2);
        Ok(Self {
            data: data.to_vec(),
            sw: (u16::from(trailer[0]) << 8) | u16::from(trailer[1]),
        })
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.sw == Sw::SUCCESS
    }
}

/// SELECT by applet identifier.
#[must_use]
pub fn select_aid(aid: &[u8]) -> Vec<u8> {
    let mut apdu = vec![0x00, 0xA4, 0x04, 0x00, aid.len() as u8];
    apdu.extend_from_slice(aid);
    apdu
}

/// VERIFY the operator PIN against the selected applet.
#[must_use]
pub fn verify_pin(pin: &str) -> Vec<u8> {
    let mut apdu = vec![0x00, 0x20, 0x00, 0x80, pin.len() as u8];
    apdu.extend_from_slice(pin.as_bytes());
    apdu
}

/// READ BINARY one chunk at the given offset.
#[must_use]
pub fn read_binary(offset: u16, length: u8) -> Vec<u8> {
    vec![0x00, 0xB0, (offset >> 8) as u8, (offset & 0xFF) as u8, length]
}

/// UPDATE BINARY one chunk at the given offset.
#[must_use]
pub fn update_binary(offset: u16, chunk: &[u8]) -> Vec<u8> {
    let mut apdu = vec![
        0x00,
        0xD6,
        (offset >> 8) as u8,
        (offset & 0xFF) as u8,
        chunk.len() as u8,
    ];
    apdu.extend_from_slice(chunk);
    apdu
}
