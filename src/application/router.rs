//! Command execution against one reader session.
//!
//! Owns the reader-selection lifecycle: a session selects the first
//! available reader on entry and deselects it on every exit path via a
//! scoped guard, including early returns and panics.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::domain::{
    AppError, CardService, CardType, OperationRequest, Result, WriteOutcome,
};

use super::formatter;
use super::validator::build_voter_record;

/// What one successfully executed operation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The operation completed; the binary prints `Success`.
    Success,
    /// The operation produced a report to print verbatim.
    Report(String),
}

/// Scoped reader selection.
///
/// Holds the service for the duration of one operation; dropping the
/// session deselects the reader unconditionally.
struct ReaderSession<'a> {
    service: &'a mut dyn CardService,
}

impl<'a> ReaderSession<'a> {
    /// Selects the first available reader, resetting any stale selection
    /// beforehand.
    fn open(service: &'a mut dyn CardService) -> Result<Self> {
        service.select_reader(None)?;
        let readers = service.list_readers()?;
        let Some(first) = readers.first() else {
            return Err(AppError::NoReader);
        };
        tracing::debug!("Selecting reader: {}", first);
        service.select_reader(Some(first.as_str()))?;
        Ok(Self { service })
    }

    fn service(&self) -> &dyn CardService {
        &*self.service
    }

    fn service_mut(&mut self) -> &mut dyn CardService {
        &mut *self.service
    }
}

impl Drop for ReaderSession<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.service.select_reader(None) {
            tracing::warn!("Failed to deselect reader: {}", e);
        }
    }
}

/// Executes one validated request against one reader session.
///
/// # Errors
/// Any error family from the taxonomy; the reader is deselected before
/// this returns, on success and failure alike.
pub fn execute(service: &mut dyn CardService, request: &OperationRequest) -> Result<Outcome> {
    let mut session = ReaderSession::open(service)?;

    if !session.service().is_card_present()? {
        return Err(AppError::NoCard);
    }
    let card_type = session.service().classify_card()?;
    tracing::info!("Card classified as {:?}", card_type);

    match request {
        OperationRequest::Test => Ok(Outcome::Success),
        OperationRequest::Check => Ok(Outcome::Report(formatter::describe_card_type(card_type))),
        OperationRequest::SetupRead { pin } => setup_read(&session, card_type, pin),
        OperationRequest::StatusRead { pin } => Ok(Outcome::Report(card_status(
            &session, card_type, pin,
        ))),
        OperationRequest::Write {
            pin,
            voter_session_id,
            provisional_mode,
            verification_code_b64,
            avs_mode,
            provisional_code,
        } => {
            if card_type == CardType::Administrator {
                return Err(AppError::card_type("Pollworker Card Present"));
            }
            let record = build_voter_record(
                voter_session_id,
                *provisional_mode,
                verification_code_b64,
                avs_mode,
                provisional_code.as_deref(),
            )?;
            let outcome = session.service_mut().write_voter_record(pin, &record, true)?;
            if outcome != WriteOutcome::Ok {
                return Err(AppError::service("Failed to write voter card"));
            }
            Ok(Outcome::Success)
        }
    }
}

/// Reads the election signature from a pollworker card, emitted base64.
fn setup_read(session: &ReaderSession<'_>, card_type: CardType, pin: &str) -> Result<Outcome> {
    if card_type != CardType::Administrator {
        return Err(AppError::card_type("Not a Pollworker Card"));
    }
    let (record, _retry_counter) = session.service().read_administrator_record(pin)?;
    match record {
        Some(record) if record.is_ok() => {
            Ok(Outcome::Report(STANDARD.encode(&record.election_signature)))
        }
        Some(record) => Err(AppError::service(format!(
            "Reading Pollworker Card - {}",
            record.error_code.unwrap_or_default()
        ))),
        None => Err(AppError::service("Reading Pollworker Card")),
    }
}

/// Builds the full status report for whatever card is inserted.
///
/// Read failures on this path become error text inside the report rather
/// than failing the invocation; the report is the product here.
fn card_status(session: &ReaderSession<'_>, card_type: CardType, pin: &str) -> String {
    match card_type {
        CardType::Administrator => match session.service().read_administrator_record(pin) {
            Ok((record, _retry_counter)) => formatter::describe_administrator(record.as_ref()),
            Err(e) => format!("Error: Reading Pollworker Card - {e}"),
        },
        CardType::Voter => match session.service().read_voter_record(pin) {
            Ok((record, _retry_counter)) => formatter::describe_voter(record.as_ref()),
            Err(e) => format!("Error: Reading Voter Card - {e}"),
        },
        CardType::Empty => formatter::describe_empty(),
        CardType::Unknown => formatter::describe_unknown(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AdministratorRecord;
    use crate::infrastructure::MemoryCardService;

    fn write_request(mode: i32, code: Option<&str>) -> OperationRequest {
        OperationRequest::Write {
            pin: "1234".into(),
            voter_session_id: "V-1".into(),
            provisional_mode: mode,
            verification_code_b64: "q80=".into(),
            avs_mode: "standard".into(),
            provisional_code: code.map(ToString::to_string),
        }
    }

    #[test]
    fn no_readers_is_a_reader_error() {
        let mut service = MemoryCardService::without_readers();
        let err = execute(&mut service, &OperationRequest::Test).unwrap_err();
        assert!(matches!(err, AppError::NoReader));
    }

    #[test]
    fn no_card_is_a_card_error() {
        let mut service = MemoryCardService::with_no_card();
        let err = execute(&mut service, &OperationRequest::Test).unwrap_err();
        assert!(matches!(err, AppError::NoCard));
        assert!(service.selected_reader().is_none());
    }

    #[test]
    fn test_operation_succeeds_and_releases_reader() {
        let mut service = MemoryCardService::with_empty_card();
        let outcome = execute(&mut service, &OperationRequest::Test).unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert!(service.selected_reader().is_none());
    }

    #[test]
    fn check_reports_type_name_only() {
        let mut service = MemoryCardService::with_empty_card();
        let outcome = execute(&mut service, &OperationRequest::Check).unwrap();
        assert_eq!(outcome, Outcome::Report("Empty Card".into()));
    }

    #[test]
    fn setup_read_emits_signature_as_base64() {
        let mut service = MemoryCardService::with_administrator_card(AdministratorRecord {
            election_signature: vec![0xAB, 0xCD],
            error_code: None,
        });
        let outcome = execute(
            &mut service,
            &OperationRequest::SetupRead { pin: "1234".into() },
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Report("q80=".into()));
    }

    #[test]
    fn setup_read_rejects_non_administrator_cards() {
        let mut service = MemoryCardService::with_empty_card();
        let err = execute(
            &mut service,
            &OperationRequest::SetupRead { pin: "1234".into() },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Not a Pollworker Card");
        assert!(service.selected_reader().is_none());
    }

    #[test]
    fn setup_read_surfaces_record_error_code() {
        let mut service = MemoryCardService::with_administrator_card(AdministratorRecord {
            election_signature: Vec::new(),
            error_code: Some("E42".into()),
        });
        let err = execute(
            &mut service,
            &OperationRequest::SetupRead { pin: "1234".into() },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "Reading Pollworker Card - E42");
    }

    #[test]
    fn status_of_administrator_card_uses_hex_signature() {
        let mut service = MemoryCardService::with_administrator_card(AdministratorRecord {
            election_signature: vec![0xAB, 0xCD],
            error_code: None,
        });
        let outcome = execute(
            &mut service,
            &OperationRequest::StatusRead { pin: "1234".into() },
        )
        .unwrap();
        assert_eq!(
            outcome,
            Outcome::Report("<cardType>pollworker</cardType><signature>ABCD</signature>".into())
        );
    }

    #[test]
    fn status_of_voter_card_renders_full_report() {
        let record = crate::domain::VoterRecord {
            voter_session_id: "V-9".into(),
            provisional_mode: 1,
            provisional_code: "P-77".into(),
            verification_code: vec![0xAB, 0xCD],
            avs_mode: "standard".into(),
            language: Some("en".into()),
            voting_session_status: 1,
            error_code: String::new(),
            creation_time_stamp: "20260829120000".into(),
            voting_end_time: Some("20260829130000".into()),
            tabulator_number: Some(7),
        };
        let mut service = MemoryCardService::with_voter_card(record);
        let outcome = execute(
            &mut service,
            &OperationRequest::StatusRead { pin: "1234".into() },
        )
        .unwrap();
        let Outcome::Report(report) = outcome else {
            panic!("expected a report");
        };
        assert!(report.starts_with("<cardType>voter</cardType><voterSessionId>V-9</voterSessionId>"));
        assert!(report.ends_with("<signature>ABCD</signature>"));
        assert!(report.contains("<votedMachine>7</votedMachine>"));
    }

    #[test]
    fn unrecognized_card_reports_unknown() {
        let mut service = MemoryCardService::with_unrecognized_card();
        let check = execute(&mut service, &OperationRequest::Check).unwrap();
        assert_eq!(check, Outcome::Report("Unknown Card".into()));
        let status = execute(
            &mut service,
            &OperationRequest::StatusRead { pin: "1234".into() },
        )
        .unwrap();
        assert_eq!(status, Outcome::Report("<cardType>unknown</cardType>".into()));
    }

    #[test]
    fn status_of_empty_card_ignores_pin() {
        let mut service = MemoryCardService::with_empty_card();
        let outcome = execute(
            &mut service,
            &OperationRequest::StatusRead {
                pin: "anything".into(),
            },
        )
        .unwrap();
        assert_eq!(outcome, Outcome::Report("<cardType>empty</cardType>".into()));
    }

    #[test]
    fn write_rejected_on_administrator_card_and_reader_released() {
        let mut service = MemoryCardService::with_administrator_card(AdministratorRecord {
            election_signature: vec![0xAB],
            error_code: None,
        });
        let err = execute(&mut service, &write_request(0, None)).unwrap_err();
        assert_eq!(err.to_string(), "Pollworker Card Present");
        assert!(service.written_record().is_none());
        assert!(service.selected_reader().is_none());
    }

    #[test]
    fn write_overwrites_empty_card() {
        let mut service = MemoryCardService::with_empty_card();
        let outcome = execute(&mut service, &write_request(0, None)).unwrap();
        assert_eq!(outcome, Outcome::Success);
        let written = service.written_record().unwrap();
        assert_eq!(written.voter_session_id, "V-1");
        assert_eq!(written.verification_code, vec![0xAB, 0xCD]);
    }

    #[test]
    fn malformed_verification_code_aborts_before_write() {
        let mut service = MemoryCardService::with_empty_card();
        let request = OperationRequest::Write {
            pin: "1234".into(),
            voter_session_id: "V-1".into(),
            provisional_mode: 0,
            verification_code_b64: "!!!".into(),
            avs_mode: "standard".into(),
            provisional_code: None,
        };
        let err = execute(&mut service, &request).unwrap_err();
        assert!(matches!(err, AppError::Decode { .. }));
        assert!(service.written_record().is_none());
        assert!(service.selected_reader().is_none());
    }

    #[test]
    fn failed_write_outcome_is_a_service_error() {
        let mut service = MemoryCardService::with_empty_card();
        service.fail_next_write();
        let err = execute(&mut service, &write_request(0, None)).unwrap_err();
        assert_eq!(err.to_string(), "Failed to write voter card");
        assert!(service.selected_reader().is_none());
    }
}
