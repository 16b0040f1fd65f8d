//! Domain layer - card records, requests, and the service port.
//!
//! This layer contains pure domain models, the error taxonomy, and the
//! Card Access Service interface, without any hardware dependencies.

pub mod error;
pub mod models;
pub mod ports;
pub mod request;

pub use error::{AppError, Result};
pub use models::{AdministratorRecord, CardType, VoterRecord, WriteOutcome, TIMESTAMP_FORMAT};
pub use ports::CardService;
pub use request::OperationRequest;
