//! Application layer - operation execution and report rendering.
//!
//! This layer contains the command router, the write-path record
//! validator, and the status-report formatter.

pub mod formatter;
pub mod router;
pub mod validator;

pub use formatter::{
    describe_administrator, describe_card_type, describe_empty, describe_unknown, describe_voter,
};
pub use router::{execute, Outcome};
pub use validator::build_voter_record;
