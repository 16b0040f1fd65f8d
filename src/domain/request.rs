//! Operation request parsing.
//!
//! Maps the raw positional argument list onto exactly one validated
//! `OperationRequest`. The rules are positional rather than subcommand
//! based: any argument list that is not one of the short forms is
//! interpreted as a write request.

use super::error::{AppError, Result};

/// The validated command for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationRequest {
    /// Exercise the reader path without touching any record.
    Test,
    /// Report the inserted card's type name only.
    Check,
    /// Read the election signature from a pollworker card.
    SetupRead { pin: String },
    /// Render the full status report for whatever card is inserted.
    StatusRead { pin: String },
    /// Write a fresh voter record, overwriting the card.
    Write {
        pin: String,
        voter_session_id: String,
        provisional_mode: i32,
        verification_code_b64: String,
        avs_mode: String,
        /// Required when `provisional_mode > 0`, never supplied otherwise.
        provisional_code: Option<String>,
    },
}

impl OperationRequest {
    /// Parses the raw argument list into a request.
    ///
    /// Rules are checked in order: the short forms (`test`, `check`,
    /// `setup <pin>`, `status <pin>`) must match their argument count
    /// exactly; `setup` or `status` alone falls through to the generic
    /// five-arguments error rather than matching partially.
    ///
    /// # Errors
    /// Returns `AppError::Argument` for any list that matches no rule.
    pub fn parse(args: &[String]) -> Result<Self> {
        if args.is_empty() {
            return Err(AppError::argument("Arguments must be supplied"));
        }
        if args.len() == 1 && args[0] == "test" {
            return Ok(Self::Test);
        }
        if args.len() == 1 && args[0] == "check" {
            return Ok(Self::Check);
        }
        if args.len() == 2 && args[0] == "setup" {
            return Ok(Self::SetupRead {
                pin: args[1].clone(),
            });
        }
        if args.len() == 2 && args[0] == "status" {
            return Ok(Self::StatusRead {
                pin: args[1].clone(),
            });
        }
        if args.len() < 5 {
            return Err(AppError::argument(
                "Five arguments must be provided, the sixth is optional",
            ));
        }

        let provisional_mode: i32 = args[2].parse().map_err(|_| {
            AppError::argument(format!("Provisional Mode must be an integer: {}", args[2]))
        })?;

        // A sixth argument is required exactly when the mode is provisional.
        let provisional_code = if provisional_mode > 0 {
            match args.get(5) {
                Some(code) => Some(code.clone()),
                None => {
                    return Err(AppError::argument(
                        "Provisional Code is required when Provisional Mode is 1 or 2",
                    ))
                }
            }
        } else {
            None
        };

        Ok(Self::Write {
            pin: args[0].clone(),
            voter_session_id: args[1].clone(),
            provisional_mode,
            verification_code_b64: args[3].clone(),
            avs_mode: args[4].clone(),
            provisional_code,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<OperationRequest> {
        let owned: Vec<String> = args.iter().map(ToString::to_string).collect();
        OperationRequest::parse(&owned)
    }

    #[test]
    fn empty_args_rejected() {
        let err = parse(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Arguments must be supplied");
    }

    #[test]
    fn short_forms() {
        assert_eq!(parse(&["test"]).unwrap(), OperationRequest::Test);
        assert_eq!(parse(&["check"]).unwrap(), OperationRequest::Check);
        assert_eq!(
            parse(&["setup", "1234"]).unwrap(),
            OperationRequest::SetupRead { pin: "1234".into() }
        );
        assert_eq!(
            parse(&["status", "1234"]).unwrap(),
            OperationRequest::StatusRead { pin: "1234".into() }
        );
    }

    #[test]
    fn setup_alone_falls_through_to_generic_error() {
        let err = parse(&["setup"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Five arguments must be provided, the sixth is optional"
        );
    }

    #[test]
    fn too_few_write_args_rejected() {
        let err = parse(&["1234", "V-1", "0"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Five arguments must be provided, the sixth is optional"
        );
    }

    #[test]
    fn write_mode_zero_takes_no_code() {
        let req = parse(&["1234", "V-1", "0", "q80=", "standard"]).unwrap();
        assert_eq!(
            req,
            OperationRequest::Write {
                pin: "1234".into(),
                voter_session_id: "V-1".into(),
                provisional_mode: 0,
                verification_code_b64: "q80=".into(),
                avs_mode: "standard".into(),
                provisional_code: None,
            }
        );
    }

    #[test]
    fn provisional_mode_requires_sixth_argument() {
        let err = parse(&["1234", "V-1", "1", "q80=", "standard"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Provisional Code is required when Provisional Mode is 1 or 2"
        );
    }

    #[test]
    fn provisional_mode_with_code_accepted() {
        let req = parse(&["1234", "V-1", "2", "q80=", "standard", "P-77"]).unwrap();
        match req {
            OperationRequest::Write {
                provisional_mode,
                provisional_code,
                ..
            } => {
                assert_eq!(provisional_mode, 2);
                assert_eq!(provisional_code.as_deref(), Some("P-77"));
            }
            other => panic!("expected write request, got {other:?}"),
        }
    }

    #[test]
    fn non_numeric_mode_rejected() {
        let err = parse(&["1234", "V-1", "abc", "q80=", "standard"]).unwrap_err();
        assert!(matches!(err, AppError::Argument { .. }));
    }
}
