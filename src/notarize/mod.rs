//! Notarization protocol client
//!
//! The authority offers no push mechanism, only poll-based status: a
//! package is uploaded, the authority assigns an opaque request
//! identifier, and the client re-queries that identifier until a
//! terminal status arrives.

pub mod parse;
pub mod poll;
pub mod submit;

pub use parse::{parse_notarization_info, NotarizationInfo, NotarizationStatus};
pub use poll::{wait_for_completion, PollError, PollerConfig};
pub use submit::{authorization_args, submit_package, NotarizationRequest, SubmitError};
