//! sure-core: transaction model, rule proposals, and the structured error/envelope types
//! shared by the Sure API client and CLI.

pub mod envelope;
pub mod error;
pub mod rules;
pub mod transaction;

pub use envelope::{Envelope, ErrorBody, Meta};
pub use error::{CliError, ErrorCode, classify_http_status};
pub use rules::{ProposeResult, RuleProposal, propose_rules};
pub use transaction::{Classification, Transaction};
