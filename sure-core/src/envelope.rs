//! Output envelope: `{ data, error, meta }`, every part optional.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{CliError, ErrorCode};

/// Schema id for `propose rules` output
pub const PROPOSE_RULES_SCHEMA: &str = "docs/schemas/v1/propose_rules.schema.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope<T> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T> Envelope<T> {
    pub fn data(data: T) -> Self {
        Self {
            data: Some(data),
            error: None,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

impl Envelope<Value> {
    /// Error-only envelope
    pub fn failure(err: &CliError) -> Self {
        Self {
            data: None,
            error: Some(ErrorBody::from(err)),
            meta: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl From<&CliError> for ErrorBody {
    fn from(err: &CliError) -> Self {
        Self {
            code: err.code(),
            message: err.message().to_string(),
            details: err.details().cloned(),
        }
    }
}

/// Optional metadata intended for agents.
///
/// `schema`: id of the JSON schema that `data` conforms to.
/// `status`: HTTP status code, when known (0 = unknown, omitted).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub status: u16,
}

impl Meta {
    pub fn new(schema: impl Into<String>, status: u16) -> Self {
        Self {
            schema: Some(schema.into()),
            status,
        }
    }

    pub fn propose_rules() -> Self {
        Self::new(PROPOSE_RULES_SCHEMA, 200)
    }
}

fn is_zero(n: &u16) -> bool {
    *n == 0
}
