//! Response envelopes shared by every transport.
//!
//! Successful payloads always carry `success: true`. Failures collapse to
//! `{success: false, message}` plus a status code; the stable `code` on
//! [`ServiceError`] is for logs and callers that branch on it.

use std::fmt;

use serde::Serialize;

use patent_insights_core::{CorrelationResult, PatentRecord, SummaryResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceError {
    pub code: &'static str,
    pub message: String,
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.code)
    }
}

impl std::error::Error for ServiceError {}

impl ServiceError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }

    /// HTTP-equivalent status for the failure.
    pub fn status_code(&self) -> u16 {
        match self.code {
            "invalid_input" => 400,
            _ => 500,
        }
    }

    pub fn envelope(&self) -> FailureEnvelope {
        FailureEnvelope {
            success: false,
            message: self.message.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureEnvelope {
    pub success: bool,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryEnvelope {
    pub success: bool,
    #[serde(flatten)]
    pub result: SummaryResult,
}

impl SummaryEnvelope {
    pub fn ok(result: SummaryResult) -> Self {
        Self {
            success: true,
            result,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryEnvelope {
    pub success: bool,
    pub count: usize,
    pub data: Vec<PatentRecord>,
}

impl QueryEnvelope {
    pub fn ok(data: Vec<PatentRecord>) -> Self {
        Self {
            success: true,
            count: data.len(),
            data,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorrelationEnvelope {
    pub success: bool,
    pub correlation_between_filing_and_publication_year: CorrelationResult,
}

impl CorrelationEnvelope {
    pub fn ok(value: CorrelationResult) -> Self {
        Self {
            success: true,
            correlation_between_filing_and_publication_year: value,
        }
    }
}

/// Status code plus JSON body, ready for whatever carries it back.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl ServiceResponse {
    pub fn from_result<T: Serialize>(result: Result<T, ServiceError>) -> Self {
        match result {
            Ok(envelope) => match serde_json::to_value(&envelope) {
                Ok(body) => Self { status: 200, body },
                Err(err) => {
                    log::error!("insights: envelope serialization failed: {err}");
                    Self::failure(&ServiceError::internal(
                        crate::service::INTERNAL_ERROR_MESSAGE,
                    ))
                }
            },
            Err(err) => Self::failure(&err),
        }
    }

    fn failure(err: &ServiceError) -> Self {
        Self {
            status: err.status_code(),
            body: serde_json::json!({
                "success": false,
                "message": err.message,
            }),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status < 400
    }
}
