//! Generation outcome record

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Outcome category of a generation call
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    /// Backend produced an answer
    Ok,
    /// Client failed to initialize at startup
    ClientUnavailable,
    /// Backend was reached but failed
    UpstreamError,
}

/// Result of one generation call
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResponse {
    /// Outcome category
    pub status: GenerationStatus,
    /// Answer text (empty on failure)
    pub text: String,
    /// Failure detail for operators
    pub detail: Option<String>,
}

impl GenerationResponse {
    /// Convert back into the `generate` contract
    pub fn into_result(self) -> Result<String, GenerationError> {
        match self.status {
            GenerationStatus::Ok => Ok(self.text),
            GenerationStatus::ClientUnavailable => {
                Err(GenerationError::ClientUnavailable(self.detail.unwrap_or_default()))
            }
            GenerationStatus::UpstreamError => {
                Err(GenerationError::Upstream(self.detail.unwrap_or_default()))
            }
        }
    }

    /// Whether an answer was produced
    pub fn is_ok(&self) -> bool {
        self.status == GenerationStatus::Ok
    }
}

impl From<Result<String, GenerationError>> for GenerationResponse {
    fn from(result: Result<String, GenerationError>) -> Self {
        match result {
            Ok(text) => Self {
                status: GenerationStatus::Ok,
                text,
                detail: None,
            },
            Err(GenerationError::ClientUnavailable(reason)) => Self {
                status: GenerationStatus::ClientUnavailable,
                text: String::new(),
                detail: Some(reason),
            },
            Err(GenerationError::Upstream(detail)) => Self {
                status: GenerationStatus::UpstreamError,
                text: String::new(),
                detail: Some(detail),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let ok = GenerationResponse::from(Ok("answer".to_string()));
        assert!(ok.is_ok());
        assert_eq!(ok.into_result().unwrap(), "answer");

        let err = GenerationResponse::from(Err(GenerationError::Upstream("HTTP 429".into())));
        assert_eq!(err.status, GenerationStatus::UpstreamError);
        assert_eq!(err.detail.as_deref(), Some("HTTP 429"));
        assert_eq!(
            err.into_result(),
            Err(GenerationError::Upstream("HTTP 429".into()))
        );
    }
}
