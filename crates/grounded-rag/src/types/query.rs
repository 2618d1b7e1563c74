//! HTTP request and response envelope

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Body of `POST /pesquisa`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PesquisaRequest {
    /// The user's question
    #[serde(default)]
    pub pergunta: Option<String>,
}

impl PesquisaRequest {
    /// Create a request
    pub fn new(pergunta: impl Into<String>) -> Self {
        Self {
            pergunta: Some(pergunta.into()),
        }
    }

    /// The trimmed question, or a validation error if missing or blank
    pub fn question(&self) -> Result<&str> {
        match self.pergunta.as_deref().map(str::trim) {
            Some(q) if !q.is_empty() => Ok(q),
            Some(_) => Err(Error::validation("field 'pergunta' must not be empty")),
            None => Err(Error::validation("field 'pergunta' is required")),
        }
    }
}

/// Body of every `/pesquisa` response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PesquisaResponse {
    /// Answer text (or a user-facing error message)
    pub resposta: String,
}

impl PesquisaResponse {
    /// Create a response
    pub fn new(resposta: impl Into<String>) -> Self {
        Self {
            resposta: resposta.into(),
        }
    }
}
