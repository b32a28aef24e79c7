//! Erros da camada HTTP e seu mapeamento para status + `{ "erro": … }`.

use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::generator::GenerationError;
use crate::protocol::StoreError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("minuta {0} não encontrada")]
    DraftNotFound(Uuid),
    #[error("protocolo {0} não encontrado")]
    ProtocolNotFound(String),
    #[error("requisição inválida: {0}")]
    BadRequest(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::DraftNotFound(_) | Self::ProtocolNotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Store(StoreError::Duplicate(_)) => StatusCode::CONFLICT,
            Self::Generation(GenerationError::Cancelled) => StatusCode::CONFLICT,
            Self::Store(_) | Self::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(erro = %self, "falha interna");
        }
        (status, Json(json!({ "erro": self.to_string() }))).into_response()
    }
}
