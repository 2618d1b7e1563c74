//! Question endpoint

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::server::state::AppState;
use crate::types::{PesquisaRequest, PesquisaResponse};

/// POST /pesquisa - Answer a question from the configured sources
pub async fn pesquisa(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PesquisaRequest>, JsonRejection>,
) -> Result<Json<PesquisaResponse>> {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("pesquisa", %request_id);

    async move {
        let Json(request) = payload.map_err(|e| Error::validation(e.body_text()))?;
        let question = request.question()?;

        tracing::info!("Question: \"{}\"", question);
        let start = Instant::now();

        let answer = state.pipeline().answer(question).await?;

        tracing::info!("Answered in {} ms", start.elapsed().as_millis());
        Ok::<_, Error>(Json(PesquisaResponse::new(answer)))
    }
    .instrument(span)
    .await
}
