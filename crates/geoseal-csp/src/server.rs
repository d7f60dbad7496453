//! HTTP server exposing `/eval` and `/load_index`.

use crate::error::CspError;
use crate::eval::{encode_response, evaluate};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::post;
use axum::Router;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geoseal_index::blob;
use geoseal_types::wire::{ErrorResponse, EvalRequest, EvalResponse, LoadIndexRequest, LoadIndexResponse};
use geoseal_types::Aui;
use std::net::SocketAddr;
use std::sync::{Arc, RwLock};

/// Shared server state: the current index replica, if any.
///
/// The AUI is immutable once loaded; `load_index` swaps the whole Arc.
#[derive(Clone, Default)]
pub struct CspState {
    aui: Arc<RwLock<Option<Arc<Aui>>>>,
}

impl CspState {
    pub fn new(initial: Option<Aui>) -> Self {
        Self {
            aui: Arc::new(RwLock::new(initial.map(Arc::new))),
        }
    }

    fn current(&self) -> Result<Arc<Aui>, CspError> {
        self.aui
            .read()
            .expect("AUI lock poisoned")
            .clone()
            .ok_or(CspError::NoIndex)
    }

    fn replace(&self, aui: Aui) {
        *self.aui.write().expect("AUI lock poisoned") = Some(Arc::new(aui));
    }
}

struct AppError(CspError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CspError::NoIndex | CspError::MissingIndexSource => StatusCode::BAD_REQUEST,
            CspError::BitsMismatch { .. } | CspError::ColumnOutOfRange { .. } => {
                StatusCode::BAD_REQUEST
            }
            CspError::Blob(_) | CspError::Base64(_) => StatusCode::BAD_REQUEST,
            CspError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        log::warn!("request failed: {}", self.0);
        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
            }),
        )
            .into_response()
    }
}

impl From<CspError> for AppError {
    fn from(e: CspError) -> Self {
        Self(e)
    }
}

async fn eval_handler(
    State(state): State<CspState>,
    Json(req): Json<EvalRequest>,
) -> Result<Json<EvalResponse>, AppError> {
    let aui = state.current()?;
    log::debug!(
        "eval: party {} with {} tokens",
        req.party_id,
        req.tokens.len()
    );
    let shares = evaluate(&aui, &req.tokens)?;
    Ok(Json(encode_response(&shares)))
}

async fn load_index_handler(
    State(state): State<CspState>,
    Json(req): Json<LoadIndexRequest>,
) -> Result<Json<LoadIndexResponse>, AppError> {
    let aui = if let Some(b64) = &req.aui_b64 {
        let raw = BASE64.decode(b64).map_err(CspError::from)?;
        blob::decode_aui(&raw).map_err(CspError::from)?
    } else if let Some(path) = &req.aui_path {
        blob::load_aui(path).map_err(CspError::from)?
    } else {
        return Err(CspError::MissingIndexSource.into());
    };
    log::info!(
        "index loaded: {} records, m1={}, m2={}",
        aui.record_count(),
        aui.m1,
        aui.m2
    );
    state.replace(aui);
    Ok(Json(LoadIndexResponse {
        status: "ok".to_string(),
    }))
}

/// Build the CSP router over the given state.
pub fn router(state: CspState) -> Router {
    Router::new()
        .route("/eval", post(eval_handler))
        .route("/load_index", post(load_index_handler))
        .with_state(state)
}

/// Serve until the process is interrupted.
pub async fn serve(addr: SocketAddr, initial: Option<Aui>) -> Result<(), CspError> {
    let state = CspState::new(initial);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    log::info!("CSP listening on {}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}
