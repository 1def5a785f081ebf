use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::json;
use tracing::{error, info};

use crate::config::{ModelConfig, Models};
use crate::error::VerifyError;
use crate::llm::openai::OpenAiTransport;
use crate::llm::Transport;
use crate::pipeline::verify;
use crate::types::{VerifyRequest, VerifyResponse};

/// Holds one transport per configured model, keyed by model name.
#[derive(Clone)]
pub struct Engine {
    pub models: Models,
    pub transports: HashMap<String, Arc<dyn Transport>>,
}

impl Engine {
    /// Builds an OpenAI-compatible transport for every configured model.
    pub fn from_models(models: Models, max_concurrency: usize) -> Self {
        let transports = models
            .models
            .iter()
            .map(|m| {
                let transport: Arc<dyn Transport> =
                    Arc::new(OpenAiTransport::for_model(m, max_concurrency));
                (m.name.clone(), transport)
            })
            .collect();
        Self { models, transports }
    }

    pub fn resolve(&self, name: Option<&str>) -> Option<(&ModelConfig, &Arc<dyn Transport>)> {
        let model = self.models.get(name)?;
        let transport = self.transports.get(&model.name)?;
        Some((model, transport))
    }

    pub async fn verify(&self, req: &VerifyRequest) -> anyhow::Result<VerifyResponse> {
        let (model, transport) = self
            .resolve(req.model.as_deref())
            .ok_or_else(|| anyhow::anyhow!("unknown model {:?}", req.model))?;
        verify(transport.as_ref(), model, &req.context, &req.input).await
    }
}

async fn verify_claims(
    State(engine): State<Arc<Engine>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, (StatusCode, Json<serde_json::Value>)> {
    let Some((model, transport)) = engine.resolve(req.model.as_deref()) else {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": format!("unknown model {:?}", req.model) })),
        ));
    };
    match verify(transport.as_ref(), model, &req.context, &req.input).await {
        Ok(resp) => Ok(Json(resp)),
        Err(e) => {
            error!(error = %e, "verification request failed");
            // Pipeline faults are the request's problem; anything else is the
            // upstream model endpoint's.
            let status = if e.downcast_ref::<VerifyError>().is_some() {
                StatusCode::UNPROCESSABLE_ENTITY
            } else {
                StatusCode::BAD_GATEWAY
            };
            Err((status, Json(json!({ "error": e.to_string() }))))
        }
    }
}

pub fn router(engine: Engine) -> Router {
    Router::new()
        .route("/verify", post(verify_claims))
        .with_state(Arc::new(engine))
}

pub async fn run_server(engine: Engine, addr: &str) -> anyhow::Result<()> {
    let app = router(engine);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "claim verification server listening");
    axum::serve(listener, app).await?;
    Ok(())
}
