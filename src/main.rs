//! HTTP front end for the ICAO VFR phraseology pipeline.
//!
//! This binary is the only part of the repository that performs I/O: it
//! frames `atc_recognition_rs::pipeline::handle_stt` as a JSON request/
//! response pair over `axum` and wires up the optional external
//! renderer. All dialog-state logic lives in the pipeline crate; this
//! file never makes a decision the pipeline didn't already make.

use std::net::SocketAddr;

use atc_recognition_rs::pipeline::{handle_stt_with_renderer, SttRequest, SttResponse};
use atc_recognition_rs::response::{HttpRenderer, NoRenderer, Renderer};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;

#[derive(Clone)]
struct AppState {
    llm_renderer_enabled: bool,
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

async fn health() -> impl IntoResponse {
    Json(HealthBody { status: "ok" })
}

async fn stt(
    State(state): State<AppState>,
    Json(request): Json<SttRequest>,
) -> Result<Json<SttResponse>, (StatusCode, Json<serde_json::Value>)> {
    if request.text.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "text must not be empty" })),
        ));
    }

    log::info!("stt request: state={} scenario={}", request.state, request.scenario);

    let response = if state.llm_renderer_enabled {
        match HttpRenderer::from_env() {
            Some(renderer) => handle_stt_with_renderer(
                &request.text,
                &request.state,
                request.current_slots.as_ref(),
                &request.scenario,
                &renderer,
            ),
            None => {
                log::warn!("LLM_RENDERER is set but LLM_ENDPOINT is missing; falling back to deterministic output");
                handle_stt_with_renderer(
                    &request.text,
                    &request.state,
                    request.current_slots.as_ref(),
                    &request.scenario,
                    &NoRenderer,
                )
            }
        }
    } else {
        handle_stt_with_renderer(
            &request.text,
            &request.state,
            request.current_slots.as_ref(),
            &request.scenario,
            &NoRenderer,
        )
    };

    Ok(Json(response))
}

fn truthy_env(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/stt", post(stt))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let state = AppState {
        llm_renderer_enabled: truthy_env("LLM_RENDERER"),
    };

    let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:8000".to_string())
        .parse()
        .expect("BIND_ADDR must be a valid socket address");

    log::info!("listening on {bind_addr}");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind BIND_ADDR");
    axum::serve(listener, app(state)).await.expect("server error");
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> AppState {
        AppState { llm_renderer_enabled: false }
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let response = app(test_state())
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn empty_text_is_rejected_with_400() {
        let body = Body::from(serde_json::to_vec(&json!({"text": "   ", "state": "initial_call"})).unwrap());
        let request = Request::builder()
            .method("POST")
            .uri("/stt")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn well_formed_request_advances_the_scenario() {
        let payload = json!({
            "text": "Delta alpha bravo charlie",
            "state": "initial_call",
            "scenario": "graz_vfr_sector_e",
        });
        let body = Body::from(serde_json::to_vec(&payload).unwrap());
        let request = Request::builder()
            .method("POST")
            .uri("/stt")
            .header("content-type", "application/json")
            .body(body)
            .unwrap();
        let response = app(test_state()).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
