//! Route table and middleware stack.

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api_doc;
use crate::constants::API_PREFIX;
use crate::handlers::{clip_comment, clip_upload, clip_vote, clips_get};
use crate::state::AppState;

pub fn setup_routes(state: Arc<AppState>) -> Router {
    let cors = build_cors(&state.config.cors_origins);
    let body_limit = state.config.max_upload_size_bytes;

    let clips = Router::new()
        .route(
            "/{locale}/clips",
            post(clip_upload::save_clip).get(clips_get::serve_random_clips),
        )
        .route(
            "/{locale}/clips/{clip_id}/votes",
            post(clip_vote::save_clip_vote),
        )
        .route(
            "/{locale}/clips/{clip_id}/comment",
            post(clip_comment::save_comment),
        );

    Router::new()
        .nest(API_PREFIX, clips)
        .route("/api-docs/openapi.json", get(api_doc::serve_openapi))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn build_cors(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{test_state, TestStateOptions};
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    #[tokio::test]
    async fn upload_without_sentence_id_is_rejected_before_transcoding() {
        let app = test_state(TestStateOptions::default());
        let router = setup_routes(Arc::new(app.state.clone()));

        let response = router
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/en/clips")
                    .header("client_id", "client-a")
                    .header("content-type", "audio/ogg")
                    .body(Body::from(vec![0u8; 16]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 400);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(
            text.starts_with("save_clip_error: MISSING_PARAM"),
            "unexpected body: {}",
            text
        );
        assert_eq!(app.fakes.transcoder.runs(), 0);
    }

    #[tokio::test]
    async fn random_clips_endpoint_returns_sampled_json() {
        let app = test_state(TestStateOptions::default());
        app.fakes.clips.set_eligible(vec![
            voicebank_core::models::EligibleClip {
                id: 1,
                path: "client-x/s-1.mp3".to_string(),
                sentence: "a sentence".to_string(),
                original_sentence_id: "s-1".to_string(),
                taxonomy: None,
            },
            voicebank_core::models::EligibleClip {
                id: 2,
                path: "client-x/s-2.mp3".to_string(),
                sentence: "another sentence".to_string(),
                original_sentence_id: "s-2".to_string(),
                taxonomy: None,
            },
        ]);
        let router = setup_routes(Arc::new(app.state.clone()));

        let response = router
            .oneshot(
                Request::builder()
                    .method("GET")
                    .uri("/api/v1/en/clips?count=2")
                    .header("client_id", "client-a")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let clips: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(clips.as_array().unwrap().len(), 2);
        assert_eq!(clips[0]["glob"], "client-x/s-1");
        assert_eq!(clips[0]["audioSrc"], "/public/audio/client-x/s-1.mp3");
    }
}
