use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use log::info;
use serde::{Deserialize, Serialize};

use crate::answer::{CompletionProvider, NO_ANSWER, build_prompt};
use crate::credentials::Credentials;
use crate::error::ApiError;
use crate::extract_video_id;
use crate::youtube::{TranscriptProvider, join_segments};

/// Immutable per-process state shared by both endpoints. Providers are built
/// once at startup; no request leaves state behind.
pub struct AppState {
    pub transcripts: Arc<dyn TranscriptProvider>,
    pub completions: Arc<dyn CompletionProvider>,
    pub credentials: Credentials,
    pub lang: String,
}

pub fn router(state: AppState) -> axum::Router {
    axum::Router::new()
        .route("/api/transcript", get(get_transcript))
        .route("/api/chat", post(post_chat))
        .with_state(Arc::new(state))
}

pub async fn serve(state: AppState, bind: &str) -> eyre::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(bind).await?;
    info!("Listening on {bind}");
    axum::serve(listener, app).await?;
    Ok(())
}

#[derive(Debug, Deserialize)]
pub struct TranscriptParams {
    pub url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptResponse {
    pub transcript: String,
}

// Fields default to empty so a missing field surfaces as the endpoint's own
// 400 rather than a deserialization rejection
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatRequest {
    pub transcript: String,
    pub question: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub answer: String,
}

/// GET /api/transcript?url=<video reference>
async fn get_transcript(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<TranscriptParams>,
) -> Result<Json<TranscriptResponse>, ApiError> {
    let reference = params.url.ok_or(ApiError::MissingUrl)?;
    let video_id = extract_video_id(&reference).ok_or(ApiError::InvalidReference)?;

    let key = request_key(&headers, "x-supadata-key").unwrap_or_else(|| state.credentials.supadata_key.clone());

    let segments = state
        .transcripts
        .fetch(&key, &video_id, &state.lang)
        .await
        .map_err(|e| ApiError::provider(e, "Failed to fetch transcript."))?;

    if segments.is_empty() {
        return Err(ApiError::NoTranscript);
    }

    Ok(Json(TranscriptResponse {
        transcript: join_segments(&segments),
    }))
}

/// POST /api/chat with { transcript, question }
async fn post_chat(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    if req.transcript.is_empty() || req.question.is_empty() {
        return Err(ApiError::MissingField);
    }

    let key = request_key(&headers, "x-openai-key").unwrap_or_else(|| state.credentials.openai_key.clone());

    let prompt = build_prompt(&req.transcript, &req.question);
    let answer = state
        .completions
        .complete(&key, &prompt)
        .await
        .map_err(|e| ApiError::provider(e, "Failed to get answer from AI."))?;

    Ok(Json(ChatResponse {
        answer: answer.unwrap_or_else(|| NO_ANSWER.to_string()),
    }))
}

/// Client-supplied per-request key, overriding process-level credentials
fn request_key(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::http::StatusCode;
    use eyre::bail;

    struct StaticTranscripts(Vec<String>);

    #[async_trait]
    impl TranscriptProvider for StaticTranscripts {
        async fn fetch(&self, _key: &str, _video_id: &str, _lang: &str) -> eyre::Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingTranscripts;

    #[async_trait]
    impl TranscriptProvider for FailingTranscripts {
        async fn fetch(&self, _key: &str, _video_id: &str, _lang: &str) -> eyre::Result<Vec<String>> {
            bail!("transcript provider returned 403: quota exceeded")
        }
    }

    struct StaticCompletions(Option<String>);

    #[async_trait]
    impl CompletionProvider for StaticCompletions {
        async fn complete(&self, _key: &str, _prompt: &str) -> eyre::Result<Option<String>> {
            Ok(self.0.clone())
        }
    }

    struct FailingCompletions;

    #[async_trait]
    impl CompletionProvider for FailingCompletions {
        async fn complete(&self, _key: &str, _prompt: &str) -> eyre::Result<Option<String>> {
            bail!("completion provider returned 500: overloaded")
        }
    }

    fn state(
        transcripts: impl TranscriptProvider + 'static,
        completions: impl CompletionProvider + 'static,
    ) -> Arc<AppState> {
        Arc::new(AppState {
            transcripts: Arc::new(transcripts),
            completions: Arc::new(completions),
            credentials: Credentials {
                supadata_key: "sd-test".to_string(),
                openai_key: "sk-test".to_string(),
            },
            lang: "en".to_string(),
        })
    }

    fn transcript_query(url: Option<&str>) -> Query<TranscriptParams> {
        Query(TranscriptParams {
            url: url.map(|s| s.to_string()),
        })
    }

    #[tokio::test]
    async fn test_transcript_missing_url_is_400() {
        let state = state(StaticTranscripts(vec![]), StaticCompletions(None));
        let err = get_transcript(State(state), HeaderMap::new(), transcript_query(None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing ?url=");
    }

    #[tokio::test]
    async fn test_transcript_bad_reference_is_400() {
        let state = state(StaticTranscripts(vec!["never".to_string()]), StaticCompletions(None));
        let err = get_transcript(State(state), HeaderMap::new(), transcript_query(Some("not-a-url-or-id")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Could not parse video ID.");
    }

    #[tokio::test]
    async fn test_transcript_empty_segments_is_404() {
        let state = state(StaticTranscripts(vec![]), StaticCompletions(None));
        let err = get_transcript(State(state), HeaderMap::new(), transcript_query(Some("dQw4w9WgXcQ")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_transcript_joins_segments() {
        let state = state(
            StaticTranscripts(vec!["Hello".to_string(), "world".to_string()]),
            StaticCompletions(None),
        );
        let Json(resp) = get_transcript(
            State(state),
            HeaderMap::new(),
            transcript_query(Some("https://www.youtube.com/watch?v=dQw4w9WgXcQ")),
        )
        .await
        .unwrap();
        assert_eq!(resp.transcript, "Hello world");
    }

    #[tokio::test]
    async fn test_transcript_provider_failure_is_500() {
        let state = state(FailingTranscripts, StaticCompletions(None));
        let err = get_transcript(State(state), HeaderMap::new(), transcript_query(Some("dQw4w9WgXcQ")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_chat_missing_fields_is_400() {
        let state = state(StaticTranscripts(vec![]), StaticCompletions(Some("hi".to_string())));
        let err = post_chat(
            State(state.clone()),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: String::new(),
                question: "What?".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = post_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: "T".to_string(),
                question: String::new(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.to_string(), "Missing transcript or question");
    }

    #[tokio::test]
    async fn test_chat_returns_answer() {
        let state = state(
            StaticTranscripts(vec![]),
            StaticCompletions(Some("It is about testing.".to_string())),
        );
        let Json(resp) = post_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: "T".to_string(),
                question: "Q".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.answer, "It is about testing.");
    }

    #[tokio::test]
    async fn test_chat_no_content_yields_placeholder() {
        let state = state(StaticTranscripts(vec![]), StaticCompletions(None));
        let Json(resp) = post_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: "T".to_string(),
                question: "Q".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(resp.answer, NO_ANSWER);
    }

    #[tokio::test]
    async fn test_chat_provider_failure_is_500() {
        let state = state(StaticTranscripts(vec![]), FailingCompletions);
        let err = post_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: "T".to_string(),
                question: "Q".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.to_string().contains("overloaded"));
    }

    #[test]
    fn test_request_key_override() {
        let mut headers = HeaderMap::new();
        assert_eq!(request_key(&headers, "x-supadata-key"), None);

        headers.insert("x-supadata-key", "  ".parse().unwrap());
        assert_eq!(request_key(&headers, "x-supadata-key"), None);

        headers.insert("x-supadata-key", "sd-override".parse().unwrap());
        assert_eq!(request_key(&headers, "x-supadata-key"), Some("sd-override".to_string()));
    }

    /// Full round trip: reference in, transcript out, question in, answer out,
    /// conversation accumulating in submission order
    #[tokio::test]
    async fn test_full_round_trip() {
        use crate::session::{Role, Session};

        let state = state(
            StaticTranscripts(vec!["Rust".to_string(), "is".to_string(), "fast".to_string()]),
            StaticCompletions(Some("It says Rust is fast.".to_string())),
        );

        let Json(fetched) = get_transcript(
            State(state.clone()),
            HeaderMap::new(),
            transcript_query(Some("https://youtu.be/dQw4w9WgXcQ")),
        )
        .await
        .unwrap();

        let mut session = Session::new();
        session.transcript_loaded("dQw4w9WgXcQ", &fetched.transcript).unwrap();

        let question = "What does it say about Rust?";
        session.push_question(question).unwrap();
        let Json(chat) = post_chat(
            State(state),
            HeaderMap::new(),
            Json(ChatRequest {
                transcript: fetched.transcript.clone(),
                question: question.to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!chat.answer.is_empty());
        session.push_answer(&chat.answer).unwrap();

        let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(session.messages()[1].content, "It says Rust is fast.");
        assert!(session.messages()[0].timestamp <= session.messages()[1].timestamp);
    }
}
