//! HTTP request handlers

use super::auth::AuthedSession;
use super::types::{
    ChatRequest, ChatResponse, DashboardQuery, DashboardResponse, ErrorResponse,
    ExpensesResponse, LoginRequest, LoginResponse, SuccessResponse, TranscriptResponse,
    VersionResponse,
};
use super::AppState;
use crate::dashboard::Dashboard;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Local;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Chat page
        .route("/", get(serve_index))
        // Session lifecycle
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        // Conversation
        .route("/api/chat", post(send_chat))
        .route("/api/transcript", get(get_transcript))
        // Ledger views
        .route("/api/dashboard", get(get_dashboard))
        .route("/api/expenses", get(list_expenses))
        // Version info
        .route("/version", get(get_version))
        .with_state(state)
}

async fn serve_index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// ============================================================================
// Session lifecycle
// ============================================================================

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !state.verify_password(&req.password) {
        tracing::warn!("Rejected login with incorrect password");
        return Err(AppError::Unauthorized("Incorrect password".to_string()));
    }

    let (session_id, session) = state.sessions.create().await;
    let transcript = session.lock().await.transcript().entries().to_vec();

    Ok(Json(LoginResponse {
        session_id,
        transcript,
    }))
}

async fn logout(
    State(state): State<AppState>,
    auth: AuthedSession,
) -> Json<SuccessResponse> {
    let success = state.sessions.remove(&auth.id).await;
    Json(SuccessResponse { success })
}

// ============================================================================
// Conversation
// ============================================================================

async fn send_chat(
    auth: AuthedSession,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let text = req.text.trim();

    // Held for the whole turn
    let mut session = auth.session.lock().await;

    // A blank reply to a category question files the expense as Uncategorized
    if text.is_empty() && session.state().pending().is_none() {
        return Err(AppError::BadRequest("Message is empty".to_string()));
    }

    let response = match session.handle_message(text).await {
        Ok(turn) => ChatResponse {
            reply: turn.reply,
            state: turn.state.label().to_string(),
            pending: turn.state.pending().cloned(),
            error: false,
        },
        Err(e) => {
            tracing::warn!(session_id = %auth.id, error = %e, "Turn failed");
            let reply = session.record_failure(&e);
            ChatResponse {
                reply,
                state: session.state().label().to_string(),
                pending: session.state().pending().cloned(),
                error: true,
            }
        }
    };

    Ok(Json(response))
}

async fn get_transcript(auth: AuthedSession) -> Json<TranscriptResponse> {
    let session = auth.session.lock().await;
    Json(TranscriptResponse {
        messages: session.transcript().entries().to_vec(),
    })
}

// ============================================================================
// Ledger views
// ============================================================================

async fn get_dashboard(
    State(state): State<AppState>,
    _auth: AuthedSession,
    Query(query): Query<DashboardQuery>,
) -> Json<DashboardResponse> {
    let recent = query.recent.unwrap_or(state.recent_count);
    let (dashboard, error) = match state.ledger.read_contents() {
        Ok(contents) => (
            Dashboard::compute(&contents, Local::now().date_naive(), recent),
            None,
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Ledger unreadable, showing empty dashboard");
            (Dashboard::empty(), Some(format!("Could not read expenses: {e}")))
        }
    };

    Json(DashboardResponse {
        dashboard,
        currency: state.currency.clone(),
        error,
    })
}

async fn list_expenses(
    State(state): State<AppState>,
    _auth: AuthedSession,
) -> Json<ExpensesResponse> {
    match state.ledger.read_all() {
        Ok(expenses) => Json(ExpensesResponse {
            expenses,
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "Ledger unreadable, listing no expenses");
            Json(ExpensesResponse {
                expenses: Vec::new(),
                error: Some(format!("Could not read expenses: {e}")),
            })
        }
    }
}

async fn get_version() -> Json<VersionResponse> {
    Json(VersionResponse {
        version: env!("CARGO_PKG_VERSION"),
    })
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(ErrorResponse::new(message));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::LlmClassifier;
    use crate::config::AppConfig;
    use crate::ledger::{Category, LedgerBackend};
    use crate::llm::LlmError;
    use crate::runtime::testing::MockLlmService;
    use axum::extract::FromRequestParts;
    use axum::http::{header, Request};
    use std::sync::Arc;
    use tempfile::TempDir;

    struct Harness {
        _dir: TempDir,
        state: AppState,
        llm: Arc<MockLlmService>,
    }

    fn harness(password: Option<&str>) -> Harness {
        let dir = TempDir::new().unwrap();
        let ledger_path = dir.path().join("ledger.csv");
        let password = password.map(str::to_string);
        let config = AppConfig::from_lookup(|var| match var {
            "EXPENSE_LEDGER_PATH" => Some(ledger_path.display().to_string()),
            "APP_PASSWORD" => password.clone(),
            _ => None,
        })
        .unwrap();

        let llm = Arc::new(MockLlmService::new());
        let ledger = LedgerBackend::open(&config.ledger_path).unwrap();
        let state = AppState::new(ledger, LlmClassifier::new(llm.clone()), &config);
        Harness {
            _dir: dir,
            state,
            llm,
        }
    }

    async fn authed(state: &AppState, session_id: &str) -> Result<AuthedSession, AppError> {
        let (mut parts, ()) = Request::builder()
            .header(header::AUTHORIZATION, format!("Bearer {session_id}"))
            .body(())
            .unwrap()
            .into_parts();
        AuthedSession::from_request_parts(&mut parts, state).await
    }

    async fn open_session(state: &AppState, password: &str) -> AuthedSession {
        let Json(login) = login(
            State(state.clone()),
            Json(LoginRequest {
                password: password.to_string(),
            }),
        )
        .await
        .unwrap();
        authed(state, &login.session_id).await.unwrap()
    }

    async fn chat(session: AuthedSession, text: &str) -> ChatResponse {
        send_chat(
            session,
            Json(ChatRequest {
                text: text.to_string(),
            }),
        )
        .await
        .unwrap()
        .0
    }

    #[tokio::test]
    async fn test_password_gate() {
        let h = harness(Some("letmein"));
        assert!(h.state.requires_password());

        let denied = login(
            State(h.state.clone()),
            Json(LoginRequest {
                password: "guess".to_string(),
            }),
        )
        .await;
        assert!(matches!(denied, Err(AppError::Unauthorized(_))));

        let Json(ok) = login(
            State(h.state.clone()),
            Json(LoginRequest {
                password: "letmein".to_string(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(ok.transcript.len(), 1);
        assert!(h.state.sessions.get(&ok.session_id).await.is_some());
    }

    #[tokio::test]
    async fn test_open_gate_without_password() {
        let h = harness(None);
        assert!(!h.state.requires_password());
        assert!(h.state.verify_password(""));
    }

    #[tokio::test]
    async fn test_unknown_or_missing_bearer_is_unauthorized() {
        let h = harness(None);
        assert!(matches!(
            authed(&h.state, "not-a-session").await,
            Err(AppError::Unauthorized(_))
        ));

        let (mut parts, ()) = Request::builder().body(()).unwrap().into_parts();
        assert!(matches!(
            AuthedSession::from_request_parts(&mut parts, &h.state).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_chat_logs_expense_and_updates_dashboard() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let id = session.id.clone();
        h.llm.queue_text(
            r#"{"intent": "LOG_EXPENSE", "date": "2024-11-05", "item": "auto", "amount": 200, "category": "Travel", "notes": ""}"#,
        );

        let response = chat(session, "Spent 200 on auto").await;
        assert_eq!(response.reply, "Saved: ₹200 for auto (Travel).");
        assert_eq!(response.state, "idle");
        assert!(!response.error);

        let dash = get_dashboard(
            State(h.state.clone()),
            authed(&h.state, &id).await.unwrap(),
            Query(DashboardQuery { recent: None }),
        )
        .await
        .0;
        assert!(dash.error.is_none());
        assert_eq!(dash.dashboard.record_count, 1);
        assert!((dash.dashboard.total - 200.0).abs() < 1e-9);
        assert_eq!(dash.dashboard.by_category[0].category, "Travel");

        let listed = list_expenses(State(h.state.clone()), authed(&h.state, &id).await.unwrap())
            .await
            .0;
        assert_eq!(listed.expenses.len(), 1);
        assert_eq!(listed.expenses[0].item, "auto");
    }

    #[tokio::test]
    async fn test_chat_clarification_exposes_pending() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let id = session.id.clone();
        h.llm.queue_text(
            r#"{"intent": "LOG_EXPENSE", "date": "2024-11-05", "item": "Rahul", "amount": 500, "category": "UNCERTAIN", "notes": ""}"#,
        );

        let asked = chat(session, "Paid 500 to Rahul").await;
        assert_eq!(asked.state, "awaiting_category");
        assert!(asked.reply.contains("500"));
        assert_eq!(asked.pending.as_ref().map(|p| p.item.as_str()), Some("Rahul"));

        let answered = chat(authed(&h.state, &id).await.unwrap(), "food").await;
        assert_eq!(answered.state, "idle");
        assert!(answered.pending.is_none());
        assert_eq!(answered.reply, "Got it! Categorized as Food and saved.");
        assert_eq!(h.llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_classifier_failure_is_shown_as_reply() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let id = session.id.clone();
        h.llm.queue_error(LlmError::rate_limit("quota exhausted"));

        let response = chat(session, "Spent 200 on auto").await;
        assert!(response.error);
        assert_eq!(response.state, "idle");
        assert!(response.reply.contains("quota exhausted"));

        let Json(transcript) = get_transcript(authed(&h.state, &id).await.unwrap()).await;
        assert_eq!(transcript.messages.len(), 3);
        assert_eq!(transcript.messages[2].text, response.reply);
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let result = send_chat(
            session,
            Json(ChatRequest {
                text: "   ".to_string(),
            }),
        )
        .await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
        assert!(h.llm.recorded_requests().is_empty());
    }

    #[tokio::test]
    async fn test_blank_answer_to_category_question_is_accepted() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let id = session.id.clone();
        h.llm.queue_text(
            r#"{"intent": "LOG_EXPENSE", "date": "2024-11-05", "item": "Rahul", "amount": 500, "category": "UNCERTAIN", "notes": ""}"#,
        );

        let asked = chat(session, "Paid 500 to Rahul").await;
        assert_eq!(asked.state, "awaiting_category");

        let answered = chat(authed(&h.state, &id).await.unwrap(), "  ").await;
        assert_eq!(answered.state, "idle");
        assert!(!answered.error);

        let listed = list_expenses(State(h.state.clone()), authed(&h.state, &id).await.unwrap())
            .await
            .0;
        assert_eq!(listed.expenses.len(), 1);
        assert_eq!(listed.expenses[0].category, Category::Uncategorized);
        assert_eq!(h.llm.recorded_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_counts_rows_with_unreadable_dates() {
        let h = harness(None);
        std::fs::write(
            h._dir.path().join("ledger.csv"),
            "Date,Item,Amount,Category,Notes\n03/01/2024,Rent,15000,Other,\n2024-01-03,Tea,20,Food,\n",
        )
        .unwrap();
        let session = open_session(&h.state, "").await;

        let dash = get_dashboard(
            State(h.state.clone()),
            session,
            Query(DashboardQuery { recent: None }),
        )
        .await
        .0;
        assert!(dash.error.is_none());
        assert!((dash.dashboard.total - 15020.0).abs() < 1e-9);
        assert_eq!(dash.dashboard.record_count, 2);
        assert_eq!(dash.dashboard.undated_count, 1);
        assert_eq!(dash.dashboard.recent.len(), 1);
    }

    #[tokio::test]
    async fn test_logout_drops_session() {
        let h = harness(None);
        let session = open_session(&h.state, "").await;
        let id = session.id.clone();

        let Json(out) = logout(State(h.state.clone()), session).await;
        assert!(out.success);
        assert!(matches!(
            authed(&h.state, &id).await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_error_status_codes() {
        let response = AppError::Unauthorized("no".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = AppError::BadRequest("no".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
