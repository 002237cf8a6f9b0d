//! # REST API
//!
//! Builds the axum router that exposes the platform's HTTP interface. All
//! endpoints share application state through axum's `State` extractor.
//!
//! Identity is wallet-based: endpoints that act on behalf of a user read
//! the `x-wallet-address` header, and unknown wallets are registered on
//! first use.
//!
//! ## Endpoints
//!
//! | Method | Path                             | Description                        |
//! |--------|----------------------------------|------------------------------------|
//! | GET    | `/health`                        | Liveness probe                     |
//! | GET    | `/status`                        | Platform status summary            |
//! | POST   | `/api/users/register`            | Register a user                    |
//! | GET    | `/api/users/me`                  | Current user by wallet header      |
//! | GET    | `/api/courses`                   | Course catalog                     |
//! | POST   | `/api/courses`                   | Create a course                    |
//! | GET    | `/api/courses/:id`               | Course by ID                       |
//! | POST   | `/api/courses/:id/enroll`        | Enroll the wallet user             |
//! | GET    | `/api/enrollments/me`            | Wallet user's enrollments          |
//! | GET    | `/api/credentials/me`            | Wallet user's credentials          |
//! | POST   | `/api/credentials/issue`         | Issue a credential on the ledger   |
//! | GET    | `/api/credentials/verify/:hash`  | Verify a credential by tx hash     |
//! | POST   | `/api/loans/apply`               | Apply for a credential-backed loan |
//! | GET    | `/api/loans/pool`                | Lending pool statistics            |
//! | GET    | `/api/loans/borrower/:address`   | Borrower standing on the ledger    |
//! | GET    | `/api/loans/contract`            | Lending contract metadata          |
//! | POST   | `/api/ledger/accounts`           | Create a funded test account       |
//! | GET    | `/api/ledger/accounts/:address`  | Ledger account by address          |
//! | GET    | `/api/ledger/transactions/:hash` | Ledger transaction by hash         |

use axum::{
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use educhain_core::credential::issuer::{CredentialIssuer, VerifyError};
use educhain_core::credential::record::CredentialRecord;
use educhain_core::credential::VerificationReport;
use educhain_core::ledger::TestnetLedger;
use educhain_core::lending::{self, CredentialProfile, LoanRequest};
use educhain_core::storage::{
    NewCourse, NewCredential, NewEnrollment, NewUser, Storage, StorageError, StoredCredential,
    User,
};

use crate::metrics::SharedMetrics;

/// Header carrying the caller's wallet address.
pub const WALLET_HEADER: &str = "x-wallet-address";

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone — everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The server's reported version string.
    pub version: String,
    /// Network identifier (always "testnet" today).
    pub network: String,
    /// Platform records: users, courses, enrollments, credential rows.
    pub store: Arc<dyn Storage>,
    /// The simulated test network.
    pub ledger: Arc<TestnetLedger>,
    /// Credential issuance and verification against the ledger.
    pub issuer: Arc<CredentialIssuer>,
    /// Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    fn refresh_ledger_gauges(&self) {
        self.metrics
            .ledger_accounts
            .set(self.ledger.account_count() as i64);
        self.metrics
            .ledger_transactions
            .set(self.ledger.transaction_count() as i64);
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/status", get(status_handler))
        .route("/api/users/register", post(register_handler))
        .route("/api/users/me", get(current_user_handler))
        .route("/api/courses", get(list_courses_handler).post(create_course_handler))
        .route("/api/courses/:id", get(course_handler))
        .route("/api/courses/:id/enroll", post(enroll_handler))
        .route("/api/enrollments/me", get(my_enrollments_handler))
        .route("/api/credentials/me", get(my_credentials_handler))
        .route("/api/credentials/issue", post(issue_credential_handler))
        .route("/api/credentials/verify/:hash", get(verify_credential_handler))
        .route("/api/loans/apply", post(loan_apply_handler))
        .route("/api/loans/pool", get(pool_stats_handler))
        .route("/api/loans/borrower/:address", get(borrower_handler))
        .route("/api/loans/contract", get(loan_contract_handler))
        .route("/api/ledger/accounts", post(create_account_handler))
        .route("/api/ledger/accounts/:address", get(ledger_account_handler))
        .route("/api/ledger/transactions/:hash", get(ledger_transaction_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Response payload for `GET /status`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    /// Server software version.
    pub version: String,
    /// Network identifier.
    pub network: String,
    /// Number of accounts on the simulated ledger.
    pub ledger_accounts: usize,
    /// Number of transactions on the simulated ledger.
    pub ledger_transactions: usize,
    /// Number of courses in the catalog.
    pub courses: usize,
    /// ISO-8601 timestamp of the response.
    pub timestamp: String,
}

/// Request body for `POST /api/credentials/issue`.
///
/// The recipient resolves from `destination`, then `walletAddress`, then
/// the wallet header, in that order.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Course the credential certifies.
    pub course_id: u64,
    /// Explicit recipient ledger address.
    #[serde(default)]
    pub destination: Option<String>,
    /// Recipient wallet address (legacy field name).
    #[serde(default)]
    pub wallet_address: Option<String>,
}

/// Response payload for `POST /api/credentials/issue`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueResponse {
    /// The stored platform credential row.
    pub credential: StoredCredential,
    /// Hash of the anchoring ledger transaction.
    pub transaction_hash: String,
    /// Asset code of the minted credential token.
    pub asset_code: String,
    /// Explorer link for the anchoring transaction.
    pub explorer_url: String,
}

/// Response payload for `GET /api/credentials/verify/:hash`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyResponse {
    /// What the ledger itself says about the credential.
    #[serde(flatten)]
    pub report: VerificationReport,
    /// The platform's own record for this transaction, when one exists.
    pub platform_record: Option<StoredCredential>,
}

/// Request body for `POST /api/loans/apply`. The borrower resolves from
/// the body field or the wallet header.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanApplicationRequest {
    /// Requested principal, in currency units.
    pub amount: u64,
    /// Borrower ledger address.
    #[serde(default)]
    pub borrower: Option<String>,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Wallet Identity
// ---------------------------------------------------------------------------

fn wallet_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(WALLET_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.trim().is_empty())
        .map(String::from)
}

/// Finds the user linked to a wallet, registering one on first contact.
/// Generated usernames are opaque; users can register a proper profile
/// later via `/api/users/register`.
fn get_or_create_wallet_user(
    store: &Arc<dyn Storage>,
    wallet: &str,
) -> Result<User, StorageError> {
    if let Some(user) = store.user_by_wallet(wallet) {
        return Ok(user);
    }
    store.create_user(NewUser {
        username: format!("user_{}", Uuid::new_v4().simple()),
        password: Uuid::new_v4().to_string(),
        wallet_address: Some(wallet.to_string()),
        email: None,
        name: None,
    })
}

// ---------------------------------------------------------------------------
// Handlers — platform
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the server is alive.
///
/// Liveness probe for orchestrators. It intentionally does not check
/// subsystem health; that belongs in `/status`.
async fn health_handler() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

/// `GET /status` — platform status summary.
async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let resp = StatusResponse {
        version: state.version.clone(),
        network: state.network.clone(),
        ledger_accounts: state.ledger.account_count(),
        ledger_transactions: state.ledger.transaction_count(),
        courses: state.store.all_courses().len(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    };
    Json(resp)
}

/// `POST /api/users/register` — registers a user. Returns 400 when the
/// username is already taken. The password never appears in the response.
async fn register_handler(
    State(state): State<AppState>,
    Json(new_user): Json<NewUser>,
) -> impl IntoResponse {
    match state.store.create_user(new_user) {
        Ok(user) => (StatusCode::CREATED, Json(user.public_view())).into_response(),
        Err(e) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// `GET /api/users/me` — the user linked to the wallet header.
async fn current_user_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(wallet) = wallet_from_headers(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Wallet address is required");
    };
    match state.store.user_by_wallet(&wallet) {
        Some(user) => (StatusCode::OK, Json(user.public_view())).into_response(),
        None => error_body(StatusCode::NOT_FOUND, "User not found"),
    }
}

// ---------------------------------------------------------------------------
// Handlers — courses & enrollments
// ---------------------------------------------------------------------------

/// `GET /api/courses` — the whole catalog.
async fn list_courses_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.store.all_courses())
}

/// `POST /api/courses` — adds a course to the catalog.
async fn create_course_handler(
    State(state): State<AppState>,
    Json(new_course): Json<NewCourse>,
) -> impl IntoResponse {
    let course = state.store.create_course(new_course);
    (StatusCode::CREATED, Json(course))
}

/// `GET /api/courses/:id` — a course by ID, 404 when missing.
async fn course_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.store.course(id) {
        Some(course) => (StatusCode::OK, Json(course)).into_response(),
        None => error_body(StatusCode::NOT_FOUND, format!("Course not found: {}", id)),
    }
}

/// `POST /api/courses/:id/enroll` — enrolls the wallet user in a course.
///
/// Registers the wallet on first contact. Rejects double enrollment.
async fn enroll_handler(
    Path(course_id): Path<u64>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(wallet) = wallet_from_headers(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Wallet address is required");
    };
    if state.store.course(course_id).is_none() {
        return error_body(
            StatusCode::NOT_FOUND,
            format!("Course not found: {}", course_id),
        );
    }

    let user = match get_or_create_wallet_user(&state.store, &wallet) {
        Ok(user) => user,
        Err(e) => return error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    if state.store.enrollment(user.id, course_id).is_some() {
        return error_body(StatusCode::BAD_REQUEST, "Already enrolled in this course");
    }

    match state.store.create_enrollment(NewEnrollment {
        user_id: user.id,
        course_id,
    }) {
        Ok(enrollment) => {
            state.metrics.enrollments_total.inc();
            (StatusCode::CREATED, Json(enrollment)).into_response()
        }
        Err(e) => error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

/// `GET /api/enrollments/me` — the wallet user's enrollments. A wallet the
/// platform has never seen simply has none yet.
async fn my_enrollments_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(wallet) = wallet_from_headers(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Wallet address is required");
    };
    let enrollments = match state.store.user_by_wallet(&wallet) {
        Some(user) => state.store.user_enrollments(user.id),
        None => Vec::new(),
    };
    (StatusCode::OK, Json(enrollments)).into_response()
}

// ---------------------------------------------------------------------------
// Handlers — credentials
// ---------------------------------------------------------------------------

/// `GET /api/credentials/me` — the wallet user's stored credentials.
async fn my_credentials_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let Some(wallet) = wallet_from_headers(&headers) else {
        return error_body(StatusCode::UNAUTHORIZED, "Wallet address is required");
    };
    let credentials = match state.store.user_by_wallet(&wallet) {
        Some(user) => state.store.user_credentials(user.id),
        None => Vec::new(),
    };
    (StatusCode::OK, Json(credentials)).into_response()
}

/// `POST /api/credentials/issue` — anchors a course-completion credential
/// to the ledger and records it for the recipient.
async fn issue_credential_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<IssueRequest>,
) -> impl IntoResponse {
    let recipient = req
        .destination
        .or(req.wallet_address)
        .or_else(|| wallet_from_headers(&headers));
    let Some(recipient) = recipient else {
        return error_body(
            StatusCode::BAD_REQUEST,
            "Recipient wallet address is required",
        );
    };

    let Some(course) = state.store.course(req.course_id) else {
        return error_body(
            StatusCode::NOT_FOUND,
            format!("Course not found: {}", req.course_id),
        );
    };

    let user = match get_or_create_wallet_user(&state.store, &recipient) {
        Ok(user) => user,
        Err(e) => return error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };

    let skills = vec![
        "Blockchain".to_string(),
        "Stellar".to_string(),
        course.category.clone(),
    ];
    let record = CredentialRecord::platform_issued(
        &format!("cred-{}", chrono::Utc::now().timestamp()),
        &format!("{} Certificate", course.title),
        &recipient,
        skills.clone(),
    );

    let timer = state.metrics.issuance_latency_seconds.start_timer();
    let receipt = match state.issuer.issue(&recipient, &record) {
        Ok(receipt) => receipt,
        Err(e) => {
            timer.observe_duration();
            tracing::error!(error = %e, recipient = %recipient, "credential issuance failed");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string());
        }
    };
    timer.observe_duration();

    let credential = state.store.create_credential(NewCredential {
        title: format!("{} Certificate", course.title),
        description: format!("Successfully completed the {} course", course.title),
        user_id: user.id,
        course_id: course.id,
        issuer_name: "EduChain Platform".into(),
        tx_hash: Some(receipt.transaction_hash.clone()),
        skills,
    });

    state.metrics.credentials_issued_total.inc();
    state.refresh_ledger_gauges();

    let resp = IssueResponse {
        credential,
        transaction_hash: receipt.transaction_hash,
        asset_code: receipt.asset_code,
        explorer_url: receipt.explorer_url,
    };
    (StatusCode::CREATED, Json(resp)).into_response()
}

/// `GET /api/credentials/verify/:hash` — verifies a credential against the
/// ledger and attaches the platform's own record when one matches the hash.
async fn verify_credential_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.issuer.verify(&hash) {
        Ok(report) => {
            state.metrics.credential_verifications_total.inc();
            let platform_record = state.store.credential_by_tx_hash(&hash);
            (
                StatusCode::OK,
                Json(VerifyResponse {
                    report,
                    platform_record,
                }),
            )
                .into_response()
        }
        Err(e @ VerifyError::InvalidHash(_)) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e @ VerifyError::TransactionNotFound(_)) => {
            error_body(StatusCode::NOT_FOUND, e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers — lending
// ---------------------------------------------------------------------------

/// `POST /api/loans/apply` — scores the borrower's stored credentials and
/// returns a loan offer. Weak credentials yield an unapproved offer, not an
/// error; only a malformed application fails.
async fn loan_apply_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoanApplicationRequest>,
) -> impl IntoResponse {
    let Some(borrower) = req.borrower.or_else(|| wallet_from_headers(&headers)) else {
        return error_body(StatusCode::BAD_REQUEST, "Borrower address is required");
    };

    // The credentials backing the application are the ones the platform
    // holds for this wallet, not whatever the client claims to have.
    let profiles: Vec<CredentialProfile> = match state.store.user_by_wallet(&borrower) {
        Some(user) => state
            .store
            .user_credentials(user.id)
            .into_iter()
            .map(|c| CredentialProfile {
                issuer: c.issuer_name,
                skills: c.skills,
            })
            .collect(),
        None => Vec::new(),
    };

    let request = LoanRequest {
        borrower,
        amount: req.amount,
    };
    match lending::offer::process_application(&profiles, &request) {
        Ok(offer) => {
            state.metrics.loan_applications_total.inc();
            if offer.assessment.approved {
                state.metrics.loans_approved_total.inc();
            }
            (StatusCode::OK, Json(offer)).into_response()
        }
        Err(e) => error_body(StatusCode::BAD_REQUEST, e.to_string()),
    }
}

/// `GET /api/loans/pool` — lending pool statistics.
async fn pool_stats_handler() -> impl IntoResponse {
    Json(lending::offer::pool_statistics())
}

/// `GET /api/loans/borrower/:address` — the borrower's ledger standing.
/// Unknown accounts come back all-zero, never as an error.
async fn borrower_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    Json(lending::validate_borrower(&state.ledger, &address))
}

/// `GET /api/loans/contract` — lending contract metadata.
async fn loan_contract_handler() -> impl IntoResponse {
    Json(lending::offer::contract_info())
}

// ---------------------------------------------------------------------------
// Handlers — ledger
// ---------------------------------------------------------------------------

/// `POST /api/ledger/accounts` — generates a keypair and funds it through
/// the simulated friendbot. Test network only; the secret is in the body.
async fn create_account_handler(State(state): State<AppState>) -> impl IntoResponse {
    let keypair = state.ledger.create_test_account();
    state.refresh_ledger_gauges();
    (StatusCode::CREATED, Json(keypair))
}

/// `GET /api/ledger/accounts/:address` — a ledger account, 404 when the
/// address has never been funded.
async fn ledger_account_handler(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.ledger.load_account(&address) {
        Some(account) => (StatusCode::OK, Json(account)).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            format!("Account not found: {}", address),
        ),
    }
}

/// `GET /api/ledger/transactions/:hash` — a recorded transaction by hash.
async fn ledger_transaction_handler(
    Path(hash): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    match state.ledger.transaction(&hash) {
        Some(tx) => (StatusCode::OK, Json(tx)).into_response(),
        None => error_body(
            StatusCode::NOT_FOUND,
            format!("Transaction not found: {}", hash),
        ),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
