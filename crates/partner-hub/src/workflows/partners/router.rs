use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;

use super::assignment::{CommissionAssignment, ProductAssignment};
use super::domain::{
    Actor, DocumentKind, NoteVisibility, PartnerId, PartnerRegistration, PartnerTier, PayoutPeriod,
    Role,
};
use super::ledger::DocumentUpload;
use super::repository::{NotificationPublisher, PartnerRepository};
use super::resubmission::ProfileUpdate;
use super::service::{PartnerService, PartnerServiceError};

/// Router builder exposing the partner lifecycle endpoints. Authentication
/// happens upstream; the asserted identity arrives in `x-actor-*` headers.
pub fn partner_router<R, N>(service: Arc<PartnerService<R, N>>) -> Router
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    Router::new()
        .route("/api/v1/partners/self-register", post(self_register_handler::<R, N>))
        .route("/api/v1/partners/create", post(create_handler::<R, N>))
        .route("/api/v1/partners/directory", get(directory_handler::<R, N>))
        .route("/api/v1/partners/l1-queue", get(l1_queue_handler::<R, N>))
        .route("/api/v1/partners/l2-queue", get(l2_queue_handler::<R, N>))
        .route("/api/v1/partners/rejected", get(rejected_handler::<R, N>))
        .route("/api/v1/partners/on-hold", get(on_hold_handler::<R, N>))
        .route("/api/v1/partners/:partner_id", get(detail_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/review", patch(review_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/send-to-l1", post(send_to_l1_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/l1-approve", post(l1_approve_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/l1-reject", post(l1_reject_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/l2-approve", post(l2_approve_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/l2-reject", post(l2_reject_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/put-on-hold", post(put_on_hold_handler::<R, N>))
        .route("/api/v1/partners/:partner_id/resume", post(resume_handler::<R, N>))
        .route(
            "/api/v1/partners/:partner_id/send-back-to-partner",
            post(send_back_handler::<R, N>),
        )
        .route(
            "/api/v1/partners/:partner_id/reject-permanently",
            post(reject_permanently_handler::<R, N>),
        )
        .route("/api/v1/partners/:partner_id/resubmit", post(resubmit_handler::<R, N>))
        .route(
            "/api/v1/partners/:partner_id/upload-document",
            post(upload_document_handler::<R, N>),
        )
        .route(
            "/api/v1/partners/:partner_id/verify-document",
            post(verify_document_handler::<R, N>),
        )
        .route(
            "/api/v1/partners/:partner_id/assign-products-commission",
            post(assign_products_handler::<R, N>),
        )
        .route("/api/v1/partners/:partner_id/add-note", post(add_note_handler::<R, N>))
        .with_state(service)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };

        let id = header("x-actor-id");
        let role = header("x-actor-role").and_then(|raw| Role::parse(&raw));
        match (id, role) {
            (Some(id), Some(role)) if !id.is_empty() => Ok(Actor {
                id,
                name: header("x-actor-name").unwrap_or_default(),
                role,
            }),
            _ => {
                let payload = json!({
                    "error": "request is missing a valid x-actor-id / x-actor-role identity",
                    "kind": "unauthenticated",
                });
                Err((StatusCode::UNAUTHORIZED, axum::Json(payload)).into_response())
            }
        }
    }
}

fn error_response(error: PartnerServiceError) -> Response {
    let status = match error.kind() {
        "validation_error" => StatusCode::UNPROCESSABLE_ENTITY,
        "unauthorized" => StatusCode::FORBIDDEN,
        "not_found" => StatusCode::NOT_FOUND,
        "invalid_transition" | "conflict" => StatusCode::CONFLICT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
        "kind": error.kind(),
    });
    (status, axum::Json(payload)).into_response()
}

fn confirm(
    result: Result<super::repository::PartnerRecord, PartnerServiceError>,
    success: StatusCode,
) -> Response {
    match result {
        Ok(record) => (success, axum::Json(record.status_view())).into_response(),
        Err(error) => error_response(error),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TransitionRequest {
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ApprovalRequest {
    #[serde(default)]
    pub(crate) comments: Option<String>,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RejectionRequest {
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) comments: Option<String>,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct HoldRequest {
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FeedbackRequest {
    pub(crate) message: String,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PermanentRejectionRequest {
    pub(crate) reason: String,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TierReviewRequest {
    pub(crate) tier: PartnerTier,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResubmitRequest {
    #[serde(default)]
    pub(crate) updates: ProfileUpdate,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UploadDocumentRequest {
    pub(crate) document_type: DocumentKind,
    pub(crate) document_name: String,
    pub(crate) document_data: String,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyDocumentRequest {
    pub(crate) document_index: usize,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentRequest {
    pub(crate) products: Vec<ProductAssignmentRequest>,
    pub(crate) payout_period: PayoutPeriod,
    #[serde(default)]
    pub(crate) idempotency_key: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ProductAssignmentRequest {
    pub(crate) product_id: String,
    #[serde(default)]
    pub(crate) custom_margin: Decimal,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NoteRequest {
    pub(crate) note: String,
    #[serde(default = "default_visibility")]
    pub(crate) visibility: NoteVisibility,
}

fn default_visibility() -> NoteVisibility {
    NoteVisibility::Internal
}

pub(crate) async fn self_register_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    axum::Json(registration): axum::Json<PartnerRegistration>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.self_register(registration) {
        Ok(record) => {
            let payload = json!({
                "partner_id": record.id,
                "owner_user_id": record.owner_user_id,
                "status": record.status.label(),
                "onboarding_progress": record.onboarding_progress,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
    axum::Json(registration): axum::Json<PartnerRegistration>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.create_by_manager(&actor, registration),
        StatusCode::CREATED,
    )
}

pub(crate) async fn directory_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.directory(&actor) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn l1_queue_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.l1_queue(&actor) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn l2_queue_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.l2_queue(&actor) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn rejected_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.rejected(&actor) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn on_hold_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.on_hold(&actor) {
        Ok(views) => (StatusCode::OK, axum::Json(views)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn detail_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    match service.get(&actor, &PartnerId(partner_id)) {
        Ok(record) => (StatusCode::OK, axum::Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<TierReviewRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.assign_tier(
            &actor,
            &PartnerId(partner_id),
            request.tier,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn send_to_l1_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    body: Option<axum::Json<TransitionRequest>>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let request = body.map(|axum::Json(inner)| inner).unwrap_or_default();
    confirm(
        service.send_to_l1(&actor, &PartnerId(partner_id), request.idempotency_key),
        StatusCode::OK,
    )
}

pub(crate) async fn l1_approve_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    body: Option<axum::Json<ApprovalRequest>>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let request = body.map(|axum::Json(inner)| inner).unwrap_or_default();
    confirm(
        service.approve_l1(
            &actor,
            &PartnerId(partner_id),
            request.comments,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn l1_reject_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<RejectionRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.reject_l1(
            &actor,
            &PartnerId(partner_id),
            request.reason,
            request.comments,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn l2_approve_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    body: Option<axum::Json<ApprovalRequest>>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let request = body.map(|axum::Json(inner)| inner).unwrap_or_default();
    confirm(
        service.approve_l2(
            &actor,
            &PartnerId(partner_id),
            request.comments,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn l2_reject_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<RejectionRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.reject_l2(
            &actor,
            &PartnerId(partner_id),
            request.reason,
            request.comments,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn put_on_hold_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<HoldRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.put_on_hold(
            &actor,
            &PartnerId(partner_id),
            request.reason,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn resume_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    body: Option<axum::Json<TransitionRequest>>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let request = body.map(|axum::Json(inner)| inner).unwrap_or_default();
    confirm(
        service.resume_from_hold(&actor, &PartnerId(partner_id), request.idempotency_key),
        StatusCode::OK,
    )
}

pub(crate) async fn send_back_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<FeedbackRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.send_back_to_partner(
            &actor,
            &PartnerId(partner_id),
            request.message,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn reject_permanently_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<PermanentRejectionRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.reject_permanently(
            &actor,
            &PartnerId(partner_id),
            request.reason,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn resubmit_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    body: Option<axum::Json<ResubmitRequest>>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let request = body.map(|axum::Json(inner)| inner).unwrap_or_default();
    confirm(
        service.resubmit(
            &actor,
            &PartnerId(partner_id),
            request.updates,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn upload_document_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<UploadDocumentRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let upload = DocumentUpload {
        document_type: request.document_type,
        document_name: request.document_name,
        document_data: request.document_data,
    };
    confirm(
        service.upload_document(
            &actor,
            &PartnerId(partner_id),
            upload,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn verify_document_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<VerifyDocumentRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.verify_document(
            &actor,
            &PartnerId(partner_id),
            request.document_index,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn assign_products_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<AssignmentRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    let commission = CommissionAssignment {
        products: request
            .products
            .into_iter()
            .map(|item| ProductAssignment {
                product_id: item.product_id,
                custom_margin: item.custom_margin,
            })
            .collect(),
        payout_period: request.payout_period,
    };
    confirm(
        service.assign_products(
            &actor,
            &PartnerId(partner_id),
            commission,
            request.idempotency_key,
        ),
        StatusCode::OK,
    )
}

pub(crate) async fn add_note_handler<R, N>(
    State(service): State<Arc<PartnerService<R, N>>>,
    Path(partner_id): Path<String>,
    actor: Actor,
    axum::Json(request): axum::Json<NoteRequest>,
) -> Response
where
    R: PartnerRepository + 'static,
    N: NotificationPublisher + 'static,
{
    confirm(
        service.add_note(
            &actor,
            &PartnerId(partner_id),
            request.note,
            request.visibility,
        ),
        StatusCode::OK,
    )
}
