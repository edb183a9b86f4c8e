use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::domain::{ApplicationId, EnquiryId, FlatType, PersonId, ProjectDraft, ProjectId};
use super::error::AllocationError;
use super::repository::RepositoryError;
use super::service::AllocationService;

type SharedService = Arc<AllocationService>;

/// Router builder exposing every allocation workflow over HTTP.
pub fn allocation_router(service: SharedService) -> Router {
    Router::new()
        .route(
            "/api/v1/projects",
            get(list_projects_handler).post(create_project_handler),
        )
        .route(
            "/api/v1/projects/:project_id/visibility",
            put(visibility_handler),
        )
        .route(
            "/api/v1/projects/:project_id/eligibility",
            get(eligibility_handler),
        )
        .route("/api/v1/applications", post(submit_handler))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler),
        )
        .route(
            "/api/v1/applications/:application_id/decision",
            post(decision_handler),
        )
        .route(
            "/api/v1/applications/:application_id/receipt",
            get(receipt_handler),
        )
        .route(
            "/api/v1/applications/:application_id/withdrawal/decision",
            post(withdrawal_decision_handler),
        )
        .route("/api/v1/bookings", post(booking_handler))
        .route(
            "/api/v1/applicants/:applicant_id/withdrawal",
            post(withdrawal_request_handler),
        )
        .route(
            "/api/v1/officers/:officer_id/assignment",
            post(assignment_request_handler),
        )
        .route(
            "/api/v1/officers/:officer_id/assignment/decision",
            post(assignment_decision_handler),
        )
        .route("/api/v1/enquiries", post(enquiry_submit_handler))
        .route(
            "/api/v1/enquiries/:enquiry_id",
            put(enquiry_edit_handler).delete(enquiry_delete_handler),
        )
        .route(
            "/api/v1/enquiries/:enquiry_id/reply",
            post(enquiry_reply_handler),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ViewerQuery {
    pub(crate) viewer: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApplicantQuery {
    pub(crate) applicant: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AuthorQuery {
    pub(crate) author: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateProjectRequest {
    pub(crate) manager_id: PersonId,
    pub(crate) project: ProjectDraft,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisibilityRequest {
    pub(crate) manager_id: PersonId,
    pub(crate) visible: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SubmitApplicationRequest {
    pub(crate) applicant_id: PersonId,
    pub(crate) project_id: ProjectId,
    pub(crate) flat_type: FlatType,
    #[serde(default)]
    pub(crate) submitted_on: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionRequest {
    pub(crate) manager_id: PersonId,
    pub(crate) approve: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BookingRequest {
    pub(crate) officer_id: PersonId,
    pub(crate) applicant_id: PersonId,
    pub(crate) flat_type: FlatType,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AssignmentRequest {
    pub(crate) project_id: ProjectId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnquiryRequest {
    pub(crate) applicant_id: PersonId,
    pub(crate) project_id: ProjectId,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnquiryEditRequest {
    pub(crate) author_id: PersonId,
    pub(crate) message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnquiryReplyRequest {
    pub(crate) responder_id: PersonId,
    pub(crate) response: String,
}

#[derive(Debug, Serialize)]
struct EligibilityResponse {
    applicant_id: String,
    project_id: String,
    flat_types: Vec<FlatType>,
}

impl AllocationError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AllocationError::Ineligible { .. }
            | AllocationError::InventoryExhausted { .. }
            | AllocationError::BlankText { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AllocationError::DuplicateActiveApplication { .. }
            | AllocationError::InvalidState { .. }
            | AllocationError::AlreadyAssigned { .. }
            | AllocationError::Repository(RepositoryError::Conflict { .. }) => StatusCode::CONFLICT,
            AllocationError::NotFound { .. }
            | AllocationError::Repository(RepositoryError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            AllocationError::NotPermitted { .. } => StatusCode::FORBIDDEN,
            AllocationError::NegativeInventory { .. }
            | AllocationError::OverRelease { .. }
            | AllocationError::Repository(RepositoryError::Unavailable(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AllocationError {
    fn into_response(self) -> Response {
        let payload = json!({ "error": self.to_string() });
        (self.status_code(), Json(payload)).into_response()
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, AllocationError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn list_projects_handler(
    State(service): State<SharedService>,
    Query(query): Query<ViewerQuery>,
) -> Response {
    respond(
        StatusCode::OK,
        service.visible_projects(&PersonId(query.viewer)),
    )
}

pub(crate) async fn create_project_handler(
    State(service): State<SharedService>,
    Json(request): Json<CreateProjectRequest>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.create_project(&request.manager_id, request.project),
    )
}

pub(crate) async fn visibility_handler(
    State(service): State<SharedService>,
    Path(project_id): Path<String>,
    Json(request): Json<VisibilityRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.set_visibility(&request.manager_id, &ProjectId(project_id), request.visible),
    )
}

pub(crate) async fn eligibility_handler(
    State(service): State<SharedService>,
    Path(project_id): Path<String>,
    Query(query): Query<ApplicantQuery>,
) -> Response {
    let applicant = PersonId(query.applicant);
    let project = ProjectId(project_id);
    let result = service
        .eligible_flat_types(&applicant, &project)
        .map(|flat_types| EligibilityResponse {
            applicant_id: applicant.0.clone(),
            project_id: project.0.clone(),
            flat_types: flat_types.into_iter().collect(),
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_handler(
    State(service): State<SharedService>,
    Json(request): Json<SubmitApplicationRequest>,
) -> Response {
    let today = request
        .submitted_on
        .unwrap_or_else(|| Local::now().date_naive());
    respond(
        StatusCode::CREATED,
        service.submit_application(
            &request.applicant_id,
            &request.project_id,
            request.flat_type,
            today,
        ),
    )
}

pub(crate) async fn application_handler(
    State(service): State<SharedService>,
    Path(application_id): Path<String>,
) -> Response {
    respond(
        StatusCode::OK,
        service.application(&ApplicationId(application_id)),
    )
}

pub(crate) async fn decision_handler(
    State(service): State<SharedService>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.decide_application(
            &request.manager_id,
            &ApplicationId(application_id),
            request.approve,
        ),
    )
}

pub(crate) async fn receipt_handler(
    State(service): State<SharedService>,
    Path(application_id): Path<String>,
) -> Response {
    respond(
        StatusCode::OK,
        service.receipt(&ApplicationId(application_id)),
    )
}

pub(crate) async fn booking_handler(
    State(service): State<SharedService>,
    Json(request): Json<BookingRequest>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.book(&request.officer_id, &request.applicant_id, request.flat_type),
    )
}

pub(crate) async fn withdrawal_request_handler(
    State(service): State<SharedService>,
    Path(applicant_id): Path<String>,
) -> Response {
    respond(
        StatusCode::ACCEPTED,
        service.request_withdrawal(&PersonId(applicant_id)),
    )
}

pub(crate) async fn withdrawal_decision_handler(
    State(service): State<SharedService>,
    Path(application_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.decide_withdrawal(
            &request.manager_id,
            &ApplicationId(application_id),
            request.approve,
        ),
    )
}

pub(crate) async fn assignment_request_handler(
    State(service): State<SharedService>,
    Path(officer_id): Path<String>,
    Json(request): Json<AssignmentRequest>,
) -> Response {
    respond(
        StatusCode::ACCEPTED,
        service.request_assignment(&PersonId(officer_id), &request.project_id),
    )
}

pub(crate) async fn assignment_decision_handler(
    State(service): State<SharedService>,
    Path(officer_id): Path<String>,
    Json(request): Json<DecisionRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.decide_assignment(&request.manager_id, &PersonId(officer_id), request.approve),
    )
}

pub(crate) async fn enquiry_submit_handler(
    State(service): State<SharedService>,
    Json(request): Json<EnquiryRequest>,
) -> Response {
    respond(
        StatusCode::CREATED,
        service.submit_enquiry(&request.applicant_id, &request.project_id, request.message),
    )
}

pub(crate) async fn enquiry_edit_handler(
    State(service): State<SharedService>,
    Path(enquiry_id): Path<String>,
    Json(request): Json<EnquiryEditRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.edit_enquiry(&request.author_id, &EnquiryId(enquiry_id), request.message),
    )
}

pub(crate) async fn enquiry_delete_handler(
    State(service): State<SharedService>,
    Path(enquiry_id): Path<String>,
    Query(query): Query<AuthorQuery>,
) -> Response {
    respond(
        StatusCode::OK,
        service.delete_enquiry(&PersonId(query.author), &EnquiryId(enquiry_id)),
    )
}

pub(crate) async fn enquiry_reply_handler(
    State(service): State<SharedService>,
    Path(enquiry_id): Path<String>,
    Json(request): Json<EnquiryReplyRequest>,
) -> Response {
    respond(
        StatusCode::OK,
        service.reply_enquiry(&request.responder_id, &EnquiryId(enquiry_id), request.response),
    )
}
