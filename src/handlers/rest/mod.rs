pub mod auth;
pub mod summarize;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_macros::debug_handler;
use tower_http::trace::TraceLayer;
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use std::sync::Arc;

use crate::{
    auth::AuthUser,
    dto::{
        CreateNoteRequest, CredentialsRequest, DeleteNoteResponse, NotePageResponse, NoteResponse,
        PageQuery, RefreshRequest, SessionResponse, SummarizeRequest, SummarizeResponse,
        UpdateNoteRequest, UserResponse,
    },
    service::{NoteService, NoteServiceError},
    state::AppState,
    supabase::SupabaseError,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        list_notes,
        create_note,
        get_note,
        update_note,
        delete_note,
        summarize::summarize,
        auth::sign_up,
        auth::sign_in,
        auth::refresh,
        auth::sign_in_with_google,
        auth::sign_out,
        auth::session
    ),
    components(schemas(
        NoteResponse,
        NotePageResponse,
        CreateNoteRequest,
        UpdateNoteRequest,
        DeleteNoteResponse,
        SummarizeRequest,
        SummarizeResponse,
        CredentialsRequest,
        RefreshRequest,
        SessionResponse,
        UserResponse
    )),
    modifiers(&BearerAuth),
    tags(
        (name = "notes", description = "Notes of the signed in user"),
        (name = "summaries", description = "AI note summaries"),
        (name = "auth", description = "Sign in and session management")
    )
)]
pub struct ApiDoc;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/notes", get(list_notes).post(create_note))
        .route(
            "/api/notes/{id}",
            get(get_note).put(update_note).delete(delete_note),
        )
        .route("/api/sumarize", post(summarize::summarize))
        .route("/api/auth/signup", post(auth::sign_up))
        .route("/api/auth/signin", post(auth::sign_in))
        .route("/api/auth/refresh", post(auth::refresh))
        .route("/api/auth/google", get(auth::sign_in_with_google))
        .route("/api/auth/signout", post(auth::sign_out))
        .route("/api/auth/session", get(auth::session))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn root() -> Response {
    (StatusCode::OK, "Hello world!").into_response()
}

fn failure(e: &NoteServiceError, message: &'static str) -> Response {
    match e {
        NoteServiceError::EmptyContent => (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        NoteServiceError::Supabase(SupabaseError::Api { status, .. })
            if *status == StatusCode::UNAUTHORIZED =>
        {
            (StatusCode::UNAUTHORIZED, "Not authenticated").into_response()
        }
        NoteServiceError::Supabase(inner) => {
            tracing::error!("{}: {}", message, inner);
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/notes",
    params(PageQuery),
    responses(
        (status = 200, description = "One page of notes, newest first", body = NotePageResponse),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
#[debug_handler(state = AppState)]
pub async fn list_notes(
    State(service): State<Arc<NoteService>>,
    caller: AuthUser,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.list_notes(&caller, query.page).await {
        Ok(page) => (StatusCode::OK, Json(NotePageResponse::from(page))).into_response(),
        Err(e) => failure(&e, "Failed to load notes"),
    }
}

#[utoipa::path(
    post,
    path = "/api/notes",
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Note created successfully", body = NoteResponse),
        (status = 400, description = "Empty note"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
#[debug_handler(state = AppState)]
pub async fn create_note(
    State(service): State<Arc<NoteService>>,
    caller: AuthUser,
    Json(payload): Json<CreateNoteRequest>,
) -> Response {
    match service.create_note(&caller, &payload.content).await {
        Ok(note) => (StatusCode::CREATED, Json(NoteResponse::from(note))).into_response(),
        Err(e) => failure(&e, "Failed to add note"),
    }
}

#[utoipa::path(
    get,
    path = "/api/notes/{id}",
    params(
        ("id" = Uuid, Path, description = "Note ID")
    ),
    responses(
        (status = 200, description = "Note found", body = NoteResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
#[debug_handler(state = AppState)]
pub async fn get_note(
    State(service): State<Arc<NoteService>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
) -> Response {
    match service.get_note(&caller, id).await {
        Ok(Some(note)) => (StatusCode::OK, Json(NoteResponse::from(note))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Note not found").into_response(),
        Err(e) => failure(&e, "Failed to get note"),
    }
}

#[utoipa::path(
    put,
    path = "/api/notes/{id}",
    params(
        ("id" = Uuid, Path, description = "Note ID")
    ),
    request_body = UpdateNoteRequest,
    responses(
        (status = 200, description = "Note updated successfully", body = NoteResponse),
        (status = 400, description = "Empty note"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
#[debug_handler(state = AppState)]
pub async fn update_note(
    State(service): State<Arc<NoteService>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNoteRequest>,
) -> Response {
    match service.update_note(&caller, id, &payload.content).await {
        Ok(Some(note)) => (StatusCode::OK, Json(NoteResponse::from(note))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Note not found").into_response(),
        Err(e) => failure(&e, "Failed to update note"),
    }
}

#[utoipa::path(
    delete,
    path = "/api/notes/{id}",
    params(
        ("id" = Uuid, Path, description = "Note ID"),
        PageQuery
    ),
    responses(
        (status = 200, description = "Note deleted successfully", body = DeleteNoteResponse),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Note not found"),
        (status = 500, description = "Internal server error")
    ),
    security(("bearer" = [])),
    tag = "notes"
)]
#[debug_handler(state = AppState)]
pub async fn delete_note(
    State(service): State<Arc<NoteService>>,
    caller: AuthUser,
    Path(id): Path<Uuid>,
    Query(query): Query<PageQuery>,
) -> Response {
    match service.delete_note(&caller, id, query.page).await {
        Ok(Some(page)) => (StatusCode::OK, Json(DeleteNoteResponse { page })).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Note not found").into_response(),
        Err(e) => failure(&e, "Failed to delete note"),
    }
}
