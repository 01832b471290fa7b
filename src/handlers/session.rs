use axum::{
    extract::{RawQuery, State},
    http::StatusCode,
    Json,
};

use super::{session_error, ApiError};
use crate::error::SessionError;
use crate::models::{
    JoinDocumentRequest, OpenLinkResponse, SessionView, ShareResponse, UpdateContentRequest,
    UpdateTitleRequest,
};
use crate::routes::AppState;

/// Current session state
pub async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(state.session.view())
}

/// Join a document by id or shared link
pub async fn join_document(
    State(state): State<AppState>,
    Json(request): Json<JoinDocumentRequest>,
) -> Result<Json<SessionView>, ApiError> {
    state
        .session
        .join(&request.input)
        .await
        .map_err(|e| session_error(&e))?;
    Ok(Json(state.session.view()))
}

/// Replace the content of the open document
pub async fn update_content(
    State(state): State<AppState>,
    Json(request): Json<UpdateContentRequest>,
) -> Result<Json<SessionView>, ApiError> {
    match state.session.update_content(&request.content) {
        Ok(true) => Ok(Json(state.session.view())),
        Ok(false) => Err(session_error(&SessionError::NoActiveSession)),
        Err(e) => Err(session_error(&e)),
    }
}

/// Rename the open document
pub async fn update_title(
    State(state): State<AppState>,
    Json(request): Json<UpdateTitleRequest>,
) -> Result<Json<SessionView>, ApiError> {
    match state.session.update_title(&request.title) {
        Ok(true) => Ok(Json(state.session.view())),
        Ok(false) => Err(session_error(&SessionError::NoActiveSession)),
        Err(e) => Err(session_error(&e)),
    }
}

/// Shareable id and link of the open document
pub async fn share_document(State(state): State<AppState>) -> Json<ShareResponse> {
    Json(ShareResponse {
        document_id: state.session.get_shareable_id(),
        url: state.session.get_shareable_url(),
    })
}

/// Open the page address carrying `?doc=`, consuming the parameter
pub async fn open_link(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<(StatusCode, Json<OpenLinkResponse>), ApiError> {
    let mut url = state.public_url.clone();
    url.set_query(query.as_deref());

    let opened = state.session.open_from_link(&url).await;
    if let Some(Err(e)) = &opened.loaded {
        return Err(session_error(e));
    }
    Ok((
        StatusCode::OK,
        Json(OpenLinkResponse {
            location: opened.location.to_string(),
            session: state.session.view(),
        }),
    ))
}
