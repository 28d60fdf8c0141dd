//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Redirect},
};

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its stored URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// The click is queued for the background worker without waiting; a full
/// queue drops the click, never the redirect.
///
/// # Errors
///
/// - 400 if the code is not 4-8 alphanumeric characters
/// - 404 if no link has this code
/// - 500 on store errors or when the stored URL is no longer a safe target
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&code).await?;

    Ok(Redirect::temporary(&long_url))
}
