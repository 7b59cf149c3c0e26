//! Home route handler.
//!
//! There is no listing page: the site root sends buyers to the featured
//! product. It is also where abandoned checkouts return.

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
};

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Redirect to the first pre-rendered product page.
pub async fn home(State(state): State<AppState>) -> Result<Response> {
    let featured = state
        .pages()
        .paths()
        .paths()
        .first()
        .ok_or_else(|| AppError::NotFound("no featured product configured".to_string()))?;

    Ok(Redirect::to(&format!("/product/{featured}")).into_response())
}
