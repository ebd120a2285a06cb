pub mod admin;
pub mod agents;
pub mod health;
pub mod panchayaths;

use actix_web::{error::InternalError, web, HttpRequest, HttpResponse};
use chrono::Utc;

use crate::auth::{AdminSession, AuthError, ADMIN_TOKEN_HEADER};
use crate::AppState;

fn unauthorized(err: AuthError) -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": err.message()
    }))
}

/// Shared admin guard: signature, expiry, then the session row must still exist.
pub fn require_admin(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<AdminSession, HttpResponse> {
    let token = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let token = match token {
        Some(t) => t,
        None => return Err(unauthorized(AuthError::MissingToken)),
    };

    let session = state
        .signer
        .verify(token, Utc::now())
        .map_err(unauthorized)?;

    match state.db.admin_session_exists(&session.session_id) {
        Ok(true) => Ok(session),
        Ok(false) => Err(unauthorized(AuthError::Revoked)),
        Err(e) => {
            log::error!("Session validation error: {}", e);
            Err(HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Internal server error"
            })))
        }
    }
}

fn bad_request(message: String) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": message }))
}

/// Malformed JSON bodies get the same `{error}` envelope as everything else.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid request body: {}", err));
        InternalError::from_response(err, response).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        let response = bad_request(format!("Invalid query string: {}", err));
        InternalError::from_response(err, response).into()
    })
}
