//! Admin login, logout and session introspection

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use chrono::{Duration, Utc};
use pennyekart_agent_types::{ApiResponse, LoginRequest, LoginResponse};

use super::require_admin;
use crate::auth::{password::verify_password, AdminSession, AuthError};
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin")
            .route("/login", web::post().to(login))
            .route("/logout", web::post().to(logout))
            .route("/session", web::get().to(current_session)),
    );
}

fn internal_error() -> HttpResponse {
    HttpResponse::InternalServerError().json(serde_json::json!({
        "error": "Internal server error"
    }))
}

async fn login(state: web::Data<AppState>, body: web::Json<LoginRequest>) -> impl Responder {
    let username = body.username.trim();

    let admin = match state.db.get_admin_by_username(username) {
        Ok(Some(admin)) if admin.is_active => admin,
        Ok(_) => {
            log::warn!("Admin login failed for unknown or inactive user '{}'", username);
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "error": AuthError::InvalidCredentials.message()
            }));
        }
        Err(e) => {
            log::error!("Failed to load admin account: {}", e);
            return internal_error();
        }
    };

    if !verify_password(&body.password, &admin.password_hash) {
        log::warn!("Admin login failed for '{}': wrong password", username);
        return HttpResponse::Unauthorized().json(serde_json::json!({
            "error": AuthError::InvalidCredentials.message()
        }));
    }

    let now = Utc::now();
    let expires_at = now + Duration::hours(state.config.admin_session_ttl_hours);
    let record = match state
        .db
        .create_admin_session(&admin.id, &admin.username, now, expires_at)
    {
        Ok(record) => record,
        Err(e) => {
            log::error!("Failed to create admin session: {}", e);
            return internal_error();
        }
    };

    let session = AdminSession {
        session_id: record.id,
        admin_id: admin.id,
        username: admin.username.clone(),
        issued_at: now.timestamp(),
        expires_at: expires_at.timestamp(),
    };
    let token = match state.signer.sign(&session) {
        Ok(token) => token,
        Err(e) => {
            log::error!("Failed to sign admin token: {}", e);
            return internal_error();
        }
    };

    log::info!("Admin '{}' logged in", admin.username);
    HttpResponse::Ok().json(ApiResponse::ok(LoginResponse {
        token,
        username: admin.username,
        expires_at: expires_at.to_rfc3339(),
    }))
}

async fn logout(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    let session = match require_admin(&state, &req) {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    match state.db.delete_admin_session(&session.session_id) {
        Ok(_) => {
            log::info!("Admin '{}' logged out", session.username);
            HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({ "logged_out": true })))
        }
        Err(e) => {
            log::error!("Failed to revoke admin session: {}", e);
            internal_error()
        }
    }
}

async fn current_session(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    match require_admin(&state, &req) {
        Ok(session) => HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
            "username": session.username,
            "expires_at": session.expires_at_rfc3339()
        }))),
        Err(resp) => resp,
    }
}
