use actix_web::{web, HttpRequest, HttpResponse, Responder};
use pennyekart_agent_types::{ApiResponse, CreatePanchayathRequest, UpdatePanchayathRequest};

use super::require_admin;
use crate::agents::MutationError;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/panchayaths")
            .route("", web::get().to(list_panchayaths))
            .route("", web::post().to(create_panchayath))
            .route("/{id}", web::put().to(update_panchayath))
            .route("/{id}", web::delete().to(delete_panchayath)),
    );
}

fn check_fields(name: Option<&str>, ward_count: Option<i64>) -> Result<(), MutationError> {
    if name.is_some_and(|n| n.is_empty()) {
        return Err(MutationError::validation("Panchayath name is required"));
    }
    if ward_count.is_some_and(|c| c < 0) {
        return Err(MutationError::validation("Ward count cannot be negative"));
    }
    Ok(())
}

async fn list_panchayaths(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_panchayaths() {
        Ok(panchayaths) => HttpResponse::Ok().json(ApiResponse::ok(panchayaths)),
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn create_panchayath(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<CreatePanchayathRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let name = body.name.trim();
    if let Err(e) = check_fields(Some(name), Some(body.ward_count)) {
        return e.to_response();
    }
    match state.db.create_panchayath(name, body.ward_count) {
        Ok(panchayath) => {
            log::info!("Created panchayath {} ({})", panchayath.name, panchayath.id);
            HttpResponse::Created().json(ApiResponse::ok(panchayath))
        }
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn update_panchayath(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
    body: web::Json<UpdatePanchayathRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let id = path.into_inner();
    let name = body.name.as_deref().map(str::trim);
    if let Err(e) = check_fields(name, body.ward_count) {
        return e.to_response();
    }
    match state.db.update_panchayath(&id, name, body.ward_count) {
        Ok(Some(panchayath)) => HttpResponse::Ok().json(ApiResponse::ok(panchayath)),
        Ok(None) => MutationError::not_found("Panchayath not found").to_response(),
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn delete_panchayath(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<String>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let id = path.into_inner();
    match state.db.count_agents_in_panchayath(&id) {
        Ok(0) => {}
        Ok(n) => {
            return MutationError::validation(format!(
                "Panchayath is still referenced by {} agent(s)",
                n
            ))
            .to_response();
        }
        Err(e) => return MutationError::from(e).to_response(),
    }
    match state.db.delete_panchayath(&id) {
        Ok(true) => HttpResponse::Ok().json(ApiResponse::ok(serde_json::json!({
            "id": id,
            "deleted": true
        }))),
        Ok(false) => MutationError::not_found("Panchayath not found").to_response(),
        Err(e) => MutationError::from(e).to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ADMIN_TOKEN_HEADER;
    use crate::controllers::json_config;
    use crate::controllers::test_support::{admin_token, test_state};
    use crate::models::{Agent, AgentRole};
    use actix_web::{http::StatusCode, test, App};

    #[actix_web::test]
    async fn test_panchayath_crud() {
        let (_dir, state) = test_state();
        let token = admin_token(&state);
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/panchayaths")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(serde_json::json!({ "name": "Kondotty", "ward_count": 20 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: serde_json::Value = test::read_body_json(resp).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/panchayaths")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(serde_json::json!({ "name": "Kondotty" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::put()
            .uri(&format!("/api/panchayaths/{}", id))
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(serde_json::json!({ "ward_count": 21 }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["ward_count"], 21);
        assert_eq!(body["data"]["name"], "Kondotty");

        let req = test::TestRequest::get()
            .uri("/api/panchayaths")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 1);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/panchayaths/{}", id))
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::delete()
            .uri(&format!("/api/panchayaths/{}", id))
            .insert_header((ADMIN_TOKEN_HEADER, token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_referenced_panchayath_cannot_be_deleted() {
        let (_dir, state) = test_state();
        let token = admin_token(&state);
        let p = state.db.create_panchayath("Pulikkal", 18).unwrap();
        state
            .db
            .insert_agent(&Agent {
                id: "tl".into(),
                name: "Suhara".into(),
                mobile: "9000000001".into(),
                role: AgentRole::TeamLeader,
                panchayath_id: p.id.clone(),
                ward: "N/A".into(),
                parent_agent_id: None,
                customer_count: 0,
                responsible_panchayath_ids: vec![],
                responsible_wards: vec![],
                is_active: true,
                created_at: "2026-01-01T00:00:00+00:00".into(),
                updated_at: "2026-01-01T00:00:00+00:00".into(),
                created_by: None,
            })
            .unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::delete()
            .uri(&format!("/api/panchayaths/{}", p.id))
            .insert_header((ADMIN_TOKEN_HEADER, token))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(state.db.get_panchayath(&p.id).unwrap().is_some());

        let req = test::TestRequest::get().uri("/api/panchayaths").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }
}
