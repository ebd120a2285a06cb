//! `/api/pennyekart-agents`: listing, tree view and mutations for field agents

use actix_web::{web, HttpRequest, HttpResponse, Responder};
use pennyekart_agent_types::{
    AgentPostRequest, ApiResponse, BulkCreateResult, DeleteResult, UpdateAgentRequest,
};
use serde::Deserialize;

use super::require_admin;
use crate::agents::audit::audit;
use crate::agents::filter::{parent_candidates, AgentFilter};
use crate::agents::hierarchy::{build_hierarchy, count_nodes, flatten, hierarchy_view};
use crate::agents::{service, MutationError};
use crate::models::AgentRole;
use crate::AppState;

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/pennyekart-agents")
            .route("", web::get().to(list_agents))
            .route("", web::post().to(create_agents))
            .route("", web::put().to(update_agent))
            .route("", web::delete().to(delete_agent))
            .route("/hierarchy", web::get().to(get_hierarchy))
            .route("/hierarchy/rows", web::get().to(get_hierarchy_rows))
            .route("/parent-candidates", web::get().to(get_parent_candidates))
            .route("/audit", web::get().to(get_audit)),
    );
}

#[derive(Deserialize)]
struct DeleteQuery {
    #[serde(default)]
    id: Option<String>,
}

#[derive(Deserialize)]
struct ParentCandidatesQuery {
    role: AgentRole,
    panchayath_id: String,
}

async fn list_agents(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AgentFilter>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_agents() {
        Ok(agents) => HttpResponse::Ok().json(ApiResponse::ok(query.apply(agents))),
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn create_agents(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<AgentPostRequest>,
) -> impl Responder {
    let session = match require_admin(&state, &req) {
        Ok(session) => session,
        Err(resp) => return resp,
    };
    let strict = state.config.strict_hierarchy;

    match body.into_inner() {
        AgentPostRequest::Create { agent } => {
            match service::create_agent(&state.db, agent, &session.username, strict) {
                Ok(agent) => HttpResponse::Created().json(ApiResponse::ok(agent)),
                Err(e) => e.to_response(),
            }
        }
        AgentPostRequest::BulkCreate { agents } => {
            match service::bulk_create_agents(&state.db, agents, &session.username, strict) {
                Ok(count) => HttpResponse::Ok().json(ApiResponse::ok(BulkCreateResult { count })),
                Err(e) => e.to_response(),
            }
        }
    }
}

async fn update_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    body: web::Json<UpdateAgentRequest>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let UpdateAgentRequest { id, agent } = body.into_inner();
    match service::update_agent(&state.db, &id, agent, state.config.strict_hierarchy) {
        Ok(agent) => HttpResponse::Ok().json(ApiResponse::ok(agent)),
        Err(e) => e.to_response(),
    }
}

async fn delete_agent(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<DeleteQuery>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    let id = query.into_inner().id.unwrap_or_default();
    match service::delete_agent(&state.db, &id) {
        Ok(()) => HttpResponse::Ok().json(ApiResponse::ok(DeleteResult {
            id: id.trim().to_string(),
            deleted: true,
        })),
        Err(e) => e.to_response(),
    }
}

async fn get_hierarchy(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AgentFilter>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_agents() {
        Ok(agents) => {
            let view = hierarchy_view(query.apply(agents));
            log::debug!(
                "Hierarchy view: {} roots, {} agents",
                view.roots.len(),
                count_nodes(&view.roots)
            );
            HttpResponse::Ok().json(ApiResponse::ok(view))
        }
        Err(e) => MutationError::from(e).to_response(),
    }
}

/// Pre-order rows with depth, for indented tables.
async fn get_hierarchy_rows(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<AgentFilter>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_agents() {
        Ok(agents) => {
            let roots = build_hierarchy(&query.apply(agents));
            let rows: Vec<serde_json::Value> = flatten(&roots)
                .into_iter()
                .map(|(depth, agent)| serde_json::json!({ "depth": depth, "agent": agent }))
                .collect();
            HttpResponse::Ok().json(ApiResponse::ok(rows))
        }
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn get_parent_candidates(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<ParentCandidatesQuery>,
) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_agents() {
        Ok(agents) => HttpResponse::Ok().json(ApiResponse::ok(parent_candidates(
            &agents,
            query.role,
            query.panchayath_id.trim(),
        ))),
        Err(e) => MutationError::from(e).to_response(),
    }
}

async fn get_audit(state: web::Data<AppState>, req: HttpRequest) -> impl Responder {
    if let Err(resp) = require_admin(&state, &req) {
        return resp;
    }
    match state.db.list_agents() {
        Ok(agents) => {
            let violations = audit(&agents);
            if !violations.is_empty() {
                log::warn!("Hierarchy audit found {} violation(s)", violations.len());
            }
            HttpResponse::Ok().json(ApiResponse::ok(violations))
        }
        Err(e) => MutationError::from(e).to_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::ADMIN_TOKEN_HEADER;
    use crate::controllers::test_support::{admin_token, test_state};
    use crate::controllers::{json_config, query_config};
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value};

    /// Call the app and return the status with the decoded JSON body.
    macro_rules! send {
        ($app:expr, $req:expr $(,)?) => {{
            let resp = test::call_service(&$app, $req.to_request()).await;
            let status = resp.status();
            let body: Value = test::read_body_json(resp).await;
            (status, body)
        }};
    }

    fn create(token: &str, agent: Value) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, token.to_string()))
            .set_json(json!({ "action": "create", "agent": agent }))
    }

    fn get(token: &str, uri: &str) -> test::TestRequest {
        test::TestRequest::get()
            .uri(uri)
            .insert_header((ADMIN_TOKEN_HEADER, token.to_string()))
    }

    #[actix_web::test]
    async fn test_requires_admin_token() {
        let (_dir, state) = test_state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(config)).await;

        let req = test::TestRequest::get().uri("/api/pennyekart-agents");
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "No admin token provided");

        let req = test::TestRequest::post()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, "forged.00"))
            .set_json(json!({ "action": "bulk_create", "agents": [] }));
        let (status, _) = send!(app, req);
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn test_create_list_and_tree() {
        let (_dir, state) = test_state();
        let token = admin_token(&state);
        let p = state.db.create_panchayath("Kondotty", 20).unwrap().id;
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .app_data(query_config())
                .configure(config),
        )
        .await;

        let (status, body) = send!(
            app,
            create(
                &token,
                json!({
                    "id": "tl", "name": "Asma", "mobile": "9000000001",
                    "role": "team_leader", "panchayath_id": p, "customer_count": 50
                }),
            ),
        );
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["customer_count"], 0);
        assert_eq!(body["data"]["parent_agent_id"], Value::Null);
        assert_eq!(body["data"]["ward"], "N/A");
        assert_eq!(body["data"]["created_by"], "root");

        let (status, _) = send!(
            app,
            create(
                &token,
                json!({
                    "id": "co", "name": "Basheer", "mobile": "9000000002",
                    "role": "coordinator", "panchayath_id": p, "ward": "4",
                    "parent_agent_id": "tl", "responsible_wards": ["4", "5"]
                }),
            ),
        );
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = send!(
            app,
            create(
                &token,
                json!({
                    "name": "Copy", "mobile": "9000000002", "role": "coordinator",
                    "panchayath_id": p, "ward": "4", "parent_agent_id": "tl"
                }),
            ),
        );
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Mobile number already exists");

        let (status, body) = send!(app, get(&token, "/api/pennyekart-agents?role=coordinator"));
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 1);
        assert_eq!(body["data"][0]["id"], "co");

        let (_, body) = send!(app, get(&token, "/api/pennyekart-agents/hierarchy"));
        let roots = body["data"]["roots"].as_array().unwrap();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0]["id"], "tl");
        assert_eq!(roots[0]["children"][0]["id"], "co");
        assert_eq!(body["data"]["agents"].as_array().unwrap().len(), 2);

        let (_, body) = send!(app, get(&token, "/api/pennyekart-agents/hierarchy/rows"));
        assert_eq!(body["data"][1]["depth"], 1);
        assert_eq!(body["data"][1]["agent"]["id"], "co");

        let uri = format!(
            "/api/pennyekart-agents/parent-candidates?role=group_leader&panchayath_id={}",
            p
        );
        let (_, body) = send!(app, get(&token, &uri));
        assert_eq!(body["data"][0]["id"], "co");

        let (_, body) = send!(app, get(&token, "/api/pennyekart-agents/audit"));
        assert!(body["data"].as_array().unwrap().is_empty());

        let (status, body) = send!(app, get(&token, "/api/pennyekart-agents?role=boss"));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid query string"));
    }

    #[actix_web::test]
    async fn test_bulk_update_delete() {
        let (_dir, state) = test_state();
        let token = admin_token(&state);
        let p = state.db.create_panchayath("Kondotty", 20).unwrap().id;
        let app = test::init_service(
            App::new()
                .app_data(state.clone())
                .app_data(json_config())
                .configure(config),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(json!({
                "action": "bulk_create",
                "agents": [
                    { "id": "tl", "name": "Asma", "mobile": "9000000001",
                      "role": "team_leader", "panchayath_id": p },
                    { "id": "co", "name": "Basheer", "mobile": "9000000002",
                      "role": "coordinator", "panchayath_id": p, "ward": "2",
                      "parent_agent_id": "tl" }
                ]
            }));
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["count"], 2);

        let req = test::TestRequest::put()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(json!({ "id": "co", "agent": { "ward": "3", "customer_count": 9 } }));
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["ward"], "3");
        assert_eq!(body["data"]["customer_count"], 0);

        let req = test::TestRequest::put()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()))
            .set_json(json!({ "id": "missing", "agent": {} }));
        let (status, _) = send!(app, req);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete()
            .uri("/api/pennyekart-agents?id=tl")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()));
        let (status, body) = send!(app, req);
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], json!({ "id": "tl", "deleted": true }));

        let req = test::TestRequest::delete()
            .uri("/api/pennyekart-agents")
            .insert_header((ADMIN_TOKEN_HEADER, token.clone()));
        let (status, _) = send!(app, req);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        // The coordinator survives its deleted parent and shows up in the audit.
        let (_, body) = send!(app, get(&token, "/api/pennyekart-agents/audit"));
        assert_eq!(body["data"][0]["agent_id"], "co");
        assert_eq!(body["data"][0]["kind"], "missing_parent");
    }
}
