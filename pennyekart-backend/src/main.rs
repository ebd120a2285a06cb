use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use chrono::Utc;
use dotenv::dotenv;
use std::sync::Arc;
use std::time::Duration;

mod agents;
mod auth;
mod config;
mod controllers;
mod db;
mod models;

use auth::TokenSigner;
use config::Config;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub config: Config,
    pub signer: Arc<TokenSigner>,
}

/// Upsert the admin named by ADMIN_USERNAME / ADMIN_PASSWORD.
fn bootstrap_admin(db: &Database, config: &Config) -> Result<(), String> {
    let Some((username, password)) = &config.bootstrap_admin else {
        log::info!("No bootstrap admin configured");
        return Ok(());
    };
    let hash = auth::password::hash_password(password)?;
    db.upsert_admin(username, &hash)
        .map_err(|e| format!("Failed to store bootstrap admin: {}", e))?;
    log::info!("Bootstrap admin '{}' is ready", username);
    Ok(())
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            log::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Database::new(&config.database_url, config.db_pool_size)
        .expect("Failed to initialize database");
    let db = Arc::new(db);

    if let Err(e) = bootstrap_admin(&db, &config) {
        log::error!("{}", e);
        std::process::exit(1);
    }

    // Purge expired admin sessions now and then periodically
    let purge_db = db.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(
            config::defaults::SESSION_PURGE_INTERVAL_SECS,
        ));
        loop {
            interval.tick().await;
            match purge_db.purge_expired_admin_sessions(Utc::now()) {
                Ok(0) => {}
                Ok(n) => log::info!("Purged {} expired admin session(s)", n),
                Err(e) => log::error!("Failed to purge admin sessions: {}", e),
            }
        }
    });

    let signer = Arc::new(TokenSigner::new(config.admin_token_secret.clone()));

    if config.strict_hierarchy {
        log::info!("Strict hierarchy enforcement enabled");
    } else {
        log::warn!("Strict hierarchy enforcement disabled - only field validation runs on mutations");
    }
    log::info!("Starting Pennyekart agents server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                config: config.clone(),
                signer: Arc::clone(&signer),
            }))
            .app_data(controllers::json_config())
            .app_data(controllers::query_config())
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::admin::config)
            .configure(controllers::agents::config)
            .configure(controllers::panchayaths::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
