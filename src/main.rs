use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;
use std::io;
use std::sync::Arc;

use marketboard::auth::session;
use marketboard::config::Config;
use marketboard::db;
use marketboard::repository::{RepositoryState, SqliteRepository};
use marketboard::routes;

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env().map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let pool = db::connect(&config.database_url).await.map_err(|e| {
        log::error!("Failed to open database {}: {}", config.database_url, e);
        io::Error::new(io::ErrorKind::Other, e)
    })?;
    let repo: RepositoryState = Arc::new(SqliteRepository::new(pool));
    let key = config.session_key();
    let auth = config.auth.clone();

    log::info!("Starting Marketboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::from(repo.clone()))
            .app_data(web::Data::new(auth.clone()))
            .wrap(session::middleware(key.clone(), &auth))
            .wrap(Logger::default())
            .configure(routes::config)
            .default_service(web::to(routes::not_found))
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
