//! Unified backend server.
//!
//! Combines account routes and live match hosting into a single actix-web
//! server. Schema bootstrap runs before the listener comes up, so every
//! table the handlers touch exists by the time the first request lands.
//!
//! ## Submodules
//!
//! - [`matches`] — Match creation and WebSocket entry

pub mod matches;

use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::middleware::Logger;
use actix_web::web;
use gbt_hosting::Lobby;
use std::sync::Arc;
use tokio_postgres::Client;

async fn health(client: web::Data<Arc<Client>>) -> impl Responder {
    match client
        .execute("SELECT 1", &[])
        .await
        .inspect_err(|e| log::error!("health check failed: {}", e))
    {
        Ok(_) => HttpResponse::Ok().body("ok"),
        Err(_) => HttpResponse::ServiceUnavailable().body("database unavailable"),
    }
}

async fn schema(client: &Client) -> Result<(), gbt_pg::PgErr> {
    gbt_pg::ensure::<gbt_auth::Member>(client).await?;
    gbt_pg::ensure::<gbt_auth::Session>(client).await?;
    gbt_pg::ensure::<gbt_gameroom::Game>(client).await?;
    gbt_pg::ensure::<gbt_gameroom::MoveRecord>(client).await?;
    Ok(())
}

#[rustfmt::skip]
pub async fn run() -> Result<(), std::io::Error> {
    let client = gbt_pg::db().await;
    schema(&client)
        .await
        .map_err(|e| std::io::Error::other(format!("schema bootstrap failed: {}", e)))?;
    let crypto = web::Data::new(gbt_auth::Crypto::from_env());
    let hub = Arc::new(gbt_gameroom::Hub::new());
    let store: Arc<dyn gbt_gameroom::MatchStore> = Arc::new(client.clone());
    let lobby = web::Data::new(Arc::new(Lobby::new(store, hub, client.clone())));
    let client = web::Data::new(client);
    log::info!("starting match server");
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%r %s %Ts"))
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .app_data(lobby.clone())
            .app_data(crypto.clone())
            .app_data(client.clone())
            .route("/health", web::get().to(health))
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(gbt_auth::register))
                    .route("/logout", web::post().to(gbt_auth::logout))
                    .route("/login", web::post().to(gbt_auth::login))
                    .route("/me", web::get().to(gbt_auth::me)),
            )
            .service(
                web::scope("/games")
                    .route("", web::post().to(matches::create))
                    .route("/{game_id}/ws", web::get().to(matches::connect)),
            )
    })
    .workers(6)
    .bind(std::env::var("BIND_ADDR").expect("BIND_ADDR must be set"))?
    .run()
    .await
}
