use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::Responder;
use actix_web::web;
use gbt_auth::Crypto;
use gbt_core::ID;
use gbt_gameroom::Game;
use gbt_hosting::Lobby;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_postgres::Client;

type Host = web::Data<Arc<Lobby<Arc<Client>>>>;

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Opens a match with the caller seated as White. An invalid or missing
/// credential still succeeds; the creator just plays as a guest.
pub async fn create(
    lobby: Host,
    tokens: web::Data<Crypto>,
    db: web::Data<Arc<Client>>,
    req: HttpRequest,
) -> impl Responder {
    let creator = gbt_auth::resolve(tokens.get_ref(), db.get_ref(), bearer(&req)).await;
    let id = lobby.create(creator).await;
    HttpResponse::Ok().json(serde_json::json!({ "game_id": id.to_string() }))
}

/// WebSocket entry point. Resolves the `?token=` credential, finds or
/// rehydrates the match, and bridges the socket into its session.
pub async fn connect(
    lobby: Host,
    tokens: web::Data<Crypto>,
    db: web::Data<Arc<Client>>,
    path: web::Path<uuid::Uuid>,
    query: web::Query<HashMap<String, String>>,
    body: web::Payload,
    req: HttpRequest,
) -> impl Responder {
    let id: ID<Game> = ID::from(path.into_inner());
    let token = query.get("token").map(String::as_str);
    let user = gbt_auth::resolve(tokens.get_ref(), db.get_ref(), token).await;
    let handle = match lobby.attach(id).await {
        Ok(handle) => handle,
        Err(e) => return HttpResponse::NotFound().body(e.to_string()).map_into_right_body(),
    };
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            gbt_hosting::bridge(lobby.hub(), handle, user, session, stream).await;
            response.map_into_left_body()
        }
        Err(e) => HttpResponse::InternalServerError()
            .body(e.to_string())
            .map_into_right_body(),
    }
}
