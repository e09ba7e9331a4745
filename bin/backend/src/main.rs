//! Unified Match Server Binary
//!
//! Account routes plus live WebSocket match hosting in a single server.
//! Runs on BIND_ADDR (e.g. 0.0.0.0:8888).

#[tokio::main]
async fn main() {
    gbt_core::log();
    gbt_core::kys();
    gbt_server::run().await.unwrap();
}
