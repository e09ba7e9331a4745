use gbt_auth::User;
use gbt_gameroom::ClientMessage;
use gbt_gameroom::Hub;
use gbt_gameroom::Protocol;
use gbt_gameroom::SessionHandle;
use std::sync::Arc;

/// Pumps one WebSocket against one match until either side hangs up.
///
/// Outbound: frames fanned out by the session land on the hub channel and
/// are written to the socket. Inbound: text frames decode to commands on the
/// session handle. A dropped socket only detaches from the hub; leaving the
/// match itself takes an explicit EXIT_GAME, otherwise the inactivity clock
/// settles it.
pub async fn bridge(
    hub: Arc<Hub>,
    handle: SessionHandle,
    user: User,
    mut session: actix_ws::Session,
    mut stream: actix_ws::MessageStream,
) {
    use futures::StreamExt;
    let id = handle.id();
    let key = user.key();
    let (ticket, mut frames) = hub.attach(id);
    handle.join(user);
    log::debug!("[bridge {}] {} connected", id, key);
    actix_web::rt::spawn(async move {
        'sesh: loop {
            tokio::select! {
                biased;
                frame = frames.recv() => match frame {
                    Some(json) => if session.text(json).await.is_err() { break 'sesh },
                    None => break 'sesh,
                },
                msg = stream.next() => match msg {
                    Some(Ok(actix_ws::Message::Text(text))) => match Protocol::decode(&text) {
                        Ok(ClientMessage::Move { from, to, .. }) => handle.play(key, from, to),
                        Ok(ClientMessage::Exit) => handle.exit(key),
                        Err(e) => log::debug!("[bridge {}] dropped frame: {}", id, e),
                    },
                    Some(Ok(actix_ws::Message::Close(_))) => break 'sesh,
                    Some(Err(_)) => break 'sesh,
                    None => break 'sesh,
                    _ => continue 'sesh,
                },
            }
        }
        hub.detach(id, ticket);
        log::debug!("[bridge {}] {} disconnected", id, key);
    });
}
