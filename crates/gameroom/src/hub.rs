use super::Game;
use super::ServerMessage;
use gbt_core::ID;
use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;

/// Fan-out registry of live connections, keyed by match.
///
/// Connections register a channel on attach and are pruned lazily: a send
/// failure means the receiving half is gone, so the entry is dropped on the
/// next broadcast. Messages are serialized once per broadcast, not per
/// subscriber.
#[derive(Default)]
pub struct Hub {
    next: AtomicU64,
    rooms: RwLock<HashMap<ID<Game>, HashMap<u64, UnboundedSender<String>>>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a connection on `game` and returns its ticket plus the
    /// receiving half to drain frames from.
    pub fn attach(&self, game: ID<Game>) -> (u64, UnboundedReceiver<String>) {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let ticket = self.next.fetch_add(1, Ordering::Relaxed);
        self.rooms
            .write()
            .expect("hub lock")
            .entry(game)
            .or_default()
            .insert(ticket, tx);
        (ticket, rx)
    }

    /// Removes one connection. The room itself is dropped once empty.
    pub fn detach(&self, game: ID<Game>, ticket: u64) {
        let mut rooms = self.rooms.write().expect("hub lock");
        if let Some(room) = rooms.get_mut(&game) {
            room.remove(&ticket);
            if room.is_empty() {
                rooms.remove(&game);
            }
        }
    }

    /// Sends `message` to every connection on `game`, pruning dead ones.
    pub fn broadcast(&self, game: ID<Game>, message: &ServerMessage) {
        let frame = message.to_json();
        let mut rooms = self.rooms.write().expect("hub lock");
        let Some(room) = rooms.get_mut(&game) else {
            log::debug!("[game {}] broadcast {} to empty room", game, message.kind());
            return;
        };
        room.retain(|_, tx| tx.send(frame.clone()).is_ok());
        log::debug!(
            "[game {}] broadcast {} to {} connection(s)",
            game,
            message.kind(),
            room.len()
        );
    }

    /// Number of live connections on `game`.
    pub fn audience(&self, game: ID<Game>) -> usize {
        self.rooms
            .read()
            .expect("hub lock")
            .get(&game)
            .map(HashMap::len)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Outcome;
    use crate::Status;
    use gbt_auth::Lurker;
    use gbt_auth::User;

    fn fixture() -> (Game, ServerMessage) {
        let mut game = Game::open(ID::default(), User::from(Lurker::mint()));
        game.begin(User::from(Lurker::mint()));
        game.close(Status::Completed, Outcome::Draw);
        let message = ServerMessage::ended(&game, Outcome::Draw).unwrap();
        (game, message)
    }

    #[tokio::test]
    async fn broadcast_reaches_all_attached() {
        let hub = Hub::new();
        let (game, message) = fixture();
        let (_, mut a) = hub.attach(game.id());
        let (_, mut b) = hub.attach(game.id());
        hub.broadcast(game.id(), &message);
        assert_eq!(a.recv().await.unwrap(), message.to_json());
        assert_eq!(b.recv().await.unwrap(), message.to_json());
    }

    #[tokio::test]
    async fn detach_stops_delivery() {
        let hub = Hub::new();
        let (game, message) = fixture();
        let (ticket, mut rx) = hub.attach(game.id());
        hub.detach(game.id(), ticket);
        hub.broadcast(game.id(), &message);
        assert!(rx.recv().await.is_none());
        assert_eq!(hub.audience(game.id()), 0);
    }

    #[tokio::test]
    async fn dead_connections_are_pruned() {
        let hub = Hub::new();
        let (game, message) = fixture();
        let (_, rx) = hub.attach(game.id());
        drop(rx);
        hub.broadcast(game.id(), &message);
        assert_eq!(hub.audience(game.id()), 0);
    }

    #[test]
    fn rooms_are_isolated() {
        let hub = Hub::new();
        let a: ID<Game> = ID::default();
        let b: ID<Game> = ID::default();
        let _keep = hub.attach(a);
        assert_eq!(hub.audience(a), 1);
        assert_eq!(hub.audience(b), 0);
    }
}
