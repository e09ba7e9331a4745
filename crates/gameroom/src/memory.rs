use super::Game;
use super::GameRow;
use super::MatchStore;
use super::MoveRecord;
use super::Outcome;
use super::RatingUpdate;
use super::Status;
use super::StoreError;
use gbt_core::ID;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;

#[derive(Debug, Clone)]
struct StoredMatch {
    row: GameRow,
    moves: Vec<MoveRecord>,
}

/// In-memory [`MatchStore`].
///
/// Mirrors the Postgres implementation's contract closely enough for session
/// tests: appends are atomic, finalize stamps the row, rating updates are
/// recorded. [`Self::fail_next_append`] injects a one-shot storage failure.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    poison: AtomicBool,
}

#[derive(Default)]
struct Inner {
    games: HashMap<uuid::Uuid, StoredMatch>,
    ratings: Vec<(RatingUpdate, RatingUpdate)>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next `append` fail with [`StoreError::Unavailable`].
    pub fn fail_next_append(&self) {
        self.poison.store(true, Ordering::SeqCst);
    }

    /// Snapshot of a stored match row.
    pub fn snapshot(&self, id: ID<Game>) -> Option<GameRow> {
        self.inner
            .lock()
            .expect("store lock")
            .games
            .get(&id.inner())
            .map(|m| m.row.clone())
    }

    /// Every rating update pair recorded so far.
    pub fn rating_events(&self) -> Vec<(RatingUpdate, RatingUpdate)> {
        self.inner.lock().expect("store lock").ratings.clone()
    }

    /// Number of moves stored for a match.
    pub fn stored_moves(&self, id: ID<Game>) -> usize {
        self.inner
            .lock()
            .expect("store lock")
            .games
            .get(&id.inner())
            .map(|m| m.moves.len())
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl MatchStore for MemoryStore {
    async fn create(&self, game: &Game) -> Result<(), StoreError> {
        let black = game
            .black()
            .ok_or_else(|| StoreError::Corrupt("match created without opponent".into()))?;
        let row = GameRow {
            id: game.id(),
            white: game.white().key(),
            black: black.key(),
            status: game.status(),
            position: game.position().clone(),
            started: game.started(),
            last_move: game.started(),
        };
        self.inner
            .lock()
            .expect("store lock")
            .games
            .insert(game.id().inner(), StoredMatch { row, moves: vec![] });
        Ok(())
    }

    async fn append(&self, id: ID<Game>, record: &MoveRecord) -> Result<(), StoreError> {
        if self.poison.swap(false, Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected failure".into()));
        }
        let mut inner = self.inner.lock().expect("store lock");
        let stored = inner
            .games
            .get_mut(&id.inner())
            .ok_or_else(|| StoreError::Corrupt(format!("no such match {}", id)))?;
        stored.moves.push(record.clone());
        stored.row.position = record.after.clone();
        stored.row.last_move = record.at;
        Ok(())
    }

    async fn finalize(
        &self,
        id: ID<Game>,
        status: Status,
        _outcome: Outcome,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("store lock");
        let stored = inner
            .games
            .get_mut(&id.inner())
            .ok_or_else(|| StoreError::Corrupt(format!("no such match {}", id)))?;
        stored.row.status = status;
        Ok(())
    }

    async fn record_ratings(
        &self,
        white: &RatingUpdate,
        black: &RatingUpdate,
    ) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("store lock")
            .ratings
            .push((*white, *black));
        Ok(())
    }

    async fn fetch(&self, id: ID<Game>) -> Result<Option<GameRow>, StoreError> {
        Ok(self.snapshot(id))
    }

    async fn history(&self, id: ID<Game>) -> Result<Vec<MoveRecord>, StoreError> {
        Ok(self
            .inner
            .lock()
            .expect("store lock")
            .games
            .get(&id.inner())
            .map(|m| m.moves.clone())
            .unwrap_or_default())
    }
}
