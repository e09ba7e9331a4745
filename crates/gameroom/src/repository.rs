use super::Game;
use super::MoveRecord;
use super::Outcome;
use super::RatingUpdate;
use super::Status;
use crate::Credit;
use gbt_core::ID;
use gbt_pg::MATCHES;
use gbt_pg::MOVES;
use gbt_pg::PgErr;
use gbt_pg::USERS;
use gbt_rules::Position;
use std::sync::Arc;
use std::time::SystemTime;
use tokio_postgres::Client;

/// Persistence failure surfaced to the session.
#[derive(Debug)]
pub enum StoreError {
    Db(PgErr),
    /// Stored state that cannot be interpreted, e.g. an unknown status tag.
    Corrupt(String),
    Unavailable(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(e) => write!(f, "database error: {}", e),
            Self::Corrupt(s) => write!(f, "corrupt stored state: {}", s),
            Self::Unavailable(s) => write!(f, "store unavailable: {}", s),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<PgErr> for StoreError {
    fn from(e: PgErr) -> Self {
        Self::Db(e)
    }
}

/// A match as loaded from storage, before rehydration into a [`Game`].
#[derive(Debug, Clone)]
pub struct GameRow {
    pub id: ID<Game>,
    pub white: uuid::Uuid,
    pub black: uuid::Uuid,
    pub status: Status,
    pub position: Position,
    pub started: SystemTime,
    pub last_move: SystemTime,
}

/// Durable storage contract for matches, moves, and rating credits.
///
/// Sessions hold this behind `Arc<dyn MatchStore>`; production wires in
/// Postgres via `Arc<Client>`, tests wire in [`super::MemoryStore`].
#[async_trait::async_trait]
pub trait MatchStore: Send + Sync {
    /// Inserts the match row. Called once, when the second player is seated.
    async fn create(&self, game: &Game) -> Result<(), StoreError>;
    /// Appends one move and advances the match snapshot atomically; either
    /// both land or neither does.
    async fn append(&self, id: ID<Game>, record: &MoveRecord) -> Result<(), StoreError>;
    /// Stamps the terminal status and result onto the match row.
    async fn finalize(&self, id: ID<Game>, status: Status, outcome: Outcome)
    -> Result<(), StoreError>;
    /// Applies both participants' rating updates.
    async fn record_ratings(
        &self,
        white: &RatingUpdate,
        black: &RatingUpdate,
    ) -> Result<(), StoreError>;
    /// Loads a match row, if it exists.
    async fn fetch(&self, id: ID<Game>) -> Result<Option<GameRow>, StoreError>;
    /// Loads the full move history in sequence order.
    async fn history(&self, id: ID<Game>) -> Result<Vec<MoveRecord>, StoreError>;
}

#[async_trait::async_trait]
impl MatchStore for Arc<Client> {
    async fn create(&self, game: &Game) -> Result<(), StoreError> {
        const SQL: &str = const_format::concatcp!(
            "INSERT INTO ",
            MATCHES,
            " (id, white_id, black_id, status, position, started_at, last_move_at)
             VALUES ($1, $2, $3, $4, $5, $6, $6)"
        );
        let black = game
            .black()
            .ok_or_else(|| StoreError::Corrupt("match created without opponent".into()))?;
        self.execute(
            SQL,
            &[
                &game.id().inner(),
                &game.white().key(),
                &black.key(),
                &game.status().as_str(),
                &game.position().as_str(),
                &game.started(),
            ],
        )
        .await?;
        Ok(())
    }

    async fn append(&self, id: ID<Game>, record: &MoveRecord) -> Result<(), StoreError> {
        // single statement: the move insert and the snapshot update commit
        // together or not at all
        const SQL: &str = const_format::concatcp!(
            "WITH mv AS (
                INSERT INTO ",
            MOVES,
            " (match_id, seq, square_from, square_to, notation, before, after, elapsed_ms, created_at)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             )
             UPDATE ",
            MATCHES,
            " SET position = $7, last_move_at = $9 WHERE id = $1"
        );
        self.execute(
            SQL,
            &[
                &id.inner(),
                &record.seq,
                &record.from,
                &record.to,
                &record.notation,
                &record.before.as_str(),
                &record.after.as_str(),
                &record.elapsed,
                &record.at,
            ],
        )
        .await?;
        Ok(())
    }

    async fn finalize(
        &self,
        id: ID<Game>,
        status: Status,
        outcome: Outcome,
    ) -> Result<(), StoreError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            MATCHES,
            " SET status = $2, result = $3 WHERE id = $1"
        );
        self.execute(SQL, &[&id.inner(), &status.as_str(), &outcome.as_str()])
            .await?;
        Ok(())
    }

    async fn record_ratings(
        &self,
        white: &RatingUpdate,
        black: &RatingUpdate,
    ) -> Result<(), StoreError> {
        const SQL: &str = const_format::concatcp!(
            "UPDATE ",
            USERS,
            " SET rating = $2,
                  wins   = wins   + $3,
                  losses = losses + $4,
                  draws  = draws  + $5
              WHERE id = $1"
        );
        for update in [white, black] {
            let (w, l, d) = match update.credit {
                Credit::Win => (1i32, 0i32, 0i32),
                Credit::Loss => (0, 1, 0),
                Credit::Draw => (0, 0, 1),
            };
            self.execute(
                SQL,
                &[&update.user.inner(), &update.rating, &w, &l, &d],
            )
            .await?;
        }
        Ok(())
    }

    async fn fetch(&self, id: ID<Game>) -> Result<Option<GameRow>, StoreError> {
        const SQL: &str = const_format::concatcp!(
            "SELECT white_id, black_id, status, position, started_at, last_move_at FROM ",
            MATCHES,
            " WHERE id = $1"
        );
        let Some(row) = self.query_opt(SQL, &[&id.inner()]).await? else {
            return Ok(None);
        };
        let tag: String = row.get(2);
        let status = Status::parse(&tag)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown status {}", tag)))?;
        Ok(Some(GameRow {
            id,
            white: row.get(0),
            black: row.get(1),
            status,
            position: Position::new(row.get::<_, String>(3)),
            started: row.get(4),
            last_move: row.get(5),
        }))
    }

    async fn history(&self, id: ID<Game>) -> Result<Vec<MoveRecord>, StoreError> {
        const SQL: &str = const_format::concatcp!(
            "SELECT seq, square_from, square_to, notation, before, after, elapsed_ms, created_at FROM ",
            MOVES,
            " WHERE match_id = $1 ORDER BY seq"
        );
        let rows = self.query(SQL, &[&id.inner()]).await?;
        Ok(rows
            .into_iter()
            .map(|row| MoveRecord {
                seq: row.get(0),
                from: row.get(1),
                to: row.get(2),
                notation: row.get(3),
                before: Position::new(row.get::<_, String>(4)),
                after: Position::new(row.get::<_, String>(5)),
                elapsed: row.get(6),
                at: row.get(7),
            })
            .collect())
    }
}
