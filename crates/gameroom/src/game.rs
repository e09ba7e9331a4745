use super::MoveRecord;
use gbt_auth::User;
use gbt_core::ID;
use gbt_core::Millis;
use gbt_core::Seq;
use gbt_core::Unique;
use gbt_rules::Position;
use gbt_rules::Side;
use serde::Deserialize;
use serde::Serialize;
use std::time::SystemTime;

/// Lifecycle state of a match. The last four states are terminal; no
/// transition is defined out of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    AwaitingOpponent,
    InProgress,
    Completed,
    Abandoned,
    TimedOut,
    PlayerExited,
}

impl Status {
    pub fn terminal(self) -> bool {
        !matches!(self, Self::AwaitingOpponent | Self::InProgress)
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingOpponent => "AWAITING_OPPONENT",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Abandoned => "ABANDONED",
            Self::TimedOut => "TIMED_OUT",
            Self::PlayerExited => "PLAYER_EXITED",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "AWAITING_OPPONENT" => Some(Self::AwaitingOpponent),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "ABANDONED" => Some(Self::Abandoned),
            "TIMED_OUT" => Some(Self::TimedOut),
            "PLAYER_EXITED" => Some(Self::PlayerExited),
            _ => None,
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Final result of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    WhiteWins,
    BlackWins,
    Draw,
}

impl Outcome {
    /// The outcome awarding the win to `side`.
    pub fn win_for(side: Side) -> Self {
        match side {
            Side::White => Self::WhiteWins,
            Side::Black => Self::BlackWins,
        }
    }
    /// Rating score for `side`: 1 win, 0 loss, ½ draw.
    pub fn score(self, side: Side) -> f64 {
        match (self, side) {
            (Self::WhiteWins, Side::White) | (Self::BlackWins, Side::Black) => 1.0,
            (Self::Draw, _) => 0.5,
            _ => 0.0,
        }
    }
    pub fn as_str(self) -> &'static str {
        match self {
            Self::WhiteWins => "WHITE_WINS",
            Self::BlackWins => "BLACK_WINS",
            Self::Draw => "DRAW",
        }
    }
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WHITE_WINS" => Some(Self::WhiteWins),
            "BLACK_WINS" => Some(Self::BlackWins),
            "DRAW" => Some(Self::Draw),
            _ => None,
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// In-memory state of one match.
///
/// Created fresh when a session is opened, or rebuilt from persisted move
/// history on rehydration. Mutated only by the owning [`super::Session`].
#[derive(Debug, Clone)]
pub struct Game {
    id: ID<Game>,
    white: User,
    black: Option<User>,
    status: Status,
    position: Position,
    turn: Side,
    consumed: [Millis; 2],
    moves: Vec<MoveRecord>,
    started: SystemTime,
    outcome: Option<Outcome>,
}

impl Game {
    /// Fresh match with the creator seated as White.
    pub fn open(id: ID<Game>, white: User) -> Self {
        Self {
            id,
            white,
            black: None,
            status: Status::AwaitingOpponent,
            position: Position::default(),
            turn: Side::White,
            consumed: [0, 0],
            moves: Vec::new(),
            started: SystemTime::now(),
            outcome: None,
        }
    }

    pub fn id(&self) -> ID<Game> {
        self.id
    }
    pub fn white(&self) -> &User {
        &self.white
    }
    pub fn black(&self) -> Option<&User> {
        self.black.as_ref()
    }
    pub fn status(&self) -> Status {
        self.status
    }
    pub fn position(&self) -> &Position {
        &self.position
    }
    pub fn turn(&self) -> Side {
        self.turn
    }
    pub fn moves(&self) -> &[MoveRecord] {
        &self.moves
    }
    pub fn started(&self) -> SystemTime {
        self.started
    }
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }
    pub fn over(&self) -> bool {
        self.status.terminal()
    }
    pub fn consumed(&self, side: Side) -> Millis {
        self.consumed[side.index()]
    }
    /// Next move's sequence number.
    pub fn next_seq(&self) -> Seq {
        self.moves.len() as Seq + 1
    }
    /// The user seated on `side`, if bound.
    pub fn seat(&self, side: Side) -> Option<&User> {
        match side {
            Side::White => Some(&self.white),
            Side::Black => self.black.as_ref(),
        }
    }
    /// Which side `key` plays, if a participant.
    pub fn side_of(&self, key: uuid::Uuid) -> Option<Side> {
        if self.white.key() == key {
            Some(Side::White)
        } else if self.black.as_ref().map(User::key) == Some(key) {
            Some(Side::Black)
        } else {
            None
        }
    }

    /// Seats the second player and starts play.
    pub fn begin(&mut self, black: User) {
        debug_assert!(self.black.is_none());
        self.black = Some(black);
        self.status = Status::InProgress;
        self.started = SystemTime::now();
    }

    /// Applies an accepted move: records it, advances the snapshot, charges
    /// the mover's clock, flips the turn.
    pub fn advance(&mut self, record: MoveRecord) {
        self.consumed[self.turn.index()] += record.elapsed;
        self.position = record.after.clone();
        self.moves.push(record);
        self.turn = self.turn.flip();
    }

    /// Records the terminal state. Caller guards against double entry.
    pub fn close(&mut self, status: Status, outcome: Outcome) {
        debug_assert!(status.terminal());
        self.status = status;
        self.outcome = Some(outcome);
    }

    /// Rebuilds a match from persisted state. The position, turn, clock
    /// usage, and sequence numbering all derive from the replayed history.
    pub fn rehydrate(
        id: ID<Game>,
        white: User,
        black: Option<User>,
        status: Status,
        started: SystemTime,
        moves: Vec<MoveRecord>,
    ) -> Self {
        let mut consumed = [0, 0];
        for (i, record) in moves.iter().enumerate() {
            consumed[i % 2] += record.elapsed;
        }
        let position = moves
            .last()
            .map(|m| m.after.clone())
            .unwrap_or_default();
        let turn = match moves.len() % 2 {
            0 => Side::White,
            _ => Side::Black,
        };
        Self {
            id,
            white,
            black,
            status,
            position,
            turn,
            consumed,
            moves,
            started,
            outcome: None,
        }
    }
}

impl Unique for Game {
    fn id(&self) -> ID<Game> {
        self.id
    }
}

mod schema {
    use super::*;
    use gbt_pg::*;

    impl Schema for Game {
        fn name() -> &'static str {
            MATCHES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                MATCHES,
                " (
                    id           UUID PRIMARY KEY,
                    white_id     UUID NOT NULL,
                    black_id     UUID NOT NULL,
                    status       TEXT NOT NULL,
                    result       TEXT,
                    position     TEXT NOT NULL,
                    started_at   TIMESTAMPTZ NOT NULL,
                    last_move_at TIMESTAMPTZ NOT NULL
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_matches_status ON ",
                MATCHES,
                " (status);"
            )
        }
    }
}
