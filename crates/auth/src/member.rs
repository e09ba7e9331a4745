use gbt_core::ID;
use gbt_core::Rating;
use gbt_core::Unique;

/// Registered user with verified identity and a persisted match record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Member {
    id: ID<Self>,
    username: String,
    rating: Rating,
    wins: i32,
    losses: i32,
    draws: i32,
}

impl Member {
    pub fn new(id: ID<Self>, username: String, rating: Rating) -> Self {
        Self {
            id,
            username,
            rating,
            wins: 0,
            losses: 0,
            draws: 0,
        }
    }
    pub fn with_record(mut self, wins: i32, losses: i32, draws: i32) -> Self {
        self.wins = wins;
        self.losses = losses;
        self.draws = draws;
        self
    }
    pub fn username(&self) -> &str {
        &self.username
    }
    pub fn rating(&self) -> Rating {
        self.rating
    }
    pub fn wins(&self) -> i32 {
        self.wins
    }
    pub fn losses(&self) -> i32 {
        self.losses
    }
    pub fn draws(&self) -> i32 {
        self.draws
    }
}

impl Unique for Member {
    fn id(&self) -> ID<Self> {
        self.id
    }
}

mod schema {
    use super::*;
    use gbt_pg::*;

    /// Schema for the users table.
    /// Note: email and hashword are database-only fields, not part of the
    /// Member domain type.
    impl Schema for Member {
        fn name() -> &'static str {
            USERS
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                USERS,
                " (
                    id          UUID PRIMARY KEY,
                    username    VARCHAR(32) UNIQUE NOT NULL,
                    email       VARCHAR(255) UNIQUE NOT NULL,
                    hashword    TEXT NOT NULL,
                    rating      INTEGER NOT NULL DEFAULT ",
                gbt_core::DEFAULT_RATING,
                ",
                    wins        INTEGER NOT NULL DEFAULT 0,
                    losses      INTEGER NOT NULL DEFAULT 0,
                    draws       INTEGER NOT NULL DEFAULT 0
                );"
            )
        }
        fn indices() -> &'static str {
            const_format::concatcp!(
                "CREATE INDEX IF NOT EXISTS idx_users_username ON ",
                USERS,
                " (username);"
            )
        }
    }
}
