use super::Member;
use super::Session;
use gbt_core::ID;
use gbt_core::Rating;
use gbt_core::Unique;
use gbt_pg::*;
use std::sync::Arc;
use tokio_postgres::Client;

/// Repository trait for account and login-session operations.
/// Abstracts SQL from domain modules.
#[allow(async_fn_in_trait)]
pub trait AuthRepository {
    async fn signin(&self, session: &Session) -> Result<(), PgErr>;
    async fn revoke(&self, session: ID<Session>) -> Result<(), PgErr>;
    async fn exists(&self, username: &str, email: &str) -> Result<bool, PgErr>;
    async fn create(&self, member: &Member, email: &str, hashword: &str) -> Result<(), PgErr>;
    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, PgErr>;
}

/// Read access to member profiles, used by identity resolution.
#[allow(async_fn_in_trait)]
pub trait ProfileRepository {
    async fn profile(&self, id: ID<Member>) -> Result<Option<Member>, PgErr>;
}

impl AuthRepository for Arc<Client> {
    async fn exists(&self, username: &str, email: &str) -> Result<bool, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT 1 FROM ",
                USERS,
                " WHERE username = $1 OR email = $2"
            ),
            &[&username, &email],
        )
        .await
        .map(|opt| opt.is_some())
    }

    async fn create(&self, member: &Member, email: &str, hashword: &str) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                USERS,
                " (id, username, email, hashword, rating) VALUES ($1, $2, $3, $4, $5)"
            ),
            &[
                &member.id().inner(),
                &member.username(),
                &email,
                &hashword,
                &member.rating(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn lookup(&self, username: &str) -> Result<Option<(Member, String)>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, username, rating, wins, losses, draws, hashword FROM ",
                USERS,
                " WHERE username = $1"
            ),
            &[&username],
        )
        .await
        .map(|opt| {
            opt.map(|row| {
                let member = Member::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    row.get::<_, String>(1),
                    row.get::<_, Rating>(2),
                )
                .with_record(row.get(3), row.get(4), row.get(5));
                (member, row.get::<_, String>(6))
            })
        })
    }

    async fn signin(&self, session: &Session) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!(
                "INSERT INTO ",
                SESSIONS,
                " (id, user_id, token_hash, expires_at) VALUES ($1, $2, $3, $4)"
            ),
            &[
                &session.id().inner(),
                &session.user().inner(),
                &session.hash(),
                &session.expires_at(),
            ],
        )
        .await
        .map(|_| ())
    }

    async fn revoke(&self, session: ID<Session>) -> Result<(), PgErr> {
        self.execute(
            const_format::concatcp!("UPDATE ", SESSIONS, " SET revoked = TRUE WHERE id = $1"),
            &[&session.inner()],
        )
        .await
        .map(|_| ())
    }
}

impl ProfileRepository for Arc<Client> {
    async fn profile(&self, id: ID<Member>) -> Result<Option<Member>, PgErr> {
        self.query_opt(
            const_format::concatcp!(
                "SELECT id, username, rating, wins, losses, draws FROM ",
                USERS,
                " WHERE id = $1"
            ),
            &[&id.inner()],
        )
        .await
        .map(|opt| {
            opt.map(|row| {
                Member::new(
                    ID::from(row.get::<_, uuid::Uuid>(0)),
                    row.get::<_, String>(1),
                    row.get::<_, Rating>(2),
                )
                .with_record(row.get(3), row.get(4), row.get(5))
            })
        })
    }
}
