use super::Crypto;
use super::Lurker;
use super::Member;
use super::ProfileRepository;
use gbt_core::ID;
use gbt_core::Rating;
use gbt_core::Unique;

/// Identity of a connected participant: a verified member or a minted guest.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum User {
    Auth(Member),
    Anon(Lurker),
}

impl User {
    /// Underlying uuid, uniform across both variants. Used to match a
    /// command sender against the sides of a game.
    pub fn key(&self) -> uuid::Uuid {
        match self {
            Self::Auth(m) => m.id().inner(),
            Self::Anon(l) => l.id().inner(),
        }
    }
    /// Member id when authenticated.
    pub fn member(&self) -> Option<ID<Member>> {
        match self {
            Self::Auth(m) => Some(m.id()),
            Self::Anon(_) => None,
        }
    }
    pub fn name(&self) -> &str {
        match self {
            Self::Auth(m) => m.username(),
            Self::Anon(l) => l.handle(),
        }
    }
    pub fn rating(&self) -> Rating {
        match self {
            Self::Auth(m) => m.rating(),
            Self::Anon(l) => l.rating(),
        }
    }
    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Anon(_))
    }
}

impl From<Lurker> for User {
    fn from(lurker: Lurker) -> Self {
        Self::Anon(lurker)
    }
}

impl From<Member> for User {
    fn from(member: Member) -> Self {
        Self::Auth(member)
    }
}

/// Resolves a presented credential to an identity. Never fails: an absent,
/// expired, or otherwise unverifiable token falls back to a fresh guest.
pub async fn resolve<R>(crypto: &Crypto, profiles: &R, token: Option<&str>) -> User
where
    R: ProfileRepository,
{
    let member = match token {
        Some(token) => match crypto.decode(token) {
            Ok(claims) if !claims.expired() => match profiles.profile(claims.user()).await {
                Ok(found) => found,
                Err(e) => {
                    log::warn!("profile lookup failed for {}: {}", claims.user(), e);
                    None
                }
            },
            Ok(_) => None,
            Err(_) => None,
        },
        None => None,
    };
    match member {
        Some(member) => {
            log::debug!("resolved member {}", member.username());
            User::Auth(member)
        }
        None => {
            let lurker = Lurker::mint();
            log::debug!("minted guest {}", lurker.handle());
            User::Anon(lurker)
        }
    }
}
