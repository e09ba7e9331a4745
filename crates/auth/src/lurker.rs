use gbt_core::ID;
use gbt_core::Rating;
use gbt_core::Unique;

/// Guest identity minted when no valid credential is presented.
/// Lives only in memory; guests never touch the users table and are
/// excluded from rating updates.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Lurker {
    id: ID<Lurker>,
    handle: String,
    rating: Rating,
}

impl Lurker {
    /// Mints a fresh guest with a short random handle.
    pub fn mint() -> Self {
        use rand::Rng;
        let tag: u16 = rand::rng().random();
        Self {
            id: ID::default(),
            handle: format!("guest-{:04x}", tag),
            rating: gbt_core::DEFAULT_RATING,
        }
    }
    /// Rebuilds the guest seated under `id` in a stored match. The original
    /// handle is gone with the process that minted it, so one is derived
    /// from the id instead.
    pub fn revive(id: uuid::Uuid) -> Self {
        Self {
            handle: format!("guest-{}", &id.simple().to_string()[..4]),
            id: ID::from(id),
            rating: gbt_core::DEFAULT_RATING,
        }
    }
    pub fn handle(&self) -> &str {
        &self.handle
    }
    pub fn rating(&self) -> Rating {
        self.rating
    }
}

impl Unique for Lurker {
    fn id(&self) -> ID<Lurker> {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gbt_core::Unique;

    #[test]
    fn minted_guests_are_distinct() {
        let a = Lurker::mint();
        let b = Lurker::mint();
        assert_ne!(a.id(), b.id());
        assert!(a.handle().starts_with("guest-"));
        assert_eq!(a.rating(), gbt_core::DEFAULT_RATING);
    }
}
