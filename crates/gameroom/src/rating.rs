use gbt_auth::Member;
use gbt_core::ID;
use gbt_core::Rating;

/// Counter a finished match credits to a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credit {
    Win,
    Loss,
    Draw,
}

/// Pending rating mutation for one identified participant: new rating plus
/// the counter to bump, applied as a single update.
#[derive(Debug, Clone, Copy)]
pub struct RatingUpdate {
    pub user: ID<Member>,
    pub rating: Rating,
    pub credit: Credit,
}

/// Paired Elo update with fixed K-factor.
#[derive(Debug, Clone, Copy)]
pub struct Elo {
    k: f64,
}

impl Default for Elo {
    fn default() -> Self {
        Self { k: 32.0 }
    }
}

impl Elo {
    /// Expected score for a player rated `own` against `other`.
    fn expected(own: Rating, other: Rating) -> f64 {
        1.0 / (1.0 + 10f64.powf((other - own) as f64 / 400.0))
    }
    /// New ratings for a pair given A's actual score (1 win, 0 loss, ½ draw).
    pub fn pair(&self, a: Rating, b: Rating, score_a: f64) -> (Rating, Rating) {
        let ea = Self::expected(a, b);
        let eb = Self::expected(b, a);
        let na = (a as f64 + self.k * (score_a - ea)).round() as Rating;
        let nb = (b as f64 + self.k * ((1.0 - score_a) - eb)).round() as Rating;
        (na, nb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_ratings_win() {
        // both 1200, A wins: expected ½ each, A +16, B -16
        let (a, b) = Elo::default().pair(1200, 1200, 1.0);
        assert_eq!(a, 1216);
        assert_eq!(b, 1184);
    }

    #[test]
    fn equal_ratings_draw() {
        let (a, b) = Elo::default().pair(1200, 1200, 0.5);
        assert_eq!(a, 1200);
        assert_eq!(b, 1200);
    }

    #[test]
    fn upset_pays_more() {
        // underdog beats a 1400: gains more than 16
        let (a, b) = Elo::default().pair(1200, 1400, 1.0);
        assert!(a > 1216);
        assert!(b < 1400);
        // total points roughly conserved
        assert!(((a + b) - (1200 + 1400)).abs() <= 1);
    }

    #[test]
    fn favorite_win_pays_less() {
        let (a, _) = Elo::default().pair(1400, 1200, 1.0);
        assert!(a - 1400 < 16);
    }
}
