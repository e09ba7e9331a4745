use serde::Deserialize;
use serde::Serialize;

/// FEN of the standard starting position.
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A complete serialized board state sufficient to resume play.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Position(String);

impl Position {
    pub fn new(fen: impl Into<String>) -> Self {
        Self(fen.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Position {
    fn default() -> Self {
        Self(START_FEN.to_string())
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The two sides of the board. The creator of a match always plays White.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    White,
    Black,
}

impl Side {
    /// The opposing side.
    pub fn flip(self) -> Self {
        match self {
            Self::White => Self::Black,
            Self::Black => Self::White,
        }
    }
    /// Stable index for per-side arrays.
    pub fn index(self) -> usize {
        match self {
            Self::White => 0,
            Self::Black => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::White => write!(f, "white"),
            Self::Black => write!(f, "black"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn default_is_start() {
        assert_eq!(Position::default().as_str(), START_FEN);
    }
    #[test]
    fn flip_is_involutive() {
        assert_eq!(Side::White.flip(), Side::Black);
        assert_eq!(Side::Black.flip().flip(), Side::Black);
    }
    #[test]
    fn indices_are_distinct() {
        assert_ne!(Side::White.index(), Side::Black.index());
    }
}
