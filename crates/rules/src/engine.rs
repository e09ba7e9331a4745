use super::Position;
use super::Side;
use chess::Board;
use chess::BoardStatus;
use chess::ChessMove;
use chess::Color;
use chess::MoveGen;
use chess::Piece;
use chess::Rank;
use chess::Square;
use std::str::FromStr;

/// Errors surfaced by the rules engine boundary.
#[derive(Debug, Clone)]
pub enum RuleError {
    BadPosition(String),
    BadSquare(String),
    Illegal(String),
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadPosition(s) => write!(f, "unreadable position: {}", s),
            Self::BadSquare(s) => write!(f, "unreadable square: {}", s),
            Self::Illegal(s) => write!(f, "illegal move: {}", s),
        }
    }
}

impl std::error::Error for RuleError {}

/// A legal move applied to a position.
#[derive(Debug, Clone)]
pub struct Applied {
    /// Position after the move.
    pub position: Position,
    /// Coordinate notation, promotion piece suffixed when present (`a7a8q`).
    pub notation: String,
    /// Promotion piece, if the move promoted.
    pub promotion: Option<char>,
}

/// Terminal-position classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Ongoing,
    /// Side to move is mated; the other side won.
    Checkmate { winner: Side },
    /// Stalemate or other draw the engine recognizes.
    Draw,
}

/// Stateless facade over the `chess` crate.
pub struct Rules;

impl Rules {
    /// The side whose turn it is in the given position.
    pub fn side_to_move(position: &Position) -> Result<Side, RuleError> {
        Ok(match Self::board(position)?.side_to_move() {
            Color::White => Side::White,
            Color::Black => Side::Black,
        })
    }

    /// Legal destination squares for the piece on `from`, if any.
    pub fn destinations(position: &Position, from: &str) -> Result<Vec<String>, RuleError> {
        let board = Self::board(position)?;
        let from = Self::square(from)?;
        Ok(MoveGen::new_legal(&board)
            .filter(|m| m.get_source() == from)
            .map(|m| m.get_dest().to_string())
            .collect())
    }

    /// Validates and applies a move, returning the resulting position.
    ///
    /// Promotion is resolved to a queen whenever a pawn legally reaches the
    /// back rank; a requested underpromotion is not honored.
    pub fn apply(position: &Position, from: &str, to: &str) -> Result<Applied, RuleError> {
        let board = Self::board(position)?;
        let from = Self::square(from)?;
        let to = Self::square(to)?;
        let promotion = Self::promoting(&board, from, to).then_some(Piece::Queen);
        let candidate = ChessMove::new(from, to, promotion);
        if !MoveGen::new_legal(&board).any(|m| m == candidate) {
            return Err(RuleError::Illegal(format!("{}{}", from, to)));
        }
        let mut next = board.clone();
        board.make_move(candidate, &mut next);
        let suffix = promotion.map(|_| "q").unwrap_or("");
        Ok(Applied {
            position: Position::new(format!("{}", next)),
            notation: format!("{}{}{}", from, to, suffix),
            promotion: promotion.map(|_| 'q'),
        })
    }

    /// Classifies a position as ongoing, mated, or drawn.
    pub fn verdict(position: &Position) -> Result<Verdict, RuleError> {
        let board = Self::board(position)?;
        Ok(match board.status() {
            BoardStatus::Ongoing => Verdict::Ongoing,
            BoardStatus::Stalemate => Verdict::Draw,
            BoardStatus::Checkmate => Verdict::Checkmate {
                winner: match board.side_to_move() {
                    Color::White => Side::Black,
                    Color::Black => Side::White,
                },
            },
        })
    }

    /// A pawn move onto the back rank for its color.
    fn promoting(board: &Board, from: Square, to: Square) -> bool {
        let mover = board.side_to_move();
        board.piece_on(from) == Some(Piece::Pawn)
            && board.color_on(from) == Some(mover)
            && match mover {
                Color::White => to.get_rank() == Rank::Eighth,
                Color::Black => to.get_rank() == Rank::First,
            }
    }

    fn board(position: &Position) -> Result<Board, RuleError> {
        Board::from_str(position.as_str())
            .map_err(|e| RuleError::BadPosition(format!("{}: {}", position, e)))
    }

    fn square(s: &str) -> Result<Square, RuleError> {
        Square::from_str(s).map_err(|_| RuleError::BadSquare(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_move_applies() {
        let start = Position::default();
        let applied = Rules::apply(&start, "e2", "e4").unwrap();
        assert_eq!(applied.notation, "e2e4");
        assert!(applied.promotion.is_none());
        assert_ne!(applied.position, start);
        assert_eq!(Rules::side_to_move(&applied.position).unwrap(), Side::Black);
    }

    #[test]
    fn illegal_move_rejected() {
        let start = Position::default();
        assert!(matches!(
            Rules::apply(&start, "e2", "e5"),
            Err(RuleError::Illegal(_))
        ));
    }

    #[test]
    fn unreadable_square_rejected() {
        let start = Position::default();
        assert!(matches!(
            Rules::apply(&start, "z9", "e4"),
            Err(RuleError::BadSquare(_))
        ));
    }

    #[test]
    fn destinations_from_start() {
        let start = Position::default();
        let dests = Rules::destinations(&start, "e2").unwrap();
        assert_eq!(dests.len(), 2);
        assert!(dests.contains(&"e3".to_string()));
        assert!(dests.contains(&"e4".to_string()));
    }

    #[test]
    fn promotion_resolves_to_queen() {
        let position = Position::new("8/P7/8/8/8/8/8/K6k w - - 0 1");
        let applied = Rules::apply(&position, "a7", "a8").unwrap();
        assert_eq!(applied.promotion, Some('q'));
        assert_eq!(applied.notation, "a7a8q");
        assert!(applied.position.as_str().contains('Q'));
    }

    #[test]
    fn fools_mate_is_checkmate_for_black() {
        let mut position = Position::default();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            position = Rules::apply(&position, from, to).unwrap().position;
        }
        assert_eq!(
            Rules::verdict(&position).unwrap(),
            Verdict::Checkmate {
                winner: Side::Black
            }
        );
    }

    #[test]
    fn stalemate_is_draw() {
        let position = Position::new("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1");
        assert_eq!(Rules::verdict(&position).unwrap(), Verdict::Draw);
    }

    #[test]
    fn start_is_ongoing() {
        assert_eq!(
            Rules::verdict(&Position::default()).unwrap(),
            Verdict::Ongoing
        );
    }
}
