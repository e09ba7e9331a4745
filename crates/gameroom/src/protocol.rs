use super::Game;
use super::MoveRecord;
use super::Outcome;
use super::Status;
use gbt_auth::User;
use gbt_core::Millis;
use gbt_core::Rating;
use gbt_rules::Position;
use gbt_rules::Side;
use serde::Deserialize;
use serde::Serialize;

/// Errors that can occur while decoding client submissions.
#[derive(Debug, Clone)]
pub enum ProtocolError {
    Malformed(String),
}

impl std::fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "malformed message: {}", s),
        }
    }
}

impl std::error::Error for ProtocolError {}

/// A participant as presented on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: String,
    pub name: String,
    pub is_guest: bool,
    pub rating: Rating,
}

impl From<&User> for PlayerInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.key().to_string(),
            name: user.name().to_string(),
            is_guest: user.is_guest(),
            rating: user.rating(),
        }
    }
}

/// A move as presented on the wire.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMove {
    pub from: String,
    pub to: String,
    pub san: String,
    pub position_before: Position,
    pub position_after: Position,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

impl From<&MoveRecord> for WireMove {
    fn from(record: &MoveRecord) -> Self {
        Self {
            from: record.from.clone(),
            to: record.to.clone(),
            san: record.notation.clone(),
            position_before: record.before.clone(),
            position_after: record.after.clone(),
            promotion: record.notation.ends_with('q').then_some('q'),
        }
    }
}

/// Messages broadcast from server to every connection on a match.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Both players are bound and play has started.
    #[serde(rename = "INIT_GAME", rename_all = "camelCase")]
    Init {
        game_id: String,
        white_player: PlayerInfo,
        black_player: PlayerInfo,
        position: Position,
        moves: Vec<MoveRecord>,
    },
    /// A move was accepted, with both sides' cumulative clock usage.
    #[serde(rename = "MOVE", rename_all = "camelCase")]
    Move {
        #[serde(rename = "move")]
        played: WireMove,
        white_time_consumed_ms: Millis,
        black_time_consumed_ms: Millis,
    },
    /// The match reached a terminal state.
    #[serde(rename = "GAME_ENDED", rename_all = "camelCase")]
    Ended {
        result: Outcome,
        status: Status,
        moves: Vec<MoveRecord>,
        white_player: PlayerInfo,
        black_player: PlayerInfo,
    },
}

impl ServerMessage {
    pub fn init(game: &Game, black: &User) -> Self {
        Self::Init {
            game_id: game.id().to_string(),
            white_player: PlayerInfo::from(game.white()),
            black_player: PlayerInfo::from(black),
            position: game.position().clone(),
            moves: game.moves().to_vec(),
        }
    }
    pub fn moved(record: &MoveRecord, white_ms: Millis, black_ms: Millis) -> Self {
        Self::Move {
            played: WireMove::from(record),
            white_time_consumed_ms: white_ms,
            black_time_consumed_ms: black_ms,
        }
    }
    /// None when the match ended before an opponent ever joined; there is
    /// nobody on the other side to report.
    pub fn ended(game: &Game, outcome: Outcome) -> Option<Self> {
        let black = game.seat(Side::Black)?;
        Some(Self::Ended {
            result: outcome,
            status: game.status(),
            moves: game.moves().to_vec(),
            white_player: PlayerInfo::from(game.white()),
            black_player: PlayerInfo::from(black),
        })
    }
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("serialize server message")
    }
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Init { .. } => "INIT_GAME",
            Self::Move { .. } => "MOVE",
            Self::Ended { .. } => "GAME_ENDED",
        }
    }
}

/// Messages submitted by clients over the socket.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Move submission. The promotion field is carried for forward
    /// compatibility; promotion currently always resolves to a queen.
    #[serde(rename = "MOVE", rename_all = "camelCase")]
    Move {
        from: String,
        to: String,
        #[serde(default)]
        promotion: Option<String>,
    },
    /// Voluntary resignation / departure.
    #[serde(rename = "EXIT_GAME")]
    Exit,
}

/// Wire codec between client text frames and typed messages.
pub struct Protocol;

impl Protocol {
    pub fn decode(s: &str) -> Result<ClientMessage, ProtocolError> {
        serde_json::from_str(s).map_err(|e| ProtocolError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_move() {
        let msg = Protocol::decode(r#"{"type":"MOVE","from":"e2","to":"e4"}"#).unwrap();
        match msg {
            ClientMessage::Move {
                from,
                to,
                promotion,
            } => {
                assert_eq!(from, "e2");
                assert_eq!(to, "e4");
                assert!(promotion.is_none());
            }
            _ => panic!("expected MOVE"),
        }
    }

    #[test]
    fn decode_move_with_promotion() {
        let msg =
            Protocol::decode(r#"{"type":"MOVE","from":"a7","to":"a8","promotion":"n"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::Move { promotion: Some(p), .. } if p == "n"
        ));
    }

    #[test]
    fn decode_exit() {
        assert!(matches!(
            Protocol::decode(r#"{"type":"EXIT_GAME"}"#).unwrap(),
            ClientMessage::Exit
        ));
    }

    #[test]
    fn decode_garbage() {
        assert!(Protocol::decode("not json").is_err());
        assert!(Protocol::decode(r#"{"type":"DANCE"}"#).is_err());
    }

    #[test]
    fn server_messages_tag_type() {
        use gbt_auth::Lurker;
        use gbt_core::ID;
        let game = Game::open(ID::default(), User::from(Lurker::mint()));
        let black = User::from(Lurker::mint());
        let json = ServerMessage::init(&game, &black).to_json();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "INIT_GAME");
        assert_eq!(value["moves"], serde_json::json!([]));
        assert!(value["whitePlayer"]["isGuest"].as_bool().unwrap());
        assert_eq!(value["position"].as_str().unwrap(), gbt_rules::START_FEN);
    }
}
