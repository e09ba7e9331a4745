use gbt_core::Millis;
use gbt_core::Seq;
use gbt_rules::Position;
use gbt_rules::RuleError;
use gbt_rules::Rules;
use serde::Serialize;
use std::time::SystemTime;

/// One accepted move, as persisted and as replayed.
///
/// Sequence numbers start at 1 and increase by exactly 1 with no gaps;
/// `after` of record N equals `before` of record N+1.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRecord {
    pub seq: Seq,
    pub from: String,
    pub to: String,
    #[serde(rename = "san")]
    pub notation: String,
    #[serde(rename = "positionBefore")]
    pub before: Position,
    #[serde(rename = "positionAfter")]
    pub after: Position,
    #[serde(rename = "elapsedMs")]
    pub elapsed: Millis,
    #[serde(skip)]
    pub at: SystemTime,
}

/// Replays records from the starting position through the rules engine.
/// The result is the deterministic reconstruction of the current snapshot.
pub fn replay(records: &[MoveRecord]) -> Result<Position, RuleError> {
    let mut position = Position::default();
    for record in records {
        position = Rules::apply(&position, &record.from, &record.to)?.position;
    }
    Ok(position)
}

mod schema {
    use super::*;
    use gbt_pg::*;

    impl Schema for MoveRecord {
        fn name() -> &'static str {
            MOVES
        }
        fn creates() -> &'static str {
            const_format::concatcp!(
                "CREATE TABLE IF NOT EXISTS ",
                MOVES,
                " (
                    match_id    UUID NOT NULL REFERENCES ",
                MATCHES,
                "(id) ON DELETE CASCADE,
                    seq         INTEGER NOT NULL,
                    square_from VARCHAR(2) NOT NULL,
                    square_to   VARCHAR(2) NOT NULL,
                    notation    VARCHAR(8) NOT NULL,
                    before      TEXT NOT NULL,
                    after       TEXT NOT NULL,
                    elapsed_ms  BIGINT NOT NULL,
                    created_at  TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (match_id, seq)
                );"
            )
        }
        fn indices() -> &'static str {
            ""
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(seq: Seq, from: &str, to: &str, before: &Position) -> (MoveRecord, Position) {
        let applied = Rules::apply(before, from, to).unwrap();
        let record = MoveRecord {
            seq,
            from: from.to_string(),
            to: to.to_string(),
            notation: applied.notation,
            before: before.clone(),
            after: applied.position.clone(),
            elapsed: 0,
            at: SystemTime::now(),
        };
        (record, applied.position)
    }

    #[test]
    fn replay_reproduces_snapshot() {
        let mut position = Position::default();
        let mut records = Vec::new();
        for (seq, (from, to)) in [("e2", "e4"), ("e7", "e5"), ("g1", "f3")]
            .into_iter()
            .enumerate()
        {
            let (rec, next) = record(seq as Seq + 1, from, to, &position);
            records.push(rec);
            position = next;
        }
        assert_eq!(replay(&records).unwrap(), position);
    }

    #[test]
    fn records_chain_positions() {
        let (first, mid) = record(1, "e2", "e4", &Position::default());
        let (second, _) = record(2, "e7", "e5", &mid);
        assert_eq!(first.after, second.before);
    }

    #[test]
    fn empty_replay_is_start() {
        assert_eq!(replay(&[]).unwrap(), Position::default());
    }
}
