//! End-to-end session behavior against the in-memory store, with the
//! runtime clock paused so timer expiries are deterministic.

use gbt_auth::Lurker;
use gbt_auth::Member;
use gbt_auth::User;
use gbt_core::ID;
use gbt_gameroom::ClockConfig;
use gbt_gameroom::Credit;
use gbt_gameroom::Game;
use gbt_gameroom::Hub;
use gbt_gameroom::MatchStore;
use gbt_gameroom::MemoryStore;
use gbt_gameroom::Session;
use gbt_gameroom::SessionHandle;
use gbt_gameroom::Status;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

struct Rig {
    handle: SessionHandle,
    store: Arc<MemoryStore>,
    frames: UnboundedReceiver<String>,
    white: User,
    black: User,
}

fn guest() -> User {
    User::from(Lurker::mint())
}

fn member(name: &str, rating: i32) -> User {
    User::from(Member::new(ID::default(), name.to_string(), rating))
}

fn rig_with(white: User, black: User, config: ClockConfig) -> Rig {
    let store = Arc::new(MemoryStore::new());
    let hub = Arc::new(Hub::new());
    let game = Game::open(ID::default(), white.clone());
    let (handle, _ended) = Session::spawn(game, store.clone(), hub.clone(), config);
    let (_, frames) = hub.attach(handle.id());
    Rig {
        handle,
        store,
        frames,
        white,
        black,
    }
}

fn rig() -> Rig {
    rig_with(guest(), guest(), ClockConfig::default())
}

/// Lets the session task drain its queue without advancing time.
async fn pump() {
    for _ in 0..16 {
        tokio::task::yield_now().await;
    }
}

async fn next_frame(rx: &mut UnboundedReceiver<String>) -> serde_json::Value {
    let frame = rx.recv().await.expect("hub channel open");
    serde_json::from_str(&frame).expect("valid json frame")
}

fn no_frame(rx: &mut UnboundedReceiver<String>) {
    assert!(rx.try_recv().is_err(), "unexpected broadcast");
}

#[tokio::test(start_paused = true)]
async fn join_broadcasts_init() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    let init = next_frame(&mut rig.frames).await;
    assert_eq!(init["type"], "INIT_GAME");
    assert_eq!(init["whitePlayer"]["id"], rig.white.key().to_string());
    assert_eq!(init["blackPlayer"]["id"], rig.black.key().to_string());
    assert_eq!(init["moves"], serde_json::json!([]));
    let row = rig.store.snapshot(rig.handle.id()).expect("persisted");
    assert_eq!(row.status, Status::InProgress);
}

#[tokio::test(start_paused = true)]
async fn move_broadcasts_with_time_attribution() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    tokio::time::advance(Duration::from_secs(12)).await;
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    let moved = next_frame(&mut rig.frames).await;
    assert_eq!(moved["type"], "MOVE");
    assert_eq!(moved["move"]["from"], "e2");
    assert_eq!(moved["move"]["to"], "e4");
    assert_eq!(moved["whiteTimeConsumedMs"], 12_000);
    assert_eq!(moved["blackTimeConsumedMs"], 0);
    assert_eq!(rig.store.stored_moves(rig.handle.id()), 1);

    tokio::time::advance(Duration::from_secs(3)).await;
    rig.handle.play(rig.black.key(), "e7".into(), "e5".into());
    let moved = next_frame(&mut rig.frames).await;
    assert_eq!(moved["whiteTimeConsumedMs"], 12_000);
    assert_eq!(moved["blackTimeConsumedMs"], 3_000);
}

#[tokio::test(start_paused = true)]
async fn out_of_turn_and_strangers_are_silent() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    // black may not move first
    rig.handle.play(rig.black.key(), "e7".into(), "e5".into());
    // a stranger may not move at all
    rig.handle.play(uuid::Uuid::now_v7(), "e2".into(), "e4".into());
    // neither may an illegal move
    rig.handle.play(rig.white.key(), "e2".into(), "e5".into());
    pump().await;
    no_frame(&mut rig.frames);
    assert_eq!(rig.store.stored_moves(rig.handle.id()), 0);
}

#[tokio::test(start_paused = true)]
async fn moves_before_opponent_joins_are_silent() {
    let mut rig = rig();
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    pump().await;
    no_frame(&mut rig.frames);
}

#[tokio::test(start_paused = true)]
async fn idle_side_abandons_to_opponent() {
    let white = member("alice", 1500);
    let black = member("bob", 1500);
    let mut rig = rig_with(white, black, ClockConfig::default());
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    next_frame(&mut rig.frames).await;

    // black is to move and never does
    tokio::time::advance(Duration::from_secs(61)).await;
    let ended = next_frame(&mut rig.frames).await;
    assert_eq!(ended["type"], "GAME_ENDED");
    assert_eq!(ended["status"], "ABANDONED");
    assert_eq!(ended["result"], "WHITE_WINS");

    // no further timer-driven transition, no second GAME_ENDED
    tokio::time::advance(Duration::from_secs(120)).await;
    pump().await;
    no_frame(&mut rig.frames);
    let row = rig.store.snapshot(rig.handle.id()).expect("persisted");
    assert_eq!(row.status, Status::Abandoned);

    // both identified, so the forfeit rates: equal ratings exchange 16
    let events = rig.store.rating_events();
    assert_eq!(events.len(), 1);
    let (w, b) = events[0];
    assert_eq!(w.rating, 1516);
    assert_eq!(b.rating, 1484);
    assert!(matches!(w.credit, Credit::Win));
    assert!(matches!(b.credit, Credit::Loss));
}

#[tokio::test(start_paused = true)]
async fn exhausted_budget_times_out() {
    let config = ClockConfig {
        idle: Duration::from_secs(60),
        budget: Duration::from_secs(45),
    };
    let mut rig = rig_with(guest(), guest(), config);
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    // white burns most of the budget over two moves, then runs dry
    tokio::time::advance(Duration::from_secs(30)).await;
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    next_frame(&mut rig.frames).await;
    rig.handle.play(rig.black.key(), "e7".into(), "e5".into());
    next_frame(&mut rig.frames).await;

    // 15s of budget left for white but a 60s idle window: budget fires first
    tokio::time::advance(Duration::from_secs(16)).await;
    let ended = next_frame(&mut rig.frames).await;
    assert_eq!(ended["type"], "GAME_ENDED");
    assert_eq!(ended["status"], "TIMED_OUT");
    assert_eq!(ended["result"], "BLACK_WINS");
}

#[tokio::test(start_paused = true)]
async fn exit_forfeits_to_opponent() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    rig.handle.exit(rig.black.key());
    let ended = next_frame(&mut rig.frames).await;
    assert_eq!(ended["type"], "GAME_ENDED");
    assert_eq!(ended["status"], "PLAYER_EXITED");
    assert_eq!(ended["result"], "WHITE_WINS");
}

#[tokio::test(start_paused = true)]
async fn checkmate_completes_and_rates_once() {
    let white = member("alice", 1200);
    let black = member("bob", 1200);
    let mut rig = rig_with(white.clone(), black.clone(), ClockConfig::default());
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    // fastest mate: black delivers on move two
    for (user, from, to) in [
        (white.key(), "f2", "f3"),
        (black.key(), "e7", "e5"),
        (white.key(), "g2", "g4"),
        (black.key(), "d8", "h4"),
    ] {
        rig.handle.play(user, from.into(), to.into());
        next_frame(&mut rig.frames).await;
    }
    let ended = next_frame(&mut rig.frames).await;
    assert_eq!(ended["type"], "GAME_ENDED");
    assert_eq!(ended["status"], "COMPLETED");
    assert_eq!(ended["result"], "BLACK_WINS");

    // one paired rating event, K=32 exchange at equal ratings
    let events = rig.store.rating_events();
    assert_eq!(events.len(), 1);
    let (w, b) = events[0];
    assert_eq!(w.rating, 1184);
    assert_eq!(b.rating, 1216);
    assert!(matches!(w.credit, Credit::Loss));
    assert!(matches!(b.credit, Credit::Win));

    // terminal state accepts nothing further
    rig.handle.exit(white.key());
    pump().await;
    no_frame(&mut rig.frames);
    assert_eq!(rig.store.rating_events().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn guest_matches_never_rate() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;
    rig.handle.exit(rig.white.key());
    let ended = next_frame(&mut rig.frames).await;
    assert_eq!(ended["result"], "BLACK_WINS");
    assert!(rig.store.rating_events().is_empty());
}

#[tokio::test(start_paused = true)]
async fn storage_failure_rolls_back_the_move() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    rig.store.fail_next_append();
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    pump().await;
    no_frame(&mut rig.frames);
    assert_eq!(rig.store.stored_moves(rig.handle.id()), 0);

    // it is still white's turn; the same move now goes through
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    let moved = next_frame(&mut rig.frames).await;
    assert_eq!(moved["move"]["san"], "e2e4");
    assert_eq!(rig.store.stored_moves(rig.handle.id()), 1);
}

#[tokio::test(start_paused = true)]
async fn rejoin_replays_state() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;
    rig.handle.play(rig.white.key(), "e2".into(), "e4".into());
    next_frame(&mut rig.frames).await;

    rig.handle.join(rig.white.clone());
    let init = next_frame(&mut rig.frames).await;
    assert_eq!(init["type"], "INIT_GAME");
    assert_eq!(init["moves"].as_array().unwrap().len(), 1);
    assert_eq!(init["moves"][0]["san"], "e2e4");
}

#[tokio::test(start_paused = true)]
async fn spectators_are_not_seated() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;

    let lurker = guest();
    rig.handle.join(lurker.clone());
    rig.handle.play(lurker.key(), "e2".into(), "e4".into());
    pump().await;
    no_frame(&mut rig.frames);
}

#[tokio::test(start_paused = true)]
async fn sequence_numbers_are_contiguous() {
    let mut rig = rig();
    rig.handle.join(rig.black.clone());
    next_frame(&mut rig.frames).await;
    for (user, from, to) in [
        (rig.white.key(), "e2", "e4"),
        (rig.black.key(), "e7", "e5"),
        (rig.white.key(), "g1", "f3"),
    ] {
        rig.handle.play(user, from.into(), to.into());
        next_frame(&mut rig.frames).await;
    }
    pump().await;
    let history = rig.store.history(rig.handle.id()).await.unwrap();
    let seqs: Vec<_> = history.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, vec![1, 2, 3]);
    for pair in history.windows(2) {
        assert_eq!(pair[0].after, pair[1].before);
    }
}
