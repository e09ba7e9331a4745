use super::ClockConfig;
use super::Clocks;
use super::Credit;
use super::Elo;
use super::Expiry;
use super::Game;
use super::Hub;
use super::MatchStore;
use super::MoveRecord;
use super::Outcome;
use super::RatingUpdate;
use super::ServerMessage;
use super::Status;
use super::StoreError;
use gbt_auth::User;
use gbt_core::ID;
use gbt_rules::RuleError;
use gbt_rules::Rules;
use gbt_rules::Side;
use std::sync::Arc;
use std::time::SystemTime;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;
use tokio::time::Instant;

/// Commands accepted by a running session.
#[derive(Debug)]
pub enum Command {
    /// A player joins or re-joins the match.
    Join { user: User },
    /// A move submission from the connection authenticated as `user`.
    Move {
        user: uuid::Uuid,
        from: String,
        to: String,
    },
    /// Voluntary departure.
    Exit { user: uuid::Uuid },
}

/// Rejections raised while handling a command. None of these reach the
/// wire; rejected submissions are logged and silently dropped.
#[derive(Debug)]
pub enum SessionError {
    NotStarted,
    GameOver,
    UnknownActor(uuid::Uuid),
    NotYourTurn(Side),
    Rule(RuleError),
    Storage(StoreError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "match has not started"),
            Self::GameOver => write!(f, "match is over"),
            Self::UnknownActor(id) => write!(f, "{} is not a participant", id),
            Self::NotYourTurn(side) => write!(f, "it is {}'s turn", side),
            Self::Rule(e) => write!(f, "{}", e),
            Self::Storage(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<RuleError> for SessionError {
    fn from(e: RuleError) -> Self {
        Self::Rule(e)
    }
}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

/// Cheap cloneable handle to a session task's command channel.
#[derive(Clone, Debug)]
pub struct SessionHandle {
    id: ID<Game>,
    tx: UnboundedSender<Command>,
}

impl SessionHandle {
    pub fn id(&self) -> ID<Game> {
        self.id
    }
    pub fn join(&self, user: User) {
        self.send(Command::Join { user });
    }
    pub fn play(&self, user: uuid::Uuid, from: String, to: String) {
        self.send(Command::Move { user, from, to });
    }
    pub fn exit(&self, user: uuid::Uuid) {
        self.send(Command::Exit { user });
    }
    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            log::debug!("[game {}] command after session end", self.id);
        }
    }
}

enum Wake {
    Cmd(Option<Command>),
    Clock(Expiry),
}

/// The actor owning one match.
///
/// All mutation of a [`Game`] happens on this task: player commands arrive
/// over the handle's channel, clock expiries come from its own timers, and
/// every accepted transition is persisted before it is applied in memory.
/// The task ends once the match reaches a terminal state or every handle is
/// dropped, signalling `done` so the host can clean up.
pub struct Session {
    game: Game,
    store: Arc<dyn MatchStore>,
    hub: Arc<Hub>,
    clocks: Clocks,
    last_move: Instant,
}

impl Session {
    /// Spawns the session task. Returns the command handle and a signal
    /// that fires when the task ends.
    pub fn spawn(
        game: Game,
        store: Arc<dyn MatchStore>,
        hub: Arc<Hub>,
        config: ClockConfig,
    ) -> (SessionHandle, oneshot::Receiver<()>) {
        let id = game.id();
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();
        let (done, ended) = oneshot::channel();
        let mut session = Self {
            game,
            store,
            hub,
            clocks: Clocks::new(config),
            last_move: Instant::now(),
        };
        // a rehydrated in-progress match picks its clocks back up
        if session.game.status() == Status::InProgress {
            let budget = session.clocks.remaining(session.game.consumed(session.game.turn()));
            session.clocks.arm(budget);
        }
        log::info!("[game {}] session started as {}", id, session.game.status());
        tokio::spawn(session.run(rx, done));
        (SessionHandle { id, tx }, ended)
    }

    async fn run(mut self, mut rx: UnboundedReceiver<Command>, done: oneshot::Sender<()>) {
        loop {
            let wake = match self.clocks.next() {
                Some((kind, at)) => tokio::select! {
                    biased;
                    cmd = rx.recv() => Wake::Cmd(cmd),
                    _ = tokio::time::sleep_until(at) => Wake::Clock(kind),
                },
                None => Wake::Cmd(rx.recv().await),
            };
            match wake {
                Wake::Cmd(None) => break,
                Wake::Cmd(Some(command)) => {
                    if let Err(e) = self.handle(command).await {
                        log::warn!("[game {}] rejected: {}", self.game.id(), e);
                    }
                }
                Wake::Clock(kind) => self.expire(kind).await,
            }
            if self.game.over() {
                break;
            }
        }
        log::info!("[game {}] session ended as {}", self.game.id(), self.game.status());
        let _ = done.send(());
    }

    async fn handle(&mut self, command: Command) -> Result<(), SessionError> {
        match command {
            Command::Join { user } => self.join(user).await,
            Command::Move { user, from, to } => self.play(user, from, to).await,
            Command::Exit { user } => self.exit(user).await,
        }
    }

    /// Seats a second player, or re-announces state to a returning one.
    async fn join(&mut self, user: User) -> Result<(), SessionError> {
        if self.game.over() {
            return Err(SessionError::GameOver);
        }
        if let Some(side) = self.game.side_of(user.key()) {
            // reconnection: the full state goes back out so the returning
            // client can rebuild its board
            if let Some(black) = self.game.black() {
                log::info!("[game {}] {} rejoined as {}", self.game.id(), user.name(), side);
                let init = ServerMessage::init(&self.game, black);
                self.hub.broadcast(self.game.id(), &init);
            }
            return Ok(());
        }
        if self.game.black().is_some() {
            // a full match seats nobody else; the socket still gets broadcasts
            return Err(SessionError::UnknownActor(user.key()));
        }
        let mut seated = self.game.clone();
        seated.begin(user);
        self.store.create(&seated).await?;
        self.game = seated;
        self.last_move = Instant::now();
        let budget = self.clocks.remaining(self.game.consumed(Side::White));
        self.clocks.arm(budget);
        let black = self.game.black().ok_or(SessionError::NotStarted)?;
        log::info!(
            "[game {}] {} vs {}",
            self.game.id(),
            self.game.white().name(),
            black.name()
        );
        let init = ServerMessage::init(&self.game, black);
        self.hub.broadcast(self.game.id(), &init);
        Ok(())
    }

    /// Validates and applies one move. Persists before mutating, so a
    /// storage failure leaves the in-memory match exactly where it was.
    async fn play(
        &mut self,
        user: uuid::Uuid,
        from: String,
        to: String,
    ) -> Result<(), SessionError> {
        match self.game.status() {
            Status::InProgress => {}
            Status::AwaitingOpponent => return Err(SessionError::NotStarted),
            _ => return Err(SessionError::GameOver),
        }
        let side = self
            .game
            .side_of(user)
            .ok_or(SessionError::UnknownActor(user))?;
        if side != self.game.turn() {
            return Err(SessionError::NotYourTurn(self.game.turn()));
        }
        let applied = Rules::apply(self.game.position(), &from, &to)?;
        let elapsed = (Instant::now() - self.last_move).as_millis() as i64;
        let record = MoveRecord {
            seq: self.game.next_seq(),
            from,
            to,
            notation: applied.notation,
            before: self.game.position().clone(),
            after: applied.position,
            elapsed,
            at: SystemTime::now(),
        };
        self.store.append(self.game.id(), &record).await?;
        self.game.advance(record.clone());
        self.last_move = Instant::now();
        let budget = self.clocks.remaining(self.game.consumed(self.game.turn()));
        self.clocks.arm(budget);
        let moved = ServerMessage::moved(
            &record,
            self.game.consumed(Side::White),
            self.game.consumed(Side::Black),
        );
        self.hub.broadcast(self.game.id(), &moved);
        match Rules::verdict(self.game.position())? {
            gbt_rules::Verdict::Ongoing => Ok(()),
            gbt_rules::Verdict::Checkmate { winner } => {
                self.finish(Status::Completed, Outcome::win_for(winner)).await;
                Ok(())
            }
            gbt_rules::Verdict::Draw => {
                self.finish(Status::Completed, Outcome::Draw).await;
                Ok(())
            }
        }
    }

    /// Voluntary departure forfeits the match to the opponent.
    async fn exit(&mut self, user: uuid::Uuid) -> Result<(), SessionError> {
        if self.game.over() {
            return Err(SessionError::GameOver);
        }
        let side = self
            .game
            .side_of(user)
            .ok_or(SessionError::UnknownActor(user))?;
        if self.game.black().is_none() {
            // nobody ever joined; nothing was persisted, nobody to notify
            log::info!("[game {}] closed before start", self.game.id());
            self.game.close(Status::PlayerExited, Outcome::win_for(side.flip()));
            self.clocks.clear();
            return Ok(());
        }
        log::info!("[game {}] {} left", self.game.id(), side);
        self.finish(Status::PlayerExited, Outcome::win_for(side.flip()))
            .await;
        Ok(())
    }

    /// A timer fired. Both expiries end the match against the side to move.
    async fn expire(&mut self, kind: Expiry) {
        if self.game.over() || self.game.status() != Status::InProgress {
            return;
        }
        let loser = self.game.turn();
        let outcome = Outcome::win_for(loser.flip());
        match kind {
            Expiry::Idle => {
                log::info!("[game {}] {} idle too long", self.game.id(), loser);
                self.finish(Status::Abandoned, outcome).await;
            }
            Expiry::Budget => {
                log::info!("[game {}] {} out of time", self.game.id(), loser);
                self.finish(Status::TimedOut, outcome).await;
            }
        }
    }

    /// Enters a terminal state exactly once: closes the game, disarms the
    /// clocks, stamps storage, settles ratings, broadcasts GAME_ENDED.
    async fn finish(&mut self, status: Status, outcome: Outcome) {
        if self.game.over() {
            return;
        }
        self.game.close(status, outcome);
        self.clocks.clear();
        if let Err(e) = self.store.finalize(self.game.id(), status, outcome).await {
            log::error!("[game {}] finalize failed: {}", self.game.id(), e);
        }
        self.settle(outcome).await;
        if let Some(ended) = ServerMessage::ended(&self.game, outcome) {
            self.hub.broadcast(self.game.id(), &ended);
        }
    }

    /// Applies the Elo exchange. Guests never rate; a match with a guest on
    /// either side leaves both ratings untouched.
    async fn settle(&mut self, outcome: Outcome) {
        let Some(black) = self.game.black() else {
            return;
        };
        let (Some(white_id), Some(black_id)) = (self.game.white().member(), black.member()) else {
            log::debug!("[game {}] unrated match", self.game.id());
            return;
        };
        let elo = Elo::default();
        let (white_new, black_new) = elo.pair(
            self.game.white().rating(),
            black.rating(),
            outcome.score(Side::White),
        );
        let credit = |score: f64| match score {
            s if s == 1.0 => Credit::Win,
            s if s == 0.0 => Credit::Loss,
            _ => Credit::Draw,
        };
        let white_update = RatingUpdate {
            user: white_id,
            rating: white_new,
            credit: credit(outcome.score(Side::White)),
        };
        let black_update = RatingUpdate {
            user: black_id,
            rating: black_new,
            credit: credit(outcome.score(Side::Black)),
        };
        log::info!(
            "[game {}] ratings {} -> {}, {} -> {}",
            self.game.id(),
            self.game.white().rating(),
            white_new,
            black.rating(),
            black_new
        );
        if let Err(e) = self.store.record_ratings(&white_update, &black_update).await {
            log::error!("[game {}] rating update failed: {}", self.game.id(), e);
        }
    }
}
