use gbt_auth::Lurker;
use gbt_auth::ProfileRepository;
use gbt_auth::User;
use gbt_core::ID;
use gbt_gameroom::ClockConfig;
use gbt_gameroom::Game;
use gbt_gameroom::Hub;
use gbt_gameroom::MatchStore;
use gbt_gameroom::Session;
use gbt_gameroom::SessionHandle;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Registry of live match sessions.
///
/// One entry per running session task. Entries are inserted when a match is
/// created or rehydrated and removed by the cleanup task that watches each
/// session's done signal. The profile source resolves stored participant ids
/// back into identities when a match is rehydrated.
pub struct Lobby<P> {
    store: Arc<dyn MatchStore>,
    hub: Arc<Hub>,
    profiles: P,
    config: ClockConfig,
    sessions: RwLock<HashMap<ID<Game>, SessionHandle>>,
}

impl<P> Lobby<P>
where
    P: ProfileRepository + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn MatchStore>, hub: Arc<Hub>, profiles: P) -> Self {
        Self {
            store,
            hub,
            profiles,
            config: ClockConfig::default(),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn hub(&self) -> Arc<Hub> {
        self.hub.clone()
    }

    /// Opens a new match with `creator` seated as White and spawns its
    /// session. The match is not persisted until an opponent joins.
    pub async fn create(self: &Arc<Self>, creator: User) -> ID<Game> {
        let game = Game::open(ID::default(), creator);
        let id = game.id();
        self.adopt(game).await;
        log::info!("[lobby] created match {}", id);
        id
    }

    /// The handle for a live session, if one is running.
    pub async fn lookup(&self, id: ID<Game>) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// The handle for `id`, rehydrating from storage when the session is no
    /// longer in memory. Fails for unknown and finished matches.
    pub async fn attach(self: &Arc<Self>, id: ID<Game>) -> anyhow::Result<SessionHandle> {
        if let Some(handle) = self.lookup(id).await {
            return Ok(handle);
        }
        self.resume(id).await
    }

    /// Evicts a session from the registry.
    pub async fn close(&self, id: ID<Game>) {
        self.sessions.write().await.remove(&id);
    }

    /// Number of live sessions.
    pub async fn occupancy(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Rebuilds a stored match and spawns a fresh session for it.
    async fn resume(self: &Arc<Self>, id: ID<Game>) -> anyhow::Result<SessionHandle> {
        let row = self
            .store
            .fetch(id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("match {} not found", id))?;
        if row.status.terminal() {
            anyhow::bail!("match {} already ended as {}", id, row.status);
        }
        let moves = self.store.history(id).await?;
        let white = self.identify(row.white).await;
        let black = self.identify(row.black).await;
        let game = Game::rehydrate(id, white, Some(black), row.status, row.started, moves);
        log::info!(
            "[lobby] rehydrated match {} at move {}",
            id,
            game.next_seq()
        );
        Ok(self.adopt(game).await)
    }

    /// Spawns the session task plus a watcher that evicts the registry
    /// entry when it ends.
    async fn adopt(self: &Arc<Self>, game: Game) -> SessionHandle {
        let id = game.id();
        let (handle, ended) = Session::spawn(game, self.store.clone(), self.hub.clone(), self.config);
        self.sessions.write().await.insert(id, handle.clone());
        let lobby = self.clone();
        tokio::spawn(async move {
            let _ = ended.await;
            lobby.close(id).await;
            log::info!("[lobby] match {} cleaned up", id);
        });
        handle
    }

    /// Resolves a stored participant id: registered users come back from
    /// their profile, anything else was a guest.
    async fn identify(&self, key: uuid::Uuid) -> User {
        match self.profiles.profile(ID::from(key)).await {
            Ok(Some(member)) => User::from(member),
            Ok(None) => User::from(Lurker::revive(key)),
            Err(e) => {
                log::warn!("[lobby] profile lookup for {} failed: {}", key, e);
                User::from(Lurker::revive(key))
            }
        }
    }
}
