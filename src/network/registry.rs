//! Game Registry
//!
//! Owns every live game, one per chat. Each session sits behind its own
//! mutex so commands for one chat are applied one at a time while
//! different chats proceed in parallel.
//!
//! Lock order is always registry → session. A session lock is released
//! before the registry is write-locked to drop a finished game.

use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::game::error::GameError;
use crate::game::phase::{advance, PhaseReport};
use crate::game::state::{
    ChatId, GameConfig, PlayerId, RoleNotice, RosterEntry, Session, StatusReport,
};

/// Shared handle to one chat's session.
pub type SessionHandle = Arc<Mutex<Session>>;

/// Manages all live games.
pub struct GameRegistry {
    /// Live games by chat.
    games: RwLock<BTreeMap<ChatId, SessionHandle>>,
    /// Settings applied to every new game.
    config: GameConfig,
}

impl GameRegistry {
    /// Create an empty registry.
    pub fn new(config: GameConfig) -> Self {
        Self {
            games: RwLock::new(BTreeMap::new()),
            config,
        }
    }

    /// Settings for new games.
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Open a game in `chat`. Returns the new game's id.
    ///
    /// Fails with `DuplicateGame` while a live game exists there. A game
    /// that has ended but not yet been dropped is replaced.
    #[instrument(skip(self))]
    pub async fn new_game(&self, chat: ChatId, creator: PlayerId) -> Result<Uuid, GameError> {
        let mut games = self.games.write().await;

        if let Some(existing) = games.get(&chat) {
            if !existing.lock().await.is_ended() {
                return Err(GameError::DuplicateGame);
            }
        }

        let session = Session::new(chat, creator, self.config.clone());
        let game_id = session.game_id();
        games.insert(chat, Arc::new(Mutex::new(session)));

        info!(%chat, %creator, %game_id, "game created");
        Ok(game_id)
    }

    /// Add a player. Returns the roster size after joining.
    #[instrument(skip(self, name))]
    pub async fn join(&self, chat: ChatId, player: PlayerId, name: &str) -> Result<usize, GameError> {
        let handle = self.live(chat).await?;
        let mut session = handle.lock().await;
        ensure_live(&session)?;

        session.add_player(player, name)?;
        debug!(%chat, %player, count = session.player_count(), "player joined");
        Ok(session.player_count())
    }

    /// Start the game. Returns one private role notice per player.
    #[instrument(skip(self))]
    pub async fn start(&self, chat: ChatId, requester: PlayerId) -> Result<Vec<RoleNotice>, GameError> {
        let handle = self.live(chat).await?;
        let mut session = handle.lock().await;
        ensure_live(&session)?;

        let notices = session.start(requester)?;
        info!(
            %chat,
            game_id = %session.game_id(),
            players = notices.len(),
            seed = session.rng_seed(),
            "game started"
        );
        Ok(notices)
    }

    /// Record a night action.
    #[instrument(skip(self))]
    pub async fn submit_action(&self, chat: ChatId, actor: PlayerId, target: PlayerId) -> Result<(), GameError> {
        let handle = self.live(chat).await?;
        let mut session = handle.lock().await;
        ensure_live(&session)?;

        session.submit_night_action(actor, target)?;
        debug!(%chat, %actor, "night action accepted");
        Ok(())
    }

    /// Record a vote. Returns the target's tally.
    #[instrument(skip(self))]
    pub async fn submit_vote(&self, chat: ChatId, voter: PlayerId, target: PlayerId) -> Result<u32, GameError> {
        let handle = self.live(chat).await?;
        let mut session = handle.lock().await;
        ensure_live(&session)?;

        let tally = session.submit_vote(voter, target)?;
        debug!(%chat, %voter, against = %target, tally, "vote accepted");
        Ok(tally)
    }

    /// Advance to the next phase. Drops the game when a faction wins.
    #[instrument(skip(self))]
    pub async fn advance_phase(&self, chat: ChatId, requester: PlayerId) -> Result<PhaseReport, GameError> {
        let handle = self.live(chat).await?;

        let report = {
            let mut session = handle.lock().await;
            ensure_live(&session)?;
            advance(&mut session, requester)?
        };

        if report.winner.is_some() {
            self.remove_if_same(chat, &handle).await;
        }
        Ok(report)
    }

    /// Public snapshot of the game.
    pub async fn get_status(&self, chat: ChatId) -> Result<StatusReport, GameError> {
        let handle = self.live(chat).await?;
        let session = handle.lock().await;
        ensure_live(&session)?;
        Ok(session.status())
    }

    /// A player's role and faction.
    pub async fn get_role(&self, chat: ChatId, player: PlayerId) -> Result<RoleNotice, GameError> {
        let handle = self.live(chat).await?;
        let session = handle.lock().await;
        ensure_live(&session)?;
        session.role_of(player)
    }

    /// Every joined player with an alive flag.
    pub async fn roster(&self, chat: ChatId) -> Result<Vec<RosterEntry>, GameError> {
        let handle = self.live(chat).await?;
        let session = handle.lock().await;
        ensure_live(&session)?;
        Ok(session.roster())
    }

    /// Number of live games.
    pub async fn game_count(&self) -> usize {
        self.games.read().await.len()
    }

    /// Get a chat's session handle.
    pub async fn get(&self, chat: ChatId) -> Option<SessionHandle> {
        self.games.read().await.get(&chat).cloned()
    }

    async fn live(&self, chat: ChatId) -> Result<SessionHandle, GameError> {
        self.get(chat).await.ok_or(GameError::NoGame)
    }

    /// Remove `chat`'s game only if it is still the one that ended.
    async fn remove_if_same(&self, chat: ChatId, handle: &SessionHandle) {
        let mut games = self.games.write().await;
        if games.get(&chat).is_some_and(|current| Arc::ptr_eq(current, handle)) {
            games.remove(&chat);
            info!(%chat, "game removed");
        }
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}

fn ensure_live(session: &Session) -> Result<(), GameError> {
    if session.is_ended() {
        Err(GameError::NoGame)
    } else {
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
