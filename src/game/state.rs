//! Game State Definitions
//!
//! Players, phases and the per-chat [`Session`].
//! Uses BTreeMap/BTreeSet so every iteration the resolvers do is ordered.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::core::rng::{DeterministicRng, derive_game_seed};
use crate::game::assign::assign_roles;
use crate::game::error::GameError;
use crate::game::events::NightEvent;
use crate::game::night::{NightAction, NightOutcome};
use crate::game::role::{Faction, Role};
use crate::{MAX_PLAYERS, MIN_PLAYERS};

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Opaque player identifier, as supplied by the chat platform.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub i64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque chat identifier. One live game per chat.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub i64);

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// PLAYER
// =============================================================================

/// A participant. Immutable once added.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique player ID
    pub id: PlayerId,
    /// Display name
    pub name: String,
}

impl Player {
    /// Create a player.
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self { id, name: name.into() }
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Current phase of the game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Collecting players
    #[default]
    Waiting,
    /// Hidden actions
    Night,
    /// Discussion, nothing to submit
    Day,
    /// Public votes
    Voting,
    /// A faction won
    Ended,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Waiting => "waiting",
            Phase::Night => "night",
            Phase::Day => "day",
            Phase::Voting => "voting",
            Phase::Ended => "ended",
        };
        f.write_str(name)
    }
}

// =============================================================================
// CONFIG
// =============================================================================

/// Per-session game settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Players needed to start, clamped to [`MIN_PLAYERS`]`..=`[`MAX_PLAYERS`].
    pub min_players: usize,
    /// Fixed RNG seed. `None` derives one per game.
    pub seed: Option<u64>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            seed: None,
        }
    }
}

impl GameConfig {
    /// Create config from environment variables.
    ///
    /// - `MAFIA_MIN_PLAYERS`: start threshold, clamped to `4..=10`
    /// - `MAFIA_SEED`: fixed seed for reproducible games
    pub fn from_env() -> Self {
        let min_players = std::env::var("MAFIA_MIN_PLAYERS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(MIN_PLAYERS);

        Self {
            min_players: min_players.clamp(MIN_PLAYERS, MAX_PLAYERS),
            seed: std::env::var("MAFIA_SEED").ok().and_then(|v| v.parse().ok()),
        }
    }

    /// Same config with a fixed seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

// =============================================================================
// REPORTS
// =============================================================================

/// Private role notification produced when the game starts.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleNotice {
    /// Recipient
    pub player: Player,
    /// Their role
    pub role: Role,
    /// Their faction
    pub faction: Faction,
}

/// Roster line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// The player
    pub player: Player,
    /// Still in the game?
    pub alive: bool,
}

/// Vote tally line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteEntry {
    /// Vote target
    pub player: Player,
    /// Votes received so far
    pub votes: u32,
}

/// Snapshot for the status command.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusReport {
    /// Chat the game lives in
    pub chat_id: ChatId,
    /// Current phase
    pub phase: Phase,
    /// Day counter
    pub day: u32,
    /// Everyone who joined
    pub total_players: usize,
    /// Living players, in join order
    pub alive: Vec<Player>,
    /// Current tally, only while voting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub votes: Option<Vec<VoteEntry>>,
    /// Messages from the most recent night
    pub last_night: Vec<NightEvent>,
}

// =============================================================================
// SESSION
// =============================================================================

/// One game's complete mutable state.
///
/// Mutators validate against the current phase and leave the session
/// untouched when they return an error.
#[derive(Clone, Debug)]
pub struct Session {
    /// Unique per game, for log correlation
    pub(crate) game_id: Uuid,
    /// Hosting chat
    pub(crate) chat_id: ChatId,
    /// Only this player may start and advance
    pub(crate) creator: PlayerId,
    /// Settings
    pub(crate) config: GameConfig,
    /// Current phase
    pub(crate) phase: Phase,
    /// Starts at 1, incremented at each dawn
    pub(crate) day: u32,
    /// Players in join order
    pub(crate) players: Vec<Player>,
    /// Assigned once at start
    pub(crate) roles: BTreeMap<PlayerId, Role>,
    /// Living players
    pub(crate) alive: BTreeSet<PlayerId>,
    /// Tonight's actions in submission order
    pub(crate) night_actions: Vec<NightAction>,
    /// Current (or most recent) voting tally
    pub(crate) votes: BTreeMap<PlayerId, u32>,
    /// Result of the most recent night
    pub(crate) last_night: Option<NightOutcome>,
    /// Set once a faction wins
    pub(crate) winner: Option<Faction>,
    /// RNG seed (for reproduction)
    pub(crate) rng_seed: u64,
    /// Draws for role assignment and kill tie-breaks
    pub(crate) rng: DeterministicRng,
}

impl Session {
    /// Create a new session waiting for players.
    pub fn new(chat_id: ChatId, creator: PlayerId, config: GameConfig) -> Self {
        let game_id = Uuid::new_v4();
        let rng_seed = config
            .seed
            .unwrap_or_else(|| derive_game_seed(chat_id.0, creator.0, game_id.as_bytes()));

        Self {
            game_id,
            chat_id,
            creator,
            config,
            phase: Phase::Waiting,
            day: 1,
            players: Vec::new(),
            roles: BTreeMap::new(),
            alive: BTreeSet::new(),
            night_actions: Vec::new(),
            votes: BTreeMap::new(),
            last_night: None,
            winner: None,
            rng_seed,
            rng: DeterministicRng::new(rng_seed),
        }
    }

    /// Register a player while waiting.
    pub fn add_player(&mut self, id: PlayerId, name: impl Into<String>) -> Result<(), GameError> {
        if self.phase != Phase::Waiting {
            return Err(GameError::NotWaiting);
        }
        if self.is_participant(id) {
            return Err(GameError::AlreadyJoined);
        }
        if self.players.len() >= MAX_PLAYERS {
            return Err(GameError::RosterFull);
        }

        self.players.push(Player::new(id, name));
        Ok(())
    }

    /// Assign roles and move to the first night.
    ///
    /// Returns one private notice per player, in join order.
    pub fn start(&mut self, requester: PlayerId) -> Result<Vec<RoleNotice>, GameError> {
        if requester != self.creator {
            return Err(GameError::NotCreator);
        }
        if self.phase != Phase::Waiting {
            return Err(GameError::AlreadyStarted);
        }
        if self.players.len() < self.config.min_players.clamp(MIN_PLAYERS, MAX_PLAYERS) {
            return Err(GameError::InsufficientPlayers);
        }

        let ids: Vec<PlayerId> = self.players.iter().map(|p| p.id).collect();
        self.roles = assign_roles(&ids, &mut self.rng);
        self.alive = ids.iter().copied().collect();
        self.phase = Phase::Night;
        self.day = 1;

        let notices = self
            .players
            .iter()
            .filter_map(|p| {
                self.roles.get(&p.id).map(|role| RoleNotice {
                    player: p.clone(),
                    role: *role,
                    faction: role.faction(),
                })
            })
            .collect();

        Ok(notices)
    }

    /// Record a hidden night action.
    pub fn submit_night_action(&mut self, actor: PlayerId, target: PlayerId) -> Result<(), GameError> {
        if self.phase != Phase::Night {
            return Err(GameError::WrongPhase);
        }
        if !self.is_alive(actor) {
            return Err(GameError::NotAlive);
        }
        self.check_target(target)?;

        let role = self.roles.get(&actor).copied().ok_or(GameError::NotAlive)?;
        if !role.can_act() {
            return Err(GameError::NoCapability);
        }
        if self.night_actions.iter().any(|a| a.actor == actor) {
            return Err(GameError::AlreadyActed);
        }

        self.night_actions.push(NightAction { actor, target });
        Ok(())
    }

    /// Add one vote against `target`. Returns the target's new tally.
    ///
    /// Repeat votes from the same voter each count.
    pub fn submit_vote(&mut self, voter: PlayerId, target: PlayerId) -> Result<u32, GameError> {
        if self.phase != Phase::Voting {
            return Err(GameError::WrongPhase);
        }
        if !self.is_alive(voter) {
            return Err(GameError::NotAlive);
        }
        self.check_target(target)?;

        let tally = self.votes.entry(target).or_insert(0);
        *tally += 1;
        Ok(*tally)
    }

    fn check_target(&self, target: PlayerId) -> Result<(), GameError> {
        if !self.is_participant(target) {
            return Err(GameError::InvalidTarget);
        }
        if !self.is_alive(target) {
            return Err(GameError::TargetNotAlive);
        }
        Ok(())
    }

    /// Remove a player from the living. Returns false if already dead.
    pub(crate) fn kill(&mut self, id: PlayerId) -> bool {
        self.alive.remove(&id)
    }

    /// A player's role and faction, once the game has started.
    pub fn role_of(&self, id: PlayerId) -> Result<RoleNotice, GameError> {
        if self.phase == Phase::Waiting {
            return Err(GameError::WrongPhase);
        }
        let player = self.player(id).ok_or(GameError::NotInGame)?;
        let role = self.roles.get(&id).copied().ok_or(GameError::NotInGame)?;

        Ok(RoleNotice {
            player: player.clone(),
            role,
            faction: role.faction(),
        })
    }

    /// Build the status snapshot.
    pub fn status(&self) -> StatusReport {
        let votes = (self.phase == Phase::Voting).then(|| {
            self.votes
                .iter()
                .filter_map(|(id, votes)| {
                    self.player(*id).map(|p| VoteEntry { player: p.clone(), votes: *votes })
                })
                .collect::<Vec<_>>()
        });

        StatusReport {
            chat_id: self.chat_id,
            phase: self.phase,
            day: self.day,
            total_players: self.players.len(),
            alive: self.alive_players().cloned().collect(),
            votes,
            last_night: self
                .last_night
                .as_ref()
                .map(|n| n.events.clone())
                .unwrap_or_default(),
        }
    }

    /// Every joined player with an alive flag. All alive while waiting.
    pub fn roster(&self) -> Vec<RosterEntry> {
        self.players
            .iter()
            .map(|p| RosterEntry {
                player: p.clone(),
                alive: self.phase == Phase::Waiting || self.is_alive(p.id),
            })
            .collect()
    }

    /// Look up a joined player.
    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    /// Living players in join order.
    pub fn alive_players(&self) -> impl Iterator<Item = &Player> {
        self.players.iter().filter(|p| self.alive.contains(&p.id))
    }

    /// Has this id joined?
    pub fn is_participant(&self, id: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == id)
    }

    /// Is this player alive?
    pub fn is_alive(&self, id: PlayerId) -> bool {
        self.alive.contains(&id)
    }

    /// Assigned role, if any.
    pub fn role(&self, id: PlayerId) -> Option<Role> {
        self.roles.get(&id).copied()
    }

    /// Unique game id.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Hosting chat.
    pub fn chat_id(&self) -> ChatId {
        self.chat_id
    }

    /// Creator.
    pub fn creator(&self) -> PlayerId {
        self.creator
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Day counter.
    pub fn day(&self) -> u32 {
        self.day
    }

    /// Number of joined players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Number of living players.
    pub fn alive_count(&self) -> usize {
        self.alive.len()
    }

    /// Actions submitted so far tonight.
    pub fn pending_actions(&self) -> &[NightAction] {
        &self.night_actions
    }

    /// Current voting tally.
    pub fn votes(&self) -> &BTreeMap<PlayerId, u32> {
        &self.votes
    }

    /// Most recent night result.
    pub fn last_night(&self) -> Option<&NightOutcome> {
        self.last_night.as_ref()
    }

    /// Winning faction, once ended.
    pub fn winner(&self) -> Option<Faction> {
        self.winner
    }

    /// Seed driving this game's randomness.
    pub fn rng_seed(&self) -> u64 {
        self.rng_seed
    }

    /// Check if the game has ended.
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, Phase::Ended)
    }

    /// Started session with a fixed role layout. Player `i` (1-based) gets
    /// `roles[i - 1]`; player 1 is the creator. Test fixtures only.
    #[cfg(test)]
    pub(crate) fn fixture(roles: &[Role]) -> Self {
        let mut session = Self::new(ChatId(-1), PlayerId(1), GameConfig::default().with_seed(99));
        for i in 1..=roles.len() {
            session.players.push(Player::new(PlayerId(i as i64), format!("p{i}")));
        }
        session.roles = roles
            .iter()
            .enumerate()
            .map(|(i, r)| (PlayerId(i as i64 + 1), *r))
            .collect();
        session.alive = session.roles.keys().copied().collect();
        session.phase = Phase::Night;
        session
    }
}

// =============================================================================
// TESTS
// =============================================================================
