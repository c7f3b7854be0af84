//! WebSocket Game Server
//!
//! Async WebSocket server in front of the [`GameRegistry`].
//! Handles authentication, chat subscriptions and message routing.
//!
//! A connection binds to one player with `hello`. When an auth key is
//! configured the `hello` must carry a host-issued token for that player.
//! A player id is bound to at most one live connection.

use std::collections::{BTreeMap, BTreeSet};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock, broadcast};
use tokio_tungstenite::{accept_async, tungstenite::Message};
use futures_util::{SinkExt, StreamExt};
use tracing::{info, warn, error, debug, instrument};

use crate::game::error::GameError;
use crate::game::state::{ChatId, GameConfig, Player, PlayerId, RoleNotice};
use crate::network::auth::{authenticate, AuthConfig};
use crate::network::protocol::{ClientMessage, ErrorCode, ServerError, ServerMessage};
use crate::network::registry::GameRegistry;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address.
    pub bind_addr: SocketAddr,
    /// Maximum concurrent connections.
    pub max_connections: usize,
    /// Server version string.
    pub version: String,
    /// Token verification settings.
    pub auth: AuthConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            max_connections: 1000,
            version: env!("CARGO_PKG_VERSION").to_string(),
            auth: AuthConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Create config from environment variables.
    ///
    /// - `MAFIA_BIND_ADDR`: listen address (default `0.0.0.0:8080`)
    /// - `MAFIA_MAX_CONNECTIONS`: connection cap (default 1000)
    /// - `MAFIA_AUTH_*`: see [`AuthConfig::from_env`]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let bind_addr = match std::env::var("MAFIA_BIND_ADDR") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                warn!(value = %raw, "invalid MAFIA_BIND_ADDR, using default");
                defaults.bind_addr
            }),
            Err(_) => defaults.bind_addr,
        };

        let max_connections = std::env::var("MAFIA_MAX_CONNECTIONS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_connections);

        Self {
            bind_addr,
            max_connections,
            version: defaults.version,
            auth: AuthConfig::from_env(),
        }
    }
}

/// Game server errors.
#[derive(Debug, thiserror::Error)]
pub enum GameServerError {
    /// Failed to bind to address.
    #[error("Failed to bind: {0}")]
    BindFailed(#[from] std::io::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
}

/// Connected client state.
struct ConnectedClient {
    /// Identity from `hello`.
    player: Option<Player>,
    /// Chats whose broadcasts this connection receives.
    chats: BTreeSet<ChatId>,
    /// Message sender (for direct messaging to client).
    sender: mpsc::Sender<ServerMessage>,
}

impl ConnectedClient {
    fn new(sender: mpsc::Sender<ServerMessage>) -> Self {
        Self {
            player: None,
            chats: BTreeSet::new(),
            sender,
        }
    }
}

type Clients = Arc<RwLock<BTreeMap<SocketAddr, ConnectedClient>>>;

/// The game server.
pub struct GameServer {
    /// Server configuration.
    config: ServerConfig,
    /// Live games.
    registry: Arc<GameRegistry>,
    /// Connected clients.
    clients: Clients,
    /// Shutdown signal.
    shutdown_tx: broadcast::Sender<()>,
}

impl GameServer {
    /// Create a new game server.
    pub fn new(config: ServerConfig, game_config: GameConfig) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            registry: Arc::new(GameRegistry::new(game_config)),
            clients: Arc::new(RwLock::new(BTreeMap::new())),
            shutdown_tx,
        }
    }

    /// The registry behind this server.
    pub fn registry(&self) -> &Arc<GameRegistry> {
        &self.registry
    }

    /// Run the server.
    #[instrument(skip(self))]
    pub async fn run(&self) -> Result<(), GameServerError> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!("Game server listening on {}", self.config.bind_addr);
        if !self.config.auth.is_configured() {
            warn!("No auth key configured, hello identities are not verified");
        }

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        loop {
            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, addr)) => {
                            let clients_count = self.clients.read().await.len();
                            if clients_count >= self.config.max_connections {
                                warn!("Connection limit reached, rejecting {}", addr);
                                continue;
                            }

                            info!("New connection from {}", addr);
                            self.handle_connection(stream, addr);
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                        }
                    }
                }
                _ = shutdown_rx.recv() => {
                    info!("Shutdown signal received");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a new WebSocket connection.
    fn handle_connection(&self, stream: TcpStream, addr: SocketAddr) {
        let router = self.router();
        let mut shutdown_rx = self.shutdown_tx.subscribe();

        tokio::spawn(async move {
            let ws_stream = match accept_async(stream).await {
                Ok(ws) => ws,
                Err(e) => {
                    error!("WebSocket handshake failed for {}: {}", addr, e);
                    return;
                }
            };

            let (mut ws_sender, mut ws_receiver) = ws_stream.split();
            let (msg_tx, mut msg_rx) = mpsc::channel::<ServerMessage>(64);

            router.register(addr, msg_tx.clone()).await;

            // Spawn message sender task
            let sender_task = tokio::spawn(async move {
                while let Some(msg) = msg_rx.recv().await {
                    let text = match msg.to_json() {
                        Ok(t) => t,
                        Err(e) => {
                            error!("Failed to serialize message: {}", e);
                            continue;
                        }
                    };
                    if ws_sender.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
            });

            // Handle incoming messages
            loop {
                tokio::select! {
                    msg = ws_receiver.next() => {
                        match msg {
                            Some(Ok(Message::Text(text))) => {
                                match ClientMessage::from_json(&text) {
                                    Ok(client_msg) => router.handle(addr, client_msg, &msg_tx).await,
                                    Err(e) => {
                                        debug!("Invalid message from {}: {}", addr, e);
                                        let _ = msg_tx
                                            .send(ServerMessage::error(ErrorCode::InvalidInput, "Invalid message format"))
                                            .await;
                                    }
                                }
                            }
                            Some(Ok(Message::Binary(_))) => {
                                let _ = msg_tx
                                    .send(ServerMessage::error(ErrorCode::InvalidInput, "Binary frames are not supported"))
                                    .await;
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                debug!("Client {} disconnected", addr);
                                break;
                            }
                            Some(Err(e)) => {
                                error!("WebSocket error for {}: {}", addr, e);
                                break;
                            }
                            _ => {}
                        }
                    }
                    _ = shutdown_rx.recv() => {
                        let _ = msg_tx.send(ServerMessage::Shutdown {
                            reason: "Server shutting down".to_string(),
                        }).await;
                        break;
                    }
                }
            }

            // Cleanup
            sender_task.abort();
            router.unregister(addr).await;
            info!("Client {} cleaned up", addr);
        });
    }

    fn router(&self) -> Router {
        Router {
            registry: self.registry.clone(),
            clients: self.clients.clone(),
            version: self.config.version.clone(),
            auth: Arc::new(self.config.auth.clone()),
        }
    }

    /// Shutdown the server.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Get active connection count.
    pub async fn connection_count(&self) -> usize {
        self.clients.read().await.len()
    }

    /// Get live game count.
    pub async fn game_count(&self) -> usize {
        self.registry.game_count().await
    }
}

// =============================================================================
// ROUTING
// =============================================================================

/// Per-connection view of the shared server state.
#[derive(Clone)]
struct Router {
    registry: Arc<GameRegistry>,
    clients: Clients,
    version: String,
    auth: Arc<AuthConfig>,
}

impl Router {
    async fn register(&self, addr: SocketAddr, sender: mpsc::Sender<ServerMessage>) {
        self.clients.write().await.insert(addr, ConnectedClient::new(sender));
    }

    async fn unregister(&self, addr: SocketAddr) {
        self.clients.write().await.remove(&addr);
    }

    /// Handle a client message.
    async fn handle(&self, addr: SocketAddr, msg: ClientMessage, sender: &mpsc::Sender<ServerMessage>) {
        match msg {
            ClientMessage::Hello { player_id, name, token } => {
                let reply = match self.identify(addr, player_id, name, token.as_deref()).await {
                    Ok(()) => {
                        debug!("Client {} identified as {}", addr, player_id);
                        ServerMessage::Welcome {
                            player_id,
                            server_version: self.version.clone(),
                        }
                    }
                    Err(e) => ServerMessage::Error(e),
                };
                let _ = sender.send(reply).await;
            }
            ClientMessage::Ping { timestamp } => {
                let _ = sender.send(ServerMessage::Pong {
                    timestamp,
                    server_time: SystemTime::now()
                        .duration_since(UNIX_EPOCH)
                        .unwrap_or_default()
                        .as_millis() as u64,
                }).await;
            }
            command => {
                let player = {
                    let clients = self.clients.read().await;
                    clients.get(&addr).and_then(|c| c.player.clone())
                };
                let Some(player) = player else {
                    let _ = sender
                        .send(ServerMessage::error(ErrorCode::NotIdentified, "Send hello first"))
                        .await;
                    return;
                };

                if let Err(e) = self.dispatch(addr, &player, command, sender).await {
                    debug!("Command from {} rejected: {}", player.id, e);
                    let _ = sender.send(ServerMessage::from(e)).await;
                }
            }
        }
    }

    /// Bind the connection to a player.
    async fn identify(
        &self,
        addr: SocketAddr,
        player_id: PlayerId,
        name: String,
        token: Option<&str>,
    ) -> Result<(), ServerError> {
        let player_id = authenticate(&self.auth, player_id, token).map_err(|e| {
            warn!("Authentication failed for {}: {}", addr, e);
            ServerError { code: ErrorCode::Unauthorized, message: e.to_string() }
        })?;

        let mut clients = self.clients.write().await;
        if clients.get(&addr).is_some_and(|c| c.player.is_some()) {
            return Err(ServerError {
                code: ErrorCode::AlreadyIdentified,
                message: "Connection already identified".to_string(),
            });
        }
        let taken = clients
            .iter()
            .any(|(other, c)| *other != addr && c.player.as_ref().is_some_and(|p| p.id == player_id));
        if taken {
            warn!("Client {} tried to bind {}, already connected elsewhere", addr, player_id);
            return Err(ServerError {
                code: ErrorCode::IdentityInUse,
                message: "Player is connected elsewhere".to_string(),
            });
        }

        if let Some(client) = clients.get_mut(&addr) {
            client.player = Some(Player::new(player_id, name));
        }
        Ok(())
    }

    /// Run a game command for an identified player.
    async fn dispatch(
        &self,
        addr: SocketAddr,
        player: &Player,
        msg: ClientMessage,
        sender: &mpsc::Sender<ServerMessage>,
    ) -> Result<(), GameError> {
        let reply = match msg {
            ClientMessage::NewGame { chat_id } => {
                let game_id = self.registry.new_game(chat_id, player.id).await?;
                self.subscribe(addr, chat_id).await;
                ServerMessage::GameCreated { chat_id, game_id, creator: player.id }
            }
            ClientMessage::Join { chat_id } => {
                let count = self.registry.join(chat_id, player.id, &player.name).await?;
                self.subscribe(addr, chat_id).await;
                self.broadcast(chat_id, ServerMessage::Joined { chat_id, player: player.clone(), count }).await;
                return Ok(());
            }
            ClientMessage::Start { chat_id } => {
                let notices = self.registry.start(chat_id, player.id).await?;
                let players = notices.iter().map(|n| n.player.clone()).collect();
                self.broadcast(chat_id, ServerMessage::GameStarted { chat_id, players, day: 1 }).await;
                self.deliver_roles(chat_id, &notices).await;
                return Ok(());
            }
            ClientMessage::Action { chat_id, target } => {
                self.registry.submit_action(chat_id, player.id, target).await?;
                ServerMessage::ActionAccepted { chat_id }
            }
            ClientMessage::Vote { chat_id, target } => {
                let votes = self.registry.submit_vote(chat_id, player.id, target).await?;
                ServerMessage::VoteAccepted { chat_id, target, votes }
            }
            ClientMessage::NextPhase { chat_id } => {
                let report = self.registry.advance_phase(chat_id, player.id).await?;
                let ended = report.winner.is_some();
                self.broadcast(chat_id, ServerMessage::PhaseChanged { chat_id, report }).await;
                if ended {
                    self.unsubscribe_all(chat_id).await;
                }
                return Ok(());
            }
            ClientMessage::Status { chat_id } => {
                ServerMessage::Status(self.registry.get_status(chat_id).await?)
            }
            ClientMessage::Role { chat_id } => {
                let notice = self.registry.get_role(chat_id, player.id).await?;
                ServerMessage::Role { chat_id, role: notice.role, faction: notice.faction }
            }
            ClientMessage::Players { chat_id } => {
                ServerMessage::Players { chat_id, players: self.registry.roster(chat_id).await? }
            }
            ClientMessage::Hello { .. } | ClientMessage::Ping { .. } => return Ok(()),
        };

        let _ = sender.send(reply).await;
        Ok(())
    }

    async fn subscribe(&self, addr: SocketAddr, chat_id: ChatId) {
        let mut clients = self.clients.write().await;
        if let Some(client) = clients.get_mut(&addr) {
            client.chats.insert(chat_id);
        }
    }

    async fn unsubscribe_all(&self, chat_id: ChatId) {
        let mut clients = self.clients.write().await;
        for client in clients.values_mut() {
            client.chats.remove(&chat_id);
        }
    }

    /// Send to every connection subscribed to the chat.
    async fn broadcast(&self, chat_id: ChatId, msg: ServerMessage) {
        let senders: Vec<mpsc::Sender<ServerMessage>> = {
            let clients = self.clients.read().await;
            clients
                .values()
                .filter(|c| c.chats.contains(&chat_id))
                .map(|c| c.sender.clone())
                .collect()
        };

        for sender in senders {
            let _ = sender.send(msg.clone()).await;
        }
    }

    /// Best-effort private role delivery. Failures never affect the game.
    async fn deliver_roles(&self, chat_id: ChatId, notices: &[RoleNotice]) {
        let senders: BTreeMap<PlayerId, mpsc::Sender<ServerMessage>> = {
            let clients = self.clients.read().await;
            clients
                .values()
                .filter_map(|c| c.player.as_ref().map(|p| (p.id, c.sender.clone())))
                .collect()
        };

        for notice in notices {
            let Some(sender) = senders.get(&notice.player.id) else {
                warn!(%chat_id, player = %notice.player.id, "no connection for role delivery");
                continue;
            };
            if sender.send(ServerMessage::your_role(chat_id, notice)).await.is_err() {
                warn!(%chat_id, player = %notice.player.id, "role delivery failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::role::Faction;

    const CHAT: ChatId = ChatId(-42);

    struct TestClient {
        addr: SocketAddr,
        tx: mpsc::Sender<ServerMessage>,
        rx: mpsc::Receiver<ServerMessage>,
    }

    impl TestClient {
        async fn connect(router: &Router, port: u16) -> Self {
            let addr = SocketAddr::from(([127, 0, 0, 1], port));
            let (tx, rx) = mpsc::channel(64);
            router.register(addr, tx.clone()).await;
            Self { addr, tx, rx }
        }

        async fn send(&self, router: &Router, msg: ClientMessage) {
            router.handle(self.addr, msg, &self.tx).await;
        }

        fn drain(&mut self) -> Vec<ServerMessage> {
            let mut out = Vec::new();
            while let Ok(msg) = self.rx.try_recv() {
                out.push(msg);
            }
            out
        }
    }

    fn router_with(auth: AuthConfig) -> Router {
        let server = GameServer::new(
            ServerConfig {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
                auth,
                ..Default::default()
            },
            GameConfig::default().with_seed(2024),
        );
        server.router()
    }

    fn test_router() -> Router {
        router_with(AuthConfig::default())
    }

    fn error_code(msgs: &[ServerMessage]) -> Option<ErrorCode> {
        match msgs {
            [ServerMessage::Error(e)] => Some(e.code),
            _ => None,
        }
    }

    async fn identified(router: &Router, id: i64) -> TestClient {
        let mut client = TestClient::connect(router, 10_000 + id as u16).await;
        client
            .send(router, ClientMessage::Hello { player_id: PlayerId(id), name: format!("p{id}"), token: None })
            .await;
        client.drain();
        client
    }

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();
        assert_eq!(config.max_connections, 1000);
        assert_eq!(config.bind_addr.port(), 8080);
    }

    #[tokio::test]
    async fn test_server_creation() {
        let server = GameServer::new(
            ServerConfig {
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
                ..Default::default()
            },
            GameConfig::default(),
        );

        assert_eq!(server.connection_count().await, 0);
        assert_eq!(server.game_count().await, 0);
        server.shutdown();
    }

    #[tokio::test]
    async fn test_hello_required() {
        let router = test_router();
        let mut client = TestClient::connect(&router, 9000).await;

        client.send(&router, ClientMessage::NewGame { chat_id: CHAT }).await;
        match client.drain().as_slice() {
            [ServerMessage::Error(e)] => assert_eq!(e.code, ErrorCode::NotIdentified),
            other => panic!("unexpected {other:?}"),
        }

        client
            .send(&router, ClientMessage::Hello { player_id: PlayerId(1), name: "ann".into(), token: None })
            .await;
        assert!(matches!(client.drain().as_slice(), [ServerMessage::Welcome { player_id: PlayerId(1), .. }]));
    }

    #[tokio::test]
    async fn test_ping() {
        let router = test_router();
        let mut client = TestClient::connect(&router, 9001).await;
        client.send(&router, ClientMessage::Ping { timestamp: 77 }).await;
        assert!(matches!(client.drain().as_slice(), [ServerMessage::Pong { timestamp: 77, .. }]));
    }

    #[tokio::test]
    async fn test_game_errors_are_reported() {
        let router = test_router();
        let mut client = identified(&router, 1).await;

        client.send(&router, ClientMessage::Join { chat_id: CHAT }).await;
        match client.drain().as_slice() {
            [ServerMessage::Error(e)] => assert_eq!(e.code, ErrorCode::NoGame),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_lobby_broadcasts_and_private_roles() {
        let router = test_router();
        let mut clients = Vec::new();
        for id in 1..=4 {
            clients.push(identified(&router, id).await);
        }

        clients[0].send(&router, ClientMessage::NewGame { chat_id: CHAT }).await;
        assert!(matches!(clients[0].drain().as_slice(), [ServerMessage::GameCreated { creator: PlayerId(1), .. }]));

        for i in 0..4 {
            clients[i].send(&router, ClientMessage::Join { chat_id: CHAT }).await;
        }

        // Creator saw every join; the last joiner only its own
        let creator_joins = clients[0]
            .drain()
            .into_iter()
            .filter(|m| matches!(m, ServerMessage::Joined { .. }))
            .count();
        assert_eq!(creator_joins, 4);
        assert!(matches!(clients[3].drain().as_slice(), [ServerMessage::Joined { count: 4, .. }]));
        clients[1].drain();
        clients[2].drain();

        clients[0].send(&router, ClientMessage::Start { chat_id: CHAT }).await;

        let mut mafia = 0;
        for client in clients.iter_mut() {
            let msgs = client.drain();
            assert!(matches!(msgs[0], ServerMessage::GameStarted { day: 1, .. }));
            let roles: Vec<_> = msgs
                .iter()
                .filter_map(|m| match m {
                    ServerMessage::YourRole { faction, .. } => Some(*faction),
                    _ => None,
                })
                .collect();
            assert_eq!(roles.len(), 1, "exactly one private role per player");
            if roles[0] == Faction::Mafia {
                mafia += 1;
            }
        }
        assert_eq!(mafia, 1);
    }

    #[tokio::test]
    async fn test_next_phase_broadcast() {
        let router = test_router();
        let mut clients = Vec::new();
        for id in 1..=4 {
            clients.push(identified(&router, id).await);
        }
        clients[0].send(&router, ClientMessage::NewGame { chat_id: CHAT }).await;
        for i in 0..4 {
            clients[i].send(&router, ClientMessage::Join { chat_id: CHAT }).await;
        }
        clients[0].send(&router, ClientMessage::Start { chat_id: CHAT }).await;
        for client in clients.iter_mut() {
            client.drain();
        }

        clients[1].send(&router, ClientMessage::NextPhase { chat_id: CHAT }).await;
        match clients[1].drain().as_slice() {
            [ServerMessage::Error(e)] => assert_eq!(e.code, ErrorCode::NotCreator),
            other => panic!("unexpected {other:?}"),
        }

        clients[0].send(&router, ClientMessage::NextPhase { chat_id: CHAT }).await;
        for client in clients.iter_mut() {
            assert!(matches!(client.drain().as_slice(), [ServerMessage::PhaseChanged { .. }]));
        }
    }

    #[tokio::test]
    async fn test_role_delivery_skips_missing_connection() {
        let router = test_router();
        let mut creator = identified(&router, 1).await;
        creator.send(&router, ClientMessage::NewGame { chat_id: CHAT }).await;
        creator.send(&router, ClientMessage::Join { chat_id: CHAT }).await;

        // Three players join and then drop their connections
        for id in 2..=4 {
            let client = identified(&router, id).await;
            client.send(&router, ClientMessage::Join { chat_id: CHAT }).await;
            router.unregister(client.addr).await;
        }
        creator.drain();

        creator.send(&router, ClientMessage::Start { chat_id: CHAT }).await;
        let msgs = creator.drain();
        assert!(matches!(msgs[0], ServerMessage::GameStarted { .. }));
        assert!(matches!(msgs[1], ServerMessage::YourRole { .. }));
        assert_eq!(msgs.len(), 2);
    }

    #[tokio::test]
    async fn test_hello_cannot_take_a_bound_identity() {
        let router = test_router();
        let mut clients = Vec::new();
        for id in 1..=4 {
            clients.push(identified(&router, id).await);
        }
        clients[0].send(&router, ClientMessage::NewGame { chat_id: CHAT }).await;
        for client in &clients {
            client.send(&router, ClientMessage::Join { chat_id: CHAT }).await;
        }
        clients[0].send(&router, ClientMessage::Start { chat_id: CHAT }).await;

        // Another socket claims a seated player and asks for their role
        let mut outsider = TestClient::connect(&router, 9100).await;
        outsider
            .send(&router, ClientMessage::Hello { player_id: PlayerId(2), name: "spy".into(), token: None })
            .await;
        assert_eq!(error_code(&outsider.drain()), Some(ErrorCode::IdentityInUse));

        outsider.send(&router, ClientMessage::Role { chat_id: CHAT }).await;
        assert_eq!(error_code(&outsider.drain()), Some(ErrorCode::NotIdentified));

        // Once identified as itself, it cannot switch to the creator
        outsider
            .send(&router, ClientMessage::Hello { player_id: PlayerId(9), name: "spy".into(), token: None })
            .await;
        assert!(matches!(outsider.drain().as_slice(), [ServerMessage::Welcome { player_id: PlayerId(9), .. }]));

        outsider
            .send(&router, ClientMessage::Hello { player_id: PlayerId(1), name: "spy".into(), token: None })
            .await;
        assert_eq!(error_code(&outsider.drain()), Some(ErrorCode::AlreadyIdentified));

        outsider.send(&router, ClientMessage::NextPhase { chat_id: CHAT }).await;
        assert_eq!(error_code(&outsider.drain()), Some(ErrorCode::NotCreator));

        outsider.send(&router, ClientMessage::Role { chat_id: CHAT }).await;
        assert_eq!(error_code(&outsider.drain()), Some(ErrorCode::NotInGame));
    }

    #[tokio::test]
    async fn test_identity_freed_on_disconnect() {
        let router = test_router();
        let first = identified(&router, 3).await;
        router.unregister(first.addr).await;

        let mut second = TestClient::connect(&router, 9200).await;
        second
            .send(&router, ClientMessage::Hello { player_id: PlayerId(3), name: "p3".into(), token: None })
            .await;
        assert!(matches!(second.drain().as_slice(), [ServerMessage::Welcome { player_id: PlayerId(3), .. }]));
    }

    #[tokio::test]
    async fn test_hello_requires_token_when_configured() {
        use crate::network::auth::tests::{secret_config, token_for, SECRET};

        let router = router_with(secret_config());
        let mut client = TestClient::connect(&router, 9300).await;

        client
            .send(&router, ClientMessage::Hello { player_id: PlayerId(5), name: "eve".into(), token: None })
            .await;
        assert_eq!(error_code(&client.drain()), Some(ErrorCode::Unauthorized));

        // A valid token for someone else does not help
        client
            .send(&router, ClientMessage::Hello {
                player_id: PlayerId(1),
                name: "eve".into(),
                token: Some(token_for("5", SECRET)),
            })
            .await;
        assert_eq!(error_code(&client.drain()), Some(ErrorCode::Unauthorized));

        client
            .send(&router, ClientMessage::Hello {
                player_id: PlayerId(5),
                name: "eve".into(),
                token: Some(token_for("5", "not-the-server-secret-at-all!!!")),
            })
            .await;
        assert_eq!(error_code(&client.drain()), Some(ErrorCode::Unauthorized));

        client
            .send(&router, ClientMessage::Hello {
                player_id: PlayerId(5),
                name: "eve".into(),
                token: Some(token_for("5", SECRET)),
            })
            .await;
        assert!(matches!(client.drain().as_slice(), [ServerMessage::Welcome { player_id: PlayerId(5), .. }]));
    }
}
