//! Mafia Hack Game Server
//!
//! Runs the WebSocket server until Ctrl-C, or plays a scripted seeded game
//! with `mafia-hack-server demo [seed]`.

use std::sync::Arc;
use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;

use mafia_hack::{
    VERSION,
    game::{ChatId, Faction, GameConfig, PhaseOutcome, PlayerId},
    network::{GameRegistry, GameServer, ServerConfig},
};

/// Seed used by `demo` when none is given.
const DEFAULT_DEMO_SEED: u64 = 3;

/// Upper bound on demo rounds; every voting round exiles someone.
const DEMO_MAX_ROUNDS: usize = 16;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Mafia Hack Server v{}", VERSION);

    let mut args = std::env::args().skip(1);
    match args.next().as_deref() {
        None => serve().await,
        Some("demo") => {
            let seed = args
                .next()
                .map(|raw| raw.parse::<u64>())
                .transpose()
                .context("demo seed must be an unsigned integer")?
                .unwrap_or(DEFAULT_DEMO_SEED);
            demo_game(seed).await
        }
        Some(other) => bail!("unknown command `{other}` (expected no arguments or `demo [seed]`)"),
    }
}

async fn serve() -> anyhow::Result<()> {
    let server = Arc::new(GameServer::new(ServerConfig::from_env(), GameConfig::from_env()));

    let signal = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.shutdown();
        }
    });

    server.run().await.context("game server failed")?;
    info!("Server stopped");
    Ok(())
}

/// Scripted game: every capable role acts each night, and everyone votes
/// out the first living player other than the creator.
async fn demo_game(seed: u64) -> anyhow::Result<()> {
    info!("=== Starting Demo Game ===");
    info!("RNG Seed: {}", seed);

    let chat = ChatId(-1);
    let creator = PlayerId(1);
    let names = ["alice", "bob", "carol", "dave", "erin", "frank"];

    let registry = GameRegistry::new(GameConfig::default().with_seed(seed));
    let game_id = registry.new_game(chat, creator).await?;
    info!("Game ID: {}", game_id);

    for (i, name) in names.iter().enumerate() {
        registry.join(chat, PlayerId(i as i64 + 1), name).await?;
    }

    let notices = registry.start(chat, creator).await?;
    for notice in &notices {
        info!("{} is the {} ({})", notice.player.name, notice.role, notice.faction);
    }
    let role_of = |id: PlayerId| notices.iter().find(|n| n.player.id == id).map(|n| n.role);

    for round in 1..=DEMO_MAX_ROUNDS {
        // Night
        let alive: Vec<PlayerId> = registry.get_status(chat).await?.alive.iter().map(|p| p.id).collect();
        for &actor in &alive {
            let Some(role) = role_of(actor).filter(|r| r.can_act()) else {
                continue;
            };
            let target = if role.is_mafia() {
                alive.iter().copied().find(|id| role_of(*id).is_some_and(|r| !r.is_mafia()))
            } else {
                alive.iter().copied().find(|id| *id != actor)
            };
            if let Some(target) = target {
                registry.submit_action(chat, actor, target).await?;
            }
        }

        let dawn = registry.advance_phase(chat, creator).await?;
        info!("--- Day {} ---", dawn.day);
        if let PhaseOutcome::Dawn { messages } = &dawn.outcome {
            if messages.is_empty() {
                info!("A quiet night");
            }
            for message in messages {
                info!("{}", message.describe());
            }
        }
        if let Some(winner) = dawn.winner {
            return announce(winner, round);
        }

        // Day, then voting
        registry.advance_phase(chat, creator).await?;
        let alive: Vec<PlayerId> = registry.get_status(chat).await?.alive.iter().map(|p| p.id).collect();
        if let Some(suspect) = alive.iter().copied().find(|id| *id != creator) {
            for &voter in &alive {
                registry.submit_vote(chat, voter, suspect).await?;
            }
        }

        let verdict = registry.advance_phase(chat, creator).await?;
        match &verdict.outcome {
            PhaseOutcome::Exiled { player, role } => info!("{} was exiled; they were the {}", player.name, role),
            _ => info!("Nobody was exiled"),
        }
        if let Some(winner) = verdict.winner {
            return announce(winner, round);
        }
    }

    bail!("demo did not finish within {DEMO_MAX_ROUNDS} rounds")
}

fn announce(winner: Faction, round: usize) -> anyhow::Result<()> {
    info!("=== {} wins after {} round(s) ===", winner, round);
    Ok(())
}
