//! Win Evaluation

use crate::game::role::{Faction, Role};
use crate::game::state::Session;

/// Decide the winner from the living players' roles.
///
/// No Mafia left means Town wins; Mafia at parity or better wins.
pub fn evaluate_winner<I>(alive_roles: I) -> Option<Faction>
where
    I: IntoIterator<Item = Role>,
{
    let (mafia, town) = alive_roles.into_iter().fold((0usize, 0usize), |(m, t), role| {
        if role.is_mafia() { (m + 1, t) } else { (m, t + 1) }
    });

    if mafia == 0 {
        Some(Faction::Town)
    } else if mafia >= town {
        Some(Faction::Mafia)
    } else {
        None
    }
}

/// Evaluate a started session.
pub fn check_win(session: &Session) -> Option<Faction> {
    evaluate_winner(session.alive.iter().filter_map(|id| session.role(*id)))
}
