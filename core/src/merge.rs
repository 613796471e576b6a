//! Field-wise reconciliation of two divergent saves.
//!
//! The load-bearing rule: accumulable resources take the MAXIMUM of the
//! two sides — a player never loses progress earned on either device —
//! and liabilities take the MINIMUM — a sync never penalizes. Everything
//! else takes the local value. The merged result is never strictly worse
//! than either input for any tracked resource. The cost is permissiveness
//! (duplicated effort across devices can double-count), an accepted
//! tradeoff favoring player trust over strict economy purity.

use crate::state::GameState;
use std::collections::BTreeMap;

/// Merge a local and a remote save into one state.
pub fn merge_states(local: &GameState, remote: &GameState) -> GameState {
    GameState {
        // Accumulable resources: never lose progress from either side.
        balance: local.balance.max(remote.balance),
        sugar: local.sugar.max(remote.sugar),
        prestige_points: local.prestige_points.max(remote.prestige_points),
        prestige_level: local.prestige_level.max(remote.prestige_level),
        momentum_level: local.momentum_level.max(remote.momentum_level),
        inventory: max_union(&local.inventory, &remote.inventory),
        symbol_levels: max_union(&local.symbol_levels, &remote.symbol_levels),
        skill_levels: max_union(&local.skill_levels, &remote.skill_levels),

        // Liabilities: never penalize the player for syncing.
        debt: local.debt.min(remote.debt),

        // Everything else: the local value stands.
        bet_value: local.bet_value,
        total_spins: local.total_spins,
        lifetime_winnings: local.lifetime_winnings,
        scratch_cards: local.scratch_cards.clone(),
        crafting_slots: local.crafting_slots.clone(),
        bakery: local.bakery.clone(),
        daily_streak: local.daily_streak,
        golden_tickets: local.golden_tickets,
        ascension_shards: local.ascension_shards,
        event_tokens: local.event_tokens,
    }
}

/// Per-key maximum over the union of both maps. A key present on only
/// one side keeps that side's value.
fn max_union<V: Ord + Copy>(
    local: &BTreeMap<String, V>,
    remote: &BTreeMap<String, V>,
) -> BTreeMap<String, V> {
    let mut out = local.clone();
    for (key, value) in remote {
        out.entry(key.clone())
            .and_modify(|v| *v = (*v).max(*value))
            .or_insert(*value);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn max_union_takes_per_key_maximum() {
        let mut a = BTreeMap::new();
        a.insert("cherry".to_string(), 4u64);
        a.insert("bell".to_string(), 7u64);
        let mut b = BTreeMap::new();
        b.insert("cherry".to_string(), 9u64);
        b.insert("seven".to_string(), 1u64);

        let merged = max_union(&a, &b);
        assert_eq!(merged["cherry"], 9);
        assert_eq!(merged["bell"], 7);
        assert_eq!(merged["seven"], 1);
    }
}
