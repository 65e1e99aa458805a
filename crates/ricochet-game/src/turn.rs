//! Turn scheduling over the seating ring.
//!
//! The ring is the seat-ordered combatant list; dead players stay seated
//! but are never selected. Handcuff skips are resolved iteratively with a
//! hard cap at the alive count, so the scheduler terminates even when
//! every remaining player is cuffed.

use ricochet_protocol::PlayerId;

use crate::player::Combatant;

/// Result of advancing the turn: who goes next, and which cuffed players
/// were skipped (their cuffs are consumed as a side effect).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub next: PlayerId,
    pub skipped: Vec<PlayerId>,
}

fn index_of(combatants: &[Combatant], id: PlayerId) -> Option<usize> {
    combatants.iter().position(|c| c.id == id)
}

pub(crate) fn alive_count(combatants: &[Combatant]) -> usize {
    combatants.iter().filter(|c| c.alive).count()
}

/// The next *alive* player after `from` in ring order, ignoring handcuffs.
///
/// This is the direct successor lookup used both as the scheduler's
/// starting point and as the handcuff item's target. Returns `from`
/// itself when nobody else is alive.
pub fn ring_successor(combatants: &[Combatant], from: PlayerId) -> PlayerId {
    let len = combatants.len();
    let start = index_of(combatants, from).unwrap_or(0);
    for step in 1..=len {
        let candidate = &combatants[(start + step) % len];
        if candidate.alive {
            return candidate.id;
        }
    }
    from
}

/// Advances the turn from `current`, consuming handcuffs along the way.
///
/// A cuffed successor is skipped (cuff cleared) and the walk continues to
/// *their* successor, at most `alive_count` times. If every candidate was
/// cuffed the walk falls back to the first successor found rather than
/// looping forever.
pub fn next_turn(combatants: &mut [Combatant], current: PlayerId) -> TurnOutcome {
    let cap = alive_count(combatants);
    let first = ring_successor(combatants, current);

    let mut candidate = first;
    let mut skipped = Vec::new();
    for _ in 0..cap {
        let Some(idx) = index_of(combatants, candidate) else {
            break;
        };
        if combatants[idx].handcuffed {
            combatants[idx].handcuffed = false;
            skipped.push(candidate);
            candidate = ring_successor(combatants, candidate);
        } else {
            break;
        }
    }

    // Every alive player was cuffed — all cuffs are now consumed, so the
    // first successor simply takes the turn.
    if skipped.len() >= cap {
        candidate = first;
    }

    TurnOutcome {
        next: candidate,
        skipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ricochet_protocol::Seat;

    fn ring(n: u64) -> Vec<Combatant> {
        (0..n)
            .map(|i| {
                Combatant::new(
                    PlayerId(i + 1),
                    format!("p{}", i + 1),
                    Seat(i as usize),
                    4,
                )
            })
            .collect()
    }

    #[test]
    fn test_successor_walks_the_ring() {
        let combatants = ring(3);
        assert_eq!(ring_successor(&combatants, PlayerId(1)), PlayerId(2));
        assert_eq!(ring_successor(&combatants, PlayerId(3)), PlayerId(1));
    }

    #[test]
    fn test_successor_skips_dead_players() {
        let mut combatants = ring(3);
        combatants[1].alive = false;
        assert_eq!(ring_successor(&combatants, PlayerId(1)), PlayerId(3));
    }

    #[test]
    fn test_cuffed_successor_is_skipped_and_uncuffed() {
        // A, B(cuffed), C: advancing from A lands on C and clears B's cuff.
        let mut combatants = ring(3);
        combatants[1].handcuffed = true;

        let outcome = next_turn(&mut combatants, PlayerId(1));
        assert_eq!(outcome.next, PlayerId(3));
        assert_eq!(outcome.skipped, vec![PlayerId(2)]);
        assert!(!combatants[1].handcuffed);
    }

    #[test]
    fn test_chained_cuffs_consume_in_order() {
        let mut combatants = ring(4);
        combatants[1].handcuffed = true;
        combatants[2].handcuffed = true;

        let outcome = next_turn(&mut combatants, PlayerId(1));
        assert_eq!(outcome.next, PlayerId(4));
        assert_eq!(outcome.skipped, vec![PlayerId(2), PlayerId(3)]);
    }

    #[test]
    fn test_all_cuffed_terminates_and_falls_back() {
        // Everyone cuffed: must not loop forever; first successor takes
        // the turn with all cuffs consumed.
        let mut combatants = ring(3);
        for c in combatants.iter_mut() {
            c.handcuffed = true;
        }

        let outcome = next_turn(&mut combatants, PlayerId(1));
        assert_eq!(outcome.next, PlayerId(2));
        assert_eq!(outcome.skipped.len(), 3);
        assert!(combatants.iter().all(|c| !c.handcuffed));
    }

    #[test]
    fn test_two_players_both_cuffed() {
        let mut combatants = ring(2);
        combatants[0].handcuffed = true;
        combatants[1].handcuffed = true;

        let outcome = next_turn(&mut combatants, PlayerId(1));
        assert_eq!(outcome.next, PlayerId(2));
        assert!(combatants.iter().all(|c| !c.handcuffed));
    }

    #[test]
    fn test_never_selects_dead_player() {
        let mut combatants = ring(4);
        combatants[1].alive = false;
        combatants[3].alive = false;

        let outcome = next_turn(&mut combatants, PlayerId(1));
        assert_eq!(outcome.next, PlayerId(3));
    }

    #[test]
    fn test_sole_survivor_is_their_own_successor() {
        let mut combatants = ring(3);
        combatants[1].alive = false;
        combatants[2].alive = false;
        assert_eq!(ring_successor(&combatants, PlayerId(1)), PlayerId(1));
    }
}
