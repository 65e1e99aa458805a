//! Chamber generation: the randomized live/blank sequence for one round.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use ricochet_protocol::Shell;

/// Smallest chamber the generator will produce.
pub const MIN_SHELLS: usize = 2;
/// Largest chamber the generator will produce.
pub const MAX_SHELLS: usize = 8;

/// The ordered, server-held shell sequence for one round.
///
/// `next` is the position of the next shell to be fired. The derived
/// counters always satisfy `live + blank == shells.len() - next` — they
/// are what gets announced to players, so they must track consumption
/// exactly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chamber {
    shells: Vec<Shell>,
    next: usize,
    live: u32,
    blank: u32,
}

impl Chamber {
    /// Loads a fresh chamber.
    ///
    /// Total shell count is uniform in `[MIN_SHELLS, MAX_SHELLS]`; half of
    /// them (rounded down, never fewer than one) are live. The ordering is
    /// an unbiased permutation, so every arrangement is equally likely.
    /// Given a seeded `rng` the result is reproducible.
    pub fn generate(rng: &mut impl Rng) -> Self {
        let total = rng.random_range(MIN_SHELLS..=MAX_SHELLS);
        let live = (total / 2).max(1);
        let blank = total - live;

        let mut shells = Vec::with_capacity(total);
        shells.extend(std::iter::repeat_n(Shell::Live, live));
        shells.extend(std::iter::repeat_n(Shell::Blank, blank));
        shells.shuffle(rng);

        Self {
            shells,
            next: 0,
            live: live as u32,
            blank: blank as u32,
        }
    }

    /// Builds a chamber from an explicit sequence. Test hook for scripted
    /// scenarios; production chambers come from [`Chamber::generate`].
    pub fn from_shells(shells: Vec<Shell>) -> Self {
        let live = shells.iter().filter(|s| **s == Shell::Live).count() as u32;
        let blank = shells.len() as u32 - live;
        Self {
            shells,
            next: 0,
            live,
            blank,
        }
    }

    /// Consumes and returns the next shell, or `None` if the chamber is
    /// spent.
    pub fn pop(&mut self) -> Option<Shell> {
        let shell = self.shells.get(self.next).copied()?;
        self.next += 1;
        match shell {
            Shell::Live => self.live -= 1,
            Shell::Blank => self.blank -= 1,
        }
        Some(shell)
    }

    /// Returns the next shell without consuming it (magnifying glass).
    pub fn peek(&self) -> Option<Shell> {
        self.shells.get(self.next).copied()
    }

    /// `true` once every shell has been consumed.
    pub fn is_spent(&self) -> bool {
        self.next >= self.shells.len()
    }

    /// Unconsumed live shells.
    pub fn live_remaining(&self) -> u32 {
        self.live
    }

    /// Unconsumed blank shells.
    pub fn blank_remaining(&self) -> u32 {
        self.blank
    }

    /// Total shells loaded at generation time.
    pub fn total(&self) -> usize {
        self.shells.len()
    }
}
