//! Experience and leveling.
//!
//! One reward unit is simultaneously one token and one XP. XP carries over
//! between levels: the requirement for the next level is
//! `100 + 50 * (level - 1)`.

use serde::{Deserialize, Serialize};

/// XP needed to leave level 1.
pub const BASE_XP_TO_NEXT_LEVEL: u64 = 100;

/// Additional XP needed per level after the first.
pub const XP_STEP_PER_LEVEL: u64 = 50;

/// XP needed to advance from `level` to `level + 1`.
#[must_use]
pub fn xp_to_next_level(level: u32) -> u64 {
    let steps = u64::from(level.saturating_sub(1));
    BASE_XP_TO_NEXT_LEVEL.saturating_add(XP_STEP_PER_LEVEL.saturating_mul(steps))
}

/// Level, XP into the level, and the requirement to leave it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Current level (starts at 1).
    pub level: u32,
    /// XP accumulated inside the current level.
    pub xp: u64,
    /// XP required to reach the next level.
    pub xp_to_next_level: u64,
}

impl Default for LevelProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl LevelProgress {
    /// Level 1 with no XP.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            level: 1,
            xp: 0,
            xp_to_next_level: BASE_XP_TO_NEXT_LEVEL,
        }
    }

    /// Awards XP and applies every level-up it pays for.
    ///
    /// Returns the new progress and each level reached, in order. The stored
    /// `xp_to_next_level` is used for the current level so persisted
    /// thresholds are honoured; later thresholds come from
    /// [`xp_to_next_level`].
    #[must_use]
    pub fn award(self, amount: u64) -> (Self, Vec<u32>) {
        let mut level = self.level;
        let mut xp = self.xp.saturating_add(amount);
        let mut threshold = self.xp_to_next_level;
        let mut reached = Vec::new();

        while xp >= threshold {
            level = level.saturating_add(1);
            xp -= threshold;
            threshold = xp_to_next_level(level);
            reached.push(level);
        }

        (
            Self {
                level,
                xp,
                xp_to_next_level: threshold,
            },
            reached,
        )
    }

    /// Fraction of the current level completed, in `0.0..1.0`.
    #[must_use]
    pub fn fraction(&self) -> f64 {
        if self.xp_to_next_level == 0 {
            return 0.0;
        }
        self.xp as f64 / self.xp_to_next_level as f64
    }
}
