//! Box color schedule
//!
//! A session hands out boxes in groups of four. The first group is plain
//! colors only; every later group holds exactly one ambiguous color at a
//! random position.

use crate::error::ScheduleError;
use crate::types::BoxColor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Boxes per group
pub const GROUP_SIZE: usize = 4;

/// Ordered colors for one session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSchedule {
    colors: Vec<BoxColor>,
}

impl ColorSchedule {
    /// Generate a schedule of `total` boxes from `rng`
    pub fn generate<R: Rng>(total: usize, rng: &mut R) -> Result<Self, ScheduleError> {
        Self::validate_total(total)?;

        let mut colors = Vec::with_capacity(total);
        for _ in 0..GROUP_SIZE {
            colors.push(random_plain(rng));
        }
        for _ in 1..total / GROUP_SIZE {
            let ambiguous_slot = rng.random_range(0..GROUP_SIZE);
            for slot in 0..GROUP_SIZE {
                let color = if slot == ambiguous_slot {
                    BoxColor::AMBIGUOUS[rng.random_range(0..BoxColor::AMBIGUOUS.len())]
                } else {
                    random_plain(rng)
                };
                colors.push(color);
            }
        }

        tracing::debug!(total, "generated color schedule");
        Ok(Self { colors })
    }

    /// Reproducible schedule from a seed
    pub fn seeded(total: usize, seed: u64) -> Result<Self, ScheduleError> {
        let mut rng = StdRng::seed_from_u64(seed);
        Self::generate(total, &mut rng)
    }

    /// Use an explicit color sequence as-is (replays, fixtures)
    pub fn from_colors(colors: Vec<BoxColor>) -> Result<Self, ScheduleError> {
        if colors.is_empty() {
            return Err(ScheduleError::Empty);
        }
        Ok(Self { colors })
    }

    pub fn validate_total(total: usize) -> Result<(), ScheduleError> {
        if total == 0 || total % GROUP_SIZE != 0 {
            return Err(ScheduleError::InvalidTotal(total));
        }
        Ok(())
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn get(&self, index: usize) -> Option<BoxColor> {
        self.colors.get(index).copied()
    }

    #[must_use]
    pub fn colors(&self) -> &[BoxColor] {
        &self.colors
    }

    /// Consecutive groups of four
    pub fn groups(&self) -> std::slice::Chunks<'_, BoxColor> {
        self.colors.chunks(GROUP_SIZE)
    }
}

fn random_plain<R: Rng>(rng: &mut R) -> BoxColor {
    BoxColor::PLAIN[rng.random_range(0..BoxColor::PLAIN.len())]
}
