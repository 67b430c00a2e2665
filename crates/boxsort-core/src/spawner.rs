//! Box spawner
//!
//! Walks the cached color schedule and hands out monotonically increasing
//! ids. The coordinator records spawn times and emits the spawn command.

use crate::schedule::ColorSchedule;
use crate::types::{BoxColor, BoxId};

#[derive(Debug, Clone)]
pub struct BoxSpawner {
    schedule: ColorSchedule,
    next_index: usize,
}

impl BoxSpawner {
    #[must_use]
    pub fn new(schedule: ColorSchedule) -> Self {
        Self {
            schedule,
            next_index: 0,
        }
    }

    /// Next box in the schedule, or `None` once every box was spawned
    pub fn spawn_next(&mut self) -> Option<(BoxId, BoxColor)> {
        let color = self.schedule.get(self.next_index)?;
        let id = BoxId(u32::try_from(self.next_index).ok()?);
        self.next_index += 1;
        tracing::debug!(box_id = %id, %color, "spawning box");
        Some((id, color))
    }

    #[must_use]
    pub fn all_spawned(&self) -> bool {
        self.next_index >= self.schedule.len()
    }

    #[must_use]
    pub fn spawned_count(&self) -> usize {
        self.next_index
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.schedule.len().saturating_sub(self.next_index)
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.schedule.len()
    }

    #[must_use]
    pub fn schedule(&self) -> &ColorSchedule {
        &self.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawns_in_schedule_order_then_stops() {
        let schedule =
            ColorSchedule::from_colors(vec![BoxColor::Red, BoxColor::AmbiguousPink]).unwrap();
        let mut spawner = BoxSpawner::new(schedule);

        assert_eq!(spawner.spawn_next(), Some((BoxId(0), BoxColor::Red)));
        assert!(!spawner.all_spawned());
        assert_eq!(
            spawner.spawn_next(),
            Some((BoxId(1), BoxColor::AmbiguousPink))
        );
        assert!(spawner.all_spawned());
        assert_eq!(spawner.spawn_next(), None);
        assert_eq!(spawner.spawned_count(), 2);
        assert_eq!(spawner.remaining(), 0);
    }
}
