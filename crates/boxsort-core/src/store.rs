//! Per-box record store
//!
//! The store is the system of record for the experiment log. Records are
//! kept in spawn order and never removed during a session.

use crate::types::{Area, BoxColor, BoxId, Placement};
use indexmap::IndexMap;
use serde::Serialize;

/// One timestamped placement history entry
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub time: f64,
    pub placement: Placement,
}

/// Timing and placement data for one box
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxRecord {
    id: BoxId,
    color: BoxColor,
    spawn_time: Option<f64>,
    pickup_absolute_time: Option<f64>,
    pickup_time: Option<f64>,
    next_request_time: Option<f64>,
    hesitation_time: Option<f64>,
    was_correct: bool,
    final_placement: Placement,
    history: Vec<HistoryEntry>,
}

impl BoxRecord {
    fn new(id: BoxId, color: BoxColor) -> Self {
        Self {
            id,
            color,
            spawn_time: None,
            pickup_absolute_time: None,
            pickup_time: None,
            next_request_time: None,
            hesitation_time: None,
            was_correct: false,
            final_placement: Placement::Other,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn id(&self) -> BoxId {
        self.id
    }

    #[must_use]
    pub fn color(&self) -> BoxColor {
        self.color
    }

    #[must_use]
    pub fn spawn_time(&self) -> Option<f64> {
        self.spawn_time
    }

    #[must_use]
    pub fn pickup_absolute_time(&self) -> Option<f64> {
        self.pickup_absolute_time
    }

    /// Seconds between the previous next-box request and the first pickup
    #[must_use]
    pub fn pickup_time(&self) -> Option<f64> {
        self.pickup_time
    }

    #[must_use]
    pub fn next_request_time(&self) -> Option<f64> {
        self.next_request_time
    }

    /// Seconds between the first pickup and the following next-box request
    #[must_use]
    pub fn hesitation_time(&self) -> Option<f64> {
        self.hesitation_time
    }

    #[must_use]
    pub fn was_correct(&self) -> bool {
        self.was_correct
    }

    #[must_use]
    pub fn final_placement(&self) -> Placement {
        self.final_placement
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn last_placement(&self) -> Option<Placement> {
        self.history.last().map(|entry| entry.placement)
    }

    #[must_use]
    pub fn is_picked_up(&self) -> bool {
        self.pickup_absolute_time.is_some()
    }

    /// Append a history entry unless it repeats the last tag.
    /// Returns whether an entry was added.
    pub fn record_placement(&mut self, time: f64, placement: Placement) -> bool {
        if self.last_placement() == Some(placement) {
            return false;
        }
        self.history.push(HistoryEntry { time, placement });
        true
    }

    /// Set the final placement only while it is still unresolved
    pub fn set_final_placement_if_default(&mut self, placement: Placement) -> bool {
        if self.final_placement != Placement::Other {
            return false;
        }
        self.final_placement = placement;
        true
    }

    /// Explicit drop into a destructive bin; always overwrites the final placement
    pub fn place_in_bin(&mut self, area: Area, time: f64) -> bool {
        let placement = area.placement();
        self.was_correct = area.accepts(self.color);
        self.final_placement = placement;
        self.record_placement(time, placement);
        self.was_correct
    }

    pub(crate) fn mark_incorrect(&mut self) {
        self.was_correct = false;
    }

    fn set_spawn_time(&mut self, now: f64) -> bool {
        if self.spawn_time.is_some() {
            return false;
        }
        self.spawn_time = Some(now);
        true
    }
}

/// Keyed ledger of box records plus the last next-box request time
#[derive(Debug, Clone, Default)]
pub struct BoxRecordStore {
    records: IndexMap<BoxId, BoxRecord>,
    last_request_time: f64,
}

impl BoxRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a record, creating it on first reference. The color is fixed by
    /// the first call.
    pub fn get_or_create(&mut self, id: BoxId, color: BoxColor) -> &mut BoxRecord {
        self.records
            .entry(id)
            .or_insert_with(|| BoxRecord::new(id, color))
    }

    #[must_use]
    pub fn try_get(&self, id: BoxId) -> Option<&BoxRecord> {
        self.records.get(&id)
    }

    pub fn try_get_mut(&mut self, id: BoxId) -> Option<&mut BoxRecord> {
        self.records.get_mut(&id)
    }

    #[must_use]
    pub fn all(&self) -> &IndexMap<BoxId, BoxRecord> {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxRecord> {
        self.records.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn last_request_time(&self) -> f64 {
        self.last_request_time
    }

    pub fn record_request(&mut self, now: f64) {
        self.last_request_time = now;
    }

    /// Create the record for a freshly spawned box and stamp its spawn time
    pub fn record_spawn(&mut self, id: BoxId, color: BoxColor, now: f64) -> &BoxRecord {
        let record = self.get_or_create(id, color);
        record.set_spawn_time(now);
        record
    }

    /// First pickup only. Unknown ids are skipped.
    pub fn record_pickup(&mut self, id: BoxId, now: f64) -> bool {
        let last_request = self.last_request_time;
        let Some(record) = self.records.get_mut(&id) else {
            tracing::warn!(box_id = %id, "pickup for unknown box ignored");
            return false;
        };
        if record.pickup_absolute_time.is_some() {
            return false;
        }
        record.pickup_absolute_time = Some(now);
        record.pickup_time = Some(now - last_request);
        true
    }

    /// Set `next_request_time` and derive the hesitation, once, after a pickup
    pub fn record_next_request(&mut self, id: BoxId, now: f64) -> bool {
        let Some(record) = self.records.get_mut(&id) else {
            return false;
        };
        derive_hesitation(record, now)
    }

    /// Derive hesitation for every picked-up box still waiting for one
    pub fn derive_pending_hesitations(&mut self, now: f64) -> usize {
        let mut derived = 0;
        for record in self.records.values_mut() {
            if derive_hesitation(record, now) {
                derived += 1;
            }
        }
        derived
    }
}

fn derive_hesitation(record: &mut BoxRecord, now: f64) -> bool {
    let Some(pickup) = record.pickup_absolute_time else {
        return false;
    };
    if record.next_request_time.is_some() {
        return false;
    }
    record.next_request_time = Some(now);
    record.hesitation_time = Some(now - pickup);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_color_wins() {
        let mut store = BoxRecordStore::new();
        store.get_or_create(BoxId(0), BoxColor::Red);
        let record = store.get_or_create(BoxId(0), BoxColor::Blue);
        assert_eq!(record.color(), BoxColor::Red);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn pickup_is_relative_to_last_request() {
        let mut store = BoxRecordStore::new();
        store.record_spawn(BoxId(0), BoxColor::Red, 0.0);
        store.record_request(1.5);
        assert!(store.record_pickup(BoxId(0), 2.0));
        assert!(!store.record_pickup(BoxId(0), 3.0));
        let record = store.try_get(BoxId(0)).unwrap();
        assert_eq!(record.pickup_absolute_time(), Some(2.0));
        assert_eq!(record.pickup_time(), Some(0.5));
    }

    #[test]
    fn pickup_of_unknown_box_is_skipped() {
        let mut store = BoxRecordStore::new();
        assert!(!store.record_pickup(BoxId(9), 1.0));
        assert!(store.is_empty());
    }

    #[test]
    fn hesitation_requires_pickup_and_is_set_once() {
        let mut store = BoxRecordStore::new();
        store.record_spawn(BoxId(0), BoxColor::Green, 0.0);
        store.record_spawn(BoxId(1), BoxColor::Blue, 0.0);
        store.record_pickup(BoxId(0), 2.0);

        assert_eq!(store.derive_pending_hesitations(5.0), 1);
        assert_eq!(store.derive_pending_hesitations(9.0), 0);

        let record = store.try_get(BoxId(0)).unwrap();
        assert_eq!(record.next_request_time(), Some(5.0));
        assert_eq!(record.hesitation_time(), Some(3.0));
        assert_eq!(store.try_get(BoxId(1)).unwrap().hesitation_time(), None);
    }

    #[test]
    fn pending_hesitations_cover_every_picked_up_box() {
        let mut store = BoxRecordStore::new();
        for id in 0..3 {
            store.record_spawn(BoxId(id), BoxColor::Red, 0.0);
        }
        store.record_pickup(BoxId(0), 1.0);
        store.record_pickup(BoxId(2), 2.5);
        assert!(store.record_next_request(BoxId(2), 4.0));

        assert_eq!(store.derive_pending_hesitations(6.0), 1);
        assert_eq!(store.try_get(BoxId(0)).unwrap().hesitation_time(), Some(5.0));
        assert_eq!(store.try_get(BoxId(2)).unwrap().hesitation_time(), Some(1.5));
        assert_eq!(store.try_get(BoxId(1)).unwrap().next_request_time(), None);
    }

    #[test]
    fn history_suppresses_adjacent_duplicates() {
        let mut store = BoxRecordStore::new();
        let record = store.get_or_create(BoxId(0), BoxColor::Red);
        assert!(record.record_placement(1.0, Placement::Table));
        assert!(!record.record_placement(2.0, Placement::Table));
        assert!(record.record_placement(3.0, Placement::Floor));
        assert!(record.record_placement(4.0, Placement::Table));
        assert_eq!(record.history().len(), 3);
    }

    #[test]
    fn bin_placement_overwrites_final_placement() {
        let mut store = BoxRecordStore::new();
        let record = store.get_or_create(BoxId(0), BoxColor::Red);
        assert!(record.set_final_placement_if_default(Placement::Table));
        assert!(!record.set_final_placement_if_default(Placement::Floor));
        assert_eq!(record.final_placement(), Placement::Table);

        assert!(record.place_in_bin(Area::RedBin, 5.0));
        assert_eq!(record.final_placement(), Placement::RedBin);
        assert!(record.was_correct());
    }
}
