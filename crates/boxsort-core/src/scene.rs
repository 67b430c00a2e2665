//! Scene view
//!
//! Tracks which boxes exist in the host scene, the placement tag each one
//! currently carries and the trigger areas it occupies.

use crate::types::{Area, BoxColor, BoxId, Placement};
use indexmap::{IndexMap, IndexSet};

/// A box present in the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBox {
    pub color: BoxColor,
    /// Tag of the last area entered, `Other` after leaving it
    pub placement: Placement,
}

#[derive(Debug, Clone, Default)]
pub struct Scene {
    boxes: IndexMap<BoxId, SceneBox>,
    occupants: IndexMap<Area, IndexSet<BoxId>>,
}

impl Scene {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a freshly spawned box; it starts tagged `SomewhereElse`
    pub fn insert(&mut self, id: BoxId, color: BoxColor) {
        self.boxes.insert(
            id,
            SceneBox {
                color,
                placement: Placement::SomewhereElse,
            },
        );
    }

    #[must_use]
    pub fn contains(&self, id: BoxId) -> bool {
        self.boxes.contains_key(&id)
    }

    #[must_use]
    pub fn get(&self, id: BoxId) -> Option<&SceneBox> {
        self.boxes.get(&id)
    }

    /// Box entered a trigger area. Returns false for unknown boxes.
    pub fn enter(&mut self, id: BoxId, area: Area) -> bool {
        let Some(entry) = self.boxes.get_mut(&id) else {
            return false;
        };
        entry.placement = area.placement();
        self.occupants.entry(area).or_default().insert(id);
        true
    }

    /// Box left a trigger area. Returns false for unknown boxes.
    pub fn exit(&mut self, id: BoxId, area: Area) -> bool {
        let Some(entry) = self.boxes.get_mut(&id) else {
            return false;
        };
        entry.placement = Placement::Other;
        if let Some(members) = self.occupants.get_mut(&area) {
            members.shift_remove(&id);
        }
        true
    }

    /// Remove a destroyed box from the scene and every area
    pub fn remove(&mut self, id: BoxId) -> Option<SceneBox> {
        for members in self.occupants.values_mut() {
            members.shift_remove(&id);
        }
        self.boxes.shift_remove(&id)
    }

    /// Boxes currently inside `area`, in arrival order
    #[must_use]
    pub fn boxes_in(&self, area: Area) -> Vec<BoxId> {
        self.occupants
            .get(&area)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (BoxId, &SceneBox)> {
        self.boxes.iter().map(|(id, entry)| (*id, entry))
    }

    #[must_use]
    pub fn ids(&self) -> Vec<BoxId> {
        self.boxes.keys().copied().collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.boxes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.boxes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_and_exit_update_placement() {
        let mut scene = Scene::new();
        scene.insert(BoxId(0), BoxColor::Red);
        assert_eq!(
            scene.get(BoxId(0)).unwrap().placement,
            Placement::SomewhereElse
        );

        assert!(scene.enter(BoxId(0), Area::Table));
        assert_eq!(scene.get(BoxId(0)).unwrap().placement, Placement::Table);
        assert_eq!(scene.boxes_in(Area::Table), vec![BoxId(0)]);

        assert!(scene.exit(BoxId(0), Area::Table));
        assert_eq!(scene.get(BoxId(0)).unwrap().placement, Placement::Other);
        assert!(scene.boxes_in(Area::Table).is_empty());
    }

    #[test]
    fn unknown_boxes_are_ignored() {
        let mut scene = Scene::new();
        assert!(!scene.enter(BoxId(3), Area::RedBin));
        assert!(!scene.exit(BoxId(3), Area::RedBin));
        assert!(scene.boxes_in(Area::RedBin).is_empty());
    }

    #[test]
    fn remove_clears_area_membership() {
        let mut scene = Scene::new();
        scene.insert(BoxId(0), BoxColor::Blue);
        scene.insert(BoxId(1), BoxColor::Blue);
        scene.enter(BoxId(0), Area::BlueBin);
        scene.enter(BoxId(1), Area::BlueBin);

        assert!(scene.remove(BoxId(0)).is_some());
        assert_eq!(scene.boxes_in(Area::BlueBin), vec![BoxId(1)]);
        assert_eq!(scene.len(), 1);
    }
}
