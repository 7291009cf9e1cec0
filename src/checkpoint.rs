//! Named, vertically ordered page sections the navigator snaps between.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::config::{END_ID, HOME_ID};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: String,
    /// Vertical page offset in pixels, measured at layout time.
    pub anchor_offset: f64,
    /// Per-section override of the default transition duration.
    pub animation_duration_ms: Option<f64>,
}

impl Checkpoint {
    pub fn new(id: impl Into<String>, anchor_offset: f64) -> Self {
        Self {
            id: id.into(),
            anchor_offset,
            animation_duration_ms: None,
        }
    }

    pub fn with_duration(mut self, duration_ms: f64) -> Self {
        self.animation_duration_ms = Some(duration_ms);
        self
    }

    pub fn duration_or(&self, default_ms: f64) -> f64 {
        self.animation_duration_ms.unwrap_or(default_ms)
    }

    fn rank(&self) -> IdRank<'_> {
        if self.id == HOME_ID {
            IdRank::Home
        } else if self.id == END_ID {
            IdRank::End
        } else if let Ok(n) = self.id.trim().parse::<i64>() {
            IdRank::Numeric(n)
        } else {
            IdRank::Named(&self.id)
        }
    }
}

/// Sort key for checkpoint ids: `home`, then numbers ascending, then any
/// other ids lexicographically, then `end`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum IdRank<'a> {
    Home,
    Numeric(i64),
    Named(&'a str),
    End,
}

/// Order checkpoints by id, ignoring offsets.
pub fn compare_ids(a: &Checkpoint, b: &Checkpoint) -> Ordering {
    a.rank().cmp(&b.rank())
}

/// Sorted checkpoint table. Rebuilt wholesale, never edited in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckpointList {
    items: Vec<Checkpoint>,
}

impl CheckpointList {
    pub fn new(mut items: Vec<Checkpoint>) -> Self {
        // stable, so duplicate ids keep markup order
        items.sort_by(compare_ids);
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Checkpoint> {
        self.items.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.items.iter()
    }

    pub fn last_index(&self) -> Option<usize> {
        self.items.len().checked_sub(1)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.iter().position(|cp| cp.id == id)
    }

    /// Index of the checkpoint nearest to `offset`; ties go to the earlier one.
    pub fn closest_to(&self, offset: f64) -> usize {
        let mut closest = 0;
        let mut min_distance = f64::INFINITY;
        for (i, cp) in self.items.iter().enumerate() {
            let distance = (cp.anchor_offset - offset).abs();
            if distance < min_distance {
                min_distance = distance;
                closest = i;
            }
        }
        closest
    }

    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|cp| cp.id.as_str()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids_of(list: &CheckpointList) -> Vec<&str> {
        list.ids()
    }

    #[test]
    fn home_first_end_last_numbers_ascending() {
        let list = CheckpointList::new(vec![
            Checkpoint::new("end", 2400.0),
            Checkpoint::new("10", 3000.0),
            Checkpoint::new("4", 1600.0),
            Checkpoint::new("home", 0.0),
            Checkpoint::new("2", 800.0),
        ]);
        assert_eq!(ids_of(&list), vec!["home", "2", "4", "10", "end"]);
    }

    #[test]
    fn numeric_order_is_not_lexicographic() {
        let list = CheckpointList::new(vec![
            Checkpoint::new("10", 0.0),
            Checkpoint::new("9", 0.0),
        ]);
        assert_eq!(ids_of(&list), vec!["9", "10"]);
    }

    #[test]
    fn named_ids_sit_between_numbers_and_end() {
        let list = CheckpointList::new(vec![
            Checkpoint::new("end", 0.0),
            Checkpoint::new("team", 0.0),
            Checkpoint::new("about", 0.0),
            Checkpoint::new("3", 0.0),
            Checkpoint::new("home", 0.0),
        ]);
        assert_eq!(ids_of(&list), vec!["home", "3", "about", "team", "end"]);
    }

    #[test]
    fn duplicate_ids_keep_markup_order() {
        let list = CheckpointList::new(vec![
            Checkpoint::new("5", 100.0),
            Checkpoint::new("5", 50.0),
        ]);
        assert_eq!(list.get(0).map(|c| c.anchor_offset), Some(100.0));
        assert_eq!(list.get(1).map(|c| c.anchor_offset), Some(50.0));
    }

    #[test]
    fn closest_prefers_first_on_tie() {
        let list = CheckpointList::new(vec![
            Checkpoint::new("home", 0.0),
            Checkpoint::new("2", 800.0),
            Checkpoint::new("end", 1600.0),
        ]);
        assert_eq!(list.closest_to(400.0), 0);
        assert_eq!(list.closest_to(401.0), 1);
        assert_eq!(list.closest_to(5000.0), 2);
    }

    #[test]
    fn empty_list_has_no_last_index() {
        let list = CheckpointList::default();
        assert!(list.is_empty());
        assert_eq!(list.last_index(), None);
        assert_eq!(list.closest_to(10.0), 0);
    }

    #[test]
    fn duration_falls_back_to_default() {
        assert_eq!(Checkpoint::new("2", 0.0).duration_or(600.0), 600.0);
        assert_eq!(
            Checkpoint::new("2", 0.0).with_duration(900.0).duration_or(600.0),
            900.0
        );
    }
}
