//! Date-partitioned to-do list.
//!
//! Items are split against today's date into a today list and a future
//! list; past-dated items fall out of both on classification and are
//! gone after the next save. The host supplies today's date, item ids
//! and log timestamps so the list itself stays clock-free.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: i64,
    pub name: String,
    pub completed: bool,
    #[serde(default)]
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    Add,
    Finish,
    Restart,
    Remove,
    Clear,
}

/// One line of the append-only mutation log. Persisted alongside the
/// items, never displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoLog {
    pub timestamp: String,
    pub action: TodoAction,
    pub name: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TodoError {
    #[error("task name is empty")]
    EmptyName,

    #[error("invalid date {date:?}, expected YYYY-MM-DD")]
    BadDate { date: String },

    #[error("date {date} is already in the past")]
    PastDate { date: String },

    #[error("no task at position {index}")]
    BadIndex { index: usize },
}

pub const SHARE_CARD_TEXT: &str =
    "Manage your time, stay focused, and make self-discipline a habit!";

/// Parse and re-format a date so every stored date is zero-padded.
/// Classification compares date strings lexicographically, which is
/// only sound when both sides are canonical.
fn canonical_date(raw: &str) -> Option<String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|parsed| parsed.format("%Y-%m-%d").to_string())
}

#[derive(Debug, Default)]
pub struct TodoList {
    today: Vec<TodoItem>,
    future: Vec<TodoItem>,
    logs: Vec<TodoLog>,
}

impl TodoList {
    /// Classify loaded items against `today`. Items without a date get
    /// today's; past-dated items are dropped. Stored order is display
    /// order (newest first) and is preserved.
    pub fn from_items(items: Vec<TodoItem>, logs: Vec<TodoLog>, today: &str) -> Self {
        let mut list = Self {
            today: Vec::new(),
            future: Vec::new(),
            logs,
        };
        for mut item in items {
            // Missing or mangled dates become today's.
            item.date = canonical_date(&item.date).unwrap_or_else(|| today.to_string());
            if item.date == today {
                list.today.push(item);
            } else if item.date.as_str() > today {
                list.future.push(item);
            }
        }
        list
    }

    pub fn today_items(&self) -> &[TodoItem] {
        &self.today
    }

    pub fn future_items(&self) -> &[TodoItem] {
        &self.future
    }

    pub fn logs(&self) -> &[TodoLog] {
        &self.logs
    }

    /// Display order: today's items first, then future ones.
    pub fn iter_display(&self) -> impl Iterator<Item = &TodoItem> {
        self.today.iter().chain(self.future.iter())
    }

    /// All items in display order, for persistence.
    pub fn items_for_save(&self) -> Vec<TodoItem> {
        self.iter_display().cloned().collect()
    }

    pub fn left_count(&self) -> usize {
        self.iter_display().filter(|item| !item.completed).count()
    }

    fn log(&mut self, stamp: &str, action: TodoAction, name: &str) {
        self.logs.push(TodoLog {
            timestamp: stamp.to_string(),
            action,
            name: name.to_string(),
        });
    }

    /// Add a task for `date`, newest first. Blank names, unparsable
    /// dates and past dates are rejected without changes.
    pub fn add(
        &mut self,
        name: &str,
        date: &str,
        today: &str,
        id: i64,
        stamp: &str,
    ) -> Result<(), TodoError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TodoError::EmptyName);
        }
        let date = canonical_date(date).ok_or_else(|| TodoError::BadDate {
            date: date.to_string(),
        })?;
        if date.as_str() < today {
            return Err(TodoError::PastDate { date });
        }

        let item = TodoItem {
            id,
            name: name.to_string(),
            completed: false,
            date: date.clone(),
        };
        if date == today {
            self.today.insert(0, item);
        } else {
            self.future.insert(0, item);
        }
        self.log(stamp, TodoAction::Add, name);
        Ok(())
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut TodoItem, TodoError> {
        let today_len = self.today.len();
        if index == 0 {
            return Err(TodoError::BadIndex { index });
        }
        let pos = index - 1;
        if pos < today_len {
            Ok(&mut self.today[pos])
        } else if pos - today_len < self.future.len() {
            Ok(&mut self.future[pos - today_len])
        } else {
            Err(TodoError::BadIndex { index })
        }
    }

    /// Flip completion of the item at 1-based display position `index`.
    pub fn toggle(&mut self, index: usize, stamp: &str) -> Result<TodoItem, TodoError> {
        let item = self.item_mut(index)?;
        item.completed = !item.completed;
        let snapshot = item.clone();
        self.log(
            stamp,
            if snapshot.completed {
                TodoAction::Finish
            } else {
                TodoAction::Restart
            },
            &snapshot.name,
        );
        Ok(snapshot)
    }

    /// Remove the item at 1-based display position `index`.
    pub fn remove(&mut self, index: usize, stamp: &str) -> Result<TodoItem, TodoError> {
        let today_len = self.today.len();
        if index == 0 {
            return Err(TodoError::BadIndex { index });
        }
        let pos = index - 1;
        let item = if pos < today_len {
            self.today.remove(pos)
        } else if pos - today_len < self.future.len() {
            self.future.remove(pos - today_len)
        } else {
            return Err(TodoError::BadIndex { index });
        };
        self.log(stamp, TodoAction::Remove, &item.name);
        Ok(item)
    }

    /// Complete every item of today, or restart them all when every one
    /// is already completed. The target state is derived from the items
    /// themselves. Empty today list: no-op, returns None.
    pub fn toggle_all_today(&mut self, stamp: &str) -> Option<bool> {
        if self.today.is_empty() {
            return None;
        }
        let target = !self.today.iter().all(|item| item.completed);
        for item in &mut self.today {
            item.completed = target;
        }
        self.log(
            stamp,
            if target {
                TodoAction::Finish
            } else {
                TodoAction::Restart
            },
            "all of today's tasks",
        );
        Some(target)
    }

    /// Drop completed items from both lists, returning how many went.
    pub fn clear_completed(&mut self, stamp: &str) -> usize {
        let before = self.today.len() + self.future.len();
        self.today.retain(|item| !item.completed);
        self.future.retain(|item| !item.completed);
        self.log(stamp, TodoAction::Clear, "completed tasks");
        before - self.today.len() - self.future.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TODAY: &str = "2026-08-30";
    const STAMP: &str = "2026-08-30 10:00:00";

    fn item(id: i64, name: &str, completed: bool, date: &str) -> TodoItem {
        TodoItem {
            id,
            name: name.to_string(),
            completed,
            date: date.to_string(),
        }
    }

    #[test]
    fn test_load_partitions_by_date_and_drops_past() {
        let items = vec![
            item(1, "write report", false, TODAY),
            item(2, "book flight", false, "2026-09-02"),
            item(3, "stale", true, "2026-08-01"),
        ];
        let list = TodoList::from_items(items, Vec::new(), TODAY);
        assert_eq!(list.today_items().len(), 1);
        assert_eq!(list.future_items().len(), 1);
        assert_eq!(list.future_items()[0].name, "book flight");
        // The past item is gone from both lists and from the next save.
        assert_eq!(list.items_for_save().len(), 2);
    }

    #[test]
    fn test_load_normalizes_missing_dates_to_today() {
        let items = vec![item(1, "dateless", false, "")];
        let list = TodoList::from_items(items, Vec::new(), TODAY);
        assert_eq!(list.today_items().len(), 1);
        assert_eq!(list.today_items()[0].date, TODAY);
    }

    #[test]
    fn test_add_prepends_newest_first() {
        let mut list = TodoList::default();
        list.add("first", TODAY, TODAY, 1, STAMP).unwrap();
        list.add("second", TODAY, TODAY, 2, STAMP).unwrap();
        list.add("later", "2026-09-05", TODAY, 3, STAMP).unwrap();

        let names: Vec<_> = list.iter_display().map(|i| i.name.as_str()).collect();
        assert_eq!(names, ["second", "first", "later"]);
        assert_eq!(list.logs().len(), 3);
        assert_eq!(list.logs()[0].action, TodoAction::Add);
    }

    #[test]
    fn test_add_canonicalizes_unpadded_dates() {
        let mut list = TodoList::default();
        // A past date must stay rejected even without zero padding,
        // which would slip past a plain string comparison.
        assert_eq!(
            list.add("late task", "2026-8-5", TODAY, 1, STAMP),
            Err(TodoError::PastDate {
                date: "2026-08-05".to_string()
            })
        );
        assert!(list.iter_display().next().is_none());
        assert!(list.logs().is_empty());

        list.add("trip", "2026-9-5", TODAY, 2, STAMP).unwrap();
        assert_eq!(list.future_items()[0].date, "2026-09-05");
    }

    #[test]
    fn test_add_rejects_unparsable_dates() {
        let mut list = TodoList::default();
        assert_eq!(
            list.add("task", "someday", TODAY, 1, STAMP),
            Err(TodoError::BadDate {
                date: "someday".to_string()
            })
        );
        assert!(list.logs().is_empty());
    }

    #[test]
    fn test_load_canonicalizes_unpadded_dates() {
        let items = vec![
            item(1, "old", false, "2026-8-1"),
            item(2, "ahead", false, "2026-9-5"),
            item(3, "mangled", false, "not a date"),
        ];
        let list = TodoList::from_items(items, Vec::new(), TODAY);
        // The unpadded past item is dropped, not misfiled as future.
        assert_eq!(list.future_items().len(), 1);
        assert_eq!(list.future_items()[0].date, "2026-09-05");
        assert_eq!(list.today_items().len(), 1);
        assert_eq!(list.today_items()[0].name, "mangled");
    }

    #[test]
    fn test_add_rejects_blank_name_and_past_date() {
        let mut list = TodoList::default();
        assert_eq!(
            list.add("   ", TODAY, TODAY, 1, STAMP),
            Err(TodoError::EmptyName)
        );
        assert_eq!(
            list.add("too late", "2026-08-29", TODAY, 1, STAMP),
            Err(TodoError::PastDate {
                date: "2026-08-29".to_string()
            })
        );
        assert_eq!(list.left_count(), 0);
        assert!(list.logs().is_empty());
    }

    #[test]
    fn test_toggle_by_display_index_spans_both_lists() {
        let mut list = TodoList::default();
        list.add("future task", "2026-09-05", TODAY, 1, STAMP).unwrap();
        list.add("today task", TODAY, TODAY, 2, STAMP).unwrap();

        // Display order: today task (1), future task (2).
        let toggled = list.toggle(2, STAMP).unwrap();
        assert_eq!(toggled.name, "future task");
        assert!(toggled.completed);
        assert_eq!(list.logs().last().unwrap().action, TodoAction::Finish);

        let toggled = list.toggle(2, STAMP).unwrap();
        assert!(!toggled.completed);
        assert_eq!(list.logs().last().unwrap().action, TodoAction::Restart);

        assert_eq!(list.toggle(0, STAMP), Err(TodoError::BadIndex { index: 0 }));
        assert_eq!(list.toggle(3, STAMP), Err(TodoError::BadIndex { index: 3 }));
    }

    #[test]
    fn test_remove_returns_item_and_logs() {
        let mut list = TodoList::default();
        list.add("keep", TODAY, TODAY, 1, STAMP).unwrap();
        list.add("drop", TODAY, TODAY, 2, STAMP).unwrap();

        let removed = list.remove(1, STAMP).unwrap();
        assert_eq!(removed.name, "drop");
        assert_eq!(list.today_items().len(), 1);
        assert_eq!(list.logs().last().unwrap().action, TodoAction::Remove);
        assert_eq!(list.remove(5, STAMP), Err(TodoError::BadIndex { index: 5 }));
    }

    #[test]
    fn test_toggle_all_today_derives_target_from_items() {
        let mut list = TodoList::default();
        assert_eq!(list.toggle_all_today(STAMP), None, "empty list is a no-op");

        list.add("a", TODAY, TODAY, 1, STAMP).unwrap();
        list.add("b", TODAY, TODAY, 2, STAMP).unwrap();
        list.toggle(1, STAMP).unwrap();

        // Mixed completion: completes everything.
        assert_eq!(list.toggle_all_today(STAMP), Some(true));
        assert!(list.today_items().iter().all(|i| i.completed));

        // All completed: restarts everything.
        assert_eq!(list.toggle_all_today(STAMP), Some(false));
        assert!(list.today_items().iter().all(|i| !i.completed));
    }

    #[test]
    fn test_clear_completed_counts_across_lists() {
        let mut list = TodoList::default();
        list.add("today done", TODAY, TODAY, 1, STAMP).unwrap();
        list.add("today open", TODAY, TODAY, 2, STAMP).unwrap();
        list.add("future done", "2026-09-05", TODAY, 3, STAMP).unwrap();
        list.toggle(2, STAMP).unwrap(); // today done
        list.toggle(3, STAMP).unwrap(); // future done

        assert_eq!(list.left_count(), 1);
        assert_eq!(list.clear_completed(STAMP), 2);
        assert_eq!(list.items_for_save().len(), 1);
        assert_eq!(list.left_count(), 1);
        assert_eq!(list.logs().last().unwrap().action, TodoAction::Clear);
    }
}
