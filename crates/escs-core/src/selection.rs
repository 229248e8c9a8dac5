//! # Selection Context
//!
//! Tracks which students subsequent book scans address.
//!
//! ```text
//!   scan student card ──► select(id, Replace) ──► [ id ]
//!   click row (ctrl)  ──► select(id, Toggle)  ──► [ a, id ] or [ a ]
//!   "select all"      ──► select_all(ids)     ──► [ every id ]
//!
//!   book scan needs single_selected() == Some(id)
//! ```
//!
//! Ids keep insertion order, so the UI can show the selection the way it was
//! built up.

use serde::{Deserialize, Serialize};

/// How `select` combines with the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    /// Selection becomes exactly this id.
    Replace,
    /// Add the id if absent, remove it if present.
    Toggle,
}

/// Ordered set of selected student ids.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionContext {
    selected_ids: Vec<String>,
}

impl SelectionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(&mut self, id: impl Into<String>, mode: SelectMode) {
        let id = id.into();
        match mode {
            SelectMode::Replace => {
                self.selected_ids.clear();
                self.selected_ids.push(id);
            }
            SelectMode::Toggle => {
                if let Some(pos) = self.selected_ids.iter().position(|s| *s == id) {
                    self.selected_ids.remove(pos);
                } else {
                    self.selected_ids.push(id);
                }
            }
        }
    }

    /// Selects every id given, in order, dropping duplicates.
    pub fn select_all<I, S>(&mut self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.selected_ids.clear();
        for id in ids {
            let id = id.into();
            if !self.selected_ids.contains(&id) {
                self.selected_ids.push(id);
            }
        }
    }

    pub fn clear(&mut self) {
        self.selected_ids.clear();
    }

    pub fn count(&self) -> usize {
        self.selected_ids.len()
    }

    /// The selected id when exactly one is selected.
    pub fn single_selected(&self) -> Option<&str> {
        match self.selected_ids.as_slice() {
            [only] => Some(only.as_str()),
            _ => None,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.selected_ids.iter().any(|s| s == id)
    }

    pub fn ids(&self) -> &[String] {
        &self.selected_ids
    }

    /// Drops selected ids that are not in `existing`. Returns how many were dropped.
    pub fn retain_existing<'a, I>(&mut self, existing: I) -> usize
    where
        I: IntoIterator<Item = &'a str>,
    {
        let existing: std::collections::HashSet<&str> = existing.into_iter().collect();
        let before = self.selected_ids.len();
        self.selected_ids.retain(|id| existing.contains(id.as_str()));
        before - self.selected_ids.len()
    }

    /// Removes one id if selected.
    pub fn deselect(&mut self, id: &str) -> bool {
        let before = self.selected_ids.len();
        self.selected_ids.retain(|s| s != id);
        before != self.selected_ids.len()
    }
}
