use serde::{Deserialize, Serialize};

use crate::model::common::PositionId;

/// An elective position, e.g. "President".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    #[serde(rename = "_id")]
    pub id: PositionId,
    pub name: String,
    /// Fixed ballot and results ordering, ascending.
    pub order: u32,
    /// Number of candidate slots already taken by approved candidates.
    #[serde(default)]
    pub approved_count: u32,
}

impl Position {
    pub fn new(id: PositionId, name: impl Into<String>, order: u32) -> Self {
        Self {
            id,
            name: name.into(),
            order,
            approved_count: 0,
        }
    }

    /// Can another candidate be approved without exceeding `cap`?
    pub fn has_open_slot(&self, cap: u32) -> bool {
        self.approved_count < cap
    }
}
