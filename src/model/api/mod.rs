pub mod auth;
pub mod ballot;
pub mod candidacy;
pub mod partylist;
pub mod results;

use serde::{Deserialize, Serialize};

use crate::model::{common::PositionId, db::position::Position};

/// Body of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionDesc {
    pub position_id: PositionId,
    pub position_name: String,
}

impl From<Position> for PositionDesc {
    fn from(position: Position) -> Self {
        Self {
            position_id: position.id,
            position_name: position.name,
        }
    }
}
