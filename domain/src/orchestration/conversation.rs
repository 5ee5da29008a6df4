//! Collaboration protocol selection

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a batch of agents collaborates on one input
///
/// - `TurnOrder`: agents run one after another; each sees the earlier answers
/// - `FreeForm`: agents run independently on the same context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    TurnOrder,
    #[default]
    FreeForm,
}

impl ConversationMode {
    pub fn is_sequential(&self) -> bool {
        matches!(self, ConversationMode::TurnOrder)
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConversationMode::TurnOrder => write!(f, "turn_order"),
            ConversationMode::FreeForm => write!(f, "free_form"),
        }
    }
}

impl std::str::FromStr for ConversationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "turn_order" | "turn" | "sequential" => Ok(ConversationMode::TurnOrder),
            "free_form" | "free" | "parallel" => Ok(ConversationMode::FreeForm),
            _ => Err(format!("Invalid ConversationMode: {}", s)),
        }
    }
}
