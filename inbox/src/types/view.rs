use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::InboxError;
use super::message::Message;

/// The three mutually exclusive inbox filters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    #[default]
    Regular,
    Archived,
    Deleted,
}

impl View {
    pub const ALL: [View; 3] = [View::Regular, View::Archived, View::Deleted];

    /// Path segment used by `GET /messages/{view}`
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Archived => "archived",
            Self::Deleted => "deleted",
        }
    }

    /// Whether `message` belongs to this view
    pub fn matches(&self, message: &Message) -> bool {
        if message.is_forever_deleted {
            return false;
        }
        match self {
            Self::Regular => !message.is_archived && !message.is_deleted,
            Self::Archived => message.is_archived && !message.is_deleted,
            Self::Deleted => message.is_deleted,
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for View {
    type Err = InboxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(Self::Regular),
            "archived" => Ok(Self::Archived),
            "deleted" => Ok(Self::Deleted),
            other => Err(InboxError::InvalidInput(format!("unknown view: {}", other))),
        }
    }
}
