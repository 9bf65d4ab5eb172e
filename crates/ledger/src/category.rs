//! Closed expense category vocabulary.
//!
//! Categories are a fixed enumeration with an explicit display-name mapping.
//! Unknown names fail validation instead of passing through unlabeled.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::LedgerError;

/// An expense category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Food,
    Transport,
    Bills,
    Housing,
    Health,
    Leisure,
    Shopping,
    Other,
}

impl Category {
    /// Every category, in presentation order.
    pub const ALL: [Category; 8] = [
        Category::Food,
        Category::Transport,
        Category::Bills,
        Category::Housing,
        Category::Health,
        Category::Leisure,
        Category::Shopping,
        Category::Other,
    ];

    /// Returns the canonical name used in the persisted layout and filters.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Food => "food",
            Self::Transport => "transport",
            Self::Bills => "bills",
            Self::Housing => "housing",
            Self::Health => "health",
            Self::Leisure => "leisure",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }

    /// Returns the human-readable label used in tables and exports.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Bills => "Bills",
            Self::Housing => "Housing",
            Self::Health => "Health",
            Self::Leisure => "Leisure",
            Self::Shopping => "Shopping",
            Self::Other => "Other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Category {
    type Err = LedgerError;

    /// Accepts both the canonical name and the display name, case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(LedgerError::InvalidCategory("empty category".to_string()));
        }
        Category::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| LedgerError::InvalidCategory(trimmed.to_string()))
    }
}
