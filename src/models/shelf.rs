//! Shelf identifiers and their display metadata

use serde::{Deserialize, Serialize};

/// Shelf IDs accepted by the backend. `None` is the value used to remove a
/// book from the user's library; it never appears on a stored book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ShelfId {
    #[serde(rename = "currentlyReading")]
    Reading,
    #[serde(rename = "wantToRead")]
    WantToRead,
    #[serde(rename = "read")]
    Read,
    #[serde(rename = "none")]
    None,
}

impl ShelfId {
    /// Shelves a book can actually sit on, in display order
    pub const IN_DISPLAY_ORDER: [ShelfId; 3] = [ShelfId::Reading, ShelfId::WantToRead, ShelfId::Read];

    /// Wire identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            ShelfId::Reading => "currentlyReading",
            ShelfId::WantToRead => "wantToRead",
            ShelfId::Read => "read",
            ShelfId::None => "none",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ShelfId::Reading => "Currently reading",
            ShelfId::WantToRead => "Want to read",
            ShelfId::Read => "Read",
            ShelfId::None => "None",
        }
    }

    pub fn short_display_name(&self) -> &'static str {
        match self {
            ShelfId::Reading => "Reading",
            ShelfId::WantToRead => "Wanted",
            other => other.display_name(),
        }
    }

    /// Anchor-friendly name, e.g. `want-to-read`
    pub fn slug(&self) -> String {
        self.display_name()
            .to_lowercase()
            .split(' ')
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ShelfId::None)
    }
}

impl std::fmt::Display for ShelfId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ShelfId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "currentlyReading" => Ok(ShelfId::Reading),
            "wantToRead" => Ok(ShelfId::WantToRead),
            "read" => Ok(ShelfId::Read),
            "none" => Ok(ShelfId::None),
            other => Err(format!("Unknown shelf: {}", other)),
        }
    }
}
