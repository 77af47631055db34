//! Room identifiers and remote document keys.
//!
//! Every week of a room lives in its own document, keyed as
//! `<room_id>_<week start>` (for example `family_2024-06-03`).

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::week::WeekKey;

/// Errors that can occur with room identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoomIdError {
    #[error("Room ID must not be empty")]
    Empty,

    #[error("Invalid room ID '{0}': must not contain path separators or start with '.'")]
    InvalidCharacters(String),
}

/// The namespace that groups one household's documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Validates and wraps a room identifier.
    ///
    /// Room IDs end up in file names and URL paths, so separators and
    /// relative components are rejected.
    pub fn new(id: impl Into<String>) -> Result<Self, RoomIdError> {
        let id = id.into();
        if id.is_empty() {
            return Err(RoomIdError::Empty);
        }
        if id.contains('/') || id.contains('\\') || id.contains("..") || id.starts_with('.') {
            return Err(RoomIdError::InvalidCharacters(id));
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomId> for String {
    fn from(room: RoomId) -> Self {
        room.0
    }
}

/// Key of one room's document for one week.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocumentKey {
    room: RoomId,
    week: WeekKey,
}

impl DocumentKey {
    pub fn new(room: RoomId, week: WeekKey) -> Self {
        Self { room, week }
    }

    pub fn room(&self) -> &RoomId {
        &self.room
    }

    pub fn week(&self) -> WeekKey {
        self.week
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.room, self.week)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_key_format() {
        let room = RoomId::new("family").unwrap();
        let week: WeekKey = "2024-06-03".parse().unwrap();
        let key = DocumentKey::new(room, week);
        assert_eq!(key.to_string(), "family_2024-06-03");
        assert_eq!(key.room().as_str(), "family");
        assert_eq!(key.week(), week);
    }

    #[test]
    fn test_document_key_uses_monday() {
        let room = RoomId::new("family").unwrap();
        let week: WeekKey = "2024-06-07".parse().unwrap();
        assert_eq!(
            DocumentKey::new(room, week).to_string(),
            "family_2024-06-03"
        );
    }

    #[test]
    fn test_room_id_validation() {
        assert!(RoomId::new("family").is_ok());
        assert!(RoomId::new("smith-house_2").is_ok());
        assert_eq!(RoomId::new(""), Err(RoomIdError::Empty));
        assert!(RoomId::new("a/b").is_err());
        assert!(RoomId::new("a\\b").is_err());
        assert!(RoomId::new("..").is_err());
        assert!(RoomId::new(".hidden").is_err());
    }

    #[test]
    fn test_room_id_deserialize_validates() {
        let room: RoomId = serde_json::from_str("\"family\"").unwrap();
        assert_eq!(room.as_str(), "family");
        assert!(serde_json::from_str::<RoomId>("\"../etc\"").is_err());
    }
}
