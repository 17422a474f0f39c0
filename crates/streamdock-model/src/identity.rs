//! Identity tuple used to match an item across independent backend collections.
//!
//! The backend stores movie ids as strings and series ids as integers, and the
//! same record can show up in the item list, the queue, and the current-download
//! slot. [`ItemIdentity`] normalises all of them to one comparable key.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{ValidationError, ValidationResult};

/// Opaque media identifier, compared as text regardless of its wire type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MediaId(String);

impl MediaId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the identifier as text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the identifier carries no usable characters.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for MediaId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for MediaId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for MediaId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<u64> for MediaId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for MediaId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MediaId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Signed(i64),
            Unsigned(u64),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Signed(number) => Self(number.to_string()),
            Raw::Unsigned(number) => Self(number.to_string()),
        })
    }
}

/// Kind of media tracked by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MediaType {
    /// A standalone film.
    #[serde(rename = "movie")]
    Movie,
    /// A single TV episode.
    #[serde(rename = "tv", alias = "episode")]
    Episode,
}

impl MediaType {
    /// Wire label used by the backend.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Movie => "movie",
            Self::Episode => "tv",
        }
    }
}

/// Minimal field set identifying a downloadable item.
///
/// Ordering is derived so identities can key deterministic maps.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemIdentity {
    /// Movie id or series id.
    pub id: MediaId,
    /// Movie or episode.
    pub media_type: MediaType,
    /// Season number for episodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    /// Episode number for episodes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl ItemIdentity {
    /// Identity of a movie.
    #[must_use]
    pub fn movie(id: impl Into<MediaId>) -> Self {
        Self {
            id: id.into(),
            media_type: MediaType::Movie,
            season: None,
            episode: None,
        }
    }

    /// Identity of a single episode within a series.
    #[must_use]
    pub fn episode(series_id: impl Into<MediaId>, season: u32, episode: u32) -> Self {
        Self {
            id: series_id.into(),
            media_type: MediaType::Episode,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// Check the identity is well formed for an action.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] when the id is blank, an episode lacks
    /// its season or episode number, a movie carries either of them, or a
    /// number is zero.
    pub fn validate(&self) -> ValidationResult<()> {
        if self.id.is_blank() {
            return Err(ValidationError::BlankId);
        }
        match self.media_type {
            MediaType::Movie => {
                if self.season.is_some() || self.episode.is_some() {
                    return Err(ValidationError::MovieWithEpisode);
                }
            }
            MediaType::Episode => {
                let (Some(season), Some(episode)) = (self.season, self.episode) else {
                    return Err(ValidationError::IncompleteEpisode);
                };
                if season == 0 {
                    return Err(ValidationError::ZeroNumber { field: "season" });
                }
                if episode == 0 {
                    return Err(ValidationError::ZeroNumber { field: "episode" });
                }
            }
        }
        Ok(())
    }

    /// Season and episode pair for a validated episode identity.
    #[must_use]
    pub const fn episode_numbers(&self) -> Option<(u32, u32)> {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => Some((season, episode)),
            _ => None,
        }
    }
}

impl Display for ItemIdentity {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        match (self.media_type, self.season, self.episode) {
            (MediaType::Episode, Some(season), Some(episode)) => {
                write!(formatter, "tv:{}:S{season:02}E{episode:02}", self.id)
            }
            (media_type, _, _) => write!(formatter, "{}:{}", media_type.as_str(), self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn media_id_accepts_numbers_and_strings() {
        let numeric: MediaId = serde_json::from_str("42").expect("numeric id");
        let text: MediaId = serde_json::from_str("\"42\"").expect("string id");
        assert_eq!(numeric, text);
        assert_eq!(numeric.as_str(), "42");
    }

    #[test]
    fn media_type_uses_backend_labels() {
        let tv: MediaType = serde_json::from_str("\"tv\"").expect("tv label");
        let alias: MediaType = serde_json::from_str("\"episode\"").expect("episode alias");
        assert_eq!(tv, MediaType::Episode);
        assert_eq!(alias, MediaType::Episode);
        assert_eq!(
            serde_json::to_string(&MediaType::Episode).expect("serialize"),
            "\"tv\""
        );
    }

    #[test]
    fn validate_rejects_malformed_identities() {
        assert_eq!(
            ItemIdentity::movie("  ").validate(),
            Err(ValidationError::BlankId)
        );

        let mut partial = ItemIdentity::episode(7_u64, 1, 2);
        partial.episode = None;
        assert_eq!(partial.validate(), Err(ValidationError::IncompleteEpisode));

        let mut movie = ItemIdentity::movie("m1");
        movie.season = Some(1);
        assert_eq!(movie.validate(), Err(ValidationError::MovieWithEpisode));

        assert_eq!(
            ItemIdentity::episode(7_u64, 0, 2).validate(),
            Err(ValidationError::ZeroNumber { field: "season" })
        );
        assert!(ItemIdentity::episode(7_u64, 1, 2).validate().is_ok());
        assert!(ItemIdentity::movie("m1").validate().is_ok());
    }

    #[test]
    fn display_is_compact() {
        assert_eq!(ItemIdentity::movie("m1").to_string(), "movie:m1");
        assert_eq!(
            ItemIdentity::episode(2_u64, 1, 3).to_string(),
            "tv:2:S01E03"
        );
    }
}
