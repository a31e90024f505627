//! Race configuration and the passage source.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Passage used when no quote file is available.
pub const FALLBACK_PASSAGE: &str = "The quick brown fox jumps over the lazy dog while the \
     five boxing wizards jump quickly and a wizard's job is to vex chumps quickly in fog.";

// ---------------------------------------------------------------------------
// RaceConfig
// ---------------------------------------------------------------------------

/// Tunables shared by every room the lobby creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Upper bound on the `maxPlayers` a client may request.
    pub max_players_cap: u32,

    /// Length of the race clock, in ticks.
    pub race_duration_ticks: u32,

    /// Wall-clock length of one tick.
    pub tick_interval: Duration,

    /// Number of characters in a generated room code.
    pub room_id_len: usize,
}

impl Default for RaceConfig {
    fn default() -> Self {
        Self {
            max_players_cap: 8,
            race_duration_ticks: 120,
            tick_interval: Duration::from_secs(1),
            room_id_len: 6,
        }
    }
}

impl RaceConfig {
    /// Clamps a client-requested room size into `1..=max_players_cap`.
    pub fn clamp_max_players(&self, requested: u32) -> u32 {
        requested.clamp(1, self.max_players_cap.max(1))
    }

    /// Race length in ticks, never zero: a zero-length clock would never
    /// report its own expiry.
    pub fn race_ticks(&self) -> u32 {
        self.race_duration_ticks.max(1)
    }
}

// ---------------------------------------------------------------------------
// QuoteSource
// ---------------------------------------------------------------------------

/// Why a quote file could not be used.
#[derive(Debug, thiserror::Error)]
pub enum QuoteError {
    #[error("failed to read quote file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse quote file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("quote file contains no passages")]
    Empty,
}

/// One entry of a quote file: either a bare string or `{"quote": "..."}`.
#[derive(Deserialize)]
#[serde(untagged)]
enum QuoteEntry {
    Plain(String),
    Object { quote: String },
}

impl QuoteEntry {
    fn into_text(self) -> String {
        match self {
            Self::Plain(text) | Self::Object { quote: text } => text,
        }
    }
}

/// A non-empty pool of race passages.
///
/// Cheap to clone; the passages are shared.
#[derive(Debug, Clone)]
pub struct QuoteSource {
    passages: Arc<[String]>,
}

impl QuoteSource {
    /// Loads passages from a JSON file, returning an error if it is
    /// missing, malformed, or has no usable passages.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuoteError> {
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<QuoteEntry> = serde_json::from_str(&raw)?;
        let passages: Vec<String> = entries
            .into_iter()
            .map(QuoteEntry::into_text)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if passages.is_empty() {
            return Err(QuoteError::Empty);
        }
        Ok(Self {
            passages: passages.into(),
        })
    }

    /// Loads passages from a JSON file, falling back to
    /// [`FALLBACK_PASSAGE`] if the file can't be used.
    pub fn from_file(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::load(path) {
            Ok(source) => {
                tracing::info!(path = %path.display(), passages = source.len(), "quotes loaded");
                source
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "using fallback passage");
                Self::fallback()
            }
        }
    }

    /// A source with the given passages; blank ones are dropped and an
    /// empty result falls back to [`FALLBACK_PASSAGE`].
    pub fn from_passages<I, S>(passages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let passages: Vec<String> = passages
            .into_iter()
            .map(Into::into)
            .filter(|p| !p.trim().is_empty())
            .collect();
        if passages.is_empty() {
            return Self::fallback();
        }
        Self {
            passages: passages.into(),
        }
    }

    /// A source containing only [`FALLBACK_PASSAGE`].
    pub fn fallback() -> Self {
        Self {
            passages: Arc::from(vec![FALLBACK_PASSAGE.to_owned()]),
        }
    }

    /// Picks a passage uniformly at random.
    pub fn pick(&self) -> String {
        let idx = rand::rng().random_range(0..self.passages.len());
        self.passages[idx].clone()
    }

    /// Number of passages in the pool.
    pub fn len(&self) -> usize {
        self.passages.len()
    }

    /// Whether the pool is empty. Constructors never produce an empty one.
    pub fn is_empty(&self) -> bool {
        self.passages.is_empty()
    }
}

impl Default for QuoteSource {
    fn default() -> Self {
        Self::fallback()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "typerace-quotes-{}-{name}.json",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_race_config_default() {
        let config = RaceConfig::default();
        assert_eq!(config.max_players_cap, 8);
        assert_eq!(config.race_duration_ticks, 120);
        assert_eq!(config.tick_interval, Duration::from_secs(1));
        assert_eq!(config.room_id_len, 6);
    }

    #[test]
    fn test_clamp_max_players() {
        let config = RaceConfig::default();
        assert_eq!(config.clamp_max_players(0), 1);
        assert_eq!(config.clamp_max_players(4), 4);
        assert_eq!(config.clamp_max_players(500), 8);
    }

    #[test]
    fn test_race_ticks_is_at_least_one() {
        let config = RaceConfig {
            race_duration_ticks: 0,
            ..RaceConfig::default()
        };
        assert_eq!(config.race_ticks(), 1);
        assert_eq!(RaceConfig::default().race_ticks(), 120);
    }

    #[test]
    fn test_load_accepts_quote_objects() {
        let path = write_temp("objects", r#"[{"quote":"alpha beta"},{"quote":"gamma"}]"#);
        let source = QuoteSource::load(&path).unwrap();
        assert_eq!(source.len(), 2);
        let picked = source.pick();
        assert!(picked == "alpha beta" || picked == "gamma");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_accepts_plain_strings() {
        let path = write_temp("plain", r#"["only one"]"#);
        let source = QuoteSource::load(&path).unwrap();
        assert_eq!(source.pick(), "only one");
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_empty_list_is_an_error() {
        let path = write_temp("empty", "[]");
        assert!(matches!(QuoteSource::load(&path), Err(QuoteError::Empty)));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_from_file_missing_falls_back() {
        let source = QuoteSource::from_file("/definitely/not/here/quotes.json");
        assert_eq!(source.len(), 1);
        assert_eq!(source.pick(), FALLBACK_PASSAGE);
    }

    #[test]
    fn test_from_file_malformed_falls_back() {
        let path = write_temp("malformed", "{ not json");
        assert_eq!(QuoteSource::from_file(&path).pick(), FALLBACK_PASSAGE);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_from_passages_drops_blank_entries() {
        let source = QuoteSource::from_passages(["  ", "typed text"]);
        assert_eq!(source.len(), 1);
        assert_eq!(source.pick(), "typed text");
        assert_eq!(
            QuoteSource::from_passages(Vec::<String>::new()).pick(),
            FALLBACK_PASSAGE
        );
    }
}
