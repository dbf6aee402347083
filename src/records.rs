//! Top three player records and their persistence
//!
//! Stored in `records.toml` in the platform data directory.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Longest name a record can carry
pub const NAME_LEN: usize = 3;
/// Name shown for the player while their entry is pending
pub const PENDING_NAME: &str = "???";

/// One name and score on the board
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub name: String,
    pub score: u64,
}

impl PlayerRecord {
    pub fn new(name: &str, score: u64) -> Self {
        Self {
            name: name.chars().take(NAME_LEN).collect(),
            score,
        }
    }
}

/// Exactly three records, best first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopThree(pub [PlayerRecord; 3]);

impl Default for TopThree {
    fn default() -> Self {
        Self([
            PlayerRecord::new("AAA", 10_000),
            PlayerRecord::new("BBB", 5_000),
            PlayerRecord::new("CCC", 2_500),
        ])
    }
}

impl TopThree {
    pub fn records(&self) -> &[PlayerRecord; 3] {
        &self.0
    }

    pub fn best(&self) -> u64 {
        self.0[0].score
    }

    /// 1-based place `score` would earn, if any
    ///
    /// A tie with an existing record ranks below it.
    pub fn place_for(&self, score: u64) -> Option<usize> {
        let ahead = self.0.iter().filter(|record| record.score >= score).count();
        (ahead < 3).then_some(ahead + 1)
    }

    /// Records with `name` inserted at `place`, pushing the rest down
    pub fn with_entry(&self, place: usize, name: &str, score: u64) -> Self {
        assert!((1..=3).contains(&place), "place {place} out of range");
        let mut records = self.0.to_vec();
        records.insert(place - 1, PlayerRecord::new(name, score));
        records.truncate(3);
        let mut top = self.clone();
        top.0.clone_from_slice(&records);
        top
    }

    /// Standing shown on the game-over screen, with the player as `???`
    pub fn provisional(&self, place: usize, score: u64) -> Self {
        self.with_entry(place, PENDING_NAME, score)
    }

    /// Copy with the name at `place` replaced
    pub fn renamed(&self, place: usize, name: &str) -> Self {
        assert!((1..=3).contains(&place), "place {place} out of range");
        let mut top = self.clone();
        top.0[place - 1].name = name.chars().take(NAME_LEN).collect();
        top
    }

    fn from_vec(mut records: Vec<PlayerRecord>) -> Option<Self> {
        if records.len() != 3 {
            return None;
        }
        records.sort_by(|a, b| b.score.cmp(&a.score));
        let mut top = Self::default();
        top.0.clone_from_slice(&records);
        Some(top)
    }
}

/// Where the top three live between sessions
///
/// Failures never reach the engine; a store that cannot read or write hands
/// back defaults or the unsaved records and logs the problem.
pub trait RecordStore {
    fn load_top_three(&mut self) -> TopThree;

    /// Name the pending entry at `place` in `records` and persist
    ///
    /// `records` is the provisional standing with the player already
    /// inserted. Returns the records now in effect.
    fn update_from(&mut self, place: usize, name: &str, records: &TopThree) -> TopThree;
}

#[derive(Debug, Serialize, Deserialize)]
struct RecordsFile {
    records: Vec<PlayerRecord>,
}

/// TOML file store
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    path: Option<PathBuf>,
}

impl FileRecordStore {
    /// Store at the platform data directory
    pub fn new() -> Self {
        let path = ProjectDirs::from("com", "tetris-classic", "tetris-classic")
            .map(|dirs| dirs.data_dir().join("records.toml"));
        Self { path }
    }

    pub fn with_path(path: PathBuf) -> Self {
        Self { path: Some(path) }
    }

    fn read(&self) -> Result<TopThree, String> {
        let Some(path) = &self.path else {
            return Err("Could not determine data directory".to_string());
        };
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let file: RecordsFile =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse records: {}", e))?;
        TopThree::from_vec(file.records).ok_or_else(|| "Expected exactly 3 records".to_string())
    }

    fn write(&self, top: &TopThree) -> Result<(), String> {
        let Some(path) = &self.path else {
            return Err("Could not determine data directory".to_string());
        };
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create data dir: {}", e))?;
        }
        let file = RecordsFile {
            records: top.0.to_vec(),
        };
        let contents =
            toml::to_string_pretty(&file).map_err(|e| format!("Failed to serialize: {}", e))?;
        fs::write(path, contents).map_err(|e| format!("Failed to write records: {}", e))?;
        Ok(())
    }
}

impl Default for FileRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore for FileRecordStore {
    fn load_top_three(&mut self) -> TopThree {
        match self.read() {
            Ok(top) => top,
            Err(e) => {
                tracing::warn!("Using default records: {}", e);
                TopThree::default()
            }
        }
    }

    fn update_from(&mut self, place: usize, name: &str, records: &TopThree) -> TopThree {
        let updated = records.renamed(place, name);
        match self.write(&updated) {
            Ok(()) => tracing::info!(place, name, "record saved"),
            Err(e) => tracing::warn!("Record not saved: {}", e),
        }
        updated
    }
}

/// Keeps records for the lifetime of the process only
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    top: TopThree,
}

impl RecordStore for MemoryRecordStore {
    fn load_top_three(&mut self) -> TopThree {
        self.top.clone()
    }

    fn update_from(&mut self, place: usize, name: &str, records: &TopThree) -> TopThree {
        self.top = records.renamed(place, name);
        self.top.clone()
    }
}
