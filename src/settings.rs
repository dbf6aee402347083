//! User settings in TOML
//!
//! Read from `settings.toml` in the platform config directory. Anything
//! missing or unreadable falls back to the defaults.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub keys: KeyBindings,
    pub visual: VisualSettings,
    pub audio: AudioSettings,
}

/// Key names per command; each entry may be a single key or a list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub move_left: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub move_right: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub soft_drop: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub hard_drop: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub rotate_cw: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub rotate_ccw: Vec<String>,
    #[serde(deserialize_with = "one_or_many", serialize_with = "compact_keys")]
    pub pause: Vec<String>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        let keys = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
        Self {
            move_left: keys(&["Left", "a"]),
            move_right: keys(&["Right", "d"]),
            soft_drop: keys(&["Down", "s"]),
            hard_drop: keys(&["Up", "Space"]),
            rotate_cw: keys(&["x", "e"]),
            rotate_ccw: keys(&["z", "q"]),
            pause: keys(&["p", "Esc"]),
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};

    struct KeyNames;

    impl<'de> Visitor<'de> for KeyNames {
        type Value = Vec<String>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a key name or a list of key names")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            Ok(vec![v.to_string()])
        }

        fn visit_seq<A: de::SeqAccess<'de>>(self, mut seq: A) -> Result<Self::Value, A::Error> {
            let mut names = Vec::with_capacity(seq.size_hint().unwrap_or(2));
            while let Some(name) = seq.next_element::<String>()? {
                names.push(name);
            }
            Ok(names)
        }
    }

    deserializer.deserialize_any(KeyNames)
}

/// A lone key is written as a plain string
fn compact_keys<S>(keys: &[String], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    match keys {
        [only] => serializer.serialize_str(only),
        _ => serializer.collect_seq(keys),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    /// Paint where the piece would land
    pub show_ghost: bool,
    /// "solid", "bracket" or "round"
    pub block_style: String,
}

impl Default for VisualSettings {
    fn default() -> Self {
        Self {
            show_ghost: true,
            block_style: "solid".to_string(),
        }
    }
}

impl VisualSettings {
    /// Glyphs for a filled cell and a ghost cell
    pub fn block_chars(&self) -> (&'static str, &'static str) {
        match self.block_style.as_str() {
            "bracket" => ("[]", "::"),
            "round" => ("()", ".."),
            _ => ("██", "░░"),
        }
    }
}

/// Volumes from 0 to 100
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    pub music_volume: u32,
    pub sfx_volume: u32,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            music_volume: 25,
            sfx_volume: 50,
        }
    }
}

impl AudioSettings {
    pub fn music_level(&self) -> f32 {
        self.music_volume.min(100) as f32 / 100.0
    }

    pub fn sfx_level(&self) -> f32 {
        self.sfx_volume.min(100) as f32 / 100.0
    }
}

impl Settings {
    fn settings_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "tetris-classic", "tetris-classic")
            .map(|dirs| dirs.config_dir().join("settings.toml"))
    }

    /// Load from the config directory
    pub fn load() -> Self {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        }
    }

    pub fn load_from(path: &Path) -> Self {
        let Ok(contents) = fs::read_to_string(path) else {
            return Self::default();
        };
        toml::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring {}: {}", path.display(), e);
            Self::default()
        })
    }

    /// Save to the config directory
    pub fn save(&self) -> Result<(), String> {
        let Some(path) = Self::settings_path() else {
            return Err("Could not determine config directory".to_string());
        };
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
        let contents =
            toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize: {}", e))?;
        fs::write(path, contents).map_err(|e| format!("Failed to write settings: {}", e))?;
        Ok(())
    }
}
