//! Audio cues, the sink the engine talks to, and a rodio implementation

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

/// Sound cues the engine emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cue {
    Button,
    Rotate,
    Drop,
    LineClear,
    Tetris,
    LevelUp,
    GameOver,
    HighScore,
    OutOfBounds,
    TetrisMaster,
}

impl Cue {
    fn filename(&self) -> &'static str {
        match self {
            Cue::Button => "button.wav",
            Cue::Rotate => "rotate.wav",
            Cue::Drop => "drop.wav",
            Cue::LineClear => "line_clear.wav",
            Cue::Tetris => "tetris.wav",
            Cue::LevelUp => "level_up.wav",
            Cue::GameOver => "game_over.wav",
            Cue::HighScore => "high_score.wav",
            Cue::OutOfBounds => "out_of_bounds.wav",
            Cue::TetrisMaster => "tetris_master.wav",
        }
    }
}

const MUSIC_FILE: &str = "theme.wav";

/// Fire-and-forget audio output
pub trait AudioSink {
    fn play(&mut self, cue: Cue);
    /// Start the theme from the beginning
    fn start_music(&mut self);
    /// Halt the theme, keeping its position
    fn stop_music(&mut self);
    /// Continue the theme from where it stopped
    fn resume_music(&mut self);
}

/// Sink used when no audio device or assets are available
#[derive(Debug, Default)]
pub struct SilentAudio;

impl AudioSink for SilentAudio {
    fn play(&mut self, _cue: Cue) {}
    fn start_music(&mut self) {}
    fn stop_music(&mut self) {}
    fn resume_music(&mut self) {}
}

/// Audio manager backed by the default output device
pub struct AudioManager {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    music_sink: Option<Sink>,
    assets_path: PathBuf,
    music_volume: f32,
    sfx_volume: f32,
}

impl AudioManager {
    /// Open the default output; `None` without a device or an assets directory
    pub fn new() -> Option<Self> {
        let (stream, stream_handle) = OutputStream::try_default().ok()?;
        let assets_path = Self::find_assets_path()?;

        Some(Self {
            _stream: stream,
            stream_handle,
            music_sink: None,
            assets_path,
            music_volume: 0.25,
            sfx_volume: 0.5,
        })
    }

    fn find_assets_path() -> Option<PathBuf> {
        let paths = [
            PathBuf::from("assets"),
            std::env::current_exe().ok()?.parent()?.join("assets"),
        ];

        paths
            .iter()
            .find(|p| p.join("sfx").exists() && p.join("music").exists())
            .cloned()
    }

    /// Set music volume (0.0 to 1.0)
    pub fn set_music_volume(&mut self, volume: f32) {
        self.music_volume = volume.clamp(0.0, 1.0);
        if let Some(sink) = &self.music_sink {
            sink.set_volume(self.music_volume);
        }
    }

    /// Set effect volume (0.0 to 1.0)
    pub fn set_sfx_volume(&mut self, volume: f32) {
        self.sfx_volume = volume.clamp(0.0, 1.0);
    }
}

impl AudioSink for AudioManager {
    fn play(&mut self, cue: Cue) {
        if self.sfx_volume <= 0.0 {
            return;
        }

        let path = self.assets_path.join("sfx").join(cue.filename());
        let Ok(file) = File::open(&path) else {
            tracing::debug!("missing sound {}", path.display());
            return;
        };
        let Ok(decoder) = Decoder::new(BufReader::new(file)) else { return };
        let Ok(sink) = Sink::try_new(&self.stream_handle) else { return };
        sink.set_volume(self.sfx_volume);
        sink.append(decoder);
        sink.detach();
    }

    fn start_music(&mut self) {
        if let Some(sink) = self.music_sink.take() {
            sink.stop();
        }

        let path = self.assets_path.join("music").join(MUSIC_FILE);
        let Ok(file) = File::open(&path) else { return };
        let Ok(sink) = Sink::try_new(&self.stream_handle) else { return };
        let Ok(decoder) = Decoder::new(BufReader::new(file)) else { return };

        sink.set_volume(self.music_volume);
        sink.append(decoder.repeat_infinite());
        self.music_sink = Some(sink);
    }

    fn stop_music(&mut self) {
        if let Some(sink) = &self.music_sink {
            sink.pause();
        }
    }

    fn resume_music(&mut self) {
        if let Some(sink) = &self.music_sink {
            sink.play();
        }
    }
}

/// Remembers everything it was asked to do
#[cfg(test)]
#[derive(Debug, Default, Clone)]
pub struct RecordingAudio {
    pub events: std::rc::Rc<std::cell::RefCell<Vec<AudioEvent>>>,
}

#[cfg(test)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioEvent {
    Cue(Cue),
    StartMusic,
    StopMusic,
    ResumeMusic,
}

#[cfg(test)]
impl RecordingAudio {
    pub fn cues(&self) -> Vec<Cue> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                AudioEvent::Cue(cue) => Some(*cue),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, cue: Cue) -> usize {
        self.cues().iter().filter(|&&c| c == cue).count()
    }

    pub fn clear(&self) {
        self.events.borrow_mut().clear();
    }
}

#[cfg(test)]
impl AudioSink for RecordingAudio {
    fn play(&mut self, cue: Cue) {
        self.events.borrow_mut().push(AudioEvent::Cue(cue));
    }
    fn start_music(&mut self) {
        self.events.borrow_mut().push(AudioEvent::StartMusic);
    }
    fn stop_music(&mut self) {
        self.events.borrow_mut().push(AudioEvent::StopMusic);
    }
    fn resume_music(&mut self) {
        self.events.borrow_mut().push(AudioEvent::ResumeMusic);
    }
}
