//! Classic falling-block puzzle engine
//!
//! The core (`board`, `piece`, `clock`, `score`, `game`) knows nothing about
//! terminals or sound devices. Audio and record persistence reach it through
//! the `AudioSink` and `RecordStore` traits; `ui` only reads engine state.

pub mod audio;
pub mod board;
pub mod clock;
pub mod game;
pub mod input;
pub mod menu;
pub mod piece;
pub mod records;
pub mod score;
pub mod settings;
pub mod tetromino;
pub mod ui;
