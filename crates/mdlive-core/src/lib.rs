pub mod actions;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod highlight;
pub mod layout;
pub mod markup;
pub mod monitor;
pub mod refresh;
pub mod render;
pub mod scheduler;
pub mod state;
pub mod streaming;
pub mod theme;
pub mod token;
pub mod tokenizer;

pub use actions::*;
pub use config::Config;
pub use controller::Controller;
pub use error::*;
pub use monitor::{FileMonitor, FileSystem, OsFileSystem, WatchEvent};
pub use state::*;
pub use streaming::{StreamingEngine, SPEED_PRESETS};
pub use theme::{ThemeContext, ThemeProfile, THEMES};
pub use token::*;
