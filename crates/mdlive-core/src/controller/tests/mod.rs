use std::cell::RefCell;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::{Duration, Instant, SystemTime};

use pretty_assertions::assert_eq;

pub(super) use super::Controller;
pub(super) use crate::actions::AppAction;
pub(super) use crate::actions::AppEffect;
pub(super) use crate::actions::RuntimeAction;
pub(super) use crate::actions::UserAction;
pub(super) use crate::config::Config;
pub(super) use crate::monitor::FileSystem;
pub(super) use crate::render::{line_text, BlockRole, TreeKind};
pub(super) use crate::state::{Overlay, ViewMode, Viewport};
pub(super) use crate::streaming::{StreamPhase, StreamingEngine};
pub(super) use crate::theme::{ThemeContext, THEMES};

mod watching;

const DOC: &str = "/docs/notes.md";

#[derive(Debug, Default)]
struct Files {
    entries: HashMap<PathBuf, (SystemTime, String)>,
    unreadable: bool,
}

/// In-memory filesystem shared between a test and the controller it drives.
#[derive(Debug, Clone, Default)]
struct MemFs {
    files: Rc<RefCell<Files>>,
}

impl MemFs {
    fn write(&self, path: &str, secs: u64, content: &str) {
        self.files.borrow_mut().entries.insert(
            PathBuf::from(path),
            (mtime(secs), content.to_string()),
        );
    }

    fn remove(&self, path: &str) {
        self.files.borrow_mut().entries.remove(Path::new(path));
    }

    fn set_unreadable(&self, unreadable: bool) {
        self.files.borrow_mut().unreadable = unreadable;
    }
}

impl FileSystem for MemFs {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        self.files
            .borrow()
            .entries
            .get(path)
            .map(|(modified, _)| *modified)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let files = self.files.borrow();
        if files.unreadable {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"));
        }
        files
            .entries
            .get(path)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.borrow().entries.contains_key(path)
    }
}

fn mtime(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

fn viewport() -> Viewport {
    Viewport {
        width: 60,
        height: 20,
    }
}

/// A started controller over `fs` with a seeded playback engine.
fn started(fs: &MemFs, t0: Instant) -> Controller<MemFs> {
    started_with(fs, &Config::default(), t0)
}

fn started_with(fs: &MemFs, config: &Config, t0: Instant) -> Controller<MemFs> {
    let mut ctl = Controller::new(fs.clone(), DOC, config, ThemeContext::default())
        .with_streaming(StreamingEngine::with_seed(&config.streaming, 11));
    let effects = ctl.start(viewport(), t0);
    assert_eq!(effects, vec![AppEffect::RequestFrame]);
    ctl
}

fn user(ctl: &mut Controller<MemFs>, action: UserAction, now: Instant) -> Vec<AppEffect> {
    ctl.handle(AppAction::User(action), now)
}

fn tick(ctl: &mut Controller<MemFs>, now: Instant) -> Vec<AppEffect> {
    ctl.handle(AppAction::Runtime(RuntimeAction::Tick), now)
}

/// Advances to each pending deadline in turn until `until` is reached.
fn run_until(ctl: &mut Controller<MemFs>, until: Instant) {
    while let Some(deadline) = ctl.next_deadline() {
        if deadline > until {
            break;
        }
        tick(ctl, deadline);
    }
}

fn tree_id(ctl: &Controller<MemFs>) -> u64 {
    ctl.tree().map(|tree| tree.id).unwrap_or(0)
}

fn block_text(ctl: &Controller<MemFs>) -> Vec<Vec<String>> {
    ctl.tree()
        .map(|tree| tree.blocks.iter().map(|block| block.text_lines()).collect())
        .unwrap_or_default()
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}
