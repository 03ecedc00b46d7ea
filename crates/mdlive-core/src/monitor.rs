//! Modification-time polling for the watched document.

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::config::WatchConfig;
use crate::error::WatchError;
use crate::scheduler::{Scheduler, TaskHandle, TaskId, TimerTask};

/// Filesystem primitives the session reads documents through.
pub trait FileSystem {
    fn modified(&self, path: &Path) -> io::Result<SystemTime>;
    fn read_to_string(&self, path: &Path) -> io::Result<String>;
    fn exists(&self, path: &Path) -> bool;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn modified(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[derive(Debug)]
pub enum WatchEvent {
    Updated { content: String, modified: SystemTime },
    /// Only produced when error reporting is enabled.
    Failed(WatchError),
}

#[derive(Debug)]
pub struct FileMonitor {
    path: PathBuf,
    interval: Duration,
    report_errors: bool,
    /// `None` means unknown: the next successful read counts as a change.
    baseline: Option<SystemTime>,
    timer: Option<TaskHandle>,
}

impl FileMonitor {
    pub fn new(path: impl Into<PathBuf>, config: &WatchConfig) -> Self {
        Self {
            path: path.into(),
            interval: Duration::from_millis(config.interval_ms.max(1)),
            report_errors: config.report_errors,
            baseline: None,
            timer: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn baseline(&self) -> Option<SystemTime> {
        self.baseline
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Captures the current modification time as baseline and schedules the
    /// first poll. No-op while already running.
    pub fn start<F: FileSystem>(
        &mut self,
        fs: &F,
        sched: &mut Scheduler<TimerTask>,
        now: Instant,
    ) -> Option<WatchEvent> {
        if self.timer.is_some() {
            return None;
        }
        let event = match fs.modified(&self.path) {
            Ok(modified) => {
                self.baseline = Some(modified);
                None
            }
            Err(source) => self.report(WatchError::Stat {
                path: self.path.clone(),
                source,
            }),
        };
        self.timer = Some(sched.schedule(now, self.interval, TimerTask::PollFile));
        tracing::debug!(path = %self.path.display(), interval_ms = self.interval.as_millis() as u64, "watching");
        event
    }

    pub fn stop(&mut self, sched: &mut Scheduler<TimerTask>) {
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
            tracing::debug!(path = %self.path.display(), "stopped watching");
        }
    }

    /// Switches to a new path. The baseline becomes unknown.
    pub fn set_path(&mut self, path: impl Into<PathBuf>) {
        self.path = path.into();
        self.baseline = None;
    }

    /// Records a modification time seen outside a poll, such as a manual
    /// reload. The baseline only moves forward.
    pub fn observe(&mut self, modified: SystemTime) {
        if self.baseline.map_or(true, |baseline| modified > baseline) {
            self.baseline = Some(modified);
        }
    }

    /// Handles a fired poll continuation and schedules the next one.
    /// Ignores continuations this monitor no longer owns.
    pub fn on_timer<F: FileSystem>(
        &mut self,
        fired: TaskId,
        fs: &F,
        sched: &mut Scheduler<TimerTask>,
        now: Instant,
    ) -> Option<WatchEvent> {
        match &self.timer {
            Some(handle) if handle.is(fired) => {}
            _ => return None,
        }
        self.timer = None;
        let event = self.poll(fs);
        self.timer = Some(sched.schedule(now, self.interval, TimerTask::PollFile));
        event
    }

    /// One poll: read and report the file if its modification time moved
    /// past the baseline.
    pub fn poll<F: FileSystem>(&mut self, fs: &F) -> Option<WatchEvent> {
        let modified = match fs.modified(&self.path) {
            Ok(modified) => modified,
            Err(source) => {
                return self.report(WatchError::Stat {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if self.baseline.is_some_and(|baseline| modified <= baseline) {
            return None;
        }
        match fs.read_to_string(&self.path) {
            Ok(content) => {
                self.baseline = Some(modified);
                tracing::debug!(path = %self.path.display(), bytes = content.len(), "file changed");
                Some(WatchEvent::Updated { content, modified })
            }
            Err(source) => self.report(WatchError::Read {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn report(&self, err: WatchError) -> Option<WatchEvent> {
        if self.report_errors {
            Some(WatchEvent::Failed(err))
        } else {
            tracing::trace!(error = %err, "swallowed transient watch error");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct FakeFs {
        files: HashMap<PathBuf, (SystemTime, String)>,
        unreadable: bool,
    }

    impl FakeFs {
        fn write(&mut self, path: &str, secs: u64, content: &str) {
            self.files.insert(
                PathBuf::from(path),
                (SystemTime::UNIX_EPOCH + Duration::from_secs(secs), content.to_string()),
            );
        }
    }

    impl FileSystem for FakeFs {
        fn modified(&self, path: &Path) -> io::Result<SystemTime> {
            self.files
                .get(path)
                .map(|(modified, _)| *modified)
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn read_to_string(&self, path: &Path) -> io::Result<String> {
            if self.unreadable {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            self.files
                .get(path)
                .map(|(_, content)| content.clone())
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn exists(&self, path: &Path) -> bool {
            self.files.contains_key(path)
        }
    }

    fn monitor(report_errors: bool) -> FileMonitor {
        FileMonitor::new(
            "doc.md",
            &WatchConfig {
                interval_ms: 500,
                report_errors,
            },
        )
    }

    fn updated(event: Option<WatchEvent>) -> Option<String> {
        match event {
            Some(WatchEvent::Updated { content, .. }) => Some(content),
            _ => None,
        }
    }

    #[test]
    fn start_captures_baseline_without_update() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        let mut sched = Scheduler::new();
        let mut mon = monitor(false);

        assert!(mon.start(&fs, &mut sched, Instant::now()).is_none());
        assert_eq!(mon.baseline(), Some(SystemTime::UNIX_EPOCH + Duration::from_secs(10)));
        assert!(mon.poll(&fs).is_none());
    }

    #[test]
    fn one_update_per_strict_increase() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        let mut mon = monitor(false);
        mon.start(&fs, &mut Scheduler::new(), Instant::now());

        fs.write("doc.md", 11, "v2");
        assert_eq!(updated(mon.poll(&fs)), Some("v2".to_string()));
        assert!(mon.poll(&fs).is_none());
        assert!(mon.poll(&fs).is_none());

        fs.write("doc.md", 11, "same mtime");
        assert!(mon.poll(&fs).is_none());

        fs.write("doc.md", 12, "v3");
        assert_eq!(updated(mon.poll(&fs)), Some("v3".to_string()));
    }

    #[test]
    fn failures_are_swallowed_and_keep_baseline() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        let mut mon = monitor(false);
        mon.start(&fs, &mut Scheduler::new(), Instant::now());
        let baseline = mon.baseline();

        fs.write("doc.md", 20, "v2");
        fs.unreadable = true;
        assert!(mon.poll(&fs).is_none());
        assert_eq!(mon.baseline(), baseline);

        fs.unreadable = false;
        assert_eq!(updated(mon.poll(&fs)), Some("v2".to_string()));
    }

    #[test]
    fn failures_are_reported_when_enabled() {
        let fs = FakeFs::default();
        let mut mon = monitor(true);
        let event = mon.poll(&fs);
        assert!(matches!(event, Some(WatchEvent::Failed(WatchError::Stat { .. }))));
        assert_eq!(mon.baseline(), None);
    }

    #[test]
    fn changing_path_forces_next_read() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        fs.write("other.md", 1, "older file");
        let mut mon = monitor(false);
        mon.start(&fs, &mut Scheduler::new(), Instant::now());

        mon.set_path("other.md");
        assert_eq!(mon.baseline(), None);
        assert_eq!(updated(mon.poll(&fs)), Some("older file".to_string()));
        assert!(mon.poll(&fs).is_none());
    }

    #[test]
    fn observe_never_moves_baseline_backwards() {
        let mut mon = monitor(false);
        let t = |secs| SystemTime::UNIX_EPOCH + Duration::from_secs(secs);
        mon.observe(t(20));
        mon.observe(t(5));
        assert_eq!(mon.baseline(), Some(t(20)));
        mon.observe(t(30));
        assert_eq!(mon.baseline(), Some(t(30)));
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        let mut sched = Scheduler::new();
        let mut mon = monitor(false);
        let t0 = Instant::now();

        mon.start(&fs, &mut sched, t0);
        mon.start(&fs, &mut sched, t0);
        assert_eq!(sched.len(), 1);

        mon.stop(&mut sched);
        mon.stop(&mut sched);
        assert!(sched.is_empty());
        assert!(!mon.is_running());
    }

    #[test]
    fn timer_reschedules_and_ignores_stale_ids() {
        let mut fs = FakeFs::default();
        fs.write("doc.md", 10, "v1");
        let mut sched = Scheduler::new();
        let mut mon = monitor(false);
        let t0 = Instant::now();
        mon.start(&fs, &mut sched, t0);

        fs.write("doc.md", 11, "v2");
        let t1 = t0 + Duration::from_millis(500);
        let (fired, task) = sched.pop_due(t1).unwrap();
        assert_eq!(task, TimerTask::PollFile);
        assert_eq!(updated(mon.on_timer(fired, &fs, &mut sched, t1)), Some("v2".to_string()));
        assert_eq!(sched.len(), 1);

        assert!(mon.on_timer(fired, &fs, &mut sched, t1).is_none());
        assert_eq!(sched.len(), 1);
    }

    #[test]
    fn os_filesystem_detects_touched_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.md");
        std::fs::write(&path, "# one").unwrap();
        let base = SystemTime::now() - Duration::from_secs(60);
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(base)
            .unwrap();

        let mut mon = FileMonitor::new(&path, &WatchConfig::default());
        mon.start(&OsFileSystem, &mut Scheduler::new(), Instant::now());
        assert!(mon.poll(&OsFileSystem).is_none());

        std::fs::write(&path, "# two").unwrap();
        std::fs::File::options()
            .write(true)
            .open(&path)
            .unwrap()
            .set_modified(base + Duration::from_secs(30))
            .unwrap();
        assert_eq!(updated(mon.poll(&OsFileSystem)), Some("# two".to_string()));
    }
}
