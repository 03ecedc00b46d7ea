//! Simulated progressive reveal of a text buffer.
//!
//! The engine is a small state machine driven by [`TimerTask::StreamTick`]
//! continuations. Positions are counted in `char`s.

use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::StreamingConfig;
use crate::scheduler::{Scheduler, TaskHandle, TaskId, TimerTask};

pub const MAX_CHUNK: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpeedPreset {
    pub name: &'static str,
    pub min_ms: u64,
    pub max_ms: u64,
}

/// Ordered slowest to fastest.
pub const SPEED_PRESETS: [SpeedPreset; 7] = [
    SpeedPreset { name: "Slowest", min_ms: 200, max_ms: 500 },
    SpeedPreset { name: "Slower", min_ms: 150, max_ms: 350 },
    SpeedPreset { name: "Slow", min_ms: 100, max_ms: 250 },
    SpeedPreset { name: "Medium", min_ms: 70, max_ms: 150 },
    SpeedPreset { name: "Fast", min_ms: 40, max_ms: 100 },
    SpeedPreset { name: "Faster", min_ms: 20, max_ms: 60 },
    SpeedPreset { name: "Fastest", min_ms: 10, max_ms: 50 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamPhase {
    Idle,
    Active,
    Complete,
}

impl StreamPhase {
    pub fn label(self) -> &'static str {
        match self {
            StreamPhase::Idle => "STOPPED",
            StreamPhase::Active => "IN PROGRESS",
            StreamPhase::Complete => "COMPLETE",
        }
    }
}

/// Result of one reveal tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Continued,
    /// The run finished; carries the final status line.
    Completed(String),
}

/// Text revealed after advancing `cursor` by `chunk` over `source`.
///
/// Earlier passes are repeated whole; the current pass is cut at
/// `min(cursor mod N + chunk, N)`.
pub fn revealed_text(source: &str, cursor: usize, chunk: usize) -> String {
    let len = source.chars().count();
    if len == 0 {
        return String::new();
    }
    let pos_in_iter = cursor % len;
    let next_pos = (pos_in_iter + chunk).min(len);
    let full_iterations = cursor / len;

    let mut out = source.repeat(full_iterations);
    out.extend(source.chars().take(next_pos));
    out
}

#[derive(Debug)]
pub struct StreamingEngine {
    source: String,
    source_len: usize,
    cursor: usize,
    speed: usize,
    endless: bool,
    phase: StreamPhase,
    buffer: String,
    sticky_bottom: bool,
    timer: Option<TaskHandle>,
    rng: StdRng,
}

impl StreamingEngine {
    pub fn new(config: &StreamingConfig) -> Self {
        Self::with_rng(config, StdRng::from_entropy())
    }

    /// Deterministic chunk sizes and delays, for tests and demos.
    pub fn with_seed(config: &StreamingConfig, seed: u64) -> Self {
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(config: &StreamingConfig, rng: StdRng) -> Self {
        Self {
            source: String::new(),
            source_len: 0,
            cursor: 0,
            speed: config.speed.min(SPEED_PRESETS.len() - 1),
            endless: config.endless,
            phase: StreamPhase::Idle,
            buffer: String::new(),
            sticky_bottom: false,
            timer: None,
            rng,
        }
    }

    pub fn phase(&self) -> StreamPhase {
        self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == StreamPhase::Active
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn endless(&self) -> bool {
        self.endless
    }

    pub fn speed_index(&self) -> usize {
        self.speed
    }

    pub fn preset(&self) -> SpeedPreset {
        SPEED_PRESETS[self.speed]
    }

    /// The view should follow the end of the buffer.
    pub fn sticky_bottom(&self) -> bool {
        self.sticky_bottom
    }

    pub fn has_pending_tick(&self) -> bool {
        self.timer.is_some()
    }

    pub fn status_line(&self) -> String {
        let mode = if self.endless { "ENDLESS" } else { "NORMAL" };
        format!(
            "Streaming: {} ({}, {})",
            self.phase.label(),
            self.preset().name,
            mode
        )
    }

    /// Replaces the text being revealed. An active run continues from the
    /// unchanged cursor.
    pub fn set_source(&mut self, text: impl Into<String>) {
        self.source = text.into();
        self.source_len = self.source.chars().count();
    }

    /// Starts or restarts a run from the beginning.
    pub fn start(&mut self, sched: &mut Scheduler<TimerTask>, now: Instant) -> String {
        self.cancel_timer(sched);
        self.cursor = 0;
        self.phase = StreamPhase::Active;
        self.buffer.clear();
        self.sticky_bottom = true;
        self.timer = Some(sched.schedule(now, Duration::ZERO, TimerTask::StreamTick));
        tracing::info!(chars = self.source_len, speed = self.preset().name, endless = self.endless, "streaming started");
        self.status_line()
    }

    pub fn stop(&mut self, sched: &mut Scheduler<TimerTask>) -> String {
        let was_active = self.is_active();
        self.cancel_timer(sched);
        self.phase = StreamPhase::Idle;
        self.cursor = 0;
        self.sticky_bottom = false;
        if was_active {
            tracing::info!("streaming stopped");
        }
        self.status_line()
    }

    pub fn toggle_endless(&mut self) -> String {
        self.endless = !self.endless;
        self.status_line()
    }

    pub fn increase_speed(&mut self) -> String {
        if self.speed + 1 < SPEED_PRESETS.len() {
            self.speed += 1;
        }
        self.status_line()
    }

    pub fn decrease_speed(&mut self) -> String {
        self.speed = self.speed.saturating_sub(1);
        self.status_line()
    }

    /// Handles a fired tick. Returns `None` for continuations this engine
    /// no longer owns.
    pub fn on_timer(
        &mut self,
        fired: TaskId,
        sched: &mut Scheduler<TimerTask>,
        now: Instant,
    ) -> Option<TickOutcome> {
        match &self.timer {
            Some(handle) if handle.is(fired) => {}
            _ => return None,
        }
        self.timer = None;
        if self.phase != StreamPhase::Active {
            return None;
        }
        Some(self.tick(sched, now))
    }

    fn tick(&mut self, sched: &mut Scheduler<TimerTask>, now: Instant) -> TickOutcome {
        if self.source_len == 0 {
            self.buffer.clear();
            return self.complete();
        }

        let chunk = self.rng.gen_range(1..=MAX_CHUNK);
        self.buffer = revealed_text(&self.source, self.cursor, chunk);
        self.cursor += chunk;

        if self.endless || self.cursor < self.source_len {
            let preset = self.preset();
            let delay = self.rng.gen_range(preset.min_ms..=preset.max_ms);
            self.timer = Some(sched.schedule(now, Duration::from_millis(delay), TimerTask::StreamTick));
            tracing::trace!(cursor = self.cursor, chunk, delay_ms = delay, "stream tick");
            TickOutcome::Continued
        } else {
            self.complete()
        }
    }

    fn complete(&mut self) -> TickOutcome {
        self.phase = StreamPhase::Complete;
        tracing::info!(revealed = self.buffer.chars().count(), "streaming complete");
        TickOutcome::Completed(self.status_line())
    }

    fn cancel_timer(&mut self, sched: &mut Scheduler<TimerTask>) {
        if let Some(handle) = self.timer.take() {
            sched.cancel(handle);
        }
    }
}
