//! Fixed-step playback clock.
//!
//! The host calls `tick` once per `step_interval` of wall-clock time (or hands
//! raw elapsed time to `advance`, which runs as many fixed ticks as it covers).
//! Each tick moves the virtual time forward by `step_dt`; reaching the end of
//! the timeline clamps and stops.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::SequencerConfig;
use crate::events::{EventQueue, TimelineEvent};

/// Upper bound on ticks run by one `advance` call; the remaining backlog is dropped.
const MAX_CATCHUP_TICKS: usize = 64;

/// Playback state of the timeline clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackState {
    /// Not advancing
    Stopped,
    /// Advancing on every tick
    Playing,
    /// Reached the end of the timeline and stopped there
    Ended,
}

impl PlaybackState {
    /// Get the name of this playback state
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::Ended => "ended",
        }
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

/// Result of one fixed tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Clock not running; nothing to apply.
    Idle,
    /// Time advanced to the given value.
    Advanced(f32),
    /// Time hit the end and was clamped; playback has stopped.
    Ended(f32),
}

impl TickOutcome {
    /// The new time if this tick moved the clock.
    #[inline]
    pub fn time(&self) -> Option<f32> {
        match self {
            Self::Idle => None,
            Self::Advanced(t) | Self::Ended(t) => Some(*t),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackScheduler {
    state: PlaybackState,
    current_time: f32,
    step_interval: Duration,
    step_dt: f32,
    /// Wall-clock time not yet consumed by `advance`.
    backlog: Duration,
    events: EventQueue,
}

impl PlaybackScheduler {
    pub fn new(step_interval: Duration, step_dt: f32) -> Self {
        Self {
            state: PlaybackState::Stopped,
            current_time: 0.0,
            step_interval,
            step_dt,
            backlog: Duration::ZERO,
            events: EventQueue::default(),
        }
    }

    pub fn from_config(cfg: &SequencerConfig) -> Self {
        let mut s = Self::new(cfg.tick_interval(), cfg.tick_dt);
        s.events = EventQueue::with_capacity(cfg.max_events_per_tick);
        s
    }

    #[inline]
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    #[inline]
    pub fn is_playing(&self) -> bool {
        self.state.is_playing()
    }

    #[inline]
    pub fn current_time(&self) -> f32 {
        self.current_time
    }

    #[inline]
    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    #[inline]
    pub fn step_dt(&self) -> f32 {
        self.step_dt
    }

    /// Move the clock without changing state (cursor scrubs, drags).
    pub fn seek(&mut self, time: f32) {
        self.current_time = time;
    }

    /// Start playing. Returns false if already playing.
    /// Starting from the end of the timeline rewinds to 0.
    pub fn start(&mut self, duration: f32) -> bool {
        if self.state.is_playing() {
            return false;
        }
        if self.state == PlaybackState::Ended || self.current_time >= duration {
            self.current_time = 0.0;
        }
        self.state = PlaybackState::Playing;
        self.backlog = Duration::ZERO;
        log::debug!("playback started at t={}", self.current_time);
        self.events.push(TimelineEvent::PlaybackStarted {
            time: self.current_time,
        });
        true
    }

    /// Stop playing. Returns false if it was not playing.
    pub fn stop(&mut self) -> bool {
        if !self.state.is_playing() {
            return false;
        }
        self.state = PlaybackState::Stopped;
        log::debug!("playback stopped at t={}", self.current_time);
        self.events.push(TimelineEvent::PlaybackStopped {
            time: self.current_time,
        });
        true
    }

    /// Start if stopped, stop if playing. Returns whether it is now playing.
    pub fn toggle(&mut self, duration: f32) -> bool {
        if self.state.is_playing() {
            self.stop();
        } else {
            self.start(duration);
        }
        self.state.is_playing()
    }

    /// Advance one fixed step.
    pub fn tick(&mut self, duration: f32) -> TickOutcome {
        if !self.state.is_playing() {
            return TickOutcome::Idle;
        }
        self.current_time += self.step_dt;
        if self.current_time > duration {
            self.current_time = duration;
            self.state = PlaybackState::Ended;
            log::debug!("playback reached end t={duration}");
            self.events
                .push(TimelineEvent::PlaybackEnded { time: duration });
            return TickOutcome::Ended(duration);
        }
        TickOutcome::Advanced(self.current_time)
    }

    /// Feed wall-clock time and run every fixed tick it covers.
    pub fn advance(&mut self, elapsed: Duration, duration: f32) -> Vec<TickOutcome> {
        if !self.state.is_playing() || self.step_interval.is_zero() {
            self.backlog = Duration::ZERO;
            return Vec::new();
        }
        self.backlog += elapsed;
        let mut outcomes = Vec::new();
        while self.backlog >= self.step_interval && self.state.is_playing() {
            if outcomes.len() == MAX_CATCHUP_TICKS {
                log::debug!("playback backlog of {:?} dropped", self.backlog);
                self.backlog = Duration::ZERO;
                break;
            }
            self.backlog -= self.step_interval;
            outcomes.push(self.tick(duration));
        }
        if !self.state.is_playing() {
            self.backlog = Duration::ZERO;
        }
        outcomes
    }

    pub fn drain_events(&mut self) -> Vec<TimelineEvent> {
        self.events.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scheduler() -> PlaybackScheduler {
        PlaybackScheduler::new(Duration::from_millis(50), 0.1)
    }

    #[test]
    fn test_playback_state_name() {
        assert_eq!(PlaybackState::Stopped.name(), "stopped");
        assert_eq!(PlaybackState::Playing.name(), "playing");
        assert_eq!(PlaybackState::Ended.name(), "ended");
    }

    #[test]
    fn start_and_stop_are_idempotent() {
        let mut s = scheduler();
        assert!(s.start(1.0));
        assert!(!s.start(1.0));
        assert!(s.stop());
        assert!(!s.stop());
        let names: Vec<&str> = s.drain_events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["playback_started", "playback_stopped"]);
    }

    #[test]
    fn tick_is_idle_when_stopped() {
        let mut s = scheduler();
        assert_eq!(s.tick(1.0), TickOutcome::Idle);
        assert_eq!(s.current_time(), 0.0);
    }

    #[test]
    fn ticks_until_clamped_at_end() {
        let mut s = scheduler();
        s.start(0.35);
        assert!(matches!(s.tick(0.35), TickOutcome::Advanced(_)));
        assert!(matches!(s.tick(0.35), TickOutcome::Advanced(_)));
        assert!(matches!(s.tick(0.35), TickOutcome::Advanced(_)));
        assert_eq!(s.tick(0.35), TickOutcome::Ended(0.35));
        assert_eq!(s.state(), PlaybackState::Ended);
        assert_eq!(s.current_time(), 0.35);
        assert_eq!(s.tick(0.35), TickOutcome::Idle);
    }

    #[test]
    fn restart_after_end_rewinds() {
        let mut s = scheduler();
        s.seek(1.0);
        s.start(1.0);
        assert_eq!(s.current_time(), 0.0);
    }

    #[test]
    fn advance_runs_whole_ticks_and_keeps_remainder() {
        let mut s = scheduler();
        s.start(10.0);
        let out = s.advance(Duration::from_millis(120), 10.0);
        assert_eq!(out.len(), 2);
        let out = s.advance(Duration::from_millis(30), 10.0);
        assert_eq!(out.len(), 1);
        assert!((s.current_time() - 0.3).abs() < 1e-5);
    }

    #[test]
    fn advance_caps_catch_up() {
        let mut s = scheduler();
        s.start(1000.0);
        let out = s.advance(Duration::from_secs(60), 1000.0);
        assert_eq!(out.len(), MAX_CATCHUP_TICKS);
        assert!(s.advance(Duration::ZERO, 1000.0).is_empty());
    }
}
