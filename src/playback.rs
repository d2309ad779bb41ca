//! Step playback
//!
//! [`PlaybackController`] walks a [`StepSequence`] one step at a time, either
//! manually or on a timer. The timer is a single owned deadline: the event
//! loop asks [`PlaybackController::time_until_tick`] how long it may block
//! and calls [`PlaybackController::poll`] when it wakes.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::snapshot::{Step, StepSequence};

/// Description shown before anything has been run
pub const READY_MESSAGE: &str = "Ready to run";

/// Timer settings (`[playback]` config section), all in milliseconds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_speed_ms")]
    pub default_speed_ms: u64,
    #[serde(default = "default_min_speed_ms")]
    pub min_speed_ms: u64,
    #[serde(default = "default_max_speed_ms")]
    pub max_speed_ms: u64,
    /// Change applied by one speed-up or slow-down keypress
    #[serde(default = "default_speed_step_ms")]
    pub speed_step_ms: u64,
}

fn default_speed_ms() -> u64 {
    500
}
fn default_min_speed_ms() -> u64 {
    50
}
fn default_max_speed_ms() -> u64 {
    1000
}
fn default_speed_step_ms() -> u64 {
    50
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_speed_ms: default_speed_ms(),
            min_speed_ms: default_min_speed_ms(),
            max_speed_ms: default_max_speed_ms(),
            speed_step_ms: default_speed_step_ms(),
        }
    }
}

impl PlaybackConfig {
    fn min_speed(&self) -> Duration {
        Duration::from_millis(self.min_speed_ms)
    }

    fn max_speed(&self) -> Duration {
        // A max below the min would make clamping panic
        Duration::from_millis(self.max_speed_ms.max(self.min_speed_ms))
    }

    fn speed_step(&self) -> Duration {
        Duration::from_millis(self.speed_step_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    Paused,
    Playing,
}

/// What the visualizer should draw right now
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepView<'a> {
    pub array: &'a [f64],
    pub highlights: &'a [usize],
    pub description: &'a str,
}

impl<'a> From<&'a Step> for StepView<'a> {
    fn from(step: &'a Step) -> Self {
        StepView {
            array: &step.array,
            highlights: &step.highlights,
            description: &step.description,
        }
    }
}

impl StepView<'_> {
    pub fn is_highlighted(&self, index: usize) -> bool {
        self.highlights.contains(&index)
    }
}

/// Cursor over a loaded step sequence with an optional auto-advance timer.
///
/// At most one tick is ever pending; every state transition cancels it
/// before optionally arming a new one.
#[derive(Debug)]
pub struct PlaybackController {
    steps: StepSequence,
    cursor: usize,
    state: PlaybackState,
    speed: Duration,
    pending_tick: Option<Instant>,
    config: PlaybackConfig,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new(PlaybackConfig::default())
    }
}

impl PlaybackController {
    pub fn new(config: PlaybackConfig) -> Self {
        let mut controller = PlaybackController {
            steps: StepSequence::new(),
            cursor: 0,
            state: PlaybackState::Idle,
            speed: Duration::ZERO,
            pending_tick: None,
            config,
        };
        controller.set_speed(Duration::from_millis(controller.config.default_speed_ms));
        controller
    }

    /// Replace the sequence and rewind to its first step
    pub fn load(&mut self, steps: StepSequence) {
        self.cancel_tick();
        self.cursor = 0;
        self.state = if steps.is_empty() {
            PlaybackState::Idle
        } else {
            PlaybackState::Paused
        };
        debug!(steps = steps.len(), "playback loaded");
        self.steps = steps;
    }

    pub fn steps(&self) -> &StepSequence {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    /// Interval between automatic steps
    pub fn speed(&self) -> Duration {
        self.speed
    }

    pub fn current_step(&self) -> Option<&Step> {
        self.steps.get(self.cursor)
    }

    fn last_index(&self) -> Option<usize> {
        self.steps.len().checked_sub(1)
    }

    pub fn is_at_end(&self) -> bool {
        self.last_index() == Some(self.cursor)
    }

    /// Move one step forward; returns whether the cursor moved
    pub fn step_forward(&mut self) -> bool {
        match self.last_index() {
            Some(last) if self.cursor < last => {
                self.cursor += 1;
                true
            }
            _ => false,
        }
    }

    /// Move one step back; returns whether the cursor moved
    pub fn step_back(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn jump_to_start(&mut self) {
        self.cursor = 0;
    }

    pub fn jump_to_end(&mut self) {
        self.cursor = self.last_index().unwrap_or(0);
    }

    /// Start or stop automatic playback
    pub fn toggle_play(&mut self, now: Instant) {
        match self.state {
            PlaybackState::Idle => {}
            PlaybackState::Playing => self.pause(),
            PlaybackState::Paused => {
                self.cancel_tick();
                if self.is_at_end() {
                    trace!("play requested at last step");
                    return;
                }
                self.state = PlaybackState::Playing;
                self.pending_tick = Some(now + self.speed);
            }
        }
    }

    pub fn pause(&mut self) {
        if self.state == PlaybackState::Playing {
            self.state = PlaybackState::Paused;
        }
        self.cancel_tick();
    }

    /// Set the playback interval, clamped to the configured range.
    ///
    /// An already armed tick keeps its due time.
    pub fn set_speed(&mut self, interval: Duration) {
        self.speed = interval.clamp(self.config.min_speed(), self.config.max_speed());
    }

    /// Shorten the interval by one step
    pub fn speed_up(&mut self) {
        self.set_speed(self.speed.saturating_sub(self.config.speed_step()));
    }

    /// Lengthen the interval by one step
    pub fn slow_down(&mut self) {
        self.set_speed(self.speed.saturating_add(self.config.speed_step()));
    }

    /// Fire the pending tick if it is due; returns whether the cursor moved
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.pending_tick {
            Some(due) if due <= now => {}
            _ => return false,
        }
        self.cancel_tick();
        if self.state != PlaybackState::Playing {
            return false;
        }

        let moved = self.step_forward();
        if self.is_at_end() {
            self.state = PlaybackState::Paused;
            debug!(cursor = self.cursor, "playback reached the last step");
        } else {
            self.pending_tick = Some(now + self.speed);
        }
        moved
    }

    /// Time left before the pending tick, if one is armed
    pub fn time_until_tick(&self, now: Instant) -> Option<Duration> {
        self.pending_tick
            .map(|due| due.saturating_duration_since(now))
    }

    /// The step under the cursor, or `dataset` when nothing is loaded
    pub fn current_view<'a>(&'a self, dataset: &'a [f64]) -> StepView<'a> {
        match self.current_step() {
            Some(step) => StepView::from(step),
            None => StepView {
                array: dataset,
                highlights: &[],
                description: READY_MESSAGE,
            },
        }
    }

    /// Fraction of the sequence shown so far, 0 when empty
    pub fn progress(&self) -> f64 {
        if self.steps.is_empty() {
            return 0.0;
        }
        (self.cursor + 1) as f64 / self.steps.len() as f64
    }

    fn cancel_tick(&mut self) {
        self.pending_tick = None;
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.cancel_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sequence(len: usize) -> StepSequence {
        (0..len)
            .map(|i| Step::new(vec![i as f64], vec![0], format!("step {i}")))
            .collect::<Vec<_>>()
            .into()
    }

    fn loaded(len: usize) -> PlaybackController {
        let mut controller = PlaybackController::default();
        controller.load(sequence(len));
        controller
    }

    #[test]
    fn test_load_resets_cursor_and_pauses() {
        let mut controller = loaded(3);
        let now = Instant::now();
        controller.step_forward();
        controller.toggle_play(now);
        assert!(controller.is_playing());

        controller.load(sequence(5));
        assert_eq!(controller.cursor(), 0);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.time_until_tick(now), None);

        controller.load(StepSequence::new());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_manual_stepping_clamps() {
        let mut controller = loaded(2);
        assert!(!controller.step_back());
        assert!(controller.step_forward());
        assert!(!controller.step_forward());
        assert_eq!(controller.cursor(), 1);

        let mut empty = PlaybackController::default();
        assert!(!empty.step_forward());
        assert_eq!(empty.cursor(), 0);
    }

    #[test]
    fn test_playback_advances_and_stops_at_end() {
        let mut controller = loaded(3);
        let start = Instant::now();
        let speed = controller.speed();
        controller.toggle_play(start);

        assert!(!controller.poll(start));
        assert_eq!(controller.time_until_tick(start), Some(speed));

        let t1 = start + speed;
        assert!(controller.poll(t1));
        assert_eq!(controller.cursor(), 1);
        assert!(controller.is_playing());

        let t2 = t1 + speed;
        assert!(controller.poll(t2));
        assert_eq!(controller.cursor(), 2);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.time_until_tick(t2), None);
        assert!(!controller.poll(t2 + speed));
    }

    #[test]
    fn test_play_at_last_step_stops_immediately() {
        let mut controller = loaded(2);
        controller.jump_to_end();
        let now = Instant::now();
        controller.toggle_play(now);
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert_eq!(controller.cursor(), 1);
        assert_eq!(controller.time_until_tick(now), None);
    }

    #[test]
    fn test_toggle_when_idle_does_nothing() {
        let mut controller = PlaybackController::default();
        controller.toggle_play(Instant::now());
        assert_eq!(controller.state(), PlaybackState::Idle);
    }

    #[test]
    fn test_pause_cancels_tick() {
        let mut controller = loaded(4);
        let now = Instant::now();
        controller.toggle_play(now);
        controller.pause();
        assert_eq!(controller.state(), PlaybackState::Paused);
        assert!(!controller.poll(now + Duration::from_secs(5)));
        assert_eq!(controller.cursor(), 0);
    }

    #[test]
    fn test_speed_is_clamped() {
        let mut controller = PlaybackController::default();
        assert_eq!(controller.speed(), Duration::from_millis(500));
        controller.set_speed(Duration::from_millis(1));
        assert_eq!(controller.speed(), Duration::from_millis(50));
        controller.speed_up();
        assert_eq!(controller.speed(), Duration::from_millis(50));
        controller.set_speed(Duration::from_secs(10));
        assert_eq!(controller.speed(), Duration::from_millis(1000));
        controller.slow_down();
        assert_eq!(controller.speed(), Duration::from_millis(1000));
        controller.speed_up();
        assert_eq!(controller.speed(), Duration::from_millis(950));
    }

    #[test]
    fn test_speed_change_keeps_armed_tick() {
        let mut controller = loaded(3);
        let now = Instant::now();
        controller.toggle_play(now);
        controller.set_speed(Duration::from_millis(50));
        assert_eq!(
            controller.time_until_tick(now),
            Some(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_view_falls_back_to_dataset() {
        let dataset = [3.0, 1.0, 2.0];
        let controller = PlaybackController::default();
        let view = controller.current_view(&dataset);
        assert_eq!(view.array, &dataset);
        assert!(view.highlights.is_empty());
        assert_eq!(view.description, READY_MESSAGE);
        assert_eq!(controller.progress(), 0.0);

        let controller = loaded(4);
        let view = controller.current_view(&dataset);
        assert_eq!(view.description, "step 0");
        assert!(view.is_highlighted(0));
        assert_eq!(controller.progress(), 0.25);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Forward,
        Back,
        Toggle,
        Pause,
        Faster,
        Slower,
        Wait(u64),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            Just(Op::Forward),
            Just(Op::Back),
            Just(Op::Toggle),
            Just(Op::Pause),
            Just(Op::Faster),
            Just(Op::Slower),
            (0u64..2_000).prop_map(Op::Wait),
        ]
    }

    proptest! {
        #[test]
        fn prop_cursor_and_speed_stay_in_range(
            len in 0usize..20,
            ops in proptest::collection::vec(op_strategy(), 0..100),
        ) {
            let mut controller = loaded(len);
            let mut now = Instant::now();
            for op in ops {
                match op {
                    Op::Forward => { controller.step_forward(); }
                    Op::Back => { controller.step_back(); }
                    Op::Toggle => controller.toggle_play(now),
                    Op::Pause => controller.pause(),
                    Op::Faster => controller.speed_up(),
                    Op::Slower => controller.slow_down(),
                    Op::Wait(ms) => {
                        now += Duration::from_millis(ms);
                        controller.poll(now);
                    }
                }

                if len == 0 {
                    prop_assert_eq!(controller.cursor(), 0);
                    prop_assert_eq!(controller.state(), PlaybackState::Idle);
                } else {
                    prop_assert!(controller.cursor() < len);
                }
                prop_assert!(controller.speed() >= Duration::from_millis(50));
                prop_assert!(controller.speed() <= Duration::from_millis(1000));
                // a tick is armed exactly while playing
                prop_assert_eq!(
                    controller.time_until_tick(now).is_some(),
                    controller.is_playing()
                );
            }
        }
    }
}
