//! The snap navigator: turns wheel, key, touch and programmatic requests
//! into at most one eased scroll transition at a time.
//!
//! The navigator never touches the DOM directly. It reads and writes the
//! page offset through a [`ScrollSurface`], reads time from a [`Clock`], and
//! is advanced by calling [`SnapNavigator::tick`] once per animation frame.
//! Observers learn about changes by draining [`NavEvent`]s.

use log::{debug, info, warn};

use crate::checkpoint::{Checkpoint, CheckpointList};
use crate::config::SnapConfig;
use crate::input::{NavKey, TouchTracker, WheelInput};
use crate::NavError;

/// The page's scroll position, which the navigator owns while active.
pub trait ScrollSurface {
    fn scroll_offset(&self) -> f64;
    fn scroll_to(&mut self, offset: f64);
    /// Toggle the document's own smooth-scroll / scroll-snap styling.
    fn set_native_scrolling(&mut self, enabled: bool);
}

/// Monotonic milliseconds.
pub trait Clock {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, PartialEq)]
pub enum NavEvent {
    CheckpointsRebuilt { count: usize },
    TransitionStarted { from: usize, to: usize, id: String },
    CheckpointChanged { index: usize, id: String },
    TransitionComplete { index: usize, id: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Pending,
    Animating,
}

#[derive(Debug, Clone, PartialEq)]
struct Animation {
    index: usize,
    id: String,
    start_offset: f64,
    target_offset: f64,
    started_at: f64,
    duration_ms: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum Transition {
    Idle,
    Pending { index: usize },
    Animating(Animation),
}

pub struct SnapNavigator<S: ScrollSurface, C: Clock> {
    config: SnapConfig,
    surface: S,
    clock: C,
    checkpoints: CheckpointList,
    current_index: usize,
    scroll_energy: f64,
    transition: Transition,
    last_snap_at: Option<f64>,
    last_wheel_at: Option<f64>,
    // TODO: reset after a run of line-mode wheel events so a mouse plugged in
    // mid-session is recognised again.
    trackpad: bool,
    touch: TouchTracker,
    events: Vec<NavEvent>,
    active: bool,
}

impl<S: ScrollSurface, C: Clock> SnapNavigator<S, C> {
    pub fn new(config: SnapConfig, mut surface: S, clock: C, checkpoints: Vec<Checkpoint>) -> Self {
        surface.set_native_scrolling(false);
        let touch = TouchTracker::new(config.touch_sample_window);
        let mut nav = Self {
            config,
            surface,
            clock,
            checkpoints: CheckpointList::default(),
            current_index: 0,
            scroll_energy: 0.0,
            transition: Transition::Idle,
            last_snap_at: None,
            last_wheel_at: None,
            trackpad: false,
            touch,
            events: Vec::new(),
            active: true,
        };
        nav.install_checkpoints(checkpoints);
        info!(
            "SnapNavigator: initialized with {} checkpoints",
            nav.checkpoints.len()
        );
        nav
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn checkpoints(&self) -> &CheckpointList {
        &self.checkpoints
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_checkpoint(&self) -> Option<&Checkpoint> {
        self.checkpoints.get(self.current_index)
    }

    pub fn scroll_energy(&self) -> f64 {
        self.scroll_energy
    }

    pub fn is_trackpad(&self) -> bool {
        self.trackpad
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn phase(&self) -> Phase {
        match self.transition {
            Transition::Idle => Phase::Idle,
            Transition::Pending { .. } => Phase::Pending,
            Transition::Animating(_) => Phase::Animating,
        }
    }

    pub fn is_animating(&self) -> bool {
        matches!(self.transition, Transition::Animating(_))
    }

    /// Take every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<NavEvent> {
        std::mem::take(&mut self.events)
    }

    // ── checkpoints ──────────────────────────────────────────────────────

    /// Replace the checkpoint table after a layout change.
    ///
    /// An in-flight transition keeps heading for the same checkpoint id at
    /// its new offset; if that id is gone the transition is dropped.
    pub fn refresh(&mut self, checkpoints: Vec<Checkpoint>) {
        debug!("SnapNavigator: refreshing checkpoints");
        self.install_checkpoints(checkpoints);
    }

    fn install_checkpoints(&mut self, checkpoints: Vec<Checkpoint>) {
        self.checkpoints = CheckpointList::new(checkpoints);
        self.events.push(NavEvent::CheckpointsRebuilt {
            count: self.checkpoints.len(),
        });
        debug!(
            "SnapNavigator: built checkpoints {:?}",
            self.checkpoints
                .iter()
                .map(|cp| (cp.id.as_str(), cp.anchor_offset))
                .collect::<Vec<_>>()
        );

        let retarget = match &self.transition {
            Transition::Animating(anim) => Some(anim.id.clone()),
            _ => None,
        };
        match retarget {
            Some(id) => match self.checkpoints.position(&id) {
                Some(index) => {
                    let default_ms = self.config.default_duration_ms;
                    if let (Transition::Animating(anim), Some(cp)) =
                        (&mut self.transition, self.checkpoints.get(index))
                    {
                        anim.index = index;
                        anim.target_offset = cp.anchor_offset;
                        anim.duration_ms = cp.duration_or(default_ms);
                    }
                }
                None => {
                    warn!(
                        "SnapNavigator: checkpoint \"{}\" vanished mid-transition, aborting",
                        id
                    );
                    self.transition = Transition::Idle;
                    self.sync_current_index();
                }
            },
            None => self.sync_current_index(),
        }
    }

    fn sync_current_index(&mut self) {
        if self.checkpoints.is_empty() {
            self.current_index = 0;
            return;
        }
        let closest = self.checkpoints.closest_to(self.surface.scroll_offset());
        if closest != self.current_index {
            self.current_index = closest;
            self.push_changed(closest);
        }
        debug!(
            "SnapNavigator: current checkpoint {:?} at index {}",
            self.current_checkpoint().map(|cp| cp.id.as_str()),
            self.current_index
        );
    }

    fn push_changed(&mut self, index: usize) {
        if let Some(cp) = self.checkpoints.get(index) {
            self.events.push(NavEvent::CheckpointChanged {
                index,
                id: cp.id.clone(),
            });
        }
    }

    // ── gating ───────────────────────────────────────────────────────────

    /// True when no transition is pending or running and the cooldown since
    /// the last snap has elapsed.
    pub fn can_snap(&self) -> bool {
        if !matches!(self.transition, Transition::Idle) {
            return false;
        }
        match self.last_snap_at {
            Some(at) => self.clock.now() - at > self.config.cooldown_ms,
            None => true,
        }
    }

    // ── navigation ───────────────────────────────────────────────────────

    /// Jump straight to a named checkpoint, ignoring cooldown and adjacency.
    pub fn navigate_to(&mut self, id: &str) -> Result<(), NavError> {
        if !self.active {
            return Err(NavError::Inactive);
        }
        let index = match self.checkpoints.position(id) {
            Some(index) => index,
            None => {
                warn!("SnapNavigator: checkpoint \"{}\" not found", id);
                return Err(NavError::CheckpointNotFound(id.to_string()));
            }
        };
        debug!("SnapNavigator: programmatic navigation to \"{}\"", id);
        if self.snap_to_index(index) {
            Ok(())
        } else {
            debug!("SnapNavigator: dropped request for \"{}\", transition in flight", id);
            Err(NavError::TransitionInFlight)
        }
    }

    /// Move one checkpoint up (`-1`) or down (`+1`). Returns whether a
    /// transition started.
    pub fn step_direction(&mut self, direction: i32) -> bool {
        if direction == 0 {
            return false;
        }
        let target = self.current_index as i64 + direction.signum() as i64;
        if target < 0 || target >= self.checkpoints.len() as i64 {
            return false;
        }
        if !self.can_snap() {
            return false;
        }
        self.snap_to_index(target as usize)
    }

    fn snap_to_index(&mut self, index: usize) -> bool {
        if index >= self.checkpoints.len() || !matches!(self.transition, Transition::Idle) {
            return false;
        }
        let now = self.clock.now();
        self.last_snap_at = Some(now);
        self.transition = Transition::Pending { index };
        self.begin_animation(now);
        true
    }

    fn begin_animation(&mut self, now: f64) {
        let index = match self.transition {
            Transition::Pending { index } => index,
            _ => return,
        };
        let Some(cp) = self.checkpoints.get(index) else {
            self.transition = Transition::Idle;
            return;
        };
        let anim = Animation {
            index,
            id: cp.id.clone(),
            start_offset: self.surface.scroll_offset(),
            target_offset: cp.anchor_offset,
            started_at: now,
            duration_ms: cp.duration_or(self.config.default_duration_ms),
        };
        debug!(
            "SnapNavigator: snapping to \"{}\" ({} -> {})",
            anim.id, anim.start_offset, anim.target_offset
        );
        self.events.push(NavEvent::TransitionStarted {
            from: self.current_index,
            to: index,
            id: anim.id.clone(),
        });

        if (anim.target_offset - anim.start_offset).abs() < 1.0 {
            self.finish(anim);
        } else {
            self.transition = Transition::Animating(anim);
        }
    }

    fn finish(&mut self, anim: Animation) {
        self.surface.scroll_to(anim.target_offset);
        self.transition = Transition::Idle;
        let changed = self.current_index != anim.index;
        self.current_index = anim.index;
        if changed {
            self.push_changed(anim.index);
        }
        self.events.push(NavEvent::TransitionComplete {
            index: anim.index,
            id: anim.id.clone(),
        });
        debug!("SnapNavigator: snap completed to \"{}\"", anim.id);
    }

    // ── frame loop ───────────────────────────────────────────────────────

    /// Advance one animation frame: decay scroll energy and move any running
    /// transition along its easing curve.
    pub fn tick(&mut self, now: f64) {
        if !self.active {
            return;
        }
        self.decay_energy();

        let Transition::Animating(anim) = &self.transition else {
            return;
        };
        let progress = if anim.duration_ms > 0.0 {
            ((now - anim.started_at) / anim.duration_ms).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if progress < 1.0 {
            let eased = self.config.easing.apply(progress);
            let offset = anim.start_offset + (anim.target_offset - anim.start_offset) * eased;
            self.surface.scroll_to(offset);
        } else if let Transition::Animating(anim) =
            std::mem::replace(&mut self.transition, Transition::Idle)
        {
            self.finish(anim);
        }
    }

    fn decay_energy(&mut self) {
        if self.scroll_energy.abs() > self.config.negligible_energy {
            self.scroll_energy *= self.config.decay_rate;
        } else {
            self.scroll_energy = 0.0;
        }
    }

    // ── input ────────────────────────────────────────────────────────────

    /// Handle a wheel event. Returns whether the browser default should be
    /// prevented.
    pub fn handle_wheel(&mut self, input: WheelInput) -> bool {
        if !self.active {
            return false;
        }
        if !self.trackpad && input.looks_like_trackpad(self.config.trackpad_delta_threshold) {
            self.trackpad = true;
            debug!("SnapNavigator: trackpad input detected");
        }
        if input.is_horizontal() {
            return false;
        }

        let now = self.clock.now();
        if let Some(last) = self.last_wheel_at {
            if now - last < self.config.wheel_debounce_ms {
                return true;
            }
        }
        self.last_wheel_at = Some(now);

        if self.trackpad {
            self.accumulate(input.delta_y);
        } else if input.delta_y != 0.0 && self.can_snap() {
            self.step_direction(if input.delta_y > 0.0 { 1 } else { -1 });
        }
        true
    }

    fn accumulate(&mut self, delta_y: f64) {
        let max = self.config.max_energy;
        self.scroll_energy = (self.scroll_energy + delta_y).clamp(-max, max);
        if self.scroll_energy.abs() >= self.config.energy_threshold && self.can_snap() {
            let direction = if self.scroll_energy > 0.0 { 1 } else { -1 };
            self.scroll_energy = 0.0;
            self.step_direction(direction);
        }
    }

    /// Handle a recognised key. Returns whether the browser default should
    /// be prevented.
    pub fn handle_key(&mut self, key: NavKey) -> bool {
        if !self.active || self.is_animating() {
            return false;
        }
        match key {
            NavKey::Next => {
                self.step_direction(1);
            }
            NavKey::Previous => {
                self.step_direction(-1);
            }
            NavKey::First => {
                self.snap_to_index(0);
            }
            NavKey::Last => {
                if let Some(last) = self.checkpoints.last_index() {
                    self.snap_to_index(last);
                }
            }
        }
        true
    }

    pub fn touch_start(&mut self, touches: u32, y: f64) {
        if self.active {
            self.touch.start(touches, y, self.clock.now());
        }
    }

    pub fn touch_move(&mut self, touches: u32, y: f64) {
        if self.active {
            self.touch.update(touches, y, self.clock.now());
        }
    }

    /// Finish a touch gesture. Returns true when it was a flick, in which
    /// case the browser default should be prevented.
    pub fn touch_end(&mut self) -> bool {
        if !self.active {
            return false;
        }
        let now = self.clock.now();
        let flick = self.touch.finish(
            now,
            self.config.flick_min_velocity,
            self.config.flick_max_duration_ms,
        );
        match flick {
            Some(direction) => {
                if self.can_snap() {
                    self.step_direction(direction);
                }
                true
            }
            None => false,
        }
    }

    // ── teardown ─────────────────────────────────────────────────────────

    /// Stop reacting to input and hand scrolling back to the browser.
    pub fn destroy(&mut self) {
        self.active = false;
        self.transition = Transition::Idle;
        self.scroll_energy = 0.0;
        self.surface.set_native_scrolling(true);
        info!("SnapNavigator: destroyed");
    }
}

/// In-memory seams for driving the navigator without a browser.
pub mod testing {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::{Clock, ScrollSurface};

    /// Clock advanced by hand. Clones share the same time.
    #[derive(Debug, Clone, Default)]
    pub struct ManualClock {
        now: Rc<Cell<f64>>,
    }

    impl ManualClock {
        pub fn starting_at(ms: f64) -> Self {
            Self {
                now: Rc::new(Cell::new(ms)),
            }
        }

        pub fn set(&self, ms: f64) {
            self.now.set(ms);
        }

        pub fn advance(&self, ms: f64) {
            self.now.set(self.now.get() + ms);
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> f64 {
            self.now.get()
        }
    }

    /// Scroll offset held in memory, recording every write.
    #[derive(Debug, Clone, Default)]
    pub struct MemorySurface {
        pub offset: f64,
        pub native_scrolling: bool,
        pub writes: Vec<f64>,
    }

    impl MemorySurface {
        pub fn at(offset: f64) -> Self {
            Self {
                offset,
                native_scrolling: true,
                writes: Vec::new(),
            }
        }
    }

    impl ScrollSurface for MemorySurface {
        fn scroll_offset(&self) -> f64 {
            self.offset
        }

        fn scroll_to(&mut self, offset: f64) {
            self.offset = offset;
            self.writes.push(offset);
        }

        fn set_native_scrolling(&mut self, enabled: bool) {
            self.native_scrolling = enabled;
        }
    }
}
