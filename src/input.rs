//! Platform-neutral input samples and the touch flick tracker.

use std::collections::VecDeque;

/// Unit of a wheel delta, matching `WheelEvent.deltaMode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaMode {
    Pixel,
    Line,
    Page,
}

impl DeltaMode {
    pub fn from_dom(mode: u32) -> Self {
        match mode {
            0 => DeltaMode::Pixel,
            1 => DeltaMode::Line,
            _ => DeltaMode::Page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub delta_x: f64,
    pub delta_y: f64,
    pub mode: DeltaMode,
}

impl WheelInput {
    pub fn vertical(delta_y: f64, mode: DeltaMode) -> Self {
        Self {
            delta_x: 0.0,
            delta_y,
            mode,
        }
    }

    pub fn is_horizontal(&self) -> bool {
        self.delta_x.abs() > self.delta_y.abs()
    }

    /// Small pixel-mode deltas come from trackpads.
    pub fn looks_like_trackpad(&self, threshold: f64) -> bool {
        self.delta_y.abs() < threshold && self.mode == DeltaMode::Pixel
    }
}

/// Keys the navigator reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Next,
    Previous,
    First,
    Last,
}

impl NavKey {
    /// Map a `KeyboardEvent.key` value.
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "ArrowDown" | "PageDown" | " " => Some(NavKey::Next),
            "ArrowUp" | "PageUp" => Some(NavKey::Previous),
            "Home" => Some(NavKey::First),
            "End" => Some(NavKey::Last),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TouchSample {
    y: f64,
    time: f64,
}

/// Single-finger gesture tracker. Keeps the last few move samples and
/// decides on release whether the gesture was a flick.
#[derive(Debug, Clone)]
pub struct TouchTracker {
    start: Option<TouchSample>,
    samples: VecDeque<TouchSample>,
    window: usize,
}

impl TouchTracker {
    pub fn new(window: usize) -> Self {
        let window = window.max(2);
        Self {
            start: None,
            samples: VecDeque::with_capacity(window),
            window,
        }
    }

    pub fn is_tracking(&self) -> bool {
        self.start.is_some()
    }

    pub fn start(&mut self, touches: u32, y: f64, now: f64) {
        if touches != 1 {
            return;
        }
        self.start = Some(TouchSample { y, time: now });
        self.samples.clear();
    }

    pub fn update(&mut self, touches: u32, y: f64, now: f64) {
        if self.start.is_none() || touches != 1 {
            return;
        }
        self.samples.push_back(TouchSample { y, time: now });
        while self.samples.len() > self.window {
            self.samples.pop_front();
        }
    }

    /// Finish the gesture. Returns the step direction for a flick: `+1`
    /// when the finger moved up (content goes to the next section), `-1`
    /// when it moved down.
    pub fn finish(&mut self, now: f64, min_velocity: f64, max_duration_ms: f64) -> Option<i32> {
        let start = self.start.take()?;
        let samples: Vec<TouchSample> = self.samples.drain(..).collect();

        if samples.len() < 2 {
            return None;
        }
        let earliest = samples[0];
        let latest = samples[samples.len() - 1];
        let distance = latest.y - earliest.y;
        let elapsed = latest.time - earliest.time;
        let velocity = if elapsed > 0.0 {
            (distance / elapsed).abs()
        } else if distance != 0.0 {
            f64::INFINITY
        } else {
            0.0
        };
        let duration = now - start.time;

        if velocity > min_velocity && duration < max_duration_ms {
            Some(if distance < 0.0 { 1 } else { -1 })
        } else {
            None
        }
    }
}
