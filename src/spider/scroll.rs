use std::time::Duration;

use serde::{Deserialize, Serialize};

/// A single swipe, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeGesture {
    pub from: (u32, u32),
    pub to: (u32, u32),
    pub duration: Duration,
}

/// Decides the swipe used to advance the list after each round.
pub trait ScrollPolicy {
    /// `round` is 1-based.
    fn gesture(&mut self, screen: (u32, u32), round: usize) -> SwipeGesture;
}

/// Periodic longer swipe, e.g. to skip past a sticky banner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LongSwipe {
    pub every: usize,
    pub start_ratio: f64,
    pub end_ratio: f64,
}

/// Vertical swipe through the horizontal center of the screen.
///
/// Ratios are fractions of screen height; the default drags from 90% to 20%.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default = "default_start_ratio")]
    pub start_ratio: f64,

    #[serde(default = "default_end_ratio")]
    pub end_ratio: f64,

    #[serde(default = "default_duration_ms")]
    pub duration_ms: u64,

    #[serde(default)]
    pub long_swipe: Option<LongSwipe>,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            start_ratio: default_start_ratio(),
            end_ratio: default_end_ratio(),
            duration_ms: default_duration_ms(),
            long_swipe: None,
        }
    }
}

fn default_start_ratio() -> f64 { 0.9 }
fn default_end_ratio() -> f64 { 0.2 }
fn default_duration_ms() -> u64 { 300 }

fn at(height: u32, ratio: f64) -> u32 {
    (height as f64 * ratio) as u32
}

impl ScrollPolicy for ScrollConfig {
    fn gesture(&mut self, screen: (u32, u32), round: usize) -> SwipeGesture {
        let (width, height) = screen;
        let (start, end) = match self.long_swipe {
            Some(long) if long.every > 0 && round.is_multiple_of(long.every) => {
                (long.start_ratio, long.end_ratio)
            }
            _ => (self.start_ratio, self.end_ratio),
        };
        let x = width / 2;
        SwipeGesture {
            from: (x, at(height, start)),
            to: (x, at(height, end)),
            duration: Duration::from_millis(self.duration_ms),
        }
    }
}
