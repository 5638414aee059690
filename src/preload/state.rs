use std::fmt;

use crate::domain::display_url;

/// Observable state of the preload slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PreloadState {
    Idle,
    Preloading { url: String },
    Ready { url: String },
    Failed { url: String, reason: String },
}

impl PreloadState {
    pub fn url(&self) -> Option<&str> {
        match self {
            PreloadState::Idle => None,
            PreloadState::Preloading { url }
            | PreloadState::Ready { url }
            | PreloadState::Failed { url, .. } => Some(url),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, PreloadState::Ready { .. })
    }
}

impl fmt::Display for PreloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreloadState::Idle => write!(f, "idle"),
            PreloadState::Preloading { url } => write!(f, "preloading {}", display_url(url)),
            PreloadState::Ready { url } => write!(f, "ready {}", display_url(url)),
            PreloadState::Failed { url, reason } => {
                write!(f, "failed {} ({})", display_url(url), reason)
            }
        }
    }
}

/// Counters for preload effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PreloadStats {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timed_out: u64,
    /// Consumes that got a preloaded page
    pub hits: u64,
    /// Consumes that had to load on demand
    pub misses: u64,
}

impl PreloadStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

impl fmt::Display for PreloadStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "started {}, ready {}, failed {}, timed out {}, hit rate {:.0}% ({}/{})",
            self.started,
            self.succeeded,
            self.failed,
            self.timed_out,
            self.hit_rate() * 100.0,
            self.hits,
            self.hits + self.misses
        )
    }
}
