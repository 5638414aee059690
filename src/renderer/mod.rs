//! Hidden page renderers driven by the preload pipeline.
//!
//! A [`Renderer`] loads one URL at a time and reports the outcome through a
//! [`NavigationObserver`]. The observer resolves at most once: whichever of
//! finish, failure or detach happens first wins and later signals are
//! ignored.
//!
//! ```text
//! PreloadPipeline ──load(url, observer)──▶ Renderer
//!        ▲                                    │
//!        └──────── finished() / failed() ◀────┘
//! ```

mod chrome;
mod config;

pub use chrome::{ChromeRenderer, ChromeRendererFactory};
pub use config::RendererConfig;

use std::sync::{Arc, Mutex};

use tokio::sync::oneshot;

use crate::app::Result;

/// How a navigation ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationResult {
    Finished,
    Failed(String),
}

/// Single-resolution completion handle given to a renderer for one load.
#[derive(Debug, Clone)]
pub struct NavigationObserver {
    sender: Arc<Mutex<Option<oneshot::Sender<NavigationResult>>>>,
}

impl NavigationObserver {
    pub fn channel() -> (Self, oneshot::Receiver<NavigationResult>) {
        let (tx, rx) = oneshot::channel();
        let observer = Self {
            sender: Arc::new(Mutex::new(Some(tx))),
        };
        (observer, rx)
    }

    /// Report a completed navigation. Returns `false` if the observer had
    /// already resolved.
    pub fn finished(&self) -> bool {
        self.resolve(NavigationResult::Finished)
    }

    pub fn failed(&self, error: impl Into<String>) -> bool {
        self.resolve(NavigationResult::Failed(error.into()))
    }

    /// Resolve without a result. The waiting side sees a closed channel.
    pub fn detach(&self) -> bool {
        self.take().is_some()
    }

    pub fn is_resolved(&self) -> bool {
        match self.sender.lock() {
            Ok(sender) => sender.is_none(),
            Err(poisoned) => poisoned.into_inner().is_none(),
        }
    }

    fn take(&self) -> Option<oneshot::Sender<NavigationResult>> {
        match self.sender.lock() {
            Ok(mut sender) => sender.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn resolve(&self, result: NavigationResult) -> bool {
        match self.take() {
            // The receiver may be gone (timed out); the signal still counts
            // as the one resolution.
            Some(tx) => {
                let _ = tx.send(result);
                true
            }
            None => false,
        }
    }
}

/// A hidden page that can be loaded in the background and handed over.
pub trait Renderer: Send {
    /// Begin loading `url`. Completion is reported through `observer`.
    fn load(&mut self, url: &str, observer: NavigationObserver);

    /// Abort any in-progress load.
    fn stop(&mut self);

    /// Forget the current observer so it receives no further callbacks.
    fn detach_observer(&mut self);

    /// Drop cookies, cache and page state.
    fn clear_site_data(&mut self);

    fn current_url(&self) -> Option<&str>;
}

pub trait RendererFactory: Send + Sync {
    fn create(&self) -> Result<Box<dyn Renderer>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_signal_wins() {
        let (observer, rx) = NavigationObserver::channel();
        assert!(observer.finished());
        assert!(!observer.failed("late"));
        assert!(!observer.finished());
        assert_eq!(rx.await.unwrap(), NavigationResult::Finished);
    }

    #[tokio::test]
    async fn test_clones_share_resolution() {
        let (observer, rx) = NavigationObserver::channel();
        let copy = observer.clone();
        assert!(copy.failed("dns"));
        assert!(observer.is_resolved());
        assert!(!observer.finished());
        assert_eq!(rx.await.unwrap(), NavigationResult::Failed("dns".into()));
    }

    #[tokio::test]
    async fn test_detach_closes_channel() {
        let (observer, rx) = NavigationObserver::channel();
        assert!(observer.detach());
        assert!(!observer.finished());
        assert!(rx.await.is_err());
    }

    #[test]
    fn test_signal_after_receiver_dropped_is_consumed() {
        let (observer, rx) = NavigationObserver::channel();
        drop(rx);
        assert!(observer.finished());
        assert!(!observer.finished());
    }
}
