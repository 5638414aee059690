//! Single-slot predictive preloading.
//!
//! The pipeline keeps at most one page loading or loaded in a hidden
//! renderer, ready to be swapped in when the user moves forward:
//!
//! ```text
//! Idle ──start──▶ Preloading ──finished──▶ Ready ──consume──▶ Idle
//!                     │                                        ▲
//!                     └──failed / 30s timeout──▶ Failed ───────┘
//! ```
//!
//! Memory pressure drops everything back to `Idle` from any state without
//! firing a completion.

pub mod state;

pub use state::{PreloadState, PreloadStats};

use std::collections::VecDeque;
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::{error::Elapsed, Instant};
use tracing::{debug, info, warn};

use crate::app::{BrowseError, Result};
use crate::domain::display_url;
use crate::feed::UrlSource;
use crate::renderer::{NavigationObserver, NavigationResult, Renderer, RendererFactory};

pub const DEFAULT_PRELOAD_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_QUEUE: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreloadConfig {
    pub timeout: Duration,
    /// Look-ahead URLs held before the feed is consulted.
    pub max_queue: usize,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_PRELOAD_TIMEOUT,
            max_queue: DEFAULT_MAX_QUEUE,
        }
    }
}

enum Slot {
    Idle,
    Preloading {
        url: String,
        renderer: Box<dyn Renderer>,
    },
    Ready {
        url: String,
        renderer: Box<dyn Renderer>,
    },
    Failed {
        url: String,
        reason: String,
    },
}

impl Slot {
    fn state(&self) -> PreloadState {
        match self {
            Slot::Idle => PreloadState::Idle,
            Slot::Preloading { url, .. } => PreloadState::Preloading { url: url.clone() },
            Slot::Ready { url, .. } => PreloadState::Ready { url: url.clone() },
            Slot::Failed { url, reason } => PreloadState::Failed {
                url: url.clone(),
                reason: reason.clone(),
            },
        }
    }
}

struct Inner {
    slot: Slot,
    /// Bumped on every hard interrupt; a cycle from an older generation
    /// must not touch the slot.
    generation: u64,
    cycle_active: bool,
    cycle: Option<JoinHandle<()>>,
    observer: Option<NavigationObserver>,
    idle: Option<Box<dyn Renderer>>,
    queue: VecDeque<String>,
    stats: PreloadStats,
    closed: bool,
}

impl Inner {
    fn begin_cycle(&mut self) -> Option<u64> {
        if self.closed || self.cycle_active {
            return None;
        }
        self.cycle_active = true;
        Some(self.generation)
    }

    fn end_cycle(&mut self, generation: u64) {
        if self.generation == generation {
            self.cycle_active = false;
            self.cycle = None;
            self.observer = None;
        }
    }

    fn interrupt(&mut self, clear_site_data: bool) {
        self.generation += 1;
        self.cycle_active = false;

        // Closing the channel wakes an in-flight cycle, which then sees the
        // new generation and exits quietly.
        if let Some(observer) = self.observer.take() {
            observer.detach();
        }
        if let Some(cycle) = self.cycle.take() {
            cycle.abort();
        }

        let mut renderers = Vec::new();
        match mem::replace(&mut self.slot, Slot::Idle) {
            Slot::Preloading { renderer, .. } | Slot::Ready { renderer, .. } => {
                renderers.push(renderer)
            }
            Slot::Idle | Slot::Failed { .. } => {}
        }
        renderers.extend(self.idle.take());

        for mut renderer in renderers {
            renderer.detach_observer();
            if clear_site_data {
                renderer.clear_site_data();
            }
            renderer.stop();
        }
        self.queue.clear();
    }
}

struct Shared {
    inner: Mutex<Inner>,
    /// Signalled whenever a cycle ends or is interrupted.
    cycle_done: Notify,
    urls: Arc<dyn UrlSource>,
    factory: Arc<dyn RendererFactory>,
    config: PreloadConfig,
}

/// Cheap to clone; all clones drive the same slot.
#[derive(Clone)]
pub struct PreloadPipeline {
    shared: Arc<Shared>,
}

type LoadOutcome = std::result::Result<std::result::Result<NavigationResult, oneshot::error::RecvError>, Elapsed>;

impl PreloadPipeline {
    pub fn new(
        urls: Arc<dyn UrlSource>,
        factory: Arc<dyn RendererFactory>,
        config: PreloadConfig,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                inner: Mutex::new(Inner {
                    slot: Slot::Idle,
                    generation: 0,
                    cycle_active: false,
                    cycle: None,
                    observer: None,
                    idle: None,
                    queue: VecDeque::new(),
                    stats: PreloadStats::default(),
                    closed: false,
                }),
                cycle_done: Notify::new(),
                urls,
                factory,
                config,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.shared
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn config(&self) -> PreloadConfig {
        self.shared.config
    }

    pub fn state(&self) -> PreloadState {
        self.lock().slot.state()
    }

    pub fn stats(&self) -> PreloadStats {
        self.lock().stats
    }

    /// Whether a cycle (URL selection or load) is underway.
    pub fn is_active(&self) -> bool {
        self.lock().cycle_active
    }

    pub fn has_ready(&self, url: &str) -> bool {
        matches!(&self.lock().slot, Slot::Ready { url: ready, .. } if ready == url)
    }

    /// Queue `url` to be preloaded ahead of the feed. Returns `false` when
    /// the queue is full or already holds it.
    pub fn enqueue(&self, url: impl Into<String>) -> bool {
        let url = url.into();
        let max_queue = self.shared.config.max_queue;
        let mut inner = self.lock();
        if inner.closed || inner.queue.len() >= max_queue || inner.queue.contains(&url) {
            return false;
        }
        debug!("Queued {} for preload", display_url(&url));
        inner.queue.push_back(url);
        true
    }

    pub fn queued(&self) -> Vec<String> {
        self.lock().queue.iter().cloned().collect()
    }

    /// Start a preload cycle in the background. No-op (returns `false`)
    /// while another cycle is running or after shutdown.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_preload(&self) -> bool {
        let mut inner = self.lock();
        let Some(generation) = inner.begin_cycle() else {
            return false;
        };
        let pipeline = self.clone();
        inner.cycle = Some(tokio::spawn(async move {
            pipeline.run_cycle(generation).await;
        }));
        true
    }

    /// Run one preload cycle to completion and return the resulting state.
    /// If a cycle is already running, wait for it to end instead of
    /// starting another.
    pub async fn preload_next(&self) -> PreloadState {
        let notified = self.shared.cycle_done.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        let (generation, in_flight) = {
            let mut inner = self.lock();
            let generation = inner.begin_cycle();
            (generation, generation.is_none() && inner.cycle_active)
        };

        match generation {
            Some(generation) => self.run_cycle(generation).await,
            None if in_flight => {
                debug!("Waiting for the running preload cycle");
                notified.await;
            }
            None => {}
        }
        self.state()
    }

    async fn next_candidate(&self) -> Result<String> {
        let queued = self.lock().queue.pop_front();
        match queued {
            Some(url) => Ok(url),
            None => self.shared.urls.next_url().await,
        }
    }

    async fn run_cycle(&self, generation: u64) {
        self.cycle(generation).await;
        self.shared.cycle_done.notify_waiters();
    }

    async fn cycle(&self, generation: u64) {
        let url = match self.next_candidate().await {
            Ok(url) => url,
            Err(e) => {
                warn!("No preload candidate: {}", e);
                self.lock().end_cycle(generation);
                return;
            }
        };

        let Some((observer, rx)) = self.begin_load(generation, &url) else {
            self.lock().end_cycle(generation);
            return;
        };

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.shared.config.timeout, rx).await;
        self.complete_load(generation, outcome, observer, started);
    }

    fn begin_load(
        &self,
        generation: u64,
        url: &str,
    ) -> Option<(NavigationObserver, oneshot::Receiver<NavigationResult>)> {
        let mut inner = self.lock();
        if inner.generation != generation {
            return None;
        }

        if let Slot::Ready { url: ready, .. } = &inner.slot {
            if ready == url {
                debug!("{} is already ready", display_url(url));
                return None;
            }
        }

        let mut renderer = match inner.idle.take() {
            Some(renderer) => renderer,
            None => match self.shared.factory.create() {
                Ok(renderer) => renderer,
                Err(e) => {
                    warn!("Failed to create renderer: {}", e);
                    inner.stats.failed += 1;
                    inner.slot = Slot::Failed {
                        url: url.to_string(),
                        reason: e.to_string(),
                    };
                    return None;
                }
            },
        };

        if let Slot::Ready {
            url: stale,
            renderer: mut old,
        } = mem::replace(&mut inner.slot, Slot::Idle)
        {
            debug!("Replacing unconsumed {}", display_url(&stale));
            old.stop();
        }

        let (observer, rx) = NavigationObserver::channel();
        renderer.load(url, observer.clone());

        info!("Preloading {}", display_url(url));
        inner.slot = Slot::Preloading {
            url: url.to_string(),
            renderer,
        };
        inner.observer = Some(observer.clone());
        inner.stats.started += 1;

        Some((observer, rx))
    }

    fn complete_load(
        &self,
        generation: u64,
        outcome: LoadOutcome,
        observer: NavigationObserver,
        started: Instant,
    ) {
        let mut inner = self.lock();
        if inner.generation != generation {
            debug!("Dropping result of interrupted preload");
            return;
        }
        inner.end_cycle(generation);

        let (url, mut renderer) = match mem::replace(&mut inner.slot, Slot::Idle) {
            Slot::Preloading { url, renderer } => (url, renderer),
            other => {
                inner.slot = other;
                return;
            }
        };
        renderer.detach_observer();

        let reason = match outcome {
            Ok(Ok(NavigationResult::Finished)) => {
                info!(
                    "Preloaded {} in {:?}",
                    display_url(&url),
                    started.elapsed()
                );
                inner.stats.succeeded += 1;
                inner.slot = Slot::Ready { url, renderer };
                return;
            }
            Ok(Ok(NavigationResult::Failed(reason))) => {
                inner.stats.failed += 1;
                reason
            }
            Ok(Err(_)) => {
                inner.stats.failed += 1;
                "renderer dropped the navigation".to_string()
            }
            Err(_) => {
                // Late signals from the renderer become no-ops.
                observer.detach();
                inner.stats.timed_out += 1;
                BrowseError::PreloadTimeout.to_string()
            }
        };

        warn!("Preload of {} failed: {}", display_url(&url), reason);
        renderer.stop();
        inner.slot = Slot::Failed { url, reason };
    }

    /// Take the preloaded renderer if it holds `url`. A hit provisions a
    /// fresh renderer and starts the next cycle.
    pub fn consume(&self, url: &str) -> Option<Box<dyn Renderer>> {
        let renderer = {
            let mut inner = self.lock();
            match mem::replace(&mut inner.slot, Slot::Idle) {
                Slot::Ready {
                    url: ready,
                    renderer,
                } if ready == url => {
                    inner.stats.hits += 1;
                    Some(renderer)
                }
                Slot::Failed { url: failed, .. } => {
                    debug!("Clearing failed preload of {}", display_url(&failed));
                    inner.stats.misses += 1;
                    None
                }
                other => {
                    inner.slot = other;
                    inner.stats.misses += 1;
                    None
                }
            }
        };

        if renderer.is_some() {
            self.after_hand_over();
        }
        renderer
    }

    /// Take whatever is ready, regardless of URL.
    pub fn consume_any(&self) -> Option<(String, Box<dyn Renderer>)> {
        let taken = {
            let mut inner = self.lock();
            match mem::replace(&mut inner.slot, Slot::Idle) {
                Slot::Ready { url, renderer } => {
                    inner.stats.hits += 1;
                    Some((url, renderer))
                }
                Slot::Failed { .. } => {
                    inner.stats.misses += 1;
                    None
                }
                other => {
                    inner.slot = other;
                    inner.stats.misses += 1;
                    None
                }
            }
        };

        if taken.is_some() {
            self.after_hand_over();
        }
        taken
    }

    fn after_hand_over(&self) {
        {
            let mut inner = self.lock();
            if inner.idle.is_none() && !inner.closed {
                match self.shared.factory.create() {
                    Ok(renderer) => inner.idle = Some(renderer),
                    Err(e) => warn!("Failed to provision renderer: {}", e),
                }
            }
        }
        self.start_preload();
    }

    /// Drop a ready or failed result. A load in progress is left to finish.
    pub fn discard(&self) {
        let mut inner = self.lock();
        match mem::replace(&mut inner.slot, Slot::Idle) {
            Slot::Ready { url, mut renderer } => {
                debug!("Discarding preloaded {}", display_url(&url));
                renderer.stop();
            }
            preloading @ Slot::Preloading { .. } => inner.slot = preloading,
            Slot::Idle | Slot::Failed { .. } => {}
        }
    }

    /// Stop everything, clear site data and return to `Idle`. No completion
    /// fires for an interrupted load.
    pub fn on_memory_pressure(&self) {
        warn!("Memory pressure: releasing preloaded content");
        self.lock().interrupt(true);
        self.shared.cycle_done.notify_waiters();
    }

    /// Release all renderers; later `start_preload` calls are no-ops.
    pub fn shutdown(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        inner.interrupt(false);
        debug!("Preload pipeline shut down ({})", inner.stats);
        drop(inner);
        self.shared.cycle_done.notify_waiters();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct Harness {
        loads: Mutex<Vec<(String, NavigationObserver)>>,
        created: AtomicUsize,
        stops: AtomicUsize,
        clears: AtomicUsize,
    }

    impl Harness {
        fn load_count(&self) -> usize {
            self.loads.lock().unwrap().len()
        }

        fn observer(&self, index: usize) -> NavigationObserver {
            self.loads.lock().unwrap()[index].1.clone()
        }
    }

    struct MockRenderer {
        harness: Arc<Harness>,
        auto: Option<NavigationResult>,
        url: Option<String>,
        observer: Option<NavigationObserver>,
    }

    impl Renderer for MockRenderer {
        fn load(&mut self, url: &str, observer: NavigationObserver) {
            self.url = Some(url.to_string());
            self.harness
                .loads
                .lock()
                .unwrap()
                .push((url.to_string(), observer.clone()));
            match &self.auto {
                Some(NavigationResult::Finished) => {
                    observer.finished();
                }
                Some(NavigationResult::Failed(e)) => {
                    observer.failed(e.clone());
                }
                None => {}
            }
            self.observer = Some(observer);
        }

        fn stop(&mut self) {
            self.harness.stops.fetch_add(1, Ordering::SeqCst);
        }

        fn detach_observer(&mut self) {
            self.observer = None;
        }

        fn clear_site_data(&mut self) {
            self.harness.clears.fetch_add(1, Ordering::SeqCst);
        }

        fn current_url(&self) -> Option<&str> {
            self.url.as_deref()
        }
    }

    struct MockFactory {
        harness: Arc<Harness>,
        auto: Option<NavigationResult>,
    }

    impl RendererFactory for MockFactory {
        fn create(&self) -> Result<Box<dyn Renderer>> {
            self.harness.created.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(MockRenderer {
                harness: self.harness.clone(),
                auto: self.auto.clone(),
                url: None,
                observer: None,
            }))
        }
    }

    struct RotatingUrls {
        urls: Mutex<VecDeque<String>>,
    }

    impl RotatingUrls {
        fn new(urls: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                urls: Mutex::new(urls.iter().map(|u| u.to_string()).collect()),
            })
        }
    }

    #[async_trait]
    impl UrlSource for RotatingUrls {
        async fn next_url(&self) -> Result<String> {
            let mut urls = self.urls.lock().unwrap();
            let url = urls.pop_front().ok_or(BrowseError::NoItemsAvailable)?;
            urls.push_back(url.clone());
            Ok(url)
        }
    }

    fn pipeline(
        urls: &[&str],
        auto: Option<NavigationResult>,
    ) -> (PreloadPipeline, Arc<Harness>) {
        let harness = Arc::new(Harness::default());
        let factory = Arc::new(MockFactory {
            harness: harness.clone(),
            auto,
        });
        let pipeline = PreloadPipeline::new(RotatingUrls::new(urls), factory, PreloadConfig::default());
        (pipeline, harness)
    }

    async fn wait_for_load(harness: &Harness, count: usize) {
        while harness.load_count() < count {
            tokio::task::yield_now().await;
        }
    }

    const A: &str = "https://a.example.com/page";
    const B: &str = "https://b.example.com/page";
    const C: &str = "https://c.example.com/page";

    #[tokio::test]
    async fn test_successful_preload_becomes_ready() {
        let (pipeline, _) = pipeline(&[A, B], Some(NavigationResult::Finished));

        let state = pipeline.preload_next().await;

        assert_eq!(state, PreloadState::Ready { url: A.into() });
        assert!(pipeline.has_ready(A));
        assert!(!pipeline.has_ready(B));
        assert_eq!(pipeline.stats().succeeded, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_hands_over_and_restarts() {
        let (pipeline, harness) = pipeline(&[A, B], Some(NavigationResult::Finished));
        pipeline.preload_next().await;

        let renderer = pipeline.consume(A).expect("preloaded renderer");
        assert_eq!(renderer.current_url(), Some(A));

        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(pipeline.state(), PreloadState::Ready { url: B.into() });
        assert_eq!(harness.created.load(Ordering::SeqCst), 2);
        assert_eq!(pipeline.stats().hits, 1);
    }

    #[tokio::test]
    async fn test_consume_wrong_url_keeps_slot() {
        let (pipeline, _) = pipeline(&[A], Some(NavigationResult::Finished));
        pipeline.preload_next().await;

        assert!(pipeline.consume(B).is_none());
        assert!(pipeline.has_ready(A));
        assert_eq!(pipeline.stats().misses, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_cycle_and_ignores_late_signal() {
        let (pipeline, harness) = pipeline(&[A], None);

        let state = pipeline.preload_next().await;

        assert_eq!(
            state,
            PreloadState::Failed {
                url: A.into(),
                reason: BrowseError::PreloadTimeout.to_string()
            }
        );
        assert!(!harness.observer(0).finished());
        assert_eq!(harness.stops.load(Ordering::SeqCst), 1);
        assert_eq!(pipeline.stats().timed_out, 1);

        assert!(pipeline.consume(A).is_none());
        assert_eq!(pipeline.state(), PreloadState::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_takes_thirty_seconds() {
        let (pipeline, _) = pipeline(&[A], None);
        let start = Instant::now();
        pipeline.preload_next().await;
        assert_eq!(start.elapsed(), DEFAULT_PRELOAD_TIMEOUT);
    }

    #[tokio::test]
    async fn test_failure_signal_fires_once() {
        let (pipeline, harness) = pipeline(&[A], None);

        let (state, _) = tokio::join!(pipeline.preload_next(), async {
            wait_for_load(&harness, 1).await;
            let observer = harness.observer(0);
            assert!(observer.failed("net::ERR_NAME_NOT_RESOLVED"));
            assert!(!observer.finished());
        });

        assert_eq!(
            state,
            PreloadState::Failed {
                url: A.into(),
                reason: "net::ERR_NAME_NOT_RESOLVED".into()
            }
        );
        assert_eq!(pipeline.stats().failed, 1);
        assert_eq!(pipeline.stats().succeeded, 0);
    }

    #[tokio::test]
    async fn test_start_is_noop_while_cycle_running() {
        let (pipeline, _) = pipeline(&[A], None);
        assert!(pipeline.start_preload());
        assert!(!pipeline.start_preload());
        assert!(pipeline.is_active());
        pipeline.shutdown();
    }

    #[tokio::test]
    async fn test_consecutive_cycles_after_consume() {
        let (pipeline, harness) = pipeline(&[A, B, C], Some(NavigationResult::Finished));

        let mut ready = Vec::new();
        for _ in 0..3 {
            match pipeline.preload_next().await {
                PreloadState::Ready { url } => {
                    assert!(pipeline.consume(&url).is_some());
                    ready.push(url);
                }
                other => panic!("expected a ready page, got {}", other),
            }
        }

        assert_eq!(ready, vec![A, B, C]);
        assert_eq!(harness.load_count(), 3);
        assert_eq!(pipeline.stats().hits, 3);
        pipeline.shutdown();
    }

    #[tokio::test]
    async fn test_preload_next_waits_for_background_cycle() {
        let (pipeline, harness) = pipeline(&[A], None);
        assert!(pipeline.start_preload());

        let (state, _) = tokio::join!(pipeline.preload_next(), async {
            wait_for_load(&harness, 1).await;
            assert!(harness.observer(0).finished());
        });

        assert_eq!(state, PreloadState::Ready { url: A.into() });
        assert_eq!(harness.load_count(), 1);
    }

    #[tokio::test]
    async fn test_waiting_preload_next_wakes_on_memory_pressure() {
        let (pipeline, harness) = pipeline(&[A], None);
        assert!(pipeline.start_preload());

        let (state, _) = tokio::join!(pipeline.preload_next(), async {
            wait_for_load(&harness, 1).await;
            pipeline.on_memory_pressure();
        });

        assert_eq!(state, PreloadState::Idle);
    }

    #[tokio::test]
    async fn test_same_url_already_ready_is_noop() {
        let (pipeline, harness) = pipeline(&[A], Some(NavigationResult::Finished));
        pipeline.preload_next().await;
        let state = pipeline.preload_next().await;

        assert_eq!(state, PreloadState::Ready { url: A.into() });
        assert_eq!(harness.load_count(), 1);
        assert_eq!(pipeline.stats().started, 1);
        assert!(!pipeline.is_active());
    }

    #[tokio::test]
    async fn test_memory_pressure_interrupts_without_completion() {
        let (pipeline, harness) = pipeline(&[A], None);

        let (state, _) = tokio::join!(pipeline.preload_next(), async {
            wait_for_load(&harness, 1).await;
            pipeline.on_memory_pressure();
            assert!(!harness.observer(0).finished());
        });

        assert_eq!(state, PreloadState::Idle);
        let stats = pipeline.stats();
        assert_eq!((stats.succeeded, stats.failed, stats.timed_out), (0, 0, 0));
        assert_eq!(harness.clears.load(Ordering::SeqCst), 1);
        assert!(!pipeline.is_active());
    }

    #[tokio::test]
    async fn test_memory_pressure_drops_ready_slot() {
        let (pipeline, harness) = pipeline(&[A], Some(NavigationResult::Finished));
        pipeline.preload_next().await;

        pipeline.on_memory_pressure();

        assert_eq!(pipeline.state(), PreloadState::Idle);
        assert!(pipeline.consume(A).is_none());
        assert_eq!(harness.stops.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_queue_is_consulted_first() {
        let (pipeline, _) = pipeline(&[A], Some(NavigationResult::Finished));
        assert!(pipeline.enqueue(B));
        assert!(!pipeline.enqueue(B));

        assert_eq!(pipeline.preload_next().await, PreloadState::Ready { url: B.into() });
        assert!(pipeline.queued().is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let (pipeline, _) = pipeline(&[A], None);
        for i in 0..DEFAULT_MAX_QUEUE {
            assert!(pipeline.enqueue(format!("https://q.example.com/{}", i)));
        }
        assert!(!pipeline.enqueue("https://q.example.com/overflow"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_consume_any_takes_ready_page() {
        let (pipeline, _) = pipeline(&[A, B], Some(NavigationResult::Finished));
        pipeline.preload_next().await;

        let (url, _renderer) = pipeline.consume_any().unwrap();
        assert_eq!(url, A);
        pipeline.shutdown();
    }

    #[tokio::test]
    async fn test_discard_ready() {
        let (pipeline, _) = pipeline(&[A], Some(NavigationResult::Finished));
        pipeline.preload_next().await;
        pipeline.discard();
        assert_eq!(pipeline.state(), PreloadState::Idle);
    }

    #[tokio::test]
    async fn test_shutdown_blocks_new_cycles() {
        let (pipeline, _) = pipeline(&[A], Some(NavigationResult::Finished));
        pipeline.shutdown();
        assert!(!pipeline.start_preload());
        assert_eq!(pipeline.preload_next().await, PreloadState::Idle);
    }

    #[tokio::test]
    async fn test_url_source_error_ends_cycle() {
        let (pipeline, harness) = pipeline(&[], Some(NavigationResult::Finished));
        assert_eq!(pipeline.preload_next().await, PreloadState::Idle);
        assert_eq!(harness.load_count(), 0);
        assert!(!pipeline.is_active());
    }
}
