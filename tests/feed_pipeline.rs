//! End-to-end feed behaviour: store requests, cache, selection, fallback and
//! preloading, wired through [`AppContext`] with in-process doubles.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use browse_forward::app::{AppContext, BrowseError, Result};
use browse_forward::config::{Config, StoreConfig};
use browse_forward::feed::UrlSource;
use browse_forward::fetcher::{HttpRequest, HttpResponse, HttpTransport};
use browse_forward::preload::PreloadState;
use browse_forward::renderer::{NavigationObserver, Renderer, RendererFactory};
use browse_forward::store::MemoryPreferenceStore;

struct StoreDouble {
    status: u16,
    body: String,
    delay: Duration,
    calls: AtomicUsize,
    targets: Mutex<Vec<String>>,
}

impl StoreDouble {
    fn new(status: u16, body: String) -> Arc<Self> {
        Arc::new(Self {
            status,
            body,
            delay: Duration::from_millis(50),
            calls: AtomicUsize::new(0),
            targets: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HttpTransport for StoreDouble {
    async fn post(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(target) = request.header("x-amz-target") {
            self.targets.lock().unwrap().push(target.to_string());
        }
        tokio::time::sleep(self.delay).await;
        Ok(HttpResponse {
            status: self.status,
            body: self.body.clone().into_bytes(),
        })
    }

    async fn get(&self, _url: &str) -> Result<HttpResponse> {
        Ok(HttpResponse {
            status: 404,
            body: Vec::new(),
        })
    }
}

fn feed_body(urls: &[&str]) -> String {
    let items: Vec<_> = urls
        .iter()
        .map(|url| {
            json!({
                "url": {"S": url},
                "title": {"S": format!("Title of {}", url)},
                "thumbnailUrl": {"S": ""},
                "domain": {"S": "example.com"},
                "category": {"S": "science"},
                "isActive": {"BOOL": true}
            })
        })
        .collect();
    json!({"Items": items, "Count": urls.len(), "ScannedCount": urls.len()}).to_string()
}

fn config() -> Config {
    Config {
        store: StoreConfig {
            access_key_id: Some("AKIDEXAMPLE".into()),
            secret_access_key: Some("wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into()),
            max_attempts: 1,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn context(transport: Arc<StoreDouble>) -> AppContext {
    AppContext::with_transport(config(), Arc::new(MemoryPreferenceStore::new()), transport)
        .expect("context")
}

const POOL: [&str; 3] = [
    "https://a.example.com/1",
    "https://b.example.com/2",
    "https://c.example.com/3",
];

#[tokio::test]
async fn concurrent_category_fetches_share_one_request() {
    let transport = StoreDouble::new(200, feed_body(&POOL));
    let ctx = context(transport.clone());

    let (first, second) = tokio::join!(
        ctx.service.fetch_feed_items(Some("science"), None, true, 100),
        ctx.service.fetch_feed_items(Some("science"), None, true, 100),
    );

    assert_eq!(transport.calls(), 1);
    assert_eq!(first.unwrap(), second.unwrap());
    assert_eq!(
        transport.targets.lock().unwrap().as_slice(),
        ["DynamoDB_20120810.Query"]
    );
}

#[tokio::test]
async fn feed_draws_distinct_pages_from_one_cached_pool() {
    let transport = StoreDouble::new(200, feed_body(&POOL));
    let ctx = context(transport.clone());

    let mut prefs = ctx.feed.preferences();
    prefs.select_category("science");
    assert_ok!(ctx.feed.save_preferences(&prefs));

    let mut seen = HashSet::new();
    for _ in 0..POOL.len() {
        seen.insert(ctx.feed.next_url().await.unwrap());
    }

    assert_eq!(transport.calls(), 1);
    assert_eq!(seen.len(), POOL.len());
    assert!(seen.iter().all(|url| POOL.contains(&url.as_str())));
    assert_eq!(ctx.cache.len(), 1);
}

#[tokio::test]
async fn feed_falls_back_to_default_page_on_store_error() {
    let transport = StoreDouble::new(400, "{\"message\":\"bad request\"}".into());
    let ctx = context(transport.clone());

    let url = assert_ok!(ctx.feed.next_url().await);

    assert_eq!(url, ctx.feed.default_url());
    assert_eq!(transport.calls(), 1);
    let err = assert_err!(ctx.feed.next_item().await);
    assert!(matches!(err, BrowseError::Aws { status: 400, .. }));
}

#[tokio::test]
async fn empty_pool_falls_back_to_default_page() {
    let transport = StoreDouble::new(200, feed_body(&[]));
    let ctx = context(transport);

    assert_eq!(ctx.feed.next_url().await.unwrap(), ctx.feed.default_url());
}

struct InstantRenderer {
    url: Option<String>,
}

impl Renderer for InstantRenderer {
    fn load(&mut self, url: &str, observer: NavigationObserver) {
        self.url = Some(url.to_string());
        observer.finished();
    }

    fn stop(&mut self) {}

    fn detach_observer(&mut self) {}

    fn clear_site_data(&mut self) {
        self.url = None;
    }

    fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

struct InstantFactory;

impl RendererFactory for InstantFactory {
    fn create(&self) -> Result<Box<dyn Renderer>> {
        Ok(Box::new(InstantRenderer { url: None }))
    }
}

#[tokio::test]
async fn preload_pipeline_loads_pages_from_the_feed() {
    let transport = StoreDouble::new(200, feed_body(&POOL));
    let ctx = context(transport);
    let pipeline = ctx.preload_pipeline(Arc::new(InstantFactory));

    let url = match pipeline.preload_next().await {
        PreloadState::Ready { url } => url,
        other => panic!("expected a ready page, got {}", other),
    };
    assert!(POOL.contains(&url.as_str()));

    let renderer = pipeline.consume(&url).expect("ready renderer");
    assert_eq!(renderer.current_url(), Some(url.as_str()));
    assert_eq!(pipeline.stats().hits, 1);

    pipeline.shutdown();
}

#[tokio::test]
async fn queued_url_is_preloaded_before_the_feed() {
    let transport = StoreDouble::new(200, feed_body(&POOL));
    let ctx = context(transport.clone());
    let pipeline = ctx.preload_pipeline(Arc::new(InstantFactory));

    assert!(pipeline.enqueue("https://queued.example.com/"));
    let state = pipeline.preload_next().await;

    assert_eq!(
        state,
        PreloadState::Ready {
            url: "https://queued.example.com/".into()
        }
    );
    assert_eq!(transport.calls(), 0);
    pipeline.shutdown();
}
