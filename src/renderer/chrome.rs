use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{
    ClearBrowserCacheParams, ClearBrowserCookiesParams,
};
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::app::{BrowseError, Result};
use crate::domain::display_url;
use crate::renderer::config::RendererConfig;
use crate::renderer::{NavigationObserver, Renderer, RendererFactory};

type PageSlot = Arc<tokio::sync::Mutex<Option<Page>>>;
type ObserverSlot = Arc<Mutex<Option<NavigationObserver>>>;

#[async_trait]
trait Tab: Send + 'static {
    async fn clear_cookies(&self) -> Result<()>;
    async fn clear_cache(&self) -> Result<()>;
    async fn close(self) -> Result<()>;
}

#[async_trait]
impl Tab for Page {
    async fn clear_cookies(&self) -> Result<()> {
        self.execute(ClearBrowserCookiesParams::default())
            .await
            .map(|_| ())
            .map_err(|e| BrowseError::Renderer(e.to_string()))
    }

    async fn clear_cache(&self) -> Result<()> {
        self.execute(ClearBrowserCacheParams::default())
            .await
            .map(|_| ())
            .map_err(|e| BrowseError::Renderer(e.to_string()))
    }

    async fn close(self) -> Result<()> {
        Page::close(self)
            .await
            .map_err(|e| BrowseError::Renderer(e.to_string()))
    }
}

/// Clear site data if asked, then close. Runs as one task so the close
/// never overtakes the clear.
async fn release_tab<T: Tab>(tab: T, clear: bool) {
    if clear {
        if let Err(e) = tab.clear_cookies().await {
            warn!("Failed to clear cookies: {}", e);
        }
        if let Err(e) = tab.clear_cache().await {
            warn!("Failed to clear cache: {}", e);
        }
    }
    if let Err(e) = tab.close().await {
        debug!("Failed to close page: {}", e);
    }
}

/// Launches one headless browser and hands out hidden pages from it
pub struct ChromeRendererFactory {
    browser: Arc<Browser>,
    config: RendererConfig,
    handler: JoinHandle<()>,
}

impl ChromeRendererFactory {
    pub async fn launch(config: RendererConfig) -> Result<Self> {
        let mut builder = BrowserConfig::builder().window_size(config.window_width, config.window_height);
        for arg in config.browser_args() {
            builder = builder.arg(arg);
        }

        if !config.headless {
            builder = builder.with_head();
        }

        let browser_config = builder
            .build()
            .map_err(|e| BrowseError::Renderer(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            BrowseError::Renderer(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        // Drive the browser's event stream
        let handler = tokio::spawn(async move {
            while let Some(_event) = handler.next().await {}
        });

        Ok(Self {
            browser: Arc::new(browser),
            config,
            handler,
        })
    }

    pub async fn with_defaults() -> Result<Self> {
        Self::launch(RendererConfig::default()).await
    }
}

impl Drop for ChromeRendererFactory {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

impl RendererFactory for ChromeRendererFactory {
    fn create(&self) -> Result<Box<dyn Renderer>> {
        Ok(Box::new(ChromeRenderer::new(
            self.browser.clone(),
            self.config.clone(),
        )))
    }
}

/// A single hidden browser tab
pub struct ChromeRenderer {
    browser: Arc<Browser>,
    config: RendererConfig,
    page: PageSlot,
    observer: ObserverSlot,
    task: Option<JoinHandle<()>>,
    url: Option<String>,
    clear_pending: bool,
}

impl ChromeRenderer {
    pub fn new(browser: Arc<Browser>, config: RendererConfig) -> Self {
        Self {
            browser,
            config,
            page: Arc::new(tokio::sync::Mutex::new(None)),
            observer: Arc::new(Mutex::new(None)),
            task: None,
            url: None,
            clear_pending: false,
        }
    }

    /// The loaded page, once navigation has started.
    pub async fn page(&self) -> Option<Page> {
        self.page.lock().await.clone()
    }

    async fn navigate(
        browser: &Browser,
        config: &RendererConfig,
        slot: &PageSlot,
        url: &str,
    ) -> Result<()> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| BrowseError::Renderer(format!("Failed to create page: {}", e)))?;

        if let Some(ref ua) = config.user_agent {
            page.set_user_agent(ua)
                .await
                .map_err(|e| BrowseError::Renderer(format!("Failed to set user agent: {}", e)))?;
        }

        *slot.lock().await = Some(page.clone());

        page.goto(url)
            .await
            .map_err(|e| BrowseError::Renderer(format!("Navigation failed: {}", e)))?;
        page.wait_for_navigation()
            .await
            .map_err(|e| BrowseError::Renderer(format!("Navigation failed: {}", e)))?;

        Ok(())
    }

    fn take_observer(slot: &ObserverSlot) -> Option<NavigationObserver> {
        match slot.lock() {
            Ok(mut observer) => observer.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }

    fn release_page(&mut self) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            return;
        };
        let clear = self.clear_pending;
        // Take the page now so a following load cannot have its new page closed.
        match self.page.try_lock() {
            Ok(mut slot) => {
                if let Some(page) = slot.take() {
                    handle.spawn(release_tab(page, clear));
                }
                self.clear_pending = false;
            }
            // Any deferred release may end up with the page, so all of
            // them carry the clear until the next load.
            Err(_) => {
                let slot = self.page.clone();
                handle.spawn(async move {
                    let page = slot.lock().await.take();
                    if let Some(page) = page {
                        release_tab(page, clear).await;
                    }
                });
            }
        }
    }
}

impl Renderer for ChromeRenderer {
    fn load(&mut self, url: &str, observer: NavigationObserver) {
        self.stop();
        self.clear_pending = false;

        match self.observer.lock() {
            Ok(mut slot) => *slot = Some(observer),
            Err(poisoned) => *poisoned.into_inner() = Some(observer),
        }
        self.url = Some(url.to_string());

        let browser = self.browser.clone();
        let config = self.config.clone();
        let page = self.page.clone();
        let observer = self.observer.clone();
        let url = url.to_string();

        self.task = Some(tokio::spawn(async move {
            let result = Self::navigate(&browser, &config, &page, &url).await;

            let Some(observer) = Self::take_observer(&observer) else {
                return;
            };
            match result {
                Ok(()) => {
                    debug!("Rendered {}", display_url(&url));
                    observer.finished();
                }
                Err(e) => {
                    observer.failed(e.to_string());
                }
            }
        }));
    }

    fn stop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
        self.release_page();
    }

    fn detach_observer(&mut self) {
        Self::take_observer(&self.observer);
    }

    fn clear_site_data(&mut self) {
        self.clear_pending = true;
        self.release_page();
    }

    fn current_url(&self) -> Option<&str> {
        self.url.as_deref()
    }
}

impl Drop for ChromeRenderer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct RecordingTab {
        events: Arc<Mutex<Vec<&'static str>>>,
        fail_clear: bool,
    }

    impl RecordingTab {
        fn record(&self, event: &'static str) {
            self.events.lock().unwrap().push(event);
        }
    }

    #[async_trait]
    impl Tab for RecordingTab {
        async fn clear_cookies(&self) -> Result<()> {
            tokio::task::yield_now().await;
            self.record("cookies");
            if self.fail_clear {
                return Err(BrowseError::Renderer("target closed".into()));
            }
            Ok(())
        }

        async fn clear_cache(&self) -> Result<()> {
            tokio::task::yield_now().await;
            self.record("cache");
            Ok(())
        }

        async fn close(self) -> Result<()> {
            self.record("close");
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_release_clears_before_close() {
        let tab = RecordingTab::default();
        let events = tab.events.clone();

        release_tab(tab, true).await;

        assert_eq!(*events.lock().unwrap(), ["cookies", "cache", "close"]);
    }

    #[tokio::test]
    async fn test_release_closes_even_when_clear_fails() {
        let tab = RecordingTab {
            fail_clear: true,
            ..Default::default()
        };
        let events = tab.events.clone();

        release_tab(tab, true).await;

        assert_eq!(*events.lock().unwrap(), ["cookies", "cache", "close"]);
    }

    #[tokio::test]
    async fn test_plain_release_only_closes() {
        let tab = RecordingTab::default();
        let events = tab.events.clone();

        release_tab(tab, false).await;

        assert_eq!(*events.lock().unwrap(), ["close"]);
    }
}
