use serde::{Deserialize, Serialize};

/// Configuration for the headless browser used to preload pages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Viewport width in pixels (default: 375)
    pub window_width: u32,

    /// Viewport height in pixels (default: 667)
    pub window_height: u32,

    /// Require a user gesture before media plays (default: true)
    pub block_media_autoplay: bool,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: Some(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 17_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/17.0 Mobile/15E148 Safari/604.1"
                    .to_string(),
            ),
            window_width: 375,
            window_height: 667,
            block_media_autoplay: true,
        }
    }
}

impl RendererConfig {
    /// Desktop-sized viewport with the browser's own user agent
    pub fn desktop() -> Self {
        Self {
            user_agent: None,
            window_width: 1280,
            window_height: 800,
            ..Default::default()
        }
    }

    /// Extra command-line switches for the browser process
    pub fn browser_args(&self) -> Vec<&'static str> {
        let mut args = vec![
            "--no-sandbox",
            "--disable-gpu",
            "--disable-dev-shm-usage",
            "--disable-software-rasterizer",
        ];
        if self.block_media_autoplay {
            args.push("--autoplay-policy=user-gesture-required");
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = RendererConfig::default();
        assert!(config.headless);
        assert_eq!(config.window_width, 375);
        assert_eq!(config.window_height, 667);
        assert!(config.block_media_autoplay);
        assert!(config.user_agent.unwrap().contains("iPhone"));
    }

    #[test]
    fn test_desktop_config() {
        let config = RendererConfig::desktop();
        assert_eq!(config.window_width, 1280);
        assert!(config.user_agent.is_none());
        // Inherits defaults for the rest
        assert!(config.headless);
    }

    #[test]
    fn test_autoplay_switch() {
        let mut config = RendererConfig::default();
        assert!(config
            .browser_args()
            .contains(&"--autoplay-policy=user-gesture-required"));

        config.block_media_autoplay = false;
        assert_eq!(config.browser_args().len(), 4);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RendererConfig = toml::from_str("headless = false").unwrap();
        assert!(!config.headless);
        assert_eq!(config.window_width, 375);
    }
}
