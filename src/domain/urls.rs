use url::Url;

/// Compact form of `url` for logs: `host/path`, without query or fragment.
pub fn display_url(url: &str) -> String {
    if url.starts_with("data:") {
        return "[DATA_URL]".to_string();
    }
    match Url::parse(url) {
        Ok(parsed) => match parsed.host_str() {
            Some(host) => format!("{}{}", host, parsed.path()),
            None => parsed.as_str().to_string(),
        },
        Err(_) => url.chars().take(80).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_scheme_and_query() {
        assert_eq!(
            display_url("https://en.wikipedia.org/wiki/Rust?utm=x#top"),
            "en.wikipedia.org/wiki/Rust"
        );
    }

    #[test]
    fn test_data_urls_are_masked() {
        assert_eq!(display_url("data:text/html,<h1>hi</h1>"), "[DATA_URL]");
    }

    #[test]
    fn test_about_blank_kept() {
        assert_eq!(display_url("about:blank"), "about:blank");
    }
}
