//! Cached upstream maintenance-page fetch.
//!
//! `MAINT_ENTER` can attach a page URL; rather than fetch it on every
//! shadowed request, the body is cached for a TTL and refreshed lazily on
//! the first request to see it expire. A failed fetch falls back to a
//! minimal built-in body rather than surfacing the fetch error to the
//! caller.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

const FALLBACK_BODY: &str = r#"{"error":"service in maintenance","status":503}"#;

struct CachedPage {
    body: String,
    content_type: String,
    fetched_at: Instant,
}

#[derive(Default)]
pub struct MaintenancePageCache {
    pages: Mutex<HashMap<String, CachedPage>>,
}

impl MaintenancePageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch (or reuse) the maintenance page body for `url`. Always
    /// succeeds: a fetch failure or missing URL yields the built-in body.
    pub async fn get(&self, client: &reqwest::Client, url: Option<&str>, ttl: Duration, fetch_timeout: Duration, now: Instant) -> (String, String) {
        let Some(url) = url else { return (FALLBACK_BODY.to_string(), "application/json".to_string()) };

        if let Some(cached) = self.pages.lock().get(url) {
            if now.saturating_duration_since(cached.fetched_at) < ttl {
                return (cached.body.clone(), cached.content_type.clone());
            }
        }

        match tokio::time::timeout(fetch_timeout, client.get(url).send()).await {
            Ok(Ok(resp)) => {
                let content_type = resp.headers().get(reqwest::header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).unwrap_or("text/html").to_string();
                match resp.text().await {
                    Ok(body) => {
                        self.pages.lock().insert(url.to_string(), CachedPage { body: body.clone(), content_type: content_type.clone(), fetched_at: now });
                        (body, content_type)
                    }
                    Err(_) => (FALLBACK_BODY.to_string(), "application/json".to_string()),
                }
            }
            _ => (FALLBACK_BODY.to_string(), "application/json".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_falls_back_to_built_in_body() {
        let cache = MaintenancePageCache::new();
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (body, content_type) = rt.block_on(cache.get(&reqwest::Client::new(), None, Duration::from_secs(60), Duration::from_secs(3), Instant::now()));
        assert_eq!(body, FALLBACK_BODY);
        assert_eq!(content_type, "application/json");
    }

    #[test]
    fn unreachable_url_falls_back_to_built_in_body() {
        let cache = MaintenancePageCache::new();
        let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
        let (body, _) = rt.block_on(cache.get(
            &reqwest::Client::new(),
            Some("http://127.0.0.1:1"),
            Duration::from_secs(60),
            Duration::from_millis(200),
            Instant::now(),
        ));
        assert_eq!(body, FALLBACK_BODY);
    }
}
