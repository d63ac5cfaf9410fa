//! HTTP client for the catalog and evaluation sites.

use anyhow::{Context, Result};
use async_trait::async_trait;
use cookie::Cookie;
use rand::Rng;
use reqwest::cookie::Jar;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, trace};
use url::Url;

use crate::config::Config;
use crate::portal::errors::ScrapeError;
use crate::portal::urls::Endpoints;
use crate::utils::{fmt_duration, log_if_slow};

/// Name of the session cookie the evaluation site authenticates with.
pub const SESSION_COOKIE: &str = "SESSID";

const SLOW_FETCH_THRESHOLD: Duration = Duration::from_secs(10);

/// Source of page bodies. Pipelines only depend on this, so they can run
/// against recorded fixtures.
#[async_trait]
pub trait Fetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError>;
}

/// Randomized pause taken before every request to keep load on the portal low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    min: Duration,
    max: Duration,
}

impl Pacing {
    pub fn new(min_ms: u64, max_ms: u64) -> Self {
        let (lo, hi) = if min_ms <= max_ms {
            (min_ms, max_ms)
        } else {
            (max_ms, min_ms)
        };
        Self {
            min: Duration::from_millis(lo),
            max: Duration::from_millis(hi),
        }
    }

    fn next_delay(&self) -> Duration {
        if self.max.is_zero() {
            return Duration::ZERO;
        }
        let lo = self.min.as_millis() as u64;
        let hi = self.max.as_millis() as u64;
        Duration::from_millis(rand::rng().random_range(lo..=hi))
    }

    pub async fn wait(&self) {
        let delay = self.next_delay();
        if !delay.is_zero() {
            trace!(delay = fmt_duration(delay), "pacing before request");
            tokio::time::sleep(delay).await;
        }
    }
}

/// Client for fetching catalog, course and evaluation pages.
pub struct PortalClient {
    http: reqwest::Client,
    pacing: Pacing,
    evaluation_host: String,
}

impl PortalClient {
    pub fn new(config: &Config) -> Result<Self> {
        let endpoints = config.endpoints();
        let jar = Jar::default();

        if let Some(session_id) = config.session_id.as_deref() {
            let host = Url::parse(endpoints.evaluation_host())
                .context("Invalid evaluation host URL")?;
            jar.add_cookie_str(&Cookie::new(SESSION_COOKIE, session_id).to_string(), &host);
        }

        let http = reqwest::Client::builder()
            .cookie_provider(Arc::new(jar))
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            pacing: Pacing::new(config.delay_min_ms, config.delay_max_ms),
            evaluation_host: Self::host_of(&endpoints),
        })
    }

    fn host_of(endpoints: &Endpoints) -> String {
        Url::parse(endpoints.evaluation_host())
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// The evaluation site bounces expired sessions to its login page, so a
    /// redirect away from the requested path means the cookie was rejected.
    fn is_session_redirect(&self, requested: &str, landed: &Url) -> bool {
        let Ok(requested) = Url::parse(requested) else {
            return false;
        };
        requested.host_str() == Some(self.evaluation_host.as_str())
            && requested.path() != landed.path()
    }
}

#[async_trait]
impl Fetch for PortalClient {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        self.pacing.wait().await;

        let start = Instant::now();
        let resp = self.http.get(url).send().await?;
        let status = resp.status();
        log_if_slow(start, SLOW_FETCH_THRESHOLD, url);

        if !status.is_success() {
            return Err(ScrapeError::Status {
                status,
                url: url.to_string(),
            });
        }
        if self.is_session_redirect(url, resp.url()) {
            return Err(ScrapeError::InvalidSession {
                url: url.to_string(),
            });
        }

        let body = resp.text().await?;
        debug!(
            url,
            bytes = body.len(),
            duration = fmt_duration(start.elapsed()),
            "fetched page"
        );
        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PortalClient {
        PortalClient::new(&Config::default()).unwrap()
    }

    #[test]
    fn test_zero_pacing_never_sleeps() {
        assert_eq!(Pacing::new(0, 0).next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_pacing_stays_within_bounds() {
        let pacing = Pacing::new(1000, 3000);
        for _ in 0..200 {
            let delay = pacing.next_delay();
            assert!(delay >= Duration::from_millis(1000));
            assert!(delay <= Duration::from_millis(3000));
        }
    }

    #[test]
    fn test_pacing_swaps_reversed_bounds() {
        assert_eq!(Pacing::new(4000, 1000), Pacing::new(1000, 4000));
    }

    #[test]
    fn test_session_redirect_detected_on_evaluation_host() {
        let client = client();
        let requested = Endpoints::default().evaluation("202110", "10001");
        let landed = Url::parse("https://esther.rice.edu/selfserve/twbkwbis.P_WWWLogin").unwrap();
        assert!(client.is_session_redirect(&requested, &landed));
    }

    #[test]
    fn test_same_path_is_not_session_redirect() {
        let client = client();
        let requested = Endpoints::default().evaluation("202110", "10001");
        let landed = Url::parse(&requested).unwrap();
        assert!(!client.is_session_redirect(&requested, &landed));
    }

    #[test]
    fn test_catalog_redirect_is_not_session_redirect() {
        let client = client();
        let requested = Endpoints::default().course("202110", "10001");
        let landed = Url::parse("https://courses.rice.edu/elsewhere").unwrap();
        assert!(!client.is_session_redirect(&requested, &landed));
    }

    type Requests = Arc<std::sync::Mutex<Vec<String>>>;

    /// Serve one response per connection from `respond(path)`, recording
    /// every request head.
    async fn stub_portal(respond: fn(&str) -> String) -> (String, Requests) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        let requests = Requests::default();
        let seen = Arc::clone(&requests);

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut head = Vec::new();
                let mut buf = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => head.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&head).into_owned();
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                seen.lock().unwrap().push(head);
                let _ = socket.write_all(respond(&path).as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (host, requests)
    }

    fn response(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\n{headers}Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
    }

    fn stub_client(host: &str) -> PortalClient {
        PortalClient::new(&Config {
            catalog_host: host.to_string(),
            evaluation_host: host.to_string(),
            session_id: Some("abc123".to_string()),
            delay_min_ms: 0,
            delay_max_ms: 0,
            ..Config::default()
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_fetch_sends_session_cookie() {
        let (host, requests) = stub_portal(|_| response("200 OK", "", "ok")).await;
        let url = Endpoints::new(&host, &host).evaluation("202110", "10001");

        let body = stub_client(&host).fetch(&url).await.unwrap();

        assert_eq!(body, "ok");
        let requests = requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].contains("SESSID=abc123"), "{}", requests[0]);
    }

    #[tokio::test]
    async fn test_fetch_maps_not_found_to_terminal_status() {
        let (host, _) = stub_portal(|_| response("404 Not Found", "", "missing")).await;
        let url = Endpoints::new(&host, &host).catalog("209910");

        let err = stub_client(&host).fetch(&url).await.unwrap_err();

        match &err {
            ScrapeError::Status { status, url: failed } => {
                assert_eq!(*status, reqwest::StatusCode::NOT_FOUND);
                assert_eq!(failed, &url);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_fetch_detects_login_redirect() {
        let (host, requests) = stub_portal(|path| {
            if path.starts_with("/selfserve/swkscmt.main") {
                response(
                    "302 Found",
                    "Location: /selfserve/twbkwbis.P_WWWLogin\r\n",
                    "",
                )
            } else {
                response("200 OK", "", "<html>Login</html>")
            }
        })
        .await;
        let url = Endpoints::new(&host, &host).evaluation("202110", "10001");

        let err = stub_client(&host).fetch(&url).await.unwrap_err();

        assert!(matches!(err, ScrapeError::InvalidSession { .. }), "{err:?}");
        assert!(!err.is_retryable());
        assert_eq!(requests.lock().unwrap().len(), 2);
    }
}
