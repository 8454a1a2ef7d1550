use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use screen_core::{
    FundamentalRecord, FundamentalStore, ScreenError, TechnicalDocument, TechnicalQuery,
    TechnicalStore,
};
use serde::Deserialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub mod query;

pub use query::{search_body, MAX_PAGE_SIZE};

const MAX_ATTEMPTS: u32 = 3;

/// Sliding-window rate limiter: at most `max_requests` per `window` duration.
#[derive(Clone)]
struct RateLimiter {
    timestamps: Arc<Mutex<VecDeque<Instant>>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            timestamps: Arc::new(Mutex::new(VecDeque::new())),
            max_requests: max_requests.max(1),
            window,
        }
    }

    async fn acquire(&self) {
        loop {
            let mut ts = self.timestamps.lock().await;
            let now = Instant::now();

            // Remove timestamps outside the window
            while let Some(&front) = ts.front() {
                if now.duration_since(front) >= self.window {
                    ts.pop_front();
                } else {
                    break;
                }
            }

            if ts.len() < self.max_requests {
                ts.push_back(now);
                return;
            }

            // Wait until the oldest request falls out of the window
            let sleep_dur = match ts.front() {
                Some(&oldest) => (oldest + self.window).duration_since(now) + Duration::from_millis(50),
                None => Duration::from_millis(50),
            };
            drop(ts);
            tracing::debug!("Rate limiter: waiting {:.1}s for store slot", sleep_dur.as_secs_f64());
            tokio::time::sleep(sleep_dur).await;
        }
    }
}

/// Connection settings for [`SearchClient`].
#[derive(Debug, Clone)]
pub struct SearchClientConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub rate_limit_per_minute: usize,
    /// Pause before retrying a 429/503 response.
    pub retry_wait: Duration,
}

impl SearchClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            api_key: None,
            timeout: Duration::from_secs(30),
            rate_limit_per_minute: 600,
            retry_wait: Duration::from_secs(2),
        }
    }
}

/// REST client for an Elasticsearch-compatible store.
///
/// One client serves both the technical index (search) and the fundamental
/// index (lookup by document id).
#[derive(Clone)]
pub struct SearchClient {
    endpoint: String,
    api_key: Option<String>,
    client: Client,
    rate_limiter: RateLimiter,
    retry_wait: Duration,
}

impl SearchClient {
    pub fn new(config: SearchClientConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            api_key: config.api_key,
            client,
            rate_limiter: RateLimiter::new(config.rate_limit_per_minute, Duration::from_secs(60)),
            retry_wait: config.retry_wait,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Endpoint URL with `segments` appended, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Result<Url, ScreenError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| ScreenError::Config(format!("invalid store endpoint {}: {}", self.endpoint, e)))?;
        url.path_segments_mut()
            .map_err(|_| ScreenError::Config(format!("store endpoint {} cannot take a path", self.endpoint)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => builder.header(reqwest::header::AUTHORIZATION, format!("ApiKey {}", key)),
            None => builder,
        }
    }

    /// Send a request with rate limiting and retry on 429/503.
    async fn send_request(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, ScreenError> {
        let request = self
            .authorize(builder)
            .build()
            .map_err(|e| ScreenError::Api(e.to_string()))?;

        for attempt in 0..MAX_ATTEMPTS {
            self.rate_limiter.acquire().await;
            let req_clone = request
                .try_clone()
                .ok_or_else(|| ScreenError::Api("Cannot clone request".to_string()))?;
            let response = self
                .client
                .execute(req_clone)
                .await
                .map_err(|e| ScreenError::Api(e.to_string()))?;

            let status = response.status();
            if status != StatusCode::TOO_MANY_REQUESTS && status != StatusCode::SERVICE_UNAVAILABLE {
                return Ok(response);
            }

            if attempt + 1 == MAX_ATTEMPTS {
                tracing::warn!("Store returned {} on final attempt {}/{}", status, attempt + 1, MAX_ATTEMPTS);
                break;
            }
            tracing::warn!(
                "Store returned {}, waiting {:.1}s before retry {}/{}",
                status,
                self.retry_wait.as_secs_f64(),
                attempt + 2,
                MAX_ATTEMPTS
            );
            tokio::time::sleep(self.retry_wait).await;
        }

        Err(ScreenError::Api(format!(
            "Store still unavailable after {} attempts",
            MAX_ATTEMPTS
        )))
    }

    /// Search `index` and return the `_source` of every hit on the first page.
    pub async fn search_documents(
        &self,
        index: &str,
        query: &TechnicalQuery,
    ) -> Result<Vec<TechnicalDocument>, ScreenError> {
        let url = self.url(&[index, "_search"])?;
        let body = search_body(query);
        tracing::debug!("POST {} body={}", url, body);

        let response = self.send_request(self.client.post(url).json(&body)).await?;

        if !response.status().is_success() {
            return Err(ScreenError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ScreenError::Api(e.to_string()))?;
        decode_search_response(&text)
    }

    /// Fetch one document from `index` by id.
    pub async fn get_document(&self, index: &str, id: &str) -> Result<FundamentalRecord, ScreenError> {
        let url = self.url(&[index, "_doc", id])?;

        let response = self.send_request(self.client.get(url)).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ScreenError::NotFound(format!("{}/{}", index, id)));
        }
        if !response.status().is_success() {
            return Err(ScreenError::Api(format!(
                "HTTP {}: {}",
                response.status(),
                response.text().await.unwrap_or_default()
            )));
        }

        let text = response
            .text()
            .await
            .map_err(|e| ScreenError::Api(e.to_string()))?;
        decode_get_response(index, id, &text)
    }
}

#[async_trait]
impl TechnicalStore for SearchClient {
    async fn search(&self, index: &str, query: &TechnicalQuery) -> Result<Vec<TechnicalDocument>, ScreenError> {
        self.search_documents(index, query).await
    }
}

#[async_trait]
impl FundamentalStore for SearchClient {
    async fn fetch(&self, index: &str, ticker: &str) -> Result<FundamentalRecord, ScreenError> {
        self.get_document(index, ticker).await
    }
}

/// Decode a `_search` response body into its hit documents.
pub fn decode_search_response(body: &str) -> Result<Vec<TechnicalDocument>, ScreenError> {
    let parsed: SearchResponse =
        serde_json::from_str(body).map_err(|e| ScreenError::InvalidData(e.to_string()))?;
    Ok(parsed.hits.hits.into_iter().map(|h| h.source).collect())
}

/// Decode a `_doc` response body; `found: false` maps to [`ScreenError::NotFound`].
pub fn decode_get_response(index: &str, id: &str, body: &str) -> Result<FundamentalRecord, ScreenError> {
    let parsed: GetResponse =
        serde_json::from_str(body).map_err(|e| ScreenError::InvalidData(e.to_string()))?;
    match (parsed.found, parsed.source) {
        (false, _) | (true, None) => Err(ScreenError::NotFound(format!("{}/{}", index, id))),
        (true, Some(source)) => serde_json::from_value(source)
            .map_err(|e| ScreenError::InvalidData(format!("{}/{}: {}", index, id, e))),
    }
}

// Response structures
#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_source")]
    source: TechnicalDocument,
}

#[derive(Debug, Deserialize)]
struct GetResponse {
    #[serde(default)]
    found: bool,
    #[serde(rename = "_source", default)]
    source: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_search_response() {
        let body = r#"{
            "took": 3,
            "hits": {
                "total": {"value": 2, "relation": "eq"},
                "hits": [
                    {"_id": "1", "_source": {
                        "ticker": "TCS.NS", "close": 3950.5, "date": "2026-02-09",
                        "crossed_resistance": [
                            {"support_level": 3800.0, "resistance_level": 3900.0, "support_distance_pct": 3.96}
                        ]
                    }},
                    {"_id": "2", "_source": {"ticker": "INFY.NS", "date": "2026-02-09"}}
                ]
            }
        }"#;

        let docs = decode_search_response(body).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].ticker, "TCS.NS");
        assert_eq!(docs[0].crossed_resistance.len(), 1);
        assert_eq!(docs[0].crossed_resistance[0].resistance_level, Some(3900.0));
        assert!(docs[1].crossed_resistance.is_empty());
        assert_eq!(docs[1].close, None);
    }

    #[test]
    fn test_decode_search_response_malformed() {
        let err = decode_search_response(r#"{"error": "index_not_found"}"#).unwrap_err();
        assert!(matches!(err, ScreenError::InvalidData(_)));
    }

    #[test]
    fn test_decode_get_response_found() {
        let body = r#"{
            "_index": "nifty_fundamental", "_id": "TCS", "found": true,
            "_source": {
                "sector": {"sector": "Information Technology", "industry": "IT - Software"},
                "quarterly": [
                    {"metric": "Sales", "period_date": "2025-09", "value": 65799.0},
                    {"metric": "Net Profit", "period_date": "2025-09", "value": 12131.0}
                ]
            }
        }"#;

        let record = decode_get_response("nifty_fundamental", "TCS", body).unwrap();
        let sector = record.sector.unwrap();
        assert_eq!(sector.sector.as_deref(), Some("Information Technology"));
        assert_eq!(sector.industry.as_deref(), Some("IT - Software"));
        assert_eq!(record.quarterly.len(), 2);
    }

    #[test]
    fn test_decode_get_response_not_found() {
        let body = r#"{"_index": "nifty_fundamental", "_id": "NOPE", "found": false}"#;
        let err = decode_get_response("nifty_fundamental", "NOPE", body).unwrap_err();
        assert!(matches!(err, ScreenError::NotFound(_)));
    }

    #[test]
    fn test_decode_get_response_bad_source() {
        let body = r#"{"found": true, "_source": {"quarterly": "not a list"}}"#;
        let err = decode_get_response("nifty_fundamental", "X", body).unwrap_err();
        assert!(matches!(err, ScreenError::InvalidData(_)));
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = SearchClient::new(SearchClientConfig::new("http://localhost:9200/"));
        assert_eq!(client.endpoint(), "http://localhost:9200");
    }

    /// One-shot HTTP server answering each connection with the next canned response.
    /// Returns the base URL and the request lines it received.
    async fn serve(responses: Vec<(u16, &'static str)>) -> (String, Arc<std::sync::Mutex<Vec<String>>>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);

        tokio::spawn(async move {
            for (status, body) in responses {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                let mut request = Vec::new();
                let mut buf = [0u8; 4096];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request);
                log.lock().unwrap().push(head.lines().next().unwrap_or_default().to_string());

                let reply = format!(
                    "HTTP/1.1 {} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(reply.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, seen)
    }

    fn fast_client(base: &str) -> SearchClient {
        SearchClient::new(SearchClientConfig {
            retry_wait: Duration::from_millis(10),
            ..SearchClientConfig::new(base)
        })
    }

    const FOUND: &str = r#"{"found": true, "_source": {"quarterly": []}}"#;

    #[tokio::test]
    async fn test_get_document_retries_unavailable_store() {
        let (base, seen) = serve(vec![(503, "{}"), (429, "{}"), (200, FOUND)]).await;

        let record = fast_client(&base).get_document("nifty_fundamental", "TCS").await.unwrap();

        assert!(record.quarterly.is_empty());
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_get_document_gives_up_after_max_attempts() {
        let (base, seen) = serve(vec![(503, "{}"), (503, "{}"), (503, "{}")]).await;

        let err = fast_client(&base).get_document("nifty_fundamental", "TCS").await.unwrap_err();

        assert!(matches!(err, ScreenError::Api(_)));
        assert_eq!(seen.lock().unwrap().len(), MAX_ATTEMPTS as usize);
    }

    #[tokio::test]
    async fn test_get_document_maps_404_to_not_found() {
        let (base, _) = serve(vec![(404, r#"{"found": false}"#)]).await;

        let err = fast_client(&base).get_document("nifty_fundamental", "NOPE").await.unwrap_err();

        assert!(matches!(err, ScreenError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_document_id_is_one_encoded_path_segment() {
        let (base, seen) = serve(vec![(200, FOUND)]).await;

        fast_client(&format!("{}/", base))
            .get_document("nifty_fundamental", "M/M?x#y")
            .await
            .unwrap();

        let line = seen.lock().unwrap()[0].clone();
        assert_eq!(line, "GET /nifty_fundamental/_doc/M%2FM%3Fx%23y HTTP/1.1");
    }

    #[tokio::test]
    async fn test_search_posts_to_index_search_endpoint() {
        let body = r#"{"hits": {"hits": [{"_source": {"ticker": "TCS.NS"}}]}}"#;
        let (base, seen) = serve(vec![(200, body)]).await;
        let query = TechnicalQuery {
            observation_date: "2026-02-09".to_string(),
            max_support_distance_pct: Some(10.0),
            size: 1000,
        };

        let docs = fast_client(&base).search_documents("nifty_data_weekly", &query).await.unwrap();

        assert_eq!(docs.len(), 1);
        assert_eq!(seen.lock().unwrap()[0], "POST /nifty_data_weekly/_search HTTP/1.1");
    }

    #[tokio::test]
    async fn test_rate_limiter_waits_for_window_to_free() {
        let limiter = RateLimiter::new(2, Duration::from_millis(200));
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(limiter.timestamps.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_rate_limiter_admits_up_to_limit_without_waiting() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        let started = Instant::now();
        for _ in 0..3 {
            limiter.acquire().await;
        }
        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(limiter.timestamps.lock().await.len(), 3);
    }
}
