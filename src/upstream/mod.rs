//! The upstream HTTP client (§4.3): endpoint selection, fixed headers, and
//! primary/fallback retry on network error. Failure *classification* is the
//! dispatcher's job (§4.4) — this module only sends the request and hands
//! back whatever response or transport error it got.

use backon::{ExponentialBuilder, Retryable};
use gateway_schema::native::AntigravityRequestBody;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, USER_AGENT};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::error::GatewayError;
use crate::utils::logging::with_pretty_json_debug;

const PRIMARY_BASE: &str = "https://daily-cloudcode-pa.sandbox.googleapis.com";
const FALLBACK_BASE: &str = "https://cloudcode-pa.googleapis.com";
const STREAM_PATH: &str = "/v1internal:streamGenerateContent";
const UNARY_PATH: &str = "/v1internal:generateContent";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ClientMetadata {
    ide_type: &'static str,
    platform: &'static str,
    plugin_type: &'static str,
}

impl Default for ClientMetadata {
    fn default() -> Self {
        Self {
            ide_type: "IDE_UNSPECIFIED",
            platform: "PLATFORM_UNSPECIFIED",
            plugin_type: "GEMINI",
        }
    }
}

#[derive(Debug, Clone)]
struct Endpoints {
    stream: Url,
    unary: Url,
}

impl Endpoints {
    fn for_base(base: &str) -> Self {
        let base = Url::parse(base).expect("fixed upstream base URL must be valid");
        let mut stream = base.clone();
        stream.set_path(STREAM_PATH);
        stream.set_query(Some("alt=sse"));
        let mut unary = base;
        unary.set_path(UNARY_PATH);
        Self { stream, unary }
    }

    fn select(&self, streaming: bool) -> &Url {
        if streaming { &self.stream } else { &self.unary }
    }
}

pub struct UpstreamClient {
    client: reqwest::Client,
    retry_policy: ExponentialBuilder,
    primary: Endpoints,
    fallback: Endpoints,
}

impl UpstreamClient {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            retry_policy: ExponentialBuilder::default()
                .with_min_delay(Duration::from_millis(100))
                .with_max_delay(Duration::from_millis(300))
                .with_max_times(2)
                .with_jitter(),
            primary: Endpoints::for_base(PRIMARY_BASE),
            fallback: Endpoints::for_base(FALLBACK_BASE),
        }
    }

    /// Sends `body` to either the streaming or unary endpoint. Retries the
    /// same request against the fallback base once if the primary fails at
    /// the transport level (§4.3); 5xx application responses are returned
    /// as-is for the dispatcher to classify.
    pub async fn send(
        &self,
        access_token: &str,
        streaming: bool,
        body: &AntigravityRequestBody,
    ) -> Result<reqwest::Response, GatewayError> {
        let headers = Self::headers(access_token);

        with_pretty_json_debug(body, |pretty| {
            debug!(stream = streaming, body = %pretty, "prepared upstream payload");
        });

        match self.post_with_retry(self.primary.select(streaming), &headers, body).await {
            Ok(resp) => Ok(resp),
            Err(e) => {
                warn!(error = %e, "primary upstream endpoint failed, retrying against fallback");
                self.post_with_retry(self.fallback.select(streaming), &headers, body)
                    .await
                    .map_err(GatewayError::from)
            }
        }
    }

    /// Retries only true transport failures (connection refused, timed
    /// out); an application-level response, including a 5xx one, is
    /// returned to the caller as-is for `Dispatcher::classify` to handle
    /// per §4.4/§7 — this layer never inspects response status.
    async fn post_with_retry(
        &self,
        url: &Url,
        headers: &HeaderMap,
        body: &AntigravityRequestBody,
    ) -> Result<reqwest::Response, reqwest::Error> {
        (|| async { self.client.post(url.clone()).headers(headers.clone()).json(body).send().await })
            .retry(self.retry_policy)
            .when(|e: &reqwest::Error| e.is_connect() || e.is_timeout())
            .await
    }

    fn headers(access_token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {access_token}")).expect("access token must be a valid header value"),
        );
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("antigravity/1.11.5 {}/{}", std::env::consts::OS, std::env::consts::ARCH))
                .expect("fixed user-agent must be a valid header value"),
        );
        headers.insert(
            "x-goog-api-client",
            HeaderValue::from_static("google-cloud-sdk vscode_cloudshelleditor/0.1"),
        );
        let metadata = serde_json::to_string(&ClientMetadata::default()).expect("client metadata must serialize");
        headers.insert("client-metadata", HeaderValue::from_str(&metadata).expect("client metadata must be a valid header value"));
        headers
    }
}
