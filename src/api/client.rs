use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, SET_COOKIE};
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::types::{
    ApiError, CheckBody, CheckResponse, DendrogramBody, DendrogramResponse, PresetBody,
    PresetResponse, RunBody, RunResponse,
};
use crate::data::model::{Algorithm, AlgorithmParams, Dendrogram, Point, StepHistory};

// ---------------------------------------------------------------------------
// HTTP client
// ---------------------------------------------------------------------------

/// Default server to talk to; override with `CLUSTERLAB_BASE_URL`.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Thin blocking wrapper over the simulator / check-solution endpoints.
/// One request per call, no retries; parameter validation is server-side.
pub struct ApiClient {
    http: Client,
    base_url: String,
    /// CSRF token observed on a previous response, echoed on every POST.
    csrf_token: Mutex<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("building HTTP client")?;
        Ok(ApiClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            csrf_token: Mutex::new(None),
        })
    }

    // -- Endpoints ---------------------------------------------------------

    pub fn run_algorithm(
        &self,
        algorithm: Algorithm,
        points: &[Point],
        params: AlgorithmParams,
    ) -> Result<StepHistory, ApiError> {
        let body = RunBody { algorithm, points, params };
        self.post_json::<_, RunResponse>("/simulator/run/", &body)?
            .into_result()
    }

    pub fn generate_preset(&self, preset: &str, n_samples: u32) -> Result<Vec<Point>, ApiError> {
        let body = PresetBody { preset, n_samples };
        self.post_json::<_, PresetResponse>("/simulator/preset/", &body)?
            .into_result()
    }

    pub fn dendrogram(&self, points: &[Point]) -> Result<Dendrogram, ApiError> {
        let body = DendrogramBody { points };
        self.post_json::<_, DendrogramResponse>("/simulator/dendrogram/", &body)?
            .into_result()
    }

    pub fn check_solution(&self, body: &CheckBody) -> Result<CheckResponse, ApiError> {
        self.post_json("/tasks/api/check-solution/", body)
    }

    // -- Plumbing ----------------------------------------------------------

    /// POST JSON, decode JSON. A body that fails to decode (an HTML error
    /// page, say) becomes `InvalidResponse` carrying a short excerpt, so it
    /// stays distinguishable from a server-reported rejection.
    fn post_json<B: Serialize, R: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let mut request = self
            .http
            .post(format!("{}{path}", self.base_url))
            .json(body);

        if let Some(token) = self.current_csrf_token() {
            request = request.header("X-CSRFToken", token);
        }

        let response = request
            .send()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        self.capture_csrf_token(response.headers());

        let text = response
            .text()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        serde_json::from_str(&text).map_err(|_| {
            let excerpt: String = text.chars().take(100).collect();
            ApiError::InvalidResponse(format!("non-JSON body: {excerpt}"))
        })
    }

    fn current_csrf_token(&self) -> Option<String> {
        self.csrf_token.lock().ok()?.clone()
    }

    fn capture_csrf_token(&self, headers: &HeaderMap) {
        let observed = headers
            .get_all(SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find_map(extract_csrf_cookie);
        if let Some(token) = observed {
            if let Ok(mut slot) = self.csrf_token.lock() {
                log::debug!("captured csrftoken cookie");
                *slot = Some(token);
            }
        }
    }
}

/// Pull the token out of a `Set-Cookie` header value, e.g.
/// `csrftoken=abc123; Path=/; SameSite=Lax`.
fn extract_csrf_cookie(header: &str) -> Option<String> {
    let rest = header.trim_start().strip_prefix("csrftoken=")?;
    let token = rest.split(';').next().unwrap_or(rest).trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
