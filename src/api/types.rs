use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::model::{Algorithm, AlgorithmParams, Dendrogram, Point, StepHistory};

// ---------------------------------------------------------------------------
// Error taxonomy
// ---------------------------------------------------------------------------

/// Distinguishes "the request never completed" from "the server answered
/// with something unparseable" from "the server ran and rejected the input".
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("Invalid server response: {0}")]
    InvalidResponse(String),

    /// Server-reported message, surfaced verbatim.
    #[error("{0}")]
    Server(String),
}

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct RunBody<'a> {
    pub algorithm: Algorithm,
    pub points: &'a [Point],
    pub params: AlgorithmParams,
}

#[derive(Debug, Serialize)]
pub struct PresetBody<'a> {
    #[serde(rename = "type")]
    pub preset: &'a str,
    pub n_samples: u32,
}

#[derive(Debug, Serialize)]
pub struct DendrogramBody<'a> {
    pub points: &'a [Point],
}

/// A code submission is a bare string; a quiz submission is the ordered
/// answer list. Both travel in the same `code` field.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum Solution {
    Code(String),
    Answers(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckBody {
    pub slug: String,
    pub code: Solution,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_attempt_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// Response envelopes
// ---------------------------------------------------------------------------
//
// Every endpoint answers `{success: true, <payload>} | {success: false,
// error}`. The per-endpoint structs below decode that shape and collapse it
// into a Result.

#[derive(Debug, Deserialize)]
pub struct RunResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub history: Option<StepHistory>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PresetResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub points: Option<Vec<Point>>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DendrogramResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub dendrogram: Option<Dendrogram>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Check-solution result. `success: false` with `quiz_results` present is a
/// normal outcome (some answers wrong), not an error.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    /// Per-question verdicts. A malformed array degrades to `None` (no
    /// styling) rather than failing the whole response.
    #[serde(default, deserialize_with = "lenient_bool_array")]
    pub quiz_results: Option<Vec<bool>>,
}

fn lenient_bool_array<'de, D>(deserializer: D) -> Result<Option<Vec<bool>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn envelope_result<T>(
    success: bool,
    payload: Option<T>,
    error: Option<String>,
    payload_field: &str,
) -> Result<T, ApiError> {
    if !success {
        return Err(ApiError::Server(
            error.unwrap_or_else(|| "Unknown server error".into()),
        ));
    }
    payload.ok_or_else(|| {
        ApiError::InvalidResponse(format!("missing '{payload_field}' in success response"))
    })
}

impl RunResponse {
    pub fn into_result(self) -> Result<StepHistory, ApiError> {
        envelope_result(self.success, self.history, self.error, "history")
    }
}

impl PresetResponse {
    pub fn into_result(self) -> Result<Vec<Point>, ApiError> {
        envelope_result(self.success, self.points, self.error, "points")
    }
}

impl DendrogramResponse {
    pub fn into_result(self) -> Result<Dendrogram, ApiError> {
        envelope_result(self.success, self.dendrogram, self.error, "dendrogram")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::NOISE_LABEL;

    #[test]
    fn run_body_matches_the_wire_contract() {
        let points = [Point(1.0, 1.0), Point(2.0, 2.0)];
        let body = RunBody {
            algorithm: Algorithm::Dbscan,
            points: &points,
            params: AlgorithmParams::Dbscan { eps: 0.5, min_pts: 3 },
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "algorithm": "dbscan",
                "points": [[1.0, 1.0], [2.0, 2.0]],
                "params": {"eps": 0.5, "minPts": 3},
            })
        );
    }

    #[test]
    fn preset_body_uses_the_type_key() {
        let body = PresetBody { preset: "moons", n_samples: 100 };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({"type": "moons", "n_samples": 100})
        );
    }

    #[test]
    fn check_body_code_is_a_bare_string() {
        let body = CheckBody {
            slug: "kmeans-basics".into(),
            code: Solution::Code("def dist(a, b): ...".into()),
            test_attempt_id: None,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["code"], "def dist(a, b): ...");
        assert!(value.get("test_attempt_id").is_none());
    }

    #[test]
    fn check_body_answers_are_an_array() {
        let body = CheckBody {
            slug: "quiz-1".into(),
            code: Solution::Answers(vec!["a".into(), "b".into()]),
            test_attempt_id: Some(7),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["code"], serde_json::json!(["a", "b"]));
        assert_eq!(value["test_attempt_id"], 7);
    }

    #[test]
    fn success_envelope_decodes_the_history() {
        let raw = r#"{"success": true, "history": [
            {"labels": [0, 0, 1], "centroids": [[1.5, 1.5], [8.0, 8.0]]},
            {"labels": [-1, -1]}
        ]}"#;
        let history: StepHistory =
            serde_json::from_str::<RunResponse>(raw).unwrap().into_result().unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].centroids.as_ref().unwrap().len(), 2);
        assert_eq!(history[1].labels, Some(vec![NOISE_LABEL, NOISE_LABEL]));
    }

    #[test]
    fn failure_envelope_surfaces_the_server_error_verbatim() {
        let raw = r#"{"success": false, "error": "Not enough points"}"#;
        let err = serde_json::from_str::<RunResponse>(raw).unwrap().into_result().unwrap_err();
        assert!(matches!(err, ApiError::Server(ref msg) if msg == "Not enough points"));
    }

    #[test]
    fn success_without_payload_is_an_invalid_response() {
        let raw = r#"{"success": true}"#;
        let err = serde_json::from_str::<PresetResponse>(raw).unwrap().into_result().unwrap_err();
        assert!(matches!(err, ApiError::InvalidResponse(_)));
    }

    #[test]
    fn check_response_tolerates_partial_fields() {
        let resp: CheckResponse = serde_json::from_str(
            r#"{"success": false, "quiz_results": [true, false]}"#,
        )
        .unwrap();
        assert_eq!(resp.quiz_results, Some(vec![true, false]));
        assert!(resp.message.is_none());
    }

    #[test]
    fn malformed_quiz_results_degrade_to_none() {
        let resp: CheckResponse =
            serde_json::from_str(r#"{"success": true, "quiz_results": "oops"}"#).unwrap();
        assert!(resp.quiz_results.is_none());

        let resp: CheckResponse =
            serde_json::from_str(r#"{"success": true, "quiz_results": [1, 2]}"#).unwrap();
        assert!(resp.quiz_results.is_none());
    }

    #[test]
    fn transport_and_server_errors_render_differently() {
        let transport = ApiError::Transport("connection refused".into());
        let server = ApiError::Server("bad eps".into());
        assert!(transport.to_string().starts_with("Network error"));
        assert_eq!(server.to_string(), "bad eps");
    }
}
