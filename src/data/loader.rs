use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::Point;

// ---------------------------------------------------------------------------
// Point-set files
// ---------------------------------------------------------------------------

/// Load a point set from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.json` – `[[x, y], ...]` or `[{"x": ..., "y": ...}, ...]`
/// * `.csv`  – two columns `x,y`, with or without a header row
pub fn load_points(path: &Path) -> Result<Vec<Point>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parse: fn(&str) -> Result<Vec<Point>> = match ext.as_str() {
        "json" => parse_json_points,
        "csv" => parse_csv_points,
        other => bail!("Unsupported file extension: .{other}"),
    };

    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse(&text)
}

fn parse_json_points(text: &str) -> Result<Vec<Point>> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut points = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let point = match rec {
            JsonValue::Array(pair) => {
                let [x, y] = pair.as_slice() else {
                    bail!("Row {i}: expected a two-element [x, y] pair");
                };
                Point(coord(x, i, "x")?, coord(y, i, "y")?)
            }
            JsonValue::Object(obj) => Point(
                coord(obj.get("x").unwrap_or(&JsonValue::Null), i, "x")?,
                coord(obj.get("y").unwrap_or(&JsonValue::Null), i, "y")?,
            ),
            _ => bail!("Row {i}: expected an [x, y] pair or an {{x, y}} object"),
        };
        points.push(point);
    }
    Ok(points)
}

fn coord(value: &JsonValue, row: usize, axis: &str) -> Result<f64> {
    value
        .as_f64()
        .with_context(|| format!("Row {row}: missing or non-numeric '{axis}'"))
}

fn parse_csv_points(text: &str) -> Result<Vec<Point>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let mut points = Vec::new();
    for (i, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("reading CSV row {i}"))?;
        if record.len() < 2 {
            bail!("CSV row {i}: expected two columns x,y");
        }
        match (record[0].parse::<f64>(), record[1].parse::<f64>()) {
            (Ok(x), Ok(y)) => points.push(Point(x, y)),
            // Tolerate a single leading header row.
            _ if i == 0 => continue,
            _ => bail!("CSV row {i}: non-numeric coordinates"),
        }
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Task files (challenge view)
// ---------------------------------------------------------------------------

/// A quiz/code task as exported for the desktop client: the identifying
/// slug, the raw quiz payload (kept untouched for the tolerant normalizer)
/// or the starter code, and an optional test-attempt id echoed back on
/// submission.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskFile {
    pub slug: String,
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub initial_code: Option<String>,
    #[serde(default)]
    pub quiz: JsonValue,
    #[serde(default)]
    pub test_attempt_id: Option<i64>,
}

impl TaskFile {
    pub fn is_code(&self) -> bool {
        self.task_type.as_deref() == Some("code") || self.initial_code.is_some()
    }
}

pub fn load_task(path: &Path) -> Result<TaskFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_task(&text)
}

fn parse_task(text: &str) -> Result<TaskFile> {
    serde_json::from_str(text).context("parsing task file")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
