use serde_json::Value;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Robust payload normalization
// ---------------------------------------------------------------------------
//
// Quiz payloads arrive from an upstream source with known data-quality
// issues: the JSON may be double- (or triple-) encoded as a string, may use
// single quotes, and may contain non-breaking spaces. The bounded re-parse
// below is a compatibility shim for exactly those observed variations; it is
// not a general JSON extension and must not grow into one.

/// Upper bound on string-unwrap attempts. Beyond this the value is kept as
/// plain text rather than looping further.
const MAX_DECODE_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum QuizParseError {
    #[error("quiz payload is not valid JSON: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// One selectable answer: `value` is what gets submitted, `text` is what
/// gets displayed. Both are always plain strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOption {
    pub value: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub options: Vec<QuizOption>,
}

/// The two render modes, auto-detected from the payload shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizPayload {
    /// One single-select block per question.
    MultiQuestion(Vec<Question>),
    /// One flat multi-select list (legacy payloads).
    Legacy(Vec<QuizOption>),
}

/// Normalize a raw quiz payload into a uniform model.
///
/// A payload that is not JSON at all is a render error. A payload that
/// unwraps to a bare string within the attempt bound is kept as a single
/// legacy option, matching the upstream renderer.
pub fn parse_quiz_payload(raw: &str) -> Result<QuizPayload, QuizParseError> {
    let value = unwrap_nested_json(serde_json::from_str(raw)?);

    // Unwrap the {"questions": [...]} envelope when present.
    let value = match value {
        Value::Object(mut map) if map.get("questions").is_some_and(Value::is_array) => {
            map.remove("questions").unwrap_or(Value::Null)
        }
        other => other,
    };

    // Coerce to a list: objects become their values, scalars are wrapped.
    let items: Vec<Value> = match value {
        Value::Array(items) => items,
        Value::Object(map) => map.into_iter().map(|(_, v)| v).collect(),
        other => vec![other],
    };

    let is_multi = items
        .iter()
        .any(|item| item.get("options").is_some_and(Value::is_array));

    if is_multi {
        Ok(QuizPayload::MultiQuestion(normalize_questions(items)))
    } else {
        Ok(QuizPayload::Legacy(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| legacy_option(item, i))
                .collect(),
        ))
    }
}

/// Bounded unwrap of accidentally string-encoded JSON. On a failed decode,
/// one cleanup pass (NBSP → space, single → double quotes) is tried before
/// giving up and keeping the string.
fn unwrap_nested_json(mut value: Value) -> Value {
    for _ in 0..MAX_DECODE_ATTEMPTS {
        let text = match &value {
            Value::String(s) => s.clone(),
            _ => break,
        };
        let parsed = serde_json::from_str(&text).or_else(|_| {
            let clean = text.replace('\u{a0}', " ").replace('\'', "\"");
            serde_json::from_str(&clean)
        });
        match parsed {
            Ok(inner) => value = inner,
            Err(_) => break,
        }
    }
    value
}

fn normalize_questions(items: Vec<Value>) -> Vec<Question> {
    items
        .into_iter()
        .enumerate()
        // Non-object entries cannot carry options; skipped like upstream.
        .filter(|(_, item)| item.is_object())
        .map(|(q_idx, item)| {
            let text = scalar_string(item.get("question"))
                .or_else(|| scalar_string(item.get("text")))
                .unwrap_or_else(|| format!("Question {}", q_idx + 1));

            let options = item
                .get("options")
                .and_then(Value::as_array)
                .map(|opts| {
                    opts.iter()
                        .enumerate()
                        .map(|(o_idx, opt)| question_option(opt, o_idx))
                        .collect()
                })
                .unwrap_or_default();

            Question { text, options }
        })
        .collect()
}

/// Scalar-to-string coercion. Objects and arrays yield `None` — an option
/// label must never render as a serialized object.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Option extraction for multi-question payloads: value falls back through
/// id → value → text, display text through text → label → id → value.
fn question_option(opt: &Value, index: usize) -> QuizOption {
    let (value, text) = match opt {
        Value::String(s) => (s.clone(), s.clone()),
        Value::Object(_) => {
            let value = scalar_string(opt.get("id"))
                .or_else(|| scalar_string(opt.get("value")))
                .or_else(|| scalar_string(opt.get("text")))
                .unwrap_or_default();
            let text = scalar_string(opt.get("text"))
                .or_else(|| scalar_string(opt.get("label")))
                .or_else(|| scalar_string(opt.get("id")))
                .or_else(|| scalar_string(opt.get("value")))
                .unwrap_or_default();
            (value, text)
        }
        other => {
            let s = scalar_string(Some(other)).unwrap_or_default();
            (s.clone(), s)
        }
    };

    let text = if !text.is_empty() {
        text
    } else if !value.is_empty() {
        value.clone()
    } else {
        format!("Option {}", index + 1)
    };
    let value = if value.is_empty() { text.clone() } else { value };

    QuizOption { value, text }
}

/// Option extraction for legacy payloads, which may be bare strings or
/// `{text/label/value}` objects; an unrecognized object falls back to its
/// JSON text rather than being dropped.
fn legacy_option(opt: &Value, index: usize) -> QuizOption {
    let text = scalar_string(Some(opt))
        .or_else(|| scalar_string(opt.get("text")))
        .or_else(|| scalar_string(opt.get("label")))
        .or_else(|| scalar_string(opt.get("value")))
        .unwrap_or_else(|| {
            if opt.is_object() || opt.is_array() {
                opt.to_string()
            } else {
                format!("Option {}", index + 1)
            }
        });
    let value = scalar_string(opt.get("value")).unwrap_or_else(|| text.clone());

    QuizOption { value, text }
}

// ---------------------------------------------------------------------------
// Answer collection
// ---------------------------------------------------------------------------

/// Mutable answer state for one rendered quiz.
pub struct QuizForm {
    pub payload: QuizPayload,
    /// Multi-question mode: selected option index per question.
    pub selected: Vec<Option<usize>>,
    /// Legacy mode: checked flag per option.
    pub checked: Vec<bool>,
    /// Per-question pass/fail from the last submission, for border styling.
    results: Option<Vec<bool>>,
    /// Visible submission-blocked warning.
    pub warning: Option<String>,
}

impl QuizForm {
    pub fn new(payload: QuizPayload) -> Self {
        let (selected, checked) = match &payload {
            QuizPayload::MultiQuestion(questions) => (vec![None; questions.len()], Vec::new()),
            QuizPayload::Legacy(options) => (Vec::new(), vec![false; options.len()]),
        };
        QuizForm {
            payload,
            selected,
            checked,
            results: None,
            warning: None,
        }
    }

    /// Collect the submission payload, or block with a visible warning:
    /// every question must be answered in multi-question mode, at least one
    /// option must be checked in legacy mode.
    pub fn collect_submission(&mut self) -> Option<Vec<String>> {
        match &self.payload {
            QuizPayload::MultiQuestion(questions) => {
                if self.selected.iter().any(Option::is_none) {
                    self.warning = Some("Please answer every question".into());
                    return None;
                }
                self.warning = None;
                Some(
                    questions
                        .iter()
                        .zip(&self.selected)
                        .map(|(q, sel)| {
                            sel.and_then(|i| q.options.get(i))
                                .map(|opt| opt.value.clone())
                                .unwrap_or_default()
                        })
                        .collect(),
                )
            }
            QuizPayload::Legacy(options) => {
                let values: Vec<String> = options
                    .iter()
                    .zip(&self.checked)
                    .filter(|(_, &checked)| checked)
                    .map(|(opt, _)| opt.value.clone())
                    .collect();
                if values.is_empty() {
                    self.warning = Some("Select at least one option".into());
                    return None;
                }
                self.warning = None;
                Some(values)
            }
        }
    }

    /// Store the server's per-question verdicts. A missing result array
    /// leaves the current styling untouched.
    pub fn apply_results(&mut self, results: Option<Vec<bool>>) {
        if let Some(results) = results {
            self.results = Some(results);
        }
    }

    /// Verdict for one question block, when the server provided one.
    pub fn question_result(&self, index: usize) -> Option<bool> {
        self.results.as_ref()?.get(index).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn multi(payload: &QuizPayload) -> &[Question] {
        match payload {
            QuizPayload::MultiQuestion(q) => q,
            QuizPayload::Legacy(_) => panic!("expected multi-question payload"),
        }
    }

    fn legacy(payload: &QuizPayload) -> &[QuizOption] {
        match payload {
            QuizPayload::Legacy(o) => o,
            QuizPayload::MultiQuestion(_) => panic!("expected legacy payload"),
        }
    }

    #[test]
    fn double_encoded_payload_normalizes_to_multi_mode() {
        let raw = r#""[{\"options\":[\"a\"]}]""#;
        let payload = parse_quiz_payload(raw).unwrap();
        let questions = multi(&payload);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].options, vec![QuizOption {
            value: "a".into(),
            text: "a".into(),
        }]);
    }

    #[test]
    fn single_quotes_and_nbsp_are_cleaned_up() {
        let encoded =
            serde_json::to_string("[{'question': 'Pick\u{a0}one', 'options': ['a', 'b']}]")
                .unwrap();
        let payload = parse_quiz_payload(&encoded).unwrap();
        let questions = multi(&payload);
        assert_eq!(questions[0].text, "Pick one");
        assert_eq!(questions[0].options.len(), 2);
    }

    #[test]
    fn unwrap_stops_at_the_attempt_bound() {
        // Encode past the bound: the leftover string renders as one legacy
        // option instead of looping further.
        let mut encoded = serde_json::to_string(&vec!["a"]).unwrap();
        for _ in 0..MAX_DECODE_ATTEMPTS + 2 {
            encoded = serde_json::to_string(&encoded).unwrap();
        }
        let payload = parse_quiz_payload(&encoded).unwrap();
        let options = legacy(&payload);
        assert_eq!(options.len(), 1);
        assert!(options[0].text.contains("a"));
    }

    #[test]
    fn encoding_within_the_bound_still_unwraps() {
        let mut encoded = serde_json::to_string(&vec!["a", "b"]).unwrap();
        for _ in 0..MAX_DECODE_ATTEMPTS - 1 {
            encoded = serde_json::to_string(&encoded).unwrap();
        }
        let payload = parse_quiz_payload(&encoded).unwrap();
        assert_eq!(legacy(&payload).len(), 2);
    }

    #[test]
    fn top_level_garbage_is_a_render_error() {
        assert!(parse_quiz_payload("<html>502 Bad Gateway</html>").is_err());
    }

    #[test]
    fn bare_option_array_renders_in_legacy_mode() {
        let payload = parse_quiz_payload(r#"["yes", "no", 3]"#).unwrap();
        let options = legacy(&payload);
        assert_eq!(options.len(), 3);
        assert_eq!(options[2].value, "3");
    }

    #[test]
    fn questions_envelope_is_unwrapped() {
        let raw = r#"{"questions": [{"text": "Q1", "options": ["a"]}]}"#;
        let payload = parse_quiz_payload(raw).unwrap();
        assert_eq!(multi(&payload)[0].text, "Q1");
    }

    #[test]
    fn bare_object_becomes_its_value_list() {
        let raw = r#"{"0": {"options": ["a"]}, "1": {"options": ["b"]}}"#;
        let payload = parse_quiz_payload(raw).unwrap();
        assert_eq!(multi(&payload).len(), 2);
    }

    #[test]
    fn option_objects_use_id_value_text_fallbacks() {
        let raw = r#"[{"question": "Q", "options": [
            {"id": "k1", "text": "First"},
            {"value": "k2", "label": "Second"},
            {"nested": {"x": 1}}
        ]}]"#;
        let payload = parse_quiz_payload(raw).unwrap();
        let opts = &multi(&payload)[0].options;
        assert_eq!(opts[0], QuizOption { value: "k1".into(), text: "First".into() });
        assert_eq!(opts[1], QuizOption { value: "k2".into(), text: "Second".into() });
        // An object with no usable field falls back to a positional label,
        // never to a serialized object.
        assert_eq!(opts[2].text, "Option 3");
    }

    #[test]
    fn question_text_falls_back_to_position() {
        let raw = r#"[{"options": ["a"]}]"#;
        let payload = parse_quiz_payload(raw).unwrap();
        assert_eq!(multi(&payload)[0].text, "Question 1");
    }

    #[test]
    fn submission_blocked_while_any_question_unanswered() {
        let payload = parse_quiz_payload(r#"[{"options": ["a"]}, {"options": ["b"]}]"#).unwrap();
        let mut form = QuizForm::new(payload);
        form.selected[0] = Some(0);

        assert!(form.collect_submission().is_none());
        assert!(form.warning.is_some());

        form.selected[1] = Some(0);
        assert_eq!(form.collect_submission().unwrap(), vec!["a", "b"]);
        assert!(form.warning.is_none());
    }

    #[test]
    fn legacy_submission_blocked_while_empty() {
        let payload = parse_quiz_payload(r#"["a", "b", "c"]"#).unwrap();
        let mut form = QuizForm::new(payload);

        assert!(form.collect_submission().is_none());
        assert!(form.warning.is_some());

        form.checked[0] = true;
        form.checked[2] = true;
        assert_eq!(form.collect_submission().unwrap(), vec!["a", "c"]);
    }

    #[test]
    fn missing_result_array_leaves_styling_untouched() {
        let payload = parse_quiz_payload(r#"[{"options": ["a"]}]"#).unwrap();
        let mut form = QuizForm::new(payload);
        form.apply_results(Some(vec![false]));
        assert_eq!(form.question_result(0), Some(false));

        form.apply_results(None);
        assert_eq!(form.question_result(0), Some(false));
        assert_eq!(form.question_result(5), None);
    }
}
