use crate::api::types::{CheckBody, CheckResponse, Solution};
use crate::data::loader::TaskFile;
use crate::data::model::{Algorithm, AlgorithmParams, Point, StepHistory, StepSnapshot};
use crate::data::quiz::{parse_quiz_payload, QuizForm};

// ---------------------------------------------------------------------------
// Replay controller – owns the session state
// ---------------------------------------------------------------------------

/// Lifecycle of one simulator session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No points placed yet.
    Empty,
    /// Points are being collected; no run has completed.
    Collecting,
    /// A run finished; the history is being replayed.
    Ready,
}

/// Everything needed to issue one algorithm run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    pub algorithm: Algorithm,
    pub points: Vec<Point>,
    pub params: AlgorithmParams,
    pub generation: u64,
}

/// The simulator session state, independent of rendering.
///
/// Owns the point set, the step history of the last run, and the replay
/// cursor. All transitions go through the methods below; the UI only borrows.
pub struct ReplayController {
    points: Vec<Point>,
    history: StepHistory,
    cursor: usize,
    algorithm: Algorithm,

    /// Parameter widgets bind to these directly; they are read when a run
    /// is issued and sent as-is (range validation is server-side).
    pub k: u32,
    pub eps: f64,
    pub min_pts: u32,
    pub radius: f64,
    pub bandwidth: f64,

    /// One request in flight at a time.
    is_running: bool,

    /// Bumped by `clear()`; responses carrying an older generation are
    /// discarded instead of being applied to a reset session.
    generation: u64,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for ReplayController {
    fn default() -> Self {
        Self {
            points: Vec::new(),
            history: Vec::new(),
            cursor: 0,
            algorithm: Algorithm::KMeans,
            k: 3,
            eps: 1.0,
            min_pts: 3,
            radius: 2.0,
            bandwidth: 2.0,
            is_running: false,
            generation: 0,
            status_message: None,
        }
    }
}

impl ReplayController {
    // -- Read access -------------------------------------------------------

    pub fn phase(&self) -> Phase {
        if !self.history.is_empty() {
            Phase::Ready
        } else if !self.points.is_empty() {
            Phase::Collecting
        } else {
            Phase::Empty
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_snapshot(&self) -> Option<&StepSnapshot> {
        self.history.get(self.cursor)
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    pub fn is_running(&self) -> bool {
        self.is_running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Parameters for the currently selected algorithm.
    pub fn params(&self) -> AlgorithmParams {
        match self.algorithm {
            Algorithm::KMeans => AlgorithmParams::KMeans { k: self.k },
            Algorithm::Dbscan => AlgorithmParams::Dbscan {
                eps: self.eps,
                min_pts: self.min_pts,
            },
            Algorithm::Forel => AlgorithmParams::Forel {
                radius: self.radius,
            },
            Algorithm::Agglomerative => AlgorithmParams::Agglomerative { k: self.k },
            Algorithm::MeanShift => AlgorithmParams::MeanShift {
                bandwidth: self.bandwidth,
            },
        }
    }

    // -- Point collection --------------------------------------------------

    /// Append a clicked point. Ignored once a run has finished (points are
    /// frozen during replay), while a request is in flight, or when the
    /// point lies outside the logical domain.
    pub fn add_point(&mut self, point: Point) -> bool {
        if !self.history.is_empty() || self.is_running || !point.in_domain() {
            return false;
        }
        self.points.push(point);
        true
    }

    /// Replace the point set from a preset or a file. Refused during replay
    /// and while a request is in flight. Out-of-domain entries are dropped
    /// and reported through the status message.
    pub fn replace_points(&mut self, points: Vec<Point>, source: &str) -> bool {
        if !self.history.is_empty() || self.is_running {
            self.status_message = Some("Clear the current run before loading points".into());
            return false;
        }
        let total = points.len();
        self.points = points.into_iter().filter(Point::in_domain).collect();

        let dropped = total - self.points.len();
        self.status_message = if dropped > 0 {
            Some(format!(
                "Loaded {} points from {source} ({dropped} outside the 0–10 range dropped)",
                self.points.len()
            ))
        } else {
            Some(format!("Loaded {} points from {source}", self.points.len()))
        };
        true
    }

    // -- Running -----------------------------------------------------------

    /// Check-and-set the running flag and hand back the request to issue.
    /// Returns `None` (with a status message) when the point set is empty
    /// or another request is still in flight.
    pub fn begin_run(&mut self) -> Option<RunRequest> {
        if self.is_running {
            return None;
        }
        if self.points.is_empty() {
            self.status_message = Some("Place some points first".into());
            return None;
        }
        self.is_running = true;
        self.status_message = None;
        Some(RunRequest {
            algorithm: self.algorithm,
            points: self.points.clone(),
            params: self.params(),
            generation: self.generation,
        })
    }

    /// Apply a run result. A result from a generation older than the
    /// current one (the session was cleared while the request was in
    /// flight) is discarded untouched.
    pub fn finish_run(&mut self, generation: u64, result: Result<StepHistory, String>) {
        if generation != self.generation {
            log::info!("discarding stale run result (generation {generation})");
            return;
        }
        self.is_running = false;
        match result {
            Ok(history) if history.is_empty() => {
                self.status_message = Some("Server returned an empty history".into());
            }
            Ok(history) => {
                // Fresh runs start the replay at the first step.
                self.history = history;
                self.cursor = 0;
                self.status_message = Some(format!(
                    "{}: {} steps",
                    self.algorithm.label(),
                    self.history.len()
                ));
            }
            Err(msg) => {
                self.status_message = Some(msg);
            }
        }
    }

    /// Mark a non-run request (preset fetch) as in flight. Same single
    /// in-flight rule as `begin_run`, but legal with an empty point set.
    pub fn begin_fetch(&mut self) -> Option<u64> {
        if self.is_running || !self.history.is_empty() {
            return None;
        }
        self.is_running = true;
        Some(self.generation)
    }

    /// Apply a preset fetch result, with the same stale-generation guard
    /// as `finish_run`.
    pub fn finish_preset(&mut self, generation: u64, result: Result<Vec<Point>, String>) {
        if generation != self.generation {
            log::info!("discarding stale preset result (generation {generation})");
            return;
        }
        self.is_running = false;
        match result {
            Ok(points) => {
                self.replace_points(points, "preset");
            }
            Err(msg) => {
                self.status_message = Some(msg);
            }
        }
    }

    // -- Replay navigation -------------------------------------------------

    /// Step forward. No-op at the last step or before any run.
    pub fn next(&mut self) {
        if !self.history.is_empty() && self.cursor + 1 < self.history.len() {
            self.cursor += 1;
        }
    }

    /// Step backward. No-op at the first step or before any run.
    pub fn prev(&mut self) {
        if !self.history.is_empty() && self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// Jump to a step; out-of-range indices are clamped, not rejected.
    pub fn set_step(&mut self, index: usize) {
        if self.history.is_empty() {
            return;
        }
        self.cursor = index.min(self.history.len() - 1);
    }

    // -- Reset -------------------------------------------------------------

    /// Drop points, history, and cursor; release the running flag and bump
    /// the generation so an in-flight response cannot land on the fresh
    /// session.
    pub fn clear(&mut self) {
        self.points.clear();
        self.history.clear();
        self.cursor = 0;
        self.is_running = false;
        self.generation += 1;
        self.status_message = None;
    }

    /// Switching algorithms discards the session: a mean-shift history is
    /// meaningless once k-means parameters are selected.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        if self.algorithm != algorithm {
            self.algorithm = algorithm;
            self.clear();
        }
    }
}

// ---------------------------------------------------------------------------
// Challenge state – quiz/code task session
// ---------------------------------------------------------------------------

/// State of the challenge view: the loaded task, its normalized answer
/// form (or code buffer), and the submission lifecycle.
#[derive(Default)]
pub struct ChallengeState {
    pub task: Option<TaskFile>,
    pub form: Option<QuizForm>,
    /// Editable solution for code tasks.
    pub code_buffer: String,
    /// Set when the payload could not be normalized at all.
    pub parse_error: Option<String>,
    pub is_submitting: bool,
    /// `(passed, message)` from the last submission.
    pub result: Option<(bool, String)>,
}

impl ChallengeState {
    /// Swap in a freshly loaded task: seed the code buffer for code tasks,
    /// normalize the quiz payload otherwise.
    pub fn load_task(&mut self, task: TaskFile) {
        self.parse_error = None;
        self.result = None;
        self.is_submitting = false;
        self.form = None;
        self.code_buffer.clear();

        if task.is_code() {
            self.code_buffer = task.initial_code.clone().unwrap_or_default();
        } else {
            // `to_string` re-yields the raw document, so string-encoded
            // payloads go through the same bounded unwrapping as
            // structured ones.
            self.form = match parse_quiz_payload(&task.quiz.to_string()) {
                Ok(payload) => Some(QuizForm::new(payload)),
                Err(e) => {
                    log::error!("failed to render quiz for '{}': {e}", task.slug);
                    self.parse_error = Some(e.to_string());
                    None
                }
            };
        }
        self.task = Some(task);
    }

    pub fn is_code_task(&self) -> bool {
        self.task.as_ref().is_some_and(TaskFile::is_code)
    }

    /// Collect the solution into a check request. Returns `None` — issuing
    /// no network request — while a submission is in flight or the quiz
    /// form is incomplete (the form keeps the visible warning).
    pub fn begin_submit(&mut self) -> Option<CheckBody> {
        if self.is_submitting {
            return None;
        }
        let task = self.task.as_ref()?;
        let code = if task.is_code() {
            Solution::Code(self.code_buffer.clone())
        } else {
            Solution::Answers(self.form.as_mut()?.collect_submission()?)
        };
        self.is_submitting = true;
        self.result = None;
        Some(CheckBody {
            slug: task.slug.clone(),
            code,
            test_attempt_id: task.test_attempt_id,
        })
    }

    /// Apply the check-solution outcome: verdict borders plus a summary
    /// line, or the error text for a failed request.
    pub fn finish_submit(&mut self, result: Result<CheckResponse, String>) {
        self.is_submitting = false;
        match result {
            Ok(response) => {
                if let Some(form) = &mut self.form {
                    form.apply_results(response.quiz_results.clone());
                }
                self.result = Some(if response.success {
                    (true, response.message.unwrap_or_else(|| "Correct!".into()))
                } else if response.quiz_results.is_some() {
                    (false, "Some answers are incorrect (see highlighted blocks)".into())
                } else {
                    let msg = response
                        .error
                        .or(response.message)
                        .unwrap_or_else(|| "Incorrect".into());
                    (false, msg)
                });
            }
            Err(msg) => self.result = Some((false, msg)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(labels: Vec<i32>) -> StepSnapshot {
        StepSnapshot {
            labels: Some(labels),
            ..Default::default()
        }
    }

    fn ready_controller(n_points: usize, n_steps: usize) -> ReplayController {
        let mut c = ReplayController::default();
        for i in 0..n_points {
            assert!(c.add_point(Point(i as f64 % 10.0, 1.0)));
        }
        let req = c.begin_run().unwrap();
        let history = (0..n_steps).map(|_| snapshot(vec![0; n_points])).collect();
        c.finish_run(req.generation, Ok(history));
        c
    }

    #[test]
    fn add_point_preserves_call_order() {
        let mut c = ReplayController::default();
        let placed = [Point(1.0, 1.0), Point(2.0, 2.0), Point(8.0, 8.0)];
        for p in placed {
            assert!(c.add_point(p));
        }
        assert_eq!(c.points(), &placed);
        assert_eq!(c.phase(), Phase::Collecting);
    }

    #[test]
    fn add_point_rejects_out_of_domain() {
        let mut c = ReplayController::default();
        assert!(!c.add_point(Point(-1.0, 5.0)));
        assert!(!c.add_point(Point(5.0, 10.5)));
        assert_eq!(c.phase(), Phase::Empty);
    }

    #[test]
    fn points_are_frozen_during_replay() {
        let mut c = ready_controller(3, 2);
        assert_eq!(c.phase(), Phase::Ready);
        assert!(!c.add_point(Point(4.0, 4.0)));
        assert_eq!(c.points().len(), 3);
    }

    #[test]
    fn add_point_ignored_while_request_in_flight() {
        let mut c = ReplayController::default();
        c.add_point(Point(1.0, 1.0));
        let _req = c.begin_run().unwrap();
        assert!(!c.add_point(Point(2.0, 2.0)));
        assert_eq!(c.points().len(), 1);
    }

    #[test]
    fn run_refused_with_empty_point_set() {
        let mut c = ReplayController::default();
        assert!(c.begin_run().is_none());
        assert!(c.status_message.is_some());
        assert!(!c.is_running());
    }

    #[test]
    fn second_run_refused_while_in_flight() {
        let mut c = ReplayController::default();
        c.add_point(Point(1.0, 1.0));
        assert!(c.begin_run().is_some());
        assert!(c.begin_run().is_none());
    }

    #[test]
    fn run_success_resets_cursor_to_first_step() {
        let c = ready_controller(3, 5);
        assert_eq!(c.cursor(), 0);
        assert_eq!(c.history_len(), 5);
    }

    #[test]
    fn run_failure_surfaces_message_and_stays_collecting() {
        let mut c = ReplayController::default();
        c.add_point(Point(1.0, 1.0));
        let req = c.begin_run().unwrap();
        c.finish_run(req.generation, Err("Not enough points".into()));
        assert_eq!(c.phase(), Phase::Collecting);
        assert_eq!(c.status_message.as_deref(), Some("Not enough points"));
        assert!(!c.is_running());
    }

    #[test]
    fn empty_history_is_not_ready() {
        let mut c = ReplayController::default();
        c.add_point(Point(1.0, 1.0));
        let req = c.begin_run().unwrap();
        c.finish_run(req.generation, Ok(Vec::new()));
        assert_eq!(c.phase(), Phase::Collecting);
    }

    #[test]
    fn next_then_prev_returns_to_interior_cursor() {
        let mut c = ready_controller(2, 4);
        c.set_step(2);
        c.next();
        c.prev();
        assert_eq!(c.cursor(), 2);
    }

    #[test]
    fn navigation_clamps_at_boundaries() {
        let mut c = ready_controller(2, 3);
        c.prev();
        assert_eq!(c.cursor(), 0);
        c.set_step(usize::MAX);
        assert_eq!(c.cursor(), 2);
        c.next();
        assert_eq!(c.cursor(), 2);
    }

    #[test]
    fn navigation_is_a_no_op_before_any_run() {
        let mut c = ReplayController::default();
        c.next();
        c.prev();
        c.set_step(7);
        assert_eq!(c.cursor(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut c = ready_controller(3, 2);
        c.clear();
        assert_eq!(c.phase(), Phase::Empty);
        assert_eq!(c.points().len(), 0);
        assert_eq!(c.history_len(), 0);
        assert_eq!(c.cursor(), 0);
        assert!(!c.is_running());
    }

    #[test]
    fn stale_run_result_is_discarded_after_clear() {
        let mut c = ReplayController::default();
        c.add_point(Point(1.0, 1.0));
        let req = c.begin_run().unwrap();

        c.clear();
        c.add_point(Point(2.0, 2.0));

        c.finish_run(req.generation, Ok(vec![snapshot(vec![0])]));
        assert_eq!(c.phase(), Phase::Collecting, "stale history must not apply");
        assert_eq!(c.history_len(), 0);
    }

    #[test]
    fn stale_preset_result_is_discarded_after_clear() {
        let mut c = ReplayController::default();
        let generation = c.begin_fetch().unwrap();
        c.clear();
        c.finish_preset(generation, Ok(vec![Point(1.0, 1.0)]));
        assert_eq!(c.points().len(), 0);
    }

    #[test]
    fn switching_algorithm_discards_the_session() {
        let mut c = ready_controller(3, 2);
        c.set_algorithm(Algorithm::Dbscan);
        assert_eq!(c.phase(), Phase::Empty);
        assert_eq!(c.algorithm(), Algorithm::Dbscan);

        // Re-selecting the current algorithm keeps the session.
        let mut c = ready_controller(3, 2);
        c.set_algorithm(Algorithm::KMeans);
        assert_eq!(c.phase(), Phase::Ready);
    }

    #[test]
    fn replace_points_refused_during_replay() {
        let mut c = ready_controller(2, 1);
        assert!(!c.replace_points(vec![Point(1.0, 1.0)], "preset"));
        assert_eq!(c.points().len(), 2);
    }

    #[test]
    fn replace_points_drops_out_of_domain_entries() {
        let mut c = ReplayController::default();
        assert!(c.replace_points(
            vec![Point(1.0, 1.0), Point(11.0, 1.0), Point(2.0, 2.0)],
            "points.json"
        ));
        assert_eq!(c.points().len(), 2);
        assert!(c.status_message.unwrap().contains("dropped"));
    }

    // -- Challenge state ---------------------------------------------------

    fn task(quiz: serde_json::Value) -> TaskFile {
        serde_json::from_value(serde_json::json!({
            "slug": "quiz-1",
            "quiz": quiz,
        }))
        .unwrap()
    }

    fn check_response(raw: serde_json::Value) -> CheckResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn load_task_normalizes_string_encoded_payloads() {
        let mut challenge = ChallengeState::default();
        challenge.load_task(task(serde_json::json!("[{\"options\": [\"a\", \"b\"]}]")));
        assert!(challenge.parse_error.is_none());
        let form = challenge.form.as_ref().unwrap();
        assert_eq!(form.selected.len(), 1);
    }

    #[test]
    fn unanswered_submission_issues_no_request() {
        let mut challenge = ChallengeState::default();
        challenge.load_task(task(serde_json::json!([
            {"options": ["a"]},
            {"options": ["b"]},
        ])));
        challenge.form.as_mut().unwrap().selected[0] = Some(0);

        assert!(challenge.begin_submit().is_none());
        assert!(!challenge.is_submitting);
        assert!(challenge.form.as_ref().unwrap().warning.is_some());
    }

    #[test]
    fn complete_submission_builds_the_check_body() {
        let mut challenge = ChallengeState::default();
        challenge.load_task(task(serde_json::json!([{"options": ["a", "b"]}])));
        challenge.form.as_mut().unwrap().selected[0] = Some(1);

        let body = challenge.begin_submit().unwrap();
        assert!(challenge.is_submitting);
        assert_eq!(body.slug, "quiz-1");
        assert_eq!(serde_json::to_value(&body.code).unwrap(), serde_json::json!(["b"]));

        // No overlapping submissions.
        assert!(challenge.begin_submit().is_none());
    }

    #[test]
    fn finish_submit_maps_the_three_verdict_shapes() {
        let mut challenge = ChallengeState::default();
        challenge.load_task(task(serde_json::json!([{"options": ["a"]}])));

        challenge.finish_submit(Ok(check_response(
            serde_json::json!({"success": true, "message": "Well done"}),
        )));
        assert_eq!(challenge.result, Some((true, "Well done".into())));

        challenge.finish_submit(Ok(check_response(
            serde_json::json!({"success": false, "quiz_results": [false]}),
        )));
        let (passed, msg) = challenge.result.clone().unwrap();
        assert!(!passed);
        assert!(msg.contains("Some answers"));
        assert_eq!(challenge.form.as_ref().unwrap().question_result(0), Some(false));

        challenge.finish_submit(Ok(check_response(
            serde_json::json!({"success": false, "error": "Attempt limit reached"}),
        )));
        assert_eq!(challenge.result, Some((false, "Attempt limit reached".into())));
    }

    #[test]
    fn code_task_submits_the_buffer() {
        let mut challenge = ChallengeState::default();
        challenge.load_task(
            serde_json::from_value(serde_json::json!({
                "slug": "dist",
                "task_type": "code",
                "initial_code": "def dist(a, b):\n    pass",
            }))
            .unwrap(),
        );
        assert!(challenge.is_code_task());
        assert!(challenge.form.is_none());
        assert!(challenge.parse_error.is_none());
        assert_eq!(challenge.code_buffer, "def dist(a, b):\n    pass");

        challenge.code_buffer = "def dist(a, b):\n    return 0".into();
        let body = challenge.begin_submit().unwrap();
        assert_eq!(
            serde_json::to_value(&body.code).unwrap(),
            serde_json::json!("def dist(a, b):\n    return 0")
        );
    }

    #[test]
    fn transport_failure_surfaces_as_the_result_line() {
        let mut challenge = ChallengeState::default();
        challenge.is_submitting = true;
        challenge.finish_submit(Err("Network error: connection refused".into()));
        assert!(!challenge.is_submitting);
        assert_eq!(
            challenge.result,
            Some((false, "Network error: connection refused".into()))
        );
    }
}
