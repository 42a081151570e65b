use eframe::egui::{Button, Frame, RichText, ScrollArea, Stroke, TextEdit, Ui};

use crate::api::types::CheckBody;
use crate::color::ClusterPalette;
use crate::data::quiz::{QuizForm, QuizPayload};
use crate::state::ChallengeState;

// ---------------------------------------------------------------------------
// Challenge view – quiz rendering and submission
// ---------------------------------------------------------------------------

/// Render the loaded task and return a check request when the user submits
/// a complete answer set. An incomplete form never yields a request; the
/// blocking warning is shown instead.
pub fn challenge_panel(ui: &mut Ui, challenge: &mut ChallengeState) -> Option<CheckBody> {
    let Some(task) = &challenge.task else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a task to begin  (File → Open task…)");
        });
        return None;
    };

    ui.heading(task.slug.clone());
    ui.separator();

    if let Some(err) = &challenge.parse_error {
        // Data-quality failure past the robust-parse bound: visible, not fatal.
        ui.colored_label(
            ClusterPalette::failure(),
            format!("Failed to render quiz: {err}"),
        );
        return None;
    }

    let mut submit_clicked = false;
    let is_code = challenge.is_code_task();
    let submit_label = if is_code { "Run check" } else { "Submit answers" };

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            if is_code {
                ui.add(
                    TextEdit::multiline(&mut challenge.code_buffer)
                        .code_editor()
                        .desired_rows(16)
                        .desired_width(f32::INFINITY),
                );
            } else if let Some(form) = &mut challenge.form {
                render_form(ui, form);
            }

            ui.add_space(8.0);
            ui.horizontal(|ui: &mut Ui| {
                submit_clicked = ui
                    .add_enabled(!challenge.is_submitting, Button::new(submit_label))
                    .clicked();
                if challenge.is_submitting {
                    ui.spinner();
                }
            });

            if let Some(warning) = challenge.form.as_ref().and_then(|f| f.warning.clone()) {
                ui.colored_label(ClusterPalette::warning(), format!("⚠ {warning}"));
            }

            if let Some((passed, message)) = &challenge.result {
                let color = if *passed {
                    ClusterPalette::success()
                } else {
                    ClusterPalette::failure()
                };
                ui.colored_label(color, message);
            }
        });

    if submit_clicked {
        challenge.begin_submit()
    } else {
        None
    }
}

fn render_form(ui: &mut Ui, form: &mut QuizForm) {
    // Clone the normalized payload so selections can mutate inside the loop.
    let payload = form.payload.clone();

    match payload {
        QuizPayload::MultiQuestion(questions) => {
            for (q_idx, question) in questions.iter().enumerate() {
                let stroke = match form.question_result(q_idx) {
                    Some(true) => Stroke::new(1.0, ClusterPalette::success()),
                    Some(false) => Stroke::new(2.0, ClusterPalette::failure()),
                    None => ui.visuals().widgets.noninteractive.bg_stroke,
                };

                Frame::group(ui.style()).stroke(stroke).show(ui, |ui: &mut Ui| {
                    ui.label(RichText::new(&question.text).strong());
                    ui.add_space(2.0);
                    for (o_idx, option) in question.options.iter().enumerate() {
                        ui.radio_value(&mut form.selected[q_idx], Some(o_idx), &option.text);
                    }
                });
                ui.add_space(6.0);
            }
        }
        QuizPayload::Legacy(options) => {
            for (o_idx, option) in options.iter().enumerate() {
                ui.checkbox(&mut form.checked[o_idx], &option.text);
            }
        }
    }
}
