use eframe::egui::{self, Button, ComboBox, DragValue, RichText, Slider, Ui};

use super::View;
use crate::api::NetHandle;
use crate::data::loader;
use crate::data::model::Algorithm;
use crate::state::{ChallengeState, Phase, ReplayController};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(
    ui: &mut Ui,
    view: &mut View,
    controller: &mut ReplayController,
    challenge: &mut ChallengeState,
) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open points…").clicked() {
                open_points_dialog(controller);
                *view = View::Simulator;
                ui.close_menu();
            }
            if ui.button("Open task…").clicked() {
                open_task_dialog(challenge);
                *view = View::Challenge;
                ui.close_menu();
            }
        });

        ui.separator();

        if ui
            .selectable_label(*view == View::Simulator, "Simulator")
            .clicked()
        {
            *view = View::Simulator;
        }
        if ui
            .selectable_label(*view == View::Challenge, "Challenge")
            .clicked()
        {
            *view = View::Challenge;
        }

        if *view == View::Simulator {
            ui.separator();
            ui.label(format!("{} points", controller.points().len()));

            if let Some(msg) = &controller.status_message {
                ui.separator();
                ui.label(RichText::new(msg).weak());
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Left side panel – algorithm controls and replay navigation
// ---------------------------------------------------------------------------

pub const PRESET_KINDS: [&str; 4] = ["moons", "circles", "blobs", "grid"];

/// Selection state for the preset generator widgets.
pub struct PresetPicker {
    pub kind: &'static str,
    pub samples: u32,
}

impl Default for PresetPicker {
    fn default() -> Self {
        PresetPicker {
            kind: "blobs",
            samples: 100,
        }
    }
}

/// Render the control panel.
pub fn side_panel(
    ui: &mut Ui,
    controller: &mut ReplayController,
    preset: &mut PresetPicker,
    net: &NetHandle,
) {
    ui.heading("Clustering");
    ui.separator();

    // ---- Algorithm selector ----
    ui.strong("Algorithm");
    let current = controller.algorithm();
    ComboBox::from_id_salt("algorithm")
        .selected_text(current.label())
        .show_ui(ui, |ui: &mut Ui| {
            for alg in Algorithm::ALL {
                if ui.selectable_label(current == alg, alg.label()).clicked() {
                    // Switching discards the finished run, if any.
                    controller.set_algorithm(alg);
                }
            }
        });
    ui.add_space(4.0);

    // ---- Parameters (sent as-is; the server validates ranges) ----
    match controller.algorithm() {
        Algorithm::KMeans | Algorithm::Agglomerative => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("clusters k");
                ui.add(DragValue::new(&mut controller.k));
            });
        }
        Algorithm::Dbscan => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("eps");
                ui.add(DragValue::new(&mut controller.eps).speed(0.1));
            });
            ui.horizontal(|ui: &mut Ui| {
                ui.label("minPts");
                ui.add(DragValue::new(&mut controller.min_pts));
            });
        }
        Algorithm::Forel => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("radius");
                ui.add(DragValue::new(&mut controller.radius).speed(0.1));
            });
        }
        Algorithm::MeanShift => {
            ui.horizontal(|ui: &mut Ui| {
                ui.label("bandwidth");
                ui.add(DragValue::new(&mut controller.bandwidth).speed(0.1));
            });
        }
    }
    ui.separator();

    // ---- Preset data ----
    ui.strong("Preset data");
    ui.horizontal(|ui: &mut Ui| {
        ComboBox::from_id_salt("preset_kind")
            .selected_text(preset.kind)
            .show_ui(ui, |ui: &mut Ui| {
                for kind in PRESET_KINDS {
                    if ui.selectable_label(preset.kind == kind, kind).clicked() {
                        preset.kind = kind;
                    }
                }
            });
        ui.add(DragValue::new(&mut preset.samples).range(10..=500));
    });
    let can_generate = !controller.is_running() && controller.history_len() == 0;
    if ui.add_enabled(can_generate, Button::new("Generate")).clicked() {
        if let Some(generation) = controller.begin_fetch() {
            net.preset(preset.kind.to_string(), preset.samples, generation);
        }
    }
    ui.separator();

    // ---- Run / clear ----
    ui.horizontal(|ui: &mut Ui| {
        let can_run = !controller.is_running() && !controller.points().is_empty();
        if ui.add_enabled(can_run, Button::new("▶ Run")).clicked() {
            if let Some(request) = controller.begin_run() {
                net.run(request);
            }
        }
        if ui.button("Clear").clicked() {
            controller.clear();
        }
        if controller.is_running() {
            ui.spinner();
        }
    });

    // ---- Replay navigation ----
    if controller.phase() == Phase::Ready {
        ui.separator();
        ui.strong("Replay");
        ui.horizontal(|ui: &mut Ui| {
            if ui.button("⏮ Prev").clicked() {
                controller.prev();
            }
            if ui.button("Next ⏭").clicked() {
                controller.next();
            }
            ui.label(format!(
                "step {}/{}",
                controller.cursor() + 1,
                controller.history_len()
            ));
        });

        let last = controller.history_len() - 1;
        if last > 0 {
            let mut step = controller.cursor();
            if ui.add(Slider::new(&mut step, 0..=last)).changed() {
                controller.set_step(step);
            }
        }

        if let Some(snapshot) = controller.current_snapshot() {
            if let Some(inertia) = snapshot.inertia {
                ui.label(format!("inertia: {inertia:.3}"));
            }
            if snapshot.converged == Some(true) {
                ui.label("converged");
            }
        }

        if controller.algorithm().has_dendrogram() && ui.button("Dendrogram").clicked() {
            net.dendrogram(controller.points().to_vec(), controller.generation());
        }
    }
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

pub fn open_points_dialog(controller: &mut ReplayController) {
    let file = rfd::FileDialog::new()
        .set_title("Open point set")
        .add_filter("Point sets", &["json", "csv"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_points(&path) {
            Ok(points) => {
                log::info!("loaded {} points from {}", points.len(), path.display());
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("file")
                    .to_string();
                controller.replace_points(points, &name);
            }
            Err(e) => {
                log::error!("failed to load points: {e:#}");
                controller.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

pub fn open_task_dialog(challenge: &mut ChallengeState) {
    let file = rfd::FileDialog::new()
        .set_title("Open task")
        .add_filter("Task files", &["json"])
        .pick_file();

    if let Some(path) = file {
        match loader::load_task(&path) {
            Ok(task) => {
                log::info!("loaded task '{}' from {}", task.slug, path.display());
                challenge.load_task(task);
            }
            Err(e) => {
                log::error!("failed to load task: {e:#}");
                challenge.parse_error = Some(format!("{e:#}"));
            }
        }
    }
}
