use std::sync::mpsc::{channel, Receiver};
use std::time::Duration;

use eframe::egui;

use crate::api::{ApiClient, ApiEvent, NetHandle};
use crate::color::ClusterPalette;
use crate::data::model::Dendrogram;
use crate::state::{ChallengeState, ReplayController};
use crate::ui::panels::{self, PresetPicker};
use crate::ui::{plot, quiz, View};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct ClusterLabApp {
    controller: ReplayController,
    challenge: ChallengeState,
    palette: ClusterPalette,
    view: View,
    preset: PresetPicker,
    dendrogram: Option<Dendrogram>,
    dendrogram_open: bool,
    net: NetHandle,
    rx: Receiver<ApiEvent>,
}

impl ClusterLabApp {
    pub fn new(client: ApiClient) -> Self {
        let (tx, rx) = channel();
        Self {
            controller: ReplayController::default(),
            challenge: ChallengeState::default(),
            palette: ClusterPalette::default(),
            view: View::Simulator,
            preset: PresetPicker::default(),
            dendrogram: None,
            dendrogram_open: false,
            net: NetHandle::new(client, tx),
            rx,
        }
    }

    fn apply_event(&mut self, event: ApiEvent) {
        match event {
            ApiEvent::RunFinished { generation, result } => {
                self.controller
                    .finish_run(generation, result.map_err(|e| e.to_string()));
            }
            ApiEvent::PresetLoaded { generation, result } => {
                self.controller
                    .finish_preset(generation, result.map_err(|e| e.to_string()));
            }
            ApiEvent::DendrogramLoaded { generation, result } => {
                if generation != self.controller.generation() {
                    log::info!("discarding stale dendrogram (generation {generation})");
                    return;
                }
                match result {
                    Ok(dendrogram) => {
                        self.dendrogram = Some(dendrogram);
                        self.dendrogram_open = true;
                    }
                    Err(e) => self.controller.status_message = Some(e.to_string()),
                }
            }
            ApiEvent::CheckFinished { result } => {
                self.challenge
                    .finish_submit(result.map_err(|e| e.to_string()));
            }
        }
    }
}

impl eframe::App for ClusterLabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Apply results delivered by the network threads since last frame.
        while let Ok(event) = self.rx.try_recv() {
            self.apply_event(event);
        }

        // Keep frames coming while a request is in flight so the drain
        // above does not depend on user input.
        if self.controller.is_running() || self.challenge.is_submitting {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        // A cleared session has no dendrogram to show.
        if self.controller.history_len() == 0 {
            self.dendrogram = None;
            self.dendrogram_open = false;
        }

        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.view, &mut self.controller, &mut self.challenge);
        });

        // ---- Left side panel: controls (simulator only) ----
        if self.view == View::Simulator {
            egui::SidePanel::left("control_panel")
                .default_width(220.0)
                .resizable(true)
                .show(ctx, |ui| {
                    panels::side_panel(ui, &mut self.controller, &mut self.preset, &self.net);
                });
        }

        // ---- Central panel ----
        egui::CentralPanel::default().show(ctx, |ui| match self.view {
            View::Simulator => {
                if let Some(point) = plot::cluster_plot(ui, &self.controller, &self.palette) {
                    if self.controller.add_point(point) {
                        log::debug!("added point {point}");
                    }
                }
            }
            View::Challenge => {
                if let Some(body) = quiz::challenge_panel(ui, &mut self.challenge) {
                    self.net.check(body);
                }
            }
        });

        // ---- Secondary window: dendrogram ----
        if let Some(dendrogram) = &self.dendrogram {
            egui::Window::new("Dendrogram")
                .open(&mut self.dendrogram_open)
                .default_size([420.0, 300.0])
                .show(ctx, |ui| {
                    plot::dendrogram_plot(ui, dendrogram);
                });
        }
    }
}
