mod api;
mod app;
mod color;
mod data;
mod state;
mod ui;

use anyhow::Result;
use app::ClusterLabApp;
use eframe::egui;

fn main() -> Result<()> {
    env_logger::init();

    let base_url = std::env::var("CLUSTERLAB_BASE_URL")
        .unwrap_or_else(|_| api::DEFAULT_BASE_URL.to_string());
    log::info!("using server {base_url}");
    let client = api::ApiClient::new(base_url)?;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 760.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Clusterlab – Clustering Simulator",
        options,
        Box::new(|_cc| Ok(Box::new(ClusterLabApp::new(client)))),
    )
    .map_err(|e| anyhow::anyhow!("{e}"))
}
