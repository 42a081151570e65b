/// Network layer: blocking endpoint wrappers plus background-thread
/// dispatch.
///
/// The UI thread never blocks on the network. Each call runs on a
/// short-lived thread against the blocking client and reports back over an
/// `mpsc` channel, drained once per frame. Run and preset events carry the
/// session generation they were issued for so the controller can discard
/// responses that outlive a `clear()`.
pub mod client;
pub mod types;

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;

pub use client::{ApiClient, DEFAULT_BASE_URL};
pub use types::ApiError;

use crate::data::model::{Dendrogram, Point, StepHistory};
use crate::state::RunRequest;
use types::{CheckBody, CheckResponse};

/// Results delivered back to the UI thread.
pub enum ApiEvent {
    RunFinished {
        generation: u64,
        result: Result<StepHistory, ApiError>,
    },
    PresetLoaded {
        generation: u64,
        result: Result<Vec<Point>, ApiError>,
    },
    DendrogramLoaded {
        generation: u64,
        result: Result<Dendrogram, ApiError>,
    },
    CheckFinished {
        result: Result<CheckResponse, ApiError>,
    },
}

/// Shared handle for firing requests from event handlers.
#[derive(Clone)]
pub struct NetHandle {
    client: Arc<ApiClient>,
    tx: Sender<ApiEvent>,
}

impl NetHandle {
    pub fn new(client: ApiClient, tx: Sender<ApiEvent>) -> Self {
        NetHandle {
            client: Arc::new(client),
            tx,
        }
    }

    pub fn run(&self, request: RunRequest) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        thread::spawn(move || {
            log::info!(
                "running {} on {} points",
                request.algorithm.as_str(),
                request.points.len()
            );
            let result =
                client.run_algorithm(request.algorithm, &request.points, request.params);
            // Send fails only on shutdown.
            let _ = tx.send(ApiEvent::RunFinished {
                generation: request.generation,
                result,
            });
        });
    }

    pub fn preset(&self, preset: String, n_samples: u32, generation: u64) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        thread::spawn(move || {
            let result = client.generate_preset(&preset, n_samples);
            let _ = tx.send(ApiEvent::PresetLoaded { generation, result });
        });
    }

    pub fn dendrogram(&self, points: Vec<Point>, generation: u64) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        thread::spawn(move || {
            let result = client.dendrogram(&points);
            let _ = tx.send(ApiEvent::DendrogramLoaded { generation, result });
        });
    }

    pub fn check(&self, body: CheckBody) {
        let (client, tx) = (self.client.clone(), self.tx.clone());
        thread::spawn(move || {
            log::info!("submitting solution for '{}'", body.slug);
            let result = client.check_solution(&body);
            let _ = tx.send(ApiEvent::CheckFinished { result });
        });
    }
}
