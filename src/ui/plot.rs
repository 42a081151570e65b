use std::collections::BTreeMap;

use eframe::egui::Ui;
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotBounds, PlotPoints, Points};

use crate::color::ClusterPalette;
use crate::data::model::{Dendrogram, Point, StepSnapshot, DOMAIN_MAX, DOMAIN_MIN, NOISE_LABEL};
use crate::state::ReplayController;

// ---------------------------------------------------------------------------
// Step partitioning (pure)
// ---------------------------------------------------------------------------

/// Points of one snapshot bucketed for rendering: one bucket per distinct
/// non-sentinel label, one noise bucket, and the unlabeled base trace when
/// the snapshot carries no labels at all.
#[derive(Debug, Default, PartialEq)]
pub struct StepPartition {
    /// (label, members), ascending by label.
    pub clusters: Vec<(i32, Vec<Point>)>,
    pub noise: Vec<Point>,
    pub unlabeled: Vec<Point>,
}

/// Bucket `points` by the snapshot's labels.
///
/// Tolerates every shape the contract can degrade into: absent labels
/// (all points render unlabeled), labels longer than the point set (extra
/// entries ignored), labels shorter than the point set (uncovered points
/// ignored), labels past the palette (wrapped at render time).
pub fn partition_step(points: &[Point], snapshot: &StepSnapshot) -> StepPartition {
    let Some(labels) = &snapshot.labels else {
        return StepPartition {
            unlabeled: points.to_vec(),
            ..Default::default()
        };
    };

    let mut clusters: BTreeMap<i32, Vec<Point>> = BTreeMap::new();
    let mut noise = Vec::new();
    for (&point, &label) in points.iter().zip(labels.iter()) {
        if label == NOISE_LABEL || label < 0 {
            noise.push(point);
        } else {
            clusters.entry(label).or_default().push(point);
        }
    }

    StepPartition {
        clusters: clusters.into_iter().collect(),
        noise,
        unlabeled: Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Cluster plot (central panel)
// ---------------------------------------------------------------------------

fn to_plot_points(points: &[Point]) -> PlotPoints<'static> {
    points.iter().map(|p| [p.x(), p.y()]).collect()
}

/// Render the scatter surface for the current controller state and return
/// the data-space point of a click inside the logical domain, if any.
///
/// The surface is deliberately non-interactive (no pan/zoom/scroll) with
/// bounds pinned to the logical domain, so the pixel-to-data transform is
/// stable and clicks land where the user aimed.
pub fn cluster_plot(
    ui: &mut Ui,
    state: &ReplayController,
    palette: &ClusterPalette,
) -> Option<Point> {
    let snapshot = state.current_snapshot();

    let response = Plot::new("cluster_plot")
        .legend(Legend::default())
        .allow_drag(false)
        .allow_zoom(false)
        .allow_scroll(false)
        .allow_boxed_zoom(false)
        .allow_double_click_reset(false)
        .show_x(false)
        .show_y(false)
        .show(ui, |plot_ui| {
            plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                [DOMAIN_MIN, DOMAIN_MIN],
                [DOMAIN_MAX, DOMAIN_MAX],
            ));

            match snapshot {
                Some(snapshot) => draw_step(plot_ui, state.points(), snapshot, palette),
                None => draw_points(plot_ui, state.points()),
            }

            // The plot's own transform inverts pixels to data space; clicks
            // on the margins resolve outside the domain and are dropped
            // below.
            if plot_ui.response().clicked() {
                plot_ui.pointer_coordinate().map(|p| Point(p.x, p.y))
            } else {
                None
            }
        });

    response.inner.filter(Point::in_domain)
}

/// Single unlabeled trace of all current points.
fn draw_points(plot_ui: &mut egui_plot::PlotUi, points: &[Point]) {
    if points.is_empty() {
        return;
    }
    plot_ui.points(
        Points::new(to_plot_points(points))
            .name("Points")
            .color(ClusterPalette::unlabeled())
            .radius(5.0),
    );
}

/// One series per non-empty bucket, then the centroid overlay.
fn draw_step(
    plot_ui: &mut egui_plot::PlotUi,
    points: &[Point],
    snapshot: &StepSnapshot,
    palette: &ClusterPalette,
) {
    let partition = partition_step(points, snapshot);

    if !partition.unlabeled.is_empty() {
        draw_points(plot_ui, &partition.unlabeled);
    }

    if !partition.noise.is_empty() {
        plot_ui.points(
            Points::new(to_plot_points(&partition.noise))
                .name("Noise")
                .color(ClusterPalette::noise())
                .shape(MarkerShape::Cross)
                .radius(4.0),
        );
    }

    for (label, members) in &partition.clusters {
        plot_ui.points(
            Points::new(to_plot_points(members))
                .name(format!("Cluster {}", label + 1))
                .color(palette.color_for(*label))
                .radius(5.0),
        );
    }

    if let Some(centroids) = &snapshot.centroids {
        if !centroids.is_empty() {
            plot_ui.points(
                Points::new(to_plot_points(centroids))
                    .name("Centroids")
                    .color(ClusterPalette::centroid())
                    .shape(MarkerShape::Cross)
                    .radius(7.0),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Dendrogram plot (secondary window)
// ---------------------------------------------------------------------------

/// Draw the agglomerative merge tree: one line per branch segment.
pub fn dendrogram_plot(ui: &mut Ui, dendrogram: &Dendrogram) {
    if dendrogram.is_empty() {
        ui.label("No dendrogram data");
        return;
    }
    Plot::new("dendrogram_plot")
        .allow_drag(false)
        .allow_scroll(false)
        .show_x(false)
        .show_y(false)
        .show(ui, |plot_ui| {
            for (xs, ys) in dendrogram.segments() {
                let coords: PlotPoints = xs
                    .iter()
                    .zip(ys.iter())
                    .map(|(&x, &y)| [x, y])
                    .collect();
                plot_ui.line(Line::new(coords).color(ClusterPalette::unlabeled()).width(1.5));
            }
        });
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
