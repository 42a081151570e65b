/// UI layer: panel widgets and plot rendering over the state structs.
pub mod panels;
pub mod plot;
pub mod quiz;

/// Which page the window is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Simulator,
    Challenge,
}
