/// Data layer: core types and tolerant ingestion.
///
/// Architecture:
/// ```text
///  click / .json / .csv / preset        quiz payload (messy JSON)
///             │                                  │
///             ▼                                  ▼
///        ┌──────────┐                      ┌──────────┐
///        │  loader   │  file → Vec<Point>  │   quiz    │  bounded robust
///        └──────────┘                      └──────────┘  parse + form
///             │                                  │
///             ▼                                  ▼
///        ┌──────────┐                      ┌──────────┐
///        │   model   │  Point, StepSnapshot │ QuizForm │  answers,
///        └──────────┘  StepHistory, …      └──────────┘  verdicts
/// ```

pub mod loader;
pub mod model;
pub mod quiz;
