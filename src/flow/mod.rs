//! Screen sequencing
//!
//! Screens exchange `SelectedAudio` and `DetectionResult` values as route
//! payloads; there is no shared navigation object.

pub mod navigator;
pub mod route;
pub mod workflow;

pub use navigator::Navigator;
pub use route::{can_transition, Route, Screen};
pub use workflow::Workflow;
