//! Partial build pipeline

pub mod orchestrator;
pub mod request;

pub use orchestrator::{BuildPhase, CancelFlag, PartialBuildOrchestrator};
pub use request::{ArtifactLocation, ArtifactReference, BuildRequest};
