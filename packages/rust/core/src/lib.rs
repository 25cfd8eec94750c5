//! Publish orchestration for postpress.
//!
//! This crate ties together markdown rendering, taxonomy resolution and
//! media attachment into the end-to-end publish run (`Publisher::publish_all`).

pub mod pacing;
pub mod payload;
pub mod publish;

pub use pacing::{FixedPacing, Pacer, Pause};
pub use payload::{PUBLISH_STATUS, ResolvedRefs, build_payload, to_wp_date};
pub use publish::{
    PostFailure, PostOutcome, PostReport, ProgressReporter, PublishConfig, Publisher, RunReport,
    SilentProgress,
};
