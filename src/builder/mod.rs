//! Driving the external toolchain.
//!
//! SDK selection, step invocation, artifact archiving, and the plan and
//! event types describing a run.

pub mod archive;
pub mod events;
pub mod invoker;
pub mod plan;
pub mod toolchain;

pub use archive::{ArtifactArchiver, BuildArtifact};
pub use events::MatrixEvent;
pub use invoker::{BuildInvoker, BuildStep, BuildTool, CommandTool};
pub use plan::MatrixPlan;
pub use toolchain::{SdkLocator, ToolchainEnv};
