//! Container execution harness.
//!
//! An executor builds an image from a materialised output directory and runs
//! it once with the given arguments. Implementations must remove any
//! container they create, whatever the outcome.

use async_trait::async_trait;
use std::path::Path;

use crate::errors::PipelineError;
use crate::models::ContainerResult;

pub mod docker;

pub use docker::{run_once, ContainerOps, DockerScriptExecutor};

#[async_trait]
pub trait ScriptExecutor: Send + Sync {
    /// Build `context_dir` as `image_tag`, then run it with `args` as the
    /// container command.
    async fn run_script(
        &self,
        context_dir: &Path,
        image_tag: &str,
        args: &[String],
    ) -> Result<ContainerResult, PipelineError>;
}

/// Image tag used for a script, e.g. `square.py` becomes `square-py-auto-image`.
pub fn image_tag_for(script_name: &str) -> String {
    format!("{}-auto-image", script_name)
        .replace('.', "-")
        .to_lowercase()
}
