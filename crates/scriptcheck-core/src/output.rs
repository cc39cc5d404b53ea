//! The per-run output directory
//!
//! Holds the script copy, the synthesized `Dockerfile` and `README.md`. It is
//! removed and recreated before every write so that no file from an earlier
//! run survives into the build context.

use std::path::{Path, PathBuf};
use tokio::fs;

use crate::errors::PipelineError;
use crate::models::{DockerArtifacts, RunOutputs, ScriptMetadata};

pub const DOCKERFILE_NAME: &str = "Dockerfile";
pub const README_NAME: &str = "README.md";

#[derive(Debug, Clone)]
pub struct OutputWorkspace {
    root: PathBuf,
}

impl OutputWorkspace {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Delete the directory if it exists and create it empty.
    pub async fn reset(&self) -> Result<(), PipelineError> {
        match fs::remove_dir_all(&self.root).await {
            Ok(()) => log::debug!("Removed previous output at {}", self.root.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(PipelineError::OutputDirectory(format!(
                    "Failed to remove {}: {}",
                    self.root.display(),
                    e
                )))
            }
        }

        fs::create_dir_all(&self.root).await.map_err(|e| {
            PipelineError::OutputDirectory(format!(
                "Failed to create {}: {}",
                self.root.display(),
                e
            ))
        })
    }

    /// Reset the directory, then write the script copy and both artifacts.
    pub async fn materialize(
        &self,
        metadata: &ScriptMetadata,
        artifacts: &DockerArtifacts,
    ) -> Result<RunOutputs, PipelineError> {
        self.reset().await?;

        let outputs = RunOutputs {
            output_dir: self.root.clone(),
            dockerfile_path: self.root.join(DOCKERFILE_NAME),
            readme_path: self.root.join(README_NAME),
            script_path: self.root.join(&metadata.script_name),
        };

        self.write(&outputs.script_path, &metadata.script_content).await?;
        self.write(&outputs.dockerfile_path, &artifacts.dockerfile_content)
            .await?;
        self.write(&outputs.readme_path, &artifacts.readme_content).await?;

        log::info!(
            "Wrote {}, {} and {} to {}",
            metadata.script_name,
            DOCKERFILE_NAME,
            README_NAME,
            self.root.display()
        );
        Ok(outputs)
    }

    async fn write(&self, path: &Path, content: &str) -> Result<(), PipelineError> {
        fs::write(path, content).await.map_err(|e| {
            PipelineError::OutputDirectory(format!("Failed to write {}: {}", path.display(), e))
        })
    }
}
