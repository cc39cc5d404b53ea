// src/executors/docker.rs
use async_trait::async_trait;
use bollard::container::LogOutput;
use bollard::models::ContainerCreateBody;
use bollard::query_parameters::{
    BuildImageOptionsBuilder, CreateContainerOptions as BollardCreateContainerOptionsQuery,
    LogsOptions as BollardLogsOptionsQuery,
    RemoveContainerOptions as BollardRemoveContainerOptionsQuery,
    StartContainerOptions as BollardStartContainerOptionsQuery,
    WaitContainerOptions as BollardWaitContainerOptionsQuery,
};
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use uuid::Uuid;

use super::ScriptExecutor;
use crate::errors::{DockerExecutorError, PipelineError};
use crate::models::ContainerResult;

pub struct DockerScriptExecutor {
    docker: Docker,
    build_timeout_seconds: Option<u64>,
    run_timeout_seconds: Option<u64>,
}

impl DockerScriptExecutor {
    pub fn new(
        build_timeout_seconds: Option<u64>,
        run_timeout_seconds: Option<u64>,
    ) -> Result<Self, DockerExecutorError> {
        let docker = Docker::connect_with_local_defaults()?;
        Ok(Self {
            docker,
            build_timeout_seconds,
            run_timeout_seconds,
        })
    }

    async fn build_image(&self, context_dir: &Path, image_tag: &str) -> Result<(), PipelineError> {
        let context = pack_build_context(context_dir).map_err(|e| {
            PipelineError::ImageBuildFailed {
                image: image_tag.to_string(),
                message: e.to_string(),
            }
        })?;

        let options = BuildImageOptionsBuilder::default()
            .dockerfile("Dockerfile")
            .t(image_tag)
            .rm(true)
            .build();

        log::info!("Building image {} from {}", image_tag, context_dir.display());
        let build = async {
            let mut stream =
                self.docker
                    .build_image(options, None, Some(bollard::body_full(context.into())));

            while let Some(item) = stream.next().await {
                let info = item.map_err(|e| DockerExecutorError::BuildFailed(e.to_string()))?;
                if let Some(line) = info.stream.as_deref() {
                    let line = line.trim_end();
                    if !line.is_empty() {
                        log::debug!("[build {}] {}", image_tag, line);
                    }
                }
                if let Some(detail) = info.error_detail {
                    let message = detail
                        .message
                        .unwrap_or_else(|| "unknown build error".to_string());
                    return Err(DockerExecutorError::BuildFailed(message));
                }
            }
            Ok(())
        };

        match with_timeout("image build", self.build_timeout_seconds, build).await {
            Ok(()) => Ok(()),
            Err(DockerExecutorError::Timeout(operation, seconds)) => {
                Err(PipelineError::Timeout { operation, seconds })
            }
            Err(DockerExecutorError::BuildFailed(message)) => Err(PipelineError::ImageBuildFailed {
                image: image_tag.to_string(),
                message,
            }),
            Err(other) => Err(other.into()),
        }
    }
}

/// The container calls a single run needs. Split out so the cleanup order in
/// [`run_once`] does not depend on a live daemon.
#[async_trait]
pub trait ContainerOps: Send + Sync {
    /// Create a stopped container and return its id.
    async fn create(&self, image_tag: &str, args: &[String]) -> Result<String, DockerExecutorError>;
    async fn start(&self, container_id: &str) -> Result<(), DockerExecutorError>;
    /// Block until the container exits and return its exit code.
    async fn wait(&self, container_id: &str) -> Result<i64, DockerExecutorError>;
    /// Combined stdout and stderr.
    async fn logs(&self, container_id: &str) -> Result<String, DockerExecutorError>;
    async fn remove(&self, container_id: &str) -> Result<(), DockerExecutorError>;
}

#[async_trait]
impl ContainerOps for DockerScriptExecutor {
    async fn create(&self, image_tag: &str, args: &[String]) -> Result<String, DockerExecutorError> {
        let options = Some(BollardCreateContainerOptionsQuery {
            name: Some(format!("scriptcheck-run-{}", Uuid::new_v4())),
            ..Default::default()
        });

        let config = ContainerCreateBody {
            image: Some(image_tag.to_string()),
            cmd: Some(args.to_vec()),
            attach_stdout: Some(true),
            attach_stderr: Some(true),
            ..Default::default()
        };

        let container = self.docker.create_container(options, config).await?;
        Ok(container.id)
    }

    async fn start(&self, container_id: &str) -> Result<(), DockerExecutorError> {
        self.docker
            .start_container(container_id, None::<BollardStartContainerOptionsQuery>)
            .await?;
        Ok(())
    }

    async fn wait(&self, container_id: &str) -> Result<i64, DockerExecutorError> {
        let mut wait_stream = self
            .docker
            .wait_container(container_id, None::<BollardWaitContainerOptionsQuery>);
        match wait_stream.next().await {
            Some(Ok(response)) => Ok(response.status_code),
            // A non-zero exit surfaces as an error from the wait call
            Some(Err(bollard::errors::Error::DockerContainerWaitError { code, .. })) => Ok(code),
            Some(Err(e)) => Err(DockerExecutorError::BollardError(e)),
            None => Err(DockerExecutorError::WaitStreamEnded),
        }
    }

    async fn logs(&self, container_id: &str) -> Result<String, DockerExecutorError> {
        let mut output_stream = self.docker.logs(
            container_id,
            Some(BollardLogsOptionsQuery {
                stdout: true,
                stderr: true,
                ..Default::default()
            }),
        );

        let mut output = String::new();
        while let Some(log_result) = output_stream.next().await {
            match log_result? {
                LogOutput::StdOut { message } | LogOutput::StdErr { message } => {
                    output.push_str(&String::from_utf8_lossy(&message))
                }
                _ => {}
            }
        }
        Ok(output)
    }

    async fn remove(&self, container_id: &str) -> Result<(), DockerExecutorError> {
        self.docker
            .remove_container(
                container_id,
                Some(BollardRemoveContainerOptionsQuery {
                    force: true,
                    ..Default::default()
                }),
            )
            .await?;
        Ok(())
    }
}

/// Create, start, wait for and read one container, then remove it.
///
/// Removal runs once the container exists, whether or not the run succeeded.
/// A failed removal is logged and never replaces the run's own outcome.
pub async fn run_once<O: ContainerOps + ?Sized>(
    ops: &O,
    image_tag: &str,
    args: &[String],
    run_timeout_seconds: Option<u64>,
) -> Result<ContainerResult, DockerExecutorError> {
    let container_id = ops.create(image_tag, args).await?;
    log::info!("Created container {} from {}", container_id, image_tag);

    let outcome = async {
        ops.start(&container_id).await?;
        let exit_code =
            with_timeout("container run", run_timeout_seconds, ops.wait(&container_id)).await?;
        let output = ops.logs(&container_id).await?;
        log::info!("Container {} exited with code {}", container_id, exit_code);
        Ok::<_, DockerExecutorError>(ContainerResult::new(output, exit_code))
    }
    .await;

    if let Err(e) = ops.remove(&container_id).await {
        log::warn!("Failed to remove container {}: {}", container_id, e);
    }

    outcome
}

#[async_trait]
impl ScriptExecutor for DockerScriptExecutor {
    async fn run_script(
        &self,
        context_dir: &Path,
        image_tag: &str,
        args: &[String],
    ) -> Result<ContainerResult, PipelineError> {
        self.build_image(context_dir, image_tag).await?;
        Ok(run_once(self, image_tag, args, self.run_timeout_seconds).await?)
    }
}

async fn with_timeout<T, F>(
    operation: &str,
    seconds: Option<u64>,
    future: F,
) -> Result<T, DockerExecutorError>
where
    F: Future<Output = Result<T, DockerExecutorError>>,
{
    let Some(seconds) = seconds else {
        return future.await;
    };

    tokio::select! {
        res = future => res,
        _ = tokio::time::sleep(Duration::from_secs(seconds)) => {
            log::warn!("{} timed out after {}s", operation, seconds);
            Err(DockerExecutorError::Timeout(operation.to_string(), seconds))
        }
    }
}

/// Tar up every regular file in `dir`, paths relative to it.
pub fn pack_build_context(dir: &Path) -> Result<Vec<u8>, DockerExecutorError> {
    let mut builder = tar::Builder::new(Vec::new());
    builder.append_dir_all(".", dir)?;
    Ok(builder.into_inner()?)
}
