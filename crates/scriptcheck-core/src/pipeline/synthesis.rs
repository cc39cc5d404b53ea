use crate::config::DockerConfig;
use crate::conversation::Conversation;
use crate::core_types::Message;
use crate::errors::PipelineError;
use crate::models::{AnalysisResult, DockerArtifacts};
use crate::pipeline::{prompts, StageContext};
use crate::validation::{validate_docker_config, ResponseSchema};

/// Ask the model for a Dockerfile and README built on `docker_config`.
///
/// The conversation must already hold the analysis exchange; the request is
/// appended to it rather than sent on its own. `script_name` is the file name
/// on disk, not the name the model reported.
pub async fn synthesize_docker_artifacts(
    ctx: &StageContext<'_>,
    conversation: Conversation,
    analysis: &AnalysisResult,
    script_name: &str,
    docker_config: &DockerConfig,
) -> Result<(DockerArtifacts, Conversation), PipelineError> {
    validate_docker_config(docker_config)?;

    let conversation = conversation
        .push_screened(ctx.guard, Message::system(prompts::SYNTHESIS_SYSTEM))?
        .push_screened(
            ctx.guard,
            Message::user(prompts::synthesis_request(analysis, script_name, docker_config)),
        )?;

    let (reply, conversation) = ctx.complete(conversation, "synthesis").await?;
    let artifacts: DockerArtifacts = ctx.validator.parse(&reply, ResponseSchema::DockerAndReadme)?;

    log::info!(
        "Synthesized Dockerfile ({} bytes) and README ({} bytes) for {}",
        artifacts.dockerfile_content.len(),
        artifacts.readme_content.len(),
        script_name
    );

    Ok((artifacts, conversation))
}
