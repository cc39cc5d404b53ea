use crate::conversation::Conversation;
use crate::core_types::Message;
use crate::errors::PipelineError;
use crate::models::{AnalysisResult, AnalyzeResponse, ScriptMetadata};
use crate::pipeline::{prompts, StageContext};
use crate::validation::{validate_readme_content, validate_script_input, ResponseSchema};

/// Ask the model to classify the script, judge it and propose test cases.
pub async fn analyze_script(
    ctx: &StageContext<'_>,
    conversation: Conversation,
    metadata: &ScriptMetadata,
) -> Result<(AnalysisResult, Conversation), PipelineError> {
    validate_script_input(&metadata.script_content, &metadata.script_name)?;
    validate_readme_content(&metadata.readme_content)?;

    // Each fragment on its own; the template's fences can balance out an
    // odd count split across script and README.
    for fragment in [
        &metadata.script_name,
        &metadata.script_content,
        &metadata.readme_content,
    ] {
        ctx.guard.screen(fragment)?;
    }

    let conversation = conversation
        .push_screened(ctx.guard, Message::system(prompts::ANALYSIS_SYSTEM))?
        .push_screened(ctx.guard, Message::user(prompts::analysis_request(metadata)))?;

    let (reply, conversation) = ctx.complete(conversation, "analysis").await?;
    let response: AnalyzeResponse = ctx.validator.parse(&reply, ResponseSchema::Analysis)?;
    let result = AnalysisResult::from_response(response);

    log::info!(
        "Analysis of {}: type={}, verdict={}, {} tests, {} issues",
        result.script_name,
        result.script_type,
        result.verdict,
        result.tests.len(),
        result.issues.len()
    );

    Ok((result, conversation))
}
