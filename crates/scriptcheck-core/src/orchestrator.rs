//! Pipeline driver
//!
//! [`ScriptValidator::execute`] walks a run through analysis, synthesis,
//! materialisation, container execution and comparison. Each state change is
//! logged; the first error ends the run and is returned together with the
//! state the run was in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::{LanguageRegistry, ScriptCheckConfig};
use crate::conversation::Conversation;
use crate::errors::{PipelineError, PipelineFailure};
use crate::executors::{image_tag_for, ScriptExecutor};
use crate::guardrails::InjectionGuard;
use crate::llm::LLM;
use crate::models::{AnalysisResult, ScriptMetadata};
use crate::output::OutputWorkspace;
use crate::pipeline::{analyze_script, synthesize_docker_artifacts, PipelineState, StageContext};
use crate::validation::StructuredResponseValidator;
use crate::verdict::{compare, ValidationReport};

pub struct ScriptValidator {
    llm: Arc<dyn LLM>,
    executor: Arc<dyn ScriptExecutor>,
    registry: LanguageRegistry,
    workspace: OutputWorkspace,
    guard: InjectionGuard,
    validator: StructuredResponseValidator,
}

impl ScriptValidator {
    pub fn new(
        llm: Arc<dyn LLM>,
        executor: Arc<dyn ScriptExecutor>,
        registry: LanguageRegistry,
        output_dir: impl Into<PathBuf>,
    ) -> Result<Self, PipelineError> {
        Ok(Self {
            llm,
            executor,
            registry,
            workspace: OutputWorkspace::new(output_dir),
            guard: InjectionGuard::with_default_checks()?,
            validator: StructuredResponseValidator::new()?,
        })
    }

    /// Builds a validator whose registry and output directory come from
    /// `config`.
    pub fn from_config(
        config: &ScriptCheckConfig,
        llm: Arc<dyn LLM>,
        executor: Arc<dyn ScriptExecutor>,
    ) -> Result<Self, PipelineError> {
        Self::new(
            llm,
            executor,
            LanguageRegistry::with_overrides(&config.languages),
            config.output_dir.clone(),
        )
    }

    pub fn with_guard(mut self, guard: InjectionGuard) -> Self {
        self.guard = guard;
        self
    }

    pub fn output_dir(&self) -> &Path {
        self.workspace.root()
    }

    /// Run the pipeline for `args`, which must be a script path and a README
    /// path.
    pub async fn execute(&self, args: &[String]) -> Result<ValidationReport, PipelineFailure> {
        let mut state = PipelineState::Init;
        log::info!("Pipeline state: {}", state);

        match self.run(args, &mut state).await {
            Ok(report) => {
                advance(&mut state, PipelineState::Done);
                Ok(report)
            }
            Err(error) => {
                let failure = PipelineFailure::new(state, error);
                log::error!("{}", failure);
                log::info!("Pipeline state: {}", PipelineState::Failed);
                Err(failure)
            }
        }
    }

    async fn run(
        &self,
        args: &[String],
        state: &mut PipelineState,
    ) -> Result<ValidationReport, PipelineError> {
        let metadata = load_metadata(args).await?;

        advance(state, PipelineState::Analyzing);
        let ctx = StageContext {
            llm: self.llm.as_ref(),
            guard: &self.guard,
            validator: &self.validator,
        };
        let (analysis, conversation) = analyze_script(&ctx, Conversation::new(), &metadata).await?;

        advance(state, PipelineState::VerdictChecked);
        check_verdict(&analysis)?;
        let docker_config = self.registry.lookup(&analysis.script_type)?;

        advance(state, PipelineState::Synthesizing);
        let (artifacts, _conversation) = synthesize_docker_artifacts(
            &ctx,
            conversation,
            &analysis,
            &metadata.script_name,
            docker_config,
        )
        .await?;
        let outputs = self.workspace.materialize(&metadata, &artifacts).await?;

        advance(state, PipelineState::Materialized);
        let test = analysis.first_test().ok_or_else(|| PipelineError::AnalysisRejected {
            verdict: analysis.verdict.to_string(),
            reason: "no test cases were proposed".to_string(),
        })?;
        let image_tag = image_tag_for(&metadata.script_name);

        advance(state, PipelineState::Executing);
        let container = self
            .executor
            .run_script(&outputs.output_dir, &image_tag, &[test.input_value.clone()])
            .await?;

        advance(state, PipelineState::Compared);
        let verdict = compare(test, &container);

        Ok(ValidationReport {
            analysis,
            verdict,
            outputs,
            container,
        })
    }
}

fn advance(state: &mut PipelineState, next: PipelineState) {
    log::info!("Pipeline state: {} -> {}", state, next);
    *state = next;
}

fn check_verdict(analysis: &AnalysisResult) -> Result<(), PipelineError> {
    if analysis.tests.is_empty() {
        return Err(PipelineError::AnalysisRejected {
            verdict: analysis.verdict.to_string(),
            reason: "no test cases were proposed".to_string(),
        });
    }
    if !analysis.is_success {
        let reason = if analysis.issues.is_empty() {
            let failing = analysis.tests.iter().filter(|t| !t.is_success).count();
            format!("{} of {} predicted tests fail", failing, analysis.tests.len())
        } else {
            analysis.issues.join("; ")
        };
        return Err(PipelineError::AnalysisRejected {
            verdict: analysis.verdict.to_string(),
            reason,
        });
    }
    Ok(())
}

/// Checks both paths before reading anything, so a bad invocation leaves no
/// trace on disk.
async fn load_metadata(args: &[String]) -> Result<ScriptMetadata, PipelineError> {
    let [script_path, readme_path] = args else {
        return Err(PipelineError::InputValidation(format!(
            "Expected 2 arguments (script path and README path), got {}",
            args.len()
        )));
    };
    let script_path = PathBuf::from(script_path);
    let readme_path = PathBuf::from(readme_path);

    for (label, path) in [("Script", &script_path), ("README", &readme_path)] {
        if !tokio::fs::try_exists(path).await.unwrap_or(false) {
            return Err(PipelineError::InputValidation(format!(
                "{} file not found: {}",
                label,
                path.display()
            )));
        }
    }

    let script_name = script_path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            PipelineError::InputValidation(format!(
                "Script name could not be determined from {}",
                script_path.display()
            ))
        })?;

    let script_content = read_input(&script_path).await?;
    let readme_content = read_input(&readme_path).await?;

    Ok(ScriptMetadata {
        script_path,
        script_name,
        script_content,
        readme_content,
    })
}

async fn read_input(path: &Path) -> Result<String, PipelineError> {
    tokio::fs::read_to_string(path).await.map_err(|e| {
        PipelineError::InputValidation(format!("Failed to read {}: {}", path.display(), e))
    })
}
