use async_trait::async_trait;
use scriptcheck_core::config::LanguageRegistry;
use scriptcheck_core::core_types::{LLMResponse, Message, Role};
use scriptcheck_core::errors::{PipelineError, PipelineFailure};
use scriptcheck_core::executors::ScriptExecutor;
use scriptcheck_core::llm::LLM;
use scriptcheck_core::models::ContainerResult;
use scriptcheck_core::pipeline::PipelineState;
use scriptcheck_core::ScriptValidator;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

const ANALYSIS_OK: &str = r#"{
    "scriptType": "python",
    "scriptName": "square.py",
    "analysis": "SUCCESS",
    "tests": [
        {"inputValue": "3", "testResult": "9", "isSuccess": true},
        {"inputValue": "5", "testResult": "25", "isSuccess": true}
    ],
    "issues": []
}"#;

const DOCKER_OK: &str = r#"```json
{
    "dockerfileContent": "FROM python:3-slim\nWORKDIR /app\nCOPY square.py /app/\nENTRYPOINT [\"python\", \"/app/square.py\"]\n",
    "readmeContent": "Build with docker build, run with one number."
}
```"#;

#[derive(Clone, Default)]
struct MockLLM {
    responses: Arc<Mutex<Vec<String>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLLM {
    fn new(responses: &[&str]) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.iter().map(|s| s.to_string()).collect())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl LLM for MockLLM {
    async fn generate(&self, messages: Vec<Message>) -> Result<LLMResponse, PipelineError> {
        self.requests.lock().unwrap().push(messages);
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(PipelineError::LLMError("no response queued".to_string()));
        }
        Ok(LLMResponse::from_text(responses.remove(0)))
    }
}

#[derive(Debug, Clone)]
struct ExecutorCall {
    image_tag: String,
    args: Vec<String>,
    context_files: Vec<String>,
}

struct MockExecutor {
    outcome: Result<ContainerResult, PipelineError>,
    calls: Mutex<Vec<ExecutorCall>>,
}

impl MockExecutor {
    fn returning(output: &str, exit_code: i64) -> Self {
        Self {
            outcome: Ok(ContainerResult::new(output.to_string(), exit_code)),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn failing(error: PipelineError) -> Self {
        Self {
            outcome: Err(error),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<ExecutorCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ScriptExecutor for MockExecutor {
    async fn run_script(
        &self,
        context_dir: &Path,
        image_tag: &str,
        args: &[String],
    ) -> Result<ContainerResult, PipelineError> {
        let mut context_files: Vec<String> = std::fs::read_dir(context_dir)?
            .map(|entry| entry.map(|e| e.file_name().to_string_lossy().to_string()))
            .collect::<Result<_, _>>()?;
        context_files.sort();

        self.calls.lock().unwrap().push(ExecutorCall {
            image_tag: image_tag.to_string(),
            args: args.to_vec(),
            context_files,
        });
        self.outcome.clone()
    }
}

struct Fixture {
    dir: TempDir,
    script: PathBuf,
    readme: PathBuf,
}

impl Fixture {
    fn new(script_name: &str, script: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let script_path = dir.path().join(script_name);
        let readme_path = dir.path().join("README.md");
        std::fs::write(&script_path, script).unwrap();
        std::fs::write(&readme_path, "Prints the square of its argument.").unwrap();
        Self {
            dir,
            script: script_path,
            readme: readme_path,
        }
    }

    fn output_dir(&self) -> PathBuf {
        self.dir.path().join("output")
    }

    fn args(&self) -> Vec<String> {
        vec![
            self.script.to_string_lossy().to_string(),
            self.readme.to_string_lossy().to_string(),
        ]
    }

    fn validator(&self, llm: &MockLLM, executor: Arc<MockExecutor>) -> ScriptValidator {
        ScriptValidator::new(
            Arc::new(llm.clone()),
            executor,
            LanguageRegistry::builtin(),
            self.output_dir(),
        )
        .unwrap()
    }
}

const SQUARE: &str = "import sys\nn = int(sys.argv[1])\nprint(f'the result is {n * n}')\n";

fn assert_failure(failure: &PipelineFailure, state: PipelineState) {
    assert_eq!(failure.failed_in, state, "unexpected failure: {}", failure);
    assert_eq!(failure.exit_code(), 1);
}

#[tokio::test]
async fn test_end_to_end_success() {
    let fixture = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("the result is 9\n", 0));

    let report = fixture
        .validator(&llm, executor.clone())
        .execute(&fixture.args())
        .await
        .unwrap();

    assert!(report.verdict.success);
    assert_eq!(report.verdict.input, "3");
    assert_eq!(report.verdict.actual_output, "the result is 9");
    assert_eq!(report.verdict.expected_output, "9");
    assert_eq!(report.analysis.tests.len(), 2);

    let calls = executor.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].image_tag, "square-py-auto-image");
    assert_eq!(calls[0].args, vec!["3".to_string()]);
    assert_eq!(calls[0].context_files, vec!["Dockerfile", "README.md", "square.py"]);

    assert_eq!(
        std::fs::read_to_string(fixture.output_dir().join("square.py")).unwrap(),
        SQUARE
    );
    assert!(report.render().contains("✓ Test passed"));
}

#[tokio::test]
async fn test_synthesis_request_carries_analysis_exchange() {
    let fixture = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("the result is 9\n", 0));

    fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap();

    let requests = llm.requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    let synthesis = &requests[1];
    let roles: Vec<Role> = synthesis.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::System, Role::User]
    );
    assert_eq!(synthesis[2].content, ANALYSIS_OK);
}

#[tokio::test]
async fn test_synthesis_copies_file_name_from_disk() {
    let fixture = Fixture::new("square.py", SQUARE);
    let renamed = ANALYSIS_OK.replace("\"scriptName\": \"square.py\"", "\"scriptName\": \"Square\"");
    let llm = MockLLM::new(&[&renamed, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("the result is 9\n", 0));

    let report = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap();
    assert_eq!(report.analysis.script_name, "Square");

    let requests = llm.requests.lock().unwrap().clone();
    let synthesis_request = &requests[1][4].content;
    assert!(synthesis_request.contains("COPY square.py /app/"));
    assert!(!synthesis_request.contains("COPY Square"));
}

#[tokio::test]
async fn test_output_mismatch_is_a_completed_run() {
    let fixture = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("Traceback: boom\n", 1));

    let report = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap();

    assert!(!report.verdict.success);
    assert!(!report.container.success);
    assert!(report.render().contains("✗ Test failed"));
}

#[tokio::test]
async fn test_build_failure_keeps_synthesized_files() {
    let fixture = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::failing(PipelineError::ImageBuildFailed {
        image: "square-py-auto-image".to_string(),
        message: "pull access denied".to_string(),
    }));

    let failure = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap_err();

    assert_failure(&failure, PipelineState::Executing);
    assert!(matches!(failure.source, PipelineError::ImageBuildFailed { .. }));
    let dockerfile = std::fs::read_to_string(fixture.output_dir().join("Dockerfile")).unwrap();
    assert!(dockerfile.starts_with("FROM python:3-slim"));
}

#[tokio::test]
async fn test_missing_paths_write_nothing() {
    let fixture = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("", 0));
    let validator = fixture.validator(&llm, executor.clone());

    let cases = vec![
        vec![
            fixture.dir.path().join("nope.py").to_string_lossy().to_string(),
            fixture.readme.to_string_lossy().to_string(),
        ],
        vec![
            fixture.script.to_string_lossy().to_string(),
            fixture.dir.path().join("nope.md").to_string_lossy().to_string(),
        ],
        vec![fixture.script.to_string_lossy().to_string()],
    ];

    for args in cases {
        let failure = validator.execute(&args).await.unwrap_err();
        assert_failure(&failure, PipelineState::Init);
        assert!(matches!(failure.source, PipelineError::InputValidation(_)));
    }

    assert!(!fixture.output_dir().exists());
    assert_eq!(llm.request_count(), 0);
    assert!(executor.calls().is_empty());
}

#[tokio::test]
async fn test_second_run_replaces_output() {
    let first = Fixture::new("square.py", SQUARE);
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK, ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("the result is 9", 0));
    let validator = first.validator(&llm, executor);

    validator.execute(&first.args()).await.unwrap();
    std::fs::write(first.output_dir().join("stale.log"), "old").unwrap();

    let renamed = first.dir.path().join("cube.py");
    std::fs::write(&renamed, SQUARE).unwrap();
    validator
        .execute(&[
            renamed.to_string_lossy().to_string(),
            first.readme.to_string_lossy().to_string(),
        ])
        .await
        .unwrap();

    let mut names: Vec<String> = std::fs::read_dir(first.output_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Dockerfile", "README.md", "cube.py"]);
}

#[tokio::test]
async fn test_rejected_analysis_stops_before_synthesis() {
    let fixture = Fixture::new("square.py", SQUARE);
    let rejected = r#"{"scriptType": "python", "scriptName": "square.py", "analysis": "FAILED",
        "tests": [{"inputValue": "3", "testResult": "9", "isSuccess": false}],
        "issues": ["argv index out of range when called without arguments"]}"#;
    let llm = MockLLM::new(&[rejected, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("", 0));

    let failure = fixture
        .validator(&llm, executor.clone())
        .execute(&fixture.args())
        .await
        .unwrap_err();

    assert_failure(&failure, PipelineState::VerdictChecked);
    assert!(matches!(
        failure.source,
        PipelineError::AnalysisRejected { ref verdict, .. } if verdict == "FAILED"
    ));
    assert_eq!(llm.request_count(), 1);
    assert!(executor.calls().is_empty());
    assert!(!fixture.output_dir().exists());
}

#[tokio::test]
async fn test_unsupported_script_type() {
    let fixture = Fixture::new("hello.cob", "DISPLAY 'HELLO'.");
    let cobol = r#"{"scriptType": "COBOL", "scriptName": "hello.cob", "analysis": "SUCCESS",
        "tests": [{"inputValue": "", "testResult": "HELLO", "isSuccess": true}], "issues": []}"#;
    let llm = MockLLM::new(&[cobol]);
    let executor = Arc::new(MockExecutor::returning("", 0));

    let failure = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap_err();

    assert_failure(&failure, PipelineState::VerdictChecked);
    match &failure.source {
        PipelineError::UnsupportedScriptType {
            script_type,
            supported,
        } => {
            assert_eq!(script_type, "cobol");
            assert!(supported.contains("python"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(llm.request_count(), 1);
}

#[tokio::test]
async fn test_injection_in_script_blocks_every_model_call() {
    let fixture = Fixture::new("evil.sh", "echo {{secrets}}\n");
    let llm = MockLLM::new(&[ANALYSIS_OK, DOCKER_OK]);
    let executor = Arc::new(MockExecutor::returning("", 0));

    let failure = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap_err();

    assert_failure(&failure, PipelineState::Analyzing);
    assert!(matches!(failure.source, PipelineError::InjectionDetected { .. }));
    assert_eq!(llm.request_count(), 0);
    assert!(!fixture.output_dir().exists());
}

#[tokio::test]
async fn test_schema_violation_in_analysis() {
    let fixture = Fixture::new("square.py", SQUARE);
    let missing_field = r#"{"scriptType": "python", "scriptName": "square.py", "analysis": "SUCCESS",
        "tests": [{"inputValue": "3", "testResult": "9"}], "issues": []}"#;
    let llm = MockLLM::new(&[missing_field]);
    let executor = Arc::new(MockExecutor::returning("", 0));

    let failure = fixture
        .validator(&llm, executor)
        .execute(&fixture.args())
        .await
        .unwrap_err();

    assert_failure(&failure, PipelineState::Analyzing);
    assert!(matches!(failure.source, PipelineError::SchemaViolation { .. }));
}
