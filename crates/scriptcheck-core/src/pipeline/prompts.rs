//! Message templates for the two model stages

use crate::config::DockerConfig;
use crate::models::{AnalysisResult, ScriptMetadata};

pub const ANALYSIS_SYSTEM: &str = "You are a script analyzer and tester.";

pub const SYNTHESIS_SYSTEM: &str = "You are a DevOps engineer.";

pub fn analysis_request(metadata: &ScriptMetadata) -> String {
    format!(
        r#"Analyze this script and its README, and dry-run the script with the usage described in the README.
The script can be written in any language, for example Python, Bash or JavaScript.
1. Check the syntax of the script line by line. If the syntax is not correct, "analysis" must be "FAILED".
2. Work through at least 3 test cases.
3. The first test must use the input shown in the README, and its expected output must match the README.
4. For each test case, execute the code step by step with a concrete input and put that input in "inputValue".
Answer with a single JSON object of exactly this structure and no other text:
{{
    "scriptType": string,
    "scriptName": "{script_name}",
    "analysis": "SUCCESS" | "FAILED",
    "tests": [
        {{
            "inputValue": string,
            "testResult": string,
            "isSuccess": boolean
        }}
    ],
    "issues": string[]
}}

Script:
```
{script}
```

README:
```
{readme}
```
"#,
        script_name = metadata.script_name,
        script = metadata.script_content,
        readme = metadata.readme_content,
    )
}

/// Exec-form ENTRYPOINT: the configured command followed by the script path.
pub fn entrypoint_exec_form(config: &DockerConfig, script_name: &str) -> String {
    let mut parts = config.entrypoint.clone();
    parts.push(format!("{}/{}", config.exec_prefix, script_name));
    serde_json::to_string(&parts).unwrap_or_default()
}

/// `script_name` is the file name on disk, which the Dockerfile must `COPY`.
pub fn synthesis_request(
    analysis: &AnalysisResult,
    script_name: &str,
    config: &DockerConfig,
) -> String {
    format!(
        r#"Based on the script analysis, create a Dockerfile and a README using this configuration:

scriptType: {script_type}
scriptName: {script_name}

Project structure:
- output/
  - {script_name}
  - Dockerfile
  - README.md

The Dockerfile must:
1. Use the base image {base_image}
2. WORKDIR {exec_prefix}
3. COPY {script_name} {exec_prefix}/
4. Set permissions if needed
5. ENTRYPOINT {entrypoint}
6. Accept the script arguments from the command line of `docker run`

The README must:
1. Be written in Markdown
2. Explain how to build and run the Dockerfile, with an example run that passes an argument in double quotes (show several arguments only if the script accepts more than one)

Answer with a single JSON object and no other text:
{{
    "dockerfileContent": string,
    "readmeContent": string
}}"#,
        script_type = analysis.script_type,
        script_name = script_name,
        base_image = config.base_image,
        exec_prefix = config.exec_prefix,
        entrypoint = entrypoint_exec_form(config, script_name),
    )
}
