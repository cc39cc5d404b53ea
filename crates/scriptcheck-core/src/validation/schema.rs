//! Structured-output contract for model responses
//!
//! A model reply is turned into a typed value in three steps: pull the JSON
//! payload out of the text, parse it, then validate it against a fixed JSON
//! Schema before deserializing. Nothing is repaired along the way; any
//! deviation is fatal.

use jsonschema::{JSONSchema, ValidationError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::fmt;

use crate::errors::PipelineError;

static FENCED_JSON: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)```json\n(.*?)\n```").unwrap());

/// The two response shapes the pipeline accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSchema {
    Analysis,
    DockerAndReadme,
}

impl ResponseSchema {
    pub fn definition(&self) -> Value {
        match self {
            ResponseSchema::Analysis => json!({
                "type": "object",
                "properties": {
                    "scriptType": { "type": "string" },
                    "scriptName": { "type": "string" },
                    "analysis": { "type": "string", "enum": ["SUCCESS", "FAILED"] },
                    "tests": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "inputValue": { "type": "string" },
                                "testResult": { "type": "string" },
                                "isSuccess": { "type": "boolean" }
                            },
                            "required": ["inputValue", "testResult", "isSuccess"],
                            "additionalProperties": false
                        }
                    },
                    "issues": {
                        "type": "array",
                        "items": { "type": "string" }
                    }
                },
                "required": ["scriptType", "scriptName", "analysis", "tests", "issues"],
                "additionalProperties": false
            }),
            ResponseSchema::DockerAndReadme => json!({
                "type": "object",
                "properties": {
                    "dockerfileContent": { "type": "string" },
                    "readmeContent": { "type": "string" }
                },
                "required": ["dockerfileContent", "readmeContent"],
                "additionalProperties": false
            }),
        }
    }
}

impl fmt::Display for ResponseSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseSchema::Analysis => write!(f, "analysis"),
            ResponseSchema::DockerAndReadme => write!(f, "docker+readme"),
        }
    }
}

/// Returns the body of the first ```` ```json ```` block, or the whole text.
pub fn extract_json_payload(response: &str) -> &str {
    FENCED_JSON
        .captures(response)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .unwrap_or(response)
}

pub struct StructuredResponseValidator {
    analysis: JSONSchema,
    docker_and_readme: JSONSchema,
}

impl StructuredResponseValidator {
    pub fn new() -> Result<Self, PipelineError> {
        Ok(Self {
            analysis: Self::compile(ResponseSchema::Analysis)?,
            docker_and_readme: Self::compile(ResponseSchema::DockerAndReadme)?,
        })
    }

    fn compile(schema: ResponseSchema) -> Result<JSONSchema, PipelineError> {
        JSONSchema::compile(&schema.definition()).map_err(|e| {
            PipelineError::Config(format!("Invalid {} response schema: {}", schema, e))
        })
    }

    fn compiled(&self, schema: ResponseSchema) -> &JSONSchema {
        match schema {
            ResponseSchema::Analysis => &self.analysis,
            ResponseSchema::DockerAndReadme => &self.docker_and_readme,
        }
    }

    /// Validate an already parsed value.
    pub fn validate(&self, data: &Value, schema: ResponseSchema) -> Result<(), PipelineError> {
        if let Err(errors) = self.compiled(schema).validate(data) {
            let violations = format_validation_errors(errors);
            log::error!("{} response failed schema validation: {}", schema, violations.join("; "));
            log::debug!(
                "Rejected payload: {}",
                serde_json::to_string_pretty(data).unwrap_or_default()
            );
            return Err(PipelineError::SchemaViolation {
                schema: schema.to_string(),
                violations: violations.join("; "),
            });
        }
        Ok(())
    }

    /// Extract, parse, validate and deserialize a raw model reply.
    pub fn parse<T: DeserializeOwned>(
        &self,
        response: &str,
        schema: ResponseSchema,
    ) -> Result<T, PipelineError> {
        let payload = extract_json_payload(response);

        let value: Value = serde_json::from_str(payload).map_err(|e| {
            log::debug!("Unparseable model response: {}", response);
            PipelineError::InvalidResponseFormat(format!(
                "Invalid JSON in {} response: {}",
                schema, e
            ))
        })?;

        self.validate(&value, schema)?;

        serde_json::from_value(value).map_err(|e| PipelineError::SchemaViolation {
            schema: schema.to_string(),
            violations: e.to_string(),
        })
    }
}

/// Format validation errors into human-readable messages
fn format_validation_errors<'a>(errors: impl Iterator<Item = ValidationError<'a>>) -> Vec<String> {
    errors
        .map(|error| {
            let path = if error.instance_path.to_string().is_empty() {
                "root".to_string()
            } else {
                error.instance_path.to_string()
            };
            format!("At '{}': {}", path, error)
        })
        .collect()
}
