//! Language name to container recipe table

use std::collections::{BTreeMap, HashMap};

use crate::config::types::DockerConfig;
use crate::errors::PipelineError;

#[derive(Debug, Clone)]
pub struct LanguageRegistry {
    entries: BTreeMap<String, DockerConfig>,
}

impl LanguageRegistry {
    /// The languages supported out of the box.
    pub fn builtin() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert("bash".to_string(), DockerConfig::new("debian:stable-slim", &["/bin/bash"], "/app"));
        entries.insert("python".to_string(), DockerConfig::new("python:3-slim", &["python"], "/app"));
        entries.insert("node.js".to_string(), DockerConfig::new("node:slim", &["node"], "/app"));
        entries.insert("javascript".to_string(), DockerConfig::new("node:slim", &["node"], "/app"));
        entries.insert("go".to_string(), DockerConfig::new("golang:alpine", &["./"], "/app"));
        entries.insert("ruby".to_string(), DockerConfig::new("ruby:slim", &["ruby"], "/app"));
        entries.insert("php".to_string(), DockerConfig::new("php:cli", &["php"], "/app"));
        Self { entries }
    }

    /// Built-in table with user-supplied entries layered on top.
    pub fn with_overrides(overrides: &HashMap<String, DockerConfig>) -> Self {
        let mut registry = Self::builtin();
        for (language, config) in overrides {
            registry
                .entries
                .insert(language.to_lowercase(), config.clone());
        }
        registry
    }

    pub fn lookup(&self, script_type: &str) -> Result<&DockerConfig, PipelineError> {
        self.entries
            .get(&script_type.to_lowercase())
            .ok_or_else(|| PipelineError::UnsupportedScriptType {
                script_type: script_type.to_string(),
                supported: self.supported().join(", "),
            })
    }

    pub fn supported(&self) -> Vec<&str> {
        self.entries.keys().map(|k| k.as_str()).collect()
    }
}

impl Default for LanguageRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
