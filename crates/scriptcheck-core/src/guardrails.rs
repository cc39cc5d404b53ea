//! Prompt-injection screening for text sent to the model
//!
//! The guard is an ordered list of [`InjectionCheck`]s run against every
//! message before it joins the conversation. It is a heuristic filter, not a
//! security boundary: false positives are accepted and some hostile inputs
//! will get through. New rules are added by pushing another check, without
//! touching the pipeline stages.

use regex::Regex;

use crate::errors::PipelineError;

// ============================================================================
// CHECK TRAIT AND BUILT-IN CHECKS
// ============================================================================

/// A single screening rule.
pub trait InjectionCheck: Send + Sync {
    /// Short identifier reported when the check fires.
    fn name(&self) -> &str;

    /// Returns a description of the offending content, or `None` if clean.
    fn inspect(&self, text: &str) -> Option<String>;
}

/// Fires when a regular expression matches anywhere in the text.
pub struct PatternCheck {
    name: String,
    pattern: Regex,
}

impl PatternCheck {
    pub fn new(name: &str, pattern: &str) -> Result<Self, PipelineError> {
        let pattern = Regex::new(pattern).map_err(|e| {
            PipelineError::Config(format!("Invalid injection pattern '{}': {}", name, e))
        })?;
        Ok(Self {
            name: name.to_string(),
            pattern,
        })
    }
}

impl InjectionCheck for PatternCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn inspect(&self, text: &str) -> Option<String> {
        self.pattern
            .find(text)
            .map(|m| format!("matched /{}/ at byte {}", self.pattern.as_str(), m.start()))
    }
}

/// Fires on an odd number of triple-backtick fences, which could close the
/// code block a script is embedded in.
pub struct FenceBalanceCheck;

impl InjectionCheck for FenceBalanceCheck {
    fn name(&self) -> &str {
        "code_fence_balance"
    }

    fn inspect(&self, text: &str) -> Option<String> {
        let fences = text.matches("```").count();
        (fences % 2 != 0).then(|| format!("{} unbalanced code fences", fences))
    }
}

/// Fires on any of a list of phrases, compared case-insensitively.
pub struct PhraseCheck {
    phrases: Vec<String>,
}

impl PhraseCheck {
    pub fn new(phrases: &[&str]) -> Self {
        Self {
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }
}

impl InjectionCheck for PhraseCheck {
    fn name(&self) -> &str {
        "instruction_override"
    }

    fn inspect(&self, text: &str) -> Option<String> {
        let lowercase = text.to_lowercase();
        self.phrases
            .iter()
            .find(|phrase| lowercase.contains(phrase.as_str()))
            .map(|phrase| format!("contains \"{}\"", phrase))
    }
}

// ============================================================================
// GUARD
// ============================================================================

const DEFAULT_PATTERNS: &[(&str, &str)] = &[
    ("template_expression", r"\{\{.*\}\}"),
    ("script_tag", r"(?i)<script.*>"),
    ("bracketed_system_directive", r"(?i)\[.*system.*\]"),
    ("prompt_manipulation", r"(?i)prompt.*return"),
    ("role_manipulation", r"(?i)role.*=.*system"),
    ("assistant_manipulation", r"(?i)assistant.*=.*system"),
];

const DEFAULT_PHRASES: &[&str] = &["system prompt", "ignore previous", "forget above"];

pub struct InjectionGuard {
    checks: Vec<Box<dyn InjectionCheck>>,
}

impl InjectionGuard {
    /// A guard with no checks; everything passes.
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// The default rule set: patterns, fence balance, then phrases.
    pub fn with_default_checks() -> Result<Self, PipelineError> {
        let mut guard = Self::empty();
        for (name, pattern) in DEFAULT_PATTERNS {
            guard = guard.with_check(PatternCheck::new(name, pattern)?);
        }
        Ok(guard
            .with_check(FenceBalanceCheck)
            .with_check(PhraseCheck::new(DEFAULT_PHRASES)))
    }

    pub fn with_check(mut self, check: impl InjectionCheck + 'static) -> Self {
        self.checks.push(Box::new(check));
        self
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name()).collect()
    }

    /// Fails on the first check that fires.
    pub fn screen(&self, text: &str) -> Result<(), PipelineError> {
        for check in &self.checks {
            if let Some(detail) = check.inspect(text) {
                log::warn!("Injection check '{}' fired: {}", check.name(), detail);
                return Err(PipelineError::InjectionDetected {
                    check: check.name().to_string(),
                    detail,
                });
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for InjectionGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InjectionGuard")
            .field("checks", &self.check_names())
            .finish()
    }
}
