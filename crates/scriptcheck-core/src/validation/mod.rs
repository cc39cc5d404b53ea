//! Checks applied on both sides of a model call
//!
//! `input` bounds what goes into a prompt; `schema` enforces the shape of
//! what comes back.

pub mod input;
pub mod schema;

pub use input::{
    validate_docker_config, validate_readme_content, validate_script_input, MAX_README_SIZE,
    MAX_SCRIPT_SIZE,
};
pub use schema::{extract_json_payload, ResponseSchema, StructuredResponseValidator};
