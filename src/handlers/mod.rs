//! Lambda entry points for the pipeline stages.
//!
//! Each handler parses its event, builds a [`DataLakeClient`] scoped to
//! the (team, dataset, pipeline, stage) it is working on, performs one or
//! two calls and returns or forwards the result. Failures are logged at
//! the boundary and re-raised; retries belong to the invoking service.
//!
//! [`DataLakeClient`]: crate::DataLakeClient

use crate::error::RuntimeError;
use serde_json::Value;
use std::collections::HashSet;

pub mod stage_a_error;
pub mod stage_a_process_object;
pub mod stage_a_redrive;
pub mod stage_a_routing;
pub mod stage_b_fetch_metadata;
pub mod stage_b_redrive;
pub mod stage_b_routing;

/// Required environment variable, surfaced as a typed error when unset.
pub(crate) fn env_var(name: &str) -> Result<String, RuntimeError> {
    std::env::var(name).map_err(|_| RuntimeError::MissingEnv(name.to_string()))
}

/// Required string field of a JSON payload.
pub(crate) fn field<'a>(payload: &'a Value, name: &str) -> Result<&'a str, RuntimeError> {
    payload
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::MissingField(name.to_string()))
}

/// Drop duplicate keys, keeping first-seen order.
pub(crate) fn dedupe(keys: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    keys.into_iter().filter(|key| seen.insert(key.clone())).collect()
}
