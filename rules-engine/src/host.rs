//! Single-call JSON entry point for embedding the engine behind an opaque
//! string boundary (a wasm module, a subprocess, an FFI shim).

use std::any::Any;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use crate::accounts::{Company, User};
use crate::api::errors::RulesEngineError;
use crate::flags::{check_flag, CheckFlagOptions, CheckFlagResult, Flag};
use crate::utils::serialization::null_is_default;

#[derive(Debug, Default, Deserialize)]
pub struct HostInput {
    #[serde(default)]
    pub company: Option<Company>,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub flag: Option<Flag>,
    #[serde(default)]
    pub usage: Option<i64>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub event_usage: HashMap<String, i64>,
}

impl HostInput {
    pub fn options(&self) -> CheckFlagOptions {
        CheckFlagOptions {
            usage: self.usage,
            event_usage: self.event_usage.clone(),
        }
    }
}

#[derive(Debug, Default, Serialize)]
pub struct HostOutput {
    pub result: Option<CheckFlagResult>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl HostOutput {
    pub fn from_error(error: &RulesEngineError) -> Self {
        Self {
            result: None,
            error: error.to_string(),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|err| {
            tracing::error!("failed to serialize output: {}", err);
            serde_json::json!({ "result": null, "error": err.to_string() }).to_string()
        })
    }
}

/// Parses a [`HostInput`] document, checks the flag and returns a
/// [`HostOutput`] document. Never panics: faults come back in `error`.
pub fn check_flag_json(input: &str) -> String {
    let output = catch_unwind(AssertUnwindSafe(|| run(input))).unwrap_or_else(|panic| {
        let message = panic_message(panic.as_ref());
        tracing::error!("recovered from panic while checking flag: {}", message);
        HostOutput::from_error(&RulesEngineError::Unexpected(message))
    });

    output.to_json()
}

fn run(input: &str) -> HostOutput {
    let input: HostInput = match serde_json::from_str(input) {
        Ok(input) => input,
        Err(err) => {
            let err = RulesEngineError::from(err);
            tracing::warn!(error_code = err.error_code(), "invalid input: {}", err);
            return HostOutput::from_error(&err);
        }
    };

    let options = input.options();
    match check_flag(
        input.company.as_ref(),
        input.user.as_ref(),
        input.flag.as_ref(),
        &options,
    ) {
        Ok(result) => HostOutput {
            result: Some(result),
            error: String::new(),
        },
        Err(err) => {
            let (result, source) = err.into_parts();
            HostOutput {
                result: Some(result),
                error: source.to_string(),
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
