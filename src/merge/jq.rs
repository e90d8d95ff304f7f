//! `jq` merge backend
//!
//! The document is parsed and the `customizations.codespaces.repositories`
//! object located natively; only that object goes through the system `jq`
//! binary, with the batch passed as `--argjson`:
//!
//! ```text
//! jq --argjson batch '{...}' '. + $batch'
//! ```
//!
//! jq's object addition replaces values for matching keys, keeps the rest, and
//! appends new keys, which is the repository-level shallow override. jq may
//! rewrite number literals (`1.0` becomes `1` before jq 1.7), so entries jq
//! was not asked to replace are taken from the input unchanged and the rest of
//! the document never leaves the process.

use std::collections::HashSet;
use std::io::Write;
use std::process::{Command, Stdio};

use log::debug;
use serde_json::{Map, Value as JsonValue};

use super::json::{navigate_json_object, parse_document};
use super::{DocumentMerger, DocumentPath};
use crate::error::{Error, Result};
use crate::permissions::PermissionBatch;

const FILTER: &str = ". + $batch";

/// Merger backed by an external `jq` executable.
#[derive(Debug, Clone)]
pub struct JqMerger {
    program: String,
}

impl Default for JqMerger {
    fn default() -> Self {
        Self::new("jq")
    }
}

impl JqMerger {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Whether `<program> --version` runs successfully.
    pub fn is_available(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn command_error(&self, message: String) -> Error {
        Error::Merge {
            operation: format!("{} merge", self.program),
            message,
        }
    }

    fn run(&self, input: &str, batch_json: &str) -> Result<String> {
        let mut child = Command::new(&self.program)
            .args(["--argjson", "batch", batch_json, FILTER])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| Error::NoBackend {
                requested: format!("failed to run '{}': {}", self.program, e),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(input.as_bytes())
                .map_err(|e| self.command_error(format!("failed to write input: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .map_err(|e| self.command_error(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(self.command_error(stderr.trim().to_string()));
        }

        String::from_utf8(output.stdout)
            .map_err(|_| self.command_error("output is not valid UTF-8".to_string()))
    }

    /// Run the filter over one repositories object.
    fn merge_repositories(
        &self,
        current: &Map<String, JsonValue>,
        batch: &Map<String, JsonValue>,
    ) -> Result<Map<String, JsonValue>> {
        let input = serde_json::to_string(current)?;
        let batch_json = serde_json::to_string(batch)?;
        debug!("running {} with filter {}", self.program, FILTER);

        let stdout = self.run(&input, &batch_json)?;
        match serde_json::from_str(&stdout) {
            Ok(JsonValue::Object(merged)) => Ok(merged),
            Ok(_) => Err(self.command_error("jq did not return an object".to_string())),
            Err(err) => Err(self.command_error(format!("Failed to parse jq output: {}", err))),
        }
    }
}

impl DocumentMerger for JqMerger {
    fn name(&self) -> &'static str {
        "jq"
    }

    fn merge(&self, existing: Option<&str>, batch: &PermissionBatch) -> Result<JsonValue> {
        let mut document = parse_document(existing)?;
        let repositories = navigate_json_object(&mut document, &DocumentPath::repositories())?;
        let batch_map = batch.to_json_map();
        let merged = self.merge_repositories(repositories, &batch_map)?;

        let replaced: HashSet<&str> = batch_map.keys().map(String::as_str).collect();
        let mut spliced = Map::with_capacity(merged.len());
        for (key, value) in merged {
            let value = match repositories.get(&key) {
                Some(original) if !replaced.contains(key.as_str()) => original.clone(),
                _ => value,
            };
            spliced.insert(key, value);
        }
        *repositories = spliced;
        Ok(document)
    }
}
