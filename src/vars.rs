// src/vars.rs

//! Variable store and `{{var.NAME}}` template rendering.
//!
//! Variables are collected once, before the graph is built, from (lowest
//! precedence first):
//! 1. the `[vars]` table of the pipeline file
//! 2. `FORECAST_DAG_VAR_<NAME>` environment variables
//! 3. `--var NAME=VALUE` flags
//!
//! A leading `~/` is then expanded against `HOME`. After that the store is
//! only ever read.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::errors::{PipelineError, Result};

/// Prefix for variables supplied through the environment.
pub const ENV_PREFIX: &str = "FORECAST_DAG_VAR_";

/// Read-only key/value configuration substituted into task definitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableStore {
    values: BTreeMap<String, String>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a variable. Later sources call this after earlier
    /// ones so that they take precedence.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Merge every `FORECAST_DAG_VAR_<NAME>` pair from the given environment.
    ///
    /// Names are lowercased, so `FORECAST_DAG_VAR_PATH_WORKFLOW` becomes
    /// `path_workflow`.
    pub fn merge_env<I>(&mut self, env: I)
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in env {
            if let Some(name) = key.strip_prefix(ENV_PREFIX) {
                if !name.is_empty() {
                    self.insert(name.to_lowercase(), value);
                }
            }
        }
    }

    /// Merge `NAME=VALUE` assignments (as given on the command line).
    pub fn merge_assignments<'a, I>(&mut self, assignments: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a str>,
    {
        for raw in assignments {
            let (key, value) = raw.split_once('=').ok_or_else(|| {
                PipelineError::ConfigError(format!(
                    "invalid variable assignment '{raw}' (expected NAME=VALUE)"
                ))
            })?;
            let key = key.trim();
            if key.is_empty() {
                return Err(PipelineError::ConfigError(format!(
                    "invalid variable assignment '{raw}' (empty name)"
                )));
            }
            self.insert(key, value);
        }
        Ok(())
    }

    /// Replace a leading `~` (alone or followed by `/`) in every value with
    /// `home`. Values reach callables as plain paths, where no shell expands it.
    pub fn expand_home(&mut self, home: &str) {
        let home = home.trim_end_matches('/');
        for value in self.values.values_mut() {
            let expanded = if value.as_str() == "~" {
                home.to_string()
            } else if let Some(rest) = value.strip_prefix("~/") {
                format!("{home}/{rest}")
            } else {
                continue;
            };
            *value = expanded;
        }
    }

    /// Fail with [`PipelineError::MissingVariable`] unless every name is set.
    pub fn require<'a, I>(&self, names: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a String>,
    {
        for name in names {
            if !self.values.contains_key(name) {
                return Err(PipelineError::MissingVariable(name.clone()));
            }
        }
        Ok(())
    }

    /// Substitute every placeholder in `template`.
    ///
    /// Both `{{var.NAME}}` and `{{var.value.NAME}}` are accepted. On the first
    /// unknown name, returns that name as the error.
    pub fn render(&self, template: &str) -> std::result::Result<String, String> {
        let mut missing: Option<String> = None;

        let rendered = placeholder_regex().replace_all(template, |caps: &Captures<'_>| {
            let name = &caps[1];
            match self.values.get(name) {
                Some(value) => value.clone(),
                None => {
                    if missing.is_none() {
                        missing = Some(name.to_string());
                    }
                    String::new()
                }
            }
        });

        match missing {
            Some(name) => Err(name),
            None => Ok(rendered.into_owned()),
        }
    }
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*var\.(?:value\.)?([A-Za-z_][A-Za-z0-9_]*)\s*\}\}")
            .expect("placeholder regex is valid")
    })
}
