// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;
use crate::vars::VariableStore;

/// Load a pipeline file from a given path and return the raw `RawConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(contents: &str) -> Result<RawConfigFile> {
    let config: RawConfigFile = toml::from_str(contents)?;
    Ok(config)
}

/// Load a pipeline file from path and run file-level validation.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw_config = load_from_path(&path)?;
    let config = ConfigFile::try_from(raw_config)?;
    Ok(config)
}

/// Assemble the variable store for `cfg`.
///
/// Precedence, lowest first: `[vars]`, `FORECAST_DAG_VAR_*` entries of `env`,
/// then `assignments` (`NAME=VALUE`). A leading `~/` in any value is expanded
/// with `HOME` (or `USERPROFILE`) from `env`. Fails if any `required_vars`
/// entry is still missing afterwards.
pub fn resolve_variables<'a, E, A>(cfg: &ConfigFile, env: E, assignments: A) -> Result<VariableStore>
where
    E: IntoIterator<Item = (String, String)>,
    A: IntoIterator<Item = &'a str>,
{
    let mut store = VariableStore::new();
    for (key, value) in cfg.vars.iter() {
        store.insert(key.clone(), value.clone());
    }
    let env: Vec<(String, String)> = env.into_iter().collect();
    let home = ["HOME", "USERPROFILE"].into_iter().find_map(|name| {
        env.iter()
            .find(|(key, value)| key == name && !value.is_empty())
            .map(|(_, value)| value.clone())
    });

    store.merge_env(env);
    store.merge_assignments(assignments)?;
    if let Some(home) = home {
        store.expand_home(&home);
    }
    store.require(cfg.pipeline.required_vars.iter())?;
    Ok(store)
}
