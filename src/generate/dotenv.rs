//! Environment file merging and the resolved configuration context.
//!
//! The `.env` file is persistent external state: the generator appends keys
//! it derived that are not present yet and never reorders, deletes or
//! rewrites existing lines. Resolved values are threaded to later tasks
//! through [`ConfigContext`]; exporting to the OS environment is a
//! compatibility shim for spawned child processes.

use std::io;
use std::path::Path;
use std::process::Command;

/// Resolved `KEY=VALUE` configuration, in derivation order.
#[derive(Debug, Clone, Default)]
pub struct ConfigContext {
    values: Vec<(String, String)>,
}

impl ConfigContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace a resolved value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.values.iter_mut().find(|(k, _)| k == &key) {
            Some(entry) => entry.1 = value,
            None => self.values.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Export every resolved value into a child process environment.
    pub fn apply_to(&self, command: &mut Command) {
        for (key, value) in self.iter() {
            command.env(key, value);
        }
    }

    /// Compatibility shim: export into the process environment so tools that
    /// read `std::env` directly keep working. Values already set in the
    /// process environment are not clobbered unless `force` is given.
    pub fn export_to_process_env(&self, force: bool) {
        for (key, value) in self.iter() {
            if force || std::env::var_os(key).is_none() {
                std::env::set_var(key, value);
            }
        }
    }
}

/// One parsed line of an environment file.
fn parse_line(line: &str) -> Option<(&str, &str)> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (key, value) = trimmed.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }
    Some((key, value.trim()))
}

/// Read an environment file into the config context. Missing files are
/// treated as empty. Returns the keys found, in file order.
pub fn load(path: &Path, config: &mut ConfigContext) -> io::Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };

    let mut keys = Vec::new();
    for line in content.lines() {
        if let Some((key, value)) = parse_line(line) {
            config.set(key, value);
            keys.push(key.to_string());
        }
    }
    Ok(keys)
}

/// Append `KEY=DEFAULT` lines for every derived key missing from the file.
/// Existing lines win and are never touched. Returns the newly added keys in
/// derivation order.
pub fn merge(
    path: &Path,
    derived: &[(String, String)],
    config: &mut ConfigContext,
) -> io::Result<Vec<String>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => String::new(),
        Err(err) => return Err(err),
    };

    let existing: Vec<&str> = content.lines().filter_map(|l| parse_line(l).map(|(k, _)| k)).collect();

    for line in content.lines() {
        if let Some((key, value)) = parse_line(line) {
            config.set(key, value);
        }
    }

    let mut added = Vec::new();
    let mut appended = String::new();
    for (key, default) in derived {
        if existing.iter().any(|&k| k == key.as_str()) || added.iter().any(|k| k == key) {
            continue;
        }
        appended.push_str(&format!("{key}={default}\n"));
        config.set(key.clone(), default.clone());
        added.push(key.clone());
    }

    if !added.is_empty() {
        let mut updated = content;
        if !updated.is_empty() && !updated.ends_with('\n') {
            updated.push('\n');
        }
        updated.push_str(&appended);
        std::fs::write(path, updated)?;
    }

    Ok(added)
}
