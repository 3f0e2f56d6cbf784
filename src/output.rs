//! Resolution report serialization for wrapper scripts.

use crate::resolver::Resolution;
use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use tempfile::NamedTempFile;

/// Serializable snapshot of a [`Resolution`].
///
/// Maps are re-keyed into sorted containers so the emitted JSON is
/// byte-for-byte deterministic for a given resolution.
#[derive(Debug, Serialize)]
pub struct Report {
    pub command_path: String,
    pub bindings: BTreeMap<String, Vec<String>>,
    pub positionals: Vec<ReportPositional>,
    pub executed: Vec<String>,
    pub errors: Vec<String>,
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct ReportPositional {
    pub token_pos: usize,
    pub slot: usize,
    pub value: String,
    pub bound: Option<String>,
}

impl Report {
    pub fn from_resolution(resolution: &Resolution) -> Self {
        let bindings = resolution
            .bindings
            .iter()
            .map(|(name, values)| (name.clone(), values.clone()))
            .collect();

        let positionals = resolution
            .positionals
            .iter()
            .map(|p| ReportPositional {
                token_pos: p.token_pos,
                slot: p.slot,
                value: p.value.clone(),
                bound: p.bound.map(|a| a.name.clone()),
            })
            .collect();

        let mut executed: Vec<String> = resolution.executed.iter().cloned().collect();
        executed.sort();

        let errors: Vec<String> = resolution.errors.iter().map(|e| e.to_string()).collect();
        let ok = errors.is_empty();

        Report {
            command_path: resolution.command_path.clone(),
            bindings,
            positionals,
            executed,
            errors,
            ok,
        }
    }
}

/// Render a resolution as pretty-printed JSON.
pub fn report_string(resolution: &Resolution) -> Result<String> {
    let report = Report::from_resolution(resolution);
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Write the JSON report to a temporary file and return its path.
///
/// The file persists until the process exits or it's manually deleted,
/// so wrapper scripts can read it after this process returns.
pub fn write_report(resolution: &Resolution) -> Result<PathBuf> {
    let mut file = NamedTempFile::new()?;
    let body = report_string(resolution)?;
    file.write_all(body.as_bytes())?;
    writeln!(file)?;

    let path = file.into_temp_path().keep()?;
    Ok(path)
}
