//! Pretty JSON output to a file or the given writer.

use std::io::Write;

use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::CliError;

/// Serialise `report` as pretty JSON with a trailing newline.
///
/// With `output` set the report replaces that file and `writer` is left
/// untouched.
pub(crate) fn write_report<R: Serialize>(
    output: Option<&Utf8Path>,
    writer: &mut dyn Write,
    report: &R,
) -> Result<(), CliError> {
    let mut payload = serde_json::to_string_pretty(report).map_err(CliError::SerialiseReport)?;
    payload.push('\n');
    match output {
        Some(path) => {
            homerank_fs::write_string(path, &payload).map_err(CliError::WriteReport)?;
            info!("wrote report to {path}");
            Ok(())
        }
        None => writer
            .write_all(payload.as_bytes())
            .map_err(CliError::WriteReport),
    }
}
