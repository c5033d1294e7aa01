//! JSON output for the CLI
//!
//! One JSON document per command on stdout, UTF-8, newline terminated.
//! Logs go to stderr so stdout stays machine readable.

use std::io::{self, Write};

use serde::Serialize;

use super::errors::CliResult;

/// Write `value` as one JSON line to stdout
pub fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    write_json_to(&mut out, value)
}

/// Write `value` as one JSON line to `out`
pub fn write_json_to<W: Write, T: Serialize>(out: &mut W, value: &T) -> CliResult<()> {
    serde_json::to_writer(&mut *out, value)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}
