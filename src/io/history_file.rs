//! Persisted hill history: a whitespace-delimited table
//!
//! ```text
//! t cv_0(t) h(t)
//! 1 0.25 1
//! 11 0.31 0.93
//! ```
//!
//! Columns are matched by header name. Timesteps written in float notation
//! (`1.000000000000000000e+00`) are accepted as long as they are integral.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::{MetadError, Result};
use crate::metad::HistoryStore;

pub const TIMESTEP_COLUMN: &str = "t";
pub const CV_COLUMN: &str = "cv_0(t)";
pub const HEIGHT_COLUMN: &str = "h(t)";

pub fn read_history<P: AsRef<Path>>(path: P) -> Result<HistoryStore> {
    let file = File::open(path)?;
    parse_history(BufReader::new(file))
}

pub fn write_history<P: AsRef<Path>>(path: P, history: &HistoryStore) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    write_history_to(&mut writer, history)?;
    writer.flush()?;
    Ok(())
}

/// Write the table. `{}` on f64 is the shortest representation that parses
/// back to the same value, so a reload is bit-exact.
pub fn write_history_to<W: Write>(writer: &mut W, history: &HistoryStore) -> Result<()> {
    writeln!(writer, "{} {} {}", TIMESTEP_COLUMN, CV_COLUMN, HEIGHT_COLUMN)?;
    for hill in history.iter() {
        writeln!(writer, "{} {} {}", hill.timestep, hill.cv_value, hill.height)?;
    }
    Ok(())
}

pub fn parse_history<R: BufRead>(reader: R) -> Result<HistoryStore> {
    let mut lines = reader.lines().enumerate().filter_map(|(i, line)| match line {
        Ok(l) if l.trim().is_empty() => None,
        other => Some((i + 1, other)),
    });

    let (_, header) = lines
        .next()
        .ok_or_else(|| MetadError::malformed("history file has no header"))?;
    let header = header?;
    let names: Vec<&str> = header.split_whitespace().collect();
    let column = |name: &str| {
        names
            .iter()
            .position(|n| *n == name)
            .ok_or_else(|| MetadError::malformed(format!("history header lacks column '{}'", name)))
    };
    let (t_col, cv_col, h_col) = (column(TIMESTEP_COLUMN)?, column(CV_COLUMN)?, column(HEIGHT_COLUMN)?);

    let mut timesteps = Vec::new();
    let mut cv_values = Vec::new();
    let mut heights = Vec::new();

    for (lineno, line) in lines {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != names.len() {
            return Err(MetadError::malformed(format!(
                "line {}: expected {} fields, found {}",
                lineno,
                names.len(),
                fields.len()
            )));
        }
        timesteps.push(parse_timestep(fields[t_col], lineno)?);
        cv_values.push(parse_float(fields[cv_col], lineno)?);
        heights.push(parse_float(fields[h_col], lineno)?);
    }

    HistoryStore::from_columns(timesteps, cv_values, heights)
}

fn parse_float(field: &str, lineno: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .map_err(|e| MetadError::malformed(format!("line {}: bad number '{}': {}", lineno, field, e)))
}

fn parse_timestep(field: &str, lineno: usize) -> Result<u64> {
    if let Ok(t) = field.parse::<u64>() {
        return Ok(t);
    }
    let t = parse_float(field, lineno)?;
    if t < 0.0 || t.fract() != 0.0 || t > u64::MAX as f64 {
        return Err(MetadError::malformed(format!(
            "line {}: timestep '{}' is not a non-negative integer",
            lineno, field
        )));
    }
    Ok(t as u64)
}
