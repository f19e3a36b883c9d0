//! Tabular observable log: one header line of names, one row per sample.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MetadError, Result};
use crate::metad::on_cadence;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum WriteMode {
    /// Start a new file
    Truncate,
    /// Continue an existing file; the header is only written if it is empty
    Append,
}

pub struct LogWriter {
    writer: BufWriter<File>,
    columns: usize,
    stride: u64,
}

impl LogWriter {
    pub fn open<P: AsRef<Path>>(path: P, mode: WriteMode, names: &[&str], stride: u64) -> Result<Self> {
        if stride == 0 {
            return Err(MetadError::config("log stride must be positive"));
        }
        let file = match mode {
            WriteMode::Truncate => File::create(path)?,
            WriteMode::Append => OpenOptions::new().create(true).append(true).open(path)?,
        };
        let needs_header = file.metadata()?.len() == 0;
        let mut writer = BufWriter::new(file);
        if needs_header {
            writeln!(writer, "{}", names.join(" "))?;
        }
        Ok(Self {
            writer,
            columns: names.len(),
            stride,
        })
    }

    /// Samples follow the trial cadence phase, i.e. right after a tick.
    pub fn is_due(&self, timestep: u64) -> bool {
        on_cadence(timestep, self.stride)
    }

    pub fn write_row(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.columns {
            return Err(MetadError::invariant(format!(
                "log row has {} values for {} columns",
                values.len(),
                self.columns
            )));
        }
        let row: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        writeln!(self.writer, "{}", row.join(" "))?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_keeps_single_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");

        let mut w = LogWriter::open(&path, WriteMode::Truncate, &["t", "x"], 1).unwrap();
        w.write_row(&[1.0, 0.5]).unwrap();
        w.flush().unwrap();
        drop(w);

        let mut w = LogWriter::open(&path, WriteMode::Append, &["t", "x"], 1).unwrap();
        w.write_row(&[2.0, 0.25]).unwrap();
        w.flush().unwrap();
        drop(w);

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text, "t x\n1 0.5\n2 0.25\n");
    }

    #[test]
    fn test_truncate_discards_old_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.txt");
        std::fs::write(&path, "old\n").unwrap();

        let mut w = LogWriter::open(&path, WriteMode::Truncate, &["t"], 1).unwrap();
        w.write_row(&[7.0]).unwrap();
        w.flush().unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "t\n7\n");
    }

    #[test]
    fn test_row_width_checked() {
        let dir = tempfile::tempdir().unwrap();
        let mut w = LogWriter::open(dir.path().join("log.txt"), WriteMode::Truncate, &["a", "b"], 1).unwrap();
        assert!(matches!(w.write_row(&[1.0]), Err(MetadError::InvariantViolation(_))));
    }

    #[test]
    fn test_due_on_stride_phase() {
        let dir = tempfile::tempdir().unwrap();
        let w = LogWriter::open(dir.path().join("log.txt"), WriteMode::Truncate, &["t"], 10).unwrap();
        assert!(w.is_due(1));
        assert!(w.is_due(21));
        assert!(!w.is_due(20));
    }
}
