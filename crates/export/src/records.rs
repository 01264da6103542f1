use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::debug;
use solar_core::vector::Vector3;

use crate::ExportError;

/// Header of every per-body record file.
pub const HEADER: &str = "Date-time,px (m),py (m),pz (m),vx (m/s),vy (m/s),vz (m/s)";

/// One body's state at one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateRecord<'a> {
    pub body_id: &'a str,
    pub date: &'a str,
    pub position: Vector3,
    pub velocity: Vector3,
}

impl StateRecord<'_> {
    /// Serialize the record to CSV, matching [`HEADER`].
    pub fn write_to(&self, writer: &mut dyn Write) -> io::Result<()> {
        let [px, py, pz] = self.position;
        let [vx, vy, vz] = self.velocity;
        writeln!(writer, "{},{px},{py},{pz},{vx},{vy},{vz}", self.date)
    }
}

/// Collaborator receiving per-body state records.
pub trait RecordSink {
    fn write(&mut self, record: &StateRecord<'_>) -> Result<(), ExportError>;

    /// Discard everything recorded so far for `body_id`.
    fn reset(&mut self, body_id: &str) -> Result<(), ExportError>;

    fn flush(&mut self) -> Result<(), ExportError> {
        Ok(())
    }
}

/// Create a writer for the target path, handling stdout (`-`) by convention.
pub fn writer_for_path(path: &Path) -> io::Result<Box<dyn Write>> {
    if path == Path::new("-") {
        return Ok(Box::new(BufWriter::new(io::stdout())));
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = File::create(path)?;
    Ok(Box::new(BufWriter::new(file)))
}

/// Writes `{ID}.csv` per body under a directory. Files are truncated the first time a body is
/// seen and again on [`RecordSink::reset`].
pub struct CsvRecordSink {
    dir: PathBuf,
    writers: HashMap<String, Box<dyn Write>>,
}

impl CsvRecordSink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, ExportError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            writers: HashMap::new(),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, body_id: &str) -> PathBuf {
        self.dir.join(format!("{body_id}.csv"))
    }

    fn open(&self, body_id: &str) -> io::Result<Box<dyn Write>> {
        let mut writer = writer_for_path(&self.path_for(body_id))?;
        writeln!(writer, "{HEADER}")?;
        Ok(writer)
    }
}

impl RecordSink for CsvRecordSink {
    fn write(&mut self, record: &StateRecord<'_>) -> Result<(), ExportError> {
        if !self.writers.contains_key(record.body_id) {
            let writer = self.open(record.body_id)?;
            self.writers.insert(record.body_id.to_string(), writer);
        }
        if let Some(writer) = self.writers.get_mut(record.body_id) {
            record.write_to(writer.as_mut())?;
        }
        Ok(())
    }

    fn reset(&mut self, body_id: &str) -> Result<(), ExportError> {
        debug!("truncating records for `{body_id}`");
        // Drop (and flush) the old handle before truncating the file under it.
        self.writers.remove(body_id);
        let writer = self.open(body_id)?;
        self.writers.insert(body_id.to_string(), writer);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), ExportError> {
        for writer in self.writers.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl Drop for CsvRecordSink {
    fn drop(&mut self) {
        let _ = RecordSink::flush(self);
    }
}

/// Owned copy of a [`StateRecord`] without the body id.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordRow {
    pub date: String,
    pub position: Vector3,
    pub velocity: Vector3,
}

/// Keeps records in memory, keyed by body id.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: HashMap<String, Vec<RecordRow>>,
    resets: HashMap<String, usize>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self, body_id: &str) -> &[RecordRow] {
        self.records.get(body_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn reset_count(&self, body_id: &str) -> usize {
        self.resets.get(body_id).copied().unwrap_or(0)
    }

    pub fn body_ids(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }
}

impl RecordSink for MemorySink {
    fn write(&mut self, record: &StateRecord<'_>) -> Result<(), ExportError> {
        self.records
            .entry(record.body_id.to_string())
            .or_default()
            .push(RecordRow {
                date: record.date.to_string(),
                position: record.position,
                velocity: record.velocity,
            });
        Ok(())
    }

    fn reset(&mut self, body_id: &str) -> Result<(), ExportError> {
        self.records.remove(body_id);
        *self.resets.entry(body_id.to_string()).or_default() += 1;
        Ok(())
    }
}

/// Drops every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl RecordSink for DiscardSink {
    fn write(&mut self, _record: &StateRecord<'_>) -> Result<(), ExportError> {
        Ok(())
    }

    fn reset(&mut self, _body_id: &str) -> Result<(), ExportError> {
        Ok(())
    }
}
