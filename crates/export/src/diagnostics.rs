use std::io::Write;
use std::path::Path;

use serde::Serialize;
use serde_json::to_writer_pretty;

use crate::ExportError;
use crate::records::writer_for_path;

/// Write `value` as pretty JSON to `path` (`-` for stdout), creating parent directories.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), ExportError> {
    let mut writer = writer_for_path(path)?;
    to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
