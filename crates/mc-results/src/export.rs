//! CSV export of stored time series.

use std::io::{self, Write};

use crate::types::{RunManifest, TimeseriesRecord};

/// Write `time,<columns…>` followed by one line per record.
pub fn write_csv<W: Write>(
    columns: &[String],
    records: &[TimeseriesRecord],
    out: &mut W,
) -> io::Result<()> {
    write!(out, "time")?;
    for name in columns {
        write!(out, ",{}", escape(name))?;
    }
    writeln!(out)?;
    for record in records {
        write!(out, "{}", record.time_s)?;
        for v in &record.values {
            write!(out, ",{v}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

/// The whole run as a CSV string.
pub fn export_csv(manifest: &RunManifest, records: &[TimeseriesRecord]) -> String {
    let mut buf = Vec::new();
    // Writing into a Vec cannot fail.
    let _ = write_csv(&manifest.columns, records, &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
