use std::fs::File;
use std::io::Write;
use std::path::Path;

use csv::Writer;
use edgemap_common::records::SwitchReport;

use super::{ReportError, CSV_HEADER};

/// One row per identity record, prefixed with its switch. Failed switches have no rows.
pub fn write_csv<W: Write>(report: &SwitchReport, out: W) -> Result<(), ReportError> {
    let mut writer = Writer::from_writer(out);
    writer.write_record(CSV_HEADER)?;

    for (switch, records) in &report.entries {
        for record in records {
            writer.write_record([
                switch.as_str(),
                &record.port,
                &record.mac.to_string(),
                &record.ip.to_string(),
                record.name.as_str(),
            ])?;
        }
    }

    writer.flush().map_err(::csv::Error::from)?;
    Ok(())
}

pub fn save_csv(report: &SwitchReport, path: &Path) -> Result<(), ReportError> {
    let file = File::create(path).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    write_csv(report, file)
}
