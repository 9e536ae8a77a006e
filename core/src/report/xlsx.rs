use std::path::Path;

use edgemap_common::records::{PortIdentityRecord, SwitchReport};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};

use super::{ReportError, SHEET_HEADER};

const MAX_SHEET_NAME: usize = 31;
const EMPTY_SHEET: &str = "audit";

/// One sheet per audited switch, named after its address.
pub fn save_xlsx(report: &SwitchReport, path: &Path) -> Result<(), ReportError> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    if report.entries.is_empty() {
        write_sheet(workbook.add_worksheet().set_name(EMPTY_SHEET)?, &[], &bold)?;
    }

    for (switch, records) in &report.entries {
        let sheet = workbook.add_worksheet().set_name(sheet_name(switch))?;
        write_sheet(sheet, records, &bold)?;
    }

    workbook.save(path)?;
    Ok(())
}

fn write_sheet(sheet: &mut Worksheet, records: &[PortIdentityRecord], bold: &Format) -> Result<(), XlsxError> {
    for (col, title) in SHEET_HEADER.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *title, bold)?;
    }

    for (idx, record) in records.iter().enumerate() {
        let row = idx as u32 + 1;
        sheet.write_string(row, 0, &record.port)?;
        sheet.write_string(row, 1, record.mac.to_string())?;
        sheet.write_string(row, 2, record.ip.to_string())?;
        sheet.write_string(row, 3, record.name.as_str())?;
    }

    Ok(())
}

/// Sheet names may not contain `[]:*?/\` and are limited to 31 characters.
fn sheet_name(switch: &str) -> String {
    switch
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .take(MAX_SHEET_NAME)
        .collect()
}
