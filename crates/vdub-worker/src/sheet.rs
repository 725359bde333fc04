//! The job spreadsheet: reading rows and writing status back.

use tracing::{debug, warn};

use vdub_google::{cell_range, SheetsClient, ValueRange};
use vdub_models::JobRow;

use crate::error::{WorkerError, WorkerResult};

/// First row number of an A1 range (`config!A1:M` -> 1, `config!B3:M` -> 3).
///
/// Ranges without a row number start at row 1.
pub fn range_start_row(range: &str) -> u32 {
    let cells = range.rsplit_once('!').map(|(_, cells)| cells).unwrap_or(range);
    let first = cells.split(':').next().unwrap_or_default();
    let digits: String = first
        .trim_start_matches(|c: char| c.is_ascii_alphabetic() || c == '$')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().ok().filter(|row| *row > 0).unwrap_or(1)
}

/// Map the values of a range onto job rows.
///
/// The first row is the header. Empty rows are skipped but still count
/// towards the sheet row number, so `index` always addresses the source row.
pub fn rows_from_values(values: &[Vec<String>], header_row: u32) -> WorkerResult<Vec<JobRow>> {
    let Some((headers, data)) = values.split_first() else {
        return Ok(Vec::new());
    };

    let mut rows = Vec::with_capacity(data.len());
    for (offset, cells) in data.iter().enumerate() {
        if cells.iter().all(|c| c.trim().is_empty()) {
            continue;
        }
        let index = header_row + 1 + offset as u32;
        rows.push(JobRow::from_sheet_values(headers, cells, index)?);
    }
    Ok(rows)
}

/// One cell to write back: column letter and value.
#[derive(Debug, Clone, PartialEq)]
pub struct CellUpdate<'a> {
    pub column: &'a str,
    pub value: &'a str,
}

/// Sheets access scoped to the job spreadsheet.
#[derive(Clone)]
pub struct JobSheet {
    sheets: SheetsClient,
    spreadsheet_id: String,
    sheet_name: String,
    range_name: String,
}

impl JobSheet {
    pub fn new(
        sheets: SheetsClient,
        spreadsheet_id: impl Into<String>,
        sheet_name: impl Into<String>,
        range_name: impl Into<String>,
    ) -> Self {
        Self {
            sheets,
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: sheet_name.into(),
            range_name: range_name.into(),
        }
    }

    /// Read every job row of the configured range.
    pub async fn read_rows(&self) -> WorkerResult<Vec<JobRow>> {
        let values = self
            .sheets
            .get_values(&self.spreadsheet_id, &self.range_name)
            .await?;
        if values.is_empty() {
            warn!(range = %self.range_name, "No values in job sheet");
        }
        rows_from_values(&values, range_start_row(&self.range_name))
    }

    /// Write the given cells of one sheet row in a single batch.
    pub async fn write_cells(&self, row: u32, cells: &[CellUpdate<'_>]) -> WorkerResult<()> {
        if row == 0 {
            return Err(WorkerError::invalid_job("row has no sheet index"));
        }
        let data = self.value_ranges(row, cells);
        let response = self
            .sheets
            .batch_update_values(&self.spreadsheet_id, &data)
            .await?;
        debug!(row = row, cells = response.total_updated_cells, "Wrote row back");
        Ok(())
    }

    fn value_ranges(&self, row: u32, cells: &[CellUpdate<'_>]) -> Vec<ValueRange> {
        cells
            .iter()
            .map(|cell| {
                ValueRange::single_cell(cell_range(&self.sheet_name, cell.column, row), cell.value)
            })
            .collect()
    }
}
