//! CSV import driver.
//!
//! Streams CSV parse events into the import factory. The first sheet is
//! named `data`; when the input has more rows than a sheet holds and
//! splitting is enabled, continuation sheets `data_1`, `data_2`, ... are
//! appended and the configured number of header rows is replicated onto
//! each of them. With splitting disabled the import stops quietly at the
//! first full sheet.

use std::path::Path;

use gridstream_core::error::Result;
use gridstream_core::import::ImportFactory;
use gridstream_core::types::{ColT, RowT, SheetT};
use gridstream_parse::csv::{CsvConfig, CsvHandler, CsvParser};

use crate::filter::{CsvImportConfig, FilterConfig, ImportFilter};

const BASE_SHEET_NAME: &str = "data";

/// The CSV import filter.
pub struct CsvImportFilter<'a> {
    factory: ImportFactory<'a>,
    config: FilterConfig,
}

impl<'a> CsvImportFilter<'a> {
    pub fn new(factory: ImportFactory<'a>, config: FilterConfig) -> Self {
        Self { factory, config }
    }

    fn parse(&mut self, content: &[u8]) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let mut handler = CsvContentHandler::new(&mut self.factory, &self.config.csv);
        let parser = CsvParser::new(content, &mut handler, CsvConfig::default());
        parser.parse()?;
        handler.finish()?;
        Ok(())
    }
}

impl ImportFilter for CsvImportFilter<'_> {
    fn read_file(&mut self, path: &Path) -> Result<()> {
        let content = std::fs::read(path)?;
        self.parse(&content)?;
        self.factory.finalize()
    }

    fn read_stream(&mut self, stream: &[u8]) -> Result<()> {
        self.parse(stream)?;
        self.factory.finalize()
    }

    fn name(&self) -> &'static str {
        "csv"
    }
}

/// One replicated header cell.
struct HeaderCell {
    row: RowT,
    col: ColT,
    value: String,
}

/// CSV event handler writing cells through the factory.
struct CsvContentHandler<'f, 'a> {
    factory: &'f mut ImportFactory<'a>,
    config: &'f CsvImportConfig,
    header_cells: Vec<HeaderCell>,
    sheet: SheetT,
    row: RowT,
    col: ColT,
    max_rows: RowT,
    /// Set when the sheet filled up and splitting is disabled; remaining
    /// input is discarded.
    full: bool,
    /// Deferred error from inside a callback.
    error: Option<gridstream_core::error::Error>,
}

impl<'f, 'a> CsvContentHandler<'f, 'a> {
    fn new(factory: &'f mut ImportFactory<'a>, config: &'f CsvImportConfig) -> Self {
        Self {
            factory,
            config,
            header_cells: Vec::new(),
            sheet: 0,
            row: 0,
            col: 0,
            max_rows: 0,
            full: false,
            error: None,
        }
    }

    fn sheet_name(&self) -> String {
        if self.sheet == 0 {
            // The first sheet carries no suffix.
            BASE_SHEET_NAME.to_string()
        } else {
            format!("{BASE_SHEET_NAME}_{}", self.sheet)
        }
    }

    fn append_current_sheet(&mut self) -> Result<()> {
        let name = self.sheet_name();
        let sheet = self.factory.append_sheet(self.sheet, &name)?;
        self.max_rows = sheet.sheet_size().rows;
        Ok(())
    }

    /// Surface an error deferred from a callback.
    fn finish(self) -> Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl CsvHandler for CsvContentHandler<'_, '_> {
    fn begin_parse(&mut self) {
        if let Err(e) = self.append_current_sheet() {
            self.error = Some(e);
        }
    }

    fn begin_row(&mut self) {
        if self.full || self.error.is_some() {
            return;
        }
        // A row beyond the sheet's capacity opens a continuation sheet, or
        // ends the import when splitting is disabled.
        if self.row >= self.max_rows {
            if !self.config.split_to_multiple_sheets {
                self.full = true;
                return;
            }
            self.sheet += 1;
            self.row = 0;
            if let Err(e) = self.append_current_sheet() {
                self.error = Some(e);
                return;
            }
            if !self.header_cells.is_empty() {
                let Some(mut sheet) = self.factory.get_sheet_by_index(self.sheet) else {
                    return;
                };
                for cell in &self.header_cells {
                    sheet.set_auto(cell.row, cell.col, &cell.value);
                }
                self.row += self.config.header_row_size as RowT;
            }
        }
    }

    fn end_row(&mut self) {
        if self.full || self.error.is_some() {
            return;
        }
        self.row += 1;
        self.col = 0;
    }

    fn cell(&mut self, value: &str, _transient: bool) {
        if self.full || self.error.is_some() {
            return;
        }
        if self.sheet == 0 && (self.row as usize) < self.config.header_row_size {
            self.header_cells.push(HeaderCell {
                row: self.row,
                col: self.col,
                value: value.to_string(),
            });
        }
        if let Some(mut sheet) = self.factory.get_sheet_by_index(self.sheet) {
            sheet.set_auto(self.row, self.col, value);
        }
        self.col += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gridstream_core::types::RangeSize;
    use gridstream_core::Document;
    use pretty_assertions::assert_eq;

    fn import(content: &str, size: RangeSize, config: FilterConfig) -> Document {
        let mut doc = Document::new(size);
        {
            let factory = ImportFactory::new(&mut doc);
            let mut filter = CsvImportFilter::new(factory, config);
            filter.read_stream(content.as_bytes()).unwrap();
        }
        doc
    }

    fn default_size() -> RangeSize {
        RangeSize {
            rows: 1_048_576,
            columns: 16_384,
        }
    }

    #[test]
    fn test_simple_import() {
        let doc = import("a,1\nb,2\n", default_size(), FilterConfig::default());
        assert_eq!(doc.sheet_count(), 1);
        assert_eq!(doc.sheet_name(0), Some("data"));
        let sheet = doc.sheet(0).unwrap();
        let id = sheet.get_string_identifier(0, 0).unwrap();
        assert_eq!(doc.shared_strings().get(id), Some("a"));
        assert_eq!(sheet.get_numeric_value(0, 1), Some(1.0));
        assert_eq!(sheet.get_numeric_value(1, 1), Some(2.0));
    }

    #[test]
    fn test_split_across_sheets_with_header() {
        // 25 rows, sheet capacity 11, 1 header row, splitting enabled: the
        // import lands on three sheets whose row 0 replicates the header.
        let mut content = String::from("h1,h2\n");
        for i in 1..25 {
            content.push_str(&format!("r{i},{i}\n"));
        }
        let config = FilterConfig {
            csv: CsvImportConfig {
                header_row_size: 1,
                split_to_multiple_sheets: true,
            },
            ..FilterConfig::default()
        };
        let size = RangeSize {
            rows: 11,
            columns: 4,
        };
        let doc = import(&content, size, config);

        assert_eq!(doc.sheet_count(), 3);
        assert_eq!(doc.sheet_name(0), Some("data"));
        assert_eq!(doc.sheet_name(1), Some("data_1"));
        assert_eq!(doc.sheet_name(2), Some("data_2"));

        // Sheets 1 and 2 begin with the header row.
        for idx in [1, 2] {
            let sheet = doc.sheet(idx).unwrap();
            let id = sheet.get_string_identifier(0, 0).unwrap();
            assert_eq!(doc.shared_strings().get(id), Some("h1"));
            let id = sheet.get_string_identifier(0, 1).unwrap();
            assert_eq!(doc.shared_strings().get(id), Some("h2"));
        }

        // Sheet 0 holds data rows 1..=10, sheet 1 rows 11..=20, sheet 2 the
        // remaining rows 21..=24.
        let s0 = doc.sheet(0).unwrap();
        assert_eq!(s0.get_numeric_value(10, 1), Some(10.0));
        let s1 = doc.sheet(1).unwrap();
        assert_eq!(s1.get_numeric_value(1, 1), Some(11.0));
        assert_eq!(s1.get_numeric_value(10, 1), Some(20.0));
        let s2 = doc.sheet(2).unwrap();
        assert_eq!(s2.get_numeric_value(1, 1), Some(21.0));
        assert_eq!(s2.get_data_range().unwrap().last.row, 4);
    }

    #[test]
    fn test_no_split_stops_at_capacity() {
        let mut content = String::new();
        for i in 0..20 {
            content.push_str(&format!("{i}\n"));
        }
        let size = RangeSize {
            rows: 5,
            columns: 4,
        };
        let doc = import(&content, size, FilterConfig::default());
        assert_eq!(doc.sheet_count(), 1);
        assert_eq!(doc.sheet(0).unwrap().get_data_range().unwrap().last.row, 4);
    }

    #[test]
    fn test_parse_error_propagates() {
        let mut doc = Document::new(default_size());
        let factory = ImportFactory::new(&mut doc);
        let mut filter = CsvImportFilter::new(factory, FilterConfig::default());
        let err = filter.read_stream(b"a,\"unterminated").unwrap_err();
        assert!(err.to_string().contains("stream ended prematurely"));
    }

    #[test]
    fn test_empty_stream_is_a_noop() {
        let doc = import("", default_size(), FilterConfig::default());
        assert_eq!(doc.sheet_count(), 0);
    }

    #[test]
    fn test_quoted_cells_reach_the_model() {
        let doc = import("a,\"b\"\"c\",d\n", default_size(), FilterConfig::default());
        let sheet = doc.sheet(0).unwrap();
        let id = sheet.get_string_identifier(0, 1).unwrap();
        assert_eq!(doc.shared_strings().get(id), Some("b\"c"));
    }
}
