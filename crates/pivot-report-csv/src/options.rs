//! CSV options

/// Options for reading CSV input tables
#[derive(Debug, Clone)]
pub struct CsvReadOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Whether first row is header; otherwise columns are `Column1..N`
    pub has_header: bool,
    /// Detect integers and floats; otherwise every non-empty field is text
    pub auto_detect_types: bool,
    /// Columns whose fields are parsed as dates when possible
    pub date_columns: Vec<String>,
    /// Columns kept as text even when they look numeric (e.g. zero-padded IDs)
    pub text_columns: Vec<String>,
}

impl Default for CsvReadOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            has_header: true,
            auto_detect_types: true,
            date_columns: Vec::new(),
            text_columns: Vec::new(),
        }
    }
}

impl CsvReadOptions {
    /// Parse dates in `column`
    pub fn with_date_column<S: Into<String>>(mut self, column: S) -> Self {
        self.date_columns.push(column.into());
        self
    }

    /// Keep `column` as text
    pub fn with_text_column<S: Into<String>>(mut self, column: S) -> Self {
        self.text_columns.push(column.into());
        self
    }
}

/// Options for writing tables as CSV
#[derive(Debug, Clone)]
pub struct CsvWriteOptions {
    /// Field delimiter (default: comma)
    pub delimiter: u8,
    /// Quote character (default: double quote)
    pub quote: u8,
    /// Write the header row
    pub write_header: bool,
    /// Line terminator
    pub line_terminator: LineTerminator,
}

impl Default for CsvWriteOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            quote: b'"',
            write_header: true,
            line_terminator: LineTerminator::CRLF,
        }
    }
}

/// Line terminator type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineTerminator {
    /// Unix-style (LF)
    LF,
    /// Windows-style (CRLF)
    CRLF,
}

impl LineTerminator {
    pub(crate) fn to_csv(self) -> csv::Terminator {
        match self {
            LineTerminator::LF => csv::Terminator::Any(b'\n'),
            LineTerminator::CRLF => csv::Terminator::CRLF,
        }
    }
}
