//! Cell address and range types
//!
//! Sinks place tables and pivots by A1-style cell addresses. Rows and columns
//! are 0-based internally and 1-based (row) / lettered (column) in display.

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "$B$2")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    /// Row index (0-based)
    pub row: u32,
    /// Column index (0-based, A=0)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// `$` markers are accepted and ignored.
    ///
    /// # Examples
    /// ```
    /// use pivot_report_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("A7").unwrap();
    /// assert_eq!(addr.row, 6);
    /// assert_eq!(addr.col, 0);
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(Error::InvalidAddress("empty address".into()));
        }

        let unmarked: String = s.chars().filter(|c| *c != '$').collect();
        let split = unmarked
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(unmarked.len());
        let (letters, digits) = unmarked.split_at(split);

        if letters.is_empty() {
            return Err(Error::InvalidAddress(format!(
                "no column letters in '{}'",
                s
            )));
        }
        if digits.is_empty() {
            return Err(Error::InvalidAddress(format!("no row number in '{}'", s)));
        }

        let col = Self::letters_to_column(letters)?;
        let row: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidAddress(format!("invalid row number in '{}'", s)))?;

        if row == 0 || row > MAX_ROWS {
            return Err(Error::InvalidAddress(format!(
                "row number out of range in '{}'",
                s
            )));
        }

        Ok(Self { row: row - 1, col })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1;

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert column letters to index (A = 0, Z = 25, AA = 26, etc.)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() {
            return Err(Error::InvalidAddress("empty column letters".into()));
        }

        let mut col: u32 = 0;
        for c in letters.chars() {
            if !c.is_ascii_alphabetic() {
                return Err(Error::InvalidAddress(format!(
                    "invalid column letter '{}'",
                    c
                )));
            }
            col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
            if col > MAX_COLS as u32 {
                return Err(Error::InvalidAddress(format!(
                    "column '{}' out of range",
                    letters
                )));
            }
        }

        Ok((col - 1) as u16)
    }

    /// Offset this address, failing if it leaves the sheet
    pub fn offset(&self, rows: u32, cols: u16) -> Result<Self> {
        let row = self.row as u64 + rows as u64;
        let col = self.col as u32 + cols as u32;
        if row >= MAX_ROWS as u64 || col >= MAX_COLS as u32 {
            return Err(Error::InvalidAddress(format!(
                "{} offset by ({}, {}) leaves the sheet",
                self, rows, cols
            )));
        }
        Ok(Self::new(row as u32, col as u16))
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular range of cells (e.g., "A3:E10")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    /// Top-left address
    pub start: CellAddress,
    /// Bottom-right address
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new range, normalizing corners
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Range starting at `origin` spanning `rows` x `cols` cells
    pub fn from_origin(origin: CellAddress, rows: u32, cols: u16) -> Result<Self> {
        let end = origin.offset(rows.saturating_sub(1), cols.saturating_sub(1))?;
        Ok(Self::new(origin, end))
    }

    /// Number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Format as A1:B10 string
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start, self.end)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");

        assert_eq!(CellAddress::letters_to_column("A").unwrap(), 0);
        assert_eq!(CellAddress::letters_to_column("aa").unwrap(), 26);
        assert_eq!(CellAddress::letters_to_column("XFD").unwrap(), 16383);
        assert!(CellAddress::letters_to_column("XFE").is_err());
    }

    #[test]
    fn test_parse() {
        assert_eq!(CellAddress::parse("A3").unwrap(), CellAddress::new(2, 0));
        assert_eq!(CellAddress::parse("c10").unwrap(), CellAddress::new(9, 2));
        assert_eq!(CellAddress::parse("$A$7").unwrap(), CellAddress::new(6, 0));
        assert_eq!(
            "XFD1048576".parse::<CellAddress>().unwrap(),
            CellAddress::new(1_048_575, 16383)
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(CellAddress::parse("").is_err());
        assert!(CellAddress::parse("A").is_err());
        assert!(CellAddress::parse("7").is_err());
        assert!(CellAddress::parse("A0").is_err());
        assert!(CellAddress::parse("A1048577").is_err());
        assert!(CellAddress::parse("A1B").is_err());
    }

    #[test]
    fn test_offset_and_range() {
        let origin = CellAddress::parse("A3").unwrap();
        let range = CellRange::from_origin(origin, 4, 5).unwrap();
        assert_eq!(range.to_string(), "A3:E6");
        assert_eq!(range.row_count(), 4);
        assert_eq!(range.col_count(), 5);
        assert!(range.contains(&CellAddress::new(5, 4)));
        assert!(!range.contains(&CellAddress::new(6, 0)));

        let edge = CellAddress::new(MAX_ROWS - 1, 0);
        assert!(edge.offset(1, 0).is_err());
    }

    #[test]
    fn test_overlaps() {
        let a = CellRange::new(CellAddress::new(0, 0), CellAddress::new(3, 3));
        let b = CellRange::new(CellAddress::new(3, 3), CellAddress::new(5, 5));
        let c = CellRange::new(CellAddress::new(4, 0), CellAddress::new(5, 0));
        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }
}
