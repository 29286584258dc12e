//! Positional fixed-width record composition.
//!
//! A [`RecordBuilder`] accumulates writes addressed by inclusive, 1-based
//! column ranges and renders a single line of the declared width. Each write
//! is padded or truncated to the range width according to its [`Fill`] mode.
//! Overlapping writes and writes outside the record are rejected, so a layout
//! bug surfaces as an error instead of a silently shifted file.

use crate::decimal::Decimal2;
use crate::error::{BoletoError, Result};
use std::fmt::Display;

/// How a value is fitted into its column range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fill {
    /// Digits only, zero-padded on the left. Values wider than the range are
    /// an error rather than being silently cut.
    Numeric,

    /// Upper-cased, accents folded to ASCII, space-padded on the right and
    /// truncated to the range width.
    Alphanumeric,

    /// Written verbatim; the value must already be exactly the range width.
    Raw,
}

/// Single-use builder for one fixed-width output line.
#[derive(Debug, Clone)]
pub struct RecordBuilder {
    cells: Vec<Option<char>>,
    gap_fill: char,
}

impl RecordBuilder {
    /// Creates a builder for a line of exactly `width` columns.
    ///
    /// Columns left unwritten are rendered with a space; see
    /// [`RecordBuilder::with_gap_fill`].
    pub fn new(width: usize) -> Self {
        RecordBuilder {
            cells: vec![None; width],
            gap_fill: ' ',
        }
    }

    /// Overrides the character used for columns nobody wrote.
    pub fn with_gap_fill(mut self, fill: char) -> Self {
        self.gap_fill = fill;
        self
    }

    /// Declared total width of the line.
    pub fn width(&self) -> usize {
        self.cells.len()
    }

    /// Writes `value` into columns `start..=end` (1-based).
    pub fn write(&mut self, start: usize, end: usize, fill: Fill, value: &str) -> Result<&mut Self> {
        if start == 0 || start > end || end > self.cells.len() {
            return Err(layout_error(
                start,
                end,
                format!("range outside record of width {}", self.cells.len()),
            ));
        }
        let width = end - start + 1;
        let rendered = fit(fill, value, width).map_err(|message| layout_error(start, end, message))?;

        let slots = &mut self.cells[start - 1..end];
        if let Some(taken) = slots.iter().position(Option::is_some) {
            return Err(layout_error(
                start,
                end,
                format!("column {} already written", start + taken),
            ));
        }
        for (slot, c) in slots.iter_mut().zip(rendered.chars()) {
            *slot = Some(c);
        }
        Ok(self)
    }

    /// Zero-padded numeric write.
    pub fn numeric(&mut self, start: usize, end: usize, value: impl Display) -> Result<&mut Self> {
        self.write(start, end, Fill::Numeric, &value.to_string())
    }

    /// Space-padded, upper-cased text write.
    pub fn alpha(&mut self, start: usize, end: usize, value: &str) -> Result<&mut Self> {
        self.write(start, end, Fill::Alphanumeric, value)
    }

    /// Verbatim write of a value that already has the range width.
    pub fn raw(&mut self, start: usize, end: usize, value: &str) -> Result<&mut Self> {
        self.write(start, end, Fill::Raw, value)
    }

    /// Amount in cents with 2 implied decimals, zero-padded.
    pub fn amount(&mut self, start: usize, end: usize, value: Decimal2) -> Result<&mut Self> {
        let cents = value
            .cents()
            .ok_or_else(|| layout_error(start, end, format!("negative amount {}", value)))?;
        self.numeric(start, end, cents)
    }

    /// Explicitly blank columns.
    pub fn blank(&mut self, start: usize, end: usize) -> Result<&mut Self> {
        self.alpha(start, end, "")
    }

    /// Explicitly zeroed columns.
    pub fn zeros(&mut self, start: usize, end: usize) -> Result<&mut Self> {
        self.numeric(start, end, "")
    }

    /// Renders the line, filling unwritten columns with the gap character.
    pub fn finish(self) -> String {
        let gap = self.gap_fill;
        self.cells.into_iter().map(|c| c.unwrap_or(gap)).collect()
    }
}

fn layout_error(start: usize, end: usize, message: String) -> BoletoError {
    BoletoError::RecordLayout {
        start,
        end,
        message,
    }
}

/// Fits `value` into exactly `width` characters under `fill` rules.
pub fn fit(fill: Fill, value: &str, width: usize) -> std::result::Result<String, String> {
    match fill {
        Fill::Numeric => {
            if let Some(bad) = value.chars().find(|c| !c.is_ascii_digit()) {
                return Err(format!("non-numeric character {:?} in {:?}", bad, value));
            }
            if value.len() > width {
                return Err(format!("value {:?} wider than {} columns", value, width));
            }
            Ok(format!("{:0>width$}", value, width = width))
        }
        Fill::Alphanumeric => {
            let mut text: String = value
                .chars()
                .flat_map(char::to_uppercase)
                .map(fold_ascii)
                .take(width)
                .collect();
            while text.len() < width {
                text.push(' ');
            }
            Ok(text)
        }
        Fill::Raw => {
            if !value.is_ascii() || value.len() != width {
                return Err(format!("raw value {:?} is not {} ASCII columns", value, width));
            }
            Ok(value.to_string())
        }
    }
}

/// Folds Portuguese accented capitals to ASCII; other non-ASCII becomes a space.
fn fold_ascii(c: char) -> char {
    match c {
        'Á' | 'À' | 'Â' | 'Ã' | 'Ä' => 'A',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'Ó' | 'Ò' | 'Ô' | 'Õ' | 'Ö' => 'O',
        'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'Ç' => 'C',
        'Ñ' => 'N',
        c if c.is_ascii() && !c.is_ascii_control() => c,
        _ => ' ',
    }
}

/// Keeps only ASCII digits (CPF/CNPJ, postal codes).
pub fn only_digits(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_writes_land_on_declared_columns() {
        let mut b = RecordBuilder::new(10);
        b.raw(1, 1, "0").unwrap().numeric(2, 4, 7).unwrap().alpha(5, 10, "ab").unwrap();
        assert_eq!(b.finish(), "0007AB    ");
    }

    #[test]
    fn test_gaps_use_fill_character() {
        let mut b = RecordBuilder::new(6).with_gap_fill('0');
        b.raw(3, 4, "XY").unwrap();
        assert_eq!(b.finish(), "00XY00");
    }

    #[test]
    fn test_alphanumeric_truncates_and_folds_accents() {
        let mut b = RecordBuilder::new(8);
        b.alpha(1, 8, "São Conceição").unwrap();
        assert_eq!(b.finish(), "SAO CONC");
    }

    #[test]
    fn test_amount_has_two_implied_decimals() {
        let mut b = RecordBuilder::new(10);
        b.amount(1, 10, Decimal2::from_str("123.45").unwrap()).unwrap();
        assert_eq!(b.finish(), "0000012345");
    }

    #[test]
    fn test_rejects_out_of_range_writes() {
        let mut b = RecordBuilder::new(10);
        assert!(matches!(b.numeric(9, 11, 1), Err(BoletoError::RecordLayout { .. })));
        assert!(matches!(b.numeric(5, 4, 1), Err(BoletoError::RecordLayout { .. })));
        assert!(matches!(b.numeric(0, 4, 1), Err(BoletoError::RecordLayout { .. })));
    }

    #[test]
    fn test_rejects_overlapping_writes() {
        let mut b = RecordBuilder::new(10);
        b.numeric(1, 5, 1).unwrap();
        let err = b.numeric(5, 6, 1).unwrap_err();
        assert!(err.to_string().contains("column 5 already written"));
    }

    #[test]
    fn test_numeric_overflow_and_garbage_are_errors() {
        let mut b = RecordBuilder::new(10);
        assert!(b.numeric(1, 2, 123).is_err());
        assert!(b.numeric(1, 4, "12a").is_err());
        assert!(b.raw(1, 3, "ab").is_err());
        assert!(b.amount(1, 5, Decimal2::from_str("-1").unwrap()).is_err());
    }

    #[test]
    fn test_failed_write_leaves_line_untouched() {
        let mut b = RecordBuilder::new(4);
        b.raw(1, 2, "AB").unwrap();
        assert!(b.raw(2, 3, "CD").is_err());
        assert_eq!(b.finish(), "AB  ");
    }

    #[test]
    fn test_only_digits() {
        assert_eq!(only_digits("123.456.789-09"), "12345678909");
        assert_eq!(only_digits("01310-100"), "01310100");
    }
}
