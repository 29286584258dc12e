//! Per-bank parameterization contract.
//!
//! The barcode encoder and the batch assembler are bank-agnostic; everything
//! that differs between banks (free-field layout, our-number rule, species
//! codes, CNAB400 column map) is supplied through [`BankProfile`].

use crate::error::{BoletoError, Result};
use crate::layout::RecordBuilder;
use crate::record::{BatchOperation, DocumentKind, OurNumber, PaymentRecord};
use crate::remessa::{BatchField, BatchSettings, DetailContext};
use chrono::{Duration, NaiveDate};

/// Currency code for the Brazilian real.
pub const CURRENCY_REAL: char = '9';

/// Day count at which the 4-digit due-date factor rolls back to 1000.
const FACTOR_ROLLOVER: i64 = 10_000;

/// Length of one factor cycle after the first rollover (1000..=9999).
const FACTOR_CYCLE: i64 = 9_000;

/// Base date of the due-date factor (factor 0).
pub fn due_date_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1997, 10, 7).unwrap_or_default()
}

/// Four-digit due-date factor for `due`.
///
/// Counts days since 1997-10-07. Once the count reaches 10000 (2025-02-22)
/// the factor restarts at 1000 and cycles through 1000..=9999.
pub fn due_date_factor(due: NaiveDate) -> Result<u32> {
    let days = (due - due_date_epoch()).num_days();
    if days < 0 {
        return Err(BoletoError::invalid(format!(
            "due_date {} before {}",
            due,
            due_date_epoch()
        )));
    }
    let factor = if days < FACTOR_ROLLOVER {
        days
    } else {
        (days - FACTOR_ROLLOVER) % FACTOR_CYCLE + 1_000
    };
    Ok(factor as u32)
}

/// Recovers the due date encoded by `factor`.
///
/// After the rollover a factor maps to many dates, one per cycle; the date
/// closest to `reference` is returned.
pub fn due_date_from_factor(factor: u32, reference: NaiveDate) -> NaiveDate {
    let epoch = due_date_epoch();
    let factor = i64::from(factor);
    let mut best = epoch
        .checked_add_signed(Duration::days(factor))
        .unwrap_or(NaiveDate::MAX);
    if factor >= 1_000 {
        let mut offset = FACTOR_ROLLOVER + factor - 1_000;
        let horizon = (reference - epoch).num_days() + FACTOR_CYCLE;
        while offset <= horizon {
            let Some(candidate) = epoch.checked_add_signed(Duration::days(offset)) else {
                break;
            };
            if (candidate - reference).num_days().abs() < (best - reference).num_days().abs() {
                best = candidate;
            }
            offset += FACTOR_CYCLE;
        }
    }
    best
}

/// Components recovered from a free field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeFieldParts {
    /// Agency, zero-padded.
    pub agency: String,
    /// Wallet, zero-padded to the bank's width.
    pub wallet: String,
    /// Our-number digits as embedded in the barcode, without check character.
    pub our_number: String,
    /// Account, zero-padded.
    pub account: String,
}

/// Parameters and hooks a bank supplies to the encoding engine.
pub trait BankProfile {
    /// Three-digit bank code.
    fn bank_code(&self) -> &'static str;

    /// Bank name as printed in the batch header.
    fn bank_name(&self) -> &'static str;

    /// Wallet ("carteira") codes the bank accepts.
    fn allowed_wallets(&self) -> &'static [&'static str];

    /// Currency digit of the barcode.
    fn currency_code(&self) -> char {
        CURRENCY_REAL
    }

    /// Due-date factor; the default follows the interbank epoch and rollover.
    fn due_date_factor(&self, due: NaiveDate) -> Result<u32> {
        due_date_factor(due)
    }

    /// Fields the free field and our-number need that `record` lacks.
    fn missing_fields(&self, record: &PaymentRecord) -> Vec<String>;

    /// Check character of an our-number, computed from wallet and digits.
    fn our_number_check(&self, wallet: &str, digits: &str) -> Result<char>;

    /// The record's our-number.
    fn our_number(&self, record: &PaymentRecord) -> Result<OurNumber>;

    /// 25-character bank region of the barcode (positions 20-44).
    fn free_field(&self, record: &PaymentRecord) -> Result<String>;

    /// Inverse of [`BankProfile::free_field`].
    fn parse_free_field(&self, free_field: &str) -> Result<FreeFieldParts>;

    /// Two-character species code.
    fn document_type_code(&self, kind: DocumentKind) -> Result<&'static str>;

    /// Two-character occurrence code for a batch operation.
    fn occurrence_code(&self, operation: &BatchOperation) -> String;

    /// Batch settings that must be present before a header is written.
    fn required_batch_fields(&self) -> &'static [BatchField];

    /// First record field the detail layout needs but `record` lacks.
    fn missing_detail_field(&self, _record: &PaymentRecord) -> Option<&'static str> {
        None
    }

    /// Width of every batch line.
    fn line_width(&self) -> usize {
        400
    }

    /// Terminator after every batch line, including the last.
    fn line_terminator(&self) -> &'static str {
        "\r\n"
    }

    /// Fills the header line.
    fn write_header(&self, line: &mut RecordBuilder, batch: &BatchSettings) -> Result<()>;

    /// Fills one detail line.
    fn write_detail(&self, line: &mut RecordBuilder, detail: &DetailContext<'_>) -> Result<()>;

    /// Fills the trailer line.
    fn write_trailer(
        &self,
        line: &mut RecordBuilder,
        batch: &BatchSettings,
        detail_count: usize,
    ) -> Result<()>;
}
