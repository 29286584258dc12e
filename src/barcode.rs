//! Barcode and typeable-line encoding.
//!
//! The 44-digit barcode layout is
//! `bank(3) currency(1) check(1) factor(4) amount(10) free_field(25)`; the
//! 47-digit typeable line re-slices it into five fields, three of them
//! guarded by their own modulo-10 digit.

use crate::checksum::{barcode_check_digit, modulo10};
use crate::decimal::Decimal2;
use crate::error::{BoletoError, Result};
use crate::profile::{due_date_epoch, due_date_from_factor, BankProfile};
use crate::record::{OurNumber, PaymentRecord};
use chrono::NaiveDate;
use log::debug;
use std::fmt;
use std::str::FromStr;

/// Largest amount the 10-digit barcode field can carry, in cents.
const MAX_AMOUNT_CENTS: u64 = 9_999_999_999;

/// A validated 44-digit barcode.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Barcode(String);

impl Barcode {
    /// Number of digits.
    pub const LEN: usize = 44;

    /// The 44 digits.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Three-digit bank code.
    pub fn bank_code(&self) -> &str {
        &self.0[0..3]
    }

    /// Currency digit.
    pub fn currency(&self) -> char {
        char::from(self.0.as_bytes()[3])
    }

    /// General check digit at position 5.
    pub fn check_digit(&self) -> u8 {
        self.0.as_bytes()[4] - b'0'
    }

    /// Four-digit due-date factor.
    pub fn due_date_factor(&self) -> u32 {
        self.0[5..9].parse().unwrap_or_default()
    }

    /// Due date, resolved to the factor cycle closest to `reference`.
    pub fn due_date(&self, reference: NaiveDate) -> NaiveDate {
        due_date_from_factor(self.due_date_factor(), reference)
    }

    /// Amount with 2 implied decimals.
    pub fn amount(&self) -> Decimal2 {
        Decimal2::from_cents(self.0[9..19].parse().unwrap_or_default())
    }

    /// Bank-specific region, positions 20-44.
    pub fn free_field(&self) -> &str {
        &self.0[19..44]
    }

    /// Converts to the 47-digit typeable line.
    pub fn typeable_line(&self) -> TypeableLine {
        to_typeable_line(self)
    }
}

impl FromStr for Barcode {
    type Err = BoletoError;

    /// Accepts 44 digits whose check digit is consistent with the payload.
    fn from_str(s: &str) -> Result<Self> {
        if s.len() != Barcode::LEN || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(BoletoError::InvalidInput(s.to_string()));
        }
        let payload = format!("{}{}", &s[0..4], &s[5..]);
        let expected = barcode_check_digit(&payload)?;
        if s.as_bytes()[4] - b'0' != expected {
            return Err(BoletoError::InvalidInput(s.to_string()));
        }
        Ok(Barcode(s.to_string()))
    }
}

impl fmt::Display for Barcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A 47-digit typeable line ("linha digitável"), stored without formatting.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeableLine(String);

impl TypeableLine {
    /// Number of digits.
    pub const LEN: usize = 47;

    /// The 47 digits, without formatting.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human display form:
    /// `XXXXX.XXXXX XXXXX.XXXXXX XXXXX.XXXXXX X XXXXXXXXXXXXXX`.
    pub fn formatted(&self) -> String {
        let s = &self.0;
        format!(
            "{}.{} {}.{} {}.{} {} {}",
            &s[0..5],
            &s[5..10],
            &s[10..15],
            &s[15..21],
            &s[21..26],
            &s[26..32],
            &s[32..33],
            &s[33..47]
        )
    }

    /// Parses a typeable line, ignoring dots and spaces, and checks the three
    /// field digits and the barcode check digit.
    pub fn parse(input: &str) -> Result<Self> {
        let digits: String = input.chars().filter(|c| !matches!(c, '.' | ' ')).collect();
        if digits.len() != TypeableLine::LEN || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BoletoError::InvalidInput(input.to_string()));
        }
        for (field, check) in [(0..9, 9), (10..20, 20), (21..31, 31)] {
            if modulo10(&digits[field])? != digits.as_bytes()[check] - b'0' {
                return Err(BoletoError::InvalidInput(input.to_string()));
            }
        }
        let line = TypeableLine(digits);
        line.to_barcode()?;
        Ok(line)
    }

    /// Reassembles the barcode the line was derived from.
    pub fn to_barcode(&self) -> Result<Barcode> {
        let s = &self.0;
        let barcode = format!(
            "{}{}{}{}{}{}",
            &s[0..4],
            &s[32..33],
            &s[33..47],
            &s[4..9],
            &s[10..20],
            &s[21..31]
        );
        barcode.parse()
    }
}

impl fmt::Display for TypeableLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything derived from a payment record, computed together once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedSlip {
    /// Our-number with its check character.
    pub our_number: OurNumber,
    /// Bank-specific 25-digit block of the barcode.
    pub free_field: String,
    pub barcode: Barcode,
    pub typeable_line: TypeableLine,
}

/// Validates `record` and derives its our-number, free field, barcode and
/// typeable line.
///
/// Every missing or malformed field is reported in a single
/// [`BoletoError::Validation`]; nothing is encoded on failure.
pub fn encode<P: BankProfile + ?Sized>(record: &PaymentRecord, profile: &P) -> Result<DerivedSlip> {
    let mut problems = Vec::new();

    let bank_code = record.bank_code();
    if bank_code.len() != 3 || !bank_code.chars().all(|c| c.is_ascii_digit()) {
        problems.push("bank_code".to_string());
    } else if bank_code != profile.bank_code() {
        problems.push(format!("bank_code {} (profile is {})", bank_code, profile.bank_code()));
    }

    match record.wallet() {
        None => problems.push("wallet".to_string()),
        Some(w) if !profile.allowed_wallets().iter().any(|a| *a == w) => {
            problems.push(format!("wallet {}", w))
        }
        Some(_) => {}
    }

    let factor = match record.due_date() {
        None => {
            problems.push("due_date".to_string());
            None
        }
        Some(due) if due < due_date_epoch() => {
            problems.push(format!("due_date {} before {}", due, due_date_epoch()));
            None
        }
        Some(due) => match profile.due_date_factor(due) {
            Ok(factor) => Some(factor),
            Err(BoletoError::Validation { fields }) => {
                problems.extend(fields);
                None
            }
            Err(e) => return Err(e),
        },
    };

    let cents = match record.amount() {
        None => {
            problems.push("amount".to_string());
            None
        }
        Some(amount) => match amount.cents() {
            Some(cents) if cents <= MAX_AMOUNT_CENTS => Some(cents),
            _ => {
                problems.push(format!("amount {}", amount));
                None
            }
        },
    };

    problems.extend(profile.missing_fields(record));

    let (Some(factor), Some(cents), true) = (factor, cents, problems.is_empty()) else {
        return Err(BoletoError::Validation { fields: problems });
    };

    let our_number = profile.our_number(record)?;
    let free_field = profile.free_field(record)?;
    if free_field.len() != 25 || !free_field.chars().all(|c| c.is_ascii_digit()) {
        return Err(BoletoError::InvalidInput(free_field));
    }

    let payload = format!(
        "{}{}{:04}{:010}{}",
        bank_code,
        profile.currency_code(),
        factor,
        cents,
        free_field
    );
    let check = barcode_check_digit(&payload)?;
    let barcode = Barcode(format!("{}{}{}", &payload[0..4], check, &payload[4..]));
    let typeable_line = to_typeable_line(&barcode);

    debug!(
        "Derived slip {} for document {}: {}",
        our_number,
        record.document_number().unwrap_or_default(),
        barcode
    );

    Ok(DerivedSlip {
        our_number,
        free_field,
        barcode,
        typeable_line,
    })
}

/// Re-slices a barcode into the 47-digit typeable line.
///
/// field1 = `bc[0..4] + bc[19..24]` + DV, field2 = `bc[24..34]` + DV,
/// field3 = `bc[34..44]` + DV, field4 = `bc[4]`, field5 = `bc[5..19]`.
pub fn to_typeable_line(barcode: &Barcode) -> TypeableLine {
    let bc = barcode.as_str();
    let with_digit = |field: String| {
        // barcode digits are validated, modulo10 cannot fail here
        let dv = modulo10(&field).unwrap_or_default();
        format!("{}{}", field, dv)
    };
    let field1 = with_digit(format!("{}{}", &bc[0..4], &bc[19..24]));
    let field2 = with_digit(bc[24..34].to_string());
    let field3 = with_digit(bc[34..44].to_string());
    TypeableLine(format!("{}{}{}{}{}", field1, field2, field3, &bc[4..5], &bc[5..19]))
}
