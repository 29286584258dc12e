//! CNAB400 batch ("remessa") file assembly.
//!
//! Lines are strictly ordered: one header, one detail per accepted record in
//! caller order, one trailer. Every line is built in a fresh
//! [`RecordBuilder`] and only appended once it rendered completely, so a
//! rejected record never leaves a partial line behind.

use crate::barcode::DerivedSlip;
use crate::error::{BoletoError, Result};
use crate::layout::RecordBuilder;
use crate::party::{BankAccount, Beneficiary};
use crate::profile::BankProfile;
use crate::record::{OurNumber, PaymentRecord};
use chrono::NaiveDate;
use log::{debug, info};
use std::io::Write;

/// Batch-level settings a bank may declare mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchField {
    BeneficiaryName,
    Agency,
    Account,
    AccountCheckDigit,
    Wallet,
    Sequence,
}

impl BatchField {
    /// Field name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            BatchField::BeneficiaryName => "beneficiary_name",
            BatchField::Agency => "agency",
            BatchField::Account => "account",
            BatchField::AccountCheckDigit => "account_check_digit",
            BatchField::Wallet => "wallet",
            BatchField::Sequence => "remessa_sequence",
        }
    }
}

/// Sender identity and numbering for one batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Sender printed in the header.
    pub beneficiary: Beneficiary,
    /// Beneficiary account at the bank.
    pub account: BankAccount,
    /// Wallet used for the header client code; must be one the bank accepts.
    pub wallet: Option<String>,

    /// Batch sequence identifier assigned by the sender ("id remessa").
    pub sequence: Option<u32>,

    /// Generation date printed in the header.
    pub date: NaiveDate,

    /// Bank-assigned client code; banks derive one when absent.
    pub client_code: Option<String>,
}

impl BatchSettings {
    fn has(&self, field: BatchField) -> bool {
        let present = |s: &str| !s.trim().is_empty();
        match field {
            BatchField::BeneficiaryName => present(&self.beneficiary.name),
            BatchField::Agency => present(&self.account.agency),
            BatchField::Account => present(&self.account.account),
            BatchField::AccountCheckDigit => {
                self.account.account_check_digit.as_deref().is_some_and(present)
            }
            BatchField::Wallet => self.wallet.as_deref().is_some_and(present),
            BatchField::Sequence => self.sequence.is_some(),
        }
    }
}

/// What a bank layout sees while filling a detail line.
pub struct DetailContext<'a> {
    /// Record being written.
    pub record: &'a PaymentRecord,
    /// Its derived slip.
    pub slip: &'a DerivedSlip,

    /// Our-number recomputed for this line, cross-checked against the barcode.
    pub our_number: &'a OurNumber,

    /// 1-based position among detail lines.
    pub sequence: usize,

    /// Settings of the batch being assembled.
    pub batch: &'a BatchSettings,
}

/// A finished batch file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemessaFile {
    lines: Vec<String>,
    terminator: &'static str,
    detail_count: usize,
}

impl RemessaFile {
    /// Header, details and trailer, without terminators.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Number of detail lines, as written in the trailer.
    pub fn detail_count(&self) -> usize {
        self.detail_count
    }

    /// Whole file, every line followed by the terminator.
    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(|line| format!("{}{}", line, self.terminator))
            .collect()
    }

    /// Writes the rendered file.
    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.render().as_bytes())?;
        writer.flush()?;
        Ok(())
    }
}

/// Accumulates one batch file. Use one instance per file, sequentially.
pub struct RemessaAssembler<'p, P: BankProfile + ?Sized> {
    profile: &'p P,
    settings: BatchSettings,
    lines: Vec<String>,
    detail_count: usize,
}

impl<'p, P: BankProfile + ?Sized> RemessaAssembler<'p, P> {
    /// Checks the bank's mandatory batch settings and writes the header.
    ///
    /// Fails with [`BoletoError::MissingRequiredField`] before any line
    /// exists when a mandatory setting is absent.
    pub fn new(profile: &'p P, settings: BatchSettings) -> Result<Self> {
        if let Some(missing) = profile
            .required_batch_fields()
            .iter()
            .find(|field| !settings.has(**field))
        {
            return Err(BoletoError::MissingRequiredField(missing.name()));
        }
        if let Some(wallet) = settings.wallet.as_deref().map(str::trim) {
            let allowed = profile.allowed_wallets();
            if !wallet.is_empty() && !allowed.iter().any(|a| *a == wallet) {
                return Err(BoletoError::InvalidWallet {
                    wallet: wallet.to_string(),
                    bank_code: profile.bank_code(),
                    allowed: allowed.to_vec(),
                });
            }
        }

        let mut header = RecordBuilder::new(profile.line_width());
        profile.write_header(&mut header, &settings)?;

        Ok(RemessaAssembler {
            profile,
            settings,
            lines: vec![header.finish()],
            detail_count: 0,
        })
    }

    /// Number of detail lines written so far.
    pub fn detail_count(&self) -> usize {
        self.detail_count
    }

    /// Derives `record` and appends its detail line, returning the line's
    /// 1-based detail sequence number.
    ///
    /// On error nothing is appended and the running count is unchanged.
    pub fn add(&mut self, record: &PaymentRecord) -> Result<usize> {
        let slip = record.derive(self.profile)?;
        self.add_derived(record, &slip)
    }

    /// Appends a detail line for a record whose slip is already derived.
    pub fn add_derived(&mut self, record: &PaymentRecord, slip: &DerivedSlip) -> Result<usize> {
        if let Some(missing) = self.profile.missing_detail_field(record) {
            return Err(BoletoError::MissingRequiredField(missing));
        }
        let our_number = self.profile.our_number(record)?;
        self.check_against_barcode(&our_number, slip)?;

        let sequence = self.detail_count + 1;
        let mut line = RecordBuilder::new(self.profile.line_width());
        self.profile.write_detail(
            &mut line,
            &DetailContext {
                record,
                slip,
                our_number: &our_number,
                sequence,
                batch: &self.settings,
            },
        )?;

        self.lines.push(line.finish());
        self.detail_count = sequence;
        debug!("Detail {}: our number {}", sequence, our_number);
        Ok(sequence)
    }

    /// Our-number digits and check character must agree with what the
    /// barcode's free field carries.
    fn check_against_barcode(&self, our_number: &OurNumber, slip: &DerivedSlip) -> Result<()> {
        let embedded = self.profile.parse_free_field(slip.barcode.free_field())?;
        let barcode_check = self
            .profile
            .our_number_check(&embedded.wallet, &embedded.our_number)?;
        let same_digits =
            embedded.our_number.trim_start_matches('0') == our_number.digits().trim_start_matches('0');
        if !same_digits || barcode_check != our_number.check() || slip.our_number != *our_number {
            return Err(BoletoError::InconsistentOurNumber {
                our_number: our_number.to_string(),
                barcode_check,
            });
        }
        Ok(())
    }

    /// Writes the trailer and closes the file.
    pub fn finish(mut self) -> Result<RemessaFile> {
        let mut trailer = RecordBuilder::new(self.profile.line_width());
        self.profile
            .write_trailer(&mut trailer, &self.settings, self.detail_count)?;
        self.lines.push(trailer.finish());

        info!(
            "Remessa {:?} for bank {} closed with {} detail lines",
            self.settings.sequence,
            self.profile.bank_code(),
            self.detail_count
        );

        Ok(RemessaFile {
            lines: self.lines,
            terminator: self.profile.line_terminator(),
            detail_count: self.detail_count,
        })
    }
}

/// Builds a complete batch file from `records`, or nothing at all.
///
/// Every record is validated and derived before the header is written, so a
/// single bad record fails the whole call.
pub fn assemble<P: BankProfile + ?Sized>(
    profile: &P,
    settings: BatchSettings,
    records: &[PaymentRecord],
) -> Result<RemessaFile> {
    let slips = records
        .iter()
        .map(|record| {
            if let Some(missing) = profile.missing_detail_field(record) {
                return Err(BoletoError::MissingRequiredField(missing));
            }
            record.derive(profile)
        })
        .collect::<Result<Vec<_>>>()?;

    let mut assembler = RemessaAssembler::new(profile, settings)?;
    for (record, slip) in records.iter().zip(&slips) {
        assembler.add_derived(record, slip)?;
    }
    assembler.finish()
}
