//! Payment record model.
//!
//! A [`PaymentRecord`] is built once through [`PaymentRecordBuilder`] and is
//! immutable afterwards. Derived values (our-number, free field, barcode,
//! typeable line) are not cached on the record; [`PaymentRecord::derive`]
//! computes them into a separate [`DerivedSlip`](crate::barcode::DerivedSlip).

use crate::barcode::{self, DerivedSlip};
use crate::decimal::Decimal2;
use crate::error::{BoletoError, Result};
use crate::party::{BankAccount, Payer};
use crate::profile::BankProfile;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Document species ("espécie do documento").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Duplicata Mercantil (DM)
    MerchantDuplicate,
    /// Nota Promissória (NP)
    PromissoryNote,
    /// Nota de Seguro (NS)
    InsuranceNote,
    /// Cobrança Seriada (CS)
    SerialCollection,
    /// Recibo (REC)
    Receipt,
    /// Letras de Câmbio (LC)
    BillOfExchange,
    /// Nota de Débito (ND)
    DebitNote,
    /// Duplicata de Serviço (DS)
    ServiceDuplicate,
    /// Boleto de Proposta (BP)
    ProposalSlip,
    /// Outros
    #[default]
    Other,
}

impl DocumentKind {
    /// Every species, in table order.
    pub const ALL: [DocumentKind; 10] = [
        DocumentKind::MerchantDuplicate,
        DocumentKind::PromissoryNote,
        DocumentKind::InsuranceNote,
        DocumentKind::SerialCollection,
        DocumentKind::Receipt,
        DocumentKind::BillOfExchange,
        DocumentKind::DebitNote,
        DocumentKind::ServiceDuplicate,
        DocumentKind::ProposalSlip,
        DocumentKind::Other,
    ];

    /// Short mnemonic printed on the slip.
    pub fn abbreviation(&self) -> &'static str {
        match self {
            DocumentKind::MerchantDuplicate => "DM",
            DocumentKind::PromissoryNote => "NP",
            DocumentKind::InsuranceNote => "NS",
            DocumentKind::SerialCollection => "CS",
            DocumentKind::Receipt => "REC",
            DocumentKind::BillOfExchange => "LC",
            DocumentKind::DebitNote => "ND",
            DocumentKind::ServiceDuplicate => "DS",
            DocumentKind::ProposalSlip => "BP",
            DocumentKind::Other => "OUTROS",
        }
    }
}

impl FromStr for DocumentKind {
    type Err = BoletoError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_uppercase();
        DocumentKind::ALL
            .into_iter()
            .find(|kind| kind.abbreviation() == wanted)
            .ok_or_else(|| BoletoError::UnknownDocumentType(s.to_string()))
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.abbreviation())
    }
}

/// What the bank should do with a record in a batch file.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BatchOperation {
    /// Register a new slip.
    #[default]
    Submit,
    /// Ask the bank to write the slip off.
    WriteOff,
    /// Change the due date of a registered slip.
    DueDateChange,
    /// Operator-supplied two-character occurrence code.
    Custom(String),
}

impl BatchOperation {
    /// Builds a custom operation; the code must be two ASCII alphanumerics.
    pub fn custom(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(BoletoError::invalid(format!("operation code {:?}", code)));
        }
        Ok(BatchOperation::Custom(code.to_string()))
    }

    /// Parses the CLI/CSV spelling: `submit`, `write_off`, `due_date_change`
    /// or `custom` (paired with a separate code).
    pub fn parse(name: &str, code: Option<&str>) -> Result<Self> {
        match name.trim().to_lowercase().as_str() {
            "" | "submit" => Ok(BatchOperation::Submit),
            "write_off" | "writeoff" => Ok(BatchOperation::WriteOff),
            "due_date_change" => Ok(BatchOperation::DueDateChange),
            "custom" => BatchOperation::custom(code.unwrap_or("")),
            other => Err(BoletoError::invalid(format!("operation {:?}", other))),
        }
    }
}

/// Check-character-bearing identifier of a slip ("nosso número").
///
/// Always 11 characters: 10 positional digits followed by a check character
/// that is a digit or the bank's "impossible remainder" letter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OurNumber {
    digits: String,
    check: char,
}

impl OurNumber {
    /// Number of positional digits.
    pub const DIGITS: usize = 10;

    /// Assembles an our-number from its positional digits and check character.
    pub fn new(digits: &str, check: char) -> Result<Self> {
        if digits.len() != Self::DIGITS || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(BoletoError::invalid(format!("our number digits {:?}", digits)));
        }
        Ok(OurNumber {
            digits: digits.to_string(),
            check,
        })
    }

    /// The 10 positional digits.
    pub fn digits(&self) -> &str {
        &self.digits
    }

    /// The trailing check character.
    pub fn check(&self) -> char {
        self.check
    }

    /// Display form `XXXXXXXXXX-D`.
    pub fn display_form(&self) -> String {
        format!("{}-{}", self.digits, self.check)
    }
}

impl fmt::Display for OurNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.digits, self.check)
    }
}

/// One payable instrument.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    bank_code: &'static str,
    wallet: Option<String>,
    wallet_variation: Option<String>,
    account: BankAccount,
    document_number: Option<String>,
    control_number: Option<String>,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    amount: Option<Decimal2>,
    kind: DocumentKind,
    discount: Option<Decimal2>,
    discount_date: Option<NaiveDate>,
    fine: Option<Decimal2>,
    interest: Option<Decimal2>,
    interest_after_days: u32,
    instructions: Vec<String>,
    payer: Option<Payer>,
    operation: BatchOperation,
}

impl PaymentRecord {
    /// Starts a record for the given bank.
    pub fn builder(profile: &dyn BankProfile) -> PaymentRecordBuilder<'_> {
        PaymentRecordBuilder::new(profile)
    }

    /// Computes our-number, free field, barcode and typeable line.
    pub fn derive<P: BankProfile + ?Sized>(&self, profile: &P) -> Result<DerivedSlip> {
        barcode::encode(self, profile)
    }

    /// Three-digit code of the issuing bank.
    pub fn bank_code(&self) -> &'static str {
        self.bank_code
    }

    /// Wallet ("carteira"), already checked against the bank's set.
    pub fn wallet(&self) -> Option<&str> {
        self.wallet.as_deref()
    }

    /// Wallet variation code, for banks that subdivide wallets.
    pub fn wallet_variation(&self) -> Option<&str> {
        self.wallet_variation.as_deref()
    }

    /// Beneficiary account the slip is credited to.
    pub fn account(&self) -> &BankAccount {
        &self.account
    }

    /// Caller-assigned sequence number, digits only.
    pub fn document_number(&self) -> Option<&str> {
        self.document_number.as_deref()
    }

    /// Beneficiary's own control reference ("número de controle").
    pub fn control_number(&self) -> Option<&str> {
        self.control_number.as_deref()
    }

    /// Date the slip was issued.
    pub fn issue_date(&self) -> Option<NaiveDate> {
        self.issue_date
    }

    /// Date the payment is due.
    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    /// Face value.
    pub fn amount(&self) -> Option<Decimal2> {
        self.amount
    }

    /// Document species.
    pub fn kind(&self) -> DocumentKind {
        self.kind
    }

    /// Discount granted when paid by [`discount_date`](Self::discount_date).
    pub fn discount(&self) -> Option<Decimal2> {
        self.discount
    }

    /// Last day the discount applies.
    pub fn discount_date(&self) -> Option<NaiveDate> {
        self.discount_date
    }

    /// Late payment fine, as a percentage.
    pub fn fine(&self) -> Option<Decimal2> {
        self.fine
    }

    /// Interest charged per day late.
    pub fn interest(&self) -> Option<Decimal2> {
        self.interest
    }

    /// Days after the due date before interest starts (0 means the next day).
    pub fn interest_after_days(&self) -> u32 {
        self.interest_after_days
    }

    /// Trimmed, non-empty instruction lines in input order.
    pub fn instructions(&self) -> &[String] {
        &self.instructions
    }

    /// Party who pays the slip.
    pub fn payer(&self) -> Option<&Payer> {
        self.payer.as_ref()
    }

    /// What the batch file asks the bank to do with this slip.
    pub fn operation(&self) -> &BatchOperation {
        &self.operation
    }
}

/// Builder for [`PaymentRecord`].
///
/// The wallet is checked against the bank's allowed set as soon as it is
/// assigned. Completeness is checked later, when the record is derived.
pub struct PaymentRecordBuilder<'p> {
    profile: &'p dyn BankProfile,
    record: PaymentRecord,
}

impl<'p> PaymentRecordBuilder<'p> {
    fn new(profile: &'p dyn BankProfile) -> Self {
        PaymentRecordBuilder {
            profile,
            record: PaymentRecord {
                bank_code: profile.bank_code(),
                wallet: None,
                wallet_variation: None,
                account: BankAccount::default(),
                document_number: None,
                control_number: None,
                issue_date: None,
                due_date: None,
                amount: None,
                kind: DocumentKind::default(),
                discount: None,
                discount_date: None,
                fine: None,
                interest: None,
                interest_after_days: 0,
                instructions: Vec::new(),
                payer: None,
                operation: BatchOperation::default(),
            },
        }
    }

    /// Assigns the wallet, failing with `InvalidWallet` outside the bank's set.
    pub fn wallet(mut self, wallet: &str) -> Result<Self> {
        let wallet = wallet.trim();
        let allowed = self.profile.allowed_wallets();
        if !allowed.iter().any(|a| *a == wallet) {
            return Err(BoletoError::InvalidWallet {
                wallet: wallet.to_string(),
                bank_code: self.profile.bank_code(),
                allowed: allowed.to_vec(),
            });
        }
        self.record.wallet = Some(wallet.to_string());
        Ok(self)
    }

    /// Sets the wallet variation code; blank values clear it.
    pub fn wallet_variation(mut self, variation: impl Into<String>) -> Self {
        let variation = variation.into().trim().to_string();
        self.record.wallet_variation = (!variation.is_empty()).then_some(variation);
        self
    }

    /// Sets the beneficiary account.
    pub fn account(mut self, account: BankAccount) -> Self {
        self.record.account = account;
        self
    }

    /// Sets the document number; surrounding whitespace is dropped.
    pub fn document_number(mut self, number: impl Into<String>) -> Self {
        self.record.document_number = Some(number.into().trim().to_string());
        self
    }

    /// Sets the beneficiary's control reference.
    pub fn control_number(mut self, control: impl Into<String>) -> Self {
        self.record.control_number = Some(control.into());
        self
    }

    /// Sets the issue date.
    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.record.issue_date = Some(date);
        self
    }

    /// Sets the due date.
    pub fn due_date(mut self, date: NaiveDate) -> Self {
        self.record.due_date = Some(date);
        self
    }

    /// Sets the face value.
    pub fn amount(mut self, amount: Decimal2) -> Self {
        self.record.amount = Some(amount);
        self
    }

    /// Sets the document species.
    pub fn kind(mut self, kind: DocumentKind) -> Self {
        self.record.kind = kind;
        self
    }

    /// Sets a discount together with its last valid day.
    pub fn discount(mut self, amount: Decimal2, until: NaiveDate) -> Self {
        self.record.discount = Some(amount);
        self.record.discount_date = Some(until);
        self
    }

    /// Sets the late payment fine percentage.
    pub fn fine(mut self, percent: Decimal2) -> Self {
        self.record.fine = Some(percent);
        self
    }

    /// Sets daily interest and the grace days before it starts.
    pub fn interest(mut self, per_day: Decimal2, after_days: u32) -> Self {
        self.record.interest = Some(per_day);
        self.record.interest_after_days = after_days;
        self
    }

    /// Sets instruction lines; `None` entries are dropped, the rest trimmed.
    pub fn instructions<I, S>(mut self, lines: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        self.record.instructions = lines
            .into_iter()
            .flatten()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        self
    }

    /// Sets the payer.
    pub fn payer(mut self, payer: Payer) -> Self {
        self.record.payer = Some(payer);
        self
    }

    /// Sets the batch operation.
    pub fn operation(mut self, operation: BatchOperation) -> Self {
        self.record.operation = operation;
        self
    }

    /// Finishes the record.
    pub fn build(self) -> PaymentRecord {
        self.record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::Sisprime;

    #[test]
    fn test_document_kind_from_str() {
        assert_eq!(
            "dm".parse::<DocumentKind>().unwrap(),
            DocumentKind::MerchantDuplicate
        );
        assert_eq!("Outros".parse::<DocumentKind>().unwrap(), DocumentKind::Other);
        assert!(matches!(
            "XX".parse::<DocumentKind>(),
            Err(BoletoError::UnknownDocumentType(_))
        ));
    }

    #[test]
    fn test_default_kind_is_other() {
        let record = PaymentRecord::builder(&Sisprime).build();
        assert_eq!(record.kind(), DocumentKind::Other);
        assert_eq!(record.bank_code(), "084");
    }

    #[test]
    fn test_wallet_outside_allowed_set_is_rejected() {
        let err = PaymentRecord::builder(&Sisprime).wallet("17").err().unwrap();
        assert!(matches!(err, BoletoError::InvalidWallet { .. }));
        assert!(PaymentRecord::builder(&Sisprime).wallet("9").is_ok());
    }

    #[test]
    fn test_instructions_drop_nulls_and_trim() {
        let record = PaymentRecord::builder(&Sisprime)
            .instructions(vec![Some("  pay on time "), None, Some("   "), Some("no discount")])
            .build();
        assert_eq!(record.instructions(), ["pay on time", "no discount"]);
    }

    #[test]
    fn test_batch_operation_parse() {
        assert_eq!(BatchOperation::parse("", None).unwrap(), BatchOperation::Submit);
        assert_eq!(
            BatchOperation::parse("write_off", None).unwrap(),
            BatchOperation::WriteOff
        );
        assert_eq!(
            BatchOperation::parse("custom", Some("09")).unwrap(),
            BatchOperation::Custom("09".to_string())
        );
        assert!(BatchOperation::parse("custom", Some("123")).is_err());
        assert!(BatchOperation::parse("explode", None).is_err());
    }

    #[test]
    fn test_our_number_forms() {
        let n = OurNumber::new("0000000001", 'P').unwrap();
        assert_eq!(n.to_string(), "0000000001P");
        assert_eq!(n.display_form(), "0000000001-P");
        assert!(OurNumber::new("123", '1').is_err());
    }
}
