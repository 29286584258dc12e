//! Sisprime (bank 084) profile.
//!
//! Free field: `agency(4) wallet(2) our_number(11) account(7) "0"`, where the
//! our-number part is the zero-padded positional number without its check
//! character. The check character uses modulo-11 weights 2..9 over
//! `wallet + 11-digit number`, with remainder 1 mapped to `P`.

use crate::checksum::sisprime_our_number_check;
use crate::error::{BoletoError, Result};
use crate::layout::{only_digits, RecordBuilder};
use crate::profile::{BankProfile, FreeFieldParts};
use crate::record::{BatchOperation, DocumentKind, OurNumber, PaymentRecord};
use crate::remessa::{BatchField, BatchSettings, DetailContext};

/// FEBRABAN code of Sisprime.
pub const BANK_CODE: &str = "084";

/// Occurrence codes accepted in detail lines.
pub mod occurrence {
    pub const SUBMIT: &str = "01";
    pub const WRITE_OFF: &str = "02";
    pub const GRANT_REBATE: &str = "04";
    pub const CANCEL_REBATE: &str = "05";
    pub const DUE_DATE_CHANGE: &str = "06";
    pub const PROTEST: &str = "09";
    pub const STOP_PROTEST_KEEP: &str = "11";
    pub const CHANGE_OWN_NUMBER: &str = "22";
    pub const CHANGE_PAYER_DATA: &str = "23";
    pub const STOP_PROTEST_WRITE_OFF: &str = "25";
    pub const AUTOMATIC_PROTEST: &str = "26";
    pub const CHANGE_DISCOUNT_STATUS: &str = "40";
}

const FREE_FIELD_AGENCY: usize = 4;
const FREE_FIELD_WALLET: usize = 2;
const FREE_FIELD_OUR_NUMBER: usize = 11;
const FREE_FIELD_ACCOUNT: usize = 7;

/// Sisprime cooperative bank.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sisprime;

impl Sisprime {
    fn client_code(batch: &BatchSettings) -> String {
        if let Some(code) = &batch.client_code {
            return only_digits(code);
        }
        format!(
            "{:0>4}{:0>5}{:0>7}{}",
            batch.wallet.as_deref().unwrap_or_default(),
            batch.account.agency,
            batch.account.account,
            batch.account.account_check_digit.as_deref().unwrap_or_default()
        )
    }
}

/// Checks that `value` is present, numeric and at most `width` digits.
fn check_numeric(problems: &mut Vec<String>, field: &str, value: Option<&str>, width: usize) {
    match value {
        None => problems.push(field.to_string()),
        Some(v) if v.is_empty() => problems.push(field.to_string()),
        Some(v) if v.len() > width || !v.chars().all(|c| c.is_ascii_digit()) => {
            problems.push(format!("{} {:?}", field, v))
        }
        Some(_) => {}
    }
}

impl BankProfile for Sisprime {
    fn bank_code(&self) -> &'static str {
        BANK_CODE
    }

    fn bank_name(&self) -> &'static str {
        "SISPRIME"
    }

    fn allowed_wallets(&self) -> &'static [&'static str] {
        &["9"]
    }

    fn missing_fields(&self, record: &PaymentRecord) -> Vec<String> {
        let mut problems = Vec::new();
        check_numeric(&mut problems, "agency", Some(&record.account().agency), FREE_FIELD_AGENCY);
        check_numeric(&mut problems, "account", Some(&record.account().account), FREE_FIELD_ACCOUNT);
        check_numeric(
            &mut problems,
            "document_number",
            record.document_number(),
            OurNumber::DIGITS,
        );
        problems
    }

    fn our_number_check(&self, wallet: &str, digits: &str) -> Result<char> {
        sisprime_our_number_check(wallet, &format!("{:0>11}", digits))
    }

    fn our_number(&self, record: &PaymentRecord) -> Result<OurNumber> {
        let mut problems = Vec::new();
        check_numeric(&mut problems, "wallet", record.wallet(), FREE_FIELD_WALLET);
        check_numeric(
            &mut problems,
            "document_number",
            record.document_number(),
            OurNumber::DIGITS,
        );
        if !problems.is_empty() {
            return Err(BoletoError::Validation { fields: problems });
        }
        let wallet = record.wallet().unwrap_or_default();
        let digits = format!("{:0>10}", record.document_number().unwrap_or_default());
        OurNumber::new(&digits, self.our_number_check(wallet, &digits)?)
    }

    fn free_field(&self, record: &PaymentRecord) -> Result<String> {
        let problems = self.missing_fields(record);
        if !problems.is_empty() {
            return Err(BoletoError::Validation { fields: problems });
        }
        let our_number = self.our_number(record)?;
        Ok(format!(
            "{:0>4}{:0>2}{:0>11}{:0>7}0",
            record.account().agency,
            record.wallet().unwrap_or_default(),
            our_number.digits(),
            record.account().account
        ))
    }

    fn parse_free_field(&self, free_field: &str) -> Result<FreeFieldParts> {
        if free_field.len() != 25 || !free_field.chars().all(|c| c.is_ascii_digit()) {
            return Err(BoletoError::InvalidInput(free_field.to_string()));
        }
        let wallet_at = FREE_FIELD_AGENCY;
        let number_at = wallet_at + FREE_FIELD_WALLET;
        let account_at = number_at + FREE_FIELD_OUR_NUMBER;
        Ok(FreeFieldParts {
            agency: free_field[..wallet_at].to_string(),
            wallet: free_field[wallet_at..number_at].to_string(),
            our_number: free_field[number_at..account_at].to_string(),
            account: free_field[account_at..account_at + FREE_FIELD_ACCOUNT].to_string(),
        })
    }

    fn document_type_code(&self, kind: DocumentKind) -> Result<&'static str> {
        Ok(match kind {
            DocumentKind::MerchantDuplicate => "01",
            DocumentKind::PromissoryNote => "02",
            DocumentKind::InsuranceNote => "03",
            DocumentKind::SerialCollection => "04",
            DocumentKind::Receipt => "05",
            DocumentKind::BillOfExchange => "10",
            DocumentKind::DebitNote => "11",
            DocumentKind::ServiceDuplicate => "12",
            DocumentKind::ProposalSlip => "30",
            DocumentKind::Other => "99",
        })
    }

    fn occurrence_code(&self, operation: &BatchOperation) -> String {
        match operation {
            BatchOperation::Submit => occurrence::SUBMIT.to_string(),
            BatchOperation::WriteOff => occurrence::WRITE_OFF.to_string(),
            BatchOperation::DueDateChange => occurrence::DUE_DATE_CHANGE.to_string(),
            BatchOperation::Custom(code) => code.clone(),
        }
    }

    fn required_batch_fields(&self) -> &'static [BatchField] {
        &[
            BatchField::BeneficiaryName,
            BatchField::Agency,
            BatchField::Account,
            BatchField::AccountCheckDigit,
            BatchField::Wallet,
            BatchField::Sequence,
        ]
    }

    fn missing_detail_field(&self, record: &PaymentRecord) -> Option<&'static str> {
        match record.payer() {
            None => Some("payer"),
            Some(payer) if payer.name.trim().is_empty() => Some("payer_name"),
            Some(payer) if payer.document_digits().is_empty() => Some("payer_document"),
            Some(_) if record.issue_date().is_none() => Some("issue_date"),
            Some(_) => None,
        }
    }

    fn write_header(&self, line: &mut RecordBuilder, batch: &BatchSettings) -> Result<()> {
        line.raw(1, 1, "0")?
            .raw(2, 2, "1")?
            .raw(3, 9, "REMESSA")?
            .raw(10, 11, "01")?
            .alpha(12, 26, "COBRANCA")?
            .numeric(27, 46, Self::client_code(batch))?
            .alpha(47, 76, &batch.beneficiary.name)?
            .raw(77, 79, BANK_CODE)?
            .alpha(80, 94, self.bank_name())?
            .raw(95, 100, &batch.date.format("%d%m%y").to_string())?
            .blank(101, 108)?
            .raw(109, 110, "MX")?
            .numeric(111, 117, batch.sequence.unwrap_or_default())?
            .blank(118, 394)?
            .numeric(395, 400, 1)?;
        Ok(())
    }

    fn write_detail(&self, line: &mut RecordBuilder, detail: &DetailContext<'_>) -> Result<()> {
        let record = detail.record;
        let account = record.account();
        let payer = record.payer().cloned().unwrap_or_default();
        let fine = record.fine().filter(|f| !f.is_zero());
        let discount = record.discount().filter(|d| !d.is_zero());
        let dmy = |date: chrono::NaiveDate| date.format("%d%m%y").to_string();
        let missing = |field: &str| BoletoError::invalid(field.to_string());

        line.raw(1, 1, "1")?
            .zeros(2, 20)?
            .raw(21, 21, "0")?
            .numeric(22, 24, record.wallet().unwrap_or_default())?
            .numeric(25, 29, &account.agency)?
            .numeric(
                30,
                37,
                format!(
                    "{}{}",
                    account.account,
                    account.account_check_digit.as_deref().unwrap_or_default()
                ),
            )?
            .alpha(38, 62, record.control_number().unwrap_or_default())?
            .raw(63, 65, BANK_CODE)?
            .raw(66, 66, if fine.is_some() { "2" } else { "0" })?;

        match fine {
            Some(percent) => line.amount(67, 70, percent)?,
            None => line.zeros(67, 70)?,
        };

        line.numeric(71, 81, format!("{:0>11}", detail.our_number.digits()))?
            .raw(82, 82, &detail.our_number.check().to_string())?
            .zeros(83, 92)?
            .raw(93, 93, "2")?
            .blank(94, 108)?
            .raw(109, 110, &self.occurrence_code(record.operation()))?
            .alpha(111, 120, record.document_number().unwrap_or_default())?
            .raw(121, 126, &dmy(record.due_date().ok_or_else(|| missing("due_date"))?))?
            .amount(127, 139, record.amount().ok_or_else(|| missing("amount"))?)?
            .zeros(140, 147)?
            .raw(148, 149, self.document_type_code(record.kind())?)?
            .raw(150, 150, "N")?
            .raw(151, 156, &dmy(record.issue_date().ok_or_else(|| missing("issue_date"))?))?
            .zeros(157, 160)?
            .amount(161, 173, record.interest().unwrap_or_default())?;

        match (discount, record.discount_date()) {
            (Some(amount), Some(until)) => line.raw(174, 179, &dmy(until))?.amount(180, 192, amount)?,
            _ => line.zeros(174, 179)?.zeros(180, 192)?,
        };

        line.zeros(193, 205)?
            .zeros(206, 218)?
            .raw(219, 220, payer.kind().cnab_code())?
            .numeric(221, 234, payer.document_digits())?
            .alpha(235, 274, &payer.name)?
            .alpha(275, 314, &payer.address)?
            .zeros(315, 326)?
            .numeric(327, 334, only_digits(&payer.postal_code))?
            .alpha(335, 354, &payer.neighborhood)?
            .alpha(355, 392, &payer.city)?
            .alpha(393, 394, &payer.state)?
            .numeric(395, 400, detail.sequence)?;
        Ok(())
    }

    fn write_trailer(
        &self,
        line: &mut RecordBuilder,
        _batch: &BatchSettings,
        detail_count: usize,
    ) -> Result<()> {
        line.raw(1, 1, "9")?.blank(2, 394)?.numeric(395, 400, detail_count)?;
        Ok(())
    }
}
