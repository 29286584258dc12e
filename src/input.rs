//! CSV payment rows as fed to the CLI.

use crate::decimal::Decimal2;
use crate::error::{BoletoError, Result};
use crate::party::{BankAccount, Payer};
use crate::profile::BankProfile;
use crate::record::{BatchOperation, DocumentKind, PaymentRecord};
use chrono::NaiveDate;
use serde::Deserialize;
use std::str::FromStr;

/// Raw payment row as read from CSV. Every column is text so that all
/// problems in a row can be reported together.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PaymentRow {
    pub document_number: String,
    pub wallet: String,
    pub wallet_variation: String,
    pub kind: String,
    pub operation: String,
    pub command: String,
    pub control_number: String,
    pub issue_date: String,
    pub due_date: String,
    pub amount: String,
    pub discount: String,
    pub discount_date: String,
    pub fine: String,
    pub interest: String,
    pub interest_after_days: String,
    pub payer_name: String,
    pub payer_document: String,
    pub payer_address: String,
    pub payer_neighborhood: String,
    pub payer_city: String,
    pub payer_state: String,
    pub payer_postal_code: String,

    /// Instruction lines separated by `|`.
    pub instructions: String,
}

/// Collects parse problems for one row.
struct Problems(Vec<String>);

impl Problems {
    fn date(&mut self, field: &str, value: &str) -> Option<NaiveDate> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match NaiveDate::parse_from_str(value, "%Y-%m-%d") {
            Ok(date) => Some(date),
            Err(_) => {
                self.0.push(format!("{} {:?}", field, value));
                None
            }
        }
    }

    fn amount(&mut self, field: &str, value: &str) -> Option<Decimal2> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match Decimal2::from_str(value) {
            Ok(amount) if !amount.is_negative() => Some(amount),
            _ => {
                self.0.push(format!("{} {:?}", field, value));
                None
            }
        }
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl PaymentRow {
    /// Converts the row into a record for `profile`, using the batch's account.
    ///
    /// Malformed values are all reported in one [`BoletoError::Validation`].
    /// Missing values are left for the encoder to report.
    pub fn to_record(&self, profile: &dyn BankProfile, account: &BankAccount) -> Result<PaymentRecord> {
        let mut problems = Problems(Vec::new());

        let issue_date = problems.date("issue_date", &self.issue_date);
        let due_date = problems.date("due_date", &self.due_date);
        let discount_date = problems.date("discount_date", &self.discount_date);
        let amount = problems.amount("amount", &self.amount);
        let discount = problems.amount("discount", &self.discount);
        let fine = problems.amount("fine", &self.fine);
        let interest = problems.amount("interest", &self.interest);

        let interest_after_days = match self.interest_after_days.trim() {
            "" => 0,
            days => days.parse().unwrap_or_else(|_| {
                problems.0.push(format!("interest_after_days {:?}", days));
                0
            }),
        };

        match (discount.is_some(), discount_date.is_some()) {
            (true, false) if non_empty(&self.discount_date).is_none() => {
                problems.0.push("discount_date".to_string())
            }
            (false, true) if non_empty(&self.discount).is_none() => {
                problems.0.push("discount".to_string())
            }
            _ => {}
        }

        let kind = match self.kind.trim() {
            "" => DocumentKind::default(),
            kind => DocumentKind::from_str(kind)?,
        };

        let operation = match BatchOperation::parse(&self.operation, non_empty(&self.command).as_deref()) {
            Ok(op) => op,
            Err(BoletoError::Validation { fields }) => {
                problems.0.extend(fields);
                BatchOperation::default()
            }
            Err(e) => return Err(e),
        };

        if !problems.0.is_empty() {
            return Err(BoletoError::Validation { fields: problems.0 });
        }

        let wallet = non_empty(&self.wallet)
            .or_else(|| profile.allowed_wallets().first().map(|w| w.to_string()))
            .unwrap_or_default();

        let mut builder = PaymentRecord::builder(profile)
            .wallet(&wallet)?
            .wallet_variation(self.wallet_variation.as_str())
            .account(account.clone())
            .kind(kind)
            .operation(operation)
            .instructions(self.instructions.split('|').map(Some))
            .payer(Payer {
                name: self.payer_name.trim().to_string(),
                document: self.payer_document.trim().to_string(),
                trade_name: None,
                email: None,
                address: self.payer_address.trim().to_string(),
                neighborhood: self.payer_neighborhood.trim().to_string(),
                city: self.payer_city.trim().to_string(),
                state: self.payer_state.trim().to_string(),
                postal_code: self.payer_postal_code.trim().to_string(),
            });

        if let Some(number) = non_empty(&self.document_number) {
            builder = builder.document_number(number);
        }
        if let Some(control) = non_empty(&self.control_number) {
            builder = builder.control_number(control);
        }
        if let Some(date) = issue_date {
            builder = builder.issue_date(date);
        }
        if let Some(date) = due_date {
            builder = builder.due_date(date);
        }
        if let Some(amount) = amount {
            builder = builder.amount(amount);
        }
        if let (Some(amount), Some(until)) = (discount, discount_date) {
            builder = builder.discount(amount, until);
        }
        if let Some(percent) = fine {
            builder = builder.fine(percent);
        }
        if let Some(per_day) = interest {
            builder = builder.interest(per_day, interest_after_days);
        }

        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::Sisprime;

    fn row() -> PaymentRow {
        PaymentRow {
            document_number: "1".to_string(),
            kind: "DM".to_string(),
            issue_date: "2026-10-19".to_string(),
            due_date: "2026-11-30".to_string(),
            amount: "123.45".to_string(),
            payer_name: "Maria".to_string(),
            payer_document: "123.456.789-09".to_string(),
            instructions: "first| second |".to_string(),
            ..PaymentRow::default()
        }
    }

    #[test]
    fn test_row_to_record() {
        let record = row()
            .to_record(&Sisprime, &BankAccount::new("1234", "1234567"))
            .unwrap();
        assert_eq!(record.wallet(), Some("9"));
        assert_eq!(record.kind(), DocumentKind::MerchantDuplicate);
        assert_eq!(record.amount().unwrap().to_string(), "123.45");
        assert_eq!(record.instructions(), ["first", "second"]);
        assert_eq!(record.operation(), &BatchOperation::Submit);
        assert_eq!(record.wallet_variation(), None);
    }

    #[test]
    fn test_row_reports_all_malformed_values() {
        let bad = PaymentRow {
            due_date: "30/11/2026".to_string(),
            amount: "abc".to_string(),
            fine: "-2".to_string(),
            ..row()
        };
        match bad.to_record(&Sisprime, &BankAccount::default()) {
            Err(BoletoError::Validation { fields }) => assert_eq!(fields.len(), 3),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_row_rejects_unknown_kind_and_wallet() {
        let bad_kind = PaymentRow {
            kind: "ZZ".to_string(),
            ..row()
        };
        assert!(matches!(
            bad_kind.to_record(&Sisprime, &BankAccount::default()),
            Err(BoletoError::UnknownDocumentType(_))
        ));

        let bad_wallet = PaymentRow {
            wallet: "17".to_string(),
            ..row()
        };
        assert!(matches!(
            bad_wallet.to_record(&Sisprime, &BankAccount::default()),
            Err(BoletoError::InvalidWallet { .. })
        ));
    }

    #[test]
    fn test_discount_requires_its_date() {
        let no_date = PaymentRow {
            discount: "5.00".to_string(),
            ..row()
        };
        match no_date.to_record(&Sisprime, &BankAccount::default()) {
            Err(BoletoError::Validation { fields }) => assert_eq!(fields, ["discount_date"]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_discount_date_requires_an_amount() {
        let no_amount = PaymentRow {
            discount_date: "2026-11-20".to_string(),
            ..row()
        };
        match no_amount.to_record(&Sisprime, &BankAccount::default()) {
            Err(BoletoError::Validation { fields }) => assert_eq!(fields, ["discount"]),
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_discount_with_date_is_kept() {
        let both = PaymentRow {
            discount: "5.00".to_string(),
            discount_date: "2026-11-20".to_string(),
            ..row()
        };
        let record = both.to_record(&Sisprime, &BankAccount::default()).unwrap();
        assert_eq!(record.discount().unwrap().to_string(), "5.00");
        assert_eq!(
            record.discount_date(),
            NaiveDate::from_ymd_opt(2026, 11, 20)
        );
    }

    #[test]
    fn test_row_custom_operation() {
        let custom = PaymentRow {
            operation: "custom".to_string(),
            command: "09".to_string(),
            ..row()
        };
        let record = custom.to_record(&Sisprime, &BankAccount::default()).unwrap();
        assert_eq!(record.operation(), &BatchOperation::Custom("09".to_string()));
    }
}
