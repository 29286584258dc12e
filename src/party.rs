//! Payer, beneficiary and bank account data.
//!
//! These are copied into detail records and API projections; the only
//! computation on them is CPF/CNPJ type inference and truncation to field
//! widths done by the layout layer.

use crate::layout::only_digits;
use serde::{Deserialize, Serialize};

/// Whether a tax document identifies a company (CNPJ) or a person (CPF).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonKind {
    /// CPF, 11 digits.
    Individual,

    /// CNPJ, 14 digits.
    Company,
}

impl PersonKind {
    /// Infers the kind from a document: 14 digits means company, anything
    /// else is treated as a person.
    pub fn from_document(document: &str) -> Self {
        if only_digits(document).len() == 14 {
            PersonKind::Company
        } else {
            PersonKind::Individual
        }
    }

    /// Single-letter code used by the API projection (`J` / `F`).
    pub fn letter(&self) -> &'static str {
        match self {
            PersonKind::Company => "J",
            PersonKind::Individual => "F",
        }
    }

    /// Two-digit CNAB code (`02` company, `01` person).
    pub fn cnab_code(&self) -> &'static str {
        match self {
            PersonKind::Company => "02",
            PersonKind::Individual => "01",
        }
    }
}

/// The party who owes the slip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payer {
    /// Full name or company name.
    pub name: String,

    /// CPF or CNPJ, punctuation allowed.
    pub document: String,

    /// Trade name, for companies.
    pub trade_name: Option<String>,
    pub email: Option<String>,
    /// Street and number.
    pub address: String,
    pub neighborhood: String,
    pub city: String,

    /// Two-letter state code.
    pub state: String,

    /// CEP, punctuation allowed.
    pub postal_code: String,
}

impl Payer {
    /// Document with punctuation stripped.
    pub fn document_digits(&self) -> String {
        only_digits(&self.document)
    }

    /// CPF/CNPJ kind of the document.
    pub fn kind(&self) -> PersonKind {
        PersonKind::from_document(&self.document)
    }
}

/// The party who issues the slip and receives the payment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Name printed in batch headers.
    pub name: String,
    /// CPF or CNPJ.
    pub document: String,
}

/// Beneficiary account at the issuing bank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankAccount {
    /// Agency number, digits only.
    pub agency: String,
    pub agency_check_digit: Option<String>,
    /// Account number, digits only.
    pub account: String,
    pub account_check_digit: Option<String>,
}

impl BankAccount {
    /// Creates an account without check digits.
    pub fn new(agency: impl Into<String>, account: impl Into<String>) -> Self {
        BankAccount {
            agency: agency.into(),
            agency_check_digit: None,
            account: account.into(),
            account_check_digit: None,
        }
    }

    /// Sets the account check digit.
    pub fn with_account_check_digit(mut self, digit: impl Into<String>) -> Self {
        self.account_check_digit = Some(digit.into());
        self
    }

    /// Sets the agency check digit.
    pub fn with_agency_check_digit(mut self, digit: impl Into<String>) -> Self {
        self.agency_check_digit = Some(digit.into());
        self
    }

    /// Printed "agency / beneficiary code" box: `AAAA-D / CCCCCCC-D`.
    pub fn display_code(&self) -> String {
        format!(
            "{:0>4}-{} / {:0>7}-{}",
            self.agency,
            self.agency_check_digit.as_deref().unwrap_or(""),
            self.account,
            self.account_check_digit.as_deref().unwrap_or("")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_person_kind_from_document_length() {
        assert_eq!(
            PersonKind::from_document("12.345.678/0001-95"),
            PersonKind::Company
        );
        assert_eq!(
            PersonKind::from_document("123.456.789-09"),
            PersonKind::Individual
        );
        assert_eq!(PersonKind::from_document(""), PersonKind::Individual);
    }

    #[test]
    fn test_person_kind_codes() {
        assert_eq!(PersonKind::Company.letter(), "J");
        assert_eq!(PersonKind::Individual.cnab_code(), "01");
    }

    #[test]
    fn test_account_display_code() {
        let account = BankAccount::new("12", "1234")
            .with_agency_check_digit("3")
            .with_account_check_digit("5");
        assert_eq!(account.display_code(), "0012-3 / 0001234-5");
    }
}
