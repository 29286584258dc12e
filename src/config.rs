//! Batch settings read from the environment.
//!
//! | Variable                      | Meaning                               |
//! |-------------------------------|---------------------------------------|
//! | `BOLETO_BENEFICIARY_NAME`     | Beneficiary (sender) name             |
//! | `BOLETO_BENEFICIARY_DOCUMENT` | Beneficiary CPF/CNPJ                  |
//! | `BOLETO_AGENCY`               | Agency number                         |
//! | `BOLETO_ACCOUNT`              | Account number                        |
//! | `BOLETO_ACCOUNT_DV`           | Account check digit                   |
//! | `BOLETO_WALLET`               | Wallet ("carteira")                   |
//! | `BOLETO_REMESSA_ID`           | Batch sequence number                 |
//! | `BOLETO_REMESSA_DATE`         | Header date, `YYYY-MM-DD`, default today |
//! | `BOLETO_CLIENT_CODE`          | Bank-assigned client code (optional)  |
//!
//! Absent values stay empty; the bank decides which ones are mandatory when
//! the batch is opened.

use crate::error::{BoletoError, Result};
use crate::party::{BankAccount, Beneficiary};
use crate::remessa::BatchSettings;
use chrono::{Local, NaiveDate};

pub const BENEFICIARY_NAME: &str = "BOLETO_BENEFICIARY_NAME";
pub const BENEFICIARY_DOCUMENT: &str = "BOLETO_BENEFICIARY_DOCUMENT";
pub const AGENCY: &str = "BOLETO_AGENCY";
pub const ACCOUNT: &str = "BOLETO_ACCOUNT";
pub const ACCOUNT_DV: &str = "BOLETO_ACCOUNT_DV";
pub const WALLET: &str = "BOLETO_WALLET";
pub const REMESSA_ID: &str = "BOLETO_REMESSA_ID";
pub const REMESSA_DATE: &str = "BOLETO_REMESSA_DATE";
pub const CLIENT_CODE: &str = "BOLETO_CLIENT_CODE";

/// Reads settings from the process environment.
pub fn from_env() -> Result<BatchSettings> {
    from_lookup(|key| std::env::var(key).ok(), Local::now().date_naive())
}

/// Reads settings through `lookup`; `today` is used when no date is set.
pub fn from_lookup<F>(lookup: F, today: NaiveDate) -> Result<BatchSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| {
        lookup(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let sequence = match get(REMESSA_ID) {
        Some(id) => Some(
            id.parse::<u32>()
                .map_err(|_| BoletoError::invalid(format!("{} {:?}", REMESSA_ID, id)))?,
        ),
        None => None,
    };

    let date = match get(REMESSA_DATE) {
        Some(date) => NaiveDate::parse_from_str(&date, "%Y-%m-%d")
            .map_err(|_| BoletoError::invalid(format!("{} {:?}", REMESSA_DATE, date)))?,
        None => today,
    };

    let mut account = BankAccount::new(
        get(AGENCY).unwrap_or_default(),
        get(ACCOUNT).unwrap_or_default(),
    );
    account.account_check_digit = get(ACCOUNT_DV);

    Ok(BatchSettings {
        beneficiary: Beneficiary {
            name: get(BENEFICIARY_NAME).unwrap_or_default(),
            document: get(BENEFICIARY_DOCUMENT).unwrap_or_default(),
        },
        account,
        wallet: get(WALLET),
        sequence,
        date,
        client_code: get(CLIENT_CODE),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_full_settings() {
        let settings = from_lookup(
            lookup(&[
                (BENEFICIARY_NAME, "Acme Ltda"),
                (AGENCY, "1234"),
                (ACCOUNT, "1234567"),
                (ACCOUNT_DV, "8"),
                (WALLET, "9"),
                (REMESSA_ID, " 7 "),
                (REMESSA_DATE, "2026-10-01"),
            ]),
            today(),
        )
        .unwrap();

        assert_eq!(settings.beneficiary.name, "Acme Ltda");
        assert_eq!(settings.account.display_code(), "1234- / 1234567-8");
        assert_eq!(settings.wallet.as_deref(), Some("9"));
        assert_eq!(settings.sequence, Some(7));
        assert_eq!(settings.date, NaiveDate::from_ymd_opt(2026, 10, 1).unwrap());
        assert_eq!(settings.client_code, None);
    }

    #[test]
    fn test_missing_values_stay_empty() {
        let settings = from_lookup(lookup(&[(WALLET, "  ")]), today()).unwrap();
        assert_eq!(settings.wallet, None);
        assert_eq!(settings.sequence, None);
        assert_eq!(settings.date, today());
        assert!(settings.beneficiary.name.is_empty());
    }

    #[test]
    fn test_malformed_values_rejected() {
        assert!(matches!(
            from_lookup(lookup(&[(REMESSA_ID, "seven")]), today()),
            Err(BoletoError::Validation { .. })
        ));
        assert!(matches!(
            from_lookup(lookup(&[(REMESSA_DATE, "19/10/2026")]), today()),
            Err(BoletoError::Validation { .. })
        ));
    }
}
