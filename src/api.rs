//! Projection of slips to and from a payment-processing API.
//!
//! Pure data-shape adapter: it consumes derived values but performs no
//! checksum logic of its own beyond parsing the typeable line it receives.

use crate::barcode::{DerivedSlip, TypeableLine};
use crate::decimal::Decimal2;
use crate::error::{BoletoError, Result};
use crate::party::BankAccount;
use crate::profile::BankProfile;
use crate::record::PaymentRecord;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

/// Longest payer name the API accepts.
const API_NAME_LEN: usize = 40;

/// Slip lifecycle state as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlipStatus {
    /// Settled by the payer.
    Paid,
    /// Written off or expired without payment.
    WrittenOff,
    /// Registered and awaiting payment, possibly overdue.
    Open,
    /// A status outside the known table, kept verbatim.
    Other(String),
}

impl SlipStatus {
    /// Maps an API status string; unknown values pass through unchanged.
    pub fn from_api(status: &str) -> Self {
        match status {
            "PAID" | "SETTLED" => SlipStatus::Paid,
            "WRITTEN_OFF" | "EXPIRED" => SlipStatus::WrittenOff,
            "OVERDUE" | "OPEN" => SlipStatus::Open,
            other => SlipStatus::Other(other.to_string()),
        }
    }
}

/// Payer postal address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAddress {
    /// Street and number.
    pub logradouro: String,
    /// Neighborhood.
    pub bairro: String,
    /// City.
    pub cidade: String,
    /// Two-letter state code.
    pub uf: String,
    /// Postal code, digits only.
    pub cep: String,
}

/// Payer block of the registration request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPayer {
    /// Name, cut to the API's length limit.
    pub nome_razao_social: String,
    /// `F` for individuals, `J` for companies.
    pub tipo_pessoa: String,
    /// CPF or CNPJ digits.
    pub numero_documento: String,
    /// Trade name, for companies.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nome_fantasia: Option<String>,
    /// Contact e-mail.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Postal address.
    pub endereco: ApiAddress,
}

/// A dated charge or rebate (discount, fine, interest).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCharge {
    /// Charge type indicator; `0` is a fixed value.
    pub indicador: String,
    /// Limit date, `YYYY-MM-DD`.
    pub data_limite: String,
    /// Amount or percentage.
    pub valor: Decimal2,
}

/// Registration request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSlipRequest {
    /// Beneficiary's document number.
    pub seu_numero: String,
    /// Face value.
    pub valor: Decimal2,
    /// Due date, `YYYY-MM-DD`.
    pub vencimento: String,
    /// Our-number with its check character.
    pub nosso_numero: String,
    /// Wallet variation code; sent as `null` when the record has none.
    pub beneficiario_variacao_carteira: Option<String>,
    /// Payer block.
    pub pagador: ApiPayer,
    /// Instruction lines printed on the slip.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mensagens_ficha_compensacao: Vec<String>,
    /// Early payment discount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub desconto: Option<ApiCharge>,
    /// Late payment fine.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub multa: Option<ApiCharge>,
    /// Daily late interest.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub juros: Option<ApiCharge>,
}

/// Slip as returned by the API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSlipResponse {
    /// Our-number as registered.
    pub nosso_numero: String,
    /// Typeable line, formatted or bare.
    pub linha_digitavel: String,
    /// Face value.
    pub valor: Decimal2,
    /// `YYYY-MM-DD` or `DD/MM/YYYY`.
    pub data_de_vencimento: String,
    /// Raw lifecycle status; see [`SlipStatus::from_api`].
    pub status: String,
}

/// A slip reconstructed from an API response.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredSlip {
    /// Record rebuilt from the typeable line and response fields.
    pub record: PaymentRecord,
    /// Our-number exactly as the API reported it.
    pub our_number: String,
    /// Mapped lifecycle status.
    pub status: SlipStatus,
}

fn iso(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Builds the registration request for a derived slip.
pub fn to_api(record: &PaymentRecord, slip: &DerivedSlip) -> Result<ApiSlipRequest> {
    let mut missing = Vec::new();
    if record.payer().is_none() {
        missing.push("payer".to_string());
    }
    if record.document_number().is_none() {
        missing.push("document_number".to_string());
    }
    let (Some(payer), Some(due), Some(amount), Some(number)) = (
        record.payer(),
        record.due_date(),
        record.amount(),
        record.document_number(),
    ) else {
        if record.due_date().is_none() {
            missing.push("due_date".to_string());
        }
        if record.amount().is_none() {
            missing.push("amount".to_string());
        }
        return Err(BoletoError::Validation { fields: missing });
    };

    let charge = |until: NaiveDate, value: Decimal2| ApiCharge {
        indicador: "0".to_string(),
        data_limite: iso(until),
        valor: value,
    };

    let desconto = match (record.discount(), record.discount_date()) {
        (Some(value), Some(until)) if !value.is_zero() => Some(charge(until, value)),
        _ => None,
    };
    let multa = record
        .fine()
        .filter(|f| !f.is_zero())
        .map(|value| charge(due + Duration::days(1), value));
    let interest_delay = i64::from(record.interest_after_days().max(1));
    let juros = record
        .interest()
        .filter(|i| !i.is_zero())
        .map(|value| charge(due + Duration::days(interest_delay), value));

    Ok(ApiSlipRequest {
        seu_numero: number.to_string(),
        valor: amount,
        vencimento: iso(due),
        nosso_numero: slip.our_number.to_string(),
        beneficiario_variacao_carteira: record.wallet_variation().map(str::to_string),
        pagador: ApiPayer {
            nome_razao_social: payer.name.chars().take(API_NAME_LEN).collect(),
            tipo_pessoa: payer.kind().letter().to_string(),
            numero_documento: payer.document_digits(),
            nome_fantasia: payer.trade_name.clone(),
            email: payer.email.clone(),
            endereco: ApiAddress {
                logradouro: payer.address.clone(),
                bairro: payer.neighborhood.clone(),
                cidade: payer.city.clone(),
                uf: payer.state.clone(),
                cep: crate::layout::only_digits(&payer.postal_code),
            },
        },
        mensagens_ficha_compensacao: record.instructions().to_vec(),
        desconto,
        multa,
        juros,
    })
}

/// Serializes the registration request as JSON.
pub fn to_api_json(record: &PaymentRecord, slip: &DerivedSlip) -> Result<String> {
    Ok(serde_json::to_string(&to_api(record, slip)?)?)
}

/// Rebuilds a record from an API response.
///
/// The wallet is recovered from the typeable line's free field, falling back
/// to the bank's first allowed wallet when it is not one the bank accepts.
pub fn from_api(
    profile: &dyn BankProfile,
    response: &ApiSlipResponse,
    account: BankAccount,
) -> Result<RegisteredSlip> {
    let due = NaiveDate::parse_from_str(&response.data_de_vencimento, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(&response.data_de_vencimento, "%d/%m/%Y"))
        .map_err(|_| BoletoError::invalid(format!("due_date {:?}", response.data_de_vencimento)))?;

    let barcode = TypeableLine::parse(&response.linha_digitavel)?.to_barcode()?;
    let parts = profile.parse_free_field(barcode.free_field())?;
    let embedded = parts.wallet.trim_start_matches('0');
    let wallet = profile
        .allowed_wallets()
        .iter()
        .find(|w| **w == embedded)
        .or_else(|| profile.allowed_wallets().first())
        .copied()
        .ok_or_else(|| BoletoError::invalid("wallet"))?;

    let document_number = parts.our_number.trim_start_matches('0');
    let record = PaymentRecord::builder(profile)
        .wallet(wallet)?
        .account(account)
        .document_number(if document_number.is_empty() { "0" } else { document_number })
        .due_date(due)
        .amount(response.valor)
        .build();

    Ok(RegisteredSlip {
        record,
        our_number: response.nosso_numero.clone(),
        status: SlipStatus::from_api(&response.status),
    })
}

/// Parses an API response body and rebuilds the record.
pub fn from_api_json(
    profile: &dyn BankProfile,
    body: &str,
    account: BankAccount,
) -> Result<RegisteredSlip> {
    let response: ApiSlipResponse = serde_json::from_str(body)?;
    from_api(profile, &response, account)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::banks::Sisprime;
    use crate::party::Payer;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record() -> PaymentRecord {
        PaymentRecord::builder(&Sisprime)
            .wallet("9")
            .unwrap()
            .account(BankAccount::new("1234", "1234567"))
            .document_number("1")
            .due_date(date(2026, 11, 30))
            .amount(Decimal2::from_str("123.45").unwrap())
            .fine(Decimal2::from_str("2.00").unwrap())
            .interest(Decimal2::from_str("0.15").unwrap(), 3)
            .instructions(vec![Some(" Do not accept after due date "), None])
            .payer(Payer {
                name: "Companhia de Comércio e Indústria Paulista Reunida SA".to_string(),
                document: "12.345.678/0001-95".to_string(),
                city: "Londrina".to_string(),
                postal_code: "86010-000".to_string(),
                ..Payer::default()
            })
            .build()
    }

    #[test]
    fn test_status_table() {
        assert_eq!(SlipStatus::from_api("PAID"), SlipStatus::Paid);
        assert_eq!(SlipStatus::from_api("SETTLED"), SlipStatus::Paid);
        assert_eq!(SlipStatus::from_api("WRITTEN_OFF"), SlipStatus::WrittenOff);
        assert_eq!(SlipStatus::from_api("EXPIRED"), SlipStatus::WrittenOff);
        assert_eq!(SlipStatus::from_api("OVERDUE"), SlipStatus::Open);
        assert_eq!(SlipStatus::from_api("OPEN"), SlipStatus::Open);
        assert_eq!(
            SlipStatus::from_api("PROTESTED"),
            SlipStatus::Other("PROTESTED".to_string())
        );
    }

    #[test]
    fn test_to_api_shape() {
        let r = record();
        let slip = r.derive(&Sisprime).unwrap();
        let request = to_api(&r, &slip).unwrap();

        assert_eq!(request.nosso_numero, "00000000018");
        assert_eq!(request.vencimento, "2026-11-30");
        assert_eq!(request.pagador.tipo_pessoa, "J");
        assert_eq!(request.pagador.numero_documento, "12345678000195");
        assert_eq!(request.pagador.nome_razao_social.chars().count(), 40);
        assert_eq!(request.pagador.endereco.cep, "86010000");
        assert_eq!(request.mensagens_ficha_compensacao, ["Do not accept after due date"]);
        assert!(request.desconto.is_none());
        assert_eq!(request.multa.as_ref().unwrap().data_limite, "2026-12-01");
        assert_eq!(request.juros.as_ref().unwrap().data_limite, "2026-12-03");
    }

    #[test]
    fn test_to_api_json_omits_absent_blocks() {
        let r = record();
        let slip = r.derive(&Sisprime).unwrap();
        let json: serde_json::Value =
            serde_json::from_str(&to_api_json(&r, &slip).unwrap()).unwrap();
        assert_eq!(json["valor"], "123.45");
        assert_eq!(json["seuNumero"], "1");
        assert!(json.get("desconto").is_none());
        assert_eq!(json["multa"]["valor"], "2.00");
        assert!(json["beneficiarioVariacaoCarteira"].is_null());
    }

    #[test]
    fn test_to_api_sends_wallet_variation() {
        let r = PaymentRecord::builder(&Sisprime)
            .wallet("9")
            .unwrap()
            .wallet_variation(" 019 ")
            .account(BankAccount::new("1234", "1234567"))
            .document_number("1")
            .due_date(date(2026, 11, 30))
            .amount(Decimal2::from_str("123.45").unwrap())
            .payer(Payer::default())
            .build();
        let slip = r.derive(&Sisprime).unwrap();

        let request = to_api(&r, &slip).unwrap();
        assert_eq!(request.beneficiario_variacao_carteira.as_deref(), Some("019"));

        let json: serde_json::Value =
            serde_json::from_str(&to_api_json(&r, &slip).unwrap()).unwrap();
        assert_eq!(json["beneficiarioVariacaoCarteira"], "019");
    }

    #[test]
    fn test_from_api_recovers_record() {
        let body = r#"{
            "nossoNumero": "00000000018",
            "linhaDigitavel": "08491.23401 90000.000001 01123.456707 9 16460000012345",
            "valor": "123.45",
            "dataDeVencimento": "30/11/2026",
            "status": "SETTLED"
        }"#;
        let registered =
            from_api_json(&Sisprime, body, BankAccount::new("1234", "1234567")).unwrap();

        assert_eq!(registered.status, SlipStatus::Paid);
        assert_eq!(registered.record.wallet(), Some("9"));
        assert_eq!(registered.record.due_date(), Some(date(2026, 11, 30)));
        assert_eq!(registered.record.document_number(), Some("1"));

        let slip = registered.record.derive(&Sisprime).unwrap();
        assert_eq!(slip.our_number.to_string(), registered.our_number);
    }

    #[test]
    fn test_from_api_rejects_bad_line() {
        let response = ApiSlipResponse {
            nosso_numero: "00000000018".to_string(),
            linha_digitavel: "123".to_string(),
            valor: Decimal2::ZERO,
            data_de_vencimento: "2026-11-30".to_string(),
            status: "OPEN".to_string(),
        };
        assert!(from_api(&Sisprime, &response, BankAccount::default()).is_err());
    }
}
