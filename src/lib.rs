//! # Boleto Engine
//!
//! Builds Brazilian bank payment slips ("boletos"): the 44-digit barcode, the
//! 47-digit typeable line and the CNAB400 batch file ("remessa") that
//! registers the slips with the bank.
//!
//! ## Design Principles
//!
//! - **Bank-agnostic core**: barcode and batch assembly only talk to a
//!   [`BankProfile`]; each bank contributes wallets, check rules and layouts
//! - **Immutable records**: a [`PaymentRecord`] is built once and derived
//!   outputs come back as a separate [`DerivedSlip`]
//! - **Fixed-point amounts**: 2 decimal places via `rust_decimal`
//! - **All-or-nothing lines**: a batch line is only appended once every
//!   column rendered
//!
//! ## Example
//!
//! ```no_run
//! use boleto_engine::{BankAccount, PaymentRecord, Sisprime, Decimal2};
//! use chrono::NaiveDate;
//!
//! let record = PaymentRecord::builder(&Sisprime)
//!     .wallet("9")
//!     .unwrap()
//!     .account(BankAccount::new("1234", "1234567"))
//!     .document_number("1")
//!     .due_date(NaiveDate::from_ymd_opt(2026, 11, 30).unwrap())
//!     .amount("123.45".parse::<Decimal2>().unwrap())
//!     .build();
//! let slip = record.derive(&Sisprime).unwrap();
//! println!("{}", slip.typeable_line.formatted());
//! ```

pub mod api;
pub mod banks;
pub mod barcode;
pub mod checksum;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod error;
pub mod input;
pub mod layout;
pub mod party;
pub mod profile;
pub mod record;
pub mod remessa;

pub use banks::Sisprime;
pub use barcode::{Barcode, DerivedSlip, TypeableLine};
pub use decimal::Decimal2;
pub use engine::BoletoEngine;
pub use error::{BoletoError, Result};
pub use party::{BankAccount, Beneficiary, Payer, PersonKind};
pub use profile::BankProfile;
pub use record::{BatchOperation, DocumentKind, OurNumber, PaymentRecord};
pub use remessa::{assemble, BatchSettings, RemessaAssembler, RemessaFile};
