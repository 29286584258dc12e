//! Batch processing engine.
//!
//! Reads payment rows in file order, derives each slip as soon as its row is
//! read and keeps the accepted ones for output. Invalid rows are logged and
//! skipped so one bad row never blocks the rest of the batch.

use crate::barcode::DerivedSlip;
use crate::error::{BoletoError, Result};
use crate::input::PaymentRow;
use crate::profile::BankProfile;
use crate::record::PaymentRecord;
use crate::remessa::{BatchSettings, RemessaAssembler};
use csv::{ReaderBuilder, Trim};
use log::{debug, info, warn};
use std::collections::HashSet;
use std::io::{Read, Write};

/// Accepted record together with its derived slip.
#[derive(Debug, Clone)]
pub struct AcceptedPayment {
    /// 1-based input row, counting the CSV header.
    pub row: usize,
    /// Record built from the row.
    pub record: PaymentRecord,
    /// Slip derived from the record.
    pub slip: DerivedSlip,
}

/// Slip and batch engine for one bank and one batch.
///
/// # Output Ordering
///
/// Slips and detail lines are written in input order.
pub struct BoletoEngine<P: BankProfile> {
    profile: P,
    settings: BatchSettings,

    accepted: Vec<AcceptedPayment>,

    /// Our-numbers already issued in this batch.
    issued: HashSet<String>,
}

impl<P: BankProfile> BoletoEngine<P> {
    /// Creates an engine with no payments.
    pub fn new(profile: P, settings: BatchSettings) -> Self {
        BoletoEngine {
            profile,
            settings,
            accepted: Vec::new(),
            issued: HashSet::new(),
        }
    }

    /// Payments accepted so far.
    pub fn accepted(&self) -> &[AcceptedPayment] {
        &self.accepted
    }

    /// Reads payment rows from a CSV reader in streaming fashion.
    ///
    /// Invalid rows are logged at warn level and skipped.
    pub fn process_csv<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut csv_reader = ReaderBuilder::new()
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        for (row_idx, result) in csv_reader.deserialize::<PaymentRow>().enumerate() {
            let row_num = row_idx + 2; // 1-indexed, accounting for header row

            match result {
                Ok(row) => {
                    if let Err(e) = self.process_row(&row, row_num) {
                        warn!("{}", e);
                    }
                }
                Err(e) => {
                    warn!("Row {}: CSV parse error: {}", row_num, e);
                }
            }
        }

        info!(
            "Accepted {} payments for bank {}",
            self.accepted.len(),
            self.profile.bank_code()
        );
        Ok(())
    }

    fn process_row(&mut self, row: &PaymentRow, row_num: usize) -> Result<()> {
        row.to_record(&self.profile, &self.settings.account)
            .and_then(|record| self.add_record(record, row_num))
            .map_err(|e| BoletoError::InvalidRecord {
                row: row_num,
                message: e.to_string(),
            })
    }

    /// Derives `record` and keeps it for output.
    ///
    /// A record whose our-number was already issued in this batch is
    /// ignored with a warning.
    pub fn add_record(&mut self, record: PaymentRecord, row: usize) -> Result<()> {
        let slip = record.derive(&self.profile)?;

        let key = slip.our_number.to_string();
        if self.issued.contains(&key) {
            warn!("Row {}: Duplicate our number {}, ignoring", row, key);
            return Ok(());
        }

        debug!("Row {}: Derived slip {}", row, slip.barcode);
        self.issued.insert(key);
        self.accepted.push(AcceptedPayment { row, record, slip });
        Ok(())
    }

    /// Writes the CNAB400 batch file for every accepted payment.
    ///
    /// Payments the bank cannot put in a detail line (missing payer data,
    /// for instance) are logged and left out; the trailer counts only the
    /// lines actually written. Returns the number of detail lines.
    pub fn write_remessa<W: Write>(&self, writer: W) -> Result<usize> {
        let mut assembler = RemessaAssembler::new(&self.profile, self.settings.clone())?;

        for payment in &self.accepted {
            if let Err(e) = assembler.add_derived(&payment.record, &payment.slip) {
                warn!("Row {}: Left out of remessa: {}", payment.row, e);
            }
        }

        let file = assembler.finish()?;
        file.write_to(writer)?;
        Ok(file.detail_count())
    }

    /// Writes one CSV line per accepted payment with its printable slip data.
    pub fn write_slips<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "document_number",
            "our_number",
            "due_date",
            "amount",
            "barcode",
            "typeable_line",
        ])?;

        for payment in &self.accepted {
            let record = &payment.record;
            csv_writer.write_record([
                record.document_number().unwrap_or_default().to_string(),
                payment.slip.our_number.display_form(),
                record
                    .due_date()
                    .map(|d| d.format("%d/%m/%Y").to_string())
                    .unwrap_or_default(),
                record.amount().map(|a| a.to_string()).unwrap_or_default(),
                payment.slip.barcode.to_string(),
                payment.slip.typeable_line.formatted(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(())
    }
}
