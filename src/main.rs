//! Boleto Engine CLI
//!
//! Reads payment rows from CSV and writes either the CNAB400 batch file for
//! the bank or the printable slip data (barcode and typeable line).
//!
//! # Usage
//!
//! ```bash
//! cargo run -- remessa payments.csv > CB191001.REM
//! cargo run -- slips payments.csv > slips.csv
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `BOLETO_BENEFICIARY_NAME`, `BOLETO_BENEFICIARY_DOCUMENT`: sender identity
//! - `BOLETO_AGENCY`, `BOLETO_ACCOUNT`, `BOLETO_ACCOUNT_DV`: beneficiary account
//! - `BOLETO_WALLET`: wallet printed in the batch
//! - `BOLETO_REMESSA_ID`: batch sequence number
//! - `BOLETO_REMESSA_DATE`: header date as `YYYY-MM-DD` (defaults to today)
//! - `BOLETO_CLIENT_CODE`: bank-assigned client code, when the bank issued one

use boleto_engine::{config, BoletoEngine, BoletoError, Result, Sisprime};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        return Err(BoletoError::MissingArgument);
    }

    let command = args[1].as_str();
    if command != "remessa" && command != "slips" {
        return Err(BoletoError::UnknownCommand(command.to_string()));
    }

    let settings = config::from_env()?;
    let file = File::open(&args[2])?;
    let reader = BufReader::new(file);

    let mut engine = BoletoEngine::new(Sisprime, settings);
    engine.process_csv(reader)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    if command == "remessa" {
        engine.write_remessa(handle)?;
    } else {
        engine.write_slips(handle)?;
    }

    Ok(())
}
