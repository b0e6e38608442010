//! Drives an [`InMemoryBank`] from a CSV scenario. Lives in the library so the
//! integration test can run the exact same code as the binary.

use std::io::{Read, Write};

use anyhow::{Context, Result};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;

use crate::{
    account::Account,
    bank::{AccountType, Bank, BankError, in_memory_bank::InMemoryBank},
    error::ErrorKind,
    listing::ListingError,
    patron::PatronId,
    transaction::{CashTransaction, InvalidTransaction, StockTransaction, Transaction, TxType},
};
use csv_parser::{CsvScenarioParser, Operation, Row};
pub mod csv_parser;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Malformed row: {0}")]
    Parse(#[from] csv::Error),
    #[error("Column `{column}` is required for {op:?}")]
    MissingColumn {
        op: Operation,
        column: &'static str,
    },
    #[error(transparent)]
    Transaction(#[from] InvalidTransaction),
    #[error(transparent)]
    Listing(#[from] ListingError),
    #[error(transparent)]
    Bank(#[from] BankError),
}

impl ScenarioError {
    /// Classification of rejected operations; `None` for malformed input.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ScenarioError::Parse(_) | ScenarioError::MissingColumn { .. } => None,
            ScenarioError::Transaction(err) => Some(err.kind()),
            ScenarioError::Listing(err) => Some(err.kind()),
            ScenarioError::Bank(err) => Some(err.kind()),
        }
    }
}

/// One line of the final report. Absent accounts are left empty.
#[derive(Debug, Serialize)]
pub struct PatronSummary {
    pub patron: PatronId,
    pub savings: Option<Decimal>,
    pub brokerage: Option<Decimal>,
    pub net_worth: Decimal,
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub error_printer: Box<dyn FnMut(u64, ScenarioError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvScenarioParser::new(self.input);

        let mut bank = InMemoryBank::default();

        for (line, row) in parser {
            if let Err(err) = row
                .map_err(ScenarioError::from)
                .and_then(|row| apply_row(&mut bank, row))
            {
                (self.error_printer)(line, err);
            }
        }

        let exchange = bank.exchange();
        let mut writer = Writer::from_writer(self.output);
        for patron in bank.all_patrons() {
            writer
                .serialize(PatronSummary {
                    patron: patron.id(),
                    savings: patron
                        .savings_account()
                        .map(|acc| acc.value(exchange).normalize()),
                    brokerage: patron
                        .brokerage_account()
                        .map(|acc| acc.value(exchange).normalize()),
                    net_worth: patron.net_worth(exchange).normalize(),
                })
                .with_context(|| format!("Failed to write patron {} to CSV", patron.id()))?;
        }
        writer.flush().context("Failed to flush CSV writer")?;
        Ok(())
    }
}

fn apply_row(bank: &mut InMemoryBank, row: Row) -> Result<(), ScenarioError> {
    let op = row.op;
    let missing = |column| ScenarioError::MissingColumn { op, column };
    match op {
        Operation::List => {
            let symbol = row.symbol.ok_or_else(|| missing("symbol"))?;
            let price = row.amount.ok_or_else(|| missing("amount"))?;
            let shares = row.quantity.ok_or_else(|| missing("quantity"))?;
            bank.exchange_mut()
                .create_new_listing(&symbol, price, shares)?;
        }
        Operation::Price => {
            let symbol = row.symbol.ok_or_else(|| missing("symbol"))?;
            let price = row.amount.ok_or_else(|| missing("amount"))?;
            bank.exchange_mut().set_price(&symbol, price)?;
        }
        Operation::Supply => {
            let symbol = row.symbol.ok_or_else(|| missing("symbol"))?;
            let shares = row.quantity.ok_or_else(|| missing("quantity"))?;
            bank.exchange_mut().add_available_shares(&symbol, shares)?;
        }
        Operation::Patron => {
            bank.create_new_patron();
        }
        Operation::OpenSavings => {
            let patron = row.patron.ok_or_else(|| missing("patron"))?;
            bank.open_new_savings_account(patron)?;
        }
        Operation::OpenBrokerage => {
            let patron = row.patron.ok_or_else(|| missing("patron"))?;
            bank.open_new_brokerage_account(patron)?;
        }
        Operation::Deposit | Operation::Withdraw => {
            let patron = row.patron.ok_or_else(|| missing("patron"))?;
            let amount = row.amount.ok_or_else(|| missing("amount"))?;
            let kind = if op == Operation::Deposit {
                TxType::Deposit
            } else {
                TxType::Withdraw
            };
            let tx = CashTransaction::new(kind, amount)?;
            bank.execute_transaction(patron, AccountType::Savings, tx.into())?;
        }
        Operation::Buy | Operation::Sell => {
            let patron = row.patron.ok_or_else(|| missing("patron"))?;
            let symbol = row.symbol.ok_or_else(|| missing("symbol"))?;
            let quantity = row.quantity.ok_or_else(|| missing("quantity"))?;
            let kind = if op == Operation::Buy {
                TxType::Buy
            } else {
                TxType::Sell
            };
            let tx: Transaction =
                StockTransaction::new(bank.exchange().stock_listing(&symbol), kind, quantity)?
                    .into();
            bank.execute_transaction(patron, AccountType::Brokerage, tx)?;
        }
    }
    Ok(())
}
