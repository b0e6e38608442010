use std::time::Instant;

use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::{error::ErrorKind, listing::StockListing};

/// Every transaction type known to the bank, cash and stock alike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TxType {
    Deposit,
    Withdraw,
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CashAction {
    Deposit,
    Withdraw,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockAction {
    Buy,
    Sell,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidTransaction {
    #[error("{kind:?} is not a cash transaction type")]
    NotCashType { kind: TxType },
    #[error("{kind:?} is not a stock transaction type")]
    NotStockType { kind: TxType },
    #[error("Amount must be positive for {kind:?}")]
    NonPositiveAmount { kind: TxType },
    #[error("Quantity must be positive for {kind:?}")]
    ZeroQuantity { kind: TxType },
    #[error("Listing is required for {kind:?}")]
    MissingListing { kind: TxType },
    #[error("{kind:?} must be a cash transaction to run on a savings account")]
    NotCashTransaction { kind: TxType },
    #[error("Not enough available shares of {symbol}: requested {requested}, available {available}")]
    NotEnoughAvailableShares {
        symbol: String,
        requested: u32,
        available: u32,
    },
    #[error("{symbol} is not listed on the exchange")]
    UnknownListing { symbol: String },
    #[error("{kind:?} amount is out of range")]
    AmountOverflow { kind: TxType },
    #[error("Holding of {symbol} cannot grow by {quantity} more shares")]
    HoldingOverflow { symbol: String, quantity: u32 },
}

impl InvalidTransaction {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidTransaction
    }
}

/// Cash moving in or out of a savings account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CashTransaction {
    action: CashAction,
    amount: Decimal,
    timestamp: Instant,
}

impl CashTransaction {
    pub fn new(kind: TxType, amount: Decimal) -> Result<Self, InvalidTransaction> {
        let action = match kind {
            TxType::Deposit => CashAction::Deposit,
            TxType::Withdraw => CashAction::Withdraw,
            TxType::Buy | TxType::Sell => return Err(InvalidTransaction::NotCashType { kind }),
        };
        if amount <= Decimal::zero() {
            return Err(InvalidTransaction::NonPositiveAmount { kind });
        }
        Ok(Self {
            action,
            amount,
            timestamp: Instant::now(),
        })
    }

    pub fn action(&self) -> CashAction {
        self.action
    }

    pub fn kind(&self) -> TxType {
        match self.action {
            CashAction::Deposit => TxType::Deposit,
            CashAction::Withdraw => TxType::Withdraw,
        }
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

/// Shares of one listing being bought or sold.
///
/// Only the ticker symbol of the listing is kept; price and availability are
/// read from the exchange at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockTransaction {
    symbol: String,
    action: StockAction,
    quantity: u32,
    timestamp: Instant,
}

impl StockTransaction {
    pub fn new(
        listing: Option<&StockListing>,
        kind: TxType,
        quantity: u32,
    ) -> Result<Self, InvalidTransaction> {
        let action = match kind {
            TxType::Buy => StockAction::Buy,
            TxType::Sell => StockAction::Sell,
            TxType::Deposit | TxType::Withdraw => {
                return Err(InvalidTransaction::NotStockType { kind });
            }
        };
        if quantity == 0 {
            return Err(InvalidTransaction::ZeroQuantity { kind });
        }
        let Some(listing) = listing else {
            return Err(InvalidTransaction::MissingListing { kind });
        };
        Ok(Self {
            symbol: listing.ticker_symbol().to_owned(),
            action,
            quantity,
            timestamp: Instant::now(),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn action(&self) -> StockAction {
        self.action
    }

    pub fn kind(&self) -> TxType {
        match self.action {
            StockAction::Buy => TxType::Buy,
            StockAction::Sell => TxType::Sell,
        }
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Cash(CashTransaction),
    Stock(StockTransaction),
}

impl Transaction {
    pub fn kind(&self) -> TxType {
        match self {
            Transaction::Cash(tx) => tx.kind(),
            Transaction::Stock(tx) => tx.kind(),
        }
    }

    pub fn timestamp(&self) -> Instant {
        match self {
            Transaction::Cash(tx) => tx.timestamp(),
            Transaction::Stock(tx) => tx.timestamp(),
        }
    }
}

impl From<CashTransaction> for Transaction {
    fn from(tx: CashTransaction) -> Self {
        Transaction::Cash(tx)
    }
}

impl From<StockTransaction> for Transaction {
    fn from(tx: StockTransaction) -> Self {
        Transaction::Stock(tx)
    }
}
