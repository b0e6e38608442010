use std::hash::{Hash, Hasher};

use rust_decimal::{Decimal, prelude::Zero};
use thiserror::Error;

use crate::{error::ErrorKind, exchange::StockExchange};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ListingError {
    #[error("Ticker symbol cannot be empty")]
    EmptySymbol,
    #[error("Price must be positive, got {price}")]
    NonPositivePrice { price: Decimal },
    #[error("Share count must be positive")]
    NonPositiveShares,
    #[error("Cannot take {requested} shares of {symbol}, only {available} available")]
    NotEnoughShares {
        symbol: String,
        requested: u32,
        available: u32,
    },
    #[error("Adding {added} shares to {symbol} exceeds the share limit")]
    TooManyShares { symbol: String, added: u32 },
    #[error("There already exists a listing for {symbol}")]
    DuplicateSymbol { symbol: String },
    #[error("{symbol} is not listed")]
    UnknownSymbol { symbol: String },
}

impl ListingError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::InvalidArgument
    }
}

/// A single tradable instrument on the exchange.
///
/// Identity is the ticker symbol alone: two listings with the same symbol
/// compare and hash equal whatever their price or availability.
#[derive(Debug, Clone)]
pub struct StockListing {
    ticker_symbol: String,
    price: Decimal,
    available_shares: u32,
}

impl StockListing {
    pub(crate) fn new(
        ticker_symbol: &str,
        initial_price: Decimal,
        available_shares: u32,
    ) -> Result<Self, ListingError> {
        if ticker_symbol.is_empty() {
            return Err(ListingError::EmptySymbol);
        }
        if initial_price <= Decimal::zero() {
            return Err(ListingError::NonPositivePrice {
                price: initial_price,
            });
        }
        if available_shares == 0 {
            return Err(ListingError::NonPositiveShares);
        }
        Ok(Self {
            ticker_symbol: ticker_symbol.to_owned(),
            price: initial_price,
            available_shares,
        })
    }

    pub fn ticker_symbol(&self) -> &str {
        &self.ticker_symbol
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn available_shares(&self) -> u32 {
        self.available_shares
    }

    pub(crate) fn set_price(&mut self, price: Decimal) -> Result<(), ListingError> {
        if price <= Decimal::zero() {
            return Err(ListingError::NonPositivePrice { price });
        }
        self.price = price;
        Ok(())
    }

    /// Returns the number of available shares after the addition.
    pub(crate) fn add_available_shares(&mut self, shares: u32) -> Result<u32, ListingError> {
        if shares == 0 {
            return Err(ListingError::NonPositiveShares);
        }
        self.available_shares = self.available_shares.checked_add(shares).ok_or_else(|| {
            ListingError::TooManyShares {
                symbol: self.ticker_symbol.clone(),
                added: shares,
            }
        })?;
        Ok(self.available_shares)
    }

    /// Returns the number of available shares after the reduction.
    pub(crate) fn reduce_available_shares(&mut self, shares: u32) -> Result<u32, ListingError> {
        if shares > self.available_shares {
            return Err(ListingError::NotEnoughShares {
                symbol: self.ticker_symbol.clone(),
                requested: shares,
                available: self.available_shares,
            });
        }
        self.available_shares -= shares;
        Ok(self.available_shares)
    }
}

impl PartialEq for StockListing {
    fn eq(&self, other: &Self) -> bool {
        self.ticker_symbol == other.ticker_symbol
    }
}

impl Eq for StockListing {}

impl Hash for StockListing {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.ticker_symbol.hash(state);
    }
}

/// How many shares of one listing a brokerage account holds.
///
/// The listing is referenced by symbol, so any number of holdings across
/// accounts may point at the same listing. Quantity may drop to zero after a
/// full sell; the record is kept.
#[derive(Debug, Clone)]
pub struct StockShares {
    symbol: String,
    quantity: u32,
}

impl StockShares {
    pub(crate) fn new(symbol: &str, quantity: u32) -> Self {
        Self {
            symbol: symbol.to_owned(),
            quantity,
        }
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub(crate) fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }

    pub fn listing<'e>(&self, exchange: &'e StockExchange) -> Option<&'e StockListing> {
        exchange.stock_listing(&self.symbol)
    }

    /// Quantity times the listing's current price; zero if the listing is gone.
    /// Saturates at `Decimal::MAX`.
    pub fn value(&self, exchange: &StockExchange) -> Decimal {
        self.listing(exchange)
            .map(|listing| listing.price().saturating_mul(Decimal::from(self.quantity)))
            .unwrap_or_default()
    }
}

impl PartialEq for StockShares {
    fn eq(&self, other: &Self) -> bool {
        self.symbol == other.symbol
    }
}

impl Eq for StockShares {}

impl Hash for StockShares {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.hash(state);
    }
}
