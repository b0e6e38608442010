use std::collections::{HashMap, hash_map::Entry};

use rust_decimal::Decimal;
use tracing::debug;

use crate::listing::{ListingError, StockListing};

/// Registry of every listing, keyed by ticker symbol.
///
/// Listings are only handed out by shared reference; all mutation goes
/// through the exchange so the listing's own checks cannot be bypassed.
#[derive(Debug, Default)]
pub struct StockExchange {
    stocks: HashMap<String, StockListing>,
}

impl StockExchange {
    pub fn create_new_listing(
        &mut self,
        ticker_symbol: &str,
        initial_price: Decimal,
        available_shares: u32,
    ) -> Result<(), ListingError> {
        let Entry::Vacant(entry) = self.stocks.entry(ticker_symbol.to_owned()) else {
            return Err(ListingError::DuplicateSymbol {
                symbol: ticker_symbol.to_owned(),
            });
        };
        entry.insert(StockListing::new(
            ticker_symbol,
            initial_price,
            available_shares,
        )?);
        debug!(symbol = ticker_symbol, %initial_price, available_shares, "listing created");
        Ok(())
    }

    pub fn stock_listing(&self, ticker_symbol: &str) -> Option<&StockListing> {
        self.stocks.get(ticker_symbol)
    }

    /// Snapshot of all listings, ordered by ticker symbol.
    pub fn all_current_listings(&self) -> Vec<&StockListing> {
        let mut listings: Vec<_> = self.stocks.values().collect();
        listings.sort_by(|a, b| a.ticker_symbol().cmp(b.ticker_symbol()));
        listings
    }

    /// Applies an externally decided price change.
    pub fn set_price(&mut self, ticker_symbol: &str, price: Decimal) -> Result<(), ListingError> {
        self.listing_mut(ticker_symbol)?.set_price(price)?;
        debug!(symbol = ticker_symbol, %price, "price changed");
        Ok(())
    }

    pub fn add_available_shares(
        &mut self,
        ticker_symbol: &str,
        shares: u32,
    ) -> Result<u32, ListingError> {
        self.listing_mut(ticker_symbol)?.add_available_shares(shares)
    }

    pub(crate) fn listing_mut(
        &mut self,
        ticker_symbol: &str,
    ) -> Result<&mut StockListing, ListingError> {
        self.stocks
            .get_mut(ticker_symbol)
            .ok_or_else(|| ListingError::UnknownSymbol {
                symbol: ticker_symbol.to_owned(),
            })
    }
}
