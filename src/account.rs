use std::collections::HashMap;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    error::ErrorKind,
    exchange::StockExchange,
    listing::{ListingError, StockShares},
    patron::PatronId,
    transaction::{
        CashAction, CashTransaction, InvalidTransaction, StockAction, StockTransaction,
        Transaction, TxType,
    },
};

pub type AccountNumber = u32;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error(transparent)]
    InvalidTransaction(#[from] InvalidTransaction),
    #[error("{kind:?} must be a stock transaction to run on a brokerage account")]
    NotStockTransaction { kind: TxType },
    #[error("Savings account of patron {owner} cannot settle trades for patron {patron}")]
    ForeignSavingsAccount { patron: PatronId, owner: PatronId },
    #[error("Patron {patron} has insufficient assets for {kind:?}", kind = .transaction.kind())]
    InsufficientAssets {
        transaction: Transaction,
        patron: PatronId,
    },
    #[error(transparent)]
    Listing(#[from] ListingError),
}

impl AccountError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountError::InvalidTransaction(err) => err.kind(),
            AccountError::NotStockTransaction { .. } => ErrorKind::InvalidArgument,
            AccountError::ForeignSavingsAccount { .. } => ErrorKind::InvalidArgument,
            AccountError::InsufficientAssets { .. } => ErrorKind::InsufficientAssets,
            AccountError::Listing(err) => err.kind(),
        }
    }
}

/// State shared by every kind of account.
///
/// The only way to change an account's value is to execute a transaction on
/// it; history is append-only and kept in execution order.
pub trait Account {
    fn account_number(&self) -> AccountNumber;

    fn patron(&self) -> PatronId;

    fn transaction_history(&self) -> &[Transaction];

    fn value(&self, exchange: &StockExchange) -> Decimal;
}

#[derive(Debug)]
pub struct SavingsAccount {
    account_number: AccountNumber,
    patron: PatronId,
    balance: Decimal,
    transactions: Vec<Transaction>,
}

impl SavingsAccount {
    pub(crate) fn new(account_number: AccountNumber, patron: PatronId) -> Self {
        Self {
            account_number,
            patron,
            balance: Decimal::ZERO,
            transactions: Vec::new(),
        }
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Deposits add to the balance, withdrawals subtract from it.
    ///
    /// There is no overdraft check here: callers that must not go negative,
    /// like brokerage purchases, check the balance before withdrawing.
    pub fn execute_transaction(&mut self, tx: Transaction) -> Result<(), AccountError> {
        match tx {
            Transaction::Cash(cash) => {
                let balance = self.balance_after(&cash)?;
                self.settle(cash, balance);
                Ok(())
            }
            Transaction::Stock(stock) => Err(InvalidTransaction::NotCashTransaction {
                kind: stock.kind(),
            }
            .into()),
        }
    }

    /// Balance once `tx` is applied, or an error if it leaves the decimal range.
    pub(crate) fn balance_after(&self, tx: &CashTransaction) -> Result<Decimal, InvalidTransaction> {
        match tx.action() {
            CashAction::Deposit => self.balance.checked_add(tx.amount()),
            CashAction::Withdraw => self.balance.checked_sub(tx.amount()),
        }
        .ok_or(InvalidTransaction::AmountOverflow { kind: tx.kind() })
    }

    /// Records `tx` with the balance computed by [`Self::balance_after`].
    pub(crate) fn settle(&mut self, tx: CashTransaction, balance: Decimal) {
        self.balance = balance;
        debug!(
            account = self.account_number,
            kind = ?tx.kind(),
            amount = %tx.amount(),
            balance = %self.balance,
            "cash transaction executed"
        );
        self.transactions.push(tx.into());
    }
}

impl Account for SavingsAccount {
    fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    fn patron(&self) -> PatronId {
        self.patron
    }

    fn transaction_history(&self) -> &[Transaction] {
        &self.transactions
    }

    fn value(&self, _exchange: &StockExchange) -> Decimal {
        self.balance
    }
}

#[derive(Debug)]
pub struct BrokerageAccount {
    account_number: AccountNumber,
    patron: PatronId,
    shares: HashMap<String, StockShares>,
    transactions: Vec<Transaction>,
}

impl BrokerageAccount {
    pub(crate) fn new(account_number: AccountNumber, patron: PatronId) -> Self {
        Self {
            account_number,
            patron,
            shares: HashMap::new(),
            transactions: Vec::new(),
        }
    }

    /// Every holding of this account, ordered by symbol.
    pub fn list_of_shares(&self) -> Vec<&StockShares> {
        let mut shares: Vec<_> = self.shares.values().collect();
        shares.sort_by(|a, b| a.symbol().cmp(b.symbol()));
        shares
    }

    pub fn holding(&self, symbol: &str) -> Option<&StockShares> {
        self.shares.get(symbol)
    }

    /// Buys or sells shares, settling the cash side on the patron's savings account.
    ///
    /// Every precondition is checked before anything is mutated, so a failed
    /// trade leaves the listing, the savings account and the holdings as they were.
    pub fn execute_transaction(
        &mut self,
        tx: Transaction,
        savings: &mut SavingsAccount,
        exchange: &mut StockExchange,
    ) -> Result<(), AccountError> {
        let stock = match tx {
            Transaction::Stock(stock) => stock,
            Transaction::Cash(cash) => {
                return Err(AccountError::NotStockTransaction { kind: cash.kind() });
            }
        };
        if savings.patron != self.patron {
            return Err(AccountError::ForeignSavingsAccount {
                patron: self.patron,
                owner: savings.patron,
            });
        }
        match stock.action() {
            StockAction::Buy => self.buy(stock, savings, exchange),
            StockAction::Sell => self.sell(stock, savings, exchange),
        }
    }

    fn buy(
        &mut self,
        tx: StockTransaction,
        savings: &mut SavingsAccount,
        exchange: &mut StockExchange,
    ) -> Result<(), AccountError> {
        let listing =
            exchange
                .stock_listing(tx.symbol())
                .ok_or_else(|| InvalidTransaction::UnknownListing {
                    symbol: tx.symbol().to_owned(),
                })?;
        if tx.quantity() > listing.available_shares() {
            return Err(InvalidTransaction::NotEnoughAvailableShares {
                symbol: tx.symbol().to_owned(),
                requested: tx.quantity(),
                available: listing.available_shares(),
            }
            .into());
        }
        let cost = listing
            .price()
            .checked_mul(Decimal::from(tx.quantity()))
            .ok_or(InvalidTransaction::AmountOverflow { kind: tx.kind() })?;
        if savings.balance() < cost {
            warn!(
                patron = self.patron,
                symbol = tx.symbol(),
                %cost,
                balance = %savings.balance(),
                "buy rejected, not enough cash"
            );
            return Err(AccountError::InsufficientAssets {
                transaction: tx.into(),
                patron: self.patron,
            });
        }
        let withdrawal = CashTransaction::new(TxType::Withdraw, cost)?;
        let balance = savings.balance_after(&withdrawal)?;
        let held = self
            .shares
            .get(tx.symbol())
            .map_or(0, StockShares::quantity)
            .checked_add(tx.quantity())
            .ok_or_else(|| InvalidTransaction::HoldingOverflow {
                symbol: tx.symbol().to_owned(),
                quantity: tx.quantity(),
            })?;

        exchange
            .listing_mut(tx.symbol())?
            .reduce_available_shares(tx.quantity())?;
        savings.settle(withdrawal, balance);
        self.shares
            .entry(tx.symbol().to_owned())
            .or_insert_with(|| StockShares::new(tx.symbol(), 0))
            .set_quantity(held);

        debug!(
            account = self.account_number,
            symbol = tx.symbol(),
            quantity = tx.quantity(),
            %cost,
            "shares bought"
        );
        self.transactions.push(tx.into());
        Ok(())
    }

    fn sell(
        &mut self,
        tx: StockTransaction,
        savings: &mut SavingsAccount,
        exchange: &StockExchange,
    ) -> Result<(), AccountError> {
        // absence of a holding is the same as holding nothing
        let held = self
            .shares
            .get(tx.symbol())
            .map_or(0, StockShares::quantity);
        if held < tx.quantity() {
            warn!(
                patron = self.patron,
                symbol = tx.symbol(),
                requested = tx.quantity(),
                held,
                "sell rejected, not enough shares"
            );
            return Err(AccountError::InsufficientAssets {
                transaction: tx.into(),
                patron: self.patron,
            });
        }
        let price = exchange
            .stock_listing(tx.symbol())
            .ok_or_else(|| InvalidTransaction::UnknownListing {
                symbol: tx.symbol().to_owned(),
            })?
            .price();
        let proceeds = price
            .checked_mul(Decimal::from(tx.quantity()))
            .ok_or(InvalidTransaction::AmountOverflow { kind: tx.kind() })?;
        let deposit = CashTransaction::new(TxType::Deposit, proceeds)?;
        let balance = savings.balance_after(&deposit)?;

        if let Some(holding) = self.shares.get_mut(tx.symbol()) {
            holding.set_quantity(held - tx.quantity());
        }
        savings.settle(deposit, balance);

        debug!(
            account = self.account_number,
            symbol = tx.symbol(),
            quantity = tx.quantity(),
            %proceeds,
            "shares sold"
        );
        self.transactions.push(tx.into());
        Ok(())
    }
}

impl Account for BrokerageAccount {
    fn account_number(&self) -> AccountNumber {
        self.account_number
    }

    fn patron(&self) -> PatronId {
        self.patron
    }

    fn transaction_history(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Sum of every holding at its listing's current price, saturating at `Decimal::MAX`.
    fn value(&self, exchange: &StockExchange) -> Decimal {
        self.shares
            .values()
            .fold(Decimal::ZERO, |total, shares| {
                total.saturating_add(shares.value(exchange))
            })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::prelude::{FromPrimitive, Zero};

    use super::*;

    const PATRON: PatronId = 7;

    fn dec(value: u32) -> Decimal {
        Decimal::from_u32(value).unwrap()
    }

    fn deposit(amount: Decimal) -> Transaction {
        CashTransaction::new(TxType::Deposit, amount).unwrap().into()
    }

    fn trade(exchange: &StockExchange, kind: TxType, quantity: u32) -> Transaction {
        StockTransaction::new(exchange.stock_listing("ACME"), kind, quantity)
            .unwrap()
            .into()
    }

    /// ACME listed at 10 with 100 shares, a savings account holding 50 and an
    /// empty brokerage account.
    fn setup() -> (StockExchange, SavingsAccount, BrokerageAccount) {
        let mut exchange = StockExchange::default();
        exchange.create_new_listing("ACME", dec(10), 100).unwrap();
        let mut savings = SavingsAccount::new(1, PATRON);
        savings.execute_transaction(deposit(dec(50))).unwrap();
        (exchange, savings, BrokerageAccount::new(2, PATRON))
    }

    #[test]
    fn savings_deposit_and_withdraw() {
        let exchange = StockExchange::default();
        let mut acc = SavingsAccount::new(1, PATRON);
        acc.execute_transaction(deposit(dec(13))).unwrap();
        assert_eq!(acc.value(&exchange), dec(13));

        let withdraw = CashTransaction::new(TxType::Withdraw, dec(5)).unwrap();
        acc.execute_transaction(withdraw.into()).unwrap();
        assert_eq!(acc.balance(), dec(8));

        // no overdraft protection at this layer
        let withdraw = CashTransaction::new(TxType::Withdraw, dec(10)).unwrap();
        acc.execute_transaction(withdraw.into()).unwrap();
        assert_eq!(acc.balance(), Decimal::from_i32(-2).unwrap());

        let kinds: Vec<_> = acc
            .transaction_history()
            .iter()
            .map(Transaction::kind)
            .collect();
        assert_eq!(kinds, [TxType::Deposit, TxType::Withdraw, TxType::Withdraw]);
        assert_eq!(acc.account_number(), 1);
        assert_eq!(Account::patron(&acc), PATRON);
    }

    #[test]
    fn savings_rejects_stock_transaction() {
        let (exchange, mut savings, _) = setup();
        let err = savings
            .execute_transaction(trade(&exchange, TxType::Buy, 1))
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::NotCashTransaction {
                kind: TxType::Buy
            })
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidTransaction);
        assert_eq!(savings.balance(), dec(50));
        assert_eq!(savings.transaction_history().len(), 1);
    }

    #[test]
    fn brokerage_rejects_cash_transaction() {
        let (mut exchange, mut savings, mut brokerage) = setup();
        let err = brokerage
            .execute_transaction(deposit(dec(1)), &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::NotStockTransaction {
                kind: TxType::Deposit
            }
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!(brokerage.transaction_history().is_empty());
    }

    #[test]
    fn brokerage_rejects_foreign_savings() {
        let (mut exchange, _, mut brokerage) = setup();
        let mut other = SavingsAccount::new(3, PATRON + 1);
        other.execute_transaction(deposit(dec(100))).unwrap();
        let tx = trade(&exchange, TxType::Buy, 1);
        let err = brokerage
            .execute_transaction(tx, &mut other, &mut exchange)
            .unwrap_err();
        assert!(matches!(err, AccountError::ForeignSavingsAccount { .. }));
        assert_eq!(other.balance(), dec(100));
    }

    #[test]
    fn buy_until_cash_runs_out() {
        let (mut exchange, mut savings, mut brokerage) = setup();

        let tx = trade(&exchange, TxType::Buy, 5);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(savings.balance(), Decimal::zero());
        assert_eq!(
            exchange.stock_listing("ACME").unwrap().available_shares(),
            95
        );
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), 5);
        assert_eq!(brokerage.value(&exchange), dec(50));
        // the cash leg is recorded on the savings account
        assert_eq!(savings.transaction_history().len(), 2);
        assert_eq!(
            savings.transaction_history()[1].kind(),
            TxType::Withdraw
        );

        let tx = trade(&exchange, TxType::Buy, 1);
        let err = brokerage
            .execute_transaction(tx.clone(), &mut savings, &mut exchange)
            .unwrap_err();
        let AccountError::InsufficientAssets {
            transaction,
            patron,
        } = &err
        else {
            panic!("unexpected error: {err:?}");
        };
        assert_eq!(transaction, &tx);
        assert_eq!(*patron, PATRON);
        assert_eq!(err.kind(), ErrorKind::InsufficientAssets);
        assert_eq!(err.to_string(), "Patron 7 has insufficient assets for Buy");

        assert_eq!(savings.balance(), Decimal::zero());
        assert_eq!(
            exchange.stock_listing("ACME").unwrap().available_shares(),
            95
        );
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), 5);
        assert_eq!(brokerage.transaction_history().len(), 1);
        assert_eq!(savings.transaction_history().len(), 2);
    }

    #[test]
    fn buy_entire_pool() {
        let mut exchange = StockExchange::default();
        exchange.create_new_listing("ACME", dec(1), 10).unwrap();
        let mut savings = SavingsAccount::new(1, PATRON);
        savings.execute_transaction(deposit(dec(100))).unwrap();
        let mut brokerage = BrokerageAccount::new(2, PATRON);

        let tx = trade(&exchange, TxType::Buy, 11);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::NotEnoughAvailableShares {
                requested: 11,
                available: 10,
                ..
            })
        ));
        assert_eq!(savings.balance(), dec(100));
        assert!(brokerage.holding("ACME").is_none());

        let tx = trade(&exchange, TxType::Buy, 10);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(exchange.stock_listing("ACME").unwrap().available_shares(), 0);
        assert_eq!(savings.balance(), dec(90));
    }

    #[test]
    fn sell_without_holding() {
        let (mut exchange, mut savings, mut brokerage) = setup();
        let tx = trade(&exchange, TxType::Sell, 5);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(err, AccountError::InsufficientAssets { .. }));
        assert_eq!(savings.balance(), dec(50));
        assert!(brokerage.list_of_shares().is_empty());
    }

    #[test]
    fn sell_at_current_price() {
        let (mut exchange, mut savings, mut brokerage) = setup();
        let tx = trade(&exchange, TxType::Buy, 4);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(savings.balance(), dec(10));

        exchange.set_price("ACME", dec(12)).unwrap();
        assert_eq!(brokerage.value(&exchange), dec(48));

        let tx = trade(&exchange, TxType::Sell, 5);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(err, AccountError::InsufficientAssets { .. }));
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), 4);

        let tx = trade(&exchange, TxType::Sell, 4);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(savings.balance(), dec(58));
        // emptied holdings are kept
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), 0);
        assert_eq!(brokerage.list_of_shares().len(), 1);
        assert_eq!(brokerage.value(&exchange), Decimal::zero());
        let kinds: Vec<_> = brokerage
            .transaction_history()
            .iter()
            .map(Transaction::kind)
            .collect();
        assert_eq!(kinds, [TxType::Buy, TxType::Sell]);
    }

    #[test]
    fn buy_then_sell_restores_balance() {
        let (mut exchange, mut savings, mut brokerage) = setup();
        let before = savings.balance();
        let buy = trade(&exchange, TxType::Buy, 3);
        brokerage
            .execute_transaction(buy, &mut savings, &mut exchange)
            .unwrap();
        let sell = trade(&exchange, TxType::Sell, 3);
        brokerage
            .execute_transaction(sell, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(savings.balance(), before);
    }

    #[test]
    fn trading_unlisted_symbol() {
        let (exchange, mut savings, mut brokerage) = setup();
        let tx = trade(&exchange, TxType::Buy, 1);
        // same transaction, executed against an exchange that never listed ACME
        let mut other = StockExchange::default();
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut other)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::UnknownListing { .. })
        ));
        assert_eq!(savings.balance(), dec(50));
    }

    #[test]
    fn savings_balance_out_of_range() {
        let exchange = StockExchange::default();
        let mut acc = SavingsAccount::new(1, PATRON);
        acc.execute_transaction(deposit(Decimal::MAX)).unwrap();
        let err = acc.execute_transaction(deposit(Decimal::ONE)).unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::AmountOverflow {
                kind: TxType::Deposit
            })
        ));
        assert_eq!(acc.value(&exchange), Decimal::MAX);
        assert_eq!(acc.transaction_history().len(), 1);
    }

    #[test]
    fn buy_cost_out_of_range() {
        let mut exchange = StockExchange::default();
        exchange.create_new_listing("ACME", Decimal::MAX, 10).unwrap();
        let mut savings = SavingsAccount::new(1, PATRON);
        savings.execute_transaction(deposit(Decimal::ONE)).unwrap();
        let mut brokerage = BrokerageAccount::new(2, PATRON);

        let tx = trade(&exchange, TxType::Buy, 2);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::AmountOverflow {
                kind: TxType::Buy
            })
        ));
        assert_eq!(err.kind(), ErrorKind::InvalidTransaction);
        assert_eq!(savings.balance(), Decimal::ONE);
        assert_eq!(exchange.stock_listing("ACME").unwrap().available_shares(), 10);
        assert!(brokerage.transaction_history().is_empty());
    }

    #[test]
    fn sell_proceeds_out_of_range() {
        let mut exchange = StockExchange::default();
        exchange.create_new_listing("ACME", dec(10), 10).unwrap();
        let mut savings = SavingsAccount::new(1, PATRON);
        savings.execute_transaction(deposit(Decimal::MAX)).unwrap();
        let mut brokerage = BrokerageAccount::new(2, PATRON);
        let tx = trade(&exchange, TxType::Buy, 1);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        let balance = savings.balance();

        exchange.set_price("ACME", Decimal::MAX).unwrap();
        let tx = trade(&exchange, TxType::Sell, 1);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::AmountOverflow {
                kind: TxType::Deposit
            })
        ));
        assert_eq!(savings.balance(), balance);
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), 1);
        // holdings are still reported, capped at the decimal range
        assert_eq!(brokerage.value(&exchange), Decimal::MAX);
    }

    #[test]
    fn holding_cannot_overflow() {
        let mut exchange = StockExchange::default();
        // 1e-10 per share keeps the cost of u32::MAX shares below 1
        exchange
            .create_new_listing("ACME", Decimal::new(1, 10), u32::MAX)
            .unwrap();
        let mut savings = SavingsAccount::new(1, PATRON);
        savings.execute_transaction(deposit(dec(1))).unwrap();
        let mut brokerage = BrokerageAccount::new(2, PATRON);

        let tx = trade(&exchange, TxType::Buy, u32::MAX);
        brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap();
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), u32::MAX);
        exchange.add_available_shares("ACME", 1).unwrap();
        let balance = savings.balance();

        let tx = trade(&exchange, TxType::Buy, 1);
        let err = brokerage
            .execute_transaction(tx, &mut savings, &mut exchange)
            .unwrap_err();
        assert!(matches!(
            err,
            AccountError::InvalidTransaction(InvalidTransaction::HoldingOverflow {
                quantity: 1,
                ..
            })
        ));
        assert_eq!(savings.balance(), balance);
        assert_eq!(exchange.stock_listing("ACME").unwrap().available_shares(), 1);
        assert_eq!(brokerage.holding("ACME").unwrap().quantity(), u32::MAX);
        assert_eq!(brokerage.transaction_history().len(), 1);
    }
}
