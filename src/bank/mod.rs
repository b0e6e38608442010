use thiserror::Error;

use crate::{
    account::{AccountError, AccountNumber},
    error::ErrorKind,
    listing::ListingError,
    patron::PatronId,
    transaction::Transaction,
};

pub mod in_memory_bank;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountType {
    Savings,
    Brokerage,
}

#[derive(Debug, Error)]
pub enum BankError {
    #[error("Patron {patron} already has a {account_type:?} account")]
    DuplicateAccount {
        patron: PatronId,
        account_type: AccountType,
    },
    #[error("Patron {patron} needs a savings account first")]
    SavingsAccountRequired { patron: PatronId },
    #[error("Patron {patron} has no {account_type:?} account")]
    NoSuchAccount {
        patron: PatronId,
        account_type: AccountType,
    },
    #[error("Unknown patron {patron}")]
    UnknownPatron { patron: PatronId },
    #[error(transparent)]
    AccountErr(#[from] AccountError),
    #[error(transparent)]
    ListingErr(#[from] ListingError),
}

impl BankError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BankError::DuplicateAccount { .. } | BankError::SavingsAccountRequired { .. } => {
                ErrorKind::ApplicationDenied
            }
            BankError::NoSuchAccount { .. } | BankError::UnknownPatron { .. } => {
                ErrorKind::InvalidArgument
            }
            BankError::AccountErr(err) => err.kind(),
            BankError::ListingErr(err) => err.kind(),
        }
    }
}

/// Issues patrons and accounts, and routes transactions to them.
///
/// Patron IDs and account numbers are unique and strictly increasing; account
/// numbers are shared between savings and brokerage accounts.
pub trait Bank {
    fn create_new_patron(&mut self) -> PatronId;

    fn open_new_savings_account(&mut self, patron: PatronId)
    -> Result<AccountNumber, BankError>;

    /// Requires the patron to already own a savings account, which settles the cash side of trades.
    fn open_new_brokerage_account(
        &mut self,
        patron: PatronId,
    ) -> Result<AccountNumber, BankError>;

    fn execute_transaction(
        &mut self,
        patron: PatronId,
        target: AccountType,
        tx: Transaction,
    ) -> Result<(), BankError>;
}
