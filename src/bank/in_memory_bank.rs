use std::collections::BTreeMap;

use tracing::debug;

use crate::{
    account::{Account, AccountNumber, BrokerageAccount, SavingsAccount},
    exchange::StockExchange,
    patron::{Patron, PatronId},
    transaction::Transaction,
};

use super::{AccountType, Bank, BankError};

#[derive(Debug, Default)]
pub struct InMemoryBank {
    exchange: StockExchange,
    patrons: BTreeMap<PatronId, Patron>,
    last_patron_id: PatronId,
    last_account_number: AccountNumber,
}

impl InMemoryBank {
    pub fn new(exchange: StockExchange) -> Self {
        Self {
            exchange,
            ..Default::default()
        }
    }

    pub fn exchange(&self) -> &StockExchange {
        &self.exchange
    }

    pub fn exchange_mut(&mut self) -> &mut StockExchange {
        &mut self.exchange
    }

    pub fn patron(&self, id: PatronId) -> Option<&Patron> {
        self.patrons.get(&id)
    }

    /// All patrons, ordered by ID.
    pub fn all_patrons(&self) -> impl Iterator<Item = &Patron> {
        self.patrons.values()
    }

    /// Every account of every kind, ordered by account number.
    pub fn all_accounts(&self) -> Vec<&dyn Account> {
        let mut accounts: Vec<&dyn Account> = Vec::new();
        for patron in self.patrons.values() {
            if let Some(savings) = patron.savings_account() {
                accounts.push(savings);
            }
            if let Some(brokerage) = patron.brokerage_account() {
                accounts.push(brokerage);
            }
        }
        accounts.sort_by_key(|acc| acc.account_number());
        accounts
    }

    fn patron_mut(&mut self, id: PatronId) -> Result<&mut Patron, BankError> {
        self.patrons
            .get_mut(&id)
            .ok_or(BankError::UnknownPatron { patron: id })
    }
}

impl Bank for InMemoryBank {
    fn create_new_patron(&mut self) -> PatronId {
        self.last_patron_id += 1;
        let id = self.last_patron_id;
        self.patrons.insert(id, Patron::new(id));
        debug!(patron = id, "patron created");
        id
    }

    fn open_new_savings_account(
        &mut self,
        patron: PatronId,
    ) -> Result<AccountNumber, BankError> {
        let account_number = self.last_account_number + 1;
        self.patron_mut(patron)?
            .set_savings_account(SavingsAccount::new(account_number, patron))?;
        // only consume the number once the account is actually opened
        self.last_account_number = account_number;
        debug!(patron, account_number, "savings account opened");
        Ok(account_number)
    }

    fn open_new_brokerage_account(
        &mut self,
        patron: PatronId,
    ) -> Result<AccountNumber, BankError> {
        let account_number = self.last_account_number + 1;
        self.patron_mut(patron)?
            .set_brokerage_account(BrokerageAccount::new(account_number, patron))?;
        self.last_account_number = account_number;
        debug!(patron, account_number, "brokerage account opened");
        Ok(account_number)
    }

    fn execute_transaction(
        &mut self,
        patron: PatronId,
        target: AccountType,
        tx: Transaction,
    ) -> Result<(), BankError> {
        let patron = self
            .patrons
            .get_mut(&patron)
            .ok_or(BankError::UnknownPatron { patron })?;
        patron.execute_transaction(target, tx, &mut self.exchange)
    }
}
