use rust_decimal::Decimal;

use crate::{
    account::{Account, BrokerageAccount, SavingsAccount},
    bank::{AccountType, BankError},
    exchange::StockExchange,
    transaction::Transaction,
};

pub type PatronId = u32;

/// A bank customer, owning at most one account of each kind.
///
/// Both slots start empty and can each be filled exactly once, by the bank.
#[derive(Debug)]
pub struct Patron {
    id: PatronId,
    savings: Option<SavingsAccount>,
    brokerage: Option<BrokerageAccount>,
}

impl Patron {
    pub(crate) fn new(id: PatronId) -> Self {
        Self {
            id,
            savings: None,
            brokerage: None,
        }
    }

    pub fn id(&self) -> PatronId {
        self.id
    }

    pub fn savings_account(&self) -> Option<&SavingsAccount> {
        self.savings.as_ref()
    }

    pub fn brokerage_account(&self) -> Option<&BrokerageAccount> {
        self.brokerage.as_ref()
    }

    pub(crate) fn set_savings_account(&mut self, savings: SavingsAccount) -> Result<(), BankError> {
        if self.savings.is_some() {
            return Err(BankError::DuplicateAccount {
                patron: self.id,
                account_type: AccountType::Savings,
            });
        }
        self.savings = Some(savings);
        Ok(())
    }

    pub(crate) fn set_brokerage_account(
        &mut self,
        brokerage: BrokerageAccount,
    ) -> Result<(), BankError> {
        if self.brokerage.is_some() {
            return Err(BankError::DuplicateAccount {
                patron: self.id,
                account_type: AccountType::Brokerage,
            });
        }
        if self.savings.is_none() {
            return Err(BankError::SavingsAccountRequired { patron: self.id });
        }
        self.brokerage = Some(brokerage);
        Ok(())
    }

    /// Savings balance plus brokerage holdings at current prices.
    pub fn net_worth(&self, exchange: &StockExchange) -> Decimal {
        let savings = self
            .savings
            .as_ref()
            .map(|acc| acc.value(exchange))
            .unwrap_or_default();
        let brokerage = self
            .brokerage
            .as_ref()
            .map(|acc| acc.value(exchange))
            .unwrap_or_default();
        savings.saturating_add(brokerage)
    }

    pub(crate) fn execute_transaction(
        &mut self,
        target: AccountType,
        tx: Transaction,
        exchange: &mut StockExchange,
    ) -> Result<(), BankError> {
        let missing = |account_type| BankError::NoSuchAccount {
            patron: self.id,
            account_type,
        };
        match target {
            AccountType::Savings => {
                let savings = self
                    .savings
                    .as_mut()
                    .ok_or_else(|| missing(AccountType::Savings))?;
                savings.execute_transaction(tx)?;
            }
            AccountType::Brokerage => {
                let brokerage = self
                    .brokerage
                    .as_mut()
                    .ok_or_else(|| missing(AccountType::Brokerage))?;
                let savings = self
                    .savings
                    .as_mut()
                    .ok_or(BankError::SavingsAccountRequired { patron: self.id })?;
                brokerage.execute_transaction(tx, savings, exchange)?;
            }
        }
        Ok(())
    }
}
