//! Account model: balance, overdraft floor and an append-only ledger.
//!
//! Every operation validates first and mutates second, so a rejected call leaves
//! the account untouched and appends nothing.

use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{BankError, Result};
use crate::money::round2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntryKind {
    Deposit,
    Withdraw,
    TransferOut,
    TransferIn,
    Open,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deposit => "DEPOSIT",
            Self::Withdraw => "WITHDRAW",
            Self::TransferOut => "TRANSFER_OUT",
            Self::TransferIn => "TRANSFER_IN",
            Self::Open => "OPEN",
        }
    }

    /// Whether the entry moved money out of the account.
    pub fn is_debit(&self) -> bool {
        matches!(self, Self::Withdraw | Self::TransferOut)
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = BankError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_uppercase().as_str() {
            "DEPOSIT" => Ok(Self::Deposit),
            "WITHDRAW" => Ok(Self::Withdraw),
            "TRANSFER_OUT" => Ok(Self::TransferOut),
            "TRANSFER_IN" => Ok(Self::TransferIn),
            "OPEN" => Ok(Self::Open),
            other => Err(BankError::validation(format!("Unknown ledger entry kind: {other}"))),
        }
    }
}

/// One balance-affecting event. Fields are private; an entry never changes once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    kind: EntryKind,
    amount: Decimal,
    balance_after: Decimal,
    details: String,
}

impl LedgerEntry {
    pub fn new(kind: EntryKind, amount: Decimal, balance_after: Decimal, details: &str) -> Result<Self> {
        if amount < Decimal::ZERO {
            return Err(BankError::validation("Ledger amount must not be negative."));
        }
        Ok(Self {
            kind,
            amount,
            balance_after,
            details: details.to_string(),
        })
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn balance_after(&self) -> Decimal {
        self.balance_after
    }

    pub fn details(&self) -> &str {
        &self.details
    }
}

impl fmt::Display for LedgerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.2} -> balance {:.2} {}",
            self.kind, self.amount, self.balance_after, self.details
        )
    }
}

/// Plain projection of an account for storage or transport.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountSnapshot {
    pub owner: String,
    pub iban: String,
    pub balance: Decimal,
    pub overdraft_limit: Decimal,
    pub ledger: Vec<LedgerEntry>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    owner: String,
    iban: String,
    balance: Decimal,
    overdraft_limit: Decimal,
    ledger: Vec<LedgerEntry>,
}

impl Account {
    pub fn new(owner: &str, balance: Decimal, iban: &str, overdraft_limit: Decimal) -> Result<Self> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(BankError::validation("Owner must be a non-empty string."));
        }
        let iban = iban.trim();
        if iban.is_empty() {
            return Err(BankError::validation("IBAN must be a non-empty string."));
        }
        let overdraft_limit = round2(overdraft_limit);
        if overdraft_limit > Decimal::ZERO {
            return Err(BankError::validation("Overdraft limit must be zero or negative."));
        }
        let balance = round2(balance);
        if balance < overdraft_limit {
            return Err(BankError::validation(
                "Balance cannot be less than the overdraft limit.",
            ));
        }

        Ok(Self {
            owner: owner.to_string(),
            iban: iban.to_string(),
            balance,
            overdraft_limit,
            ledger: Vec::new(),
        })
    }

    /// Rebuild an account with an existing ledger, re-checking every construction rule.
    pub fn restore(
        owner: &str,
        balance: Decimal,
        iban: &str,
        overdraft_limit: Decimal,
        ledger: Vec<LedgerEntry>,
    ) -> Result<Self> {
        let mut account = Self::new(owner, balance, iban, overdraft_limit)?;
        account.ledger = ledger;
        Ok(account)
    }

    pub fn from_snapshot(snapshot: AccountSnapshot) -> Result<Self> {
        Self::restore(
            &snapshot.owner,
            snapshot.balance,
            &snapshot.iban,
            snapshot.overdraft_limit,
            snapshot.ledger,
        )
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn iban(&self) -> &str {
        &self.iban
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn overdraft_limit(&self) -> Decimal {
        self.overdraft_limit
    }

    /// How much can still be debited before hitting the overdraft floor.
    /// Saturates at `Decimal::MAX` for huge balances.
    pub fn available(&self) -> Decimal {
        self.balance.saturating_sub(self.overdraft_limit)
    }

    pub fn history(&self) -> &[LedgerEntry] {
        &self.ledger
    }

    pub fn snapshot(&self) -> AccountSnapshot {
        AccountSnapshot {
            owner: self.owner.clone(),
            iban: self.iban.clone(),
            balance: self.balance,
            overdraft_limit: self.overdraft_limit,
            ledger: self.ledger.clone(),
        }
    }

    /// Append the OPEN entry for a freshly created account.
    pub fn record_opening(&mut self) -> Result<&LedgerEntry> {
        if !self.ledger.is_empty() {
            return Err(BankError::validation("Account already has ledger entries."));
        }
        let entry = LedgerEntry::new(EntryKind::Open, Decimal::ZERO, self.balance, "opening balance")?;
        Ok(self.push(entry))
    }

    pub fn deposit(&mut self, amount: Decimal) -> Result<&LedgerEntry> {
        let amount = positive_amount(amount)?;
        let new_balance = credited(self.balance, amount)?;
        let entry = LedgerEntry::new(EntryKind::Deposit, amount, new_balance, "cash deposit")?;
        self.balance = new_balance;
        Ok(self.push(entry))
    }

    pub fn withdraw(&mut self, amount: Decimal) -> Result<&LedgerEntry> {
        let amount = positive_amount(amount)?;
        let new_balance = self.debited(amount)?;
        let entry = LedgerEntry::new(EntryKind::Withdraw, amount, new_balance, "cash withdraw")?;
        self.balance = new_balance;
        Ok(self.push(entry))
    }

    /// Move `amount` to `target`. Both sides are validated before either is touched.
    /// Returns the TRANSFER_OUT and TRANSFER_IN entries, in that order.
    pub fn transfer_to(&mut self, target: &mut Account, amount: Decimal) -> Result<(LedgerEntry, LedgerEntry)> {
        if target.iban == self.iban {
            return Err(BankError::validation("Cannot transfer to the same account."));
        }
        let amount = positive_amount(amount)?;
        let source_balance = self.debited(amount)?;
        let target_balance = credited(target.balance, amount)?;

        let out = LedgerEntry::new(
            EntryKind::TransferOut,
            amount,
            source_balance,
            &format!("to {}", target.iban),
        )?;
        let incoming = LedgerEntry::new(
            EntryKind::TransferIn,
            amount,
            target_balance,
            &format!("from {}", self.iban),
        )?;

        self.balance = source_balance;
        self.push(out.clone());
        target.balance = target_balance;
        target.push(incoming.clone());
        Ok((out, incoming))
    }

    pub fn set_overdraft_limit(&mut self, limit: Decimal) -> Result<()> {
        let limit = round2(limit);
        if limit > Decimal::ZERO {
            return Err(BankError::validation("Overdraft limit must be zero or negative."));
        }
        if self.balance < limit {
            return Err(BankError::validation(format!(
                "Balance {:.2} is already below the requested overdraft limit {:.2}.",
                self.balance, limit
            )));
        }
        self.overdraft_limit = limit;
        Ok(())
    }

    fn debited(&self, amount: Decimal) -> Result<Decimal> {
        let insufficient = || {
            BankError::InsufficientFunds(format!(
                "overdraft limit {:.2} reached, current balance {:.2}",
                self.overdraft_limit, self.balance
            ))
        };
        // Overflow means the result would sit far below any representable floor.
        let new_balance = round2(self.balance.checked_sub(amount).ok_or_else(insufficient)?);
        if new_balance < self.overdraft_limit {
            return Err(insufficient());
        }
        Ok(new_balance)
    }

    fn push(&mut self, entry: LedgerEntry) -> &LedgerEntry {
        self.ledger.push(entry);
        &self.ledger[self.ledger.len() - 1]
    }
}

impl fmt::Display for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Account(owner={}, IBAN={}, balance={:.2}, overdraft={:.2})",
            self.owner, self.iban, self.balance, self.overdraft_limit
        )
    }
}

fn credited(balance: Decimal, amount: Decimal) -> Result<Decimal> {
    balance
        .checked_add(amount)
        .map(round2)
        .ok_or_else(|| BankError::validation("amount too large"))
}

fn positive_amount(amount: Decimal) -> Result<Decimal> {
    let amount = round2(amount);
    if amount <= Decimal::ZERO {
        return Err(BankError::validation("Amount must be greater than 0."));
    }
    Ok(amount)
}
