//! Glue between the account model and the directory: load, apply, persist.

use rust_decimal::Decimal;

use crate::account::Account;
use crate::directory::AccountDirectory;
use crate::error::{BankError, Result};
use crate::models::{LedgerRow, StoredAccount, User};

pub fn open_account<D: AccountDirectory>(
    directory: &mut D,
    user: &User,
    owner: &str,
    iban: &str,
    balance: Decimal,
    overdraft_limit: Decimal,
) -> Result<StoredAccount> {
    let mut account = Account::new(owner, balance, iban, overdraft_limit)?;
    account.record_opening()?;
    let id = directory.create_account(&account, user.id)?;
    tracing::info!(iban = account.iban(), balance = %account.balance(), "opened account");
    Ok(StoredAccount {
        id,
        user_id: user.id,
        user_name: user.username.clone(),
        account,
    })
}

pub fn find<D: AccountDirectory>(directory: &D, user: &User, iban: &str) -> Result<StoredAccount> {
    directory.find_account(iban, user.id, user.is_admin)
}

/// The account with its full stored ledger attached.
pub fn load_account<D: AccountDirectory>(directory: &D, user: &User, iban: &str) -> Result<StoredAccount> {
    let stored = find(directory, user, iban)?;
    let ledger = directory
        .load_ledger(stored.id)?
        .into_iter()
        .map(|row| row.entry)
        .collect();
    let account = &stored.account;
    let account = Account::restore(
        account.owner(),
        account.balance(),
        account.iban(),
        account.overdraft_limit(),
        ledger,
    )?;
    Ok(StoredAccount { account, ..stored })
}

pub fn list<D: AccountDirectory>(directory: &D, user: &User) -> Result<Vec<StoredAccount>> {
    directory.load_accounts_for_user(user.id, user.is_admin)
}

pub fn history<D: AccountDirectory>(directory: &D, user: &User, iban: &str) -> Result<Vec<LedgerRow>> {
    let stored = find(directory, user, iban)?;
    directory.load_ledger(stored.id)
}

pub fn deposit<D: AccountDirectory>(
    directory: &mut D,
    user: &User,
    iban: &str,
    amount: Decimal,
) -> Result<StoredAccount> {
    let mut stored = find(directory, user, iban)?;
    let entry = stored.account.deposit(amount)?.clone();
    directory.record_event(stored.id, &entry)?;
    tracing::info!(iban = stored.account.iban(), amount = %entry.amount(), "deposit");
    Ok(stored)
}

pub fn withdraw<D: AccountDirectory>(
    directory: &mut D,
    user: &User,
    iban: &str,
    amount: Decimal,
) -> Result<StoredAccount> {
    let mut stored = find(directory, user, iban)?;
    let entry = stored.account.withdraw(amount)?.clone();
    directory.record_event(stored.id, &entry)?;
    tracing::info!(iban = stored.account.iban(), amount = %entry.amount(), "withdraw");
    Ok(stored)
}

/// The source must belong to `user`; the target may be any existing account.
pub fn transfer<D: AccountDirectory>(
    directory: &mut D,
    user: &User,
    from_iban: &str,
    to_iban: &str,
    amount: Decimal,
) -> Result<(StoredAccount, StoredAccount)> {
    let mut source = find(directory, user, from_iban)?;
    let mut target = directory.find_account(to_iban, user.id, true)?;
    if source.id == target.id {
        return Err(BankError::validation("Cannot transfer to the same account."));
    }

    let (out, incoming) = source.account.transfer_to(&mut target.account, amount)?;
    directory.record_transfer(source.id, &out, target.id, &incoming)?;

    tracing::info!(
        from = source.account.iban(),
        to = target.account.iban(),
        amount = %out.amount(),
        "transfer"
    );
    Ok((source, target))
}

pub fn set_overdraft<D: AccountDirectory>(
    directory: &mut D,
    user: &User,
    iban: &str,
    limit: Decimal,
) -> Result<StoredAccount> {
    let mut stored = find(directory, user, iban)?;
    stored.account.set_overdraft_limit(limit)?;
    directory.update_overdraft(stored.id, stored.account.overdraft_limit())?;
    tracing::info!(iban = stored.account.iban(), limit = %stored.account.overdraft_limit(), "overdraft changed");
    Ok(stored)
}

pub fn delete_account<D: AccountDirectory>(directory: &mut D, user: &User, iban: &str) -> Result<StoredAccount> {
    let stored = find(directory, user, iban)?;
    directory.delete_account(stored.id)?;
    tracing::info!(iban = stored.account.iban(), "deleted account");
    Ok(stored)
}
