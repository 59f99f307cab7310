//! Durable storage for users, accounts, ledger entries and bills.
//!
//! `AccountDirectory` is the seam the teller talks through; `SqliteDirectory` is the
//! only implementation and owns its connection for the life of the process.

use std::path::Path;

use rusqlite::{Connection, ErrorCode, OptionalExtension};
use rust_decimal::Decimal;

use crate::account::{Account, LedgerEntry};
use crate::db::{decimal_at, get_connection, init_db};
use crate::error::{BankError, Result};
use crate::models::{Bill, LedgerRow, StoredAccount, User};

pub trait AccountDirectory {
    fn create_user(&mut self, username: &str, password_hash: &str, is_admin: bool) -> Result<i64>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn count_users(&self) -> Result<i64>;

    /// Insert the account and whatever ledger it already carries, atomically.
    fn create_account(&mut self, account: &Account, owner_user_id: i64) -> Result<i64>;
    fn load_accounts_for_user(&self, user_id: i64, is_admin: bool) -> Result<Vec<StoredAccount>>;
    fn find_account(&self, iban: &str, user_id: i64, is_admin: bool) -> Result<StoredAccount>;
    fn update_balance(&mut self, account_id: i64, new_balance: Decimal) -> Result<()>;
    fn append_ledger_entry(&mut self, account_id: i64, entry: &LedgerEntry) -> Result<()>;
    fn load_ledger(&self, account_id: i64) -> Result<Vec<LedgerRow>>;
    fn delete_account(&mut self, account_id: i64) -> Result<()>;
    fn update_overdraft(&mut self, account_id: i64, new_limit: Decimal) -> Result<()>;

    /// Store the entry and set the balance to its `balance_after` in one transaction.
    fn record_event(&mut self, account_id: i64, entry: &LedgerEntry) -> Result<()>;
    /// Both sides of a transfer in one transaction.
    fn record_transfer(
        &mut self,
        source_id: i64,
        source_entry: &LedgerEntry,
        target_id: i64,
        target_entry: &LedgerEntry,
    ) -> Result<()>;

    fn add_bill(&mut self, account_id: i64, title: &str, due_date: &str, amount: Decimal) -> Result<i64>;
    fn load_bills(&self, account_id: i64, only_unpaid: bool) -> Result<Vec<Bill>>;
    fn mark_bill_paid(&mut self, account_id: i64, bill_id: i64) -> Result<()>;
}

pub struct SqliteDirectory {
    conn: Connection,
}

impl SqliteDirectory {
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = get_connection(db_path)?;
        init_db(&conn)?;
        Ok(Self { conn })
    }

    #[cfg(test)]
    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

type AccountRow = (i64, String, String, Decimal, Decimal, i64, String);

const ACCOUNT_SELECT: &str = "SELECT a.id, a.owner, a.iban, a.balance, a.overdraft_limit, a.user_id, u.username \
     FROM accounts a JOIN users u ON a.user_id = u.id";

fn account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        decimal_at(row, 3)?,
        decimal_at(row, 4)?,
        row.get(5)?,
        row.get(6)?,
    ))
}

fn stored_account(row: AccountRow) -> Result<StoredAccount> {
    let (id, owner, iban, balance, overdraft_limit, user_id, user_name) = row;
    Ok(StoredAccount {
        id,
        user_id,
        user_name,
        account: Account::restore(&owner, balance, &iban, overdraft_limit, Vec::new())?,
    })
}

fn insert_entry(conn: &Connection, account_id: i64, entry: &LedgerEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO transactions (account_id, t_type, amount, balance_after, details) VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            account_id,
            entry.kind().as_str(),
            entry.amount().to_string(),
            entry.balance_after().to_string(),
            entry.details(),
        ],
    )?;
    Ok(())
}

fn set_balance(conn: &Connection, account_id: i64, balance: Decimal) -> Result<()> {
    let changed = conn.execute(
        "UPDATE accounts SET balance = ?1 WHERE id = ?2",
        rusqlite::params![balance.to_string(), account_id],
    )?;
    if changed == 0 {
        return Err(BankError::NotFound(format!("account #{account_id}")));
    }
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.code == ErrorCode::ConstraintViolation
                && e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

impl AccountDirectory for SqliteDirectory {
    fn create_user(&mut self, username: &str, password_hash: &str, is_admin: bool) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO users (username, password_hash, is_admin) VALUES (?1, ?2, ?3)",
                rusqlite::params![username, password_hash, is_admin as i32],
            )
            .map_err(|e| {
                if is_unique_violation(&e) {
                    BankError::Auth("Username already exists".to_string())
                } else {
                    e.into()
                }
            })?;
        Ok(self.conn.last_insert_rowid())
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, username, password_hash, is_admin FROM users WHERE username = ?1",
                [username],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        password_hash: row.get(2)?,
                        is_admin: row.get::<_, i64>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn count_users(&self) -> Result<i64> {
        Ok(self.conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?)
    }

    fn create_account(&mut self, account: &Account, owner_user_id: i64) -> Result<i64> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO accounts (owner, iban, balance, overdraft_limit, user_id) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                account.owner(),
                account.iban(),
                account.balance().to_string(),
                account.overdraft_limit().to_string(),
                owner_user_id,
            ],
        )
        .map_err(|e| {
            if is_unique_violation(&e) {
                BankError::validation(format!("IBAN {} already exists.", account.iban()))
            } else {
                e.into()
            }
        })?;
        let account_id = tx.last_insert_rowid();
        for entry in account.history() {
            insert_entry(&tx, account_id, entry)?;
        }
        tx.commit()?;
        Ok(account_id)
    }

    fn load_accounts_for_user(&self, user_id: i64, is_admin: bool) -> Result<Vec<StoredAccount>> {
        let sql = format!("{ACCOUNT_SELECT} WHERE ?1 OR a.user_id = ?2 ORDER BY a.id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows: Vec<AccountRow> = stmt
            .query_map(rusqlite::params![is_admin, user_id], account_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(stored_account).collect()
    }

    fn find_account(&self, iban: &str, user_id: i64, is_admin: bool) -> Result<StoredAccount> {
        let sql = format!("{ACCOUNT_SELECT} WHERE a.iban = ?1 AND (?2 OR a.user_id = ?3)");
        let row = self
            .conn
            .query_row(&sql, rusqlite::params![iban.trim(), is_admin, user_id], account_row)
            .optional()?
            .ok_or_else(|| BankError::NotFound(format!("account {}", iban.trim())))?;
        stored_account(row)
    }

    fn update_balance(&mut self, account_id: i64, new_balance: Decimal) -> Result<()> {
        set_balance(&self.conn, account_id, new_balance)
    }

    fn append_ledger_entry(&mut self, account_id: i64, entry: &LedgerEntry) -> Result<()> {
        insert_entry(&self.conn, account_id, entry)
    }

    fn load_ledger(&self, account_id: i64) -> Result<Vec<LedgerRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT t_type, amount, balance_after, details, created_at \
             FROM transactions WHERE account_id = ?1 ORDER BY id",
        )?;
        let raw: Vec<(String, Decimal, Decimal, Option<String>, Option<String>)> = stmt
            .query_map([account_id], |row| {
                Ok((
                    row.get(0)?,
                    decimal_at(row, 1)?,
                    decimal_at(row, 2)?,
                    row.get(3)?,
                    row.get(4)?,
                ))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        raw.into_iter()
            .map(|(kind, amount, balance_after, details, created_at)| -> Result<LedgerRow> {
                let entry = LedgerEntry::new(
                    kind.parse()?,
                    amount,
                    balance_after,
                    details.as_deref().unwrap_or_default(),
                )?;
                Ok(LedgerRow {
                    entry,
                    created_at: created_at.unwrap_or_default(),
                })
            })
            .collect()
    }

    fn delete_account(&mut self, account_id: i64) -> Result<()> {
        let changed = self.conn.execute("DELETE FROM accounts WHERE id = ?1", [account_id])?;
        if changed == 0 {
            return Err(BankError::NotFound(format!("account #{account_id}")));
        }
        Ok(())
    }

    fn update_overdraft(&mut self, account_id: i64, new_limit: Decimal) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE accounts SET overdraft_limit = ?1 WHERE id = ?2",
            rusqlite::params![new_limit.to_string(), account_id],
        )?;
        if changed == 0 {
            return Err(BankError::NotFound(format!("account #{account_id}")));
        }
        Ok(())
    }

    fn record_event(&mut self, account_id: i64, entry: &LedgerEntry) -> Result<()> {
        let tx = self.conn.transaction()?;
        set_balance(&tx, account_id, entry.balance_after())?;
        insert_entry(&tx, account_id, entry)?;
        tx.commit()?;
        Ok(())
    }

    fn record_transfer(
        &mut self,
        source_id: i64,
        source_entry: &LedgerEntry,
        target_id: i64,
        target_entry: &LedgerEntry,
    ) -> Result<()> {
        let tx = self.conn.transaction()?;
        set_balance(&tx, source_id, source_entry.balance_after())?;
        insert_entry(&tx, source_id, source_entry)?;
        set_balance(&tx, target_id, target_entry.balance_after())?;
        insert_entry(&tx, target_id, target_entry)?;
        tx.commit()?;
        Ok(())
    }

    fn add_bill(&mut self, account_id: i64, title: &str, due_date: &str, amount: Decimal) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO bills (account_id, title, due_date, amount) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![account_id, title, due_date, amount.to_string()],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn load_bills(&self, account_id: i64, only_unpaid: bool) -> Result<Vec<Bill>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, account_id, title, due_date, amount, is_paid FROM bills \
             WHERE account_id = ?1 AND (?2 = 0 OR is_paid = 0) ORDER BY due_date",
        )?;
        let bills = stmt
            .query_map(rusqlite::params![account_id, only_unpaid], |row| {
                Ok(Bill {
                    id: row.get(0)?,
                    account_id: row.get(1)?,
                    title: row.get(2)?,
                    due_date: row.get(3)?,
                    amount: decimal_at(row, 4)?,
                    is_paid: row.get::<_, i64>(5)? != 0,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(bills)
    }

    fn mark_bill_paid(&mut self, account_id: i64, bill_id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE bills SET is_paid = 1 WHERE id = ?1 AND account_id = ?2",
            [bill_id, account_id],
        )?;
        if changed == 0 {
            return Err(BankError::NotFound(format!("bill #{bill_id}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::account::EntryKind;

    fn d(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn test_dir() -> (tempfile::TempDir, SqliteDirectory) {
        let dir = tempfile::tempdir().unwrap();
        let directory = SqliteDirectory::open(&dir.path().join("test.db")).unwrap();
        (dir, directory)
    }

    fn with_user(directory: &mut SqliteDirectory, name: &str, is_admin: bool) -> i64 {
        directory.create_user(name, "hash", is_admin).unwrap()
    }

    fn opened(owner: &str, balance: &str, iban: &str, overdraft: &str) -> Account {
        let mut acct = Account::new(owner, d(balance), iban, d(overdraft)).unwrap();
        acct.record_opening().unwrap();
        acct
    }

    #[test]
    fn test_user_roundtrip_and_duplicate() {
        let (_dir, mut directory) = test_dir();
        let id = with_user(&mut directory, "alice", true);
        let user = directory.get_user_by_username("alice").unwrap().unwrap();
        assert_eq!(user.id, id);
        assert!(user.is_admin);
        assert!(directory.get_user_by_username("nobody").unwrap().is_none());
        assert!(matches!(
            directory.create_user("alice", "x", false),
            Err(BankError::Auth(_))
        ));
        assert_eq!(directory.count_users().unwrap(), 1);
    }

    #[test]
    fn test_create_account_persists_opening_entry() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let id = directory.create_account(&opened("Alice", "100.50", "IBAN1", "-20"), uid).unwrap();

        let stored = directory.find_account("IBAN1", uid, false).unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.user_name, "alice");
        assert_eq!(stored.account.balance(), d("100.50"));
        assert_eq!(stored.account.overdraft_limit(), d("-20"));

        let ledger = directory.load_ledger(id).unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].entry.kind(), EntryKind::Open);
        assert!(!ledger[0].created_at.is_empty());
    }

    #[test]
    fn test_update_balance_and_append_entry() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let id = directory.create_account(&opened("Alice", "10", "IBAN1", "0"), uid).unwrap();

        let entry = LedgerEntry::new(EntryKind::Deposit, d("5"), d("15"), "cash deposit").unwrap();
        directory.append_ledger_entry(id, &entry).unwrap();
        directory.update_balance(id, d("15")).unwrap();

        let stored = directory.find_account("IBAN1", uid, false).unwrap();
        assert_eq!(stored.account.balance(), d("15"));
        let ledger = directory.load_ledger(id).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].entry, entry);
    }

    #[test]
    fn test_duplicate_iban_rejected() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        directory.create_account(&opened("Alice", "1", "IBAN1", "0"), uid).unwrap();
        let err = directory.create_account(&opened("Other", "1", "IBAN1", "0"), uid).unwrap_err();
        assert!(matches!(err, BankError::Validation(_)));
    }

    #[test]
    fn test_visibility_by_user() {
        let (_dir, mut directory) = test_dir();
        let admin = with_user(&mut directory, "admin", true);
        let bob = with_user(&mut directory, "bob", false);
        directory.create_account(&opened("Admin", "1", "IBAN-A", "0"), admin).unwrap();
        directory.create_account(&opened("Bob", "1", "IBAN-B", "0"), bob).unwrap();

        assert_eq!(directory.load_accounts_for_user(admin, true).unwrap().len(), 2);
        let mine = directory.load_accounts_for_user(bob, false).unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].account.iban(), "IBAN-B");

        assert!(matches!(
            directory.find_account("IBAN-A", bob, false),
            Err(BankError::NotFound(_))
        ));
        assert!(directory.find_account("IBAN-B", admin, true).is_ok());
    }

    #[test]
    fn test_record_event_updates_balance_and_ledger() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let mut acct = opened("Alice", "100", "IBAN1", "0");
        let id = directory.create_account(&acct, uid).unwrap();

        let entry = acct.deposit(d("25.25")).unwrap().clone();
        directory.record_event(id, &entry).unwrap();

        let stored = directory.find_account("IBAN1", uid, false).unwrap();
        assert_eq!(stored.account.balance(), d("125.25"));
        let ledger = directory.load_ledger(id).unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger[1].entry, entry);
    }

    #[test]
    fn test_record_transfer_rolls_back_on_missing_target() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let mut a = opened("Alice", "100", "IBAN1", "0");
        let mut b = opened("Bob", "0", "IBAN2", "0");
        let id = directory.create_account(&a, uid).unwrap();
        let (out, incoming) = a.transfer_to(&mut b, d("30")).unwrap();
        assert!(directory.record_transfer(id, &out, 9999, &incoming).is_err());

        let stored = directory.find_account("IBAN1", uid, false).unwrap();
        assert_eq!(stored.account.balance(), d("100"));
        assert_eq!(directory.load_ledger(id).unwrap().len(), 1);
    }

    #[test]
    fn test_delete_cascades() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let id = directory.create_account(&opened("Alice", "1", "IBAN1", "0"), uid).unwrap();
        directory.add_bill(id, "Rent", "2026-11-01", d("500")).unwrap();
        directory.delete_account(id).unwrap();

        let left: i64 = directory
            .connection()
            .query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))
            .unwrap();
        assert_eq!(left, 0);
        assert!(directory.load_bills(id, false).unwrap().is_empty());
        assert!(matches!(directory.delete_account(id), Err(BankError::NotFound(_))));
    }

    #[test]
    fn test_update_overdraft() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let id = directory.create_account(&opened("Alice", "1", "IBAN1", "0"), uid).unwrap();
        directory.update_overdraft(id, d("-75")).unwrap();
        let stored = directory.find_account("IBAN1", uid, false).unwrap();
        assert_eq!(stored.account.overdraft_limit(), d("-75"));
    }

    #[test]
    fn test_bills_unpaid_filter() {
        let (_dir, mut directory) = test_dir();
        let uid = with_user(&mut directory, "alice", false);
        let id = directory.create_account(&opened("Alice", "1", "IBAN1", "0"), uid).unwrap();
        let rent = directory.add_bill(id, "Rent", "2026-11-01", d("500")).unwrap();
        directory.add_bill(id, "Power", "2026-10-25", d("61.20")).unwrap();

        let unpaid = directory.load_bills(id, true).unwrap();
        assert_eq!(unpaid.len(), 2);
        assert_eq!(unpaid[0].title, "Power");

        directory.mark_bill_paid(id, rent).unwrap();
        assert_eq!(directory.load_bills(id, true).unwrap().len(), 1);
        assert_eq!(directory.load_bills(id, false).unwrap().len(), 2);
        assert!(directory.mark_bill_paid(id, 9999).is_err());
    }
}
