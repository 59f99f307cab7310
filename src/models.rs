use rust_decimal::Decimal;

use crate::account::{Account, LedgerEntry};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub is_admin: bool,
}

/// An account row together with its owning user.
#[derive(Debug, Clone)]
pub struct StoredAccount {
    pub id: i64,
    pub user_id: i64,
    pub user_name: String,
    pub account: Account,
}

#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub entry: LedgerEntry,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct Bill {
    pub id: i64,
    pub account_id: i64,
    pub title: String,
    pub due_date: String,
    pub amount: Decimal,
    pub is_paid: bool,
}
