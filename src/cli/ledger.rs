use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::Result;
use crate::fmt::money;
use crate::models::LedgerRow;
use crate::money::parse_amount;
use crate::teller;

pub fn deposit(amount: &str, account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    let amount = parse_amount(amount)?;
    let stored = teller::deposit(&mut session.directory, &session.user, &iban, amount)?;
    println!(
        "Deposited {} to {}. New balance: {}",
        money(amount),
        iban,
        money(stored.account.balance())
    );
    Ok(())
}

pub fn withdraw(amount: &str, account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    let amount = parse_amount(amount)?;
    let stored = teller::withdraw(&mut session.directory, &session.user, &iban, amount)?;
    println!(
        "Withdrew {} from {}. Remaining balance: {}",
        money(amount),
        iban,
        money(stored.account.balance())
    );
    Ok(())
}

pub fn transfer(to: &str, amount: &str, account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let from = session.target_iban(account)?;
    let amount = parse_amount(amount)?;
    let (source, target) = teller::transfer(&mut session.directory, &session.user, &from, to, amount)?;
    println!(
        "Transferred {} from {} to {}.",
        money(amount),
        source.account.iban(),
        target.account.iban()
    );
    println!("  {} balance: {}", source.account.iban(), money(source.account.balance()));
    // Only show the receiving balance when the user can see that account.
    if target.user_id == session.user.id || session.user.is_admin {
        println!("  {} balance: {}", target.account.iban(), money(target.account.balance()));
    }
    Ok(())
}

pub fn history(account: Option<String>, csv_path: Option<String>) -> Result<()> {
    let session = open_session()?;
    let iban = session.target_iban(account)?;
    let rows = teller::history(&session.directory, &session.user, &iban)?;

    if let Some(path) = csv_path {
        write_csv(&path, &rows)?;
        println!("Wrote {} entries to {path}", rows.len());
    }

    if rows.is_empty() {
        println!("No transactions yet.");
        return Ok(());
    }
    println!("History for {iban}\n{}", history_table(&rows));
    Ok(())
}

/// Ledger rows as a table, oldest first.
pub(crate) fn history_table(rows: &[LedgerRow]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Date", "Type", "Amount", "Balance", "Details"]);
    for row in rows {
        let entry = &row.entry;
        let amount = if entry.kind().is_debit() {
            format!("-{}", money(entry.amount())).red()
        } else {
            money(entry.amount()).green()
        };
        table.add_row(vec![
            Cell::new(&row.created_at),
            Cell::new(entry.kind()),
            Cell::new(amount),
            Cell::new(money(entry.balance_after())),
            Cell::new(entry.details()),
        ]);
    }
    table
}

fn write_csv(path: &str, rows: &[LedgerRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(["date", "type", "amount", "balance_after", "details"])?;
    for row in rows {
        let entry = &row.entry;
        let amount = format!("{:.2}", entry.amount());
        let balance = format!("{:.2}", entry.balance_after());
        writer.write_record([
            row.created_at.as_str(),
            entry.kind().as_str(),
            amount.as_str(),
            balance.as_str(),
            entry.details(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn overdraft(account: Option<String>, set: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    match set {
        Some(raw) => {
            let limit = parse_amount(&raw)?;
            let stored = teller::set_overdraft(&mut session.directory, &session.user, &iban, limit)?;
            println!(
                "Overdraft for {} set to {}. Available: {}",
                iban,
                money(stored.account.overdraft_limit()),
                money(stored.account.available())
            );
        }
        None => {
            let stored = teller::find(&session.directory, &session.user, &iban)?;
            println!(
                "Overdraft for {}: {}. Available: {}",
                iban,
                money(stored.account.overdraft_limit()),
                money(stored.account.available())
            );
        }
    }
    Ok(())
}

pub fn export(account: Option<String>, output: Option<String>) -> Result<()> {
    let session = open_session()?;
    let iban = session.target_iban(account)?;
    let stored = teller::load_account(&session.directory, &session.user, &iban)?;
    let json = serde_json::to_string_pretty(&stored.account.snapshot())?;

    match output {
        Some(path) => {
            std::fs::write(&path, format!("{json}\n"))?;
            println!("Exported {iban} to {path}");
        }
        None => println!("{json}"),
    }
    Ok(())
}
