use chrono::NaiveDate;
use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use crate::cli::open_session;
use crate::directory::AccountDirectory;
use crate::error::{BankError, Result};
use crate::fmt::money;
use crate::money::parse_amount;
use crate::teller;

fn parse_due(raw: &str) -> Result<String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map(|d| d.format("%Y-%m-%d").to_string())
        .map_err(|_| BankError::validation(format!("Invalid due date '{raw}', expected YYYY-MM-DD")))
}

pub fn add(title: &str, due: &str, amount: &str, account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    let title = title.trim();
    if title.is_empty() {
        return Err(BankError::validation("Bill title cannot be empty"));
    }
    let due_date = parse_due(due)?;
    let amount = parse_amount(amount)?;
    if amount <= Decimal::ZERO {
        return Err(BankError::validation("Bill amount must be positive"));
    }

    let stored = teller::find(&session.directory, &session.user, &iban)?;
    let id = session.directory.add_bill(stored.id, title, &due_date, amount)?;
    tracing::info!(iban = %iban, bill = id, "added bill");
    println!("Added bill #{id}: {title} {} due {due_date}", money(amount));
    Ok(())
}

pub fn list(all: bool, account: Option<String>) -> Result<()> {
    let session = open_session()?;
    let iban = session.target_iban(account)?;
    let stored = teller::find(&session.directory, &session.user, &iban)?;
    let bills = session.directory.load_bills(stored.id, !all)?;

    if bills.is_empty() {
        println!("No bills.");
        return Ok(());
    }

    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    let mut table = Table::new();
    table.set_header(vec!["ID", "Title", "Due", "Amount", "Status"]);
    let mut unpaid_total = Decimal::ZERO;
    for bill in &bills {
        let status = if bill.is_paid {
            "paid".green()
        } else if bill.due_date < today {
            "overdue".red()
        } else {
            "unpaid".yellow()
        };
        if !bill.is_paid {
            unpaid_total += bill.amount;
        }
        table.add_row(vec![
            Cell::new(bill.id),
            Cell::new(&bill.title),
            Cell::new(&bill.due_date),
            Cell::new(money(bill.amount)),
            Cell::new(status),
        ]);
    }
    println!("Bills for {iban}\n{table}");
    println!("Unpaid total: {}", money(unpaid_total));
    Ok(())
}

pub fn pay(id: i64, account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    let stored = teller::find(&session.directory, &session.user, &iban)?;
    session.directory.mark_bill_paid(stored.id, id)?;
    tracing::info!(iban = %iban, bill = id, "bill paid");
    println!("Marked bill #{id} as paid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_due() {
        assert_eq!(parse_due("2026-03-05").unwrap(), "2026-03-05");
        assert_eq!(parse_due(" 2026-12-01 ").unwrap(), "2026-12-01");
        assert!(matches!(parse_due("05/03/2026"), Err(BankError::Validation(_))));
        assert!(parse_due("2026-02-30").is_err());
    }
}
