use std::io::Write;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::open_session;
use crate::error::Result;
use crate::fmt::money;
use crate::money::parse_amount;
use crate::settings::save_settings;
use crate::teller;

pub fn open(owner: &str, iban: &str, balance: &str, overdraft: &str) -> Result<()> {
    let mut session = open_session()?;
    let balance = parse_amount(balance)?;
    let overdraft = parse_amount(overdraft)?;

    let stored = teller::open_account(&mut session.directory, &session.user, owner, iban, balance, overdraft)?;
    session.settings.selected_iban = Some(stored.account.iban().to_string());
    save_settings(&session.settings)?;

    println!("Account created and selected: {}", stored.account);
    Ok(())
}

pub fn list() -> Result<()> {
    let session = open_session()?;
    let accounts = teller::list(&session.directory, &session.user)?;
    if accounts.is_empty() {
        println!("No accounts yet. Open one with `bank accounts open`.");
        return Ok(());
    }

    let selected = session.settings.selected_iban.as_deref();
    let mut table = Table::new();
    let mut header = vec!["", "IBAN", "Owner", "Balance", "Overdraft"];
    if session.user.is_admin {
        header.push("User");
    }
    table.set_header(header);

    for stored in &accounts {
        let account = &stored.account;
        let marker = if selected == Some(account.iban()) { "*" } else { "" };
        let balance = if account.balance().is_sign_negative() && !account.balance().is_zero() {
            money(account.balance()).red()
        } else {
            money(account.balance()).green()
        };
        let mut row = vec![
            Cell::new(marker),
            Cell::new(account.iban()),
            Cell::new(account.owner()),
            Cell::new(balance),
            Cell::new(money(account.overdraft_limit())),
        ];
        if session.user.is_admin {
            row.push(Cell::new(&stored.user_name));
        }
        table.add_row(row);
    }
    println!("Accounts\n{table}");
    Ok(())
}

pub fn show(account: Option<String>) -> Result<()> {
    let session = open_session()?;
    let iban = session.target_iban(account)?;
    let stored = teller::find(&session.directory, &session.user, &iban)?;
    let account = &stored.account;

    println!("Owner:      {}", account.owner());
    println!("IBAN:       {}", account.iban());
    println!("Balance:    {}", money(account.balance()));
    println!("Overdraft:  {}", money(account.overdraft_limit()));
    println!("Available:  {}", money(account.available()));
    if session.user.is_admin {
        println!("User:       {}", stored.user_name);
    }
    Ok(())
}

pub fn delete(account: Option<String>, yes: bool) -> Result<()> {
    let mut session = open_session()?;
    let iban = session.target_iban(account)?;
    // Fail on unknown IBANs before asking.
    let stored = teller::find(&session.directory, &session.user, &iban)?;

    if !yes {
        print!(
            "Delete {} ({}) with its history and bills? [y/N] ",
            stored.account.iban(),
            stored.account.owner()
        );
        std::io::stdout().flush()?;
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !matches!(input.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    teller::delete_account(&mut session.directory, &session.user, &iban)?;

    println!("Deleted account {iban}.");

    if session.settings.selected_iban.as_deref() == Some(iban.as_str()) {
        let remaining = teller::list(&session.directory, &session.user)?;
        session.settings.selected_iban = remaining.first().map(|s| s.account.iban().to_string());
        save_settings(&session.settings)?;
        match &session.settings.selected_iban {
            Some(next) => println!("Selected {next}."),
            None => println!("No accounts left."),
        }
    }
    Ok(())
}
