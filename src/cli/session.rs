use std::io::BufRead;

use zeroize::Zeroize;

use crate::auth;
use crate::cli::{open_directory, open_session};
use crate::error::Result;
use crate::settings::{load_settings, save_settings};
use crate::teller;

fn read_password(from_stdin: bool) -> Result<String> {
    if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        let password = line.trim_end_matches(&['\r', '\n'][..]).to_string();
        line.zeroize();
        Ok(password)
    } else {
        Ok(rpassword::prompt_password("Password: ")?)
    }
}

pub fn register(username: &str, password_stdin: bool) -> Result<()> {
    let mut settings = load_settings();
    let mut directory = open_directory(&settings)?;

    let mut password = read_password(password_stdin)?;
    let result = auth::register(&mut directory, username, &password);
    password.zeroize();
    let user = result?;

    settings.current_user = Some(user.username.clone());
    settings.selected_iban = None;
    save_settings(&settings)?;

    let role = if user.is_admin { "admin" } else { "user" };
    println!("User '{}' created and logged in as {role}.", user.username);
    Ok(())
}

pub fn login(username: &str, password_stdin: bool) -> Result<()> {
    let mut settings = load_settings();
    let directory = open_directory(&settings)?;

    let mut password = read_password(password_stdin)?;
    let result = auth::login(&directory, username, &password);
    password.zeroize();
    let user = result?;

    settings.current_user = Some(user.username.clone());
    settings.selected_iban = None;
    save_settings(&settings)?;

    let role = if user.is_admin { "admin" } else { "user" };
    println!("Logged in as {} ({role}).", user.username);
    Ok(())
}

pub fn logout() -> Result<()> {
    let mut settings = load_settings();
    settings.current_user = None;
    settings.selected_iban = None;
    save_settings(&settings)?;
    println!("Logged out.");
    Ok(())
}

pub fn select(iban: &str) -> Result<()> {
    let mut session = open_session()?;
    let stored = teller::find(&session.directory, &session.user, iban)?;
    let account = &stored.account;
    session.settings.selected_iban = Some(account.iban().to_string());
    save_settings(&session.settings)?;
    println!(
        "Selected {}. Balance: {:.2} with an overdraft of {:.2}",
        account.iban(),
        account.balance(),
        account.overdraft_limit()
    );
    Ok(())
}
