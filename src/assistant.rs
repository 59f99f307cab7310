//! Text commands over the selected account, with a remote completion fallback.
//!
//! Grammar (case-insensitive, first word decides):
//! `balance`, `deposit <amount>`, `withdraw <amount>`, `history`, `owner`, `iban`,
//! `reset`, `set overdraft <amount>`, `overdraft`. Anything else is a question.

use rust_decimal::Decimal;

use crate::account::Account;
use crate::ai_client::Completion;
use crate::directory::AccountDirectory;
use crate::error::{BankError, Result};
use crate::models::{LedgerRow, User};
use crate::money::parse_amount;
use crate::teller;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Balance,
    Deposit(Decimal),
    Withdraw(Decimal),
    History,
    Owner,
    Iban,
    Reset,
    SetOverdraft(Decimal),
    ShowOverdraft,
    Ask(String),
}

fn amount_arg(arg: Option<&str>, usage: &str) -> Result<Decimal> {
    match arg {
        Some(raw) => parse_amount(raw),
        None => Err(BankError::validation(format!("Use: {usage}"))),
    }
}

impl Command {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BankError::validation("Question cannot be empty"));
        }
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();

        let command = match words[0] {
            "balance" | "баланс" => Self::Balance,
            "deposit" => Self::Deposit(amount_arg(words.get(1).copied(), "deposit <amount>")?),
            "withdraw" => Self::Withdraw(amount_arg(words.get(1).copied(), "withdraw <amount>")?),
            "history" | "история" => Self::History,
            "owner" | "собственик" => Self::Owner,
            "iban" => Self::Iban,
            "reset" => Self::Reset,
            "set" if matches!(words.get(1), Some(&"overdraft") | Some(&"овърдрафт")) => {
                Self::SetOverdraft(amount_arg(words.get(2).copied(), "set overdraft <amount>")?)
            }
            "overdraft" | "овърдрафт" => Self::ShowOverdraft,
            _ => Self::Ask(text.to_string()),
        };
        Ok(command)
    }
}

#[derive(Debug)]
pub enum Reply {
    Text(String),
    History(Vec<LedgerRow>),
    /// The session selection should be dropped.
    Cleared,
    Remote(String),
    RemoteError(String),
}

pub struct Assistant<'a, D: AccountDirectory> {
    directory: &'a mut D,
    completion: &'a dyn Completion,
    user: &'a User,
}

impl<'a, D: AccountDirectory> Assistant<'a, D> {
    pub fn new(directory: &'a mut D, completion: &'a dyn Completion, user: &'a User) -> Self {
        Self {
            directory,
            completion,
            user,
        }
    }

    pub fn handle(&mut self, selected: Option<&str>, text: &str) -> Result<Reply> {
        let command = Command::parse(text)?;
        tracing::debug!(?command, "assistant command");
        if command == Command::Reset {
            return Ok(Reply::Cleared);
        }

        let iban = selected.ok_or_else(|| {
            BankError::NotFound("no account selected (run `bank select <iban>`)".to_string())
        })?;
        let account = teller::find(&*self.directory, self.user, iban)?.account;

        let reply = match command {
            Command::Balance => Reply::Text(format!(
                "Current account {} ({}) has a balance of {:.2}",
                account.owner(),
                account.iban(),
                account.balance()
            )),
            Command::Deposit(amount) => {
                let stored = teller::deposit(&mut *self.directory, self.user, iban, amount)?;
                Reply::Text(format!(
                    "Deposited {:.2}. New balance: {:.2}.",
                    amount,
                    stored.account.balance()
                ))
            }
            Command::Withdraw(amount) => {
                let stored = teller::withdraw(&mut *self.directory, self.user, iban, amount)?;
                Reply::Text(format!(
                    "Withdrew {:.2}. Remaining balance: {:.2}.",
                    amount,
                    stored.account.balance()
                ))
            }
            Command::History => Reply::History(teller::history(&*self.directory, self.user, iban)?),
            Command::Owner => Reply::Text(format!("Current account owner: {}", account.owner())),
            Command::Iban => Reply::Text(format!("Current IBAN: {}", account.iban())),
            Command::SetOverdraft(limit) => {
                let stored = teller::set_overdraft(&mut *self.directory, self.user, iban, limit)?;
                Reply::Text(format!("Overdraft set to {:.2}", stored.account.overdraft_limit()))
            }
            Command::ShowOverdraft => Reply::Text(format!(
                "Current overdraft limit is {:.2}",
                account.overdraft_limit()
            )),
            Command::Ask(question) => match self.completion.complete(&build_prompt(&account, &question)) {
                Ok(answer) => Reply::Remote(answer),
                Err(BankError::RemoteService(msg)) => Reply::RemoteError(format!("[OpenAI error] {msg}")),
                Err(e) => Reply::RemoteError(format!("[OpenAI error] {e}")),
            },
            Command::Reset => Reply::Cleared,
        };
        Ok(reply)
    }
}

pub fn build_prompt(account: &Account, question: &str) -> String {
    format!(
        "You are a banking assistant inside a small demo app.\n\
         You can NOT actually move real money, but you can explain things.\n\
         Current account:\n\
         - Owner: {}\n\
         - IBAN: {}\n\
         - Balance: {:.2}\n\
         - Overdraft limit: {:.2}\n\n\
         User question: {}\n\n\
         Answer briefly and clearly. If the user asks to deposit or withdraw, \
         explain what would happen, but do not say that you executed it yourself.",
        account.owner(),
        account.iban(),
        account.balance(),
        account.overdraft_limit(),
        question
    )
}
