pub mod accounts;
pub mod ask;
pub mod bills;
pub mod init;
pub mod ledger;
pub mod session;
pub mod status;

use clap::{Parser, Subcommand};

use crate::directory::SqliteDirectory;
use crate::error::{BankError, Result};
use crate::models::User;
use crate::settings::{db_path, load_settings, Settings};

/// Everything a command needs once the user is logged in.
pub(crate) struct Session {
    pub settings: Settings,
    pub directory: SqliteDirectory,
    pub user: User,
}

impl Session {
    /// The account a command acts on: `--account` if given, else the selection.
    pub fn target_iban(&self, account: Option<String>) -> Result<String> {
        account
            .or_else(|| self.settings.selected_iban.clone())
            .ok_or_else(|| {
                BankError::NotFound("no account selected (pass --account or run `bank select <iban>`)".to_string())
            })
    }
}

pub(crate) fn open_directory(settings: &Settings) -> Result<SqliteDirectory> {
    let path = db_path(settings);
    if !path.exists() {
        return Err(BankError::Settings(format!(
            "No database found at {}\nRun `bank init` to create one.",
            path.display()
        )));
    }
    SqliteDirectory::open(&path)
}

pub(crate) fn open_session() -> Result<Session> {
    let settings = load_settings();
    let directory = open_directory(&settings)?;
    let user = crate::auth::session_user(&directory, settings.current_user.as_deref())?;
    Ok(Session {
        settings,
        directory,
        user,
    })
}

#[derive(Parser)]
#[command(name = "bank", about = "Personal bank accounts with an overdraft-aware ledger.")]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for bank data (default: ~/.local/share/bank-assistant)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Create a user. The first user becomes the admin.
    Register {
        username: String,
        /// Read the password from the first line of stdin instead of prompting
        #[arg(long = "password-stdin")]
        password_stdin: bool,
    },
    /// Log in and remember the user for later commands.
    Login {
        username: String,
        #[arg(long = "password-stdin")]
        password_stdin: bool,
    },
    /// Forget the logged-in user and selected account.
    Logout,
    /// Show session, database and summary statistics.
    Status,
    /// Manage accounts.
    Accounts {
        #[command(subcommand)]
        command: AccountsCommands,
    },
    /// Select the account later commands act on.
    Select {
        iban: String,
    },
    /// Deposit money.
    Deposit {
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Account IBAN (default: selected account)
        #[arg(long)]
        account: Option<String>,
    },
    /// Withdraw money, respecting the overdraft limit.
    Withdraw {
        #[arg(allow_hyphen_values = true)]
        amount: String,
        #[arg(long)]
        account: Option<String>,
    },
    /// Transfer money to another account.
    Transfer {
        /// Receiving account IBAN
        to: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// Sending account IBAN (default: selected account)
        #[arg(long)]
        account: Option<String>,
    },
    /// Show the transaction history.
    History {
        #[arg(long)]
        account: Option<String>,
        /// Also write the history to a CSV file
        #[arg(long)]
        csv: Option<String>,
    },
    /// Show or change the overdraft limit.
    Overdraft {
        #[arg(long)]
        account: Option<String>,
        /// New limit (zero or negative)
        #[arg(long, allow_hyphen_values = true)]
        set: Option<String>,
    },
    /// Print the account and its ledger as JSON.
    Export {
        #[arg(long)]
        account: Option<String>,
        /// Output file (default: stdout)
        #[arg(long)]
        output: Option<String>,
    },
    /// Ask the assistant: balance, deposit <n>, withdraw <n>, history, owner, iban,
    /// reset, set overdraft <n>, overdraft, or any question.
    Ask {
        #[arg(required = true, num_args = 1.., allow_hyphen_values = true)]
        text: Vec<String>,
        #[arg(long)]
        account: Option<String>,
    },
    /// Track bills for an account.
    Bills {
        #[command(subcommand)]
        command: BillsCommands,
    },
}

#[derive(Subcommand)]
pub enum AccountsCommands {
    /// Open a new account and select it.
    Open {
        /// Account holder name
        owner: String,
        #[arg(long)]
        iban: String,
        /// Opening balance
        #[arg(long, allow_hyphen_values = true)]
        balance: String,
        /// Overdraft limit, zero or negative
        #[arg(long, allow_hyphen_values = true, default_value = "0")]
        overdraft: String,
    },
    /// List accounts (admins see every account).
    List,
    /// Show account details.
    Show {
        #[arg(long)]
        account: Option<String>,
    },
    /// Delete an account with its history and bills.
    Delete {
        #[arg(long)]
        account: Option<String>,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
pub enum BillsCommands {
    /// Add a bill.
    Add {
        title: String,
        /// Due date: YYYY-MM-DD
        #[arg(long)]
        due: String,
        #[arg(long)]
        amount: String,
        #[arg(long)]
        account: Option<String>,
    },
    /// List unpaid bills.
    List {
        /// Include paid bills
        #[arg(long)]
        all: bool,
        #[arg(long)]
        account: Option<String>,
    },
    /// Mark a bill as paid.
    Pay {
        /// Bill ID (shown in `bank bills list`)
        id: i64,
        #[arg(long)]
        account: Option<String>,
    },
}
