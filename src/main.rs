mod account;
mod ai_client;
mod assistant;
mod auth;
mod cli;
mod db;
mod directory;
mod error;
mod fmt;
mod logger;
mod models;
mod money;
mod settings;
mod teller;

use clap::Parser;

use cli::{AccountsCommands, BillsCommands, Cli, Commands};

fn main() {
    let cli = Cli::parse();
    logger::init_cli_logger(cli.verbose);

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Register {
            username,
            password_stdin,
        } => cli::session::register(&username, password_stdin),
        Commands::Login {
            username,
            password_stdin,
        } => cli::session::login(&username, password_stdin),
        Commands::Logout => cli::session::logout(),
        Commands::Status => cli::status::run(),
        Commands::Accounts { command } => match command {
            AccountsCommands::Open {
                owner,
                iban,
                balance,
                overdraft,
            } => cli::accounts::open(&owner, &iban, &balance, &overdraft),
            AccountsCommands::List => cli::accounts::list(),
            AccountsCommands::Show { account } => cli::accounts::show(account),
            AccountsCommands::Delete { account, yes } => cli::accounts::delete(account, yes),
        },
        Commands::Select { iban } => cli::session::select(&iban),
        Commands::Deposit { amount, account } => cli::ledger::deposit(&amount, account),
        Commands::Withdraw { amount, account } => cli::ledger::withdraw(&amount, account),
        Commands::Transfer { to, amount, account } => cli::ledger::transfer(&to, &amount, account),
        Commands::History { account, csv } => cli::ledger::history(account, csv),
        Commands::Overdraft { account, set } => cli::ledger::overdraft(account, set),
        Commands::Export { account, output } => cli::ledger::export(account, output),
        Commands::Ask { text, account } => cli::ask::run(&text, account),
        Commands::Bills { command } => match command {
            BillsCommands::Add {
                title,
                due,
                amount,
                account,
            } => cli::bills::add(&title, &due, &amount, account),
            BillsCommands::List { all, account } => cli::bills::list(all, account),
            BillsCommands::Pay { id, account } => cli::bills::pay(id, account),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
