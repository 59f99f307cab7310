use colored::Colorize;

use crate::ai_client::{Completion, OpenAiClient, Unavailable};
use crate::assistant::{Assistant, Reply};
use crate::cli::ledger::history_table;
use crate::cli::open_session;
use crate::error::Result;
use crate::settings::{save_settings, AiSettings};

fn backend(ai: &AiSettings) -> Box<dyn Completion> {
    match OpenAiClient::from_settings(ai) {
        Ok(client) => Box::new(client),
        Err(e) => {
            tracing::debug!(error = %e, "remote assistant disabled");
            Box::new(Unavailable::new(e.to_string()))
        }
    }
}

pub fn run(text: &[String], account: Option<String>) -> Result<()> {
    let mut session = open_session()?;
    let selected = account.or_else(|| session.settings.selected_iban.clone());
    let completion = backend(&session.settings.ai);
    let question = text.join(" ");

    let reply = {
        let mut assistant = Assistant::new(&mut session.directory, completion.as_ref(), &session.user);
        assistant.handle(selected.as_deref(), &question)?
    };

    match reply {
        Reply::Text(msg) => println!("{msg}"),
        Reply::History(rows) if rows.is_empty() => println!("No transactions yet."),
        Reply::History(rows) => println!("{}", history_table(&rows)),
        Reply::Cleared => {
            session.settings.selected_iban = None;
            save_settings(&session.settings)?;
            println!("Selection cleared.");
        }
        Reply::Remote(answer) => println!("{}", textwrap::fill(&answer, 80)),
        Reply::RemoteError(msg) => eprintln!("{}", msg.red()),
    }
    Ok(())
}
