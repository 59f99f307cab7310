use crate::db::get_connection;
use crate::error::Result;
use crate::settings::{db_path, load_settings};

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = db_path(&settings);

    println!("User:       {}", settings.current_user.as_deref().unwrap_or("(not logged in)"));
    println!("Selected:   {}", settings.selected_iban.as_deref().unwrap_or("(none)"));
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("AI model:   {}", settings.ai.model);

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let users: i64 = conn.query_row("SELECT count(*) FROM users", [], |r| r.get(0))?;
        let accounts: i64 = conn.query_row("SELECT count(*) FROM accounts", [], |r| r.get(0))?;
        let transactions: i64 = conn.query_row("SELECT count(*) FROM transactions", [], |r| r.get(0))?;
        let unpaid: i64 = conn.query_row("SELECT count(*) FROM bills WHERE is_paid = 0", [], |r| r.get(0))?;

        println!();
        println!("Users:         {users}");
        println!("Accounts:      {accounts}");
        println!("Transactions:  {transactions}");
        println!("Unpaid bills:  {unpaid}");
    } else {
        println!();
        println!("Database not found. Run `bank init` to set up.");
    }

    Ok(())
}
