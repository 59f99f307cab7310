use assert_cmd::Command;
use predicates::prelude::*;

/// Every command runs against a throwaway HOME so settings and data stay isolated.
fn bank(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::cargo_bin("bank").unwrap();
    cmd.env("HOME", home.path())
        .env("NO_COLOR", "1")
        .env_remove("OPENAI_API_KEY")
        .env_remove("RUST_LOG");
    cmd
}

fn setup() -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let data_dir = home.path().join("data");
    bank(&home)
        .args(["init", "--data-dir", data_dir.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized bank at"));
    bank(&home)
        .args(["register", "alice", "--password-stdin"])
        .write_stdin("secret\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("User 'alice' created and logged in as admin."));
    home
}

#[test]
fn test_init_creates_only_the_database() {
    let home = setup();
    let data_dir = home.path().join("data");
    assert!(data_dir.join("bank.db").exists());
    assert!(!data_dir.join("exports").exists());
}

#[test]
fn test_commands_before_init_fail() {
    let home = tempfile::tempdir().unwrap();
    bank(&home)
        .args(["accounts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("bank init"));
}

#[test]
fn test_account_lifecycle() {
    let home = setup();

    bank(&home)
        .args(["accounts", "open", "Alice", "--iban", "BG01", "--balance", "100", "--overdraft", "-50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Account created and selected"));

    bank(&home)
        .args(["deposit", "25"])
        .assert()
        .success()
        .stdout(predicate::str::contains("New balance: 125.00"));

    bank(&home)
        .args(["withdraw", "500"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient funds"));

    bank(&home)
        .args(["withdraw", "175"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remaining balance: -50.00"));

    bank(&home)
        .args(["withdraw", "79228162514264337593543950335"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient funds"));

    bank(&home)
        .args(["history"])
        .assert()
        .success()
        .stdout(predicate::str::contains("OPEN"))
        .stdout(predicate::str::contains("DEPOSIT"))
        .stdout(predicate::str::contains("WITHDRAW"));

    bank(&home)
        .args(["overdraft", "--set", "5"])
        .assert()
        .failure();
}

#[test]
fn test_transfer_and_export() {
    let home = setup();

    bank(&home)
        .args(["accounts", "open", "Alice", "--iban", "BG01", "--balance", "100"])
        .assert()
        .success();
    bank(&home)
        .args(["accounts", "open", "Bob", "--iban", "BG02", "--balance", "0"])
        .assert()
        .success();

    bank(&home)
        .args(["transfer", "BG02", "30", "--account", "BG01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Transferred 30.00 from BG01 to BG02."));

    bank(&home)
        .args(["transfer", "BG01", "31"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Insufficient funds"));

    bank(&home)
        .args(["export", "--account", "BG02"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"iban\": \"BG02\""))
        .stdout(predicate::str::contains("TRANSFER_IN"));

    let csv_path = home.path().join("history.csv");
    bank(&home)
        .args(["history", "--account", "BG01", "--csv", csv_path.to_str().unwrap()])
        .assert()
        .success();
    let csv = std::fs::read_to_string(&csv_path).unwrap();
    assert!(csv.starts_with("date,type,amount,balance_after,details"));
    assert!(csv.contains("TRANSFER_OUT,30.00,70.00,to BG02"));
}

#[test]
fn test_assistant_commands() {
    let home = setup();
    bank(&home)
        .args(["accounts", "open", "Alice", "--iban", "BG01", "--balance", "100"])
        .assert()
        .success();

    bank(&home)
        .args(["ask", "deposit", "50"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deposited 50.00. New balance: 150.00."));

    bank(&home)
        .args(["ask", "iban"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Current IBAN: BG01"));

    // No API key: the question is answered with a tagged error, not a failure.
    bank(&home)
        .args(["ask", "What", "is", "an", "overdraft?"])
        .assert()
        .success()
        .stderr(predicate::str::contains("[OpenAI error]"));

    bank(&home).args(["ask", "reset"]).assert().success();
    bank(&home)
        .args(["ask", "balance"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no account selected"));
}

#[test]
fn test_users_only_see_their_accounts() {
    let home = setup();
    bank(&home)
        .args(["accounts", "open", "Alice", "--iban", "BG01", "--balance", "100"])
        .assert()
        .success();

    bank(&home)
        .args(["register", "bob", "--password-stdin"])
        .write_stdin("hunter2\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("logged in as user"));

    bank(&home)
        .args(["deposit", "5", "--account", "BG01"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not found"));

    bank(&home)
        .args(["login", "alice", "--password-stdin"])
        .write_stdin("wrong\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid username or password"));

    bank(&home)
        .args(["login", "alice", "--password-stdin"])
        .write_stdin("secret\n")
        .assert()
        .success();
    bank(&home)
        .args(["deposit", "5", "--account", "BG01"])
        .assert()
        .success();

    bank(&home).args(["logout"]).assert().success();
    bank(&home)
        .args(["accounts", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
