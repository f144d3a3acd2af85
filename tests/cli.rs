use assert_cmd::Command;
use predicates::prelude::*;

fn clientbook(home: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("clientbook").unwrap();
    cmd.env("HOME", home)
        .env_remove("CLIENTBOOK_API_URL")
        .env_remove("RUST_LOG");
    cmd
}

#[test]
fn help_lists_commands() {
    let home = tempfile::tempdir().unwrap();
    clientbook(home.path())
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clients"))
        .stdout(predicate::str::contains("payments"))
        .stdout(predicate::str::contains("browse"));
}

#[test]
fn dry_run_import_parses_without_uploading() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("clients.csv");
    std::fs::write(&file, "name,phone,fixedAmount\n\"Doe, Jane\",555,100\nBob,444,250\n").unwrap();

    clientbook(home.path())
        .args(["clients", "import"])
        .arg(&file)
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains("Doe, Jane"))
        .stdout(predicate::str::contains("2 records parsed"));
}

#[test]
fn import_rejects_non_csv_extension() {
    let home = tempfile::tempdir().unwrap();
    let file = home.path().join("clients.txt");
    std::fs::write(&file, "name,phone\nA,1\n").unwrap();

    clientbook(home.path())
        .args(["clients", "import"])
        .arg(&file)
        .arg("--dry-run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Please select a valid CSV file"));
}

#[test]
fn config_set_then_show() {
    let home = tempfile::tempdir().unwrap();
    clientbook(home.path())
        .args(["config", "set", "items_per_page", "25"])
        .assert()
        .success();
    clientbook(home.path())
        .args(["config", "set", "currency_symbol", "EUR "])
        .assert()
        .success();

    clientbook(home.path())
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("items_per_page   25"))
        .stdout(predicate::str::contains("not logged in"));

    clientbook(home.path())
        .args(["config", "set", "items_per_page", "0"])
        .assert()
        .failure();
}

#[test]
fn env_override_shows_in_config() {
    let home = tempfile::tempdir().unwrap();
    clientbook(home.path())
        .env("CLIENTBOOK_API_URL", "http://localhost:9999")
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:9999"));
}

#[test]
fn list_without_session_fails_before_any_request() {
    let home = tempfile::tempdir().unwrap();
    clientbook(home.path())
        .args(["clients", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not logged in"));
}
