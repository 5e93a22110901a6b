mod common;

use common::{CliTest, PARENT, dataset};

// ============================================================================
// show
// ============================================================================

#[test]
fn test_show_prints_both_collections() {
    let t = CliTest::new();
    let data = t.write_dataset(&dataset(3, 2));

    let stdout = t.run_success(
        &["show", "--data", data.to_str().unwrap(), "--parent", PARENT],
        "",
    );
    assert!(stdout.contains("Contacts (3 of 3)"));
    assert!(stdout.contains("Opportunities (2 of 2)"));
    assert!(stdout.contains("Contact 0001"));
    assert!(stdout.contains("/0060002"));
}

#[test]
fn test_show_json_uses_configured_page_size() {
    let t = CliTest::new();
    let data = t.write_dataset(&dataset(12, 0));
    let config = t.write_config("page_size: 5\nlink_prefix: /r/\n");

    let stdout = t.run_success(
        &[
            "show",
            "--data",
            data.to_str().unwrap(),
            "--parent",
            PARENT,
            "--json",
            "--config",
            config.to_str().unwrap(),
        ],
        "",
    );
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["parent"], PARENT);
    assert_eq!(json["contacts"]["rows"].as_array().unwrap().len(), 5);
    assert_eq!(json["contacts"]["total_count"], 12);
    assert_eq!(json["contacts"]["has_more"], true);
    assert_eq!(json["contacts"]["rows"][0]["link"], "/r/0030001");
    assert_eq!(json["opportunities"]["has_more"], false);
}

#[test]
fn test_show_unknown_parent_fails() {
    let t = CliTest::new();
    let data = t.write_dataset(&dataset(1, 1));

    let stderr = t.run_failure(&["show", "--data", data.to_str().unwrap(), "--parent", "zzz"]);
    assert!(stderr.contains("parent record 'zzz' not found"));
}

#[test]
fn test_show_missing_dataset_fails() {
    let t = CliTest::new();
    let stderr = t.run_failure(&["show", "--data", "nope.yaml", "--parent", PARENT]);
    assert!(stderr.contains("Failed to read dataset"));
}

// ============================================================================
// shell
// ============================================================================

#[test]
fn test_shell_session() {
    let t = CliTest::new();
    let data = t.write_dataset(&dataset(60, 4));
    let config = t.write_config("page_size: 25\nsearch_debounce_ms: 20\n");

    let script = "\
more contacts
search c Contact 0002
search c
edit o 0060001 stage_name=Negotiation
save o
delete c 0030001
bogus
quit
show
";
    let stdout = t.run_success(
        &[
            "shell",
            "--data",
            data.to_str().unwrap(),
            "--parent",
            PARENT,
            "--config",
            config.to_str().unwrap(),
        ],
        script,
    );

    assert!(stdout.contains("Loaded 25 of 60 contacts"));
    assert!(stdout.contains("Loaded 50 of 60 contacts"));
    // Contact 0002 and Contact 0020 .. Contact 0029
    assert!(stdout.contains("11 contacts match 'Contact 0002'"));
    assert!(stdout.contains("staged edit for"));
    assert!(stdout.contains("Saved 1 opportunities record(s)"));
    assert!(stdout.contains("Negotiation"));
    assert!(stdout.contains("Deleted Contact 0001 from contacts"));
    assert!(stdout.contains("Contacts (50 of 59)"));
}

#[test]
fn test_shell_reports_bad_commands_and_continues() {
    let t = CliTest::new();
    let data = t.write_dataset(&dataset(2, 0));

    let output = t.run(
        &["shell", "--data", data.to_str().unwrap(), "--parent", PARENT],
        "more accounts\nsave c\n",
    );
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("unknown collection 'accounts'"));
    assert!(stdout.contains("No pending contacts edits"));
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_path_uses_explicit_file() {
    let t = CliTest::new();
    let path = t.temp_dir.path().join("custom.yaml");
    let stdout = t.run_success(&["config", "path", "--config", path.to_str().unwrap()], "");
    assert_eq!(stdout.trim(), path.to_str().unwrap());
}

#[test]
fn test_config_show_json() {
    let t = CliTest::new();
    let config = t.write_config("page_size: 7\n");

    let stdout = t.run_success(
        &["config", "show", "--json", "--config", config.to_str().unwrap()],
        "",
    );
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["page_size"], 7);
    assert_eq!(json["search_debounce_ms"], 300);
    assert_eq!(json["contacts"]["label"], "Contacts");
}

#[test]
fn test_invalid_config_fails() {
    let t = CliTest::new();
    let config = t.write_config("page_size: 0\n");
    let stderr = t.run_failure(&["config", "show", "--config", config.to_str().unwrap()]);
    assert!(stderr.contains("page_size must be greater than zero"));
}
