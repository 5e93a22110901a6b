#![allow(dead_code)]

pub mod gateway;

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::Arc;

use related_lists::gateway::ParentRecord;
use related_lists::{Config, Dataset, MemoryStore, Row};
use tempfile::TempDir;

pub use gateway::{Op, ScriptedGateway};

pub const PARENT: &str = "001A";

pub fn contact(i: usize) -> Row {
    Row::new(format!("003{i:04}"))
        .with("name", format!("Contact {i:04}"))
        .with("email", format!("contact{i}@example.com"))
        .with("title", if i % 2 == 0 { "Engineer" } else { "Analyst" })
}

pub fn opportunity(i: usize) -> Row {
    Row::new(format!("006{i:04}"))
        .with("name", format!("Deal {i:04}"))
        .with("stage_name", if i % 3 == 0 { "Closed Won" } else { "Prospecting" })
        .with("amount", (i * 1000) as u64)
}

/// One parent with `contacts` contacts and `opportunities` opportunities.
pub fn dataset(contacts: usize, opportunities: usize) -> Dataset {
    let mut parent = ParentRecord::new(PARENT);
    parent.contacts = (1..=contacts).map(contact).collect();
    parent.opportunities = (1..=opportunities).map(opportunity).collect();
    Dataset {
        parents: vec![parent],
    }
}

pub fn store(contacts: usize, opportunities: usize) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(dataset(contacts, opportunities)))
}

pub fn config(page_size: usize) -> Config {
    Config {
        page_size,
        ..Config::default()
    }
}

/// Path to the built binary
pub fn related_lists_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_related-lists"))
}

/// Runs the binary against files in an isolated temp directory
pub struct CliTest {
    pub temp_dir: TempDir,
}

impl CliTest {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        CliTest { temp_dir }
    }

    /// Write `dataset` as YAML and return its path
    pub fn write_dataset(&self, dataset: &Dataset) -> PathBuf {
        let path = self.temp_dir.path().join("data.yaml");
        let yaml = serde_yaml_ng::to_string(dataset).expect("Failed to serialize dataset");
        fs::write(&path, yaml).expect("Failed to write dataset");
        path
    }

    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.temp_dir.path().join("config.yaml");
        fs::write(&path, content).expect("Failed to write config");
        path
    }

    pub fn run(&self, args: &[&str], stdin: &str) -> Output {
        let mut child = Command::new(related_lists_binary())
            .args(args)
            .current_dir(self.temp_dir.path())
            .env("NO_COLOR", "1")
            .env_remove("RELATED_LISTS_PAGE_SIZE")
            .env_remove("RELATED_LISTS_DEBOUNCE_MS")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("Failed to execute related-lists");

        child
            .stdin
            .take()
            .expect("Failed to get stdin")
            .write_all(stdin.as_bytes())
            .expect("Failed to write stdin");
        child.wait_with_output().expect("Failed to wait for related-lists")
    }

    pub fn run_success(&self, args: &[&str], stdin: &str) -> String {
        let output = self.run(args, stdin);
        if !output.status.success() {
            panic!(
                "Command {:?} failed with status {:?}\nstdout: {}\nstderr: {}",
                args,
                output.status,
                String::from_utf8_lossy(&output.stdout),
                String::from_utf8_lossy(&output.stderr)
            );
        }
        String::from_utf8_lossy(&output.stdout).to_string()
    }

    pub fn run_failure(&self, args: &[&str]) -> String {
        let output = self.run(args, "");
        assert!(
            !output.status.success(),
            "Expected {:?} to fail\nstdout: {}",
            args,
            String::from_utf8_lossy(&output.stdout)
        );
        String::from_utf8_lossy(&output.stderr).to_string()
    }
}
