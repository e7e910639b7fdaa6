//! Common test utilities for fabric-warehouse-deploy tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use fabric_warehouse_deploy::deploy::{SqlConnection, WarehouseDeployer};
use fabric_warehouse_deploy::{DeployError, DeploySettings};

/// Test context with temporary directory for isolated test execution
pub struct TestContext {
    /// Kept to prevent temp directory cleanup until TestContext is dropped
    _temp_dir: TempDir,
    pub root: PathBuf,
    _fixture_name: String,
}

impl TestContext {
    /// Create a new test context by copying a fixture to a temp directory
    pub fn with_fixture(fixture_name: &str) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let fixture_path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(fixture_name);

        let root = temp_dir.path().to_path_buf();
        copy_dir_recursive(&fixture_path, &root).expect("Failed to copy fixture");

        Self {
            _temp_dir: temp_dir,
            root,
            _fixture_name: fixture_name.to_string(),
        }
    }

    /// Empty temporary directory
    pub fn empty() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let root = temp_dir.path().to_path_buf();
        Self {
            _temp_dir: temp_dir,
            root,
            _fixture_name: String::new(),
        }
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Get the path to the .sqlproj file
    pub fn project_path(&self) -> PathBuf {
        self.root.join("project.sqlproj")
    }

    /// Write a file below the context root, creating parent directories
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create directory");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dst)?;
    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let target = dst.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir_recursive(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), target)?;
        }
    }
    Ok(())
}

/// What a [`RecordingConnection`] saw
#[derive(Debug, Default)]
pub struct ConnectionLog {
    /// Every statement passed to `execute`, in call order
    pub executed: Vec<String>,
    pub commits: usize,
    pub closes: usize,
}

/// In-memory connection that records statements and fails on request
#[derive(Clone, Default)]
pub struct RecordingConnection {
    log: Arc<Mutex<ConnectionLog>>,
    /// (substring, error message): a statement containing the substring fails
    failures: Arc<Vec<(String, String)>>,
}

impl RecordingConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every statement containing `needle` with `message`
    pub fn failing_on(needle: &str, message: &str) -> Self {
        Self::default().and_failing_on(needle, message)
    }

    pub fn and_failing_on(self, needle: &str, message: &str) -> Self {
        let mut failures = (*self.failures).clone();
        failures.push((needle.to_string(), message.to_string()));
        Self {
            log: self.log,
            failures: Arc::new(failures),
        }
    }

    pub fn executed(&self) -> Vec<String> {
        self.log.lock().unwrap().executed.clone()
    }

    pub fn commits(&self) -> usize {
        self.log.lock().unwrap().commits
    }

    pub fn closes(&self) -> usize {
        self.log.lock().unwrap().closes
    }

    /// Deployer owning a clone of this connection
    pub fn deployer(&self) -> WarehouseDeployer {
        WarehouseDeployer::with_connection(DeploySettings::default(), Box::new(self.clone()))
    }
}

impl SqlConnection for RecordingConnection {
    fn execute(&mut self, sql: &str) -> Result<(), DeployError> {
        self.log.lock().unwrap().executed.push(sql.to_string());
        match self.failures.iter().find(|(needle, _)| sql.contains(needle.as_str())) {
            Some((_, message)) => Err(DeployError::Sql {
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn commit(&mut self) -> Result<(), DeployError> {
        self.log.lock().unwrap().commits += 1;
        Ok(())
    }

    fn close(&mut self) -> Result<(), DeployError> {
        self.log.lock().unwrap().closes += 1;
        Ok(())
    }
}
