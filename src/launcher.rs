//! Starting the acquisition program.
//!
//! Only one instance of the deck unit software may run at a time, so
//! [`AcquisitionLauncher::run`] checks the process list first and refuses
//! to start a second copy. The program itself runs on a background thread;
//! `run` returns as soon as it has been started.

use std::path::PathBuf;
use std::process::Command;
use std::thread::{self, JoinHandle};

use crate::logging::{self, Component};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum LaunchError {
    /// A process with the program's name is already running.
    AlreadyRunning { name: String },
    /// The process list could not be read.
    ProcessList(String),
    /// The launcher thread could not be started.
    Spawn(std::io::Error),
    /// The launcher thread panicked before the program exited.
    Crashed(String),
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LaunchError::AlreadyRunning { name } => write!(f, "{} is already running!", name),
            LaunchError::ProcessList(msg) => write!(f, "Cannot list processes: {}", msg),
            LaunchError::Spawn(e) => write!(f, "Cannot start launcher thread: {}", e),
            LaunchError::Crashed(msg) => write!(f, "Launcher thread panicked: {}", msg),
        }
    }
}

impl std::error::Error for LaunchError {}

// ---------------------------------------------------------------------------
// Process enumeration
// ---------------------------------------------------------------------------

/// Answers whether a process with a given executable name is running.
pub trait ProcessProbe {
    fn is_running(&self, name: &str) -> Result<bool, LaunchError>;
}

/// Reads the process list from the operating system's `tasklist` / `ps`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProbe;

impl SystemProbe {
    fn process_names() -> Result<Vec<String>, LaunchError> {
        let mut command = if cfg!(windows) {
            let mut c = Command::new("tasklist");
            c.args(["/FO", "CSV", "/NH"]);
            c
        } else {
            let mut c = Command::new("ps");
            c.args(["-A", "-o", "comm="]);
            c
        };
        let output = command
            .output()
            .map_err(|e| LaunchError::ProcessList(e.to_string()))?;

        if !output.status.success() {
            return Err(LaunchError::ProcessList(format!("exit status {}", output.status)));
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(parse_process_names(&stdout))
    }
}

impl ProcessProbe for SystemProbe {
    fn is_running(&self, name: &str) -> Result<bool, LaunchError> {
        Ok(Self::process_names()?.iter().any(|p| p.eq_ignore_ascii_case(name)))
    }
}

/// Extracts executable names from `tasklist /FO CSV /NH` or `ps -o comm=`
/// output.
fn parse_process_names(listing: &str) -> Vec<String> {
    listing
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() {
                return None;
            }
            let name = if line.starts_with('"') {
                // "Seasave.exe","1234","Console","1","52,000 K"
                line.trim_start_matches('"').split('"').next().unwrap_or("")
            } else {
                // ps may print a full path
                line.rsplit('/').next().unwrap_or(line)
            };
            (!name.is_empty()).then(|| name.to_string())
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Launcher
// ---------------------------------------------------------------------------

pub struct AcquisitionLauncher<P: ProcessProbe> {
    program: PathBuf,
    settings_file: PathBuf,
    process_name: String,
    probe: P,
}

impl<P: ProcessProbe> AcquisitionLauncher<P> {
    pub fn new(program: PathBuf, settings_file: PathBuf, process_name: String, probe: P) -> Self {
        Self { program, settings_file, process_name, probe }
    }

    /// Starts `<program> -p=<settings file>` in the background.
    pub fn run(&self) -> Result<JoinHandle<()>, LaunchError> {
        if self.probe.is_running(&self.process_name)? {
            logging::warn(Component::Launcher, None, &format!("{} is already running", self.process_name));
            return Err(LaunchError::AlreadyRunning { name: self.process_name.clone() });
        }

        let program = self.program.clone();
        let settings_arg = format!("-p={}", self.settings_file.display());
        logging::info(
            Component::Launcher,
            None,
            &format!("starting {} {}", program.display(), settings_arg),
        );

        thread::Builder::new()
            .name("acquisition".to_string())
            .spawn(move || match Command::new(&program).arg(&settings_arg).status() {
                Ok(status) if status.success() => {
                    logging::info(Component::Launcher, None, &format!("{} exited", program.display()));
                }
                Ok(status) => logging::warn(
                    Component::Launcher,
                    None,
                    &format!("{} exited with {}", program.display(), status),
                ),
                Err(e) => logging::error(
                    Component::Launcher,
                    None,
                    &format!("failed to run {}: {}", program.display(), e),
                ),
            })
            .map_err(LaunchError::Spawn)
    }
}

/// Blocks until the program started by [`AcquisitionLauncher::run`] exits.
pub fn wait(handle: JoinHandle<()>) -> Result<(), LaunchError> {
    handle.join().map_err(|payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        logging::error(Component::Launcher, None, &format!("launcher thread panicked: {}", msg));
        LaunchError::Crashed(msg)
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
