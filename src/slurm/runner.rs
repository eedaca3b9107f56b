use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, error, info};
use thiserror::Error;
use which::which;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// Executes a slurm command with captured output and a timeout.
#[derive(Debug)]
pub struct SlurmRunner {
    name: String,
    binary: PathBuf,
}

impl SlurmRunner {
    /// Resolves `name` on `PATH`, or uses `binary` when given.
    pub fn locate(name: &str, binary: Option<&Path>) -> Result<Self, CommandError> {
        let binary = match binary {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                debug!("Configured {} binary {:?} does not exist", name, path);
                return Err(CommandError::NotFound(name.to_string()));
            }
            None => which(name).map_err(|_| CommandError::NotFound(name.to_string()))?,
        };

        debug!("Found {} at: {:?}", name, binary);

        Ok(Self {
            name: name.to_string(),
            binary,
        })
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Runs the command and returns its stdout.
    ///
    /// stdin is inherited so that sbatch can read a job script piped into
    /// uge2slurm when no command was given.
    pub fn run(&self, args: &[String], timeout: Duration) -> Result<String, CommandError> {
        info!("Running {} {}", self.name, args.join(" "));

        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                CommandError::SpawnFailed(format!("Failed to execute {}: {}", self.name, e))
            })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match wait_with_timeout(&mut child, timeout)? {
            Some(status) => status,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(CommandError::Timeout {
                    command: self.name.clone(),
                    seconds: timeout.as_secs(),
                });
            }
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        if status.success() {
            debug!("{} finished successfully", self.name);
            Ok(stdout)
        } else {
            if !stderr.is_empty() {
                error!("{}: {}", self.name, stderr.trim_end());
            }
            Err(CommandError::Failed(self.name.clone()))
        }
    }
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
) -> Result<Option<std::process::ExitStatus>, CommandError> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Reads a pipe to the end on a helper thread so the child never blocks on
/// a full pipe buffer.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = pipe.read_to_end(&mut buffer);
            String::from_utf8_lossy(&buffer).into_owned()
        })
    })
}

fn collect(handle: Option<JoinHandle<String>>) -> String {
    handle
        .and_then(|handle| handle.join().ok())
        .unwrap_or_default()
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Command `{0}` not found.")]
    NotFound(String),

    #[error("{0}")]
    SpawnFailed(String),

    #[error("`{command}` did not finish within {seconds} seconds.")]
    Timeout { command: String, seconds: u64 },

    #[error("Failed to execute `{0}` command.")]
    Failed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
