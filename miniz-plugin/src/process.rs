use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::process::{Child, Command};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::error::{MinerError, Result};

/// A running miniZ process. The child is killed if the handle is dropped.
#[derive(Debug)]
pub struct MinerProcess {
    child: Child,
    binary: PathBuf,
}

impl MinerProcess {
    /// Start `binary` in `cwd`. The command line is split on whitespace.
    pub fn launch(
        binary: &Path,
        cwd: &Path,
        command_line: &str,
        environment: &[(String, String)],
    ) -> Result<Self> {
        // a relative program path is ambiguous once current_dir is set
        let binary = if binary.is_relative() {
            std::env::current_dir()?.join(binary)
        } else {
            binary.to_path_buf()
        };
        debug!("Launching {} {}", binary.display(), command_line);

        let child = Command::new(&binary)
            .args(command_line.split_whitespace())
            .current_dir(cwd)
            .envs(environment.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| MinerError::Spawn {
                path: binary.clone(),
                source,
            })?;

        info!("Started {} (pid {:?})", binary.display(), child.id());
        Ok(Self { child, binary })
    }

    /// OS process id, `None` once reaped
    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Wait for the process to exit. Cancel safe.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        Ok(self.child.wait().await?)
    }

    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Kill the process and wait up to `grace` for it to be reaped
    pub async fn kill(&mut self, grace: Duration) -> Result<()> {
        if self.try_wait()?.is_some() {
            return Ok(());
        }

        warn!("Killing {} (pid {:?})", self.binary.display(), self.child.id());
        self.child.start_kill()?;

        match timeout(grace, self.child.wait()).await {
            Ok(status) => {
                debug!("{} exited with {:?}", self.binary.display(), status?);
                Ok(())
            }
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("{} still running {:?} after kill", self.binary.display(), grace),
            )
            .into()),
        }
    }
}
