// ! STDIO wiring for the envelope
// !
// ! Module connects an envelope to the process's standard streams (host
// ! side) or to a spawned child process's pipes (driver side). There is
// ! exactly one connection per process pair.

use std::process::Stdio;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::task::JoinHandle;
use tokio::time::{Duration, timeout};

use crate::core::error::{CapError, CapResult};
use crate::transport::envelope::Envelope;

/// Attach an envelope to this process's stdin/stdout.
///
/// The returned handle completes when stdin reaches EOF, which is the
/// host's shutdown signal.
pub fn attach_stdio(envelope: &Arc<Envelope>) -> JoinHandle<()> {
    envelope
        .clone()
        .attach(tokio::io::stdin(), tokio::io::stdout())
}

/// A spawned host process with its pipe ends, driver side
#[derive(Debug)]
pub struct ChildEndpoint {
    child: Child,
    stdout: Option<ChildStdout>,
    stdin: Option<ChildStdin>,
}

impl ChildEndpoint {
    /// Spawn the host command with piped stdio
    pub fn spawn<S: AsRef<str>>(command: S, args: &[S]) -> CapResult<Self> {
        let command_str = command.as_ref();
        let args_str: Vec<&str> = args.iter().map(|s| s.as_ref()).collect();

        tracing::debug!("starting host process: {command_str} {args_str:?}");

        let mut child = Command::new(command_str)
            .args(&args_str)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CapError::transport(format!("Failed to start host process: {e}")))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| CapError::transport("Failed to get stdin handle"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| CapError::transport("Failed to get stdout handle"))?;

        Ok(Self {
            child,
            stdout: Some(stdout),
            stdin: Some(stdin),
        })
    }

    /// Attach an envelope to the child's pipes. Can be called once.
    pub fn attach(&mut self, envelope: &Arc<Envelope>) -> CapResult<JoinHandle<()>> {
        let stdout = self
            .stdout
            .take()
            .ok_or_else(|| CapError::transport("Child pipes already attached"))?;
        let stdin = self
            .stdin
            .take()
            .ok_or_else(|| CapError::transport("Child pipes already attached"))?;
        Ok(envelope.clone().attach(stdout, stdin))
    }

    /// Close the child's stdin to signal shutdown and wait for it to exit,
    /// killing it after a bounded grace period.
    pub async fn shutdown(mut self) -> CapResult<()> {
        if let Some(mut stdin) = self.stdin.take() {
            let _ = stdin.shutdown().await;
        }
        // When attached, the envelope's writer task owns stdin and drops it
        // once its channel closes; either way the child sees EOF.

        match timeout(Duration::from_secs(5), self.child.wait()).await {
            Ok(Ok(status)) => {
                tracing::debug!("host process exited with status: {status}");
            }
            Ok(Err(e)) => {
                tracing::warn!("error waiting for host process: {e}");
            }
            Err(_) => {
                tracing::warn!("timeout waiting for host process, killing it");
                let _ = self.child.kill().await;
            }
        }
        Ok(())
    }
}

impl Drop for ChildEndpoint {
    fn drop(&mut self) {
        // Kill the child if it is still running when the endpoint goes away
        let _ = self.child.start_kill();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_spawn_failure_is_transport_error() {
        let result = ChildEndpoint::spawn("/nonexistent/command", &["arg1"]);
        match result {
            Err(CapError::Transport(msg)) => {
                assert!(msg.contains("Failed to start host process"))
            }
            other => panic!("expected Transport error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_attach_twice_fails() {
        // `cat` echoes lines back, standing in for a host process
        let Ok(mut endpoint) = ChildEndpoint::spawn("cat", &[]) else {
            // Environment without cat; nothing to assert here
            return;
        };

        let envelope = Envelope::new(Default::default());
        let _ = endpoint.attach(&envelope).unwrap();
        assert!(endpoint.attach(&envelope).is_err());

        // Closing the envelope releases the child's stdin so it exits
        envelope.close();
        endpoint.shutdown().await.unwrap();
    }
}
