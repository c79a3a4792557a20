// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! External command execution.
//!
//! Every call to kubeadm, kubectl, systemctl or a package manager goes through
//! the [`Executor`] trait so the orchestration logic can run against a fake host.

use crate::shared::error::{BootstrapError, Result};
use std::fmt;
use std::io::Write;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

/// A single external command invocation
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Set on the child process only
    pub envs: Vec<(String, String)>,
    /// Capture output without streaming it to the caller
    pub quiet: bool,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            ..Default::default()
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    pub fn quiet(mut self) -> Self {
        self.quiet = true;
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Captured result of a successful command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub status: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// stdout and stderr interleaved in arrival order
    pub combined: String,
}

#[async_trait::async_trait]
pub trait Executor: Send + Sync {
    /// Run `spec` to completion. A non-zero exit status is a
    /// [`BootstrapError::SubprocessFailure`].
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

pub type OutputSink = Arc<Mutex<Box<dyn Write + Send>>>;

/// Runs commands on the local host, streaming their output line by line into
/// a shared sink while it is produced.
pub struct SystemExecutor {
    sink: OutputSink,
    timeout: Option<Duration>,
}

impl Default for SystemExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemExecutor {
    pub fn new() -> Self {
        Self::with_sink(Arc::new(Mutex::new(Box::new(std::io::stdout()))))
    }

    pub fn with_sink(sink: OutputSink) -> Self {
        Self {
            sink,
            timeout: None,
        }
    }

    /// Kill commands that run longer than `timeout`. Without it a hung command
    /// blocks the operation indefinitely.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

struct Capture {
    own: String,
    combined: Arc<Mutex<String>>,
}

async fn pump<R>(reader: R, sink: Option<OutputSink>, combined: Arc<Mutex<String>>) -> String
where
    R: AsyncRead + Unpin,
{
    let mut capture = Capture {
        own: String::new(),
        combined,
    };
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();

    // Read to EOF; invalid UTF-8 is replaced, not treated as the end
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                warn!("Failed to read command output: {}", e);
                break;
            }
        }

        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim_end_matches(['\n', '\r']);
        if let Some(sink) = &sink {
            if let Ok(mut out) = sink.lock() {
                let _ = writeln!(out, "{}", line);
                let _ = out.flush();
            }
        }
        if let Ok(mut combined) = capture.combined.lock() {
            combined.push_str(line);
            combined.push('\n');
        }
        capture.own.push_str(line);
        capture.own.push('\n');
    }

    capture.own
}

fn join_error(err: tokio::task::JoinError) -> BootstrapError {
    BootstrapError::Io(std::io::Error::new(std::io::ErrorKind::Other, err.to_string()))
}

#[async_trait::async_trait]
impl Executor for SystemExecutor {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        info!("Executing> {}", spec);

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .envs(spec.envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = command.spawn().map_err(|e| {
            BootstrapError::subprocess_failure(
                &spec.program,
                &spec.args,
                None,
                format!("failed to start: {}", e),
            )
        })?;

        let combined = Arc::new(Mutex::new(String::new()));
        let sink = if spec.quiet {
            None
        } else {
            Some(self.sink.clone())
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| BootstrapError::config_error("child stdout was not captured"))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| BootstrapError::config_error("child stderr was not captured"))?;
        let stdout_task = tokio::spawn(pump(stdout, sink.clone(), combined.clone()));
        let stderr_task = tokio::spawn(pump(stderr, sink, combined.clone()));

        let status = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, child.wait()).await {
                Ok(status) => status?,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(BootstrapError::Timeout(format!(
                        "'{}' did not finish within {:?}",
                        spec, limit
                    )));
                }
            },
            None => child.wait().await?,
        };

        let stdout = stdout_task.await.map_err(join_error)?;
        let stderr = stderr_task.await.map_err(join_error)?;
        let combined = combined
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default();

        debug!("'{}' exited with {:?}", spec, status.code());

        if !status.success() {
            return Err(BootstrapError::subprocess_failure(
                &spec.program,
                &spec.args,
                status.code(),
                combined,
            ));
        }

        Ok(CommandOutput {
            status: status.code(),
            stdout,
            stderr,
            combined,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Default)]
    struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    fn executor() -> (SystemExecutor, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let sink: OutputSink = Arc::new(Mutex::new(Box::new(buffer.clone())));
        (SystemExecutor::with_sink(sink), buffer)
    }

    #[test]
    fn test_command_display() {
        let spec = CommandSpec::new("kubeadm")
            .arg("init")
            .arg("--config=/etc/kubernetes/kubeadm.conf");
        assert_eq!(spec.to_string(), "kubeadm init --config=/etc/kubernetes/kubeadm.conf");
    }

    #[tokio::test]
    async fn test_streams_and_captures_output() {
        let (exec, buffer) = executor();
        let spec = CommandSpec::new("sh").args(["-c", "echo out; echo err 1>&2"]);
        let output = exec.run(&spec).await.unwrap();

        assert_eq!(output.status, Some(0));
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert!(output.combined.contains("out"));
        assert!(output.combined.contains("err"));
        let streamed = buffer.contents();
        assert!(streamed.contains("out") && streamed.contains("err"));
    }

    #[tokio::test]
    async fn test_invalid_utf8_output_is_drained() {
        let (exec, buffer) = executor();
        let spec = CommandSpec::new("sh").args([
            "-c",
            "printf 'bad \\377 byte\\n'; seq 1 50000; echo after",
        ]);
        let output = exec.run(&spec).await.unwrap();

        assert_eq!(output.status, Some(0));
        assert!(output.stdout.starts_with("bad \u{FFFD} byte\n"));
        assert!(output.stdout.ends_with("50000\nafter\n"));
        assert_eq!(output.stdout.lines().count(), 50002);
        assert!(buffer.contents().contains("after"));
    }

    #[tokio::test]
    async fn test_quiet_command_is_not_streamed() {
        let (exec, buffer) = executor();
        let spec = CommandSpec::new("sh").args(["-c", "echo hidden"]).quiet();
        let output = exec.run(&spec).await.unwrap();
        assert_eq!(output.stdout, "hidden\n");
        assert!(buffer.contents().is_empty());
    }

    #[tokio::test]
    async fn test_env_is_scoped_to_child() {
        let (exec, _) = executor();
        let spec = CommandSpec::new("sh")
            .args(["-c", "echo $KUBECONFIG"])
            .env("KUBECONFIG", "/tmp/admin.conf");
        let output = exec.run(&spec).await.unwrap();
        assert_eq!(output.stdout, "/tmp/admin.conf\n");
        assert_ne!(
            std::env::var("KUBECONFIG").ok().as_deref(),
            Some("/tmp/admin.conf")
        );
    }

    #[tokio::test]
    async fn test_non_zero_exit_is_subprocess_failure() {
        let (exec, _) = executor();
        let spec = CommandSpec::new("sh").args(["-c", "echo boom; exit 3"]);
        match exec.run(&spec).await.unwrap_err() {
            BootstrapError::SubprocessFailure {
                command,
                args,
                status,
                output,
            } => {
                assert_eq!(command, "sh");
                assert_eq!(args[0], "-c");
                assert_eq!(status, Some(3));
                assert!(output.contains("boom"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_program() {
        let (exec, _) = executor();
        let err = exec
            .run(&CommandSpec::new("definitely-not-a-real-binary-xyz"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::SubprocessFailure { status: None, .. }));
    }

    #[tokio::test]
    async fn test_timeout() {
        let (exec, _) = executor();
        let exec = exec.with_timeout(Duration::from_millis(200));
        let err = exec
            .run(&CommandSpec::new("sleep").arg("5"))
            .await
            .unwrap_err();
        assert!(matches!(err, BootstrapError::Timeout(_)));
    }
}
