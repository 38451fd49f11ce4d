// analysis/runner.rs
//! Runs `astra --analyze` against a block's output and collects its log.
//!
//! astra's analyze mode never exits on its own, so the run is bounded: after
//! the configured duration the child is killed and whatever was kept so far is
//! the log.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::constants::{ANALYZER_LINE_TAG, LOOPBACK_HOST, WILDCARD_HOST};
use crate::error::{Error, Result};

/// Lines kept from one analyzer run
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOutput {
    pub lines: Vec<String>,
    /// True when the run was cut off by the time limit
    pub timed_out: bool,
}

impl AnalyzerOutput {
    pub fn text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

pub struct AnalyzerRunner {
    binary: PathBuf,
    duration: Duration,
}

impl AnalyzerRunner {
    pub fn new<P: AsRef<Path>>(binary: P, duration: Duration) -> Self {
        Self {
            binary: binary.as_ref().to_path_buf(),
            duration,
        }
    }

    /// The command line as it would be shown to the operator
    pub fn command_line(&self, output_url: &str) -> String {
        format!("{} --analyze \"{}\"", self.binary.display(), analysis_target(output_url))
    }

    pub async fn run(&self, output_url: &str) -> Result<AnalyzerOutput> {
        let target = analysis_target(output_url);
        info!("Analyzing {} for {:?}", target, self.duration);

        let mut child = Command::new(&self.binary)
            .arg("--analyze")
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| match e.kind() {
                ErrorKind::NotFound => Error::Analyzer(format!("{} not found", self.binary.display())),
                _ => Error::Analyzer(format!("failed to start {}: {}", self.binary.display(), e)),
            })?;

        let (tx, mut rx) = mpsc::unbounded_channel();
        if let Some(stdout) = child.stdout.take() {
            forward_lines(stdout, tx.clone());
        }
        if let Some(stderr) = child.stderr.take() {
            forward_lines(stderr, tx.clone());
        }
        drop(tx);

        let mut output = AnalyzerOutput::default();
        let deadline_at = Instant::now() + self.duration;
        let deadline = tokio::time::sleep_until(deadline_at);
        tokio::pin!(deadline);

        loop {
            tokio::select! {
                line = rx.recv() => match line {
                    Some(line) if line.contains(ANALYZER_LINE_TAG) => output.lines.push(line),
                    Some(_) => {}
                    None => break,
                },
                _ = &mut deadline => {
                    output.timed_out = true;
                    break;
                }
            }
        }

        // both pipes closed; the child may still be running
        if !output.timed_out {
            match tokio::time::timeout_at(deadline_at, child.wait()).await {
                Ok(Ok(status)) => debug!("Analyzer exited with {}", status),
                Ok(Err(e)) => warn!("Failed to reap analyzer: {}", e),
                Err(_) => output.timed_out = true,
            }
        }
        if output.timed_out {
            if let Err(e) = child.kill().await {
                warn!("Failed to stop analyzer: {}", e);
            }
        }

        info!("Analyzer kept {} lines", output.lines.len());
        Ok(output)
    }
}

fn forward_lines<R>(reader: R, tx: mpsc::UnboundedSender<String>)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut lines = BufReader::new(reader).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).is_err() {
                break;
            }
        }
    });
}

/// Output url with the wildcard bind address replaced by loopback
pub fn analysis_target(output_url: &str) -> String {
    output_url.replace(WILDCARD_HOST, LOOPBACK_HOST)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_target() {
        assert_eq!(analysis_target("http://0.0.0.0:9999/out1"), "http://127.0.0.1:9999/out1");
        assert_eq!(analysis_target("udp://239.1.1.1:1234"), "udp://239.1.1.1:1234");
    }

    #[test]
    fn test_command_line() {
        let runner = AnalyzerRunner::new("/usr/bin/astra", Duration::from_secs(15));
        assert_eq!(
            runner.command_line("http://0.0.0.0:9999/out1"),
            "/usr/bin/astra --analyze \"http://127.0.0.1:9999/out1\""
        );
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let runner = AnalyzerRunner::new("/nonexistent/astra", Duration::from_secs(1));
        let err = runner.run("http://0.0.0.0:1/x").await.unwrap_err();
        assert!(matches!(err, Error::Analyzer(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_filters_lines_and_stops_at_deadline() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-astra");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"INFO: sid: 101\"\necho \"DEBUG: noise\"\necho \"INFO: target $2\" 1>&2\nexec sleep 30\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = AnalyzerRunner::new(&script, Duration::from_millis(1500));
        let output = runner.run("http://0.0.0.0:9999/out1").await.unwrap();
        assert!(output.timed_out);
        assert_eq!(output.lines.len(), 2);
        assert!(output.lines.contains(&"INFO: sid: 101".to_string()));
        assert!(output.lines.contains(&"INFO: target http://127.0.0.1:9999/out1".to_string()));
        assert!(output.text().ends_with('\n'));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_silent_child_still_stops_at_deadline() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::TempDir::new().unwrap();
        let script = dir.path().join("fake-astra");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"INFO: sid: 7\"\nexec >&- 2>&-\nexec sleep 30\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let runner = AnalyzerRunner::new(&script, Duration::from_secs(1));
        let output = tokio::time::timeout(Duration::from_secs(10), runner.run("http://0.0.0.0:9999/out1"))
            .await
            .expect("run must end near its deadline")
            .unwrap();
        assert!(output.timed_out);
        assert_eq!(output.lines, vec!["INFO: sid: 7".to_string()]);
    }
}
