use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use attrcalc::{AttrValue, AttributeCalculator, RecordData};
use serde::Deserialize;
use serde_json::Value as JsonValue;
use tracing::{info, warn};

/// How long a plugin gets to exit after its stdin is closed before it is killed.
const EXIT_GRACE: Duration = Duration::from_secs(2);

/// One reply line from the plugin: `{"value": ...}` or `{"error": "..."}`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
enum Reply {
    Value(JsonValue),
    Error(String),
}

/// Calculator backed by a long-lived child process speaking NDJSON.
///
/// Each record is written to the child's stdin as `{"data": {...}}` on one
/// line; the child answers with exactly one reply line on stdout. The child
/// must exit once stdin is closed; one that lingers past a short grace
/// period is killed. Its stderr is inherited.
pub struct ProcessCalculator {
    program: String,
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl ProcessCalculator {
    pub fn spawn(program: &str, args: &[String]) -> Result<Self> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .with_context(|| format!("failed to spawn calculator plugin {program:?}"))?;

        let stdin = child.stdin.take().context("plugin stdin not captured")?;
        let stdout = child.stdout.take().context("plugin stdout not captured")?;
        info!(program, pid = child.id(), "calculator plugin started");

        Ok(Self {
            program: program.to_string(),
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout),
        })
    }
}

impl ProcessCalculator {
    /// Close stdin and reap the child, killing it if it outlives `grace`.
    fn shutdown(&mut self, grace: Duration) -> std::io::Result<ExitStatus> {
        // EOF on stdin is the plugin's signal to exit.
        drop(self.stdin.take());

        let deadline = Instant::now() + grace;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }
            if Instant::now() >= deadline {
                break;
            }
            thread::sleep(Duration::from_millis(20));
        }

        warn!(program = %self.program, pid = self.child.id(), "calculator plugin ignored EOF, killing it");
        self.child.kill()?;
        self.child.wait()
    }
}

impl AttributeCalculator for ProcessCalculator {
    fn calculate(&mut self, data: &RecordData) -> Result<AttrValue> {
        let stdin = self.stdin.as_mut().context("plugin stdin already closed")?;
        let request = serde_json::json!({ "data": data.to_json() });
        writeln!(stdin, "{request}").context("failed to write request to plugin")?;
        stdin.flush().context("failed to write request to plugin")?;

        let mut line = String::new();
        let n = self
            .stdout
            .read_line(&mut line)
            .context("failed to read plugin reply")?;
        if n == 0 {
            bail!("plugin {:?} exited before replying", self.program);
        }

        let reply: Reply = serde_json::from_str(line.trim_end())
            .with_context(|| format!("malformed plugin reply: {}", line.trim_end()))?;
        match reply {
            Reply::Value(v) => Ok(v.into()),
            Reply::Error(msg) => bail!("plugin reported: {msg}"),
        }
    }
}

impl Drop for ProcessCalculator {
    fn drop(&mut self) {
        match self.shutdown(EXIT_GRACE) {
            Ok(status) if !status.success() => {
                warn!(program = %self.program, %status, "calculator plugin exited abnormally")
            }
            Ok(_) => {}
            Err(e) => warn!(program = %self.program, "failed to reap calculator plugin: {e}"),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use attrcalc::Field;
    use serde_json::json;

    fn sh(script: &str) -> ProcessCalculator {
        ProcessCalculator::spawn("sh", &["-c".to_string(), script.to_string()]).unwrap()
    }

    fn data(n: i64) -> RecordData {
        let mut d = RecordData::default();
        d.insert("n", Field::Scalar(json!(n)));
        d
    }

    #[test]
    fn test_one_reply_per_record() {
        let mut calc = sh(r#"while read -r line; do echo '{"value": ["a", "b"]}'; done"#);
        for i in 0..3 {
            assert_eq!(calc.calculate(&data(i)).unwrap(), AttrValue::from(vec!["a", "b"]));
        }
    }

    #[test]
    fn test_request_carries_record_data() {
        // Echo the request back wrapped as the value.
        let mut calc = sh(r#"while read -r line; do printf '{"value": %s}\n' "$line"; done"#);
        let v = calc.calculate(&data(7)).unwrap();
        assert_eq!(v, AttrValue::from(json!({"data": {"n": 7}})));
    }

    #[test]
    fn test_null_value_is_kept() {
        let mut calc = sh(r#"read -r line; echo '{"value": null}'"#);
        assert_eq!(calc.calculate(&data(1)).unwrap(), AttrValue::Null);
    }

    #[test]
    fn test_error_reply_fails() {
        let mut calc = sh(r#"read -r line; echo '{"error": "division by zero"}'"#);
        let err = calc.calculate(&data(1)).unwrap_err();
        assert!(format!("{err:#}").contains("division by zero"));
    }

    #[test]
    fn test_garbage_reply_fails() {
        let mut calc = sh(r#"read -r line; echo 'not json'"#);
        assert!(calc.calculate(&data(1)).is_err());
    }

    #[test]
    fn test_early_exit_fails() {
        let mut calc = sh("exit 0");
        assert!(calc.calculate(&data(1)).is_err());
    }

    #[test]
    fn test_lingering_plugin_is_killed_on_drop() {
        let started = Instant::now();
        let err = {
            let mut calc = sh(r#"read -r line; echo 'garbage'; exec sleep 60"#);
            calc.calculate(&data(1)).unwrap_err()
        };
        assert!(format!("{err:#}").contains("malformed plugin reply"));
        assert!(started.elapsed() < Duration::from_secs(20), "{:?}", started.elapsed());
    }

    #[test]
    fn test_well_behaved_plugin_exits_on_eof() {
        let mut calc = sh(r#"while read -r line; do echo '{"value": 1}'; done"#);
        calc.calculate(&data(1)).unwrap();
        let status = calc.shutdown(Duration::from_secs(10)).unwrap();
        assert!(status.success());
    }

    #[test]
    fn test_missing_program_fails_to_spawn() {
        assert!(ProcessCalculator::spawn("/no/such/plugin-binary", &[]).is_err());
    }
}
