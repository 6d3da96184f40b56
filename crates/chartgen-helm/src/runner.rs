//! Subprocess execution
//!
//! Everything that starts a process goes through [`ProcessRunner`], so the
//! generator can be exercised in tests with [`MockProcessRunner`] instead
//! of a real helm binary.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::{Arc, Mutex};

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, if the process was not killed by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ProcessOutput {
    /// Successful exit with the given stdout
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self {
            success: true,
            code: Some(0),
            stdout: stdout.into(),
            stderr: Vec::new(),
        }
    }

    /// Exit code 1 with the given stderr
    pub fn failed(stderr: impl Into<Vec<u8>>) -> Self {
        Self {
            success: false,
            code: Some(1),
            stdout: Vec::new(),
            stderr: stderr.into(),
        }
    }
}

/// Capability to run a program to completion
pub trait ProcessRunner: Send + Sync {
    /// Run `program` with `args`, adding `env` on top of the inherited
    /// environment. Returns an error only if the process could not be
    /// started; a non-zero exit is reported through [`ProcessOutput`].
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> std::io::Result<ProcessOutput>;
}

/// Runs real processes with [`std::process::Command`]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> std::io::Result<ProcessOutput> {
        let output = Command::new(program)
            .args(args)
            .envs(env.iter().map(|(k, v)| (k, v)))
            .stdin(Stdio::null())
            .output()?;

        Ok(ProcessOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// A call seen by [`MockProcessRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
    /// Contents of the `--values` file at the time of the call, if any
    pub values: Option<String>,
}

impl RecordedCall {
    /// First argument, e.g. `template`
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    /// Value following `flag`, e.g. `--namespace`
    pub fn flag_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }

    /// Value of an environment override
    pub fn env_value(&self, key: &str) -> Option<&str> {
        self.env
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// In-memory process runner for testing
///
/// Responses are keyed by subcommand (the first argument). `template`
/// calls can also be answered per chart, matched on the chart directory
/// name. Unknown subcommands succeed with empty output.
#[derive(Clone, Default)]
pub struct MockProcessRunner {
    responses: Arc<Mutex<HashMap<String, ProcessOutput>>>,
    chart_templates: Arc<Mutex<HashMap<String, ProcessOutput>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    /// When set, `pull` creates `<untardir>/<name>/values.yaml` with this content
    pulled_values: Option<String>,
}

impl MockProcessRunner {
    /// Create a runner with no canned responses
    pub fn new() -> Self {
        Self::default()
    }

    /// Runner whose `version` subcommand reports helm 3
    pub fn helm_v3() -> Self {
        Self::new().with_stdout("version", "v3.14.2+gc309b6f\n")
    }

    /// Answer `subcommand` with `output`
    pub fn with_response(self, subcommand: &str, output: ProcessOutput) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(subcommand.to_string(), output);
        self
    }

    /// Answer `subcommand` successfully with `stdout`
    pub fn with_stdout(self, subcommand: &str, stdout: impl Into<Vec<u8>>) -> Self {
        self.with_response(subcommand, ProcessOutput::ok(stdout))
    }

    /// Fail `subcommand` with `stderr`
    pub fn with_failure(self, subcommand: &str, stderr: impl Into<Vec<u8>>) -> Self {
        self.with_response(subcommand, ProcessOutput::failed(stderr))
    }

    /// Answer `template` for the chart directory named `chart` with `stdout`
    pub fn with_chart_template(self, chart: &str, stdout: impl Into<Vec<u8>>) -> Self {
        self.chart_templates
            .lock()
            .unwrap()
            .insert(chart.to_string(), ProcessOutput::ok(stdout));
        self
    }

    /// Make `pull` materialize a chart directory with the given values
    pub fn with_pulled_chart(mut self, values: &str) -> Self {
        self.pulled_values = Some(values.to_string());
        self
    }

    /// All calls seen so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Subcommands of all calls seen so far, in order
    pub fn subcommands(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|c| c.subcommand().to_string())
            .collect()
    }

    /// Last call with the given subcommand
    pub fn last_call(&self, subcommand: &str) -> Option<RecordedCall> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.subcommand() == subcommand)
    }

    fn response(&self, subcommand: &str) -> Option<ProcessOutput> {
        self.responses.lock().unwrap().get(subcommand).cloned()
    }

    fn chart_template(&self, call: &RecordedCall) -> Option<ProcessOutput> {
        if call.subcommand() != "template" {
            return None;
        }
        let templates = self.chart_templates.lock().unwrap();
        call.args.iter().find_map(|arg| {
            let name = Path::new(arg).file_name()?.to_str()?;
            templates.get(name).cloned()
        })
    }

    fn materialize_pull(&self, call: &RecordedCall) -> std::io::Result<()> {
        let Some(values) = &self.pulled_values else {
            return Ok(());
        };
        let (Some(untardir), Some(repo)) =
            (call.flag_value("--untardir"), call.flag_value("--repo"))
        else {
            return Ok(());
        };
        // The chart name is the positional argument following the repo URL
        let name = call
            .args
            .iter()
            .position(|a| a == repo)
            .and_then(|i| call.args.get(i + 1));

        if let Some(name) = name {
            let chart_dir = Path::new(untardir).join(name);
            std::fs::create_dir_all(&chart_dir)?;
            std::fs::write(
                chart_dir.join("Chart.yaml"),
                format!("apiVersion: v2\nname: {}\nversion: 0.1.0\n", name),
            )?;
            std::fs::write(chart_dir.join("values.yaml"), values)?;
        }
        Ok(())
    }
}

impl ProcessRunner for MockProcessRunner {
    fn run(
        &self,
        program: &Path,
        args: &[String],
        env: &[(String, String)],
    ) -> std::io::Result<ProcessOutput> {
        let values = args
            .iter()
            .position(|a| a == "--values")
            .and_then(|i| args.get(i + 1))
            .and_then(|path| std::fs::read_to_string(path).ok());

        let call = RecordedCall {
            program: program.to_path_buf(),
            args: args.to_vec(),
            env: env.to_vec(),
            values,
        };

        if call.subcommand() == "pull" {
            self.materialize_pull(&call)?;
        }

        let response = self
            .chart_template(&call)
            .or_else(|| self.response(call.subcommand()))
            .unwrap_or_else(|| ProcessOutput::ok(Vec::new()));

        self.calls.lock().unwrap().push(call);
        Ok(response)
    }
}
