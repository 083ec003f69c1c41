//! Narrow wrapper around external process invocation.
//!
//! Every external tool (git, svn, latexdiff, pdflatex, the PDF viewer) goes
//! through [`run`]: argv vectors only, no shell, piped output, and a hard
//! timeout. A timeout is reported like a nonzero exit.

use anyhow::{anyhow, Context, Result};
use std::ffi::OsStr;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

pub struct ExecOutput {
    pub exit_code: Option<i32>,
    pub timed_out: bool,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    pub fn stdout_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_utf8(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }
}

pub fn run<I, S>(program: &str, args: I, cwd: Option<&Path>, timeout: Duration) -> Result<ExecOutput>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = cwd {
        cmd.current_dir(cwd);
    }
    tracing::debug!(command = ?cmd, "run command");

    let start = Instant::now();
    let mut child = cmd.spawn().with_context(|| format!("spawn {program}"))?;

    // Drain both pipes off-thread while the loop below only watches the
    // clock; a child filling the OS pipe buffer would otherwise block and
    // sit there until the deadline killed it.
    let stdout_handle = drain(child.stdout.take());
    let stderr_handle = drain(child.stderr.take());

    let mut timed_out = false;
    let status = loop {
        if let Some(status) = child
            .try_wait()
            .with_context(|| format!("poll {program}"))?
        {
            break status;
        }
        if start.elapsed() > timeout {
            timed_out = true;
            let _ = child.kill();
            break child.wait().with_context(|| format!("reap {program}"))?;
        }
        thread::sleep(Duration::from_millis(25));
    };

    let stdout = stdout_handle
        .join()
        .map_err(|_| anyhow!("stdout reader for {program} panicked"))?;
    let stderr = stderr_handle
        .join()
        .map_err(|_| anyhow!("stderr reader for {program} panicked"))?;
    tracing::debug!(code = ?status.code(), timed_out, "command finished");

    Ok(ExecOutput {
        exit_code: status.code(),
        timed_out,
        stdout,
        stderr,
    })
}

fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> thread::JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_end(&mut bytes);
        }
        bytes
    })
}
