use crate::cancel::CancelToken;
use crate::constants::POLL_INTERVAL;
use crate::error::{Error, Result, install_hint};
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use wait_timeout::ChildExt;

/// captured result of a finished child process
#[derive(Debug)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

/// run a command to completion and return its stdout as text
///
/// fails with `CommandFailed` on a non-zero exit, `Cancelled` if the token
/// fires while the child is running (the child is killed)
pub fn run(cmd: &mut Command, stdin: Option<&[u8]>, cancel: &CancelToken) -> Result<String> {
    let program = program_name(cmd);
    let output = output(cmd, stdin, cancel)?;
    if !output.status.success() {
        return Err(Error::CommandFailed {
            program,
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// run a command with inherited stdio (commit, editor, hooks)
pub fn run_interactive(cmd: &mut Command, cancel: &CancelToken) -> Result<()> {
    let program = program_name(cmd);
    let status = status(cmd, cancel)?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::CommandFailed {
            program,
            status,
            stderr: String::new(),
        })
    }
}

/// run a command with inherited stdio and return its exit status
pub fn status(cmd: &mut Command, cancel: &CancelToken) -> Result<ExitStatus> {
    cancel.check()?;
    let mut child = spawn(cmd)?;
    wait(&mut child, cancel)
}

/// run a command with captured output, feeding `stdin` if provided
pub fn output(cmd: &mut Command, stdin: Option<&[u8]>, cancel: &CancelToken) -> Result<Output> {
    cancel.check()?;

    cmd.stdin(if stdin.is_some() {
        Stdio::piped()
    } else {
        Stdio::null()
    })
    .stdout(Stdio::piped())
    .stderr(Stdio::piped());

    let mut child = spawn(cmd)?;

    // feed stdin and drain stdout/stderr on helper threads so neither side
    // can block on a full pipe
    let writer = match (stdin, child.stdin.take()) {
        (Some(input), Some(mut pipe)) => {
            let input = input.to_vec();
            Some(thread::spawn(move || pipe.write_all(&input)))
        }
        _ => None,
    };
    let stdout = child.stdout.take().map(drain);
    let stderr = child.stderr.take().map(drain);

    // on cancellation the helper threads are left to finish on their own
    let status = wait(&mut child, cancel)?;

    if let Some(writer) = writer {
        // the child may exit without reading all of stdin (broken pipe)
        let _ = writer.join();
    }

    Ok(Output {
        status,
        stdout: collect(stdout),
        stderr: collect(stderr),
    })
}

fn program_name(cmd: &Command) -> String {
    cmd.get_program().to_string_lossy().into_owned()
}

fn spawn(cmd: &mut Command) -> Result<Child> {
    let program = program_name(cmd);
    cmd.spawn().map_err(|source| {
        if source.kind() == io::ErrorKind::NotFound {
            Error::NotInstalled {
                hint: install_hint(&program),
                program,
            }
        } else {
            Error::Spawn { program, source }
        }
    })
}

/// wait for the child in short slices, killing it if the token fires
fn wait(child: &mut Child, cancel: &CancelToken) -> Result<ExitStatus> {
    loop {
        if cancel.is_cancelled() {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::Cancelled);
        }

        if let Some(status) = child.wait_timeout(POLL_INTERVAL)? {
            // children share our process group, so ctrl-c usually kills them
            // before the token is observed
            if !status.success() && cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            return Ok(status);
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
