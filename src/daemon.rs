//! Detached command execution.

use std::io;
use std::mem::MaybeUninit;
use std::os::unix::process::CommandExt;
use std::process::{Child, Command, Stdio};
use std::ptr;

use tracing::{debug, error, warn};

/// Shell used to interpret gesture commands.
const SHELL: &str = "/bin/sh";

/// Launched command which has not been reaped yet.
#[derive(Debug)]
struct Running {
    command: String,
    child: Child,
}

/// Fire-and-forget command launcher.
///
/// Children are never waited on; their exit status is only collected once
/// they are done.
#[derive(Default, Debug)]
pub struct Launcher {
    running: Vec<Running>,
}

impl Launcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn a shell command in its own session.
    pub fn spawn(&mut self, command: &str) -> io::Result<()> {
        let mut child = Command::new(SHELL);
        child.arg("-c").arg(command);
        child.stdin(Stdio::null());
        child.stdout(Stdio::null());
        child.stderr(Stdio::null());

        unsafe {
            child.pre_exec(|| {
                if libc::setsid() == -1 {
                    return Err(io::Error::last_os_error());
                }

                // Reset signal mask, since SIGCHLD is blocked for the event loop.
                let mut signal_set = MaybeUninit::uninit();
                libc::sigemptyset(signal_set.as_mut_ptr());
                libc::sigprocmask(libc::SIG_SETMASK, signal_set.as_mut_ptr(), ptr::null_mut());

                Ok(())
            });
        }

        let child = child.spawn()?;
        debug!("Spawned {command:?} with PID {}", child.id());
        self.running.push(Running { command: command.into(), child });

        Ok(())
    }

    /// Collect the exit status of all finished commands.
    pub fn reap(&mut self) {
        self.running.retain_mut(|running| match running.child.try_wait() {
            Ok(Some(status)) if status.success() => false,
            Ok(Some(status)) => {
                warn!("Command {:?} failed: {status}", running.command);
                false
            },
            Ok(None) => true,
            Err(err) => {
                error!("Unable to get status of {:?}: {err}", running.command);
                false
            },
        });
    }

    /// Number of commands which have not been reaped yet.
    pub fn pending(&self) -> usize {
        self.running.len()
    }
}
