//! Pseudo-terminal process control.
//!
//! Spawns a child process in a PTY sized to the requested dimensions so we
//! can capture everything it renders. The master end is used for reading
//! child output, injecting input, and driving window-size changes.

use std::ffi::CString;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::path::Path;

use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::poll::{PollFd, PollFlags, PollTimeout};
use nix::pty::{openpty, Winsize};
use nix::sys::signal::{self, Signal};
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{self, ForkResult, Pid};

use muxvet_types::{Dimensions, MuxvetError};

/// Outcome of a non-blocking read from the master PTY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtyRead {
    /// Bytes were read into the buffer.
    Data(usize),
    /// No data available right now.
    WouldBlock,
    /// The child closed its end of the terminal.
    Eof,
}

/// A child process running in a pseudo-terminal.
pub struct PtyProcess {
    master: OwnedFd,
    child_pid: Pid,
}

impl PtyProcess {
    /// Spawn a command in a new PTY sized to `dims`.
    ///
    /// The child's environment is exactly `env` -- nothing is inherited
    /// from the parent, so a test run cannot be perturbed by whatever
    /// happens to be exported in the invoking shell. The master fd is set
    /// non-blocking for integration with `poll()`.
    pub fn spawn(
        command: &str,
        args: &[String],
        working_dir: &Path,
        env: &[(String, String)],
        dims: Dimensions,
    ) -> Result<Self, MuxvetError> {
        let spawn_err = |reason: String| MuxvetError::Spawn {
            command: command.to_string(),
            reason,
        };

        let winsize = Winsize {
            ws_row: dims.rows,
            ws_col: dims.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let pty = openpty(Some(&winsize), None)
            .map_err(|e| spawn_err(format!("openpty failed: {e}")))?;

        // Everything the exec needs is built before forking so the child
        // only touches pre-allocated data between fork and exec.
        let c_command = CString::new(command.to_string())
            .map_err(|e| spawn_err(format!("invalid command: {e}")))?;
        let mut c_args: Vec<CString> = vec![c_command.clone()];
        for arg in args {
            c_args.push(
                CString::new(arg.as_str()).map_err(|e| spawn_err(format!("invalid arg: {e}")))?,
            );
        }
        let mut c_env: Vec<CString> = Vec::with_capacity(env.len());
        for (key, value) in env {
            c_env.push(
                CString::new(format!("{key}={value}"))
                    .map_err(|e| spawn_err(format!("invalid env entry {key}: {e}")))?,
            );
        }

        // Safety: fork is unsafe but standard Unix practice for PTY management.
        // The child immediately exec's, so async-signal-safety is maintained.
        match unsafe { unistd::fork() } {
            Ok(ForkResult::Child) => {
                // Child process: set up the slave PTY as stdin/stdout/stderr.
                // Run child setup in a closure so ? collects errors without
                // returning to the caller (which would be the child process
                // running the parent's code path -- a classic fork bug).
                let err = (|| -> Result<(), String> {
                    drop(pty.master);

                    unistd::setsid().map_err(|e| format!("setsid failed: {e}"))?;

                    // Set controlling terminal via ioctl TIOCSCTTY
                    unsafe {
                        if libc::ioctl(pty.slave.as_raw_fd(), libc::TIOCSCTTY as _, 0) < 0 {
                            let err = std::io::Error::last_os_error();
                            eprintln!("muxvet-term: TIOCSCTTY failed: {err}");
                        }
                    }

                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDIN_FILENO)
                        .map_err(|e| format!("dup2 stdin: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDOUT_FILENO)
                        .map_err(|e| format!("dup2 stdout: {e}"))?;
                    unistd::dup2(pty.slave.as_raw_fd(), libc::STDERR_FILENO)
                        .map_err(|e| format!("dup2 stderr: {e}"))?;

                    drop(pty.slave);

                    unistd::chdir(working_dir).map_err(|e| format!("chdir: {e}"))?;

                    unistd::execvpe(&c_command, &c_args, &c_env)
                        .map_err(|e| format!("exec failed: {e}"))?;

                    Ok(()) // unreachable: execvpe replaces the process
                })();

                // If we get here, something failed before exec replaced the process.
                if let Err(e) = err {
                    eprintln!("muxvet-term: child setup failed: {e}");
                }
                unsafe { libc::_exit(1) };
            }
            Ok(ForkResult::Parent { child }) => {
                // Parent: close the slave, keep the master
                drop(pty.slave);

                // Set master to non-blocking
                let flags = fcntl(pty.master.as_raw_fd(), FcntlArg::F_GETFL)
                    .map_err(|e| spawn_err(format!("fcntl F_GETFL: {e}")))?;
                let flags = OFlag::from_bits_truncate(flags);
                fcntl(
                    pty.master.as_raw_fd(),
                    FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK),
                )
                .map_err(|e| spawn_err(format!("fcntl F_SETFL: {e}")))?;

                Ok(Self {
                    master: pty.master,
                    child_pid: child,
                })
            }
            Err(e) => Err(spawn_err(format!("fork failed: {e}"))),
        }
    }

    /// Non-blocking read from the master PTY.
    ///
    /// EIO on the master means the child closed the slave side, which is
    /// how a PTY reports end-of-stream; it is mapped to [`PtyRead::Eof`]
    /// so callers can tell "nothing yet" from "nothing ever again".
    pub fn read(&self, buf: &mut [u8]) -> Result<PtyRead, MuxvetError> {
        match unistd::read(self.master.as_raw_fd(), buf) {
            Ok(0) => Ok(PtyRead::Eof),
            Ok(n) => Ok(PtyRead::Data(n)),
            Err(Errno::EAGAIN) => Ok(PtyRead::WouldBlock),
            Err(Errno::EIO) => Ok(PtyRead::Eof),
            Err(e) => Err(MuxvetError::Pty(format!("pty read: {e}"))),
        }
    }

    /// Write all bytes to the master PTY (injecting into child's stdin).
    ///
    /// Retries on EAGAIN up to ~5 seconds before giving up. Without a limit,
    /// a child that stops reading stdin could cause this to spin forever.
    pub fn write_all(&self, data: &[u8]) -> Result<(), MuxvetError> {
        let mut written = 0;
        let mut retries = 0u32;
        while written < data.len() {
            match unistd::write(&self.master, &data[written..]) {
                Ok(n) => {
                    written += n;
                    retries = 0;
                }
                Err(Errno::EAGAIN) => {
                    retries += 1;
                    if retries > 5000 {
                        return Err(MuxvetError::Pty(
                            "pty write: buffer full after 5s of retries".into(),
                        ));
                    }
                    std::thread::sleep(std::time::Duration::from_millis(1));
                }
                Err(e) => {
                    return Err(MuxvetError::Pty(format!("pty write: {e}")));
                }
            }
        }
        Ok(())
    }

    /// Change the PTY window size.
    ///
    /// The kernel delivers SIGWINCH to the child's foreground process
    /// group, so a well-behaved child redraws at the new size on its own.
    pub fn resize(&self, dims: Dimensions) -> Result<(), MuxvetError> {
        let winsize = Winsize {
            ws_row: dims.rows,
            ws_col: dims.cols,
            ws_xpixel: 0,
            ws_ypixel: 0,
        };
        let rc = unsafe { libc::ioctl(self.master.as_raw_fd(), libc::TIOCSWINSZ as _, &winsize) };
        if rc < 0 {
            let err = std::io::Error::last_os_error();
            return Err(MuxvetError::Resize {
                rows: dims.rows,
                cols: dims.cols,
                reason: err.to_string(),
            });
        }
        Ok(())
    }

    /// Check if the child process is still alive.
    ///
    /// Uses `kill(pid, 0)` instead of `waitpid(WNOHANG)` to avoid reaping
    /// the child -- reaping discards the exit status, which would cause the
    /// subsequent `wait()` call to return ECHILD and default to exit code 0.
    pub fn is_alive(&self) -> bool {
        signal::kill(self.child_pid, None).is_ok()
    }

    /// Reap the child if it has already exited, without blocking.
    ///
    /// Returns the exit code when the child is gone, `None` while it is
    /// still running. Signal termination maps to negative values.
    pub fn try_reap(&self) -> Result<Option<i32>, MuxvetError> {
        match waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::Exited(_, code)) => Ok(Some(code)),
            Ok(WaitStatus::Signaled(_, sig, _)) => Ok(Some(-(sig as i32))),
            Ok(WaitStatus::StillAlive) => Ok(None),
            Ok(_) => Ok(None), // Stopped, continued, etc. -- not an exit
            Err(Errno::ECHILD) => Ok(Some(0)), // Already reaped
            Err(e) => Err(MuxvetError::Pty(format!("waitpid: {e}"))),
        }
    }

    /// Wait for the child to exit and return its exit code.
    ///
    /// Returns negative values for signal termination (-signum).
    pub fn wait(&self) -> Result<i32, MuxvetError> {
        loop {
            match waitpid(self.child_pid, None) {
                Ok(WaitStatus::Exited(_, code)) => return Ok(code),
                Ok(WaitStatus::Signaled(_, sig, _)) => return Ok(-(sig as i32)),
                Ok(WaitStatus::StillAlive) => continue,
                Ok(_) => continue, // Stopped, continued, etc. -- keep waiting
                Err(Errno::ECHILD) => return Ok(0), // Already reaped
                Err(e) => {
                    return Err(MuxvetError::Pty(format!("waitpid: {e}")));
                }
            }
        }
    }

    /// The child's process ID.
    pub fn pid(&self) -> u32 {
        u32::try_from(self.child_pid.as_raw()).unwrap_or(0)
    }

    /// Poll the master fd for readability with a timeout.
    ///
    /// Returns `true` if data is available to read, `false` on timeout.
    pub fn poll_readable(&self, timeout_ms: i32) -> Result<bool, MuxvetError> {
        let borrowed = self.master.as_fd();
        let mut poll_fd = [PollFd::new(borrowed, PollFlags::POLLIN)];
        let timeout = if timeout_ms < 0 {
            PollTimeout::NONE
        } else {
            PollTimeout::try_from(timeout_ms as u32).unwrap_or(PollTimeout::MAX)
        };

        match nix::poll::poll(&mut poll_fd, timeout) {
            Ok(0) => Ok(false),
            Ok(_) => {
                let revents = poll_fd[0].revents().unwrap_or(PollFlags::empty());
                // POLLIN means data available; POLLHUP means child closed
                Ok(revents.contains(PollFlags::POLLIN) || revents.contains(PollFlags::POLLHUP))
            }
            Err(Errno::EINTR) => Ok(false), // Interrupted, treat as timeout
            Err(e) => Err(MuxvetError::Pty(format!("poll: {e}"))),
        }
    }

    /// Send SIGTERM to the child process.
    pub fn terminate(&self) -> Result<(), MuxvetError> {
        signal::kill(self.child_pid, Signal::SIGTERM)
            .map_err(|e| MuxvetError::Pty(format!("kill SIGTERM: {e}")))
    }

    /// Send SIGKILL to the child process.
    ///
    /// A child that is already gone is not an error; teardown calls this
    /// unconditionally.
    pub fn kill(&self) -> Result<(), MuxvetError> {
        match signal::kill(self.child_pid, Signal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(MuxvetError::Pty(format!("kill SIGKILL: {e}"))),
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        // Attempt to terminate the child if still alive, then reap to avoid zombies.
        // Ignore errors -- we're in a destructor and best-effort cleanup is fine.
        if matches!(
            waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG)),
            Ok(WaitStatus::StillAlive)
        ) {
            let _ = signal::kill(self.child_pid, Signal::SIGTERM);
            std::thread::sleep(std::time::Duration::from_millis(100));
            // Reap if it exited; if not, it becomes an orphan (init adopts it).
            let _ = waitpid(self.child_pid, Some(WaitPidFlag::WNOHANG));
        }
        // OwnedFd closes the master fd automatically when dropped.
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    fn drain(process: &PtyProcess) -> String {
        let mut buf = [0u8; 1024];
        let mut output = Vec::new();
        loop {
            match process.read(&mut buf) {
                Ok(PtyRead::Data(n)) => output.extend_from_slice(&buf[..n]),
                Ok(PtyRead::WouldBlock) => {
                    if !process.poll_readable(200).unwrap_or(false) {
                        break;
                    }
                }
                Ok(PtyRead::Eof) | Err(_) => break,
            }
        }
        String::from_utf8_lossy(&output).into_owned()
    }

    #[test]
    fn spawn_echo_and_read_output() {
        let process = PtyProcess::spawn(
            "/bin/echo",
            &["hello muxvet".to_string()],
            &PathBuf::from("/tmp"),
            &[],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(100));
        let text = drain(&process);
        assert!(
            text.contains("hello muxvet"),
            "expected 'hello muxvet' in output: {text:?}"
        );

        let code = process.wait().expect("wait failed");
        assert_eq!(code, 0);
    }

    #[test]
    fn spawn_cat_and_write_to_stdin() {
        let process = PtyProcess::spawn(
            "/bin/cat",
            &[],
            &PathBuf::from("/tmp"),
            &[],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(50));
        process.write_all(b"test input\n").expect("write failed");
        std::thread::sleep(Duration::from_millis(100));

        let text = drain(&process);
        assert!(
            text.contains("test input"),
            "expected 'test input' in output: {text:?}"
        );

        // Send EOF to cat
        process.write_all(&[0x04]).expect("EOF failed"); // Ctrl-D
        let code = process.wait().expect("wait failed");
        assert_eq!(code, 0);
    }

    #[test]
    fn child_sees_initial_window_size() {
        let process = PtyProcess::spawn(
            "/bin/sh",
            &["-c".to_string(), "stty size".to_string()],
            &PathBuf::from("/tmp"),
            &[("PATH".to_string(), "/usr/bin:/bin".to_string())],
            Dimensions::new(50, 200),
        )
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(200));
        let text = drain(&process);
        assert!(
            text.contains("50 200"),
            "expected 'stty size' to report 50 200: {text:?}"
        );
        process.wait().ok();
    }

    #[test]
    fn child_environment_is_exactly_what_was_given() {
        std::env::set_var("MUXVET_LEAK_PROBE", "leaked");
        let process = PtyProcess::spawn(
            "/bin/sh",
            &[
                "-c".to_string(),
                "echo probe=[$MUXVET_LEAK_PROBE] mark=[$MUXVET_MARK]".to_string(),
            ],
            &PathBuf::from("/tmp"),
            &[("MUXVET_MARK".to_string(), "present".to_string())],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        std::thread::sleep(Duration::from_millis(200));
        let text = drain(&process);
        assert!(
            text.contains("probe=[] mark=[present]"),
            "expected explicit env only: {text:?}"
        );
        process.wait().ok();
    }

    #[test]
    fn wait_returns_exit_code() {
        let process = PtyProcess::spawn(
            "/bin/sh",
            &["-c".to_string(), "exit 3".to_string()],
            &PathBuf::from("/tmp"),
            &[],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        let code = process.wait().expect("wait failed");
        assert_eq!(code, 3);
    }

    #[test]
    fn read_reports_eof_after_child_exits() {
        let process = PtyProcess::spawn(
            "/bin/echo",
            &["done".to_string()],
            &PathBuf::from("/tmp"),
            &[],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        process.wait().expect("wait failed");
        std::thread::sleep(Duration::from_millis(50));

        // Drain pending output; once the slave side is closed the master
        // reports EOF rather than WouldBlock.
        let mut buf = [0u8; 1024];
        let mut saw_eof = false;
        for _ in 0..50 {
            match process.read(&mut buf).expect("read failed") {
                PtyRead::Eof => {
                    saw_eof = true;
                    break;
                }
                PtyRead::Data(_) => continue,
                PtyRead::WouldBlock => std::thread::sleep(Duration::from_millis(10)),
            }
        }
        assert!(saw_eof, "expected EOF after child exit");
    }

    #[test]
    fn poll_readable_returns_data() {
        let process = PtyProcess::spawn(
            "/bin/echo",
            &["poll test".to_string()],
            &PathBuf::from("/tmp"),
            &[],
            Dimensions::new(24, 80),
        )
        .expect("spawn failed");

        // Should become readable quickly
        let readable = process.poll_readable(1000).expect("poll failed");
        assert!(readable, "expected data to be readable");

        process.wait().ok();
    }
}
