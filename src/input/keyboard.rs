//! Keyboard input
//!
//! Set console TTY stdin to raw mode and
//! read keystrokes non-blocking.
//! Kernel VT layer handles scancode to character conversion,
//! so we get normal ASCII keys and escape sequences (arrow keys, etc.).

use log::{info, warn};
use nix::errno::Errno;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use nix::sys::termios::{self, LocalFlags, OutputFlags, Termios};
use std::os::fd::{AsRawFd, BorrowedFd, RawFd};

use super::device::RawInputStream;
use crate::error::{Error, Result};
use crate::session::Release;

/// Raw, non-blocking TTY input
pub struct TtyInput {
    /// Input file descriptor (stdin unless wrapped explicitly)
    fd: RawFd,
    /// Original termios settings, `None` when not a TTY or already restored
    orig_termios: Option<Termios>,
    /// Original file status flags, `None` once restored
    orig_flags: Option<OFlag>,
}

impl TtyInput {
    /// Put stdin into raw, non-blocking mode
    pub fn open() -> Result<Self> {
        Self::from_fd(std::io::stdin().as_raw_fd())
    }

    /// Wrap an already-open descriptor
    ///
    /// Non-TTY descriptors (pipes, files) are read as-is without raw mode.
    pub fn from_fd(fd: RawFd) -> Result<Self> {
        let borrowed = unsafe { BorrowedFd::borrow_raw(fd) };

        let orig_termios = match termios::tcgetattr(borrowed) {
            Ok(orig) => {
                let mut raw = orig.clone();
                termios::cfmakeraw(&mut raw);
                // Ctrl+C still raises SIGINT, and log lines keep their CR
                raw.local_flags.insert(LocalFlags::ISIG);
                raw.output_flags.insert(OutputFlags::OPOST);
                termios::tcsetattr(borrowed, termios::SetArg::TCSAFLUSH, &raw)?;
                Some(orig)
            }
            Err(Errno::ENOTTY) => {
                warn!("Input fd {} is not a TTY, reading without raw mode", fd);
                None
            }
            Err(e) => return Err(e.into()),
        };

        let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
        let mut nonblocking = flags;
        nonblocking.insert(OFlag::O_NONBLOCK);
        fcntl(fd, FcntlArg::F_SETFL(nonblocking))?;

        info!(
            "Keyboard initialized ({})",
            if orig_termios.is_some() { "raw mode" } else { "passthrough" }
        );

        Ok(Self {
            fd,
            orig_termios,
            orig_flags: Some(flags),
        })
    }

    /// Readiness flags reported by a zero-timeout poll
    fn readiness(&self) -> libc::c_short {
        let mut pfd = libc::pollfd {
            fd: self.fd,
            events: libc::POLLIN,
            revents: 0,
        };
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready > 0 {
            pfd.revents
        } else {
            0
        }
    }
}

impl RawInputStream for TtyInput {
    fn bytes_available(&mut self) -> Result<usize> {
        let mut queued: libc::c_int = 0;
        let rc = unsafe { libc::ioctl(self.fd, libc::FIONREAD, &mut queued) };
        if rc < 0 {
            return Err(std::io::Error::last_os_error().into());
        }
        if queued > 0 {
            return Ok(queued as usize);
        }

        let revents = self.readiness();
        if revents & libc::POLLHUP != 0 {
            return Err(Error::StreamClosed);
        }
        // Readable but nothing counted: a key landed after FIONREAD, or a
        // regular file sits at EOF. A one-byte read tells them apart.
        if revents & libc::POLLIN != 0 {
            return Ok(1);
        }
        Ok(0)
    }

    fn read(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; n];
        match nix::unistd::read(self.fd, &mut buf) {
            Ok(0) if n > 0 => Err(Error::StreamClosed),
            Ok(len) => {
                buf.truncate(len);
                Ok(buf)
            }
            Err(Errno::EAGAIN) | Err(Errno::EINTR) => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }
}

impl Release for TtyInput {
    fn release(&mut self) -> Result<()> {
        if let Some(orig) = self.orig_termios.take() {
            let borrowed = unsafe { BorrowedFd::borrow_raw(self.fd) };
            termios::tcsetattr(borrowed, termios::SetArg::TCSAFLUSH, &orig)
                .map_err(|e| Error::Release {
                    resource: "keyboard",
                    message: e.to_string(),
                })?;
            info!("Keyboard settings restored");
        }
        if let Some(flags) = self.orig_flags.take() {
            fcntl(self.fd, FcntlArg::F_SETFL(flags)).map_err(|e| Error::Release {
                resource: "keyboard",
                message: e.to_string(),
            })?;
        }
        Ok(())
    }
}

impl Drop for TtyInput {
    fn drop(&mut self) {
        // Normally already released by the guard
        let _ = self.release();
    }
}
