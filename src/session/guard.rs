//! Guaranteed release of leased hardware
//!
//! `ResourceGuard::run` is the single place where the dispatch loop's
//! devices are handed back. It releases exactly once whether the body
//! returns, fails, panics, or stops on an interrupt.

use log::{info, warn};
use std::panic::{self, AssertUnwindSafe};

use crate::error::Result;

/// Something holding an exclusive claim that must be returned
///
/// Implementations must tolerate being called more than once and being
/// called when nothing was ever acquired.
pub trait Release {
    fn release(&mut self) -> Result<()>;
}

impl<T: Release + ?Sized> Release for Box<T> {
    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

/// Scoped owner of a releasable resource
pub struct ResourceGuard<R: Release> {
    resource: R,
    released: bool,
}

impl<R: Release> ResourceGuard<R> {
    pub fn new(resource: R) -> Self {
        Self {
            resource,
            released: false,
        }
    }

    /// Run `body` with the resource, then release it
    ///
    /// The body's error wins over a release error; a release error is
    /// returned only when the body succeeded. Panics resume after release.
    pub fn run<T>(&mut self, body: impl FnOnce(&mut R) -> Result<T>) -> Result<T> {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| body(&mut self.resource)));
        let released = self.release();

        match outcome {
            Ok(Ok(value)) => released.map(|()| value),
            Ok(Err(e)) => {
                if let Err(release_err) = released {
                    warn!("{} (while handling: {})", release_err, e);
                }
                Err(e)
            }
            Err(payload) => {
                if let Err(release_err) = released {
                    warn!("{} (while unwinding)", release_err);
                }
                panic::resume_unwind(payload)
            }
        }
    }

    /// Release now; later calls are no-ops
    pub fn release(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        info!("Releasing leased devices");
        self.resource.release()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }
}
