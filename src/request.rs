//! Handles for in-flight tile transfers.
//!
//! The root side of scatter and gather posts one nonblocking transfer per
//! peer (a whole tile view each) and completes the batch with
//! [`Request::wait_all`] after its own matching blocking call. Drivers that
//! ship verification data with [`Communicator::isend`] get a single
//! [`Request`] back and call [`wait`](Request::wait) on it.
//!
//! [`Communicator::isend`]: crate::Communicator::isend

use crate::error::{Error, Result};
use crate::ffi;

/// One pending transfer.
///
/// The handle is consumed by [`wait`](Self::wait); a request that is
/// dropped while still pending is waited on first, so no transfer is ever
/// abandoned with its buffer in limbo.
pub struct Request {
    pending: Option<i64>,
}

impl Request {
    pub(crate) fn new(handle: i64) -> Self {
        Request {
            pending: Some(handle),
        }
    }

    /// Block until the transfer finishes.
    ///
    /// Afterwards the buffer named when the transfer was posted is safe to
    /// touch again.
    pub fn wait(mut self) -> Result<()> {
        match self.pending.take() {
            Some(handle) => Error::check(unsafe { ffi::cartompi_wait(handle) }),
            None => Ok(()),
        }
    }

    /// Complete a batch of transfers in one call.
    ///
    /// Used by the scatter/gather root, which has one outstanding tile
    /// transfer per peer. Requests already completed are skipped.
    pub(crate) fn wait_all(mut requests: Vec<Request>) -> Result<()> {
        let mut handles: Vec<i64> = requests
            .iter_mut()
            .filter_map(|r| r.pending.take())
            .collect();
        if handles.is_empty() {
            return Ok(());
        }
        let ret = unsafe { ffi::cartompi_waitall(handles.len() as i64, handles.as_mut_ptr()) };
        Error::check(ret)
    }
}

impl Drop for Request {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            unsafe { ffi::cartompi_wait(handle) };
        }
    }
}
