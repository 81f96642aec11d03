//! Safe wrappers for communicator operations.
//!
//! [`Communicator`] wraps an integer handle into the C layer's communicator
//! table. The world communicator is always handle 0; Cartesian communicators
//! are created through [`Communicator::cart_create`] and released through
//! [`Communicator::release`] (called from the splitter's drop).

use crate::datatype::Element;
use crate::error::{Error, Result};
use crate::ffi;
use crate::request::Request;
use crate::view::SubarrayView;

/// A communicator handle.
///
/// All communication in this crate flows through a `Communicator`: the
/// origin (world) communicator for construction, and the derived Cartesian
/// communicator for every collective. The handle itself is plain data; the
/// owning object (the splitter, for Cartesian communicators) decides when
/// [`release`](Self::release) is called.
pub struct Communicator {
    handle: i32,
}

impl Communicator {
    /// Get a handle to the world communicator.
    pub(crate) fn world() -> Self {
        Communicator {
            handle: unsafe { ffi::cartompi_comm_world() },
        }
    }

    /// Get the raw communicator handle (for advanced use).
    pub fn raw_handle(&self) -> i32 {
        self.handle
    }

    /// Get the rank of the calling process in this communicator.
    pub fn rank(&self) -> i32 {
        let mut rank: i32 = 0;
        unsafe { ffi::cartompi_comm_rank(self.handle, &mut rank) };
        rank
    }

    /// Get the number of processes in this communicator.
    pub fn size(&self) -> i32 {
        let mut size: i32 = 0;
        unsafe { ffi::cartompi_comm_size(self.handle, &mut size) };
        size
    }

    /// Get the processor name for this process.
    pub fn processor_name(&self) -> Result<String> {
        let mut buf = [0u8; 256];
        let mut len: i32 = 0;
        let ret =
            unsafe { ffi::cartompi_get_processor_name(buf.as_mut_ptr().cast::<i8>(), &mut len) };
        Error::check(ret)?;
        let len = len.max(0) as usize;
        let s = std::str::from_utf8(&buf[..len])
            .map_err(|_| Error::Internal("Invalid UTF-8 in processor name".into()))?;
        Ok(s.to_string())
    }

    /// Release the underlying communicator.
    ///
    /// Only derived communicators may be released; the world communicator is
    /// managed by the runtime.
    pub(crate) fn release(&mut self) -> Result<()> {
        let ret = unsafe { ffi::cartompi_comm_free(self.handle) };
        self.handle = -1;
        Error::check(ret)
    }

    // ========================================================================
    // Cartesian topology
    // ========================================================================

    /// Derive a communicator with a Cartesian topology from this one.
    ///
    /// `periods[d]` enables wrap-around on axis `d`; with `reorder` the
    /// runtime may permute peer identities for locality. Returns `None` on
    /// peers left out of the grid (when this communicator holds more peers
    /// than `prod(dims)`).
    pub(crate) fn cart_create(
        &self,
        dims: &[i32],
        periods: &[i32],
        reorder: bool,
    ) -> Result<Option<Communicator>> {
        let mut new_handle: i32 = -1;
        let ret = unsafe {
            ffi::cartompi_cart_create(
                self.handle,
                dims.len() as i32,
                dims.as_ptr(),
                periods.as_ptr(),
                i32::from(reorder),
                &mut new_handle,
            )
        };
        Error::check(ret)?;
        if new_handle < 0 {
            Ok(None)
        } else {
            Ok(Some(Communicator { handle: new_handle }))
        }
    }

    /// Resolve grid coordinates to a rank inside this Cartesian communicator.
    ///
    /// Periodic axes wrap; out-of-range coordinates on non-periodic axes are
    /// the caller's responsibility to reject beforehand.
    pub(crate) fn cart_rank(&self, coords: &[i32]) -> Result<i32> {
        let mut rank: i32 = 0;
        let ret = unsafe { ffi::cartompi_cart_rank(self.handle, coords.as_ptr(), &mut rank) };
        Error::check(ret)?;
        Ok(rank)
    }

    /// Resolve a rank to its grid coordinates inside this Cartesian
    /// communicator.
    pub(crate) fn cart_coords(&self, rank: i32, ndims: usize) -> Result<Vec<i32>> {
        let mut coords = vec![0i32; ndims];
        let ret = unsafe {
            ffi::cartompi_cart_coords(self.handle, rank, ndims as i32, coords.as_mut_ptr())
        };
        Error::check(ret)?;
        Ok(coords)
    }

    // ========================================================================
    // Synchronization and broadcast
    // ========================================================================

    /// Barrier synchronization.
    ///
    /// All processes in the communicator must call this function. No process
    /// will return until all processes have entered the barrier.
    pub fn barrier(&self) -> Result<()> {
        let ret = unsafe { ffi::cartompi_barrier(self.handle) };
        Error::check(ret)
    }

    /// Broadcast a slice from root to all processes.
    pub fn broadcast<T: Element>(&self, data: &mut [T], root: i32) -> Result<()> {
        let ret = unsafe {
            ffi::cartompi_bcast(
                data.as_mut_ptr().cast::<std::ffi::c_void>(),
                data.len() as i64,
                T::TAG as i32,
                root,
                self.handle,
            )
        };
        Error::check(ret)
    }

    // ========================================================================
    // Point-to-point, contiguous slices
    // ========================================================================

    /// Send a slice of values to another process.
    pub fn send<T: Element>(&self, data: &[T], dest: i32, tag: i32) -> Result<()> {
        let ret = unsafe {
            ffi::cartompi_send(
                data.as_ptr().cast::<std::ffi::c_void>(),
                data.len() as i64,
                T::TAG as i32,
                dest,
                tag,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Receive a slice of values from another process.
    ///
    /// Use `source = -1` for any source and `tag = -1` for any tag. Returns
    /// `(actual_source, actual_tag)`.
    pub fn recv<T: Element>(&self, data: &mut [T], source: i32, tag: i32) -> Result<(i32, i32)> {
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;

        let ret = unsafe {
            ffi::cartompi_recv(
                data.as_mut_ptr().cast::<std::ffi::c_void>(),
                data.len() as i64,
                T::TAG as i32,
                source,
                tag,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
            )
        };
        Error::check(ret)?;
        Ok((actual_source, actual_tag))
    }

    /// Nonblocking send of a slice to another process.
    ///
    /// The buffer **must not be modified** until the returned [`Request`]
    /// completes via [`Request::wait`].
    pub fn isend<T: Element>(&self, data: &[T], dest: i32, tag: i32) -> Result<Request> {
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::cartompi_isend(
                data.as_ptr().cast::<std::ffi::c_void>(),
                data.len() as i64,
                T::TAG as i32,
                dest,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        Ok(Request::new(request_handle))
    }

    /// Nonblocking receive of a slice from another process.
    ///
    /// The buffer **must not be read** until the returned [`Request`]
    /// completes. Use `source = -1` for any source and `tag = -1` for any
    /// tag.
    pub fn irecv<T: Element>(&self, data: &mut [T], source: i32, tag: i32) -> Result<Request> {
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::cartompi_irecv(
                data.as_mut_ptr().cast::<std::ffi::c_void>(),
                data.len() as i64,
                T::TAG as i32,
                source,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        Ok(Request::new(request_handle))
    }

    // ========================================================================
    // Point-to-point, strided views
    // ========================================================================

    /// Nonblocking send of one unit of `view` read from the base of `buf`.
    ///
    /// The buffer must not be modified until the returned [`Request`]
    /// completes.
    pub(crate) fn isend_view<T: Element>(
        &self,
        buf: &[T],
        view: &SubarrayView<T>,
        dest: i32,
        tag: i32,
    ) -> Result<Request> {
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::cartompi_isend(
                buf.as_ptr().cast::<std::ffi::c_void>(),
                1,
                view.raw_handle(),
                dest,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        Ok(Request::new(request_handle))
    }

    /// Nonblocking receive of one unit of `view` written at the base of `buf`.
    pub(crate) fn irecv_view<T: Element>(
        &self,
        buf: &mut [T],
        view: &SubarrayView<T>,
        source: i32,
        tag: i32,
    ) -> Result<Request> {
        let mut request_handle: i64 = 0;
        let ret = unsafe {
            ffi::cartompi_irecv(
                buf.as_mut_ptr().cast::<std::ffi::c_void>(),
                1,
                view.raw_handle(),
                source,
                tag,
                self.handle,
                &mut request_handle,
            )
        };
        Error::check(ret)?;
        Ok(Request::new(request_handle))
    }

    /// Blocking send of one unit of `view` read from the base of `buf`.
    pub(crate) fn send_view<T: Element>(
        &self,
        buf: &[T],
        view: &SubarrayView<T>,
        dest: i32,
        tag: i32,
    ) -> Result<()> {
        let ret = unsafe {
            ffi::cartompi_send(
                buf.as_ptr().cast::<std::ffi::c_void>(),
                1,
                view.raw_handle(),
                dest,
                tag,
                self.handle,
            )
        };
        Error::check(ret)
    }

    /// Blocking receive of one unit of `view` written at the base of `buf`.
    pub(crate) fn recv_view<T: Element>(
        &self,
        buf: &mut [T],
        view: &SubarrayView<T>,
        source: i32,
        tag: i32,
    ) -> Result<()> {
        let mut actual_source: i32 = 0;
        let mut actual_tag: i32 = 0;
        let ret = unsafe {
            ffi::cartompi_recv(
                buf.as_mut_ptr().cast::<std::ffi::c_void>(),
                1,
                view.raw_handle(),
                source,
                tag,
                self.handle,
                &mut actual_source,
                &mut actual_tag,
            )
        };
        Error::check(ret)
    }

    /// Combined send-and-receive within a single buffer.
    ///
    /// Sends `sendcount` units of `sendtype` read from the base of `buf` to
    /// `dest` while receiving `recvcount` units of `recvtype` into the same
    /// buffer from `source`. The two regions named by the views must not
    /// overlap. A count of 0 with the corresponding view absent turns that
    /// side into a no-op, as does a `NULL_RANK` peer.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn sendrecv_within<T: Element>(
        &self,
        buf: &mut [T],
        sendcount: i64,
        sendtype: i32,
        dest: i32,
        sendtag: i32,
        recvcount: i64,
        recvtype: i32,
        source: i32,
        recvtag: i32,
    ) -> Result<()> {
        let ret = unsafe {
            ffi::cartompi_sendrecv(
                buf.as_ptr().cast::<std::ffi::c_void>(),
                sendcount,
                sendtype,
                dest,
                sendtag,
                buf.as_mut_ptr().cast::<std::ffi::c_void>(),
                recvcount,
                recvtype,
                source,
                recvtag,
                self.handle,
            )
        };
        Error::check(ret)
    }
}
