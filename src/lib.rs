//! # cartompi
//!
//! Cartesian-grid decomposition of N-dimensional dense arrays over MPI,
//! wrapped through a thin C layer.
//!
//! The crate partitions a global row-major array into per-peer tiles over a
//! process grid of arbitrary rank, optionally surrounds each tile with a
//! halo (ghost region), and provides three collective primitives:
//!
//! - **scatter** — global array at a root peer → per-peer local buffers
//! - **gather** — per-peer interiors → global array at a root peer
//! - **halo update** — neighbor-to-neighbor exchange of boundary strips
//!
//! The work happens up front: a [`CartSplitter`] resolves the process grid
//! and every first-neighbor relationship once, and a [`Descriptor`]
//! prebuilds every strided subarray view the collectives will ever need.
//! The collectives themselves are short loops over those tables.
//!
//! ## Quick Start
//!
//! ```no_run
//! use cartompi::{CartSplitter, HaloPolicy, Mpi};
//!
//! fn main() -> Result<(), cartompi::Error> {
//!     let mpi = Mpi::init()?;
//!     let world = mpi.world();
//!
//!     // 2D grid of 2x2 peers, no wrap-around
//!     let cs = CartSplitter::new(&[2, 2], &[false, false], &world, true)?;
//!     if !cs.in_grid() {
//!         return Ok(());
//!     }
//!
//!     // Split a 600x600 array with a 2-cell halo on every side
//!     let dd = cs.create_descriptor_uniform::<f64>(&[600, 600], 2, 2, HaloPolicy::Full)?;
//!
//!     let data = if cs.rank()? == 0 {
//!         vec![1.0f64; dd.total_size()]
//!     } else {
//!         Vec::new()
//!     };
//!     let mut local = vec![0.0f64; dd.local_size()];
//!
//!     cs.scatter(&data, &mut local, 0, &dd)?;
//!     cs.halo_update(&mut local, &dd)?;
//!
//!     Ok(())
//! }
//! ```
//!
//! Run with `mpiexec -n 4 ./your_binary`.
//!
//! ## Concurrency model
//!
//! Each peer is a single-threaded actor; all collectives are blocking and
//! must be called by every in-grid peer (SPMD). Concurrency exists only
//! across peers, coordinated by the MPI runtime. [`Mpi`] is `!Send +
//! !Sync`: initialization and finalization stay on one thread.

#![warn(missing_docs)]
#![warn(clippy::all)]
// Allow certain pedantic lints for existing code
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod cart;
mod comm;
mod datatype;
mod descriptor;
mod error;
mod ffi;
mod request;
pub mod shape;
mod view;

pub use cart::CartSplitter;
pub use comm::Communicator;
pub use datatype::{Element, ElementTag};
pub use descriptor::{Descriptor, HaloPolicy};
pub use error::{Error, ErrorClass, Result};
pub use request::Request;

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};

/// Sentinel rank for an off-grid neighbor.
///
/// Sends to and receives from `NULL_RANK` complete immediately without
/// transferring anything. `-1` is reserved for any-source / any-tag in
/// receive positions, matching the C layer.
pub const NULL_RANK: i32 = -2;

/// Global flag tracking whether MPI has been initialized
static MPI_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// MPI thread support levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(i32)]
pub enum ThreadLevel {
    /// Only single-threaded execution
    Single = 0,
    /// Multi-threaded, but MPI calls only from main thread
    Funneled = 1,
    /// Multi-threaded, but MPI calls serialized by user
    Serialized = 2,
    /// Full multi-threaded support
    Multiple = 3,
}

/// MPI environment handle.
///
/// This type represents an initialized MPI environment. There can only be
/// one instance of this type at a time. When dropped, it finalizes MPI.
///
/// # Example
///
/// ```no_run
/// use cartompi::Mpi;
///
/// let mpi = Mpi::init().expect("Failed to initialize MPI");
/// let world = mpi.world();
/// println!("Running on {} processes", world.size());
/// // MPI is finalized when `mpi` goes out of scope
/// ```
pub struct Mpi {
    /// The thread level that was provided
    thread_level: ThreadLevel,
    /// Marker to make Mpi !Send and !Sync
    _marker: PhantomData<*const ()>,
}

impl Mpi {
    /// Initialize MPI with single-threaded support.
    ///
    /// # Errors
    ///
    /// Returns an error if MPI is already initialized or if initialization
    /// fails.
    pub fn init() -> Result<Self> {
        Self::init_thread(ThreadLevel::Single)
    }

    /// Initialize MPI with the specified thread support level.
    ///
    /// The actual level provided can be queried with
    /// [`thread_level()`](Self::thread_level).
    pub fn init_thread(required: ThreadLevel) -> Result<Self> {
        if MPI_INITIALIZED.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyInitialized);
        }

        let mut provided: i32 = 0;
        let ret = unsafe { ffi::cartompi_init_thread(required as i32, &mut provided) };

        if ret != 0 {
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
            return Err(Error::from_code(ret));
        }

        let thread_level = match provided {
            0 => ThreadLevel::Single,
            1 => ThreadLevel::Funneled,
            2 => ThreadLevel::Serialized,
            _ => ThreadLevel::Multiple,
        };

        Ok(Mpi {
            thread_level,
            _marker: PhantomData,
        })
    }

    /// Get the thread support level that was provided.
    pub fn thread_level(&self) -> ThreadLevel {
        self.thread_level
    }

    /// Get a handle to the world communicator.
    pub fn world(&self) -> Communicator {
        Communicator::world()
    }

    /// Get the current wall-clock time.
    ///
    /// This is a high-resolution timer suitable for benchmarking.
    pub fn wtime() -> f64 {
        unsafe { ffi::cartompi_wtime() }
    }

    /// Get the MPI library version string.
    pub fn version() -> Result<String> {
        let mut buf = [0u8; 256];
        let mut len: i32 = 0;
        let ret = unsafe { ffi::cartompi_get_version(buf.as_mut_ptr().cast::<i8>(), &mut len) };

        if ret != 0 {
            return Err(Error::from_code(ret));
        }

        let len = len.max(0) as usize;
        let s = std::str::from_utf8(&buf[..len])
            .map_err(|_| Error::Internal("Invalid UTF-8 in version string".into()))?;
        Ok(s.to_string())
    }

    /// Check if MPI has been initialized.
    pub fn is_initialized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::cartompi_initialized(&mut flag) };
        flag != 0
    }

    /// Check if MPI has been finalized.
    pub fn is_finalized() -> bool {
        let mut flag: i32 = 0;
        unsafe { ffi::cartompi_finalized(&mut flag) };
        flag != 0
    }
}

impl Drop for Mpi {
    fn drop(&mut self) {
        if MPI_INITIALIZED.load(Ordering::SeqCst) {
            unsafe {
                ffi::cartompi_finalize();
            }
            MPI_INITIALIZED.store(false, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    // Communication paths need an MPI runtime; run the demos with mpiexec:
    // cargo build --examples && mpiexec -n 9 ./target/debug/examples/halo_scatter FULL
}
