//! Raw FFI bindings to the C wrapper layer.
//!
//! These are low-level unsafe functions. Use the safe wrappers in the parent module.

#![allow(dead_code)]
#![allow(non_camel_case_types)]

use std::os::raw::{c_char, c_double, c_int, c_void};

// Type aliases matching the C header
pub type int32_t = i32;
pub type int64_t = i64;

extern "C" {
    // ============================================================
    // Initialization and Finalization
    // ============================================================

    pub fn cartompi_init_thread(required: c_int, provided: *mut c_int) -> c_int;
    pub fn cartompi_finalize() -> c_int;
    pub fn cartompi_initialized(flag: *mut c_int) -> c_int;
    pub fn cartompi_finalized(flag: *mut c_int) -> c_int;

    // ============================================================
    // Communicator Operations
    // ============================================================

    pub fn cartompi_comm_world() -> int32_t;
    pub fn cartompi_comm_rank(comm: int32_t, rank: *mut int32_t) -> c_int;
    pub fn cartompi_comm_size(comm: int32_t, size: *mut int32_t) -> c_int;
    pub fn cartompi_comm_free(comm: int32_t) -> c_int;
    pub fn cartompi_barrier(comm: int32_t) -> c_int;

    // ============================================================
    // Cartesian Topology
    // ============================================================

    pub fn cartompi_cart_create(
        comm: int32_t,
        ndims: int32_t,
        dims: *const int32_t,
        periods: *const int32_t,
        reorder: int32_t,
        newcomm: *mut int32_t,
    ) -> c_int;

    pub fn cartompi_cart_rank(
        comm: int32_t,
        coords: *const int32_t,
        rank: *mut int32_t,
    ) -> c_int;

    pub fn cartompi_cart_coords(
        comm: int32_t,
        rank: int32_t,
        ndims: int32_t,
        coords: *mut int32_t,
    ) -> c_int;

    // ============================================================
    // Datatype Management
    // ============================================================

    pub fn cartompi_type_subarray(
        ndims: int32_t,
        sizes: *const int32_t,
        subsizes: *const int32_t,
        starts: *const int32_t,
        elem: int32_t,
        newtype: *mut int32_t,
    ) -> c_int;

    pub fn cartompi_type_free(datatype: int32_t) -> c_int;

    // ============================================================
    // Point-to-Point Communication
    // ============================================================

    pub fn cartompi_send(
        buf: *const c_void,
        count: int64_t,
        datatype: int32_t,
        dest: int32_t,
        tag: int32_t,
        comm: int32_t,
    ) -> c_int;

    pub fn cartompi_recv(
        buf: *mut c_void,
        count: int64_t,
        datatype: int32_t,
        source: int32_t,
        tag: int32_t,
        comm: int32_t,
        actual_source: *mut int32_t,
        actual_tag: *mut int32_t,
    ) -> c_int;

    pub fn cartompi_isend(
        buf: *const c_void,
        count: int64_t,
        datatype: int32_t,
        dest: int32_t,
        tag: int32_t,
        comm: int32_t,
        request: *mut int64_t,
    ) -> c_int;

    pub fn cartompi_irecv(
        buf: *mut c_void,
        count: int64_t,
        datatype: int32_t,
        source: int32_t,
        tag: int32_t,
        comm: int32_t,
        request: *mut int64_t,
    ) -> c_int;

    pub fn cartompi_sendrecv(
        sendbuf: *const c_void,
        sendcount: int64_t,
        sendtype: int32_t,
        dest: int32_t,
        sendtag: int32_t,
        recvbuf: *mut c_void,
        recvcount: int64_t,
        recvtype: int32_t,
        source: int32_t,
        recvtag: int32_t,
        comm: int32_t,
    ) -> c_int;

    // ============================================================
    // Collective Operations
    // ============================================================

    pub fn cartompi_bcast(
        buf: *mut c_void,
        count: int64_t,
        datatype: int32_t,
        root: int32_t,
        comm: int32_t,
    ) -> c_int;

    // ============================================================
    // Request Management
    // ============================================================

    pub fn cartompi_wait(request: int64_t) -> c_int;
    pub fn cartompi_waitall(count: int64_t, requests: *mut int64_t) -> c_int;

    // ============================================================
    // Diagnostics
    // ============================================================

    pub fn cartompi_error_info(
        code: c_int,
        error_class: *mut int32_t,
        message: *mut c_char,
        msg_len: *mut int32_t,
    ) -> c_int;

    pub fn cartompi_get_version(version: *mut c_char, len: *mut int32_t) -> c_int;
    pub fn cartompi_get_processor_name(name: *mut c_char, len: *mut int32_t) -> c_int;
    pub fn cartompi_wtime() -> c_double;
    pub fn cartompi_abort(comm: int32_t, errorcode: int32_t) -> c_int;
}
