//! Compiles the C wrapper (csrc/cartompi.c) and links it against the
//! system MPI.
//!
//! Compile and link flags come from `mpicc -show`, the compiler wrapper
//! every MPICH- and OpenMPI-family installation ships (point `MPICC` at a
//! different wrapper to override). Installations without a wrapper in PATH
//! are picked up through pkg-config instead.

use std::env;
use std::path::PathBuf;
use std::process::Command;

struct MpiFlags {
    include_paths: Vec<PathBuf>,
    link_paths: Vec<PathBuf>,
    libs: Vec<String>,
}

fn main() {
    println!("cargo:rerun-if-changed=csrc/cartompi.c");
    println!("cargo:rerun-if-changed=csrc/cartompi.h");
    println!("cargo:rerun-if-env-changed=MPICC");

    let flags = mpicc_flags().or_else(pkg_config_flags).unwrap_or_else(|| {
        panic!(
            "no usable MPI installation found.\n\
             Tried `mpicc -show` (set MPICC to pick a different wrapper)\n\
             and pkg-config (mpich, ompi)."
        )
    });

    let mut shim = cc::Build::new();
    shim.file("csrc/cartompi.c").include("csrc").warnings(true);
    for dir in &flags.include_paths {
        shim.include(dir);
    }
    shim.compile("cartompi");

    for dir in &flags.link_paths {
        println!("cargo:rustc-link-search=native={}", dir.display());
        // rpath so the demos find the same libmpi at mpiexec time
        println!("cargo:rustc-link-arg=-Wl,-rpath,{}", dir.display());
    }
    for lib in &flags.libs {
        println!("cargo:rustc-link-lib={lib}");
    }
}

/// Ask the MPI compiler wrapper how it would build, and pick the -I/-L/-l
/// pieces out of the echoed command line.
fn mpicc_flags() -> Option<MpiFlags> {
    let mpicc = env::var("MPICC").unwrap_or_else(|_| "mpicc".to_string());
    let output = Command::new(&mpicc).arg("-show").output().ok()?;
    if !output.status.success() {
        return None;
    }

    let mut flags = MpiFlags {
        include_paths: Vec::new(),
        link_paths: Vec::new(),
        libs: Vec::new(),
    };
    for word in String::from_utf8_lossy(&output.stdout).split_whitespace() {
        if let Some(dir) = word.strip_prefix("-I") {
            flags.include_paths.push(PathBuf::from(dir));
        } else if let Some(dir) = word.strip_prefix("-L") {
            flags.link_paths.push(PathBuf::from(dir));
        } else if let Some(lib) = word.strip_prefix("-l") {
            flags.libs.push(lib.to_string());
        }
    }

    // some wrappers (OpenMPI) hide the libraries behind -showme tricks;
    // linking plain libmpi is the portable default
    if flags.libs.is_empty() {
        flags.libs.push("mpi".to_string());
    }

    eprintln!("cartompi: MPI flags from `{mpicc} -show`");
    Some(flags)
}

fn pkg_config_flags() -> Option<MpiFlags> {
    for name in ["mpich", "ompi"] {
        if let Ok(lib) = pkg_config::Config::new()
            .cargo_metadata(false)
            .probe(name)
        {
            eprintln!("cartompi: MPI flags from pkg-config ({name})");
            return Some(MpiFlags {
                include_paths: lib.include_paths,
                link_paths: lib.link_paths,
                libs: lib.libs,
            });
        }
    }
    None
}
