//! Scatter / halo-update / gather round trip on a 1200x1200 array over a
//! 3x3 grid with a 20-cell halo.
//!
//! Rank 0 generates the data and scatters it; after a halo update the
//! interiors are gathered to rank 1, which ships the result back to rank 0
//! for an elementwise comparison against the original.
//!
//! Usage: halo_scatter [NO|FULL|TIGHT]   (default FULL, case-insensitive)
//!
//! Run with: mpiexec -n 9 ./target/debug/examples/halo_scatter TIGHT

use cartompi::{CartSplitter, HaloPolicy, Mpi};

const ROOT: i32 = 0; // data generator
const COLLECT_ROOT: i32 = 1; // data collector
const CHECK_TAG: i32 = 7;

fn policy_code(tok: &str) -> i32 {
    match tok.to_ascii_uppercase().as_str() {
        "NO" => 0,
        "FULL" => 1,
        "TIGHT" => 2,
        _ => -1,
    }
}

fn value(r: usize, c: usize) -> f64 {
    100.0 * (r + 1) as f64 + c as f64
}

fn main() -> cartompi::Result<()> {
    tracing_subscriber::fmt::init();

    let mpi = Mpi::init()?;
    let world = mpi.world();

    // When one rank panics the others would block forever inside a
    // collective; abort so every rank exits.
    std::panic::set_hook(Box::new(|info| {
        eprintln!("PANIC: {info}");
        std::process::abort();
    }));

    // Parse at world rank 0 and broadcast the choice; a bad token makes
    // every rank exit through the same path.
    let mut code = [1i32];
    if world.rank() == 0 {
        code[0] = std::env::args().nth(1).map_or(1, |tok| policy_code(&tok));
    }
    world.broadcast(&mut code, 0)?;
    let policy = match code[0] {
        0 => HaloPolicy::Unused,
        1 => HaloPolicy::Full,
        2 => HaloPolicy::Tight,
        _ => {
            if world.rank() == 0 {
                eprintln!("usage: halo_scatter [NO|FULL|TIGHT]");
            }
            std::process::exit(2);
        }
    };

    let dims = [1200i32, 1200];
    let split = [3i32, 3];
    let periodicity = [false, false];
    let halo = 20;

    let cs = CartSplitter::new(&split, &periodicity, &world, true)?;

    if !cs.in_grid() {
        println!(
            "Rank {:2} of {:2} (world) not in grid",
            world.rank(),
            world.size()
        );
        world.barrier()?;
        return Ok(());
    }

    let rank = cs.rank()?;
    let dd = cs.create_descriptor_uniform::<f64>(&dims, halo, halo, policy)?;

    let rows = dims[0] as usize;
    let cols = dims[1] as usize;

    let data = if rank == ROOT {
        let mut data = vec![0.0f64; dd.total_size()];
        for r in 0..rows {
            for c in 0..cols {
                data[r * cols + c] = value(r, c);
            }
        }
        println!("Rank {rank} generates {rows}x{cols} data");
        data
    } else {
        Vec::new()
    };

    let mut local = vec![0.0f64; dd.local_size()];
    cs.scatter(&data, &mut local, ROOT, &dd)?;
    cs.halo_update(&mut local, &dd)?;

    let mut gathered = if rank == COLLECT_ROOT {
        vec![0.0f64; dd.total_size()]
    } else {
        Vec::new()
    };
    cs.gather(&local, &mut gathered, COLLECT_ROOT, &dd)?;

    // ship the collected array back to the generator and compare
    let comm = cs.communicator()?;
    if rank == ROOT {
        let mut back = vec![0.0f64; dd.total_size()];
        comm.recv(&mut back, COLLECT_ROOT, CHECK_TAG)?;

        let mut errors = 0usize;
        for (got, want) in back.iter().zip(&data) {
            if (got - want).abs() > 1e-12 * want.abs() {
                errors += 1;
            }
        }
        println!("Errors: {errors}");
        assert_eq!(errors, 0, "round trip corrupted the array");
        println!("PASS: scatter / halo update / gather round trip ({policy:?})");
    } else if rank == COLLECT_ROOT {
        println!("Rank {rank} collects {rows}x{cols} data");
        let req = comm.isend(&gathered, ROOT, CHECK_TAG)?;
        req.wait()?;
    }

    cs.barrier()?;
    world.barrier()?;
    Ok(())
}
