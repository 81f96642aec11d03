//! Neighbor-table driver: builds a Cartesian grid and prints every peer's
//! coordinates and resolved first-neighbor ranks, in rank order.
//!
//! Usage:
//!   cart_neighbours                 2D preset
//!   cart_neighbours <1|2|3>         1D / 2D / 3D preset
//!   cart_neighbours SPLIT PER REORDER
//!                                   e.g. `cart_neighbours 3x3 0x1 1`
//!
//! Run with: mpiexec -n 9 ./target/debug/examples/cart_neighbours

use cartompi::{CartSplitter, Mpi, NULL_RANK};

fn parse_tuple(s: &str) -> Vec<i32> {
    s.split('x')
        .map(|tok| tok.parse().unwrap_or_else(|_| usage()))
        .collect()
}

fn preset(which: i32) -> (Vec<i32>, Vec<bool>, bool) {
    match which {
        1 => (vec![4], vec![true], true),
        2 => (vec![3, 3], vec![false, true], true),
        3 => (vec![3, 3, 3], vec![false, true, false], true),
        _ => usage(),
    }
}

fn usage() -> ! {
    eprintln!("usage: cart_neighbours [1|2|3 | SPLIT PERIODIC REORDER]");
    eprintln!("  e.g.: cart_neighbours 3x3 0x1 1");
    std::process::exit(2);
}

fn show(rank: i32) -> String {
    if rank == NULL_RANK {
        "-".to_string()
    } else {
        rank.to_string()
    }
}

fn main() -> cartompi::Result<()> {
    tracing_subscriber::fmt::init();

    let mpi = Mpi::init()?;
    let world = mpi.world();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (dims, periodicity, reorder) = match args.len() {
        0 => preset(2),
        1 => preset(args[0].parse().unwrap_or_else(|_| usage())),
        3 => {
            let dims = parse_tuple(&args[0]);
            let periodicity = parse_tuple(&args[1]).iter().map(|&p| p != 0).collect();
            let reorder = args[2].parse::<i32>().unwrap_or_else(|_| usage()) != 0;
            (dims, periodicity, reorder)
        }
        _ => usage(),
    };

    let cs = CartSplitter::new(&dims, &periodicity, &world, reorder)?;

    if cs.in_grid() {
        let rank = cs.rank()?;
        let size = cs.size()?;
        let coords = cs.coords()?.to_vec();

        // rank-ordered output, one peer at a time
        for node in 0..size {
            if node == rank {
                println!("Rank {rank:2} of {size:2} at {coords:?}");
                for (ii, off) in cs.directions().iter().enumerate() {
                    println!(
                        "  dir {off:?}  src {:>2}  dest {:>2}",
                        show(cs.src_neighbours()[ii]),
                        show(cs.dest_neighbours()[ii]),
                    );
                }
            }
            cs.barrier()?;
        }
    } else {
        println!(
            "Rank {:2} of {:2} (world) not in grid",
            world.rank(),
            world.size()
        );
    }

    world.barrier()?;
    Ok(())
}
