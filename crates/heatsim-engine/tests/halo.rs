//! Integration test: halo exchange on multi-worker periodic grids.
//!
//! Every worker fills its tile with values that encode its rank and the
//! cell position, exchanges once, and checks each ghost strip against the
//! matching boundary strip of the neighbour that owns it.

use heatsim_core::{Dims, Field, Rank};
use heatsim_engine::halo;
use heatsim_space::Direction;
use heatsim_test_utils::on_each_rank;

const W: usize = 4;
const H: usize = 3;

fn value(rank: Rank, x: usize, y: usize) -> f64 {
    (rank.0 * 1000 + y * W + x) as f64
}

fn tile_for(rank: Rank) -> Field {
    let mut f = Field::with_padding(W, H, 1).unwrap();
    for y in 0..H {
        for x in 0..W {
            f.set(x, y, value(rank, x, y));
        }
    }
    f
}

fn check_grid(dims: Dims) {
    let results = on_each_rank(dims, |mut comm, topo| {
        let mut tile = tile_for(topo.rank());
        halo::exchange(&mut comm, &topo, &mut tile).unwrap();
        (topo, tile)
    });

    for (topo, tile) in results {
        let north = topo.neighbour(Direction::North);
        let south = topo.neighbour(Direction::South);
        let west = topo.neighbour(Direction::West);
        let east = topo.neighbour(Direction::East);

        let want: Vec<f64> = (0..W).map(|x| value(north, x, H - 1)).collect();
        assert_eq!(tile.row(-1).unwrap().to_vec(), want, "north ghost of {}", topo.rank());
        let want: Vec<f64> = (0..W).map(|x| value(south, x, 0)).collect();
        assert_eq!(tile.row(H as isize).unwrap().to_vec(), want, "south ghost of {}", topo.rank());
        let want: Vec<f64> = (0..H).map(|y| value(west, W - 1, y)).collect();
        assert_eq!(tile.column(-1).unwrap().to_vec(), want, "west ghost of {}", topo.rank());
        let want: Vec<f64> = (0..H).map(|y| value(east, 0, y)).collect();
        assert_eq!(tile.column(W as isize).unwrap().to_vec(), want, "east ghost of {}", topo.rank());

        // Interior untouched, corners never written.
        assert_eq!(tile.get(1, 1), value(topo.rank(), 1, 1));
        assert_eq!(tile.sample(-1, -1), 0.0);
        assert_eq!(tile.sample(W as isize, H as isize), 0.0);
    }
}

#[test]
fn two_by_two_grid() {
    check_grid(Dims::new(2, 2));
}

#[test]
fn three_by_three_grid() {
    check_grid(Dims::new(3, 3));
}

#[test]
fn single_row_and_single_column_grids() {
    // One axis of extent 1 makes a worker its own east/west (or
    // north/south) neighbour while the other axis still crosses workers.
    check_grid(Dims::new(3, 1));
    check_grid(Dims::new(1, 3));
}

#[test]
fn repeated_exchanges_stay_matched() {
    let results = on_each_rank(Dims::new(2, 3), |mut comm, topo| {
        let mut tile = tile_for(topo.rank());
        for _ in 0..5 {
            halo::exchange(&mut comm, &topo, &mut tile).unwrap();
        }
        (topo, tile)
    });
    for (topo, tile) in results {
        let north = topo.neighbour(Direction::North);
        assert_eq!(tile.sample(2, -1), value(north, 2, H - 1));
    }
}
