use std::thread;

use heatsim_comm::{ChannelComm, Communicator};
use heatsim_core::Dims;
use heatsim_space::CartTopology;

/// Run `f` once per rank of a `dims` process grid, each on its own thread
/// with a connected endpoint and its topology. Results come back in rank
/// order.
pub fn on_each_rank<T, F>(dims: Dims, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(ChannelComm, CartTopology) -> T + Sync,
{
    let size = dims.count();
    let f = &f;
    thread::scope(|scope| {
        let handles: Vec<_> = ChannelComm::universe(size)
            .into_iter()
            .map(|comm| {
                scope.spawn(move || {
                    let topo = CartTopology::new(dims, size, comm.rank())
                        .expect("topology for test grid");
                    f(comm, topo)
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().expect("rank thread panicked"))
            .collect()
    })
}
