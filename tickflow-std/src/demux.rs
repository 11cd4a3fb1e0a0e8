//! Demux.

use tickflow::{DynFsm, Signal};

use crate::{Ready, Valid, VrChannel};

/// Demux: routes each item to the output selected by the index carried with it.
///
/// Only the selected output sees the item, and only its `ready` is returned upstream. An item selecting a
/// nonexistent output is never accepted.
pub type Demux<V> = DynFsm<VrChannel<(V, usize)>, Vec<VrChannel<V>>, ()>;

/// Creates a demux with `n` outputs.
pub fn demux<V: Signal>(name: &str, n: usize) -> Demux<V> {
    DynFsm::boxed(name, (), move |i_fwd: &Valid<(V, usize)>, o_bwd: &Vec<Ready>, _: &()| {
        let (inner, select) = &i_fwd.inner;
        let o_fwd = (0..n)
            .map(|k| if k == *select { Valid::new(i_fwd.valid, inner.clone()) } else { Valid::invalid() })
            .collect();
        let i_bwd = Ready::new(o_bwd.get(*select).map_or(false, |bwd| bwd.ready));
        (o_fwd, i_bwd, ())
    })
}
