//! Register slice: a pipeline stage for valid-ready channels.

use serde::{Deserialize, Serialize};
use tickflow::{DynFsm, Module, SimError, Signal};

use crate::{Ready, Valid, VrChannel};

/// Buffering of a register slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Buffering {
    /// Combinational pass-through. Adds no latency and holds no item.
    #[default]
    None,

    /// Forward register: the item is registered before it is exposed downstream. `ready` passes through.
    Forward,

    /// Backward register: `ready` is registered. While the slot is empty the item passes through; an item that is
    /// not accepted downstream is caught in the slot.
    Backward,

    /// Forward and backward registers sharing one slot. Fully decouples both directions, accepting at most one item
    /// every other tick.
    Both,
}

impl Buffering {
    /// Returns the number of ticks an item spends in the slice when the consumer is ready.
    pub fn latency(self) -> usize {
        match self {
            Self::None | Self::Backward => 0,
            Self::Forward | Self::Both => 1,
        }
    }
}

/// Register slice's logic. The state is the slot.
fn logic<V: Signal>(
    buffering: Buffering, i_fwd: &Valid<V>, o_bwd: &Ready, slot: &Valid<V>,
) -> (Valid<V>, Ready, Valid<V>) {
    match buffering {
        Buffering::None => (i_fwd.clone(), *o_bwd, Valid::invalid()),
        Buffering::Forward => {
            let i_bwd = Ready::new(!slot.valid || o_bwd.ready);
            let slot_next = if i_fwd.fire(&i_bwd) {
                i_fwd.clone()
            } else if slot.fire(o_bwd) {
                Valid::invalid()
            } else {
                slot.clone()
            };
            (slot.clone(), i_bwd, slot_next)
        }
        Buffering::Backward => {
            let i_bwd = Ready::new(!slot.valid);
            let o_fwd = if slot.valid { slot.clone() } else { i_fwd.clone() };
            let slot_next = if slot.valid {
                if o_bwd.ready {
                    Valid::invalid()
                } else {
                    slot.clone()
                }
            } else if i_fwd.valid && !o_bwd.ready {
                i_fwd.clone()
            } else {
                Valid::invalid()
            };
            (o_fwd, i_bwd, slot_next)
        }
        Buffering::Both => {
            let i_bwd = Ready::new(!slot.valid);
            let slot_next = if slot.valid {
                if o_bwd.ready {
                    Valid::invalid()
                } else {
                    slot.clone()
                }
            } else {
                i_fwd.clone()
            };
            (slot.clone(), i_bwd, slot_next)
        }
    }
}

/// Register slice. Holds at most one item.
#[derive(Debug)]
pub struct RegisterSlice<V: Signal> {
    buffering: Buffering,
    inner: DynFsm<VrChannel<V>, VrChannel<V>, Valid<V>>,
}

impl<V: Signal> RegisterSlice<V> {
    /// Creates a new register slice.
    pub fn new(name: &str, buffering: Buffering) -> Self {
        let inner = DynFsm::boxed(name, Valid::invalid(), move |i_fwd: &Valid<V>, o_bwd: &Ready, s: &Valid<V>| {
            logic(buffering, i_fwd, o_bwd, s)
        });
        Self { buffering, inner }
    }

    /// Returns the buffering.
    pub fn buffering(&self) -> Buffering { self.buffering }

    /// Returns the added latency.
    pub fn latency(&self) -> usize { self.buffering.latency() }

    /// Returns the number of items held, 0 or 1.
    pub fn occupancy(&self) -> usize { usize::from(self.inner.state().valid) }
}

impl<V: Signal> Module<VrChannel<V>, VrChannel<V>> for RegisterSlice<V> {
    fn name(&self) -> &str { self.inner.name() }

    fn comb(&mut self, i_fwd: &Valid<V>, o_bwd: &Ready) -> Result<(Valid<V>, Ready), SimError> {
        self.inner.comb(i_fwd, o_bwd)
    }

    fn tick(&mut self, i_fwd: &Valid<V>, o_bwd: &Ready) -> Result<(), SimError> { self.inner.tick(i_fwd, o_bwd) }
}
