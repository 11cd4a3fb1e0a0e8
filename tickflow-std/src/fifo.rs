//! Bounded FIFO for valid-ready channels.

use std::collections::VecDeque;

use tickflow::{format_ports, Module, SimError, Signal};
use tracing::trace;

use crate::{Ready, Valid, VrChannel};

/// Bounded FIFO. Both `valid` and `ready` are registered: a pushed item is visible from the next tick, and a popped
/// slot is reusable from the next tick.
#[derive(Debug)]
pub struct Fifo<V: Signal> {
    name: String,
    capacity: usize,
    items: VecDeque<V>,
    peak: usize,
}

impl<V: Signal> Fifo<V> {
    /// Creates a new FIFO holding at most `capacity` items.
    pub fn new(name: &str, capacity: usize) -> Self {
        Self { name: name.to_string(), capacity, items: VecDeque::with_capacity(capacity), peak: 0 }
    }

    /// Returns the capacity.
    pub fn capacity(&self) -> usize { self.capacity }

    /// Returns the number of items held.
    pub fn len(&self) -> usize { self.items.len() }

    /// Returns whether the FIFO is empty.
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Returns the largest number of items held so far.
    pub fn peak(&self) -> usize { self.peak }

    /// Returns the item at the head.
    pub fn front(&self) -> Option<&V> { self.items.front() }
}

impl<V: Signal> Module<VrChannel<V>, VrChannel<V>> for Fifo<V> {
    fn name(&self) -> &str { &self.name }

    fn comb(&mut self, _: &Valid<V>, _: &Ready) -> Result<(Valid<V>, Ready), SimError> {
        let o_fwd = self.items.front().map_or(Valid::invalid(), |item| Valid::valid(item.clone()));
        Ok((o_fwd, Ready::new(self.items.len() < self.capacity)))
    }

    fn tick(&mut self, i_fwd: &Valid<V>, o_bwd: &Ready) -> Result<(), SimError> {
        let (o_fwd, i_bwd) = self.comb(i_fwd, o_bwd)?;
        if o_fwd.fire(o_bwd) {
            self.items.pop_front();
        }
        if i_fwd.fire(&i_bwd) {
            trace!(fifo = %self.name, item = %format_ports(&i_fwd.inner), len = self.items.len() + 1, "push");
            self.items.push_back(i_fwd.inner.clone());
        }
        self.peak = self.peak.max(self.items.len());
        Ok(())
    }
}
