//! Unidirectional channels.

use std::marker::PhantomData;

use tickflow::{Interface, Signal};

/// Unidirectional channel: a value without flow control.
#[derive(Debug)]
pub struct UniChannel<V: Signal> {
    _marker: PhantomData<V>,
}

impl<V: Signal> Interface for UniChannel<V> {
    type Bwd = ();
    type Fwd = V;
}
