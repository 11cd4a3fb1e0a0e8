//! Utilities for valid-ready channels.
//!
//! A transfer happens exactly on the ticks where both `valid` and `ready` are high. A producer that raised `valid`
//! keeps its item unchanged until the transfer happens.

use std::marker::PhantomData;

use tickflow::{DynFsm, Interface, Link, Signal};

/// Valid-ready channel.
#[derive(Debug)]
pub struct VrChannel<V: Signal> {
    _marker: PhantomData<V>,
}

impl<V: Signal> Interface for VrChannel<V> {
    type Bwd = Ready;
    type Fwd = Valid<V>;
}

/// Valid/ready channel's forward values.
#[derive(Debug, Clone, PartialEq, Default, Signal)]
pub struct Valid<V: Signal> {
    /// Inner data. Meaningless while `valid` is low.
    #[member(name = "")]
    pub inner: V,

    /// Valid bit
    pub valid: bool,
}

impl<V: Signal> Valid<V> {
    /// Creates a new value.
    pub fn new(valid: bool, inner: V) -> Self { Self { inner, valid } }

    /// Creates an invalid value.
    pub fn invalid() -> Self { Self::new(false, V::default()) }

    /// Creates a valid value.
    pub fn valid(inner: V) -> Self { Self::new(true, inner) }

    /// Returns the inner value if valid.
    pub fn as_option(&self) -> Option<&V> { self.valid.then_some(&self.inner) }

    /// Maps the inner value. An invalid value stays invalid and `f` is not called.
    pub fn map_inner<W: Signal>(&self, f: impl FnOnce(&V) -> W) -> Valid<W> {
        if self.valid {
            Valid::valid(f(&self.inner))
        } else {
            Valid::invalid()
        }
    }

    /// Returns whether the value transfers under the given ready signal.
    pub fn fire(&self, ready: &Ready) -> bool { self.valid && ready.ready }
}

/// Ready signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Signal)]
pub struct Ready {
    /// Ready bit
    pub ready: bool,
}

impl Ready {
    /// Creates a new ready signal.
    pub fn new(ready: bool) -> Self { Self { ready } }
}

/// Creates an idle valid-ready link.
pub fn vr_link<V: Signal>(name: &str) -> Link<VrChannel<V>> { Link::new(name, Valid::invalid(), Ready::default()) }

/// Creates an idle array of `n` valid-ready links.
pub fn vr_array_link<V: Signal>(name: &str, n: usize) -> Link<Vec<VrChannel<V>>> {
    Link::new(name, vec![Valid::invalid(); n], vec![Ready::default(); n])
}

/// Map stage: applies `f` to every item. Purely combinational.
pub type Map<V, W> = DynFsm<VrChannel<V>, VrChannel<W>, ()>;

/// Creates a map stage.
pub fn map<V: Signal, W: Signal>(name: &str, f: impl 'static + Fn(&V) -> W) -> Map<V, W> {
    DynFsm::boxed(name, (), move |i_fwd: &Valid<V>, o_bwd: &Ready, _: &()| (i_fwd.map_inner(&f), *o_bwd, ()))
}

#[cfg(test)]
mod tests {
    use tickflow::{format_ports, Module};

    use super::*;

    #[test]
    fn valid_layout_puts_payload_first() {
        assert_eq!(<Valid<u8>>::WIDTH, 9);
        assert_eq!(format_ports(&Valid::valid(0x42u8)), "value=0x42 valid=0x1");
        assert_eq!(Valid::<u8>::invalid().as_option(), None);
    }

    #[test]
    fn map_skips_invalid_items() {
        let mut m = map("double", |v: &u8| u16::from(*v) * 2);
        let (o_fwd, i_bwd) = m.comb(&Valid::valid(200), &Ready::new(false)).unwrap();
        assert_eq!(o_fwd, Valid::valid(400));
        assert!(!i_bwd.ready);
        let (o_fwd, _) = m.comb(&Valid::invalid(), &Ready::new(true)).unwrap();
        assert!(!o_fwd.valid);
    }
}
