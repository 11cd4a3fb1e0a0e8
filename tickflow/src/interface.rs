//! Interfaces.

use std::fmt::Debug;

/// Value carried on one half of an interface.
pub trait Value: 'static + Debug + Clone + PartialEq {}

impl<T: 'static + Debug + Clone + PartialEq> Value for T {}

/// Interface: a bundle of wires with a forward half (driven by the producer) and a backward half (driven by the
/// consumer). Interface types are markers; they are never instantiated.
pub trait Interface: 'static + Debug {
    /// Forward value.
    type Fwd: Value;

    /// Backward value.
    type Bwd: Value;
}

impl Interface for () {
    type Bwd = ();
    type Fwd = ();
}

/// Runtime-sized array of interfaces.
impl<I: Interface> Interface for Vec<I> {
    type Bwd = Vec<I::Bwd>;
    type Fwd = Vec<I::Fwd>;
}

macro_rules! impl_interface_tuple {
    ($($a:ident),+) => {
        impl<$($a: Interface),+> Interface for ($($a,)+) {
            type Bwd = ($($a::Bwd,)+);
            type Fwd = ($($a::Fwd,)+);
        }
    };
}

impl_interface_tuple!(A);
impl_interface_tuple!(A, B);
impl_interface_tuple!(A, B, C);
impl_interface_tuple!(A, B, C, D);
