//! Links between modules.

use std::fmt;

use crate::Interface;

/// Stored wire values of an interface between two modules inside a composite.
pub struct Link<C: Interface> {
    name: String,
    /// Forward value, driven by the producer.
    pub fwd: C::Fwd,
    /// Backward value, driven by the consumer.
    pub bwd: C::Bwd,
}

impl<C: Interface> Link<C> {
    /// Creates a new link with the given initial values.
    pub fn new(name: &str, fwd: C::Fwd, bwd: C::Bwd) -> Self { Self { name: name.to_string(), fwd, bwd } }

    /// Returns the name of the link.
    pub fn name(&self) -> &str { &self.name }
}

impl<C: Interface> fmt::Debug for Link<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Link").field("name", &self.name).field("fwd", &self.fwd).field("bwd", &self.bwd).finish()
    }
}
