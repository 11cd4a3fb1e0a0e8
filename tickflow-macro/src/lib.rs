//! Implementation of proc macros on signal values and interface types.
//!
//! # Note
//!
//! `#[derive(Signal)]` on a struct lays its fields out in declaration order, least significant bit first, and
//! describes its ports as a struct of its fields. A field marked `#[member(name = "")]` is flattened into its parent
//! without a name of its own.
//!
//! ```ignore
//! #[derive(Debug, Clone, PartialEq, Default, Signal)]
//! pub struct Valid<V: Signal> {
//!     #[member(name = "")]
//!     inner: V,
//!     valid: bool,
//! }
//!
//! impl<V: Signal> Signal for Valid<V> {
//!     ...
//!     fn port_decls() -> PortDecls {
//!         PortDecls::Struct(vec![
//!             (None, V::port_decls()),
//!             (Some("valid".to_string()), PortDecls::Bits(1)),
//!         ])
//!     }
//! }
//! ```
//!
//! Unit-only enums are encoded by their variant index, or by `#[encode(n)]` on a variant. The width is the ceiling
//! log2 of the variant count unless `#[width(n)]` is given on the enum.

mod interface;
mod signal;
mod utils;

use proc_macro::{self, TokenStream};

#[proc_macro_derive(Signal, attributes(member, width, encode))]
pub fn signal(input: TokenStream) -> TokenStream { signal::derive(input) }

#[proc_macro_derive(Interface, attributes(member))]
pub fn interface(input: TokenStream) -> TokenStream { interface::derive(input) }
