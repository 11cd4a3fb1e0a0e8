//! Standard library of valid-ready components.

// # Tries to deny all lints (`rustc -W help`).
#![deny(absolute_paths_not_starting_with_crate)]
#![deny(anonymous_parameters)]
#![deny(deprecated_in_future)]
#![deny(explicit_outlives_requirements)]
#![deny(keyword_idents)]
#![deny(macro_use_extern_crate)]
#![deny(missing_debug_implementations)]
#![deny(non_ascii_idents)]
#![deny(rust_2018_idioms)]
#![deny(trivial_numeric_casts)]
#![deny(unsafe_op_in_unsafe_fn)]
#![deny(unused_extern_crates)]
#![deny(unused_import_braces)]
#![deny(unused_qualifications)]
//
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]
#![deny(rustdoc::missing_crate_level_docs)]
#![deny(rustdoc::private_doc_tests)]
#![deny(rustdoc::invalid_codeblock_attributes)]
#![deny(rustdoc::invalid_html_tags)]
#![deny(rustdoc::invalid_rust_codeblocks)]
#![deny(rustdoc::bare_urls)]
#![deny(unreachable_pub)]
//
#![allow(clippy::needless_lifetimes)]
#![allow(clippy::type_complexity)]
#![allow(elided_lifetimes_in_paths)]
#![allow(type_alias_bounds)]

mod arb_mux;
mod arbiter;
mod broadcast;
mod combine;
mod demux;
mod fifo;
mod register_slice;
mod unidir;
mod valid_ready;

pub use arb_mux::ArbMux;
pub use arbiter::{ArbPolicy, Arbiter};
pub use broadcast::{broadcaster, Broadcaster};
pub use combine::{combiner, first, Combiner};
pub use demux::{demux, Demux};
pub use fifo::Fifo;
pub use register_slice::{Buffering, RegisterSlice};
pub use unidir::UniChannel;
pub use valid_ready::{map, vr_array_link, vr_link, Map, Ready, Valid, VrChannel};

#[cfg(test)]
pub(crate) mod testing;
