//! Address decoding.

use serde::{Deserialize, Serialize};

/// Address range served by one responder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Route {
    /// Matches every address with `address & mask == base`.
    Masked {
        /// Base address.
        base: u64,
        /// Mask of the address bits compared with `base`.
        mask: u64,
    },

    /// Matches every address in `start..=end`.
    Range {
        /// First address.
        start: u64,
        /// Last address.
        end: u64,
    },
}

impl Route {
    /// Creates a base/mask route.
    pub fn masked(base: u64, mask: u64) -> Self { Self::Masked { base, mask } }

    /// Creates an inclusive range route.
    pub fn range(start: u64, end: u64) -> Self { Self::Range { start, end } }

    /// Returns whether the route matches the address.
    pub fn matches(&self, address: u64) -> bool {
        match *self {
            Self::Masked { base, mask } => address & mask == base,
            Self::Range { start, end } => (start..=end).contains(&address),
        }
    }
}

/// Decoded target of an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    /// Responder with the given index.
    Responder(usize),
    /// No responder is mapped at the address.
    Unmapped,
}

/// Address decoder over a route table with one route per responder.
///
/// Routes are scanned in ascending responder index and the first match wins, so overlapping routes resolve to the
/// lower index. Overlaps are not reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDecoder {
    routes: Vec<Route>,
}

impl AddressDecoder {
    /// Creates a new decoder. `routes[j]` is the route of responder `j`.
    pub fn new(routes: Vec<Route>) -> Self { Self { routes } }

    /// Returns the route table.
    pub fn routes(&self) -> &[Route] { &self.routes }

    /// Decodes an address.
    pub fn decode(&self, address: u64) -> Target {
        self.routes.iter().position(|route| route.matches(address)).map_or(Target::Unmapped, Target::Responder)
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn two_pages() -> AddressDecoder {
        AddressDecoder::new(vec![Route::range(0x0000, 0x00ff), Route::range(0x0100, 0x01ff)])
    }

    #[test]
    fn decodes_disjoint_ranges() {
        let decoder = two_pages();
        assert_eq!(decoder.decode(0x0050), Target::Responder(0));
        assert_eq!(decoder.decode(0x0150), Target::Responder(1));
        assert_eq!(decoder.decode(0x01ff), Target::Responder(1));
        assert_eq!(decoder.decode(0x0200), Target::Unmapped);
    }

    #[test]
    fn masked_route_compares_masked_bits() {
        let route = Route::masked(0x4000_0000, 0xf000_0000);
        assert!(route.matches(0x4000_1234));
        assert!(!route.matches(0x5000_0000));
    }

    proptest! {
        #[test]
        fn overlap_resolves_to_lower_index(
            start in 0u64..0x1000, len in 1u64..0x100, shift in 0u64..0x100, address in 0u64..0x1200,
        ) {
            let decoder = AddressDecoder::new(vec![
                Route::range(start, start + len),
                Route::range(start + shift, start + shift + len),
            ]);
            let expected = if Route::range(start, start + len).matches(address) {
                Target::Responder(0)
            } else if Route::range(start + shift, start + shift + len).matches(address) {
                Target::Responder(1)
            } else {
                Target::Unmapped
            };
            prop_assert_eq!(decoder.decode(address), expected);
            prop_assert_eq!(decoder.decode(address), decoder.decode(address));
        }

        #[test]
        fn outside_disjoint_ranges_is_unmapped(address in 0x0200u64..) {
            prop_assert_eq!(two_pages().decode(address), Target::Unmapped);
        }
    }
}
