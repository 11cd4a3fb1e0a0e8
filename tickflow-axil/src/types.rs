//! Items carried by the switch.

use static_assertions::{assert_impl_all, const_assert_eq};
use tickflow::Signal;

/// Request kind. Reads and writes travel on separate channels and are tracked independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Signal)]
pub enum Kind {
    /// Read.
    #[default]
    Read,
    /// Write.
    Write,
}

/// Response code, encoded as on an AXI bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Signal)]
#[width(2)]
pub enum Resp {
    /// Success.
    #[default]
    #[encode(0)]
    Okay,

    /// Fault reported by the responder, e.g. an unsupported partial write.
    #[encode(2)]
    SlaveError,

    /// No responder is mapped at the address. Synthesized by the switch.
    #[encode(3)]
    DecodeError,
}

/// Correlation tag: identifies the initiator and the kind of a request, so that its response can be routed home.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Signal)]
pub struct Tag {
    /// Index of the originating initiator.
    pub initiator: usize,
    /// Request kind.
    pub kind: Kind,
}

/// Item: a request or a response.
///
/// Requests use `address`, `data` and `byte_mask` (writes only); responses use `data` (reads only) and `resp`. The
/// switch stamps `tag` on requests and copies it, with `kind` and `address`, onto the matching response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Signal)]
pub struct Item {
    /// Address.
    #[member(name = "addr")]
    pub address: u64,
    /// Data.
    pub data: u64,
    /// Bytes of `data` to be written.
    #[member(name = "strb")]
    pub byte_mask: u8,
    /// Kind.
    pub kind: Kind,
    /// Response code.
    pub resp: Resp,
    /// Correlation tag.
    pub tag: Tag,
}

const_assert_eq!(<Resp as Signal>::WIDTH, 2);
const_assert_eq!(<Item as Signal>::WIDTH, 64 + 64 + 8 + 1 + 2 + 64 + 1);
assert_impl_all!(Item: Signal, Send, Sync);

impl Item {
    /// Byte mask selecting every byte of `data`.
    pub const FULL_MASK: u8 = 0xff;

    /// Creates a read request.
    pub fn read(address: u64) -> Self { Self { address, kind: Kind::Read, ..Self::default() } }

    /// Creates the address phase of a write request.
    pub fn write_address(address: u64) -> Self { Self { address, kind: Kind::Write, ..Self::default() } }

    /// Creates the data phase of a write request.
    pub fn write_data(data: u64, byte_mask: u8) -> Self {
        Self { data, byte_mask, kind: Kind::Write, ..Self::default() }
    }

    /// Creates a write request with both phases.
    pub fn write(address: u64, data: u64, byte_mask: u8) -> Self {
        Self { address, data, byte_mask, kind: Kind::Write, ..Self::default() }
    }

    /// Creates a response.
    pub fn response(kind: Kind, resp: Resp, data: u64) -> Self { Self { kind, resp, data, ..Self::default() } }

    /// Returns whether every byte of `data` is written.
    pub fn is_full_width(&self) -> bool { self.byte_mask == Self::FULL_MASK }
}

#[cfg(test)]
mod tests {
    use tickflow::format_ports;

    use super::*;

    #[test]
    fn resp_uses_bus_encoding() {
        assert_eq!(Resp::Okay.transl(), vec![false, false]);
        assert_eq!(Resp::SlaveError.transl(), vec![false, true]);
        assert_eq!(Resp::DecodeError.transl(), vec![true, true]);
    }

    #[test]
    fn item_ports_are_named() {
        let item = Item { tag: Tag { initiator: 1, kind: Kind::Write }, ..Item::write(0x50, 0xab, 0x01) };
        let rendered = format_ports(&item);
        assert!(rendered.starts_with("addr=0x0000000000000050 data=0x00000000000000ab strb=0x01 kind=0x1"));
        assert!(rendered.ends_with("tag_initiator=0x0000000000000001 tag_kind=0x1"));
    }
}
