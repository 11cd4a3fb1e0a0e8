//! Signal values.

use std::fmt::Debug;

use itertools::Itertools;

/// Port declarations of a signal: its bit layout, with member names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortDecls {
    /// Bits of the given width.
    Bits(usize),

    /// Members in bit order, least significant first. A member without a name is flattened into its parent.
    Struct(Vec<(Option<String>, PortDecls)>),
}

impl PortDecls {
    /// Returns the total width.
    pub fn width(&self) -> usize {
        match self {
            Self::Bits(width) => *width,
            Self::Struct(inner) => inner.iter().map(|(_, decls)| decls.width()).sum(),
        }
    }

    /// Flattens the declarations into `(name, width)` pairs in bit order. Member names are joined with `_`; empty
    /// members are omitted.
    pub fn flatten(&self) -> Vec<(String, usize)> {
        match self {
            Self::Bits(0) => vec![],
            Self::Bits(width) => vec![(String::new(), *width)],
            Self::Struct(inner) => inner
                .iter()
                .flat_map(|(prefix, decls)| {
                    decls.flatten().into_iter().map(move |(suffix, width)| (join(prefix.as_deref(), &suffix), width))
                })
                .collect(),
        }
    }
}

fn join(prefix: Option<&str>, suffix: &str) -> String {
    match prefix {
        None => suffix.to_string(),
        Some(prefix) if suffix.is_empty() => prefix.to_string(),
        Some(prefix) => format!("{prefix}_{suffix}"),
    }
}

/// Signal: a value carried on wires.
///
/// `Default` is the "don't care" value, carried while the signal is not meaningful (e.g. the payload of an invalid
/// valid-ready channel). Nothing may depend on it.
pub trait Signal: 'static + Debug + Clone + PartialEq + Default {
    /// Width of the signal in bits.
    const WIDTH: usize;

    /// Returns the bit image of the value, least significant bit first.
    fn transl(&self) -> Vec<bool>;

    /// Returns the port declarations.
    fn port_decls() -> PortDecls;
}

impl Signal for () {
    const WIDTH: usize = 0;

    fn transl(&self) -> Vec<bool> { Vec::new() }

    fn port_decls() -> PortDecls { PortDecls::Bits(0) }
}

impl Signal for bool {
    const WIDTH: usize = 1;

    fn transl(&self) -> Vec<bool> { vec![*self] }

    fn port_decls() -> PortDecls { PortDecls::Bits(1) }
}

macro_rules! impl_signal_uint {
    ($($t:ty),*) => {
        $(
            impl Signal for $t {
                const WIDTH: usize = <$t>::BITS as usize;

                fn transl(&self) -> Vec<bool> { (0..Self::WIDTH).map(|i| (*self >> i) & 1 == 1).collect() }

                fn port_decls() -> PortDecls { PortDecls::Bits(Self::WIDTH) }
            }
        )*
    };
}

impl_signal_uint!(u8, u16, u32, u64, u128, usize);

macro_rules! impl_signal_tuple {
    ($($a:ident: $idx:tt),+) => {
        impl<$($a: Signal),+> Signal for ($($a,)+) {
            const WIDTH: usize = 0 $(+ $a::WIDTH)+;

            fn transl(&self) -> Vec<bool> {
                let mut bits = Vec::with_capacity(Self::WIDTH);
                $(bits.extend(self.$idx.transl());)+
                bits
            }

            fn port_decls() -> PortDecls {
                PortDecls::Struct(vec![$((Some(stringify!($idx).to_string()), $a::port_decls())),+])
            }
        }
    };
}

impl_signal_tuple!(A: 0);
impl_signal_tuple!(A: 0, B: 1);
impl_signal_tuple!(A: 0, B: 1, C: 2);
impl_signal_tuple!(A: 0, B: 1, C: 2, D: 3);

/// Renders a signal port by port, e.g. `address=0x0050 valid=0x1`.
pub fn format_ports<V: Signal>(value: &V) -> String {
    let bits = value.transl();
    let mut offset = 0;
    V::port_decls()
        .flatten()
        .into_iter()
        .map(|(name, width)| {
            let field = &bits[offset..offset + width];
            offset += width;
            let name = if name.is_empty() { "value".to_string() } else { name };
            format!("{name}={}", format_bits(field))
        })
        .join(" ")
}

fn format_bits(bits: &[bool]) -> String {
    let digits = bits
        .chunks(4)
        .rev()
        .map(|nibble| {
            let value = nibble.iter().rev().fold(0, |acc, bit| (acc << 1) | u32::from(*bit));
            char::from_digit(value, 16).unwrap_or('?')
        })
        .collect::<String>();
    format!("0x{digits}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uint_is_lsb_first() {
        assert_eq!(5u8.transl(), vec![true, false, true, false, false, false, false, false]);
        assert_eq!(u16::WIDTH, 16);
    }

    #[test]
    fn tuple_concatenates_members() {
        let value = (true, 3u8);
        assert_eq!(<(bool, u8)>::WIDTH, 9);
        assert_eq!(value.transl()[..3], [true, true, true]);
        assert_eq!(<(bool, u8)>::port_decls().flatten(), vec![("0".to_string(), 1), ("1".to_string(), 8)]);
    }

    #[test]
    fn format_ports_renders_hex() {
        assert_eq!(format_ports(&(true, 0x5au8)), "0=0x1 1=0x5a");
        assert_eq!(format_ports(&()), "");
    }

    #[test]
    fn flatten_skips_unnamed_and_empty_members() {
        let decls = PortDecls::Struct(vec![
            (None, PortDecls::Bits(8)),
            (Some("unit".to_string()), PortDecls::Bits(0)),
            (Some("tag".to_string()), PortDecls::Struct(vec![(Some("kind".to_string()), PortDecls::Bits(1))])),
        ]);
        assert_eq!(decls.width(), 9);
        assert_eq!(decls.flatten(), vec![(String::new(), 8), ("tag_kind".to_string(), 1)]);
    }
}
