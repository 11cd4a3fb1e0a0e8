use syn::{Attribute, Ident, Lit, LitInt};

/// Returns the integer argument of `#[<attr_name>(n)]`, if present.
fn get_int_attr(attrs: &[Attribute], attr_name: &str) -> Option<LitInt> {
    for attr in attrs {
        if !attr.path.is_ident(attr_name) {
            continue;
        }
        if let Ok(syn::Meta::List(nvs)) = attr.parse_meta() {
            return nvs.nested.iter().find_map(|nv| match nv {
                syn::NestedMeta::Lit(syn::Lit::Int(value)) => Some(value.clone()),
                _ => None,
            });
        }
    }
    None
}

pub(super) fn get_enum_width(attrs: &[Attribute]) -> Option<LitInt> { get_int_attr(attrs, "width") }

pub(super) fn get_enum_encode_value(attrs: &[Attribute]) -> Option<LitInt> { get_int_attr(attrs, "encode") }

/// Returns the port name of a member. `None` means the member is flattened into its parent.
pub(super) fn get_member_symbol(attrs: &[Attribute], name: &Ident) -> Option<String> {
    let default = Some(name.to_string());

    for attr in attrs {
        if !attr.path.is_ident("member") {
            continue;
        }

        let nvs = match attr.parse_meta() {
            Ok(syn::Meta::List(nvs)) => nvs,
            _ => continue,
        };

        let symbol = nvs.nested.iter().find_map(|nv| match nv {
            syn::NestedMeta::Meta(syn::Meta::NameValue(nv)) if nv.path.is_ident("name") => Some(nv.lit.clone()),
            _ => None,
        });

        return match symbol {
            None => default,
            Some(Lit::Str(s)) if s.value().is_empty() => None,
            Some(Lit::Str(s)) => Some(s.value()),
            Some(lit) => panic!("expected string, found {:?}", lit),
        };
    }

    default
}

/// Returns ceiling log2.
pub(super) const fn clog2(value: usize) -> usize {
    if value == 0 {
        0
    } else {
        (::std::mem::size_of::<usize>() * 8) - (value - 1).leading_zeros() as usize
    }
}
