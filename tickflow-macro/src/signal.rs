use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

use super::utils::{clog2, get_enum_encode_value, get_enum_width, get_member_symbol};

pub fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let name = &ast.ident;
    match ast.data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { ref named, .. }), ..
        }) => {
            let fields = named;

            let ty_widths = fields.iter().map(|f| {
                let ty = &f.ty;
                quote! { <#ty as ::tickflow::Signal>::WIDTH }
            });

            // fields for `transl`.
            let transl_fields = fields.iter().map(|f| {
                let name = &f.ident;
                quote! { bits.extend(::tickflow::Signal::transl(&self.#name)); }
            });

            // fields for `port_decls`.
            let port_decls_fields = fields.iter().map(|f| {
                let name = f.ident.as_ref().unwrap();
                let ty = &f.ty;

                match get_member_symbol(&f.attrs, name) {
                    None => quote! { (None, <#ty as ::tickflow::Signal>::port_decls()) },
                    Some(symbol) => {
                        quote! { (Some(#symbol.to_string()), <#ty as ::tickflow::Signal>::port_decls()) }
                    }
                }
            });

            let expanded = quote! {
                impl #impl_generics ::tickflow::Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = 0 #(+ #ty_widths)*;
                    fn transl(&self) -> ::std::vec::Vec<bool> {
                        let mut bits = ::std::vec::Vec::with_capacity(<Self as ::tickflow::Signal>::WIDTH);
                        #(#transl_fields)*
                        bits
                    }
                    fn port_decls() -> ::tickflow::PortDecls {
                        ::tickflow::PortDecls::Struct(::std::vec![
                            #(#port_decls_fields,)*
                        ])
                    }
                }
            };

            expanded.into()
        }
        syn::Data::Enum(syn::DataEnum { ref variants, .. }) => {
            let variant_count = variants.iter().count();
            assert!(variant_count > 0, "{name}: Empty enums cannot be derived as tickflow `Signal`");
            let width = if let Some(width) = get_enum_width(&ast.attrs) {
                width.base10_parse::<usize>().unwrap_or_else(|_| panic!("{name}: Enum width should be usize"))
            } else if variant_count == 1 {
                1
            } else {
                clog2(variant_count)
            };
            assert!(width <= 128, "{name}: Enum width should not exceed 128 bits");

            let transl_variants = variants.iter().enumerate().map(|(i, f)| {
                let variant_name = &f.ident;
                assert!(
                    matches!(f.fields, syn::Fields::Unit),
                    "{name}::{variant_name}: Only Unit Variant is allowed to be derived as tickflow Signal"
                );

                let encode_value = if let Some(encode_value_lit) = get_enum_encode_value(&f.attrs) {
                    let encode_value = encode_value_lit
                        .base10_parse::<u128>()
                        .unwrap_or_else(|_| panic!("encoding value of {name}::{variant_name} should be an integer"));
                    assert!(
                        width == 128 || encode_value < (1 << width),
                        "{encode_value}(encoding of {name}::{variant_name}) exceeds maximum for {width} bits",
                    );
                    encode_value
                } else {
                    i as u128
                };
                let encode_value = proc_macro2::Literal::u128_unsuffixed(encode_value);

                quote! { Self::#variant_name => #encode_value, }
            });

            let expanded = quote! {
                impl #impl_generics ::tickflow::Signal for #name #ty_generics #where_clause {
                    const WIDTH: usize = #width;
                    fn transl(&self) -> ::std::vec::Vec<bool> {
                        let code: u128 = match self {
                            #(#transl_variants)*
                        };
                        (0..<Self as ::tickflow::Signal>::WIDTH).map(|idx| (code >> idx) & 1 == 1).collect()
                    }
                    fn port_decls() -> ::tickflow::PortDecls {
                        ::tickflow::PortDecls::Bits(<Self as ::tickflow::Signal>::WIDTH)
                    }
                }
            };

            expanded.into()
        }
        _ => todo!("Signal macro is not implemented for union type"),
    }
}
