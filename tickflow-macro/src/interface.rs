use proc_macro::{self, TokenStream};
use quote::quote;
use syn::{parse_macro_input, DeriveInput};

pub fn derive(input: TokenStream) -> TokenStream {
    let ast = parse_macro_input!(input as DeriveInput);
    let vis = &ast.vis;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let name = &ast.ident;
    let fname = format!("{}Fwd", name);
    let fident = syn::Ident::new(&fname, name.span());
    let bname = format!("{}Bwd", name);
    let bident = syn::Ident::new(&bname, name.span());
    let fields = if let syn::Data::Struct(syn::DataStruct {
        fields: syn::Fields::Named(syn::FieldsNamed { ref named, .. }),
        ..
    }) = ast.data
    {
        named
    } else {
        todo!("Interface macro is only implemented for structs with named fields")
    };

    // fields for forward value.
    let fwd_fields = fields.iter().map(|f| {
        let name = &f.ident;
        let ty = &f.ty;
        quote! { #vis #name: <#ty as ::tickflow::Interface>::Fwd }
    });

    // fields for backward value.
    let bwd_fields = fields.iter().map(|f| {
        let name = &f.ident;
        let ty = &f.ty;
        quote! { #vis #name: <#ty as ::tickflow::Interface>::Bwd }
    });

    let expanded = quote! {
        #[allow(missing_docs)]
        #[derive(Debug, Clone, PartialEq)]
        #vis struct #fident #impl_generics #where_clause {
            #(#fwd_fields,)*
        }
        #[allow(missing_docs)]
        #[derive(Debug, Clone, PartialEq)]
        #vis struct #bident #impl_generics #where_clause {
            #(#bwd_fields,)*
        }
        impl #impl_generics ::tickflow::Interface for #name #ty_generics #where_clause {
            type Fwd = #fident #ty_generics;
            type Bwd = #bident #ty_generics;
        }
    };
    expanded.into()
}
