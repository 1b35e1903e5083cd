use std::collections::BTreeSet;

use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Field, Fields, LitStr, parse_macro_input};

#[proc_macro_derive(FormModel, attributes(form))]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let root = localhunt_path();
    let mut seen = BTreeSet::new();
    let mut keys = Vec::new();
    let mut fields_methods = Vec::new();
    let mut decoders = Vec::new();
    let mut encoders = Vec::new();

    for field in named_fields {
        let key = match field_key(&field) {
            Ok(key) => key,
            Err(error) => return error.to_compile_error().into(),
        };
        let Some(field_ident) = field.ident else {
            continue;
        };
        if !seen.insert(key.clone()) {
            return syn::Error::new_spanned(field_ident, format!("duplicate form key `{key}`"))
                .to_compile_error()
                .into();
        }
        let field_ty = field.ty;

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #root::form::FieldKey {
                #root::form::FieldKey::new(#key)
            }
        });
        decoders.push(quote! {
            #field_ident: <#field_ty as #root::form::FieldCodec>::decode(
                #root::form::FieldKey::new(#key),
                state.get(#key),
            )?
        });
        encoders.push(quote! {
            state.insert(
                #root::form::FieldKey::new(#key),
                #root::form::FieldCodec::encode(self.#field_ident),
            );
        });
        keys.push(key);
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #root::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> &'static [#root::form::FieldKey] {
                const KEYS: &[#root::form::FieldKey] = &[
                    #(#root::form::FieldKey::new(#keys)),*
                ];
                KEYS
            }

            fn from_state(
                state: &#root::form::FormState,
            ) -> ::core::result::Result<Self, #root::form::ModelError> {
                ::core::result::Result::Ok(Self {
                    #(#decoders,)*
                })
            }

            fn into_state(self) -> #root::form::FormState {
                let mut state = #root::form::FormState::default();
                #(#encoders)*
                state
            }
        }
    }
    .into()
}

fn field_key(field: &Field) -> syn::Result<String> {
    let mut key = None;
    for attr in &field.attrs {
        if !attr.path().is_ident("form") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("key") {
                let value: LitStr = meta.value()?.parse()?;
                key = Some(value.value());
                Ok(())
            } else {
                Err(meta.error("unsupported form attribute, expected `key = \"...\"`"))
            }
        })?;
    }
    Ok(key.unwrap_or_else(|| {
        field
            .ident
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }))
}

fn localhunt_path() -> TokenStream2 {
    match crate_name("localhunt") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) => quote!(crate),
        Err(_) => quote!(::localhunt),
    }
}
