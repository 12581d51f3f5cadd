use proc_macro2::TokenStream;
use quote::quote;
use syn::ext::IdentExt;
use syn::{Data, DeriveInput, Error, Field, Fields, LitStr, Meta};

pub fn derive_record(input: TokenStream) -> TokenStream {
    let input: DeriveInput = match syn::parse2(input) {
        Ok(input) => input,
        Err(err) => return err.to_compile_error(),
    };

    match expand(&input) {
        Ok(tokens) => tokens,
        Err(err) => err.to_compile_error(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<TokenStream> {
    let ident = &input.ident;
    let type_name = ident.unraw().to_string();
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            other => {
                return Err(Error::new_spanned(
                    other,
                    "Record can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(Error::new_spanned(
                ident,
                "Record can only be derived for structs with named fields",
            ))
        }
    };

    let mut specs = Vec::with_capacity(fields.len());
    let mut mapped_idents = Vec::new();
    let mut mapped_names = Vec::new();

    for field in fields {
        let field_ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "expected a named field"))?;
        let field_name = field_ident.unraw().to_string();

        match field_tag(field)? {
            Some(tag) => {
                specs.push(quote! {
                    ::graphorm::FieldSpec::new(#field_name, ::core::option::Option::Some(#tag))
                });
                mapped_idents.push(field_ident);
                mapped_names.push(field_name);
            }
            None => specs.push(quote! {
                ::graphorm::FieldSpec::new(#field_name, ::core::option::Option::None)
            }),
        }
    }

    Ok(quote! {
        impl #impl_generics ::graphorm::Record for #ident #ty_generics #where_clause {
            fn type_name() -> &'static str {
                #type_name
            }

            fn field_specs() -> &'static [::graphorm::FieldSpec] {
                const SPECS: &[::graphorm::FieldSpec] = &[#(#specs),*];
                SPECS
            }

            fn field_value(
                &self,
                field: &str,
            ) -> ::core::result::Result<::core::option::Option<::graphorm::Value>, ::graphorm::CoerceError> {
                match field {
                    #(#mapped_names => ::graphorm::FieldValue::to_property(&self.#mapped_idents),)*
                    _ => ::core::result::Result::Ok(::core::option::Option::None),
                }
            }

            fn raw_field_value(
                &self,
                field: &str,
            ) -> ::core::result::Result<::graphorm::Value, ::graphorm::CoerceError> {
                match field {
                    #(#mapped_names => ::graphorm::FieldValue::to_value(&self.#mapped_idents),)*
                    _ => ::core::result::Result::Ok(::graphorm::Value::Null),
                }
            }

            #[allow(unused_variables)]
            fn set_field_value(
                &mut self,
                field: &str,
                value: ::graphorm::Value,
            ) -> ::core::result::Result<(), ::graphorm::CoerceError> {
                match field {
                    #(#mapped_names => {
                        self.#mapped_idents = ::graphorm::FieldValue::from_value(value)?;
                    })*
                    _ => {}
                }
                ::core::result::Result::Ok(())
            }
        }
    })
}

/// The field's tag string, or `None` when it carries no `#[graph]` attribute.
///
/// Several attributes on one field are joined with `;`.
fn field_tag(field: &Field) -> syn::Result<Option<String>> {
    let mut tagged = false;
    let mut parts = Vec::new();

    for attr in field.attrs.iter().filter(|a| a.path().is_ident("graph")) {
        tagged = true;
        match &attr.meta {
            Meta::Path(_) => {}
            Meta::List(_) => {
                let tag: LitStr = attr.parse_args()?;
                parts.push(tag.value());
            }
            Meta::NameValue(meta) => {
                return Err(Error::new_spanned(
                    meta,
                    "expected #[graph] or #[graph(\"key:value;...\")]",
                ))
            }
        }
    }

    Ok(tagged.then(|| parts.join(";")))
}
