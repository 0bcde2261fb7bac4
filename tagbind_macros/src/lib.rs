use proc_macro::TokenStream;
use quote::quote;
use syn::{
    parse_macro_input, Data, DeriveInput, Fields, Ident, LitStr, Result as SynResult, Token,
};

/// One `#[tag(...)]` entry: `query = "u"` or a bare `header`.
struct TagEntry {
    name: String,
    value: String,
}

struct FieldSpec {
    ident: Ident,
    tags: Vec<TagEntry>,
    embed: bool,
    skip: bool,
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Render entries as raw tag text: `body:"text" code:"403"`.
fn render(tags: &[TagEntry]) -> String {
    tags.iter()
        .map(|t| format!("{}:\"{}\"", t.name, escape(&t.value)))
        .collect::<Vec<_>>()
        .join(" ")
}

fn parse_field(field: &syn::Field) -> SynResult<FieldSpec> {
    let ident = field
        .ident
        .clone()
        .ok_or_else(|| syn::Error::new_spanned(field, "tuple fields are not supported"))?;
    let mut spec = FieldSpec {
        ident,
        tags: Vec::new(),
        embed: false,
        skip: false,
    };
    for attr in &field.attrs {
        if attr.path().is_ident("embed") {
            spec.embed = true;
        } else if attr.path().is_ident("skip") {
            spec.skip = true;
        } else if attr.path().is_ident("tag") {
            attr.parse_nested_meta(|meta| {
                let name = meta
                    .path
                    .get_ident()
                    .ok_or_else(|| meta.error("expected a tag name"))?
                    .to_string();
                let value = if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<LitStr>()?.value()
                } else {
                    String::new()
                };
                spec.tags.push(TagEntry { name, value });
                Ok(())
            })?;
        }
    }
    Ok(spec)
}

fn field_name(ident: &Ident) -> String {
    let name = ident.to_string();
    name.strip_prefix("r#").map(str::to_string).unwrap_or(name)
}

fn expand_schema(input: DeriveInput) -> SynResult<proc_macro2::TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Schema can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Schema can only be derived for structs",
            ))
        }
    };

    let mut descriptors = Vec::new();
    for field in fields {
        let spec = parse_field(field)?;
        if spec.skip {
            continue;
        }
        let ident = &spec.ident;
        let label = field_name(ident);
        if spec.embed && spec.tags.is_empty() {
            let ty = &field.ty;
            descriptors.push(quote! {
                ::tagbind::FieldDescriptor::<Self>::embedded::<#ty, _, _>(
                    #label,
                    |s| &s.#ident,
                    |s| &mut s.#ident,
                )
            });
        } else if spec.tags.is_empty() {
            descriptors.push(quote! {
                ::tagbind::FieldDescriptor::<Self>::untagged(#label)
            });
        } else {
            let tag = render(&spec.tags);
            descriptors.push(quote! {
                ::tagbind::FieldDescriptor::<Self>::leaf(
                    #label,
                    #tag,
                    |s| &s.#ident,
                    |s| &mut s.#ident,
                )
            });
        }
    }

    Ok(quote! {
        impl #impl_generics ::tagbind::Schema for #name #ty_generics #where_clause {
            fn fields() -> ::std::vec::Vec<::tagbind::FieldDescriptor<Self>> {
                ::std::vec![#(#descriptors),*]
            }
        }
    })
}

/// Derive `tagbind::Schema` from `#[tag(...)]`, `#[embed]` and `#[skip]`
/// field attributes.
#[proc_macro_derive(Schema, attributes(tag, embed, skip))]
pub fn derive_schema(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    expand_schema(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

/// Derive `tagbind::Reflect` for a serde struct, making it usable as a
/// record-shaped field.
#[proc_macro_derive(Record)]
pub fn derive_record(item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::tagbind::Reflect for #name #ty_generics #where_clause {
            fn shape() -> ::tagbind::reflect::Shape {
                ::tagbind::reflect::record_shape::<Self>()
            }

            fn to_value(&self) -> ::tagbind::reflect::Value {
                ::tagbind::reflect::record_to_value(self)
            }

            fn from_value(
                value: ::tagbind::reflect::Value,
            ) -> ::std::result::Result<Self, ::tagbind::error::ConversionError> {
                ::tagbind::reflect::record_from_value(value)
            }

            fn is_zero(&self) -> bool {
                ::tagbind::reflect::record_is_zero(self)
            }
        }
    };
    TokenStream::from(expanded)
}
