extern crate proc_macro;

mod mapping;

use mapping::{FieldNumberMap, MappingError, Numbering};
use proc_macro::TokenStream;
use proc_macro2::{Span, TokenStream as TokenStream2};
use quote::quote;
use syn::parse::Parse;
use syn::{
    parse_macro_input, Attribute, Data, DeriveInput, Expr, ExprLit, ExprUnary, Fields,
    GenericArgument, Ident, Lit, LitStr, PathArguments, Type, UnOp,
};

/// Container attributes parsed from `#[pb(...)]` on a struct.
#[derive(Debug, Default)]
struct ContainerAttributes {
    first_field_number: Option<u64>,
}

/// Field and variant attributes parsed from `#[pb(...)]`.
///
/// * `number` - explicit field number (`#[pb(number = 4)]`)
/// * `oneof` - numbers owned by a oneof member (`#[pb(oneof(5, 6))]`)
#[derive(Debug, Default)]
struct FieldAttributes {
    number: Option<u64>,
    oneof: Option<Vec<u64>>,
}

fn parse_number(input: syn::parse::ParseStream) -> syn::Result<u64> {
    let lit = input.parse::<syn::LitInt>()?;
    lit.base10_parse::<u64>()
        .map_err(|_| syn::Error::new(lit.span(), "Failed to parse field number"))
}

fn get_container_attributes(attrs: &[Attribute]) -> syn::Result<ContainerAttributes> {
    let mut parsed = ContainerAttributes::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("pb")) {
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<Ident>()?;
                if ident == "first_field_number" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.first_field_number = Some(parse_number(input)?);
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Parses `#[pb(number = N)]` and `#[pb(oneof(N, M, ...))]`. Multiple
/// attributes may be combined: `#[pb(number = 1)] #[pb(...)]`.
fn get_field_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes::default();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("pb")) {
        attr.parse_args_with(|input: syn::parse::ParseStream| {
            while !input.is_empty() {
                let ident = input.parse::<Ident>()?;
                if ident == "number" {
                    input.parse::<syn::Token![=]>()?;
                    parsed.number = Some(parse_number(input)?);
                } else if ident == "oneof" {
                    let content;
                    syn::parenthesized!(content in input);
                    let numbers = content
                        .parse_terminated(syn::LitInt::parse, syn::Token![,])?
                        .iter()
                        .map(|lit| {
                            lit.base10_parse::<u64>().map_err(|_| {
                                syn::Error::new(lit.span(), "Failed to parse field number")
                            })
                        })
                        .collect::<syn::Result<Vec<_>>>()?;
                    parsed.oneof = Some(numbers);
                } else {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("Unknown attribute: {}", ident),
                    ));
                }

                if input.peek(syn::Token![,]) {
                    input.parse::<syn::Token![,]>()?;
                }
            }
            Ok(())
        })?;
    }
    Ok(parsed)
}

/// Extract the inner type `T` from `Option<T>`
fn extract_inner_type_from_option(ty: &Type) -> Option<&Type> {
    let Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    match &segment.arguments {
        PathArguments::AngleBracketed(args) => match args.args.first() {
            Some(GenericArgument::Type(inner_ty)) => Some(inner_ty),
            _ => None,
        },
        _ => None,
    }
}

/// Turns a numbering error into a compile error on the offending member.
fn mapping_error(err: MappingError, spans: &[Span]) -> syn::Error {
    let mut error = syn::Error::new(spans[err.member()], err.to_string());
    if let MappingError::Duplicate { first, .. } = err {
        error.combine(syn::Error::new(spans[first], "first used here"));
    }
    error
}

/// One struct member as the derive sees it.
struct Member<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    /// For a oneof member, the `E` of `Option<E>`.
    oneof: Option<&'a Type>,
}

/// Derive macro for implementing the `Message` trait
///
/// Generates `struct_pb::Message` and `struct_pb::Value` for a struct with
/// named fields. The struct must also implement `Default`, returning every
/// field at its zero value as `#[derive(Default)]` does.
///
/// # Supported Attributes
///
/// * `#[pb(first_field_number = N)]` - on the struct; implicit numbering starts at `N`
/// * `#[pb(number = N)]` - explicit field number (all fields or none)
/// * `#[pb(oneof(N, M, ...))]` - on an `Option<E>` field where `E: Oneof`
///
/// # Examples
///
/// ```ignore
/// #[derive(Message, Default)]
/// #[pb(first_field_number = 2)]
/// struct MyStruct {
///     field1: Varint<i32>,
///     field2: String,
/// }
/// ```
#[proc_macro_derive(Message, attributes(pb))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_message(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_message(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = LitStr::new(&name.to_string(), name.span());

    let fields: Vec<&syn::Field> = match &input.data {
        Data::Struct(s) => match &s.fields {
            Fields::Named(fields) => fields.named.iter().collect(),
            Fields::Unit => Vec::new(),
            Fields::Unnamed(_) => {
                return Err(syn::Error::new_spanned(
                    name,
                    "Message can only be derived for structs with named fields",
                ))
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "Message can only be derived for structs",
            ))
        }
    };

    let container = get_container_attributes(&input.attrs)?;
    let mut members = Vec::with_capacity(fields.len());
    let mut numberings = Vec::with_capacity(fields.len());
    let mut spans = Vec::with_capacity(fields.len());
    for f in &fields {
        // Named fields always carry an ident.
        let Some(ident) = f.ident.as_ref() else {
            continue;
        };
        let attrs = get_field_attributes(&f.attrs)?;
        let (numbering, oneof) = match (attrs.number, attrs.oneof) {
            (Some(_), Some(_)) => {
                return Err(syn::Error::new_spanned(
                    ident,
                    "a field cannot have both `number` and `oneof`",
                ))
            }
            (Some(number), None) => (Numbering::Explicit(number), None),
            (None, Some(numbers)) => {
                let inner = extract_inner_type_from_option(&f.ty).ok_or_else(|| {
                    syn::Error::new_spanned(&f.ty, "a oneof field must have type `Option<E>`")
                })?;
                (Numbering::Oneof(numbers), Some(inner))
            }
            (None, None) => (Numbering::Implicit, None),
        };
        members.push(Member {
            ident,
            ty: &f.ty,
            oneof,
        });
        numberings.push(numbering);
        spans.push(ident.span());
    }

    let map = FieldNumberMap::build(&numberings, container.first_field_number)
        .map_err(|err| mapping_error(err, &spans))?;

    let field_numbers: Vec<u32> = map.declared().collect();
    let field_indexes: Vec<usize> = field_numbers
        .iter()
        .filter_map(|&number| map.index_of(number))
        .collect();

    let len_terms = members.iter().enumerate().map(|(i, m)| {
        let ident = m.ident;
        match m.oneof {
            Some(_) => quote! {
                match &self.#ident {
                    Some(value) => struct_pb::Oneof::oneof_len(value),
                    None => 0,
                }
            },
            None => {
                let number = map.numbers(i)[0];
                quote! { struct_pb::Field::field_len(&self.#ident, #number) }
            }
        }
    });

    // Ascending field-number order, interleaving oneof variants with plain fields.
    let encode_stmts = map.sorted().iter().map(|&(number, i)| {
        let ident = members[i].ident;
        match members[i].oneof {
            Some(_) => quote! {
                if let Some(value) = &self.#ident {
                    if struct_pb::Oneof::field_number(value) == #number {
                        struct_pb::Oneof::encode_oneof(value, buf);
                    }
                }
            },
            None => quote! {
                struct_pb::Field::encode_field(&self.#ident, #number, buf);
            },
        }
    });

    let merge_arms = members.iter().enumerate().map(|(i, m)| {
        let ident = m.ident;
        let numbers = map.numbers(i);
        match m.oneof {
            Some(inner) => quote! {
                #(#numbers)|* => <#inner as struct_pb::Oneof>::merge_oneof(
                    &mut self.#ident, field_number, wire_type, reader,
                ).map(|()| true),
            },
            None => quote! {
                #(#numbers)|* => struct_pb::Field::merge_field(
                    &mut self.#ident, field_number, wire_type, reader,
                ).map(|()| true),
            },
        }
    });

    let mut generics = input.generics.clone();
    if !generics.params.is_empty() {
        let where_clause = generics.make_where_clause();
        where_clause
            .predicates
            .push(syn::parse_quote!(Self: ::core::default::Default));
        for m in &members {
            match m.oneof {
                Some(inner) => where_clause
                    .predicates
                    .push(syn::parse_quote!(#inner: struct_pb::Oneof)),
                None => {
                    let ty = m.ty;
                    where_clause
                        .predicates
                        .push(syn::parse_quote!(#ty: struct_pb::Field))
                }
            }
        }
    }
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    // The numbers listed on a oneof field must be exactly the variants' numbers.
    let oneof_checks = members
        .iter()
        .enumerate()
        .filter(|_| input.generics.params.is_empty())
        .filter_map(|(i, m)| {
            let inner = m.oneof?;
            let numbers = map.numbers(i);
            let message = LitStr::new(
                &format!(
                    "#[pb(oneof(...))] on `{}::{}` does not match the field numbers of its oneof type",
                    name, m.ident
                ),
                m.ident.span(),
            );
            Some(quote! {
                const _: () = assert!(
                    struct_pb::__private::same_field_numbers(
                        &[#(#numbers),*],
                        <#inner as struct_pb::Oneof>::FIELD_NUMBERS,
                    ),
                    #message
                );
            })
        });

    Ok(quote! {
        #(#oneof_checks)*

        impl #impl_generics struct_pb::Message for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;
            const FIELD_NUMBERS: &'static [u32] = &[#(#field_numbers),*];

            fn field_index(field_number: u32) -> Option<usize> {
                match field_number {
                    #(#field_numbers => Some(#field_indexes),)*
                    _ => None,
                }
            }

            fn encoded_len(&self) -> usize {
                0 #(+ #len_terms)*
            }

            #[allow(unused_variables)]
            fn encode_raw<B: struct_pb::bytes::BufMut>(&self, buf: &mut B) {
                #(#encode_stmts)*
            }

            #[allow(unused_variables)]
            fn merge_field(
                &mut self,
                field_number: u32,
                wire_type: struct_pb::WireType,
                reader: &mut struct_pb::Reader<'_>,
            ) -> struct_pb::Result<bool> {
                match field_number {
                    #(#merge_arms)*
                    _ => Ok(false),
                }
            }
        }

        impl #impl_generics struct_pb::Value for #name #ty_generics #where_clause {
            const KIND: struct_pb::FieldKind = struct_pb::FieldKind::LengthDelimited;

            fn is_default(&self) -> bool {
                struct_pb::Message::encoded_len(self) == 0
            }

            fn value_len(&self) -> usize {
                struct_pb::message::message_value_len(self)
            }

            fn encode_value<B: struct_pb::bytes::BufMut>(&self, buf: &mut B) {
                struct_pb::message::encode_message_value(self, buf);
            }

            fn merge_value(&mut self, reader: &mut struct_pb::Reader<'_>) -> struct_pb::Result<()> {
                struct_pb::message::merge_message_value(self, reader)
            }
        }
    })
}

/// Reads an integer discriminant, allowing a leading minus sign.
fn discriminant_value(expr: &Expr) -> syn::Result<i64> {
    match expr {
        Expr::Lit(ExprLit {
            lit: Lit::Int(lit), ..
        }) => lit.base10_parse::<i64>(),
        Expr::Unary(ExprUnary {
            op: UnOp::Neg(_),
            expr,
            ..
        }) => discriminant_value(expr).map(|value| -value),
        Expr::Group(group) => discriminant_value(&group.expr),
        _ => Err(syn::Error::new_spanned(
            expr,
            "enum discriminants must be integer literals",
        )),
    }
}

/// Derive macro for implementing the `ProtoEnum` trait
///
/// Generates `struct_pb::ProtoEnum` and `struct_pb::Value` for a field-less
/// enum. Each variant's value is its discriminant, which must fit in `i32`;
/// variants without one take the previous value plus one, starting at 0.
/// One variant must have value 0. It is the value an absent field decodes
/// to, so the enum's `Default` must return it; `#[default]` on any other
/// variant is rejected.
///
/// # Examples
///
/// ```ignore
/// #[derive(Enumeration, Default, Clone, Copy)]
/// enum Corpus {
///     #[default]
///     Unspecified = 0,
///     Web = 1,
///     Images = 2,
/// }
/// ```
#[proc_macro_derive(Enumeration, attributes(pb))]
pub fn derive_enumeration(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_enumeration(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_enumeration(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let name_str = LitStr::new(&name.to_string(), name.span());
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(e) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Enumeration can only be derived for enums",
        ));
    };
    if e.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "an enumeration needs at least one variant",
        ));
    }

    let mut variant_idents = Vec::new();
    let mut variant_values: Vec<i32> = Vec::new();
    let mut next: i64 = 0;
    for v in &e.variants {
        if !matches!(v.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                &v.ident,
                "Enumeration variants cannot have fields",
            ));
        }
        let value = match &v.discriminant {
            Some((_, expr)) => discriminant_value(expr)?,
            None => next,
        };
        let value = i32::try_from(value).map_err(|_| {
            syn::Error::new_spanned(&v.ident, format!("enum value {} does not fit in i32", value))
        })?;
        if let Some(pos) = variant_values.iter().position(|&seen| seen == value) {
            return Err(syn::Error::new_spanned(
                &v.ident,
                format!(
                    "enum value {} is already used by variant `{}`",
                    value, variant_idents[pos]
                ),
            ));
        }
        if value != 0 && v.attrs.iter().any(|attr| attr.path().is_ident("default")) {
            return Err(syn::Error::new_spanned(
                &v.ident,
                format!(
                    "#[default] must be on the variant with value 0, not on `{}` = {}",
                    v.ident, value
                ),
            ));
        }
        next = i64::from(value) + 1;
        variant_idents.push(v.ident.clone());
        variant_values.push(value);
    }
    if !variant_values.contains(&0) {
        return Err(syn::Error::new_spanned(
            name,
            "an enumeration needs a variant with value 0",
        ));
    }

    // Negative values are sign-extended to 64 bits on the wire.
    let wire_values: Vec<u64> = variant_values
        .iter()
        .map(|&value| i64::from(value) as u64)
        .collect();

    Ok(quote! {
        impl #impl_generics struct_pb::ProtoEnum for #name #ty_generics #where_clause {
            const NAME: &'static str = #name_str;

            fn to_u64(&self) -> u64 {
                match self {
                    #(#name::#variant_idents => #wire_values,)*
                }
            }

            fn from_u64(value: u64) -> Option<Self> {
                match value as i32 {
                    #(#variant_values => Some(#name::#variant_idents),)*
                    _ => None,
                }
            }
        }

        impl #impl_generics struct_pb::Value for #name #ty_generics #where_clause {
            const KIND: struct_pb::FieldKind = struct_pb::FieldKind::Varint;

            fn is_default(&self) -> bool {
                struct_pb::ProtoEnum::to_u64(self) == 0
            }

            fn value_len(&self) -> usize {
                struct_pb::value::enum_len(self)
            }

            fn encode_value<B: struct_pb::bytes::BufMut>(&self, buf: &mut B) {
                struct_pb::value::encode_enum(self, buf);
            }

            fn merge_value(&mut self, reader: &mut struct_pb::Reader<'_>) -> struct_pb::Result<()> {
                struct_pb::value::merge_enum(self, reader)
            }
        }
    })
}

/// Derive macro for implementing the `Oneof` trait
///
/// Each variant wraps exactly one value and carries `#[pb(number = N)]`.
/// The message holds the enum as an `Option<E>` field marked
/// `#[pb(oneof(...))]` with the same numbers.
///
/// # Examples
///
/// ```ignore
/// #[derive(Oneof, Debug, PartialEq)]
/// enum Contact {
///     #[pb(number = 4)]
///     Email(String),
///     #[pb(number = 5)]
///     Phone(Varint<u64>),
/// }
/// ```
#[proc_macro_derive(Oneof, attributes(pb))]
pub fn derive_oneof(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_oneof(&input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand_oneof(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let Data::Enum(e) = &input.data else {
        return Err(syn::Error::new_spanned(
            name,
            "Oneof can only be derived for enums",
        ));
    };
    if e.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            name,
            "a oneof needs at least one variant",
        ));
    }

    let mut variant_idents = Vec::new();
    let mut variant_types = Vec::new();
    let mut numberings = Vec::new();
    let mut spans = Vec::new();
    for v in &e.variants {
        let ty = match &v.fields {
            Fields::Unnamed(fields) if fields.unnamed.len() == 1 => &fields.unnamed[0].ty,
            _ => {
                return Err(syn::Error::new_spanned(
                    &v.ident,
                    "oneof variants must wrap exactly one value",
                ))
            }
        };
        let number = get_field_attributes(&v.attrs)?.number.ok_or_else(|| {
            syn::Error::new_spanned(&v.ident, "missing #[pb(number = ...)] on oneof variant")
        })?;
        variant_idents.push(&v.ident);
        variant_types.push(ty);
        numberings.push(Numbering::Explicit(number));
        spans.push(v.ident.span());
    }

    let map = FieldNumberMap::build(&numberings, None).map_err(|err| mapping_error(err, &spans))?;
    let numbers: Vec<u32> = map.declared().collect();

    Ok(quote! {
        impl #impl_generics struct_pb::Oneof for #name #ty_generics #where_clause {
            const FIELD_NUMBERS: &'static [u32] = &[#(#numbers),*];

            fn field_number(&self) -> u32 {
                match self {
                    #(#name::#variant_idents(_) => #numbers,)*
                }
            }

            fn oneof_len(&self) -> usize {
                match self {
                    #(#name::#variant_idents(value) => struct_pb::field::present_len(#numbers, value),)*
                }
            }

            fn encode_oneof<B: struct_pb::bytes::BufMut>(&self, buf: &mut B) {
                match self {
                    #(#name::#variant_idents(value) => struct_pb::field::encode_present(#numbers, value, buf),)*
                }
            }

            fn merge_oneof(
                field: &mut Option<Self>,
                field_number: u32,
                wire_type: struct_pb::WireType,
                reader: &mut struct_pb::Reader<'_>,
            ) -> struct_pb::Result<()> {
                match field_number {
                    #(
                        #numbers => {
                            if let Some(#name::#variant_idents(value)) = field {
                                return struct_pb::field::merge_present(value, field_number, wire_type, reader);
                            }
                            let mut value: #variant_types = Default::default();
                            struct_pb::field::merge_present(&mut value, field_number, wire_type, reader)?;
                            *field = Some(#name::#variant_idents(value));
                            Ok(())
                        }
                    )*
                    _ => reader.skip_field(wire_type),
                }
            }
        }
    })
}
