//! Expansion of `#[derive(Model)]`.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{
    Attribute, Data, DataEnum, DeriveInput, Fields, FieldsNamed, GenericArgument, Ident, LitStr,
    PathArguments, Result, Type, ext::IdentExt,
};

/// Options from `#[bson(...)]` on a field or variant.
#[derive(Debug, Default)]
struct BsonAttrs {
    rename: Option<String>,
    default: bool,
    skip: bool,
}

impl BsonAttrs {
    fn from_attrs(attrs: &[Attribute]) -> Result<Self> {
        let mut parsed = Self::default();

        for attr in attrs {
            if !attr.path().is_ident("bson") {
                continue;
            }

            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("rename") {
                    let value: LitStr = meta.value()?.parse()?;
                    parsed.rename = Some(value.value());
                    Ok(())
                } else if meta.path.is_ident("default") {
                    parsed.default = true;
                    Ok(())
                } else if meta.path.is_ident("skip") {
                    parsed.skip = true;
                    Ok(())
                } else {
                    Err(meta.error("unsupported bson attribute"))
                }
            })?;
        }

        Ok(parsed)
    }
}

struct FieldInfo<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    wire_name: String,
    attrs: BsonAttrs,
}

pub fn expand(input: &DeriveInput) -> Result<TokenStream> {
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic types",
        ));
    }

    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => expand_struct(input, fields),
            _ => Err(syn::Error::new_spanned(
                &input.ident,
                "Model can only be derived for structs with named fields",
            )),
        },
        Data::Enum(data) => expand_enum(input, data),
        Data::Union(_) => Err(syn::Error::new_spanned(
            &input.ident,
            "Model cannot be derived for unions",
        )),
    }
}

fn expand_struct(input: &DeriveInput, fields: &FieldsNamed) -> Result<TokenStream> {
    let name = &input.ident;
    let model_name = name.to_string();
    let codec_name = format_ident!("__{}Codec", name);

    let mut infos = Vec::new();
    let mut seen = HashSet::new();
    for field in &fields.named {
        let Some(ident) = field.ident.as_ref() else {
            continue;
        };
        let attrs = BsonAttrs::from_attrs(&field.attrs)?;
        let wire_name = attrs
            .rename
            .clone()
            .unwrap_or_else(|| ident.unraw().to_string());
        if !attrs.skip && !seen.insert(wire_name.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate BSON field name `{wire_name}`"),
            ));
        }
        infos.push(FieldInfo {
            ident,
            ty: &field.ty,
            wire_name,
            attrs,
        });
    }

    let active: Vec<&FieldInfo> = infos.iter().filter(|field| !field.attrs.skip).collect();

    let codec_fields = active.iter().map(|field| {
        let ident = field.ident;
        let ty = field.ty;
        quote! { #ident: Arc<dyn Codec<#ty>> }
    });

    let codec_inits = active.iter().map(|field| {
        let ident = field.ident;
        let resolve = resolve_codec(field.ty);
        quote! { #ident: #resolve }
    });

    let encode_field = |field: &FieldInfo| {
        let ident = field.ident;
        let wire_name = &field.wire_name;
        quote! {
            writer.write_name(#wire_name)?;
            self.#ident.encode(writer, &value.#ident, &child)?;
        }
    };

    let id_field = active.iter().find(|field| field.wire_name == "_id");
    let encode_body = match id_field {
        Some(id) => {
            let write_id = encode_field(id);
            let write_in_order = active.iter().map(|field| encode_field(field));
            let write_rest = active
                .iter()
                .filter(|field| field.wire_name != "_id")
                .map(|field| encode_field(field));
            quote! {
                if context.is_encoding_collectible_document() {
                    #write_id
                    #(#write_rest)*
                } else {
                    #(#write_in_order)*
                }
            }
        }
        None => {
            let write_in_order = active.iter().map(|field| encode_field(field));
            quote! { #(#write_in_order)* }
        }
    };

    let slots: Vec<Ident> = active
        .iter()
        .map(|field| format_ident!("__field_{}", field.ident))
        .collect();

    let slot_decls = active.iter().zip(&slots).map(|(field, slot)| {
        let ty = field.ty;
        quote! { let mut #slot: Option<#ty> = None; }
    });

    let match_arms = active.iter().zip(&slots).map(|(field, slot)| {
        let ident = field.ident;
        let wire_name = &field.wire_name;
        quote! {
            #wire_name => #slot = Some(self.#ident.decode(reader, context)?),
        }
    });

    let assignments = infos.iter().map(|field| {
        let ident = field.ident;
        if field.attrs.skip {
            return quote! { #ident: Default::default() };
        }
        let slot = format_ident!("__field_{}", field.ident);
        let wire_name = &field.wire_name;
        if field.attrs.default {
            quote! { #ident: #slot.unwrap_or_default() }
        } else if option_inner(field.ty).is_some() {
            quote! { #ident: #slot.unwrap_or(None) }
        } else {
            quote! {
                #ident: match #slot {
                    Some(value) => value,
                    None => return Err(::bsoncodec::model::missing_field(#model_name, #wire_name)),
                }
            }
        }
    });

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            use ::std::sync::Arc;
            use ::bsoncodec::{
                codec::{Codec, DecoderContext, EncoderContext},
                error::CodecResult,
                io::{BsonReader, BsonWriter},
                registry::CodecRegistry,
            };

            struct #codec_name {
                #(#codec_fields,)*
            }

            impl Codec<#name> for #codec_name {
                #[allow(unused_variables)]
                fn encode(
                    &self,
                    writer: &mut BsonWriter,
                    value: &#name,
                    context: &EncoderContext,
                ) -> CodecResult<()> {
                    let child = context.child();
                    writer.write_start_document()?;
                    #encode_body
                    writer.write_end_document()
                }

                fn decode(
                    &self,
                    reader: &mut BsonReader<'_>,
                    context: &DecoderContext,
                ) -> CodecResult<#name> {
                    reader.read_start_document()?;
                    #(#slot_decls)*
                    while reader.read_bson_type()?.is_some() {
                        let name = reader.read_name()?;
                        match name.as_str() {
                            #(#match_arms)*
                            other => ::bsoncodec::model::skip_unknown_field(
                                reader,
                                context,
                                #model_name,
                                other,
                            )?,
                        }
                    }
                    reader.read_end_document()?;
                    Ok(#name {
                        #(#assignments,)*
                    })
                }
            }

            impl ::bsoncodec::model::Model for #name {
                #[allow(unused_variables)]
                fn codec(registry: &CodecRegistry) -> CodecResult<Arc<dyn Codec<Self>>> {
                    Ok(Arc::new(#codec_name {
                        #(#codec_inits,)*
                    }))
                }
            }
        };
    })
}

fn expand_enum(input: &DeriveInput, data: &DataEnum) -> Result<TokenStream> {
    let name = &input.ident;
    let model_name = name.to_string();
    let codec_name = format_ident!("__{}Codec", name);

    if data.variants.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.ident,
            "Model cannot be derived for enums without variants",
        ));
    }

    let mut idents = Vec::new();
    let mut wire_names = Vec::new();
    let mut seen = HashSet::new();
    for variant in &data.variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "Model can only be derived for enums whose variants carry no data",
            ));
        }
        let attrs = BsonAttrs::from_attrs(&variant.attrs)?;
        if attrs.default || attrs.skip {
            return Err(syn::Error::new_spanned(
                variant,
                "only `rename` is supported on enum variants",
            ));
        }
        let wire_name = attrs
            .rename
            .unwrap_or_else(|| variant.ident.unraw().to_string());
        if !seen.insert(wire_name.clone()) {
            return Err(syn::Error::new_spanned(
                variant,
                format!("duplicate variant name `{wire_name}`"),
            ));
        }
        idents.push(&variant.ident);
        wire_names.push(wire_name);
    }

    Ok(quote! {
        #[doc(hidden)]
        const _: () = {
            use ::std::sync::Arc;
            use ::bsoncodec::{
                codec::{Codec, DecoderContext, EncoderContext},
                error::{CodecError, CodecResult},
                io::{BsonReader, BsonWriter},
                registry::CodecRegistry,
            };

            struct #codec_name;

            impl Codec<#name> for #codec_name {
                fn encode(
                    &self,
                    writer: &mut BsonWriter,
                    value: &#name,
                    _: &EncoderContext,
                ) -> CodecResult<()> {
                    let name = match value {
                        #(#name::#idents => #wire_names,)*
                    };
                    writer.write_string(name)
                }

                fn decode(
                    &self,
                    reader: &mut BsonReader<'_>,
                    _: &DecoderContext,
                ) -> CodecResult<#name> {
                    let name = reader.read_string()?;
                    match name.as_str() {
                        #(#wire_names => Ok(#name::#idents),)*
                        other => Err(CodecError::Decoding(format!(
                            "unknown variant `{}` for {}",
                            other, #model_name,
                        ))),
                    }
                }
            }

            impl ::bsoncodec::model::Model for #name {
                fn codec(_: &CodecRegistry) -> CodecResult<Arc<dyn Codec<Self>>> {
                    Ok(Arc::new(#codec_name))
                }
            }
        };
    })
}

/// Builds the expression resolving the codec for a field of type `ty`.
///
/// `Option<T>` and `Vec<T>` prefer a codec registered for the wrapper type itself and otherwise
/// wrap the codec of `T`, recursively.
fn resolve_codec(ty: &Type) -> TokenStream {
    let wrapped = if let Some(inner) = option_inner(ty) {
        let inner_codec = resolve_codec(inner);
        Some(quote! { ::bsoncodec::codecs::NullableCodec::new(#inner_codec) })
    } else if let Some(inner) = generic_inner(ty, "Vec") {
        let inner_codec = resolve_codec(inner);
        Some(quote! { ::bsoncodec::codecs::ArrayCodec::new(#inner_codec) })
    } else {
        None
    };

    match wrapped {
        Some(wrapped) => quote! {
            match registry.try_get::<#ty>()? {
                Some(codec) => codec,
                None => Arc::new(#wrapped) as Arc<dyn Codec<#ty>>,
            }
        },
        None => quote! { registry.get::<#ty>()? },
    }
}

fn option_inner(ty: &Type) -> Option<&Type> {
    generic_inner(ty, "Option")
}

fn generic_inner<'a>(ty: &'a Type, wrapper: &str) -> Option<&'a Type> {
    if let Type::Path(type_path) = ty
        && type_path.qself.is_none()
        && let Some(last_segment) = type_path.path.segments.last()
        && last_segment.ident == wrapper
        && let PathArguments::AngleBracketed(args) = &last_segment.arguments
        && args.args.len() == 1
        && let Some(GenericArgument::Type(inner)) = args.args.first()
    {
        return Some(inner);
    }
    None
}
