use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::meta::ParseNestedMeta;
use syn::{DataStruct, DeriveInput, Field, Fields, Lit, LitBool, LitInt, LitStr, Result, Token, Type};

pub(crate) fn generate_entity_for_struct(
    ast: &DeriveInput,
    data: &DataStruct,
) -> Result<TokenStream> {
    let name = &ast.ident;
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();
    let type_name = name.unraw().to_string();

    let fields = match &data.fields {
        Fields::Named(fields) => &fields.named,
        _ => {
            return Err(syn::Error::new_spanned(
                ast,
                format!(
                    "Failed to derive ArangoEntity for struct '{}': only structs with named fields are supported",
                    name
                ),
            ))
        }
    };

    let annotations = type_annotations(ast)?;

    let mut properties = Vec::with_capacity(fields.len());
    let mut base: Option<&Type> = None;
    for field in fields {
        match field_description(field)? {
            FieldDescription::Property(property) => properties.push(property),
            FieldDescription::Base => {
                if base.is_some() {
                    return Err(syn::Error::new_spanned(
                        field,
                        "Only one field can be marked as base",
                    ));
                }
                base = Some(&field.ty);
            }
        }
    }

    let base_code = base.map(|ty| {
        quote! {
            .base(<#ty as arango_odm::mapping::ArangoEntity>::type_description())
        }
    });

    let gen = quote! {
        impl #impl_generics arango_odm::mapping::ArangoEntity for #name #ty_generics #where_clause {
            fn type_description() -> arango_odm::mapping::TypeDescription {
                arango_odm::mapping::TypeDescription::builder(#type_name)
                    #(.annotation(#annotations))*
                    #(.property(#properties))*
                    #base_code
                    .build()
            }
        }
    };

    Ok(TokenStream::from(gen))
}

fn type_annotations(ast: &DeriveInput) -> Result<Vec<TokenStream2>> {
    let mut annotations = Vec::new();
    let mut declared: Vec<String> = Vec::new();

    for attr in &ast.attrs {
        if !attr.path().is_ident("arango") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let key = key_of(&meta)?;
            let annotation = match key.as_str() {
                "document" | "edge" | "search_view" => {
                    if declared.contains(&key) {
                        return Err(meta.error(format!("`{}` can only be declared once", key)));
                    }
                    declared.push(key.clone());
                    match key.as_str() {
                        "document" => {
                            let body = collection_annotation(&meta)?;
                            quote!(arango_odm::mapping::Annotation::Document(#body))
                        }
                        "edge" => {
                            let body = collection_annotation(&meta)?;
                            quote!(arango_odm::mapping::Annotation::Edge(#body))
                        }
                        _ => {
                            let body = search_view_annotation(&meta)?;
                            quote!(arango_odm::mapping::Annotation::SearchView(#body))
                        }
                    }
                }
                "hash_index" => {
                    let body = index_annotation(&meta, "HashIndex", &["unique", "sparse", "deduplicate"])?;
                    quote!(arango_odm::mapping::Annotation::HashIndex(#body))
                }
                "skiplist_index" => {
                    let body =
                        index_annotation(&meta, "SkiplistIndex", &["unique", "sparse", "deduplicate"])?;
                    quote!(arango_odm::mapping::Annotation::SkiplistIndex(#body))
                }
                "persistent_index" => {
                    let body = index_annotation(&meta, "PersistentIndex", &["unique", "sparse"])?;
                    quote!(arango_odm::mapping::Annotation::PersistentIndex(#body))
                }
                "geo_index" => {
                    let body = index_annotation(&meta, "GeoIndex", &["geo_json"])?;
                    quote!(arango_odm::mapping::Annotation::GeoIndex(#body))
                }
                "fulltext_index" => {
                    let body = index_annotation(&meta, "FulltextIndex", &["min_length"])?;
                    quote!(arango_odm::mapping::Annotation::FulltextIndex(#body))
                }
                _ => return Err(meta.error(format!("Unknown arango attribute `{}`", key))),
            };
            annotations.push(annotation);
            Ok(())
        })?;
    }
    Ok(annotations)
}

enum FieldDescription {
    Property(TokenStream2),
    Base,
}

fn field_description(field: &Field) -> Result<FieldDescription> {
    let Some(ident) = field.ident.as_ref() else {
        return Err(syn::Error::new_spanned(field, "Expected a named field"));
    };
    let property_name = serde_rename(field).unwrap_or_else(|| ident.unraw().to_string());

    let mut annotations = Vec::new();
    let mut seen: Vec<String> = Vec::new();
    let mut is_base = false;

    for attr in &field.attrs {
        if !attr.path().is_ident("arango") {
            continue;
        }
        attr.parse_nested_meta(|meta| {
            let key = key_of(&meta)?;
            if seen.contains(&key) {
                return Err(meta.error(format!("Duplicate arango attribute `{}`", key)));
            }
            seen.push(key.clone());

            let annotation = match key.as_str() {
                "id" => quote!(arango_odm::mapping::PropertyAnnotation::Id),
                "arango_id" => quote!(arango_odm::mapping::PropertyAnnotation::ArangoId),
                "rev" => quote!(arango_odm::mapping::PropertyAnnotation::Rev),
                "hash_indexed" => {
                    let body = struct_literal(&meta, "HashIndexed", |key, meta| {
                        flag(key, meta, &["unique", "sparse", "deduplicate"])
                    })?;
                    quote!(arango_odm::mapping::PropertyAnnotation::HashIndexed(#body))
                }
                "skiplist_indexed" => {
                    let body = struct_literal(&meta, "SkiplistIndexed", |key, meta| {
                        flag(key, meta, &["unique", "sparse", "deduplicate"])
                    })?;
                    quote!(arango_odm::mapping::PropertyAnnotation::SkiplistIndexed(#body))
                }
                "persistent_indexed" => {
                    let body = struct_literal(&meta, "PersistentIndexed", |key, meta| {
                        flag(key, meta, &["unique", "sparse"])
                    })?;
                    quote!(arango_odm::mapping::PropertyAnnotation::PersistentIndexed(#body))
                }
                "geo_indexed" => {
                    let body =
                        struct_literal(&meta, "GeoIndexed", |key, meta| flag(key, meta, &["geo_json"]))?;
                    quote!(arango_odm::mapping::PropertyAnnotation::GeoIndexed(#body))
                }
                "fulltext_indexed" => {
                    let body = struct_literal(&meta, "FulltextIndexed", |key, meta| match key {
                        "min_length" => {
                            let value = int_value(meta)?;
                            Ok(quote!(min_length: #value))
                        }
                        _ => Err(meta.error(format!("Unknown fulltext_indexed attribute `{}`", key))),
                    })?;
                    quote!(arango_odm::mapping::PropertyAnnotation::FulltextIndexed(#body))
                }
                "field_link" => {
                    let body = struct_literal(&meta, "FieldLinkAnnotation", link_setting)?;
                    quote!(arango_odm::mapping::PropertyAnnotation::FieldLink(#body))
                }
                "base" => {
                    is_base = true;
                    return Ok(());
                }
                _ => return Err(meta.error(format!("Unknown arango field attribute `{}`", key))),
            };
            annotations.push(annotation);
            Ok(())
        })?;
    }

    if is_base {
        if !annotations.is_empty() {
            return Err(syn::Error::new_spanned(
                field,
                "`base` cannot be combined with other arango attributes",
            ));
        }
        return Ok(FieldDescription::Base);
    }

    Ok(FieldDescription::Property(quote! {
        arango_odm::mapping::PropertyDescription::new(#property_name)
            #(.with(#annotations))*
    }))
}

fn collection_annotation(meta: &ParseNestedMeta) -> Result<TokenStream2> {
    struct_literal(meta, "CollectionAnnotation", |key, meta| match key {
        "name" => {
            let value = string_value(meta)?;
            Ok(quote!(name: #value.to_string()))
        }
        "wait_for_sync" | "do_compact" | "is_volatile" | "is_system" | "satellite" | "allow_user_keys" => {
            let ident = format_ident!("{}", key);
            let value = bool_value(meta)?;
            Ok(quote!(#ident: #value))
        }
        "journal_size" | "replication_factor" | "number_of_shards" | "index_buckets" | "key_increment"
        | "key_offset" => {
            let ident = format_ident!("{}", key);
            let value = int_value(meta)?;
            Ok(quote!(#ident: #value))
        }
        "shard_keys" => {
            let values = list_value(meta)?;
            Ok(quote!(shard_keys: vec![#(#values.to_string()),*]))
        }
        "key_type" => {
            let variant = match string_value(meta)?.as_str() {
                "traditional" => quote!(Traditional),
                "autoincrement" => quote!(Autoincrement),
                "uuid" => quote!(Uuid),
                "padded" => quote!(Padded),
                other => return Err(meta.error(format!("Unknown key type `{}`", other))),
            };
            Ok(quote!(key_type: arango_odm::mapping::KeyType::#variant))
        }
        _ => Err(meta.error(format!("Unknown collection attribute `{}`", key))),
    })
}

fn search_view_annotation(meta: &ParseNestedMeta) -> Result<TokenStream2> {
    struct_literal(meta, "SearchViewAnnotation", |key, meta| match key {
        "name" | "locale" => {
            let ident = format_ident!("{}", key);
            let value = string_value(meta)?;
            Ok(quote!(#ident: #value.to_string()))
        }
        "commit_interval_msec"
        | "cleanup_interval_step"
        | "count_segment_threshold"
        | "bytes_segment_threshold"
        | "bytes_accum_segment_threshold"
        | "fill_segment_threshold" => {
            let ident = format_ident!("{}", key);
            let value = int_value(meta)?;
            Ok(quote!(#ident: #value))
        }
        "count_threshold" | "bytes_threshold" | "bytes_accum_threshold" | "fill_threshold" => {
            let ident = format_ident!("{}", key);
            let value = float_value(meta)?;
            Ok(quote!(#ident: #value))
        }
        _ => link_setting(key, meta),
    })
}

fn index_annotation(meta: &ParseNestedMeta, struct_name: &str, options: &[&str]) -> Result<TokenStream2> {
    let mut has_fields = false;
    let body = struct_literal(meta, struct_name, |key, meta| match key {
        "fields" => {
            has_fields = true;
            let values = list_value(meta)?;
            Ok(quote!(fields: vec![#(#values.to_string()),*]))
        }
        "min_length" if options.contains(&"min_length") => {
            let value = int_value(meta)?;
            Ok(quote!(min_length: #value))
        }
        _ => flag(key, meta, options),
    })?;
    if !has_fields {
        return Err(meta.error("Index declarations need `fields`"));
    }
    Ok(body)
}

/// Settings shared by search view links and field links.
fn link_setting(key: &str, meta: &ParseNestedMeta) -> Result<TokenStream2> {
    match key {
        "analyzers" => {
            let values = list_value(meta)?;
            Ok(quote!(analyzers: vec![#(#values.to_string()),*]))
        }
        "include_all_fields" | "track_list_positions" => {
            let ident = format_ident!("{}", key);
            let value = bool_value(meta)?;
            Ok(quote!(#ident: #value))
        }
        "store_values" => {
            let variant = match string_value(meta)?.as_str() {
                "none" => quote!(None),
                "id" => quote!(Id),
                other => return Err(meta.error(format!("Unknown store_values `{}`", other))),
            };
            Ok(quote!(store_values: arango_odm::mapping::StoreValues::#variant))
        }
        _ => Err(meta.error(format!("Unknown link attribute `{}`", key))),
    }
}

fn flag(key: &str, meta: &ParseNestedMeta, allowed: &[&str]) -> Result<TokenStream2> {
    if !allowed.contains(&key) {
        return Err(meta.error(format!("Unknown attribute `{}`, expected one of {:?}", key, allowed)));
    }
    let ident = format_ident!("{}", key);
    let value = bool_value(meta)?;
    Ok(quote!(#ident: #value))
}

/// Builds `arango_odm::mapping::<struct_name> { .. }` from the nested keys
/// of `meta`; keys not given keep their defaults.
fn struct_literal(
    meta: &ParseNestedMeta,
    struct_name: &str,
    mut assign: impl FnMut(&str, &ParseNestedMeta) -> Result<TokenStream2>,
) -> Result<TokenStream2> {
    let mut assignments = Vec::new();
    if meta.input.peek(syn::token::Paren) {
        let mut seen: Vec<String> = Vec::new();
        meta.parse_nested_meta(|nested| {
            let key = key_of(&nested)?;
            if seen.contains(&key) {
                return Err(nested.error(format!("Duplicate attribute `{}`", key)));
            }
            assignments.push(assign(&key, &nested)?);
            seen.push(key);
            Ok(())
        })?;
    }
    let ident = format_ident!("{}", struct_name);
    Ok(quote! {
        arango_odm::mapping::#ident {
            #(#assignments,)*
            ..::core::default::Default::default()
        }
    })
}

fn key_of(meta: &ParseNestedMeta) -> Result<String> {
    meta.path
        .get_ident()
        .map(|ident| ident.to_string())
        .ok_or_else(|| meta.error("Expected an identifier"))
}

fn string_value(meta: &ParseNestedMeta) -> Result<String> {
    let value: LitStr = meta.value()?.parse()?;
    Ok(value.value())
}

fn list_value(meta: &ParseNestedMeta) -> Result<Vec<String>> {
    let value = string_value(meta)?;
    Ok(value
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn bool_value(meta: &ParseNestedMeta) -> Result<bool> {
    if meta.input.peek(Token![=]) {
        let value: LitBool = meta.value()?.parse()?;
        Ok(value.value)
    } else {
        Ok(true)
    }
}

fn int_value(meta: &ParseNestedMeta) -> Result<i64> {
    let value: LitInt = meta.value()?.parse()?;
    value.base10_parse()
}

fn float_value(meta: &ParseNestedMeta) -> Result<f64> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Float(value) => value.base10_parse(),
        Lit::Int(value) => value.base10_parse::<i64>().map(|v| v as f64),
        other => Err(syn::Error::new_spanned(other, "Expected a number")),
    }
}

/// Returns the serialized name given by `#[serde(rename = "..")]`.
fn serde_rename(field: &Field) -> Option<String> {
    let mut rename = None;
    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("serde")) {
        // serde validates its own attributes
        let _ = attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("rename") {
                if meta.input.peek(Token![=]) {
                    rename = Some(string_value(&meta)?);
                } else {
                    meta.parse_nested_meta(|nested| {
                        if nested.path.is_ident("serialize") {
                            rename = Some(string_value(&nested)?);
                        } else {
                            skip_meta(&nested)?;
                        }
                        Ok(())
                    })?;
                }
                Ok(())
            } else {
                skip_meta(&meta)
            }
        });
    }
    rename
}

fn skip_meta(meta: &ParseNestedMeta) -> Result<()> {
    if meta.input.peek(Token![=]) {
        meta.value()?.parse::<syn::Expr>()?;
    } else if meta.input.peek(syn::token::Paren) {
        meta.parse_nested_meta(|nested| skip_meta(&nested))?;
    }
    Ok(())
}
