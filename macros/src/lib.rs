use proc_macro::TokenStream;
use quote::quote;
use std::collections::HashMap;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Meta, Token, Type};

/// Helper enum for parsed attribute values
enum MetaValue {
    Str(syn::LitStr),
    Expr(syn::Expr),
    Flag,
}

const KINDS: [&str; 6] = ["boolean", "int", "float", "string", "enumeration", "object"];
const STRING_OPTIONS: [&str; 3] = ["env", "doc", "matches"];
const EXPR_OPTIONS: [&str; 3] = ["default", "min", "max"];

/// Define a config struct whose fields are read from an env file
///
/// Every field carries `#[field(<kind>, ...)]` where `<kind>` is one of
/// `boolean`, `int`, `float`, `string`, `enumeration` or `object`, followed by
/// any of `env = "NAME"`, `doc = "..."`, `optional`, `default = <expr>`,
/// `min = <num>`, `max = <num>` and `matches = "<regex>"`.
#[proc_macro]
pub fn define_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_config(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

/// Define a string-valued enum usable by `enumeration` fields
///
/// Variants must be unit variants; `#[value = "..."]` sets the env value,
/// which otherwise is the variant name.
#[proc_macro]
pub fn define_enum(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    match generate_enum(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn generate_config(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let struct_name = &input.ident;
    let schema_name = struct_name.to_string();
    let vis = &input.vis;
    let struct_attrs = &input.attrs;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "define_config! does not support generic structs",
        ));
    }

    // Extract fields from the struct
    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    input,
                    "define_config! only supports structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_config! only supports structs",
            ));
        }
    };

    let mut field_defs = Vec::new();
    let mut schema_fields = Vec::new();
    let mut value_fields = Vec::new();

    for field in fields {
        let field_name = field
            .ident
            .as_ref()
            .ok_or_else(|| syn::Error::new_spanned(field, "expected a named field"))?;
        let field_vis = &field.vis;
        let field_type = &field.ty;
        let field_attrs = &field.attrs;
        let property = field_name.to_string();

        let config = parse_field_config(field, field_attrs)?;

        // Extract cfg attributes for feature gating
        let cfg_attrs: Vec<&Attribute> = field_attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .collect();
        let kept_attrs: Vec<&Attribute> = field_attrs
            .iter()
            .filter(|attr| !attr.path().is_ident("field"))
            .collect();

        field_defs.push(quote! {
            #(#kept_attrs)*
            #field_vis #field_name: #field_type
        });

        let (is_option, value_type) = extract_generic_arg(field_type, "Option");
        let (is_array, element_type) = extract_generic_arg(value_type, "Vec");

        if is_option && !config.optional {
            return Err(syn::Error::new_spanned(
                field_type,
                "Option<T> fields must be marked `optional`",
            ));
        }
        if config.optional && !is_option && config.default.is_none() {
            return Err(syn::Error::new_spanned(
                field_type,
                "optional fields without a default must have type Option<T>",
            ));
        }

        let constructor = match config.kind.as_str() {
            "boolean" => quote! { ::envfile_loadr::FieldSpec::boolean(#property) },
            "int" => quote! {
                ::envfile_loadr::FieldSpec::int(#property)
                    .implied_bounds(<#element_type as ::envfile_loadr::FromValue>::implied_bounds())
            },
            "float" => quote! { ::envfile_loadr::FieldSpec::float(#property) },
            "string" => quote! { ::envfile_loadr::FieldSpec::string(#property) },
            "enumeration" => quote! { ::envfile_loadr::FieldSpec::enum_of::<#element_type>(#property) },
            _ => quote! {
                ::envfile_loadr::FieldSpec::object(
                    #property,
                    <#element_type as ::envfile_loadr::EnvSchema>::schema(),
                )
            },
        };

        let mut modifiers = Vec::new();
        if let Some(env) = &config.env {
            modifiers.push(quote! { .env(#env) });
        }
        if let Some(doc) = &config.description {
            modifiers.push(quote! { .doc(#doc) });
        }
        if config.optional {
            modifiers.push(quote! { .optional() });
        }
        if is_array {
            modifiers.push(quote! { .array() });
        }
        if let Some(min) = &config.min {
            modifiers.push(quote! { .min((#min) as f64) });
        }
        if let Some(max) = &config.max {
            modifiers.push(quote! { .max((#max) as f64) });
        }
        if let Some(pattern) = &config.matches {
            modifiers.push(quote! { .matches(#pattern) });
        }
        if let Some(default) = &config.default {
            modifiers.push(quote! { .default(#default) });
        }

        schema_fields.push(quote! {
            #(#cfg_attrs)*
            builder = builder.field(#constructor #(#modifiers)*);
        });

        value_fields.push(quote! {
            #(#cfg_attrs)*
            #field_name: ::envfile_loadr::__private::field_value::<#field_type>(values, #property)?
        });
    }

    let struct_def = quote! {
        #(#struct_attrs)*
        #vis struct #struct_name {
            #(#field_defs),*
        }
    };

    let schema_impl = quote! {
        impl ::envfile_loadr::EnvSchema for #struct_name {
            fn schema() -> &'static ::envfile_loadr::Schema {
                static SCHEMA: ::envfile_loadr::__private::OnceLock<::envfile_loadr::Schema> =
                    ::envfile_loadr::__private::OnceLock::new();

                SCHEMA.get_or_init(|| {
                    let mut builder = ::envfile_loadr::Schema::builder(#schema_name);

                    #(#schema_fields)*

                    ::envfile_loadr::__private::expect_schema(builder.build())
                })
            }

            fn from_values(
                values: &::envfile_loadr::ConfigValues,
            ) -> ::std::result::Result<Self, ::envfile_loadr::ConfigError> {
                Ok(Self {
                    #(#value_fields),*
                })
            }
        }

        impl ::envfile_loadr::FromValue for #struct_name {
            fn from_value(value: &::envfile_loadr::Value) -> ::std::option::Option<Self> {
                match value {
                    ::envfile_loadr::Value::Object(values) => {
                        <Self as ::envfile_loadr::EnvSchema>::from_values(values).ok()
                    }
                    _ => None,
                }
            }
        }
    };

    Ok(quote! {
        #struct_def
        #schema_impl
    })
}

fn generate_enum(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let enum_name = &input.ident;
    let vis = &input.vis;
    let enum_attrs = &input.attrs;

    let variants = match &input.data {
        Data::Enum(data) => &data.variants,
        _ => {
            return Err(syn::Error::new_spanned(
                input,
                "define_enum! only supports enums",
            ));
        }
    };

    let mut variant_defs = Vec::new();
    let mut values = Vec::new();
    let mut from_arms = Vec::new();
    let mut as_arms = Vec::new();

    for variant in variants {
        if !matches!(variant.fields, Fields::Unit) {
            return Err(syn::Error::new_spanned(
                variant,
                "define_enum! only supports unit variants",
            ));
        }

        let ident = &variant.ident;
        let mut value = ident.to_string();
        let mut kept_attrs = Vec::new();
        for attr in &variant.attrs {
            if attr.path().is_ident("value") {
                value = parse_value_attr(attr)?;
            } else {
                kept_attrs.push(attr);
            }
        }

        let discriminant = variant
            .discriminant
            .as_ref()
            .map(|(eq, expr)| quote! { #eq #expr });
        variant_defs.push(quote! {
            #(#kept_attrs)*
            #ident #discriminant
        });
        from_arms.push(quote! { #value => Some(Self::#ident), });
        as_arms.push(quote! { Self::#ident => #value, });
        values.push(value);
    }

    Ok(quote! {
        #(#enum_attrs)*
        #vis enum #enum_name {
            #(#variant_defs),*
        }

        impl ::envfile_loadr::EnvEnum for #enum_name {
            const VALUES: &'static [&'static str] = &[#(#values),*];

            fn from_env_value(value: &str) -> ::std::option::Option<Self> {
                match value {
                    #(#from_arms)*
                    _ => None,
                }
            }

            fn as_env_value(&self) -> &'static str {
                match self {
                    #(#as_arms)*
                }
            }
        }

        impl ::envfile_loadr::FromValue for #enum_name {
            fn from_value(value: &::envfile_loadr::Value) -> ::std::option::Option<Self> {
                value
                    .as_str()
                    .and_then(<Self as ::envfile_loadr::EnvEnum>::from_env_value)
            }
        }

        impl ::std::convert::From<#enum_name> for ::envfile_loadr::Value {
            fn from(value: #enum_name) -> Self {
                ::envfile_loadr::Value::Str(
                    ::envfile_loadr::EnvEnum::as_env_value(&value).to_string(),
                )
            }
        }
    })
}

/// Parse `#[value = "..."]`
fn parse_value_attr(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::NameValue(name_value) => match &name_value.value {
            syn::Expr::Lit(syn::ExprLit {
                lit: syn::Lit::Str(lit),
                ..
            }) => Ok(lit.value()),
            other => Err(syn::Error::new_spanned(
                other,
                "value must be a string literal",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            attr,
            "expected #[value = \"...\"]",
        )),
    }
}

#[derive(Debug)]
struct FieldConfig {
    kind: String,
    env: Option<syn::LitStr>,
    description: Option<String>,
    optional: bool,
    default: Option<syn::Expr>,
    min: Option<syn::Expr>,
    max: Option<syn::Expr>,
    matches: Option<syn::LitStr>,
}

/// Parse #[field(int, env = "X", doc = "Y", optional, default = val)] syntax
fn parse_field_list(meta_list: &syn::MetaList) -> syn::Result<HashMap<String, MetaValue>> {
    let mut values = HashMap::new();

    meta_list.parse_nested_meta(|meta| {
        let key = meta
            .path
            .get_ident()
            .ok_or_else(|| meta.error("expected identifier"))?
            .to_string();

        if meta.input.peek(Token![=]) {
            meta.input.parse::<Token![=]>()?;

            if STRING_OPTIONS.contains(&key.as_str()) {
                let value: syn::LitStr = meta.input.parse()?;
                values.insert(key, MetaValue::Str(value));
            } else if EXPR_OPTIONS.contains(&key.as_str()) {
                let expr: syn::Expr = meta.input.parse()?;
                values.insert(key, MetaValue::Expr(expr));
            } else {
                return Err(meta.error(format!("unknown field option `{}`", key)));
            }
        } else if key == "optional" || KINDS.contains(&key.as_str()) {
            values.insert(key, MetaValue::Flag);
        } else {
            return Err(meta.error(format!("unknown field option `{}`", key)));
        }

        Ok(())
    })?;

    Ok(values)
}

/// Joined `///` comments of a field
fn doc_comment(attrs: &[Attribute]) -> Option<String> {
    let lines: Vec<String> = attrs
        .iter()
        .filter(|attr| attr.path().is_ident("doc"))
        .filter_map(|attr| match &attr.meta {
            Meta::NameValue(syn::MetaNameValue {
                value:
                    syn::Expr::Lit(syn::ExprLit {
                        lit: syn::Lit::Str(lit),
                        ..
                    }),
                ..
            }) => Some(lit.value().trim().to_string()),
            _ => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join(" "))
    }
}

fn parse_field_config(field: &syn::Field, attrs: &[Attribute]) -> syn::Result<FieldConfig> {
    // Find the #[field(...)] attribute
    let field_attr = attrs
        .iter()
        .find(|attr| attr.path().is_ident("field"))
        .ok_or_else(|| {
            syn::Error::new_spanned(
                field,
                "field must have a #[field(...)] attribute declaring its kind",
            )
        })?;

    // Parse it as a Meta::List
    let mut parsed = match &field_attr.meta {
        Meta::List(list) => parse_field_list(list)?,
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field attribute must be a list: #[field(int, env = \"...\", ...)]",
            ));
        }
    };

    let kinds: Vec<&str> = KINDS
        .iter()
        .copied()
        .filter(|kind| parsed.contains_key(*kind))
        .collect();
    let kind = match kinds.as_slice() {
        [kind] => kind.to_string(),
        [] => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must declare one kind: boolean, int, float, string, enumeration or object",
            ));
        }
        _ => {
            return Err(syn::Error::new_spanned(
                field_attr,
                "field must declare exactly one kind",
            ));
        }
    };

    let take_str = |parsed: &mut HashMap<String, MetaValue>, key: &str| match parsed.remove(key) {
        Some(MetaValue::Str(s)) => Some(s),
        _ => None,
    };
    let take_expr = |parsed: &mut HashMap<String, MetaValue>, key: &str| match parsed.remove(key) {
        Some(MetaValue::Expr(e)) => Some(e),
        _ => None,
    };

    let env = take_str(&mut parsed, "env");
    let description = take_str(&mut parsed, "doc")
        .map(|s| s.value().trim().to_string())
        .or_else(|| doc_comment(attrs));
    let matches = take_str(&mut parsed, "matches");
    let default = take_expr(&mut parsed, "default");
    let min = take_expr(&mut parsed, "min");
    let max = take_expr(&mut parsed, "max");
    let optional = parsed.contains_key("optional");

    let numeric = kind == "int" || kind == "float";
    if (min.is_some() || max.is_some()) && !numeric {
        return Err(syn::Error::new_spanned(
            field_attr,
            "min and max are only supported on int and float fields",
        ));
    }
    if matches.is_some() && kind != "string" {
        return Err(syn::Error::new_spanned(
            field_attr,
            "matches is only supported on string fields",
        ));
    }

    Ok(FieldConfig {
        kind,
        env,
        description,
        optional,
        default,
        min,
        max,
        matches,
    })
}

/// Extract the inner type from `Wrapper<T>`, returns (is_wrapper, inner_type)
fn extract_generic_arg<'a>(ty: &'a Type, wrapper: &str) -> (bool, &'a Type) {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == wrapper {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_ty)) = args.args.first() {
                        return (true, inner_ty);
                    }
                }
            }
        }
    }
    (false, ty)
}
