use proc_macro2::TokenStream as TokenStream2;
use quote::{ToTokens, quote};
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Error, Field, Fields, Ident, LitStr, Type};

/// Field-level options parsed from `#[env(...)]`.
#[derive(Default)]
struct FieldOpts {
    var: Option<LitStr>,
    secret: bool,
    nested: bool,
    skip: bool,
}

/// How a field is bound.
enum Shape {
    Leaf(LitStr),
    Nested,
    Skipped,
}

struct BoundField<'a> {
    ident: &'a Ident,
    ty: &'a Type,
    secret: bool,
    shape: Shape,
}

pub fn generate_impl(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let type_name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(Error::new(
            input.generics.span(),
            "EnvBind cannot be derived for generic structs",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => &named.named,
            _ => {
                return Err(Error::new(
                    type_name.span(),
                    "EnvBind requires a struct with named fields",
                ));
            }
        },
        _ => {
            return Err(Error::new(
                type_name.span(),
                "EnvBind can only be derived for structs",
            ));
        }
    };

    let bound = fields
        .iter()
        .map(classify_field)
        .collect::<syn::Result<Vec<_>>>()?;

    let descriptors = bound.iter().map(generate_descriptor);
    let steps = bound
        .iter()
        .enumerate()
        .map(|(index, field)| generate_step(index, field));

    Ok(quote! {
        impl ::layercfg::EnvBind for #type_name {
            fn env_fields() -> &'static [::layercfg::FieldDescriptor] {
                static FIELDS: &[::layercfg::FieldDescriptor] = &[#(#descriptors),*];
                FIELDS
            }

            #[allow(unused_variables)]
            fn bind_env(
                &mut self,
                env: &dyn ::layercfg::EnvSource,
            ) -> ::core::result::Result<(), ::layercfg::ConfigError> {
                let fields = <#type_name as ::layercfg::EnvBind>::env_fields();
                #(#steps)*
                ::core::result::Result::Ok(())
            }
        }
    })
}

fn parse_field_opts(field: &Field) -> syn::Result<FieldOpts> {
    let mut opts = FieldOpts::default();

    for attr in field.attrs.iter().filter(|attr| attr.path().is_ident("env")) {
        attr.parse_nested_meta(|meta| {
            if meta.path.is_ident("var") {
                let name: LitStr = meta.value()?.parse()?;
                if name.value().trim().is_empty() {
                    return Err(Error::new(name.span(), "env var name must not be empty"));
                }
                opts.var = Some(name);
                Ok(())
            } else if meta.path.is_ident("secret") {
                opts.secret = true;
                Ok(())
            } else if meta.path.is_ident("nested") {
                opts.nested = true;
                Ok(())
            } else if meta.path.is_ident("skip") {
                opts.skip = true;
                Ok(())
            } else {
                Err(meta.error("unsupported env attribute, expected `var`, `secret`, `nested` or `skip`"))
            }
        })?;
    }

    Ok(opts)
}

fn classify_field(field: &Field) -> syn::Result<BoundField<'_>> {
    let opts = parse_field_opts(field)?;
    let span = field.span();

    let exclusive = [opts.var.is_some(), opts.nested, opts.skip]
        .iter()
        .filter(|set| **set)
        .count();
    if exclusive > 1 {
        return Err(Error::new(
            span,
            "`var`, `nested` and `skip` are mutually exclusive",
        ));
    }
    if opts.secret && opts.var.is_none() {
        return Err(Error::new(span, "`secret` requires `var = \"NAME\"`"));
    }

    let shape = match opts.var {
        Some(name) => Shape::Leaf(name),
        None if opts.nested => Shape::Nested,
        None if opts.skip || is_leaf_type(&field.ty) => Shape::Skipped,
        None => Shape::Nested,
    };

    let ident = field
        .ident
        .as_ref()
        .ok_or_else(|| Error::new(span, "EnvBind requires named fields"))?;

    Ok(BoundField {
        ident,
        ty: &field.ty,
        secret: opts.secret,
        shape,
    })
}

fn generate_descriptor(field: &BoundField<'_>) -> TokenStream2 {
    let name = field.ident.to_string();
    let type_name = type_display(field.ty);
    let secret = field.secret;
    let ty = field.ty;

    let (env_var, shape) = match &field.shape {
        Shape::Leaf(var) => (
            quote!(::core::option::Option::Some(#var)),
            quote!(::layercfg::FieldShape::Leaf),
        ),
        Shape::Nested => (
            quote!(::core::option::Option::None),
            quote!(::layercfg::FieldShape::Nested(
                <#ty as ::layercfg::EnvBind>::env_fields
            )),
        ),
        Shape::Skipped => (
            quote!(::core::option::Option::None),
            quote!(::layercfg::FieldShape::Skipped),
        ),
    };

    quote! {
        ::layercfg::FieldDescriptor {
            name: #name,
            type_name: #type_name,
            env_var: #env_var,
            secret: #secret,
            shape: #shape,
        }
    }
}

fn generate_step(index: usize, field: &BoundField<'_>) -> TokenStream2 {
    let ident = field.ident;
    match field.shape {
        Shape::Leaf(_) => quote! {
            ::layercfg::bind_leaf(&mut self.#ident, &fields[#index], env)?;
        },
        Shape::Nested => quote! {
            ::layercfg::EnvBind::bind_env(&mut self.#ident, env)?;
        },
        Shape::Skipped => TokenStream2::new(),
    }
}

/// Render a type the way it is usually written (`Option<u16>`, not `Option < u16 >`).
fn type_display(ty: &Type) -> String {
    ty.to_token_stream()
        .to_string()
        .replace(" :: ", "::")
        .replace(" < ", "<")
        .replace("< ", "<")
        .replace(" <", "<")
        .replace(" >", ">")
        .replace(" ,", ",")
}

/// Check if a type is a value type that doesn't need nested expansion.
fn is_leaf_type(ty: &Type) -> bool {
    let Type::Path(type_path) = ty else {
        // References, arrays, tuples and the like are never nested configs.
        return true;
    };
    let Some(segment) = type_path.path.segments.last() else {
        return true;
    };

    matches!(
        segment.ident.to_string().as_str(),
        "bool"
            | "char"
            | "u8"
            | "u16"
            | "u32"
            | "u64"
            | "u128"
            | "usize"
            | "i8"
            | "i16"
            | "i32"
            | "i64"
            | "i128"
            | "isize"
            | "f32"
            | "f64"
            | "String"
            | "str"
            | "PathBuf"
            | "OsString"
            | "Option"
            | "Vec"
            | "VecDeque"
            | "HashMap"
            | "BTreeMap"
            | "HashSet"
            | "BTreeSet"
            | "Duration"
            | "Value"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(source: &str) -> Type {
        syn::parse_str(source).unwrap()
    }

    #[test]
    fn test_primitive_and_std_types_are_leaves() {
        for source in ["u16", "String", "Option<u16>", "Vec<String>", "std::path::PathBuf"] {
            assert!(is_leaf_type(&ty(source)), "{source} should be a leaf");
        }
    }

    #[test]
    fn test_custom_types_are_nested() {
        assert!(!is_leaf_type(&ty("MysqlConfiguration")));
        assert!(!is_leaf_type(&ty("crate::redis::RedisConfiguration")));
    }

    #[test]
    fn test_type_display_removes_token_spacing() {
        assert_eq!(type_display(&ty("Option<u16>")), "Option<u16>");
        assert_eq!(type_display(&ty("std::path::PathBuf")), "std::path::PathBuf");
        assert_eq!(type_display(&ty("HashMap<String, u8>")), "HashMap<String, u8>");
    }

    #[test]
    fn test_rejects_enums() {
        let input: DeriveInput = syn::parse_str("enum Mode { A, B }").unwrap();
        assert!(generate_impl(&input).is_err());
    }

    #[test]
    fn test_rejects_conflicting_attributes() {
        let input: DeriveInput =
            syn::parse_str(r#"struct C { #[env(var = "X", skip)] port: u16 }"#).unwrap();
        let err = generate_impl(&input).unwrap_err();
        assert!(err.to_string().contains("mutually exclusive"));
    }

    #[test]
    fn test_rejects_secret_without_var() {
        let input: DeriveInput =
            syn::parse_str(r#"struct C { #[env(secret)] password: String }"#).unwrap();
        assert!(generate_impl(&input).is_err());
    }
}
