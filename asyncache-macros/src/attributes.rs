//! Attribute parsing for `#[cache]` and `#[lru_cache]`.

use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{punctuated::Punctuated, Expr, Lit, MetaNameValue, Token};

/// Default capacity of `#[lru_cache]`, kept in step with
/// `asyncache_core::DEFAULT_MAXSIZE`.
const DEFAULT_MAXSIZE: usize = 128;

/// Parsed macro attributes.
pub struct CacheAttributes {
    /// `Option<usize>` expression passed to `CacheParameters::new`.
    pub maxsize: TokenStream2,
    pub typed: bool,
}

impl CacheAttributes {
    fn unbounded() -> Self {
        Self {
            maxsize: quote! { ::core::option::Option::None },
            typed: false,
        }
    }

    fn lru_default() -> Self {
        Self {
            maxsize: quote! { ::core::option::Option::Some(#DEFAULT_MAXSIZE) },
            typed: false,
        }
    }
}

fn error(tokens: impl quote::ToTokens, message: &str) -> TokenStream2 {
    syn::Error::new_spanned(tokens, message).to_compile_error()
}

/// Parse the `maxsize` attribute: a non-negative integer or `None`.
pub fn parse_maxsize_attribute(nv: &MetaNameValue) -> Result<TokenStream2, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Int(lit_int) => {
                let val = lit_int.base10_parse::<usize>().map_err(|_| {
                    error(lit_int, "`maxsize` must be a non-negative integer")
                })?;
                Ok(quote! { ::core::option::Option::Some(#val) })
            }
            other => Err(error(
                other,
                "Invalid literal for `maxsize`: expected integer or `None`",
            )),
        },
        Expr::Path(path) if path.path.is_ident("None") => {
            Ok(quote! { ::core::option::Option::None })
        }
        other => Err(error(
            other,
            "Invalid syntax for `maxsize`: expected `maxsize = <integer>` or `maxsize = None`",
        )),
    }
}

/// Parse the `typed` attribute
pub fn parse_typed_attribute(nv: &MetaNameValue) -> Result<bool, TokenStream2> {
    match &nv.value {
        Expr::Lit(expr_lit) => match &expr_lit.lit {
            Lit::Bool(lit_bool) => Ok(lit_bool.value),
            other => Err(error(other, "Invalid literal for `typed`: expected `true` or `false`")),
        },
        other => Err(error(
            other,
            "Invalid syntax for `typed`: expected `typed = true` or `typed = false`",
        )),
    }
}

fn parse_name_values(
    attr: TokenStream2,
) -> Result<Punctuated<MetaNameValue, Token![,]>, TokenStream2> {
    use syn::parse::Parser;

    let parser = Punctuated::<MetaNameValue, Token![,]>::parse_terminated;
    parser.parse2(attr).map_err(|e| {
        let msg = format!("Failed to parse attributes: {}", e);
        quote! { compile_error!(#msg); }
    })
}

/// Parse `#[cache(...)]` attributes. The cache is always unbounded, so only
/// `typed` is accepted.
pub fn parse_cache_attributes(attr: TokenStream2) -> Result<CacheAttributes, TokenStream2> {
    let mut attrs = CacheAttributes::unbounded();

    for nv in parse_name_values(attr)? {
        if nv.path.is_ident("typed") {
            attrs.typed = parse_typed_attribute(&nv)?;
        } else if nv.path.is_ident("maxsize") {
            return Err(error(
                &nv.path,
                "`#[cache]` is unbounded; use `#[lru_cache(maxsize = ...)]` for a bounded cache",
            ));
        } else {
            return Err(error(&nv.path, "Unknown attribute: expected `typed`"));
        }
    }

    Ok(attrs)
}

/// Parse `#[lru_cache(...)]` attributes.
pub fn parse_lru_cache_attributes(attr: TokenStream2) -> Result<CacheAttributes, TokenStream2> {
    let mut attrs = CacheAttributes::lru_default();

    for nv in parse_name_values(attr)? {
        if nv.path.is_ident("maxsize") {
            attrs.maxsize = parse_maxsize_attribute(&nv)?;
        } else if nv.path.is_ident("typed") {
            attrs.typed = parse_typed_attribute(&nv)?;
        } else {
            return Err(error(
                &nv.path,
                "Unknown attribute: expected `maxsize` or `typed`",
            ));
        }
    }

    Ok(attrs)
}
