//! Attribute macros for asyncache.
//!
//! Use them through the `asyncache` crate, which re-exports both attributes
//! along with the runtime types the generated code refers to.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{FnArg, ItemFn, Pat, ReturnType, Type};

mod attributes;

use attributes::{parse_cache_attributes, parse_lru_cache_attributes, CacheAttributes};

/// Memoizes an `async fn` in an unbounded cache.
///
/// The function keeps its signature. Calls with equal arguments share one
/// computation: the body runs once per distinct argument list and its output,
/// `Err` values included, is cloned to every caller from then on.
///
/// # Requirements
///
/// - **Free `async fn`**: the cache is a `static` next to the function, so
///   associated functions inside an `impl` block do not compile. Methods with
///   a receiver and generic functions are rejected
/// - **Owned arguments**: at most 8, each implementing `CacheArg` and
///   `Send + 'static`; references are rejected
/// - **Return type**: `Clone + Send + Sync + 'static`
/// - **Body**: the returned future must be `Send`
///
/// # Macro Parameters
///
/// - `typed` (optional): when `true`, arguments of different types are cached
///   separately. Default: `false`.
///
/// # Generated Items
///
/// Besides the function itself, `#[cache]` on `fn name` generates
/// `name_cache_info()`, `name_cache_clear()` and `name_cache_parameters()`
/// with the visibility of the function.
///
/// # Examples
///
/// ```ignore
/// use asyncache::cache;
///
/// #[cache]
/// async fn fetch_user(id: u64) -> User {
///     tokio::time::sleep(Duration::from_secs(1)).await;
///     User { id, name: format!("User {}", id) }
/// }
///
/// fetch_user(1).await;
/// fetch_user(1).await;
/// assert_eq!(fetch_user_cache_info().hits, 1);
/// ```
///
/// Arguments that cannot form a cache key (a NaN float, for instance) do not
/// fail the call: a warning is logged and the body runs uncached.
#[proc_macro_attribute]
pub fn cache(attr: TokenStream, item: TokenStream) -> TokenStream {
    let expanded = parse_cache_attributes(attr.into())
        .and_then(|attrs| expand_memoized(attrs, item.into()));
    TokenStream::from(expanded.unwrap_or_else(|err| err))
}

/// Memoizes an `async fn` in a least-recently-used cache.
///
/// Same contract and generated items as [`macro@cache`], with a bounded
/// capacity: inserting a new key into a full cache first evicts the key used
/// least recently.
///
/// # Macro Parameters
///
/// - `maxsize` (optional): capacity of the cache, or `None` for unbounded.
///   Default: `128`. `maxsize = 0` disables caching.
/// - `typed` (optional): cache arguments of different types separately.
///   Default: `false`.
///
/// # Examples
///
/// ```ignore
/// use asyncache::lru_cache;
///
/// #[lru_cache(maxsize = 2)]
/// async fn square(x: u32) -> u32 {
///     x * x
/// }
///
/// square(1).await;
/// square(2).await;
/// square(3).await; // evicts 1
/// assert_eq!(square_cache_info().currsize, 2);
/// ```
#[proc_macro_attribute]
pub fn lru_cache(attr: TokenStream, item: TokenStream) -> TokenStream {
    let expanded = parse_lru_cache_attributes(attr.into())
        .and_then(|attrs| expand_memoized(attrs, item.into()));
    TokenStream::from(expanded.unwrap_or_else(|err| err))
}

/// Largest argument list with a `CacheArg` impl for its tuple.
const MAX_ARGUMENTS: usize = 8;

fn error(tokens: impl quote::ToTokens, message: &str) -> TokenStream2 {
    syn::Error::new_spanned(tokens, message).to_compile_error()
}

/// Rewrites `item` into a wrapper around a static memoizer.
///
/// For `async fn name(a: A, b: B) -> R { body }` this produces:
///
/// - `__asyncache_name_uncached`, the original function under a hidden name
/// - `__ASYNCACHE_NAME`, a lazily built `AsyncMemoizer<(A, B), R>`
/// - `name`, with the original signature, delegating to the memoizer
/// - the `name_cache_*` companions
fn expand_memoized(attrs: CacheAttributes, item: TokenStream2) -> Result<TokenStream2, TokenStream2> {
    let input: ItemFn = syn::parse2(item).map_err(|e| e.to_compile_error())?;

    let fn_attrs = &input.attrs;
    let vis = &input.vis;
    let sig = &input.sig;
    let block = &input.block;
    let fn_name = &sig.ident;

    if sig.asyncness.is_none() {
        return Err(error(
            &sig.fn_token,
            "memoization attributes can only be applied to `async fn`",
        ));
    }
    if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
        return Err(error(
            &sig.generics,
            "memoized functions cannot be generic",
        ));
    }
    if let Some(unsafety) = &sig.unsafety {
        return Err(error(unsafety, "memoized functions cannot be `unsafe`"));
    }
    if let Some(variadic) = &sig.variadic {
        return Err(error(variadic, "memoized functions cannot be variadic"));
    }
    if sig.inputs.len() > MAX_ARGUMENTS {
        return Err(error(
            &sig.inputs,
            "memoized functions take at most 8 arguments; group the rest into a tuple or struct",
        ));
    }

    let ret_type = match &sig.output {
        ReturnType::Default => quote! { () },
        ReturnType::Type(_, ty) => quote! { #ty },
    };

    // Argument names in the wrapper, and their types
    let mut arg_names = Vec::new();
    let mut arg_types = Vec::new();

    for (index, arg) in sig.inputs.iter().enumerate() {
        match arg {
            FnArg::Receiver(receiver) => {
                return Err(error(
                    receiver,
                    "memoized functions cannot take `self`; memoize a free function outside the `impl` block instead",
                ));
            }
            FnArg::Typed(pat_type) => {
                check_owned(&pat_type.ty)?;
                let name = match &*pat_type.pat {
                    Pat::Ident(pat_ident)
                        if pat_ident.by_ref.is_none() && pat_ident.subpat.is_none() =>
                    {
                        pat_ident.ident.clone()
                    }
                    _ => format_ident!("__arg{}", index),
                };
                arg_names.push(name);
                arg_types.push(&*pat_type.ty);
            }
        }
    }

    let uncached_ident = format_ident!("__asyncache_{}_uncached", fn_name);
    let memoizer_ident = format_ident!(
        "__ASYNCACHE_{}",
        fn_name.to_string().trim_start_matches("r#").to_uppercase()
    );
    let info_ident = format_ident!("{}_cache_info", fn_name);
    let clear_ident = format_ident!("{}_cache_clear", fn_name);
    let parameters_ident = format_ident!("{}_cache_parameters", fn_name);

    let mut uncached_sig = sig.clone();
    uncached_sig.ident = uncached_ident.clone();

    let maxsize = &attrs.maxsize;
    let typed = attrs.typed;

    let expanded = quote! {
        #[doc(hidden)]
        #[allow(non_snake_case, clippy::too_many_arguments)]
        #uncached_sig #block

        #[doc(hidden)]
        #[allow(non_upper_case_globals)]
        static #memoizer_ident: ::asyncache::once_cell::sync::Lazy<
            ::asyncache::AsyncMemoizer<(#(#arg_types,)*), #ret_type>,
        > = ::asyncache::once_cell::sync::Lazy::new(|| {
            ::asyncache::CacheParameters::new(#maxsize)
                .typed(#typed)
                .decorate(|(#(#arg_names,)*): (#(#arg_types,)*)| {
                    #uncached_ident(#(#arg_names),*)
                })
        });

        #(#fn_attrs)*
        #vis async fn #fn_name(#(#arg_names: #arg_types),*) -> #ret_type {
            #memoizer_ident.call_or_bypass((#(#arg_names,)*)).await
        }

        /// Hits, misses, capacity and current size of the cache.
        #[allow(dead_code)]
        #vis fn #info_ident() -> ::asyncache::CacheInfo {
            #memoizer_ident.cache_info()
        }

        /// Empties the cache and resets its statistics.
        #[allow(dead_code)]
        #vis fn #clear_ident() {
            #memoizer_ident.cache_clear()
        }

        /// Parameters the cache was configured with.
        #[allow(dead_code)]
        #vis fn #parameters_ident() -> ::asyncache::CacheParameters {
            #memoizer_ident.cache_parameters()
        }
    };

    Ok(expanded)
}

/// Rejects argument types that borrow, since the memoizer keeps arguments
/// alive inside a `'static` computation.
fn check_owned(ty: &Type) -> Result<(), TokenStream2> {
    match ty {
        Type::Reference(_) => Err(error(
            ty,
            "memoized functions take owned arguments; pass `String` or `Vec<T>` instead of a reference",
        )),
        Type::ImplTrait(_) => Err(error(
            ty,
            "memoized functions cannot take `impl Trait` arguments",
        )),
        Type::Paren(inner) => check_owned(&inner.elem),
        Type::Group(inner) => check_owned(&inner.elem),
        Type::Tuple(tuple) => tuple.elems.iter().try_for_each(check_owned),
        Type::Array(array) => check_owned(&array.elem),
        _ => Ok(()),
    }
}
