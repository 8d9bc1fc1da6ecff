//! Cache key derivation.
//!
//! A [`CacheKey`] is built from the arguments of one call: positional
//! arguments in call order, then keyword arguments (see [`Kw`]) sorted by
//! name, then, for typed caches, the type of every argument in the same
//! order. Each argument is first normalized into an [`ArgValue`], which is
//! where unstable values (NaN, out-of-range integers) are rejected.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use crate::error::{ArgLocation, UnhashableArgumentError};

/// Normalized, hashable form of a single argument value.
///
/// Numeric values are folded so that equal numbers compare equal regardless
/// of their Rust type: every integer becomes [`ArgValue::Int`], `bool` becomes
/// `Int(0)` or `Int(1)`, and a float with an integral value (including `-0.0`)
/// becomes an `Int` too. Only non-integral or infinite floats keep
/// [`ArgValue::Float`], stored as their bit pattern. Typed keys still tell
/// these apart through their type names.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ArgValue {
    Unit,
    Int(i128),
    Float(u64),
    Char(char),
    Str(String),
    Seq(Vec<ArgValue>),
    Opt(Option<Box<ArgValue>>),
}

impl ArgValue {
    /// Normalizes a float, rejecting NaN.
    pub fn from_f64(value: f64, type_name: &'static str) -> Result<Self, UnhashableArgumentError> {
        if value.is_nan() {
            return Err(UnhashableArgumentError::new(
                type_name,
                "NaN is not equal to itself",
            ));
        }
        if value.fract() == 0.0 && value >= i128::MIN as f64 && value < i128::MAX as f64 {
            // -0.0 lands here as well and folds into Int(0)
            Ok(ArgValue::Int(value as i128))
        } else {
            Ok(ArgValue::Float(value.to_bits()))
        }
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Unit => f.write_str("()"),
            ArgValue::Int(value) => write!(f, "{}", value),
            ArgValue::Float(bits) => write!(f, "{:?}", f64::from_bits(*bits)),
            ArgValue::Char(value) => write!(f, "{:?}", value),
            ArgValue::Str(value) => write!(f, "{:?}", value),
            ArgValue::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            ArgValue::Opt(None) => f.write_str("None"),
            ArgValue::Opt(Some(value)) => write!(f, "Some({})", value),
        }
    }
}

/// Types that can take part in a cache key.
///
/// Implementors only need [`to_arg_value`](CacheArg::to_arg_value). The two
/// `push_*` methods decide how a value lays itself out in the argument list:
/// tuples spread their elements as separate positional arguments when used as
/// the top-level argument list, and [`Kw`] registers itself as a keyword.
///
/// # Examples
///
/// ```
/// use asyncache_core::{ArgValue, CacheArg, UnhashableArgumentError};
///
/// #[derive(Clone)]
/// struct UserId(u64);
///
/// impl CacheArg for UserId {
///     fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
///         Ok(ArgValue::Int(self.0 as i128))
///     }
/// }
///
/// assert_eq!(UserId(7).to_arg_value().unwrap(), ArgValue::Int(7));
/// ```
pub trait CacheArg {
    /// Converts the value into its normalized key representation.
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError>;

    /// Type tag recorded by typed caches.
    fn type_tag(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Registers this value as one argument of a call.
    fn push_argument(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        key.positional(self)
    }

    /// Registers this value as the complete argument list of a call.
    fn push_arguments(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        self.push_argument(key)
    }
}

/// A keyword argument.
///
/// Keyword arguments are sorted by name when the key is built, so
/// `(Kw("a", 1), Kw("b", 2))` and `(Kw("b", 2), Kw("a", 1))` produce the same
/// key. Passing the same name twice is rejected.
///
/// ```
/// use asyncache_core::{CacheKey, Kw};
///
/// let a = CacheKey::from_args(&(1, Kw("scale", 2), Kw("offset", 3)), false).unwrap();
/// let b = CacheKey::from_args(&(1, Kw("offset", 3), Kw("scale", 2)), false).unwrap();
/// assert_eq!(a, b);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Kw<T>(pub &'static str, pub T);

impl<T> Kw<T> {
    pub fn name(&self) -> &'static str {
        self.0
    }

    pub fn into_value(self) -> T {
        self.1
    }
}

impl<T: CacheArg> CacheArg for Kw<T> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Seq(vec![
            ArgValue::Str(self.0.to_string()),
            self.1.to_arg_value()?,
        ]))
    }

    fn type_tag(&self) -> &'static str {
        self.1.type_tag()
    }

    fn push_argument(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        key.keyword(self.0, &self.1)
    }
}

/// Accumulates normalized arguments and produces a [`CacheKey`].
pub struct KeyBuilder {
    typed: bool,
    positional: Vec<(ArgValue, &'static str)>,
    keywords: Vec<(&'static str, ArgValue, &'static str)>,
}

impl KeyBuilder {
    pub fn new(typed: bool) -> Self {
        Self {
            typed,
            positional: Vec::new(),
            keywords: Vec::new(),
        }
    }

    pub fn positional<T: CacheArg + ?Sized>(
        &mut self,
        value: &T,
    ) -> Result<(), UnhashableArgumentError> {
        let location = ArgLocation::Position(self.positional.len());
        let normalized = value.to_arg_value().map_err(|err| err.at(location))?;
        self.positional.push((normalized, value.type_tag()));
        Ok(())
    }

    pub fn keyword<T: CacheArg + ?Sized>(
        &mut self,
        name: &'static str,
        value: &T,
    ) -> Result<(), UnhashableArgumentError> {
        let location = ArgLocation::Keyword(name);
        if self.keywords.iter().any(|(existing, _, _)| *existing == name) {
            return Err(UnhashableArgumentError::new(
                value.type_tag(),
                "keyword argument given more than once",
            )
            .at(location));
        }
        let normalized = value.to_arg_value().map_err(|err| err.at(location))?;
        self.keywords.push((name, normalized, value.type_tag()));
        Ok(())
    }

    pub fn build(mut self) -> CacheKey {
        self.keywords.sort_by(|a, b| a.0.cmp(b.0));

        let types = if self.typed {
            self.positional
                .iter()
                .map(|(_, tag)| *tag)
                .chain(self.keywords.iter().map(|(_, _, tag)| *tag))
                .collect()
        } else {
            Vec::new()
        };

        CacheKey {
            positional: self.positional.into_iter().map(|(value, _)| value).collect(),
            keywords: self
                .keywords
                .into_iter()
                .map(|(name, value, _)| (name, value))
                .collect(),
            types,
        }
    }
}

/// Composite key identifying one call of a memoized function.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    positional: Vec<ArgValue>,
    keywords: Vec<(&'static str, ArgValue)>,
    types: Vec<&'static str>,
}

impl CacheKey {
    /// Derives the key for an argument list.
    ///
    /// A tuple is read as the full argument list (one positional argument per
    /// element, [`Kw`] elements as keywords); any other value is a single
    /// positional argument.
    ///
    /// # Examples
    ///
    /// ```
    /// use asyncache_core::CacheKey;
    ///
    /// // A lone value and a one-element tuple are the same call.
    /// assert_eq!(
    ///     CacheKey::from_args(&5u32, false).unwrap(),
    ///     CacheKey::from_args(&(5u32,), false).unwrap(),
    /// );
    ///
    /// // Untyped keys compare numbers by value; typed keys also by type.
    /// assert_eq!(
    ///     CacheKey::from_args(&(3i32,), false).unwrap(),
    ///     CacheKey::from_args(&(3.0f64,), false).unwrap(),
    /// );
    /// assert_ne!(
    ///     CacheKey::from_args(&(3i32,), true).unwrap(),
    ///     CacheKey::from_args(&(3.0f64,), true).unwrap(),
    /// );
    /// ```
    pub fn from_args<A: CacheArg + ?Sized>(
        args: &A,
        typed: bool,
    ) -> Result<Self, UnhashableArgumentError> {
        let mut builder = KeyBuilder::new(typed);
        args.push_arguments(&mut builder)?;
        Ok(builder.build())
    }

    pub fn positional(&self) -> &[ArgValue] {
        &self.positional
    }

    pub fn keywords(&self) -> &[(&'static str, ArgValue)] {
        &self.keywords
    }

    /// Type tags, empty unless the key was built for a typed cache.
    pub fn types(&self) -> &[&'static str] {
        &self.types
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        let mut first = true;
        for value in &self.positional {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}", value)?;
        }
        for (name, value) in &self.keywords {
            if !first {
                f.write_str(", ")?;
            }
            first = false;
            write!(f, "{}={}", name, value)?;
        }
        f.write_str(")")
    }
}

impl CacheArg for ArgValue {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(self.clone())
    }
}

impl CacheArg for () {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Unit)
    }

    fn push_arguments(&self, _key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        Ok(())
    }
}

impl CacheArg for bool {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Int(i128::from(*self)))
    }
}

impl CacheArg for char {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Char(*self))
    }
}

macro_rules! impl_cache_arg_for_int {
    ($($ty:ty)*) => {
        $(
            impl CacheArg for $ty {
                fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
                    Ok(ArgValue::Int(*self as i128))
                }
            }
        )*
    };
}

impl_cache_arg_for_int!(i8 i16 i32 i64 i128 isize u8 u16 u32 u64 usize);

impl CacheArg for u128 {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        i128::try_from(*self).map(ArgValue::Int).map_err(|_| {
            UnhashableArgumentError::new("u128", "value exceeds the normalized integer range")
        })
    }
}

impl CacheArg for f64 {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        ArgValue::from_f64(*self, "f64")
    }
}

impl CacheArg for f32 {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        ArgValue::from_f64(f64::from(*self), "f32")
    }
}

impl CacheArg for str {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Str(self.to_string()))
    }
}

impl CacheArg for String {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        Ok(ArgValue::Str(self.clone()))
    }
}

impl<T: CacheArg> CacheArg for [T] {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        seq(self.iter())
    }
}

impl<T: CacheArg, const N: usize> CacheArg for [T; N] {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        seq(self.iter())
    }
}

impl<T: CacheArg> CacheArg for Vec<T> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        seq(self.iter())
    }
}

impl<T: CacheArg> CacheArg for VecDeque<T> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        seq(self.iter())
    }
}

impl<T: CacheArg> CacheArg for BTreeSet<T> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        seq(self.iter())
    }
}

impl<K: CacheArg, V: CacheArg> CacheArg for BTreeMap<K, V> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        self.iter()
            .map(|(k, v)| Ok(ArgValue::Seq(vec![k.to_arg_value()?, v.to_arg_value()?])))
            .collect::<Result<Vec<_>, _>>()
            .map(ArgValue::Seq)
    }
}

impl<T: CacheArg> CacheArg for Option<T> {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        match self {
            Some(value) => Ok(ArgValue::Opt(Some(Box::new(value.to_arg_value()?)))),
            None => Ok(ArgValue::Opt(None)),
        }
    }
}

impl<T: CacheArg + ?Sized> CacheArg for &T {
    fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
        (**self).to_arg_value()
    }

    fn type_tag(&self) -> &'static str {
        (**self).type_tag()
    }

    fn push_argument(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        (**self).push_argument(key)
    }

    fn push_arguments(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
        (**self).push_arguments(key)
    }
}

macro_rules! impl_cache_arg_for_pointer {
    ($($ptr:ident)*) => {
        $(
            impl<T: CacheArg + ?Sized> CacheArg for $ptr<T> {
                fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
                    (**self).to_arg_value()
                }

                fn type_tag(&self) -> &'static str {
                    (**self).type_tag()
                }
            }
        )*
    };
}

impl_cache_arg_for_pointer!(Box Rc Arc);

fn seq<'a, T, I>(items: I) -> Result<ArgValue, UnhashableArgumentError>
where
    T: CacheArg + 'a,
    I: Iterator<Item = &'a T>,
{
    items
        .map(CacheArg::to_arg_value)
        .collect::<Result<Vec<_>, _>>()
        .map(ArgValue::Seq)
}

macro_rules! impl_cache_arg_for_tuple {
    ($($ty:ident $var:ident),+) => {
        impl<$($ty: CacheArg),+> CacheArg for ($($ty,)+) {
            fn to_arg_value(&self) -> Result<ArgValue, UnhashableArgumentError> {
                let ($($var,)+) = self;
                Ok(ArgValue::Seq(vec![$($var.to_arg_value()?),+]))
            }

            fn push_arguments(&self, key: &mut KeyBuilder) -> Result<(), UnhashableArgumentError> {
                let ($($var,)+) = self;
                $($var.push_argument(key)?;)+
                Ok(())
            }
        }
    };
}

impl_cache_arg_for_tuple!(A a);
impl_cache_arg_for_tuple!(A a, B b);
impl_cache_arg_for_tuple!(A a, B b, C c);
impl_cache_arg_for_tuple!(A a, B b, C c, D d);
impl_cache_arg_for_tuple!(A a, B b, C c, D d, E e);
impl_cache_arg_for_tuple!(A a, B b, C c, D d, E e, F f);
impl_cache_arg_for_tuple!(A a, B b, C c, D d, E e, F f, G g);
impl_cache_arg_for_tuple!(A a, B b, C c, D d, E e, F f, G g, H h);
