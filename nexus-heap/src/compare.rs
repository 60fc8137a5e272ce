//! Fallible ordering for heap elements.
//!
//! Every element stored in a [`Heap`](crate::Heap) implements [`Comparable`].
//! Unlike [`Ord`], a comparison may fail: floats can be unordered, and
//! [`DynValue`] can hold values of different concrete types. Containers treat
//! a failed comparison as a recoverable condition.

use std::any::{Any, type_name};
use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// Error returned when two elements cannot be ordered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompareError {
    /// The operands have different concrete types.
    #[error("type mismatch: cannot compare `{left}` with `{right}`")]
    TypeMismatch {
        /// Type of the receiver.
        left: &'static str,
        /// Type of the argument.
        right: &'static str,
    },

    /// The operands have no defined order (e.g. a NaN float).
    #[error("values are unordered")]
    Unordered,

    /// Caller-defined comparison failure.
    #[error("{0}")]
    Other(String),
}

/// A value with a fallible strict "less than".
///
/// # Example
///
/// ```
/// use nexus_heap::{CompareError, Comparable};
///
/// struct Version(u32, u32);
///
/// impl Comparable for Version {
///     fn less(&self, other: &Self) -> Result<bool, CompareError> {
///         Ok((self.0, self.1) < (other.0, other.1))
///     }
/// }
///
/// assert_eq!(Version(1, 2).less(&Version(1, 3)), Ok(true));
/// ```
pub trait Comparable {
    /// Returns `Ok(true)` if `self` orders strictly before `other`.
    fn less(&self, other: &Self) -> Result<bool, CompareError>;
}

macro_rules! impl_comparable_for_ord {
    ($($ty:ty),*) => {
        $(
            impl Comparable for $ty {
                #[inline]
                fn less(&self, other: &Self) -> Result<bool, CompareError> {
                    Ok(self < other)
                }
            }
        )*
    };
}

impl_comparable_for_ord!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, bool, char, String, &str
);

macro_rules! impl_comparable_for_float {
    ($($ty:ty),*) => {
        $(
            impl Comparable for $ty {
                #[inline]
                fn less(&self, other: &Self) -> Result<bool, CompareError> {
                    self.partial_cmp(other)
                        .map(|ord| ord.is_lt())
                        .ok_or(CompareError::Unordered)
                }
            }
        )*
    };
}

impl_comparable_for_float!(f32, f64);

impl<T: Comparable> Comparable for Reverse<T> {
    #[inline]
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        other.0.less(&self.0)
    }
}

impl<T: Comparable> Comparable for Box<T> {
    #[inline]
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        (**self).less(&**other)
    }
}

impl<T: Comparable> Comparable for Arc<T> {
    #[inline]
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        (**self).less(&**other)
    }
}

/// Adapts any [`Ord`] type to [`Comparable`].
///
/// ```
/// use nexus_heap::{Comparable, Ordered};
///
/// assert_eq!(Ordered((1, "b")).less(&Ordered((2, "a"))), Ok(true));
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ordered<T>(pub T);

impl<T: Ord> Comparable for Ordered<T> {
    #[inline]
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        Ok(self.0 < other.0)
    }
}

// =============================================================================
// Heterogeneous values
// =============================================================================

/// Object-safe form of [`Comparable`] used by [`DynValue`].
///
/// Implemented for every `Comparable` type that is `'static + Send + Sync + Debug`.
pub trait DynComparable: Any + Send + Sync + fmt::Debug {
    /// Compares against a value of unknown concrete type.
    fn less_dyn(&self, other: &dyn DynComparable) -> Result<bool, CompareError>;

    /// Upcast for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Name of the concrete type.
    fn type_name(&self) -> &'static str;
}

impl<T> DynComparable for T
where
    T: Comparable + Any + Send + Sync + fmt::Debug,
{
    fn less_dyn(&self, other: &dyn DynComparable) -> Result<bool, CompareError> {
        match other.as_any().downcast_ref::<T>() {
            Some(other) => self.less(other),
            None => Err(CompareError::TypeMismatch {
                left: type_name::<T>(),
                right: other.type_name(),
            }),
        }
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn type_name(&self) -> &'static str {
        type_name::<T>()
    }
}

/// A boxed value of any [`DynComparable`] type.
///
/// Use this when one container deliberately mixes element types. Comparing two
/// `DynValue`s of different concrete types fails with
/// [`CompareError::TypeMismatch`].
///
/// ```
/// use nexus_heap::{Comparable, CompareError, DynValue};
///
/// let a = DynValue::new(3i64);
/// let b = DynValue::new(String::from("three"));
///
/// assert_eq!(a.less(&DynValue::new(4i64)), Ok(true));
/// assert!(matches!(a.less(&b), Err(CompareError::TypeMismatch { .. })));
/// assert_eq!(a.downcast_ref::<i64>(), Some(&3));
/// ```
#[derive(Debug)]
pub struct DynValue(Box<dyn DynComparable>);

impl DynValue {
    /// Boxes `value`.
    pub fn new<T: DynComparable>(value: T) -> Self {
        Self(Box::new(value))
    }

    /// Returns the wrapped value if it is a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref()
    }

    /// Returns `true` if the wrapped value is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    /// Name of the wrapped value's concrete type.
    pub fn type_name(&self) -> &'static str {
        self.0.type_name()
    }
}

impl Comparable for DynValue {
    #[inline]
    fn less(&self, other: &Self) -> Result<bool, CompareError> {
        (*self.0).less_dyn(&*other.0)
    }
}
