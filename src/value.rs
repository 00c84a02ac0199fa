//! Runtime values accepted by the logging verbs.
//!
//! Rust has no reflection, so composite values describe themselves through
//! the [`Composite`] trait: a type name plus an ordered list of [`Member`]s.
//! Everything else is either a JSON scalar or a container of other values.

use serde::Serialize;
use std::cell::BorrowError;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Declared accessibility of a member, used to qualify its output key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Protected => "protected",
            Visibility::Private => "private",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason a member value could not be read.
#[derive(thiserror::Error, Debug)]
pub enum MemberError {
    #[error("value is mutably borrowed elsewhere")]
    Borrowed(#[from] BorrowError),

    #[error("lock was poisoned by a panicking holder")]
    Poisoned,

    #[error("{0}")]
    Unavailable(String),
}

impl<T> From<std::sync::PoisonError<T>> for MemberError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        MemberError::Poisoned
    }
}

/// A single named member yielded by a [`Composite`].
#[derive(Debug)]
pub struct Member {
    pub name: String,
    pub visibility: Visibility,
    pub is_static: bool,
    pub value: Result<Value, MemberError>,
}

impl Member {
    pub fn new(name: impl Into<String>, visibility: Visibility, value: impl Into<Value>) -> Self {
        Member {
            name: name.into(),
            visibility,
            is_static: false,
            value: Ok(value.into()),
        }
    }

    pub fn public(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, Visibility::Public, value)
    }

    pub fn protected(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, Visibility::Protected, value)
    }

    pub fn private(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::new(name, Visibility::Private, value)
    }

    /// Member whose value comes from a fallible read, e.g. a `RefCell`
    /// borrow or a `Mutex` lock. A failed read is rendered as a placeholder.
    pub fn read<F>(name: impl Into<String>, visibility: Visibility, read: F) -> Self
    where
        F: FnOnce() -> Result<Value, MemberError>,
    {
        Member {
            name: name.into(),
            visibility,
            is_static: false,
            value: read(),
        }
    }

    /// Marks the member as belonging to the type rather than the instance.
    pub fn with_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Output key: `<visibility>[ static] <name>`.
    pub fn key(&self) -> String {
        let static_marker = if self.is_static { " static" } else { "" };
        format!("{}{} {}", self.visibility, static_marker, self.name)
    }
}

/// Capability implemented by types that should be logged member by member.
///
/// Implementations list their state in declaration order. Shared
/// composites are logged through an `Arc`, whose address is the identity
/// used for cycle detection.
pub trait Composite {
    /// Fully-qualified type name placed under `___class_name`.
    fn class_name(&self) -> String {
        std::any::type_name::<Self>().to_string()
    }

    fn members(&self) -> Vec<Member>;
}

/// An arbitrary application value handed to a logging verb.
#[derive(Clone)]
pub enum Value {
    /// Any JSON value, passed through untouched.
    Scalar(serde_json::Value),
    Sequence(Vec<Value>),
    Mapping(Vec<(String, Value)>),
    Object(Arc<dyn Composite>),
}

impl Value {
    pub fn null() -> Self {
        Value::Scalar(serde_json::Value::Null)
    }

    /// Wraps a shared composite.
    pub fn object<T: Composite + 'static>(object: &Arc<T>) -> Self {
        Value::Object(Arc::clone(object) as Arc<dyn Composite>)
    }

    /// Converts anything `Serialize` into a pass-through JSON value. A
    /// value serde refuses is replaced by a placeholder string.
    pub fn serialized<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(json) => Value::Scalar(json),
            Err(e) => Value::from(format!("unserializable value: {}", e)),
        }
    }

    /// Uses the `Debug` rendering of a value as a string scalar.
    pub fn debug<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Value::from(format!("{:?}", value))
    }

    /// Identity of a composite: the address of its shared allocation.
    pub(crate) fn identity(object: &Arc<dyn Composite>) -> usize {
        Arc::as_ptr(object) as *const () as usize
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Scalar(v) => write!(f, "Scalar({})", v),
            Value::Sequence(items) => f.debug_tuple("Sequence").field(items).finish(),
            Value::Mapping(entries) => f.debug_tuple("Mapping").field(entries).finish(),
            Value::Object(object) => write!(f, "Object({})", object.class_name()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        Value::Scalar(value)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::null()
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Scalar(value.into())
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::Scalar(value.as_str().into())
    }
}

macro_rules! from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    Value::Scalar(value.into())
                }
            }
        )*
    };
}

from_integer!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        // JSON has no NaN or infinity
        match serde_json::Number::from_f64(value) {
            Some(number) => Value::Scalar(serde_json::Value::Number(number)),
            None => Value::from(value.to_string()),
        }
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::from(f64::from(value))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Value::null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Value::Sequence(values.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value> + Clone> From<&[T]> for Value {
    fn from(values: &[T]) -> Self {
        Value::Sequence(values.iter().cloned().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for Value {
    fn from(map: BTreeMap<K, V>) -> Self {
        Value::Mapping(map.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<String> + Ord, V: Into<Value>> From<HashMap<K, V>> for Value {
    fn from(map: HashMap<K, V>) -> Self {
        // sorted so the encoded header does not depend on hash order
        let sorted: BTreeMap<K, V> = map.into_iter().collect();
        Value::from(sorted)
    }
}

impl<T: Composite + 'static> From<Arc<T>> for Value {
    fn from(object: Arc<T>) -> Self {
        Value::Object(object as Arc<dyn Composite>)
    }
}

impl<T: Composite + 'static> From<&Arc<T>> for Value {
    fn from(object: &Arc<T>) -> Self {
        Value::object(object)
    }
}

/// Builds a `Vec<Value>` from heterogeneous arguments.
///
/// ```
/// use chrome_console_log::console_args;
/// let args = console_args!["user", 42, true];
/// assert_eq!(args.len(), 3);
/// ```
#[macro_export]
macro_rules! console_args {
    () => {
        ::std::vec::Vec::<$crate::value::Value>::new()
    };
    ($($arg:expr),+ $(,)?) => {
        ::std::vec![$($crate::value::Value::from($arg)),+]
    };
}

/// Calls a logging verb with heterogeneous arguments.
///
/// ```ignore
/// console!(logger, info, "loaded", user);
/// console!(logger, group_end);
/// ```
#[macro_export]
macro_rules! console {
    ($logger:expr, group_end $(,)?) => {
        $logger.group_end()
    };
    ($logger:expr, group_end $(, $arg:expr)+ $(,)?) => {
        $logger.group_end_with($crate::console_args![$($arg),+])
    };
    ($logger:expr, $verb:ident $(, $arg:expr)* $(,)?) => {
        $logger.$verb($crate::console_args![$($arg),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Point;

    impl Composite for Point {
        fn members(&self) -> Vec<Member> {
            vec![Member::public("x", 1)]
        }
    }

    #[test]
    fn member_keys_are_visibility_qualified() {
        assert_eq!(Member::public("id", 1).key(), "public id");
        assert_eq!(Member::protected("cache", ()).key(), "protected cache");
        assert_eq!(
            Member::private("instances", 0).with_static().key(),
            "private static instances"
        );
    }

    #[test]
    fn default_class_name_is_fully_qualified() {
        assert!(Point.class_name().ends_with("value::tests::Point"));
    }

    #[test]
    fn non_finite_floats_become_strings() {
        match Value::from(f64::NAN) {
            Value::Scalar(v) => assert_eq!(v, json!("NaN")),
            other => panic!("unexpected {:?}", other),
        }
        match Value::from(1.5f32) {
            Value::Scalar(v) => assert_eq!(v, json!(1.5)),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn macro_builds_heterogeneous_arguments() {
        let point = Arc::new(Point);
        let args = console_args!["a", 1, Some(false), &point];
        assert_eq!(args.len(), 4);
        assert!(matches!(args[3], Value::Object(_)));
        assert!(console_args![].is_empty());
    }

    #[test]
    fn failed_reads_keep_the_error() {
        let cell = std::cell::RefCell::new(5);
        let _guard = cell.borrow_mut();
        let member = Member::read("count", Visibility::Private, || {
            Ok(Value::from(*cell.try_borrow()?))
        });
        assert!(matches!(member.value, Err(MemberError::Borrowed(_))));
    }

    #[test]
    fn poisoned_lock_is_reported() {
        let lock = Arc::new(std::sync::Mutex::new(1));
        let poisoner = Arc::clone(&lock);
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();

        let member = Member::read("value", Visibility::Protected, || {
            Ok(Value::from(*lock.lock()?))
        });
        assert!(matches!(member.value, Err(MemberError::Poisoned)));
    }
}
