use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Kind tag of a [`Field`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Kind {
    Any,
    I32,
    I64,
    F32,
    F64,
    Bool,
}

/// A tagged scalar used for blackboard values and expression results.
///
/// Numeric reads widen (`I32 -> I64 -> F64`, `F32 -> F64`, numeric -> bool as
/// `value != 0`); narrowing reads return `None`. The `Any` variant carries an
/// opaque payload for host data that does not fit the numeric model; it is
/// inspected with [`Field::as_any`].
#[derive(Clone)]
pub enum Field {
    Any(Rc<dyn Any>),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Bool(bool),
}

impl Field {
    /// Wraps an opaque host value.
    pub fn any<T: 'static>(value: T) -> Field {
        Field::Any(Rc::new(value))
    }

    /// The inert value: an `Any` payload nothing can be extracted from.
    pub fn unit() -> Field {
        Field::any(())
    }

    pub fn kind(&self) -> Kind {
        match self {
            Field::Any(_) => Kind::Any,
            Field::I32(_) => Kind::I32,
            Field::I64(_) => Kind::I64,
            Field::F32(_) => Kind::F32,
            Field::F64(_) => Kind::F64,
            Field::Bool(_) => Kind::Bool,
        }
    }

    /// Exact read; `I32` only.
    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Field::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Field::I64(v) => Some(v),
            Field::I32(v) => Some(i64::from(v)),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Field::F32(v) => Some(v),
            Field::I32(v) => Some(v as f32),
            Field::I64(v) => Some(v as f32),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Field::F64(v) => Some(v),
            Field::F32(v) => Some(f64::from(v)),
            Field::I32(v) => Some(f64::from(v)),
            Field::I64(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Any numeric reads as `value != 0`; `Any` fails.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Field::Bool(v) => Some(v),
            Field::I32(v) => Some(v != 0),
            Field::I64(v) => Some(v != 0),
            Field::F32(v) => Some(v != 0.0),
            Field::F64(v) => Some(v != 0.0),
            Field::Any(_) => None,
        }
    }

    /// Typed extraction from the `Any` variant.
    pub fn as_any<T: 'static>(&self) -> Option<&T> {
        match self {
            Field::Any(v) => v.as_ref().downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Any(_) => f.write_str("Any(..)"),
            Field::I32(v) => write!(f, "I32({v})"),
            Field::I64(v) => write!(f, "I64({v})"),
            Field::F32(v) => write!(f, "F32({v})"),
            Field::F64(v) => write!(f, "F64({v})"),
            Field::Bool(v) => write!(f, "Bool({v})"),
        }
    }
}

impl From<i32> for Field {
    fn from(v: i32) -> Self {
        Field::I32(v)
    }
}

impl From<i64> for Field {
    fn from(v: i64) -> Self {
        Field::I64(v)
    }
}

impl From<f32> for Field {
    fn from(v: f32) -> Self {
        Field::F32(v)
    }
}

impl From<f64> for Field {
    fn from(v: f64) -> Self {
        Field::F64(v)
    }
}

impl From<bool> for Field {
    fn from(v: bool) -> Self {
        Field::Bool(v)
    }
}
