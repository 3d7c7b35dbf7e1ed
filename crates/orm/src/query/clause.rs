//! Clause model - the shapes a condition can take and the arguments it binds

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use crate::backends::{DatabaseValue, Valuer};
use crate::schema::{DynRecord, Record};

/// Condition input, one variant per supported shape
#[derive(Clone)]
pub enum Query {
    /// Raw SQL fragment with `?` placeholders, or a numeric primary key as text
    Text(String),
    /// Primary key value
    Number(i64),
    /// Primary key IN-list
    List(Vec<DatabaseValue>),
    /// Column to value equality, rendered in key order
    Map(BTreeMap<String, DatabaseValue>),
    /// Equality over every non-blank column of a record
    Record(Arc<dyn DynRecord>),
}

impl Query {
    /// Condition over the non-blank columns of `record`
    pub fn record<R: Record>(record: R) -> Self {
        Query::Record(Arc::new(record))
    }

    /// Column to value equality from any key/value pairs
    pub fn map<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<DatabaseValue>,
    {
        Query::Map(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Query::Number(n) => f.debug_tuple("Number").field(n).finish(),
            Query::List(values) => f.debug_tuple("List").field(values).finish(),
            Query::Map(map) => f.debug_tuple("Map").field(map).finish(),
            Query::Record(record) => f.debug_tuple("Record").field(record).finish(),
        }
    }
}

impl From<&str> for Query {
    fn from(value: &str) -> Self {
        Query::Text(value.to_string())
    }
}

impl From<String> for Query {
    fn from(value: String) -> Self {
        Query::Text(value)
    }
}

macro_rules! number_query {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Query {
                fn from(value: $ty) -> Self {
                    Query::Number(value as i64)
                }
            }
        )*
    };
}

number_query!(i8, i16, i32, i64, u8, u16, u32);

impl<T: Into<DatabaseValue>> From<Vec<T>> for Query {
    fn from(values: Vec<T>) -> Self {
        Query::List(values.into_iter().map(Into::into).collect())
    }
}

impl<V: Into<DatabaseValue>> From<BTreeMap<String, V>> for Query {
    fn from(map: BTreeMap<String, V>) -> Self {
        Query::map(map)
    }
}

impl<V: Into<DatabaseValue>> From<HashMap<String, V>> for Query {
    fn from(map: HashMap<String, V>) -> Self {
        Query::map(map)
    }
}

impl From<Arc<dyn DynRecord>> for Query {
    fn from(record: Arc<dyn DynRecord>) -> Self {
        Query::Record(record)
    }
}

/// Value bound to a placeholder
#[derive(Debug, Clone)]
pub enum Argument {
    /// Plain value; an array expands to one marker per element
    Value(DatabaseValue),
    /// Value converted through [`Valuer`] right before binding
    Encoded(Arc<dyn Valuer>),
}

impl Argument {
    pub fn encoded<V: Valuer + 'static>(value: V) -> Self {
        Argument::Encoded(Arc::new(value))
    }

    /// Storable value; a failing encoder binds NULL
    pub fn resolve(&self) -> DatabaseValue {
        match self {
            Argument::Value(value) => value.clone(),
            Argument::Encoded(valuer) => match valuer.value() {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!("Failed to encode argument {:?}, binding NULL: {}", valuer, e);
                    DatabaseValue::Null
                }
            },
        }
    }
}

macro_rules! value_argument {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Argument {
                fn from(value: $ty) -> Self {
                    Argument::Value(value.into())
                }
            }
        )*
    };
}

value_argument!(
    DatabaseValue,
    bool,
    i8,
    i16,
    i32,
    i64,
    u16,
    u32,
    f32,
    f64,
    String,
    &str,
    Vec<u8>,
    uuid::Uuid,
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveDate,
    chrono::NaiveTime,
    serde_json::Value
);

impl<T: Into<DatabaseValue>> From<Option<T>> for Argument {
    fn from(value: Option<T>) -> Self {
        Argument::Value(value.into())
    }
}

/// Build a `Vec<Argument>` from heterogeneous values
#[macro_export]
macro_rules! args {
    () => { ::std::vec::Vec::<$crate::query::Argument>::new() };
    ($($arg:expr),+ $(,)?) => {
        vec![$($crate::query::Argument::from($arg)),+]
    };
}

/// One condition with its arguments
#[derive(Debug, Clone)]
pub struct Clause {
    pub query: Query,
    pub args: Vec<Argument>,
}

impl Clause {
    pub fn new(query: impl Into<Query>, args: Vec<Argument>) -> Self {
        Self {
            query: query.into(),
            args,
        }
    }
}

/// Projection of a SELECT
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Text(String),
    Columns(Vec<String>),
}

impl From<&str> for Selection {
    fn from(value: &str) -> Self {
        Selection::Text(value.to_string())
    }
}

impl From<String> for Selection {
    fn from(value: String) -> Self {
        Selection::Text(value)
    }
}

impl From<Vec<String>> for Selection {
    fn from(columns: Vec<String>) -> Self {
        Selection::Columns(columns)
    }
}

impl From<Vec<&str>> for Selection {
    fn from(columns: Vec<&str>) -> Self {
        Selection::Columns(columns.into_iter().map(str::to_string).collect())
    }
}

/// A projection with its arguments
#[derive(Debug, Clone)]
pub struct SelectClause {
    pub selection: Selection,
    pub args: Vec<Argument>,
}
