//! Engine-neutral query execution.
//!
//! Adapters never touch a driver directly: they hand a [`Query`] to a
//! [`Session`] and read back [`Row`]s of [`Value`] cells. Real sessions wrap
//! `postgres::Client`, `mysql::Conn` and `oracle::Connection`; tests use
//! [`MockSession`](super::mock::MockSession).

/// Which sub-query of a stats collection is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueryPurpose {
    /// Liveness round trip after connecting.
    Ping,
    /// Active/total session counts.
    ConnectionCounts,
    /// Server status counters (`SHOW STATUS`).
    ServerStatus,
    /// Server start time / uptime.
    Uptime,
    /// Per-session rows.
    ProcessList,
    /// Largest relations.
    TableSizes,
}

impl QueryPurpose {
    /// Human-readable description used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            QueryPurpose::Ping => "ping",
            QueryPurpose::ConnectionCounts => "connection counts",
            QueryPurpose::ServerStatus => "status variables",
            QueryPurpose::Uptime => "uptime",
            QueryPurpose::ProcessList => "process information",
            QueryPurpose::TableSizes => "table information",
        }
    }
}

impl std::fmt::Display for QueryPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.describe())
    }
}

/// A purpose-tagged SQL statement with positional text parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub purpose: QueryPurpose,
    pub sql: String,
    pub params: Vec<String>,
}

impl Query {
    pub fn new(purpose: QueryPurpose, sql: impl Into<String>) -> Self {
        Self {
            purpose,
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Appends a positional parameter.
    pub fn bind(mut self, value: impl Into<String>) -> Self {
        self.params.push(value.into());
        self
    }
}

/// One result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
    /// Column type the session could not convert (type name).
    Unsupported(String),
}

impl Value {
    fn kind(&self) -> String {
        match self {
            Value::Null => "NULL".to_string(),
            Value::Int(v) => format!("integer {}", v),
            Value::Float(v) => format!("float {}", v),
            Value::Text(s) => format!("text '{}'", s),
            Value::Unsupported(t) => format!("unsupported type {}", t),
        }
    }

    fn parse_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            Value::Float(v) if v.is_finite() => Some(v.trunc() as i64),
            Value::Text(s) => {
                let s = s.trim();
                s.parse::<i64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            }
            _ => None,
        }
    }

    fn parse_float(&self) -> Option<f64> {
        match self {
            Value::Int(v) => Some(*v as f64),
            Value::Float(v) => Some(*v),
            Value::Text(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    fn render_text(&self) -> Option<String> {
        match self {
            Value::Int(v) => Some(v.to_string()),
            Value::Float(v) => Some(v.to_string()),
            Value::Text(s) => Some(s.clone()),
            Value::Null | Value::Unsupported(_) => None,
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// A single result row could not be decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RowParseError {
    pub column: usize,
    pub expected: &'static str,
    pub found: String,
}

impl std::fmt::Display for RowParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "column {}: expected {}, found {}",
            self.column, self.expected, self.found
        )
    }
}

impl std::error::Error for RowParseError {}

/// One result row.
///
/// Strict accessors (`int`, `text`) fail on NULL or unparsable values and are
/// used for required fields. Lenient accessors (`int_or_zero`, `opt_text`)
/// only fail when the column is missing altogether.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    values: Vec<Value>,
}

impl Row {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    fn cell(&self, column: usize) -> Result<&Value, RowParseError> {
        self.values.get(column).ok_or(RowParseError {
            column,
            expected: "a value",
            found: format!("row with {} columns", self.values.len()),
        })
    }

    /// Required integer.
    pub fn int(&self, column: usize) -> Result<i64, RowParseError> {
        let cell = self.cell(column)?;
        cell.parse_int().ok_or_else(|| RowParseError {
            column,
            expected: "integer",
            found: cell.kind(),
        })
    }

    /// Optional integer; NULL or unparsable reads as 0.
    pub fn int_or_zero(&self, column: usize) -> Result<i64, RowParseError> {
        Ok(self.cell(column)?.parse_int().unwrap_or(0))
    }

    /// Optional float; NULL or unparsable reads as 0.0.
    pub fn float_or_zero(&self, column: usize) -> Result<f64, RowParseError> {
        Ok(self.cell(column)?.parse_float().unwrap_or(0.0))
    }

    /// Required text.
    pub fn text(&self, column: usize) -> Result<String, RowParseError> {
        let cell = self.cell(column)?;
        cell.render_text().ok_or_else(|| RowParseError {
            column,
            expected: "text",
            found: cell.kind(),
        })
    }

    /// Optional text; NULL reads as `None`.
    pub fn opt_text(&self, column: usize) -> Result<Option<String>, RowParseError> {
        let cell = self.cell(column)?;
        match cell {
            Value::Unsupported(_) => Err(RowParseError {
                column,
                expected: "text",
                found: cell.kind(),
            }),
            _ => Ok(cell.render_text()),
        }
    }
}

/// Builds a [`Row`] from a list of values: `row![1i64, "alice", None::<&str>]`.
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        $crate::adapter::Row::new(vec![$($crate::adapter::Value::from($value)),*])
    };
}

/// A live connection to one database engine.
///
/// Errors are plain messages; the adapter attaches the query purpose.
/// Dropping a session releases the underlying connection.
pub trait Session: Send {
    /// Executes a query and returns all rows.
    fn query(&mut self, query: &Query) -> Result<Vec<Row>, String>;

    /// Round-trip liveness check.
    fn ping(&mut self) -> Result<(), String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_accepts_numeric_text() {
        let row = row!["42", " 7 ", "3.9", 5i64];
        assert_eq!(row.int(0).unwrap(), 42);
        assert_eq!(row.int(1).unwrap(), 7);
        assert_eq!(row.int(2).unwrap(), 3);
        assert_eq!(row.int(3).unwrap(), 5);
    }

    #[test]
    fn test_int_rejects_null_and_garbage() {
        let row = row![None::<i64>, "abc"];
        let err = row.int(0).unwrap_err();
        assert_eq!(err.column, 0);
        assert_eq!(err.found, "NULL");
        assert!(row.int(1).is_err());
    }

    #[test]
    fn test_int_or_zero_is_lenient_but_needs_column() {
        let row = row![None::<i64>, "abc"];
        assert_eq!(row.int_or_zero(0).unwrap(), 0);
        assert_eq!(row.int_or_zero(1).unwrap(), 0);
        assert!(row.int_or_zero(2).is_err());
    }

    #[test]
    fn test_text_accessors() {
        let row = row!["alice", None::<&str>, 12i64];
        assert_eq!(row.text(0).unwrap(), "alice");
        assert!(row.text(1).is_err());
        assert_eq!(row.opt_text(1).unwrap(), None);
        assert_eq!(row.text(2).unwrap(), "12");
    }

    #[test]
    fn test_unsupported_cell_fails_text() {
        let row = Row::new(vec![Value::Unsupported("inet".to_string())]);
        assert!(row.text(0).is_err());
        assert!(row.opt_text(0).is_err());
    }

    #[test]
    fn test_query_bind() {
        let q = Query::new(QueryPurpose::ProcessList, "SELECT 1").bind("app");
        assert_eq!(q.params, vec!["app".to_string()]);
        assert_eq!(q.purpose.to_string(), "process information");
    }
}
