//! `Session` over a synchronous `postgres::Client`.

use postgres::types::{ToSql, Type};
use postgres::{Client, NoTls};
use postgres_native_tls::MakeTlsConnector;
use tracing::debug;

use crate::adapter::{Query, Row, Session, Value};

use super::format_postgres_error;

/// TLS policy derived from `sslmode`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TlsPolicy {
    Disabled,
    /// Encrypt, but accept any certificate.
    Unverified,
    /// Encrypt and validate the server certificate.
    Verified,
}

impl TlsPolicy {
    pub(super) fn from_ssl_mode(ssl_mode: &str) -> Self {
        match ssl_mode {
            "verify-ca" | "verify-full" => TlsPolicy::Verified,
            "allow" | "prefer" | "require" => TlsPolicy::Unverified,
            _ => TlsPolicy::Disabled,
        }
    }
}

pub(super) struct PgSession {
    client: Client,
}

impl PgSession {
    /// Opens a client for a libpq-style connection string.
    pub(super) fn open(dsn: &str, tls: TlsPolicy) -> Result<Self, String> {
        let client = match tls {
            TlsPolicy::Disabled => Client::connect(dsn, NoTls),
            TlsPolicy::Unverified | TlsPolicy::Verified => {
                let connector = native_tls::TlsConnector::builder()
                    .danger_accept_invalid_certs(tls == TlsPolicy::Unverified)
                    .danger_accept_invalid_hostnames(tls == TlsPolicy::Unverified)
                    .build()
                    .map_err(|e| format!("TLS setup failed: {}", e))?;
                Client::connect(dsn, MakeTlsConnector::new(connector))
            }
        }
        .map_err(|e| format_postgres_error(&e))?;
        Ok(Self { client })
    }
}

impl Session for PgSession {
    fn query(&mut self, query: &Query) -> Result<Vec<Row>, String> {
        let params: Vec<&(dyn ToSql + Sync)> = query
            .params
            .iter()
            .map(|p| p as &(dyn ToSql + Sync))
            .collect();
        let rows = self
            .client
            .query(query.sql.as_str(), &params)
            .map_err(|e| format_postgres_error(&e))?;
        Ok(rows.iter().map(convert_row).collect())
    }

    fn ping(&mut self) -> Result<(), String> {
        self.client
            .simple_query("SELECT 1")
            .map(|_| ())
            .map_err(|e| format_postgres_error(&e))
    }
}

/// Converts a typed row into engine-neutral cells.
fn convert_row(row: &postgres::Row) -> Row {
    let values = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| convert_cell(row, idx, column.name(), column.type_()))
        .collect();
    Row::new(values)
}

fn convert_cell(row: &postgres::Row, idx: usize, name: &str, ty: &Type) -> Value {
    let converted = match *ty {
        Type::BOOL => row
            .try_get::<_, Option<bool>>(idx)
            .map(|v| v.map(|b| Value::Int(b as i64))),
        Type::INT2 => row
            .try_get::<_, Option<i16>>(idx)
            .map(|v| v.map(|n| Value::Int(n as i64))),
        Type::INT4 => row
            .try_get::<_, Option<i32>>(idx)
            .map(|v| v.map(|n| Value::Int(n as i64))),
        Type::INT8 => row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::Int)),
        Type::OID => row
            .try_get::<_, Option<u32>>(idx)
            .map(|v| v.map(|n| Value::Int(n as i64))),
        Type::FLOAT4 => row
            .try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|n| Value::Float(n as f64))),
        Type::FLOAT8 => row
            .try_get::<_, Option<f64>>(idx)
            .map(|v| v.map(Value::Float)),
        Type::TEXT | Type::VARCHAR | Type::NAME | Type::BPCHAR | Type::UNKNOWN => row
            .try_get::<_, Option<String>>(idx)
            .map(|v| v.map(Value::Text)),
        _ => return unsupported(ty, name),
    };
    match converted {
        Ok(Some(value)) => value,
        Ok(None) => Value::Null,
        Err(e) => {
            debug!(column = name, pg_type = ty.name(), error = %e, "cell conversion failed");
            unsupported(ty, name)
        }
    }
}

/// Unconvertible cell, tagged with its column so row parse errors name it.
fn unsupported(ty: &Type, column: &str) -> Value {
    Value::Unsupported(format!("{} in column {}", ty.name(), column))
}
