//! sqlx pool handle.
//!
//! Uses database-specific pools (MySqlPool, PgPool, SqlitePool) rather than
//! `AnyPool` so callers keep full type support.

use crate::db::driver::DatabaseType;
use crate::db::transaction::DbTransaction;
use crate::scoped::Transactional;
use futures_util::future::BoxFuture;
use sqlx::{
    MySqlPool, PgPool, SqlitePool, mysql::MySqlConnectOptions, postgres::PgConnectOptions,
    postgres::PgSslMode, sqlite::SqliteConnectOptions, sqlite::SqlitePoolOptions,
};
use std::str::FromStr;
use tracing::debug;
use url::Url;

/// SQLite allows one writer; a single connection avoids `SQLITE_BUSY`
/// between a test's transaction and setup statements on the pool.
const SQLITE_MAX_CONNECTIONS: u32 = 1;

/// Database-specific connection pool.
#[derive(Debug, Clone)]
pub enum DbPool {
    MySql(MySqlPool),
    Postgres(PgPool),
    SQLite(SqlitePool),
}

impl DbPool {
    /// Open a pool for `data_source`.
    ///
    /// Pool sizing and timeouts are left at the sqlx defaults, except that
    /// SQLite pools hold a single connection.
    pub async fn connect(db_type: DatabaseType, data_source: &str) -> Result<Self, sqlx::Error> {
        debug!(db_type = %db_type, "Creating connection pool");

        match db_type {
            DatabaseType::MySQL => {
                let options = MySqlConnectOptions::from_str(data_source)?.charset("utf8mb4");
                let pool = MySqlPool::connect_with(options).await?;
                Ok(DbPool::MySql(pool))
            }
            DatabaseType::PostgreSQL => {
                let options = pg_connect_options(data_source)?;
                let pool = PgPool::connect_with(options).await?;
                Ok(DbPool::Postgres(pool))
            }
            DatabaseType::SQLite => {
                let options = SqliteConnectOptions::from_str(data_source)?.create_if_missing(true);
                let pool = SqlitePoolOptions::new()
                    .max_connections(SQLITE_MAX_CONNECTIONS)
                    .connect_with(options)
                    .await?;
                Ok(DbPool::SQLite(pool))
            }
        }
    }

    /// Close the connection pool.
    pub async fn close(&self) {
        impl_db_dispatch!(self, {
            MySql(pool) => pool.close().await,
            Postgres(pool) => pool.close().await,
            SQLite(pool) => pool.close().await,
        })
    }

    /// Get the database type for this pool.
    pub fn db_type(&self) -> DatabaseType {
        impl_db_dispatch!(self, {
            MySql(_p) => DatabaseType::MySQL,
            Postgres(_p) => DatabaseType::PostgreSQL,
            SQLite(_p) => DatabaseType::SQLite,
        })
    }
}

impl Transactional for DbPool {
    type Transaction = DbTransaction;
    type Error = sqlx::Error;

    fn begin(&self) -> BoxFuture<'_, Result<DbTransaction, sqlx::Error>> {
        Box::pin(async move {
            impl_db_dispatch!(self, {
                MySql(pool) => pool.begin().await.map(DbTransaction::MySql),
                Postgres(pool) => pool.begin().await.map(DbTransaction::Postgres),
                SQLite(pool) => pool.begin().await.map(DbTransaction::SQLite),
            })
        })
    }
}

/// PostgreSQL options from either a URL or a libpq key/value connect string
/// (`host=localhost port=5432 dbname=app`).
fn pg_connect_options(data_source: &str) -> Result<PgConnectOptions, sqlx::Error> {
    if Url::parse(data_source).is_ok() {
        return PgConnectOptions::from_str(data_source);
    }

    let config_error = |message: String| sqlx::Error::Configuration(message.into());
    let mut options = PgConnectOptions::new();
    for (key, value) in parse_key_value(data_source).map_err(config_error)? {
        options = match key.as_str() {
            "host" | "hostaddr" => options.host(&value),
            "port" => options.port(
                value
                    .parse()
                    .map_err(|_| config_error(format!("invalid port {value:?}")))?,
            ),
            "user" => options.username(&value),
            "password" => options.password(&value),
            "dbname" => options.database(&value),
            "sslmode" => options.ssl_mode(value.parse::<PgSslMode>()?),
            "sslrootcert" => options.ssl_root_cert(value.as_str()),
            "application_name" => options.application_name(&value),
            _ => return Err(config_error(format!("unsupported connect string key {key:?}"))),
        };
    }
    Ok(options)
}

/// Split `key=value` pairs separated by whitespace. Values may be single
/// quoted, with `\` escaping the next character.
fn parse_key_value(data_source: &str) -> Result<Vec<(String, String)>, String> {
    let mut pairs = Vec::new();
    let mut chars = data_source.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.peek().is_none() {
            return Ok(pairs);
        }

        let mut key = String::new();
        while let Some(c) = chars.next_if(|c| *c != '=' && !c.is_whitespace()) {
            key.push(c);
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        if chars.next() != Some('=') {
            return Err(format!("missing \"=\" after {key:?}"));
        }
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let mut value = String::new();
        if chars.next_if_eq(&'\'').is_some() {
            loop {
                match chars.next() {
                    Some('\'') => break,
                    Some('\\') => match chars.next() {
                        Some(c) => value.push(c),
                        None => return Err(format!("unterminated quoted value for {key:?}")),
                    },
                    Some(c) => value.push(c),
                    None => return Err(format!("unterminated quoted value for {key:?}")),
                }
            }
        } else {
            while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                value.push(c);
            }
        }
        pairs.push((key, value));
    }
}
