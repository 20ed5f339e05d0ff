//! Configuration record queries.
//!
//! There is exactly one configuration per install, stored under
//! [`ConfigId::SINGLETON`]; the functions still take an id so endpoint rows
//! and records stay explicitly linked.

use chrono::{DateTime, Utc};
use ocbridge_common::{ConfigId, Error, Result};
use rusqlite::{Connection, Row};

use crate::models::{ConfigRecord, ServiceSettings};

pub(crate) fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<ConfigRecord> {
    let config_json: String = row.get(1)?;
    let config: ServiceSettings = serde_json::from_str(&config_json).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(1, rusqlite::types::Type::Text, Box::new(e))
    })?;

    Ok(ConfigRecord {
        id: ConfigId::from(row.get::<_, i64>(0)?),
        config,
        updated_at: parse_timestamp(2, &row.get::<_, String>(2)?)?,
    })
}

/// Find a configuration record by id.
///
/// # Returns
///
/// * `Ok(Some(ConfigRecord))` - The record if present
/// * `Ok(None)` - If no configuration has been saved yet
/// * `Err(Error)` - If a database error occurs
pub fn find_config(conn: &Connection, id: ConfigId) -> Result<Option<ConfigRecord>> {
    let result = conn.query_row(
        "SELECT id, config, updated_at FROM oc_config WHERE id = :id",
        rusqlite::named_params! { ":id": id.get() },
        row_to_record,
    );

    match result {
        Ok(record) => Ok(Some(record)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// Create or overwrite the configuration record with the given settings.
///
/// The whole settings blob is replaced; there is no field-level merge.
pub fn store_config(
    conn: &Connection,
    id: ConfigId,
    settings: &ServiceSettings,
) -> Result<ConfigRecord> {
    let updated_at = Utc::now();
    let config_json = serde_json::to_string(settings)?;

    conn.execute(
        "INSERT INTO oc_config (id, config, updated_at)
         VALUES (:id, :config, :updated_at)
         ON CONFLICT(id) DO UPDATE SET
            config = excluded.config,
            updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":id": id.get(),
            ":config": config_json,
            ":updated_at": updated_at.to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(ConfigRecord {
        id,
        config: settings.clone(),
        updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn test_find_missing_config() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        assert!(find_config(&conn, ConfigId::SINGLETON).unwrap().is_none());
    }

    #[test]
    fn test_store_and_find() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let settings = ServiceSettings::new("https://oc.example.org", "admin", "opencast");
        let stored = store_config(&conn, ConfigId::SINGLETON, &settings).unwrap();
        assert_eq!(stored.id, ConfigId::SINGLETON);

        let found = find_config(&conn, ConfigId::SINGLETON).unwrap().unwrap();
        assert_eq!(found.config, settings);
    }

    #[test]
    fn test_store_overwrites_wholesale() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let mut first = ServiceSettings::new("https://a.example.org", "admin", "one");
        first.version = Some("9.1".to_string());
        store_config(&conn, ConfigId::SINGLETON, &first).unwrap();

        let second = ServiceSettings::new("https://b.example.org", "ops", "two");
        store_config(&conn, ConfigId::SINGLETON, &second).unwrap();

        let found = find_config(&conn, ConfigId::SINGLETON).unwrap().unwrap();
        assert_eq!(found.config.url, "https://b.example.org");
        assert_eq!(found.config.version, None);

        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM oc_config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
