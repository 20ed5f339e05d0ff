//! Endpoint queries.
//!
//! Endpoint rows are keyed by (config id, service kind). Writes are upserts,
//! so a kind never has more than one URL per configuration.

use chrono::Utc;
use ocbridge_common::{ConfigId, Error, Result, ServiceKind};
use rusqlite::{Connection, Row};

use super::config::parse_timestamp;
use crate::models::Endpoint;

fn row_to_endpoint(row: &Row<'_>) -> rusqlite::Result<Endpoint> {
    Ok(Endpoint {
        config_id: ConfigId::from(row.get::<_, i64>(0)?),
        service_type: ServiceKind::new(&row.get::<_, String>(1)?),
        service_url: row.get(2)?,
        updated_at: parse_timestamp(3, &row.get::<_, String>(3)?)?,
    })
}

/// Register `url` as the endpoint for `kind`, replacing any previous URL.
pub fn set_endpoint(
    conn: &Connection,
    config_id: ConfigId,
    url: &str,
    kind: &ServiceKind,
) -> Result<()> {
    conn.execute(
        "INSERT INTO oc_endpoints (config_id, service_type, service_url, updated_at)
         VALUES (:config_id, :service_type, :service_url, :updated_at)
         ON CONFLICT(config_id, service_type) DO UPDATE SET
            service_url = excluded.service_url,
            updated_at = excluded.updated_at",
        rusqlite::named_params! {
            ":config_id": config_id.get(),
            ":service_type": kind.as_str(),
            ":service_url": url,
            ":updated_at": Utc::now().to_rfc3339(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(())
}

/// Remove the endpoint for one kind. Returns the number of rows deleted.
pub fn remove_endpoint(conn: &Connection, config_id: ConfigId, kind: &ServiceKind) -> Result<usize> {
    conn.execute(
        "DELETE FROM oc_endpoints WHERE config_id = :config_id AND service_type = :service_type",
        rusqlite::named_params! {
            ":config_id": config_id.get(),
            ":service_type": kind.as_str(),
        },
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Remove every endpoint of a configuration. Returns the number of rows deleted.
pub fn delete_endpoints(conn: &Connection, config_id: ConfigId) -> Result<usize> {
    conn.execute(
        "DELETE FROM oc_endpoints WHERE config_id = :config_id",
        rusqlite::named_params! { ":config_id": config_id.get() },
    )
    .map_err(|e| Error::database(e.to_string()))
}

/// Look up the endpoint for one kind.
pub fn get_endpoint(
    conn: &Connection,
    config_id: ConfigId,
    kind: &ServiceKind,
) -> Result<Option<Endpoint>> {
    let result = conn.query_row(
        "SELECT config_id, service_type, service_url, updated_at
         FROM oc_endpoints
         WHERE config_id = :config_id AND service_type = :service_type",
        rusqlite::named_params! {
            ":config_id": config_id.get(),
            ":service_type": kind.as_str(),
        },
        row_to_endpoint,
    );

    match result {
        Ok(endpoint) => Ok(Some(endpoint)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e.to_string())),
    }
}

/// List all endpoints of a configuration, ordered by kind.
pub fn list_endpoints(conn: &Connection, config_id: ConfigId) -> Result<Vec<Endpoint>> {
    let mut stmt = conn
        .prepare(
            "SELECT config_id, service_type, service_url, updated_at
             FROM oc_endpoints
             WHERE config_id = :config_id
             ORDER BY service_type",
        )
        .map_err(|e| Error::database(e.to_string()))?;

    let endpoints = stmt
        .query_map(
            rusqlite::named_params! { ":config_id": config_id.get() },
            row_to_endpoint,
        )
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;

    Ok(endpoints)
}
