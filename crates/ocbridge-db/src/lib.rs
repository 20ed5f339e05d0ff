//! Ocbridge-DB: Database schema, migrations, and query operations
//!
//! This crate provides database functionality for ocbridge using SQLite
//! with rusqlite and r2d2 connection pooling.
//!
//! # Modules
//!
//! - `migrations` - Database schema migrations
//! - `pool` - Connection pool management
//! - `models` - Rust models matching database schema
//! - `queries` - Database query operations
//!
//! # Example
//!
//! ```no_run
//! use ocbridge_common::ConfigId;
//! use ocbridge_db::models::ServiceSettings;
//! use ocbridge_db::pool::{init_pool, get_conn};
//! use ocbridge_db::queries::config;
//!
//! let pool = init_pool("/var/lib/ocbridge/db.sqlite").unwrap();
//! let conn = get_conn(&pool).unwrap();
//!
//! let settings = ServiceSettings::new("https://oc.example.org", "admin", "opencast");
//! let record = config::store_config(&conn, ConfigId::SINGLETON, &settings).unwrap();
//! println!("Stored config {}", record.id);
//! ```

pub mod migrations;
pub mod models;
pub mod pool;
pub mod queries;
