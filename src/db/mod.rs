//! Database layer
//!
//! Supports SQLite (default, single-file deployment) and MySQL. The driver is
//! selected from configuration; repositories dispatch on
//! [`DatabasePool::driver`] and run backend-specific SQL.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
