//! Key-value state repository.

use rusqlite::{params, Connection};
use serde_json::Value;

use crate::error::Result;

/// Repository over the `state` table. Values are JSON documents.
pub struct StateRepo;

impl StateRepo {
    /// Get a state value.
    pub fn get(conn: &Connection, key: &str) -> Result<Option<Value>> {
        let mut stmt = conn.prepare("SELECT value FROM state WHERE key = ?1")?;

        let value = stmt
            .query_row([key], |row| {
                let value_str: String = row.get(0)?;
                Ok(serde_json::from_str(&value_str).unwrap_or(Value::Null))
            })
            .ok();

        Ok(value)
    }

    /// Set a state value (insert or update).
    pub fn set(conn: &Connection, key: &str, value: &Value) -> Result<()> {
        let value_json = serde_json::to_string(value)?;

        conn.execute(
            "INSERT INTO state (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = ?2",
            params![key, value_json],
        )?;

        Ok(())
    }

    /// Remove a state value.
    pub fn remove(conn: &Connection, key: &str) -> Result<bool> {
        let removed = conn.execute("DELETE FROM state WHERE key = ?1", [key])?;
        Ok(removed > 0)
    }

    /// Whether a key exists at all.
    pub fn contains(conn: &Connection, key: &str) -> Result<bool> {
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM state WHERE key = ?1", [key], |row| {
                row.get(0)
            })?;
        Ok(count > 0)
    }

    /// Remove every stored key.
    pub fn clear(conn: &Connection) -> Result<()> {
        conn.execute("DELETE FROM state", [])?;
        Ok(())
    }

    /// Get a typed state value with a default.
    pub fn get_or_default<T: serde::de::DeserializeOwned>(
        conn: &Connection,
        key: &str,
        default: T,
    ) -> Result<T> {
        match Self::get(conn, key)? {
            Some(value) => Ok(serde_json::from_value(value).unwrap_or(default)),
            None => Ok(default),
        }
    }
}
