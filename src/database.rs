//! # Database
//!
//! sqlite store for per-user cooldown timestamps and the privileged user
//! table.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.1.0

use anyhow::Result;
use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};
use log::{debug, info};
use sqlite::{Connection, State};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open (or create) the database at `path`; `:memory:` works for tests
    pub async fn new(path: &str) -> Result<Self> {
        let conn = sqlite::open(path)?;
        let db = Database {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_tables().await?;
        info!("🗄️ Database ready at {path}");
        Ok(db)
    }

    async fn init_tables(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS user_cooldown (
                user_id TEXT PRIMARY KEY,
                year INTEGER NOT NULL,
                month INTEGER NOT NULL,
                day INTEGER NOT NULL,
                hour INTEGER NOT NULL,
                minute INTEGER NOT NULL,
                second INTEGER NOT NULL
            )",
        )?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS primary_users (
                user_id INTEGER PRIMARY KEY
            )",
        )?;
        Ok(())
    }

    /// When the user last ran a cooldown-gated command
    pub async fn user_cooldown(&self, user_id: u64) -> Result<Option<NaiveDateTime>> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(
            "SELECT year, month, day, hour, minute, second FROM user_cooldown WHERE user_id = ?",
        )?;
        statement.bind((1, user_id.to_string().as_str()))?;

        if let State::Row = statement.next()? {
            let year = statement.read::<i64, _>("year")?;
            let month = statement.read::<i64, _>("month")?;
            let day = statement.read::<i64, _>("day")?;
            let hour = statement.read::<i64, _>("hour")?;
            let minute = statement.read::<i64, _>("minute")?;
            let second = statement.read::<i64, _>("second")?;

            let timestamp = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
                .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32));
            if timestamp.is_none() {
                debug!("Ignoring malformed cooldown record for user {user_id}");
            }
            return Ok(timestamp);
        }
        Ok(None)
    }

    pub async fn set_user_cooldown(&self, user_id: u64, at: NaiveDateTime) -> Result<()> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare(
            "INSERT OR REPLACE INTO user_cooldown (user_id, year, month, day, hour, minute, second)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )?;
        statement.bind((1, user_id.to_string().as_str()))?;
        statement.bind((2, at.year() as i64))?;
        statement.bind((3, at.month() as i64))?;
        statement.bind((4, at.day() as i64))?;
        statement.bind((5, at.hour() as i64))?;
        statement.bind((6, at.minute() as i64))?;
        statement.bind((7, at.second() as i64))?;
        statement.next()?;
        Ok(())
    }

    /// Ids stored in `primary_users`
    pub async fn primary_users(&self) -> Result<HashSet<u64>> {
        let conn = self.conn.lock().await;
        let mut statement = conn.prepare("SELECT user_id FROM primary_users")?;
        let mut users = HashSet::new();
        while let State::Row = statement.next()? {
            users.insert(statement.read::<i64, _>("user_id")? as u64);
        }
        Ok(users)
    }
}
