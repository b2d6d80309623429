pub mod queries;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use rusqlite::Connection;

use crate::models::LeadRecord;
use crate::services::lead::LeadStore;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS leads (
    id TEXT PRIMARY KEY,
    org_id TEXT NOT NULL,
    branch_id TEXT NOT NULL,
    name TEXT,
    email TEXT,
    phone TEXT,
    product_interest TEXT NOT NULL DEFAULT '[]',
    interest_reason TEXT,
    budget_expectation TEXT,
    lead_status TEXT NOT NULL DEFAULT 'NEW',
    captured_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_leads_tenant ON leads (org_id, branch_id);
";

pub fn init_db(path: &str) -> anyhow::Result<Connection> {
    let conn = Connection::open(path).context("failed to open database")?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("failed to set database pragmas")?;

    conn.execute_batch(SCHEMA)
        .context("failed to apply schema")?;

    Ok(conn)
}

/// Lead storage over the shared connection.
pub struct SqliteLeadStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteLeadStore {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }
}

impl LeadStore for SqliteLeadStore {
    fn insert(&self, record: &LeadRecord) -> anyhow::Result<()> {
        let conn = self.conn.lock().unwrap();
        queries::insert_lead(&conn, record)
    }
}
