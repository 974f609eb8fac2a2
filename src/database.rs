use mobc::{Manager, Pool};
use rusqlite::{Connection, Result as SqliteResult};
use std::path::Path;
use tracing::{debug, info};

use crate::error::Result;

pub struct SqliteManager {
    db_path: String,
}

impl SqliteManager {
    pub fn new(db_path: String) -> Self {
        debug!("Creating SqliteManager for path: {}", db_path);
        Self { db_path }
    }
}

#[async_trait::async_trait]
impl Manager for SqliteManager {
    type Connection = Connection;
    type Error = rusqlite::Error;

    async fn connect(&self) -> std::result::Result<Self::Connection, Self::Error> {
        let conn = Connection::open(&self.db_path)?;

        // Some PRAGMA statements return a row; query_row swallows it.
        let exec_pragma = |conn: &Connection, pragma: &str| -> SqliteResult<()> {
            match conn.execute(pragma, []) {
                Ok(_) => Ok(()),
                Err(rusqlite::Error::ExecuteReturnedResults) => {
                    conn.query_row(pragma, [], |_| Ok(()))
                }
                Err(e) => Err(e),
            }
        };

        exec_pragma(&conn, "PRAGMA journal_mode=WAL")?;
        exec_pragma(&conn, "PRAGMA synchronous=NORMAL")?;
        exec_pragma(&conn, "PRAGMA foreign_keys=ON")?;
        exec_pragma(&conn, "PRAGMA temp_store=memory")?;

        init_database(&conn)?;
        Ok(conn)
    }

    async fn check(&self, conn: Self::Connection) -> std::result::Result<Self::Connection, Self::Error> {
        conn.query_row("SELECT 1", [], |_| Ok(()))?;
        Ok(conn)
    }
}

pub type DbPool = Pool<SqliteManager>;

pub async fn create_db_pool(db_path: &str) -> Result<DbPool> {
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    let manager = SqliteManager::new(db_path.to_string());
    let pool = Pool::builder().max_open(10).max_idle(5).build(manager);

    info!("✓ SQLite connection pool created: {}", db_path);
    Ok(pool)
}

fn init_database(conn: &Connection) -> SqliteResult<()> {
    create_zones_table(conn)?;
    create_leads_table(conn)?;
    create_outreach_events_table(conn)?;
    create_unsubscribes_table(conn)?;
    create_daily_metrics_table(conn)?;
    create_indexes(conn)?;
    Ok(())
}

fn create_zones_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS zones (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT UNIQUE NOT NULL,
            lat_min REAL NOT NULL,
            lat_max REAL NOT NULL,
            lon_min REAL NOT NULL,
            lon_max REAL NOT NULL,
            center_lat REAL NOT NULL,
            center_lon REAL NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            last_worked_at TEXT,
            businesses_found INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_leads_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS leads (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            category TEXT,
            address TEXT NOT NULL,
            phone TEXT,
            email TEXT,
            has_website INTEGER NOT NULL DEFAULT 0,
            rating REAL,
            review_count INTEGER NOT NULL DEFAULT 0,
            priority_score INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL DEFAULT 'new',
            last_contacted_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE(name, address)
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_outreach_events_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS outreach_events (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lead_id INTEGER NOT NULL,
            kind TEXT NOT NULL,
            subject TEXT,
            sent_at TEXT NOT NULL,
            UNIQUE(lead_id, kind),
            FOREIGN KEY (lead_id) REFERENCES leads (id)
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_unsubscribes_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS unsubscribes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            lead_id INTEGER UNIQUE NOT NULL,
            email TEXT,
            unsubscribed_at TEXT NOT NULL,
            FOREIGN KEY (lead_id) REFERENCES leads (id)
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_daily_metrics_table(conn: &Connection) -> SqliteResult<()> {
    conn.execute(
        r#"
        CREATE TABLE IF NOT EXISTS daily_metrics (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            date TEXT UNIQUE NOT NULL,
            zones_scraped INTEGER NOT NULL DEFAULT 0,
            businesses_scraped INTEGER NOT NULL DEFAULT 0,
            leads_qualified INTEGER NOT NULL DEFAULT 0,
            emails_sent INTEGER NOT NULL DEFAULT 0,
            responses_received INTEGER NOT NULL DEFAULT 0,
            conversions INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )
        "#,
        [],
    )?;
    Ok(())
}

fn create_indexes(conn: &Connection) -> SqliteResult<()> {
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_zones_status ON zones(status)",
        "CREATE INDEX IF NOT EXISTS idx_zones_last_worked ON zones(last_worked_at)",
        "CREATE INDEX IF NOT EXISTS idx_leads_status ON leads(status)",
        "CREATE INDEX IF NOT EXISTS idx_leads_priority ON leads(priority_score DESC)",
        "CREATE INDEX IF NOT EXISTS idx_leads_website ON leads(has_website)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_events_lead ON outreach_events(lead_id)",
        "CREATE INDEX IF NOT EXISTS idx_outreach_events_sent_at ON outreach_events(sent_at DESC)",
        "CREATE INDEX IF NOT EXISTS idx_unsubscribes_lead ON unsubscribes(lead_id)",
        "CREATE INDEX IF NOT EXISTS idx_daily_metrics_date ON daily_metrics(date)",
    ];

    for index_sql in indexes.iter() {
        conn.execute(index_sql, [])?;
    }
    Ok(())
}

#[cfg(test)]
pub(crate) async fn test_pool() -> DbPool {
    let path = std::env::temp_dir().join(format!("zone-outreach-test-{}.db", uuid::Uuid::new_v4()));
    create_db_pool(path.to_str().unwrap())
        .await
        .expect("test pool")
}
