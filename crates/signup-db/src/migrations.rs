use rusqlite::Connection;
use tracing::info;

use crate::Result;

/// Ordered schema changes. Each runs once and is recorded in `schema_version`;
/// startup never drops existing data.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    "
    CREATE TABLE users (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        username    TEXT NOT NULL,
        email       TEXT NOT NULL UNIQUE,
        password    TEXT NOT NULL,
        created_at  TEXT NOT NULL DEFAULT (datetime('now'))
    );
    ",
)];

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let current: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    for &(version, sql) in MIGRATIONS.iter().filter(|(v, _)| *v > current) {
        info!("Running migration v{}", version);
        let tx = conn.unchecked_transaction()?;
        tx.execute_batch(sql)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
        tx.commit()?;
    }

    info!("Database migrations complete");
    Ok(())
}
