use rusqlite::{Connection, Result, params};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use super::models::ProjectRecord;

pub struct Database {
    conn: Mutex<Connection>,
    path: String,
}

impl Database {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();
        let conn = Connection::open(&path)?;
        let db = Database { conn: Mutex::new(conn), path: path_str };
        db.init()?;
        Ok(db)
    }

    pub fn get_path(&self) -> String {
        self.path.clone()
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn: Mutex::new(conn), path: ":memory:".to_string() };
        db.init()?;
        Ok(db)
    }

    // Poison is ignored: a panicking holder leaves no partial state in the connection
    fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn init(&self) -> Result<()> {
        let conn = self.conn();

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                path TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_projects_name ON projects(name);
            "
        )?;

        // Migration: Add created_at to tables from before uploads were timestamped
        let has_created_at: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM pragma_table_info('projects') WHERE name = 'created_at'",
            [],
            |row| row.get(0),
        ).unwrap_or(false);

        if !has_created_at {
            conn.execute("ALTER TABLE projects ADD COLUMN created_at INTEGER NOT NULL DEFAULT 0", [])?;
            tracing::info!("Migration: added projects.created_at");
        }

        Ok(())
    }

    fn row_to_project(row: &rusqlite::Row) -> Result<ProjectRecord> {
        Ok(ProjectRecord {
            id: row.get(0)?,
            name: row.get(1)?,
            path: row.get(2)?,
            created_at: row.get(3)?,
        })
    }

    pub fn insert_project(&self, name: &str, path: &str) -> Result<ProjectRecord> {
        let conn = self.conn();
        let now = chrono::Utc::now().timestamp_millis();
        conn.execute(
            "INSERT INTO projects (name, path, created_at) VALUES (?1, ?2, ?3)",
            params![name, path, now],
        )?;
        Ok(ProjectRecord {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            path: path.to_string(),
            created_at: now,
        })
    }

    /// First project registered under `name`, if any
    pub fn find_project(&self, name: &str) -> Result<Option<ProjectRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(
            "SELECT id, name, path, created_at FROM projects WHERE name = ?1 ORDER BY id ASC LIMIT 1"
        )?;

        let mut rows = stmt.query(params![name])?;
        if let Some(row) = rows.next()? {
            Ok(Some(Self::row_to_project(row)?))
        } else {
            Ok(None)
        }
    }

    pub fn list_projects(&self) -> Result<Vec<ProjectRecord>> {
        let conn = self.conn();
        let mut stmt = conn.prepare("SELECT id, name, path, created_at FROM projects ORDER BY id ASC")?;
        let projects = stmt.query_map([], Self::row_to_project)?.collect::<Result<Vec<_>>>()?;
        Ok(projects)
    }

    pub fn count_projects(&self) -> Result<usize> {
        let conn = self.conn();
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count as usize)
    }
}
