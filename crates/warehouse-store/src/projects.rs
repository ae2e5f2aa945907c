use std::path::Path;

use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension, params};
use warehouse_types::{GroupId, Project};

use crate::Result;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS projects (
    id       TEXT PRIMARY KEY,
    group_id INTEGER NOT NULL,
    doc      TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_projects_group_id ON projects(group_id);
";

/// Read access to projects, as used by request handlers.
pub trait ProjectRepository: Send + Sync {
    /// Look up a project by its id.
    fn find_by_id(&self, id: &str) -> Result<Option<Project>>;

    /// Look up the project owning `group_id`.
    fn find_by_group(&self, group_id: GroupId) -> Result<Option<Project>>;
}

/// Thin repository over SQLite for project documents.
///
/// Thread-safe via internal `Mutex<Connection>`.
pub struct ProjectStore {
    conn: Mutex<Connection>,
}

impl ProjectStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        conn.execute_batch(SCHEMA)?;
        tracing::debug!(path = %path.display(), "Opened project store");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory database (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Insert or replace a project document.
    pub fn upsert(&self, project: &Project) -> Result<()> {
        let doc = serde_json::to_string(project)?;
        self.conn.lock().execute(
            "INSERT INTO projects (id, group_id, doc) VALUES (?1, ?2, ?3)
             ON CONFLICT(id) DO UPDATE SET group_id = excluded.group_id, doc = excluded.doc",
            params![project.id, project.group_id, doc],
        )?;
        Ok(())
    }

    /// All projects, ordered by id.
    pub fn list(&self) -> Result<Vec<Project>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare("SELECT doc FROM projects ORDER BY id")?;
        let docs = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        docs.iter()
            .map(|doc| serde_json::from_str(doc).map_err(Into::into))
            .collect()
    }

    fn query_one(&self, sql: &str, param: &dyn rusqlite::ToSql) -> Result<Option<Project>> {
        let doc: Option<String> = self
            .conn
            .lock()
            .query_row(sql, [param], |row| row.get(0))
            .optional()?;
        doc.map(|d| serde_json::from_str(&d).map_err(Into::into))
            .transpose()
    }
}

impl ProjectRepository for ProjectStore {
    fn find_by_id(&self, id: &str) -> Result<Option<Project>> {
        self.query_one("SELECT doc FROM projects WHERE id = ?1", &id)
    }

    fn find_by_group(&self, group_id: GroupId) -> Result<Option<Project>> {
        // Several projects sharing a group is a datastore inconsistency;
        // the lowest id wins so the answer is stable.
        self.query_one(
            "SELECT doc FROM projects WHERE group_id = ?1 ORDER BY id LIMIT 1",
            &group_id,
        )
    }
}
