//! SQLite store.
//!
//! One database file with four tables. `share_sets` marks that a project's
//! secrets were shared at least once, so an empty set survives a reload;
//! `user_secrets` holds one JSON row per user and project.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use tracing::debug;

use super::Store;
use crate::core::cipher::PublicKey;
use crate::core::domain::{PerUserSecrets, Project, ProjectId, User, UserSecrets};
use crate::error::{Result, StoreError};

/// How long a writer waits for another process to release the database.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id TEXT PRIMARY KEY,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    display_name TEXT NOT NULL,
    public_key TEXT NOT NULL,
    registered_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS share_sets (
    project_id TEXT PRIMARY KEY REFERENCES projects(id),
    updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS user_secrets (
    project_id TEXT NOT NULL REFERENCES projects(id),
    user_id TEXT NOT NULL,
    secrets TEXT NOT NULL,
    PRIMARY KEY (project_id, user_id)
);
"#;

/// Store backed by a SQLite database file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore").finish_non_exhaustive()
    }
}

impl SqliteStore {
    /// Open or create the database at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the file cannot be opened or the
    /// schema cannot be created.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "sqlite store opened");
        Self::init(conn)
    }

    /// Database that lives only as long as this value.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if SQLite cannot be initialized.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn project_exists(conn: &Connection, id: &ProjectId) -> Result<bool> {
    let found = conn
        .query_row(
            "SELECT 1 FROM projects WHERE id = ?1",
            params![id.as_str()],
            |_| Ok(()),
        )
        .optional()?;
    Ok(found.is_some())
}

fn encode_time(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn decode_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Backend(format!("bad timestamp {raw:?}: {e}")).into())
}

fn corrupt(what: &str, err: impl std::fmt::Display) -> crate::error::Error {
    StoreError::Backend(format!("corrupt {what}: {err}")).into()
}

impl Store for SqliteStore {
    fn create_project(&self, id: &ProjectId) -> Result<Project> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO projects (id) VALUES (?1)",
            params![id.as_str()],
        )?;
        if inserted == 0 {
            return Err(StoreError::ProjectExists(id.to_string()).into());
        }
        debug!(project = %id, "project created");
        Ok(Project::new(id.clone()))
    }

    fn get_project(&self, id: &ProjectId) -> Result<Option<Project>> {
        let conn = self.conn.lock();
        Ok(project_exists(&conn, id)?.then(|| Project::new(id.clone())))
    }

    fn get_all_per_user_secrets(&self, project: &ProjectId) -> Result<Option<PerUserSecrets>> {
        let conn = self.conn.lock();
        if !project_exists(&conn, project)? {
            return Err(StoreError::ProjectNotFound(project.to_string()).into());
        }

        let shared = conn
            .query_row(
                "SELECT 1 FROM share_sets WHERE project_id = ?1",
                params![project.as_str()],
                |_| Ok(()),
            )
            .optional()?;
        if shared.is_none() {
            return Ok(None);
        }

        let mut stmt = conn.prepare(
            "SELECT user_id, secrets FROM user_secrets WHERE project_id = ?1 ORDER BY user_id",
        )?;
        let rows = stmt.query_map(params![project.as_str()], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut set = PerUserSecrets::new();
        for row in rows {
            let (user, raw) = row?;
            let secrets: UserSecrets =
                serde_json::from_str(&raw).map_err(|e| corrupt("user secrets", e))?;
            set.insert(user, secrets);
        }
        Ok(Some(set))
    }

    fn replace_all_per_user_secrets(&self, project: &ProjectId, secrets: &PerUserSecrets) -> Result<()> {
        let mut conn = self.conn.lock();
        // Take the write lock up front so a second process waits instead of
        // failing on the read-to-write upgrade.
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !project_exists(&tx, project)? {
            return Err(StoreError::ProjectNotFound(project.to_string()).into());
        }

        tx.execute(
            "DELETE FROM user_secrets WHERE project_id = ?1",
            params![project.as_str()],
        )?;
        tx.execute(
            "INSERT OR REPLACE INTO share_sets (project_id, updated_at) VALUES (?1, CURRENT_TIMESTAMP)",
            params![project.as_str()],
        )?;
        {
            let mut insert = tx.prepare(
                "INSERT INTO user_secrets (project_id, user_id, secrets) VALUES (?1, ?2, ?3)",
            )?;
            for (user, values) in secrets.iter() {
                let raw = serde_json::to_string(values)?;
                insert.execute(params![project.as_str(), user, raw])?;
            }
        }
        tx.commit()?;

        debug!(
            project = %project,
            users = secrets.len(),
            values = secrets.value_count(),
            "per-user secrets replaced"
        );
        Ok(())
    }

    fn create_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO users (id, display_name, public_key, registered_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.id,
                user.display_name,
                user.public_key.to_hex(),
                encode_time(&user.registered_at)
            ],
        )?;
        if inserted == 0 {
            return Err(StoreError::UserExists(user.id.clone()).into());
        }
        debug!(user = %user.id, key = %user.public_key.fingerprint(), "user created");
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<Option<User>> {
        let conn = self.conn.lock();
        let row = conn
            .query_row(
                "SELECT id, display_name, public_key, registered_at FROM users WHERE id = ?1",
                params![id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                    ))
                },
            )
            .optional()?;

        let Some((id, display_name, public_key, registered_at)) = row else {
            return Ok(None);
        };

        Ok(Some(User {
            id,
            display_name,
            public_key: PublicKey::from_hex(&public_key).map_err(|e| corrupt("public key", e))?,
            registered_at: decode_time(&registered_at)?,
        }))
    }

    fn update_user(&self, user: &User) -> Result<()> {
        let conn = self.conn.lock();
        let updated = conn.execute(
            "UPDATE users SET display_name = ?2, public_key = ?3, registered_at = ?4 WHERE id = ?1",
            params![
                user.id,
                user.display_name,
                user.public_key.to_hex(),
                encode_time(&user.registered_at)
            ],
        )?;
        if updated == 0 {
            return Err(StoreError::UserNotFound(user.id.clone()).into());
        }
        debug!(user = %user.id, key = %user.public_key.fingerprint(), "user updated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cipher::KeyPair;
    use tempfile::TempDir;

    #[test]
    fn test_contract_in_memory() {
        crate::core::store::tests::exercise_contract(&SqliteStore::open_in_memory().unwrap());
    }

    #[test]
    fn test_data_survives_reopen() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested/dir/esec.db");
        let project = ProjectId::new("acme/api").unwrap();
        let user = User::new("u1", "Alice", KeyPair::generate().public);

        {
            let store = SqliteStore::open(&path).unwrap();
            store.create_project(&project).unwrap();
            store.create_user(&user).unwrap();
            store
                .replace_all_per_user_secrets(&project, &PerUserSecrets::new())
                .unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.get_project(&project).unwrap().is_some());
        assert_eq!(store.get_user("u1").unwrap(), Some(user));
        assert_eq!(
            store.get_all_per_user_secrets(&project).unwrap(),
            Some(PerUserSecrets::new())
        );
    }

    #[test]
    fn test_failed_replace_keeps_previous_set() {
        let store = SqliteStore::open_in_memory().unwrap();
        let project = ProjectId::new("acme/api").unwrap();
        store.create_project(&project).unwrap();

        let mut before = PerUserSecrets::new();
        before.insert("u1", UserSecrets::from([("K".to_string(), "v".to_string())]));
        store.replace_all_per_user_secrets(&project, &before).unwrap();

        // Make the insert step fail after the delete has run.
        store
            .conn
            .lock()
            .execute_batch(
                "CREATE TRIGGER reject_u2 BEFORE INSERT ON user_secrets
                 WHEN NEW.user_id = 'u2'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();

        let mut after = PerUserSecrets::new();
        after.insert("u0", UserSecrets::new());
        after.insert("u2", UserSecrets::new());
        assert!(store.replace_all_per_user_secrets(&project, &after).is_err());

        assert_eq!(store.get_all_per_user_secrets(&project).unwrap(), Some(before));
    }

    #[test]
    fn test_concurrent_writers_on_one_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("esec.db");
        let project = ProjectId::new("acme/api").unwrap();
        SqliteStore::open(&path).unwrap().create_project(&project).unwrap();

        let sets: Vec<PerUserSecrets> = (0..8)
            .map(|i| {
                let mut set = PerUserSecrets::new();
                for user in ["a", "b", "c"] {
                    set.insert(user, UserSecrets::from([("K".to_string(), format!("v{i}"))]));
                }
                set
            })
            .collect();

        std::thread::scope(|scope| {
            for set in &sets {
                let path = &path;
                let project = &project;
                scope.spawn(move || {
                    // Separate connections, as separate processes would have.
                    let store = SqliteStore::open(path).unwrap();
                    store.replace_all_per_user_secrets(project, set).unwrap();
                });
            }
        });

        let last = SqliteStore::open(&path)
            .unwrap()
            .get_all_per_user_secrets(&project)
            .unwrap()
            .unwrap();
        assert!(sets.contains(&last), "replacements interleaved: {last:?}");
    }
}
