use rusqlite::{Connection, OptionalExtension, Result as SqlResult, params};
use std::path::Path;

use super::models::Profile;

pub const DEFAULT_DB_PATH: &str = "data/client.db";

/// Stores the one cached nickname so the next start can skip the login screen
pub struct ProfileDatabase {
    conn: Connection,
}

impl ProfileDatabase {
    /// Open (or create) the profile database at `path`
    pub fn with_path<P: AsRef<Path>>(path: P) -> SqlResult<Self> {
        Self::open(Connection::open(path)?)
    }

    pub fn in_memory() -> SqlResult<Self> {
        Self::open(Connection::open_in_memory()?)
    }

    fn open(conn: Connection) -> SqlResult<Self> {
        let profile_db = Self { conn };
        profile_db.init_schema()?;
        Ok(profile_db)
    }

    fn init_schema(&self) -> SqlResult<()> {
        // Profile table (single row)
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                username TEXT NOT NULL,
                saved_at INTEGER NOT NULL DEFAULT (strftime('%s', 'now'))
            )",
            [],
        )?;
        Ok(())
    }

    pub fn load_profile(&self) -> SqlResult<Option<Profile>> {
        self.conn
            .query_row(
                "SELECT username, saved_at FROM profile WHERE id = 1",
                [],
                |row| {
                    Ok(Profile {
                        username: row.get(0)?,
                        saved_at: row.get(1)?,
                    })
                },
            )
            .optional()
    }

    pub fn load_username(&self) -> SqlResult<Option<String>> {
        Ok(self.load_profile()?.map(|profile| profile.username))
    }

    pub fn save_username(&self, username: &str) -> SqlResult<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO profile (id, username, saved_at)
             VALUES (1, ?1, strftime('%s', 'now'))",
            params![username],
        )?;
        Ok(())
    }

    pub fn clear_username(&self) -> SqlResult<()> {
        self.conn.execute("DELETE FROM profile WHERE id = 1", [])?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_round_trip_and_clear() {
        let db = ProfileDatabase::in_memory().unwrap();
        assert_eq!(db.load_username().unwrap(), None);

        db.save_username("minh").unwrap();
        db.save_username("lan").unwrap();
        assert_eq!(db.load_username().unwrap(), Some("lan".to_string()));
        assert!(db.load_profile().unwrap().unwrap().saved_at > 0);

        db.clear_username().unwrap();
        assert_eq!(db.load_username().unwrap(), None);
        db.clear_username().unwrap();
    }

    #[test]
    fn username_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.db");

        ProfileDatabase::with_path(&path)
            .unwrap()
            .save_username("hoa")
            .unwrap();

        let reopened = ProfileDatabase::with_path(&path).unwrap();
        assert_eq!(reopened.load_username().unwrap(), Some("hoa".to_string()));
    }
}
