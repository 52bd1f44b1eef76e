//! Streetcode repository contract and SQLite implementation.

use crate::model::streetcode::{NewStreetcode, Streetcode, StreetcodeId};
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

pub trait StreetcodeRepository {
    fn create_streetcode(&self, streetcode: &NewStreetcode) -> RepoResult<Streetcode>;
    fn get_streetcode(&self, id: StreetcodeId) -> RepoResult<Option<Streetcode>>;
}

/// SQLite-backed streetcode repository.
pub struct SqliteStreetcodeRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteStreetcodeRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["streetcodes"])?;
        Ok(Self { conn })
    }
}

impl StreetcodeRepository for SqliteStreetcodeRepository<'_> {
    fn create_streetcode(&self, streetcode: &NewStreetcode) -> RepoResult<Streetcode> {
        self.conn.execute(
            "INSERT INTO streetcodes (\"index\", title) VALUES (?1, ?2);",
            params![streetcode.index, streetcode.title.as_str()],
        )?;
        Ok(Streetcode {
            id: self.conn.last_insert_rowid(),
            index: streetcode.index,
            title: streetcode.title.clone(),
        })
    }

    fn get_streetcode(&self, id: StreetcodeId) -> RepoResult<Option<Streetcode>> {
        let streetcode = self
            .conn
            .query_row(
                "SELECT id, \"index\", title FROM streetcodes WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Streetcode {
                        id: row.get(0)?,
                        index: row.get(1)?,
                        title: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(streetcode)
    }
}
