//! Image repository contract and SQLite implementation.

use crate::model::image::{Image, ImageId, NewImage};
use crate::repo::{ensure_connection_ready, RepoResult};
use rusqlite::{params, Connection, OptionalExtension};

pub trait ImageRepository {
    fn create_image(&self, image: &NewImage) -> RepoResult<Image>;
    fn get_image(&self, id: ImageId) -> RepoResult<Option<Image>>;
}

/// SQLite-backed image repository.
pub struct SqliteImageRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteImageRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["images"])?;
        Ok(Self { conn })
    }
}

impl ImageRepository for SqliteImageRepository<'_> {
    fn create_image(&self, image: &NewImage) -> RepoResult<Image> {
        self.conn.execute(
            "INSERT INTO images (blob_name, mime_type, alt) VALUES (?1, ?2, ?3);",
            params![
                image.blob_name.as_str(),
                image.mime_type.as_str(),
                image.alt.as_deref()
            ],
        )?;
        Ok(Image {
            id: self.conn.last_insert_rowid(),
            blob_name: image.blob_name.clone(),
            mime_type: image.mime_type.clone(),
            alt: image.alt.clone(),
        })
    }

    fn get_image(&self, id: ImageId) -> RepoResult<Option<Image>> {
        let image = self
            .conn
            .query_row(
                "SELECT id, blob_name, mime_type, alt FROM images WHERE id = ?1;",
                [id],
                |row| {
                    Ok(Image {
                        id: row.get(0)?,
                        blob_name: row.get(1)?,
                        mime_type: row.get(2)?,
                        alt: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(image)
    }
}
