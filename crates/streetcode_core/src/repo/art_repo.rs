//! Art repository contract and SQLite implementation.
//!
//! # Invariants
//! - Arts are always returned with their image and streetcode links loaded.
//! - Listing by streetcode follows the join `index`; otherwise art id order.

use crate::model::art::{Art, ArtId, NewArt, StreetcodeArt};
use crate::model::image::Image;
use crate::model::streetcode::StreetcodeId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const ART_SELECT_SQL: &str = "SELECT
    a.id AS id,
    a.title AS title,
    a.description AS description,
    a.image_id AS image_id,
    i.id AS joined_image_id,
    i.blob_name AS blob_name,
    i.mime_type AS mime_type,
    i.alt AS alt
FROM arts a
LEFT JOIN images i ON i.id = a.image_id";

/// Row filter for art reads. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArtFilter {
    pub id: Option<ArtId>,
    pub streetcode_id: Option<StreetcodeId>,
}

impl ArtFilter {
    pub fn by_id(id: ArtId) -> Self {
        Self {
            id: Some(id),
            streetcode_id: None,
        }
    }

    pub fn by_streetcode(streetcode_id: StreetcodeId) -> Self {
        Self {
            id: None,
            streetcode_id: Some(streetcode_id),
        }
    }
}

/// Repository interface for arts.
pub trait ArtRepository {
    fn create_art(&self, art: &NewArt) -> RepoResult<Art>;
    fn find_art(&self, filter: &ArtFilter) -> RepoResult<Option<Art>>;
    fn list_arts(&self, filter: &ArtFilter) -> RepoResult<Vec<Art>>;
    /// Places an art inside a streetcode at `link.index`.
    fn link_to_streetcode(&self, link: &StreetcodeArt) -> RepoResult<()>;
}

/// SQLite-backed art repository.
pub struct SqliteArtRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteArtRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["arts", "images", "streetcode_arts"])?;
        Ok(Self { conn })
    }

    fn query_arts(&self, filter: &ArtFilter, limit_one: bool) -> RepoResult<Vec<Art>> {
        let mut sql = String::from(ART_SELECT_SQL);
        let mut binds = Vec::new();

        if let Some(streetcode_id) = filter.streetcode_id {
            sql.push_str(
                " INNER JOIN streetcode_arts sa ON sa.art_id = a.id AND sa.streetcode_id = ?",
            );
            binds.push(Value::Integer(streetcode_id));
        }
        sql.push_str(" WHERE 1 = 1");
        if let Some(id) = filter.id {
            sql.push_str(" AND a.id = ?");
            binds.push(Value::Integer(id));
        }
        if filter.streetcode_id.is_some() {
            sql.push_str(" ORDER BY sa.\"index\" ASC, a.id ASC");
        } else {
            sql.push_str(" ORDER BY a.id ASC");
        }
        if limit_one {
            sql.push_str(" LIMIT 1");
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut arts = Vec::new();
        while let Some(row) = rows.next()? {
            arts.push(parse_art_row(row)?);
        }

        for art in &mut arts {
            art.streetcode_arts = load_streetcode_links(self.conn, art.id)?;
        }
        Ok(arts)
    }
}

impl ArtRepository for SqliteArtRepository<'_> {
    fn create_art(&self, art: &NewArt) -> RepoResult<Art> {
        self.conn.execute(
            "INSERT INTO arts (title, description, image_id) VALUES (?1, ?2, ?3);",
            params![art.title.as_deref(), art.description.as_deref(), art.image_id],
        )?;
        let id = self.conn.last_insert_rowid();
        self.find_art(&ArtFilter::by_id(id))?
            .ok_or(RepoError::NotFound { entity: "art", id })
    }

    fn find_art(&self, filter: &ArtFilter) -> RepoResult<Option<Art>> {
        Ok(self.query_arts(filter, true)?.into_iter().next())
    }

    fn list_arts(&self, filter: &ArtFilter) -> RepoResult<Vec<Art>> {
        self.query_arts(filter, false)
    }

    fn link_to_streetcode(&self, link: &StreetcodeArt) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO streetcode_arts (streetcode_id, art_id, \"index\")
             VALUES (?1, ?2, ?3)
             ON CONFLICT (streetcode_id, art_id) DO UPDATE SET \"index\" = excluded.\"index\";",
            params![link.streetcode_id, link.art_id, link.index],
        )?;
        Ok(())
    }
}

fn load_streetcode_links(conn: &Connection, art_id: ArtId) -> RepoResult<Vec<StreetcodeArt>> {
    let mut stmt = conn.prepare(
        "SELECT \"index\", streetcode_id, art_id
         FROM streetcode_arts
         WHERE art_id = ?1
         ORDER BY \"index\" ASC, streetcode_id ASC;",
    )?;
    let mut rows = stmt.query([art_id])?;
    let mut links = Vec::new();
    while let Some(row) = rows.next()? {
        links.push(StreetcodeArt {
            index: row.get(0)?,
            streetcode_id: row.get(1)?,
            art_id: row.get(2)?,
        });
    }
    Ok(links)
}

fn parse_art_row(row: &Row<'_>) -> RepoResult<Art> {
    let image = match row.get::<_, Option<i64>>("joined_image_id")? {
        Some(id) => Some(Image {
            id,
            blob_name: row.get("blob_name")?,
            mime_type: row.get("mime_type")?,
            alt: row.get("alt")?,
        }),
        None => None,
    };

    Ok(Art {
        id: row.get("id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        image_id: row.get("image_id")?,
        image,
        streetcode_arts: Vec::new(),
    })
}
