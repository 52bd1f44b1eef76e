//! Fact repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide filtered fact reads and immediate create/delete.
//! - Stage fact updates and persist them as one batch via `save_changes`.
//!
//! # Invariants
//! - Staged updates are invisible to readers until `save_changes` commits.
//! - `save_changes` applies every staged update in a single transaction or none.
//!   A staged fact whose row is gone or moved voids the whole batch.
//! - Create appends at `max(number) + 1`; delete closes the numbering gap.

use crate::model::fact::{Fact, FactId, NewFact};
use crate::model::streetcode::StreetcodeId;
use crate::repo::{ensure_connection_ready, RepoError, RepoResult};
use log::debug;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction, TransactionBehavior};
use std::cell::RefCell;

const FACT_SELECT_SQL: &str = "SELECT
    id,
    number,
    title,
    fact_content,
    image_id,
    streetcode_id
FROM facts";

/// Row filter for fact reads. Unset fields match everything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FactFilter {
    pub id: Option<FactId>,
    pub streetcode_id: Option<StreetcodeId>,
}

impl FactFilter {
    pub fn by_id(id: FactId) -> Self {
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

    /// Matches one fact only when it belongs to `streetcode_id`.
    pub fn in_streetcode(id: FactId, streetcode_id: StreetcodeId) -> Self {
        Self {
            id: Some(id),
            streetcode_id: Some(streetcode_id),
        }
    }
}

/// Repository interface for facts.
pub trait FactRepository {
    /// Inserts a fact at the end of its streetcode's numbering.
    fn create_fact(&self, fact: &NewFact) -> RepoResult<Fact>;
    /// First fact matching `filter` in `number` order.
    fn find_fact(&self, filter: &FactFilter) -> RepoResult<Option<Fact>>;
    /// All facts matching `filter`, ordered by streetcode then `number`.
    fn list_facts(&self, filter: &FactFilter) -> RepoResult<Vec<Fact>>;
    fn count_facts(&self, filter: &FactFilter) -> RepoResult<usize>;
    /// Highest number in the streetcode, `None` when it has no facts.
    fn max_number(&self, streetcode_id: StreetcodeId) -> RepoResult<Option<i64>>;
    /// Stages a full-row update. Nothing is written until `save_changes`.
    fn update_fact(&self, fact: &Fact) -> RepoResult<()>;
    /// Commits staged updates and returns the number of rows written.
    /// A batch where any staged fact no longer matches its row is rolled
    /// back and reports 0.
    fn save_changes(&self) -> RepoResult<usize>;
    /// Drops staged updates without writing them.
    fn discard_changes(&self);
    /// Deletes one fact and renumbers the facts after it.
    fn delete_fact(&self, id: FactId) -> RepoResult<Fact>;
}

/// SQLite-backed fact repository.
pub struct SqliteFactRepository<'conn> {
    conn: &'conn Connection,
    staged: RefCell<Vec<Fact>>,
}

impl<'conn> SqliteFactRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, &["streetcodes", "facts"])?;
        Ok(Self {
            conn,
            staged: RefCell::new(Vec::new()),
        })
    }

    /// Number of updates waiting for `save_changes`.
    pub fn staged_len(&self) -> usize {
        self.staged.borrow().len()
    }
}

impl FactRepository for SqliteFactRepository<'_> {
    fn create_fact(&self, fact: &NewFact) -> RepoResult<Fact> {
        fact.validate()?;

        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let number: i64 = tx.query_row(
            "SELECT COALESCE(MAX(number), 0) + 1
             FROM facts
             WHERE streetcode_id = ?1;",
            [fact.streetcode_id],
            |row| row.get(0),
        )?;
        tx.execute(
            "INSERT INTO facts (streetcode_id, number, title, fact_content, image_id)
             VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                fact.streetcode_id,
                number,
                fact.title.as_str(),
                fact.fact_content.as_str(),
                fact.image_id,
            ],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;

        Ok(Fact {
            id,
            number,
            title: fact.title.clone(),
            fact_content: fact.fact_content.clone(),
            image_id: fact.image_id,
            streetcode_id: fact.streetcode_id,
        })
    }

    fn find_fact(&self, filter: &FactFilter) -> RepoResult<Option<Fact>> {
        find_first(self.conn, filter)
    }

    fn list_facts(&self, filter: &FactFilter) -> RepoResult<Vec<Fact>> {
        let (clause, binds) = filter_clause(filter);
        let mut stmt = self.conn.prepare(&format!(
            "{FACT_SELECT_SQL}{clause} ORDER BY streetcode_id ASC, number ASC, id ASC;"
        ))?;
        let mut rows = stmt.query(params_from_iter(binds))?;
        let mut facts = Vec::new();
        while let Some(row) = rows.next()? {
            facts.push(parse_fact_row(row)?);
        }
        Ok(facts)
    }

    fn count_facts(&self, filter: &FactFilter) -> RepoResult<usize> {
        let (clause, binds) = filter_clause(filter);
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM facts{clause};"),
            params_from_iter(binds),
            |row| row.get(0),
        )?;
        usize::try_from(count)
            .map_err(|_| RepoError::InvalidData(format!("negative fact count `{count}`")))
    }

    fn max_number(&self, streetcode_id: StreetcodeId) -> RepoResult<Option<i64>> {
        let max = self.conn.query_row(
            "SELECT MAX(number) FROM facts WHERE streetcode_id = ?1;",
            [streetcode_id],
            |row| row.get::<_, Option<i64>>(0),
        )?;
        Ok(max)
    }

    fn update_fact(&self, fact: &Fact) -> RepoResult<()> {
        fact.validate()?;

        let mut staged = self.staged.borrow_mut();
        staged.retain(|pending| pending.id != fact.id);
        staged.push(fact.clone());
        Ok(())
    }

    fn save_changes(&self) -> RepoResult<usize> {
        let staged = self.staged.take();
        if staged.is_empty() {
            return Ok(0);
        }

        let result = commit_staged(self.conn, &staged);
        match &result {
            Ok(affected) => debug!(
                "event=facts_save module=repo status=ok staged={} affected={}",
                staged.len(),
                affected
            ),
            Err(err) => debug!(
                "event=facts_save module=repo status=error staged={} error={}",
                staged.len(),
                err
            ),
        }
        result
    }

    fn discard_changes(&self) {
        self.staged.borrow_mut().clear();
    }

    fn delete_fact(&self, id: FactId) -> RepoResult<Fact> {
        let tx = Transaction::new_unchecked(self.conn, TransactionBehavior::Immediate)?;
        let fact = find_first(&tx, &FactFilter::by_id(id))?
            .ok_or(RepoError::NotFound { entity: "fact", id })?;

        tx.execute("DELETE FROM facts WHERE id = ?1;", [id])?;
        tx.execute(
            "UPDATE facts
             SET number = number - 1,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE streetcode_id = ?1
               AND number > ?2;",
            params![fact.streetcode_id, fact.number],
        )?;
        tx.commit()?;

        Ok(fact)
    }
}


fn find_first(conn: &Connection, filter: &FactFilter) -> RepoResult<Option<Fact>> {
    let (clause, binds) = filter_clause(filter);
    let mut stmt = conn.prepare(&format!(
        "{FACT_SELECT_SQL}{clause} ORDER BY streetcode_id ASC, number ASC, id ASC LIMIT 1;"
    ))?;
    let mut rows = stmt.query(params_from_iter(binds))?;
    if let Some(row) = rows.next()? {
        return Ok(Some(parse_fact_row(row)?));
    }
    Ok(None)
}

fn commit_staged(conn: &Connection, staged: &[Fact]) -> RepoResult<usize> {
    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)?;
    let mut affected = 0;
    for fact in staged {
        // Guarded by streetcode so a fact moved elsewhere meanwhile is not touched.
        affected += tx.execute(
            "UPDATE facts
             SET number = ?2,
                 title = ?3,
                 fact_content = ?4,
                 image_id = ?5,
                 updated_at = (strftime('%s', 'now') * 1000)
             WHERE id = ?1
               AND streetcode_id = ?6;",
            params![
                fact.id,
                fact.number,
                fact.title.as_str(),
                fact.fact_content.as_str(),
                fact.image_id,
                fact.streetcode_id,
            ],
        )?;
    }
    if affected != staged.len() {
        // Dropping `tx` rolls back the rows that did match.
        debug!(
            "event=facts_save module=repo status=rollback staged={} matched={}",
            staged.len(),
            affected
        );
        return Ok(0);
    }
    tx.commit()?;
    Ok(affected)
}

fn filter_clause(filter: &FactFilter) -> (String, Vec<Value>) {
    let mut clause = String::from(" WHERE 1 = 1");
    let mut binds = Vec::new();
    if let Some(id) = filter.id {
        clause.push_str(" AND id = ?");
        binds.push(Value::Integer(id));
    }
    if let Some(streetcode_id) = filter.streetcode_id {
        clause.push_str(" AND streetcode_id = ?");
        binds.push(Value::Integer(streetcode_id));
    }
    (clause, binds)
}

fn parse_fact_row(row: &Row<'_>) -> RepoResult<Fact> {
    let fact = Fact {
        id: row.get("id")?,
        number: row.get("number")?,
        title: row.get("title")?,
        fact_content: row.get("fact_content")?,
        image_id: row.get("image_id")?,
        streetcode_id: row.get("streetcode_id")?,
    };
    fact.validate().map_err(|err| {
        RepoError::InvalidData(format!("fact {} failed validation: {err}", fact.id))
    })?;
    Ok(fact)
}
