use rusqlite::Connection;
use std::cell::RefCell;
use std::fmt::Debug;
use std::rc::Rc;
use streetcode_core::db::{open_db, open_db_in_memory};
use streetcode_core::{
    ErrorCategory, Fact, FactError, FactFilter, FactId, FactRepository, NewFact, NewStreetcode,
    RepoError, RepoResult, ReorderFactCommand, ReorderFactHandler, ReorderFactRequest,
    RequestHandler, RequestLogger, SqliteFactRepository, SqliteStreetcodeRepository,
    StreetcodeId, StreetcodeRepository,
};

#[derive(Clone, Default)]
struct RecordingLogger {
    messages: Rc<RefCell<Vec<String>>>,
}

impl RecordingLogger {
    fn messages(&self) -> Vec<String> {
        self.messages.borrow().clone()
    }
}

impl RequestLogger for RecordingLogger {
    fn log_error(&self, _request: &dyn Debug, message: &str) {
        self.messages.borrow_mut().push(message.to_string());
    }
}

fn seed_streetcode(
    conn: &Connection,
    index: i64,
    fact_count: usize,
) -> (StreetcodeId, Vec<FactId>) {
    let streetcodes = SqliteStreetcodeRepository::try_new(conn).unwrap();
    let streetcode = streetcodes
        .create_streetcode(&NewStreetcode {
            index,
            title: format!("Streetcode {index}"),
        })
        .unwrap();

    let facts = SqliteFactRepository::try_new(conn).unwrap();
    let ids = (0..fact_count)
        .map(|n| {
            facts
                .create_fact(&NewFact {
                    streetcode_id: streetcode.id,
                    title: format!("Fact {n}"),
                    fact_content: format!("Content {n}"),
                    image_id: None,
                })
                .unwrap()
                .id
        })
        .collect();
    (streetcode.id, ids)
}

fn numbers_by_id(conn: &Connection, streetcode_id: StreetcodeId) -> Vec<(FactId, i64)> {
    let repo = SqliteFactRepository::try_new(conn).unwrap();
    let mut pairs = repo
        .list_facts(&FactFilter::by_streetcode(streetcode_id))
        .unwrap()
        .into_iter()
        .map(|fact| (fact.id, fact.number))
        .collect::<Vec<_>>();
    pairs.sort();
    pairs
}

fn reorder_command(streetcode_id: StreetcodeId, ids: Option<Vec<FactId>>) -> ReorderFactCommand {
    ReorderFactCommand {
        request: ReorderFactRequest {
            streetcode_id,
            reordered_ids: ids,
        },
    }
}

fn permutations(items: &[FactId]) -> Vec<Vec<FactId>> {
    if items.len() <= 1 {
        return vec![items.to_vec()];
    }
    let mut result = Vec::new();
    for (index, &head) in items.iter().enumerate() {
        let mut rest = items.to_vec();
        rest.remove(index);
        for mut tail in permutations(&rest) {
            tail.insert(0, head);
            result.push(tail);
        }
    }
    result
}

#[test]
fn reorder_assigns_numbers_by_position() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 7, 3);
    let (first, second, third) = (ids[0], ids[1], ids[2]);

    let logger = RecordingLogger::default();
    let handler =
        ReorderFactHandler::new(SqliteFactRepository::try_new(&conn).unwrap(), logger.clone());

    let response = handler
        .handle(&reorder_command(streetcode_id, Some(vec![third, first, second])))
        .unwrap();

    assert!(response.is_reordered);
    assert_eq!(
        numbers_by_id(&conn, streetcode_id),
        vec![(first, 2), (second, 3), (third, 1)]
    );
    assert!(logger.messages().is_empty());
}

#[test]
fn reorder_accepts_every_permutation() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 1, 4);
    let handler = ReorderFactHandler::new(
        SqliteFactRepository::try_new(&conn).unwrap(),
        RecordingLogger::default(),
    );

    for order in permutations(&ids) {
        handler
            .handle(&reorder_command(streetcode_id, Some(order.clone())))
            .unwrap();

        let repo = SqliteFactRepository::try_new(&conn).unwrap();
        let listed = repo
            .list_facts(&FactFilter::by_streetcode(streetcode_id))
            .unwrap()
            .into_iter()
            .map(|fact| fact.id)
            .collect::<Vec<_>>();
        assert_eq!(listed, order);
    }
}

#[test]
fn reorder_rejects_absent_and_empty_lists() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, _) = seed_streetcode(&conn, 1, 2);
    let before = numbers_by_id(&conn, streetcode_id);

    let logger = RecordingLogger::default();
    let handler =
        ReorderFactHandler::new(SqliteFactRepository::try_new(&conn).unwrap(), logger.clone());

    let absent = handler
        .handle(&reorder_command(streetcode_id, None))
        .unwrap_err();
    assert!(matches!(absent, FactError::EmptyReorderList));
    assert_eq!(absent.category(), ErrorCategory::Validation);

    let empty = handler
        .handle(&reorder_command(streetcode_id, Some(Vec::new())))
        .unwrap_err();
    assert!(matches!(empty, FactError::EmptyReorderList));

    assert_eq!(numbers_by_id(&conn, streetcode_id), before);
    assert_eq!(logger.messages().len(), 2);
}

#[test]
fn reorder_rejects_streetcode_without_facts() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, _) = seed_streetcode(&conn, 1, 0);
    let logger = RecordingLogger::default();
    let handler =
        ReorderFactHandler::new(SqliteFactRepository::try_new(&conn).unwrap(), logger.clone());

    let err = handler
        .handle(&reorder_command(streetcode_id, Some(vec![1])))
        .unwrap_err();

    assert!(matches!(err, FactError::NoFactsInStreetcode(id) if id == streetcode_id));
    assert_eq!(
        logger.messages(),
        vec![format!(
            "Cannot find any fact by a streetcode id: {streetcode_id}"
        )]
    );
}

#[test]
fn reorder_rejects_length_mismatch_without_changes() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 1, 3);
    let before = numbers_by_id(&conn, streetcode_id);
    let handler = ReorderFactHandler::new(
        SqliteFactRepository::try_new(&conn).unwrap(),
        RecordingLogger::default(),
    );

    let err = handler
        .handle(&reorder_command(streetcode_id, Some(vec![ids[1], ids[0]])))
        .unwrap_err();

    assert!(matches!(
        err,
        FactError::IdCountMismatch {
            provided: 2,
            existing: 3,
            ..
        }
    ));
    assert_eq!(err.category(), ErrorCategory::Consistency);
    assert_eq!(numbers_by_id(&conn, streetcode_id), before);
}

#[test]
fn reorder_rejects_duplicates_even_when_length_matches() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 1, 3);
    let before = numbers_by_id(&conn, streetcode_id);
    let handler = ReorderFactHandler::new(
        SqliteFactRepository::try_new(&conn).unwrap(),
        RecordingLogger::default(),
    );

    let err = handler
        .handle(&reorder_command(
            streetcode_id,
            Some(vec![ids[2], ids[0], ids[2]]),
        ))
        .unwrap_err();

    assert!(matches!(err, FactError::DuplicateFactId { fact_id, .. } if fact_id == ids[2]));
    assert_eq!(numbers_by_id(&conn, streetcode_id), before);
}

#[test]
fn reorder_rejects_fact_of_other_streetcode_and_discards_staged_numbers() {
    let conn = open_db_in_memory().unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 1, 3);
    let (_, foreign_ids) = seed_streetcode(&conn, 2, 1);
    let before = numbers_by_id(&conn, streetcode_id);

    let logger = RecordingLogger::default();
    let repo = SqliteFactRepository::try_new(&conn).unwrap();
    let handler = ReorderFactHandler::new(repo, logger.clone());

    let err = handler
        .handle(&reorder_command(
            streetcode_id,
            Some(vec![ids[2], ids[1], foreign_ids[0]]),
        ))
        .unwrap_err();

    assert!(matches!(
        err,
        FactError::FactNotInStreetcode { fact_id, streetcode_id: owner }
            if fact_id == foreign_ids[0] && owner == streetcode_id
    ));
    assert_eq!(numbers_by_id(&conn, streetcode_id), before);
    assert_eq!(logger.messages().len(), 1);

    // A later valid reorder through the same handler must not pick up the
    // numbers staged by the failed call.
    handler
        .handle(&reorder_command(streetcode_id, Some(ids.clone())))
        .unwrap();
    assert_eq!(
        numbers_by_id(&conn, streetcode_id),
        vec![(ids[0], 1), (ids[1], 2), (ids[2], 3)]
    );
}

/// In-memory fact store whose commits report a configurable row count.
#[derive(Clone, Default)]
struct ScriptedFacts {
    state: Rc<RefCell<ScriptedState>>,
}

#[derive(Default)]
struct ScriptedState {
    facts: Vec<Fact>,
    staged: Vec<Fact>,
    forced_affected: Option<usize>,
    fail_save: bool,
    saves: usize,
}

impl ScriptedFacts {
    fn with_facts(streetcode_id: StreetcodeId, ids: &[FactId]) -> Self {
        let store = Self::default();
        store.state.borrow_mut().facts = ids
            .iter()
            .enumerate()
            .map(|(position, &id)| Fact {
                id,
                number: position as i64 + 1,
                title: format!("Fact {id}"),
                fact_content: "content".to_string(),
                image_id: None,
                streetcode_id,
            })
            .collect();
        store
    }

    fn matching(&self, filter: &FactFilter) -> Vec<Fact> {
        self.state
            .borrow()
            .facts
            .iter()
            .filter(|fact| filter.id.map_or(true, |id| id == fact.id))
            .filter(|fact| {
                filter
                    .streetcode_id
                    .map_or(true, |id| id == fact.streetcode_id)
            })
            .cloned()
            .collect()
    }
}

impl FactRepository for ScriptedFacts {
    fn create_fact(&self, _fact: &NewFact) -> RepoResult<Fact> {
        unimplemented!("not used by reorder")
    }

    fn find_fact(&self, filter: &FactFilter) -> RepoResult<Option<Fact>> {
        Ok(self.matching(filter).into_iter().next())
    }

    fn list_facts(&self, filter: &FactFilter) -> RepoResult<Vec<Fact>> {
        Ok(self.matching(filter))
    }

    fn count_facts(&self, filter: &FactFilter) -> RepoResult<usize> {
        Ok(self.matching(filter).len())
    }

    fn max_number(&self, streetcode_id: StreetcodeId) -> RepoResult<Option<i64>> {
        Ok(self
            .matching(&FactFilter::by_streetcode(streetcode_id))
            .iter()
            .map(|fact| fact.number)
            .max())
    }

    fn update_fact(&self, fact: &Fact) -> RepoResult<()> {
        self.state.borrow_mut().staged.push(fact.clone());
        Ok(())
    }

    fn save_changes(&self) -> RepoResult<usize> {
        let mut state = self.state.borrow_mut();
        state.saves += 1;
        let staged = std::mem::take(&mut state.staged);
        if state.fail_save {
            return Err(RepoError::InvalidData("disk image is malformed".to_string()));
        }
        if let Some(forced) = state.forced_affected {
            return Ok(forced);
        }
        let count = staged.len();
        for update in staged {
            if let Some(fact) = state.facts.iter_mut().find(|fact| fact.id == update.id) {
                *fact = update;
            }
        }
        Ok(count)
    }

    fn discard_changes(&self) {
        self.state.borrow_mut().staged.clear();
    }

    fn delete_fact(&self, _id: FactId) -> RepoResult<Fact> {
        unimplemented!("not used by reorder")
    }
}

#[test]
fn reorder_fails_when_commit_changes_nothing() {
    let store = ScriptedFacts::with_facts(7, &[10, 11, 12]);
    store.state.borrow_mut().forced_affected = Some(0);
    let logger = RecordingLogger::default();
    let handler = ReorderFactHandler::new(store.clone(), logger.clone());

    let err = handler
        .handle(&reorder_command(7, Some(vec![12, 10, 11])))
        .unwrap_err();

    assert!(matches!(err, FactError::NumbersNotUpdated(7)));
    assert_eq!(err.category(), ErrorCategory::Persistence);
    assert_eq!(store.state.borrow().saves, 1);
    assert_eq!(
        logger.messages(),
        vec!["Cannot update numbers of facts in streetcode 7".to_string()]
    );
}

#[test]
fn reorder_never_saves_when_lookup_misses() {
    let store = ScriptedFacts::with_facts(7, &[10, 11, 12]);
    let handler = ReorderFactHandler::new(store.clone(), RecordingLogger::default());

    let err = handler
        .handle(&reorder_command(7, Some(vec![12, 10, 99])))
        .unwrap_err();

    assert!(matches!(err, FactError::FactNotInStreetcode { fact_id: 99, .. }));
    let state = store.state.borrow();
    assert_eq!(state.saves, 0);
    assert!(state.staged.is_empty());
    assert_eq!(
        state.facts.iter().map(|f| f.number).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn reorder_example_from_streetcode_seven() {
    let store = ScriptedFacts::with_facts(7, &[10, 11, 12]);
    let handler = ReorderFactHandler::new(store.clone(), RecordingLogger::default());

    let response = handler
        .handle(&reorder_command(7, Some(vec![12, 10, 11])))
        .unwrap();

    assert!(response.is_reordered);
    let numbers = store
        .state
        .borrow()
        .facts
        .iter()
        .map(|fact| (fact.id, fact.number))
        .collect::<Vec<_>>();
    assert_eq!(numbers, vec![(10, 2), (11, 3), (12, 1)]);
}

#[test]
fn reorder_fails_when_commit_writes_fewer_rows_than_ids() {
    let store = ScriptedFacts::with_facts(7, &[10, 11, 12]);
    store.state.borrow_mut().forced_affected = Some(2);
    let handler = ReorderFactHandler::new(store, RecordingLogger::default());

    let err = handler
        .handle(&reorder_command(7, Some(vec![12, 10, 11])))
        .unwrap_err();

    assert!(matches!(err, FactError::NumbersNotUpdated(7)));
}

#[test]
fn reorder_reports_storage_failure_once() {
    let store = ScriptedFacts::with_facts(7, &[10, 11, 12]);
    store.state.borrow_mut().fail_save = true;
    let logger = RecordingLogger::default();
    let handler = ReorderFactHandler::new(store, logger.clone());

    let err = handler
        .handle(&reorder_command(7, Some(vec![12, 10, 11])))
        .unwrap_err();

    assert!(matches!(err, FactError::Repo(RepoError::InvalidData(_))));
    assert_eq!(err.category(), ErrorCategory::Storage);
    assert_eq!(logger.messages().len(), 1);
}

/// Deletes one fact through a second connection right before committing,
/// as a concurrent writer would.
struct DeleteBeforeSave<'conn> {
    inner: SqliteFactRepository<'conn>,
    other: Connection,
    victim: FactId,
}

impl FactRepository for DeleteBeforeSave<'_> {
    fn create_fact(&self, fact: &NewFact) -> RepoResult<Fact> {
        self.inner.create_fact(fact)
    }

    fn find_fact(&self, filter: &FactFilter) -> RepoResult<Option<Fact>> {
        self.inner.find_fact(filter)
    }

    fn list_facts(&self, filter: &FactFilter) -> RepoResult<Vec<Fact>> {
        self.inner.list_facts(filter)
    }

    fn count_facts(&self, filter: &FactFilter) -> RepoResult<usize> {
        self.inner.count_facts(filter)
    }

    fn max_number(&self, streetcode_id: StreetcodeId) -> RepoResult<Option<i64>> {
        self.inner.max_number(streetcode_id)
    }

    fn update_fact(&self, fact: &Fact) -> RepoResult<()> {
        self.inner.update_fact(fact)
    }

    fn save_changes(&self) -> RepoResult<usize> {
        SqliteFactRepository::try_new(&self.other)?.delete_fact(self.victim)?;
        self.inner.save_changes()
    }

    fn discard_changes(&self) {
        self.inner.discard_changes()
    }

    fn delete_fact(&self, id: FactId) -> RepoResult<Fact> {
        self.inner.delete_fact(id)
    }
}

#[test]
fn reorder_persists_nothing_when_listed_fact_vanishes_before_commit() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("streetcode.sqlite3");
    let conn = open_db(&path).unwrap();
    let (streetcode_id, ids) = seed_streetcode(&conn, 1, 3);
    let (a, b, c) = (ids[0], ids[1], ids[2]);

    let logger = RecordingLogger::default();
    let repo = DeleteBeforeSave {
        inner: SqliteFactRepository::try_new(&conn).unwrap(),
        other: open_db(&path).unwrap(),
        victim: a,
    };
    let handler = ReorderFactHandler::new(repo, logger.clone());

    let err = handler
        .handle(&reorder_command(streetcode_id, Some(vec![c, a, b])))
        .unwrap_err();

    assert!(matches!(err, FactError::NumbersNotUpdated(id) if id == streetcode_id));
    assert_eq!(logger.messages().len(), 1);
    // Only the concurrent delete landed, and it closed its own gap.
    assert_eq!(numbers_by_id(&conn, streetcode_id), vec![(b, 1), (c, 2)]);
}
