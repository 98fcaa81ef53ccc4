use highlander_core::model::resiliency::ResiliencyGroup;
use highlander_core::{
    into_values, CallerContext, DbError, RepoError, Store, StoreConfig, Values,
};
use serde_json::json;
use tempfile::TempDir;

fn setup() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::open(StoreConfig::file(dir.path().join("tx.db"))).unwrap();
    store.setup_schema().unwrap();
    (dir, store)
}

fn tenant() -> CallerContext {
    CallerContext::new("t1").unwrap()
}

fn group(name: &str) -> Values {
    into_values(json!({ "name": name, "strategy_type": "ufr" })).unwrap()
}

fn group_names(store: &Store) -> Vec<String> {
    let session = store.session(tenant()).unwrap();
    session
        .repo::<ResiliencyGroup>()
        .list(&Values::new())
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect()
}

#[test]
fn committed_work_is_visible_to_other_sessions() {
    let (_dir, store) = setup();
    let writer = store.session(tenant()).unwrap();
    writer
        .transaction(|s| s.repo::<ResiliencyGroup>().create(&group("RG1")))
        .unwrap();
    assert!(!writer.in_transaction());
    assert_eq!(writer.depth(), 0);

    assert_eq!(group_names(&store), vec!["RG1"]);
}

#[test]
fn failed_body_discards_all_its_writes() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();

    let err = session
        .transaction(|s| {
            let repo = s.repo::<ResiliencyGroup>();
            repo.create(&group("RG1"))?;
            repo.create(&group("RG2"))?;
            repo.create(&group("RG1"))
        })
        .unwrap_err();
    assert!(matches!(err, RepoError::DuplicateEntry { .. }));
    assert!(!session.in_transaction());

    assert!(group_names(&store).is_empty());
}

#[test]
fn explicit_rollback_discards_work() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();

    session.begin().unwrap();
    session
        .repo::<ResiliencyGroup>()
        .create(&group("RG1"))
        .unwrap();
    session.rollback().unwrap();
    assert!(!session.in_transaction());
    session.end().unwrap();

    assert!(group_names(&store).is_empty());
}

#[test]
fn nested_scopes_share_one_transaction() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();

    session.begin().unwrap();
    session
        .repo::<ResiliencyGroup>()
        .create(&group("outer"))
        .unwrap();

    session
        .transaction(|s| {
            assert_eq!(s.depth(), 2);
            s.repo::<ResiliencyGroup>().create(&group("inner"))
        })
        .unwrap();
    // The inner commit did not end the physical transaction.
    assert!(session.in_transaction());
    assert_eq!(session.depth(), 1);

    session.end().unwrap();
    assert!(!session.in_transaction());
    assert!(group_names(&store).is_empty());

    session
        .transaction(|s| {
            s.repo::<ResiliencyGroup>().create(&group("outer"))?;
            s.transaction(|inner| inner.repo::<ResiliencyGroup>().create(&group("inner")))
        })
        .unwrap();
    assert_eq!(group_names(&store), vec!["inner", "outer"]);
}

#[test]
fn inner_failure_poisons_the_outer_scope() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();

    let outcome = session.transaction(|s| {
        s.repo::<ResiliencyGroup>().create(&group("outer"))?;
        let inner: Result<ResiliencyGroup, RepoError> = s.transaction(|inner| {
            inner.repo::<ResiliencyGroup>().create(&group("outer"))
        });
        inner
    });
    assert!(outcome.is_err());
    assert!(group_names(&store).is_empty());
}

#[test]
fn dropping_a_session_rolls_back_open_work() {
    let (_dir, store) = setup();
    {
        let session = store.session(tenant()).unwrap();
        session.begin().unwrap();
        session
            .repo::<ResiliencyGroup>()
            .create(&group("RG1"))
            .unwrap();
    }
    assert!(group_names(&store).is_empty());
}

#[test]
fn commit_without_a_scope_is_rejected() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();
    assert!(matches!(
        session.commit().unwrap_err(),
        DbError::NoActiveTransaction
    ));
    session.end().unwrap();
    assert_eq!(session.depth(), 0);
}

#[test]
fn rollback_then_commit_in_same_scope_does_not_persist() {
    let (_dir, store) = setup();
    let session = store.session(tenant()).unwrap();

    session.begin().unwrap();
    session
        .repo::<ResiliencyGroup>()
        .create(&group("RG1"))
        .unwrap();
    session.rollback().unwrap();
    session.commit().unwrap();
    session.end().unwrap();

    assert!(group_names(&store).is_empty());
}
