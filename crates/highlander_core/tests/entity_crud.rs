use highlander_core::model::resiliency::{
    ResiliencyGroup, ResiliencyServer, ResiliencyServerGroup, StrategyType,
};
use highlander_core::{
    into_values, CallerContext, DbError, EntityKind, ErrorKind, RepoError, Scope, Store, Values,
};
use serde_json::json;
use uuid::Uuid;

fn setup() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.setup_schema().unwrap();
    store
}

fn tenant(project_id: &str) -> CallerContext {
    CallerContext::new(project_id).unwrap()
}

fn values(value: serde_json::Value) -> Values {
    into_values(value).unwrap()
}

#[test]
fn create_then_get_round_trips_supplied_fields() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();

    let created: ResiliencyGroup = session
        .transaction(|s| {
            s.repo::<ResiliencyGroup>().create(&values(json!({
                "name": "RG1",
                "description": "first group",
                "strategy_type": "ufr",
                "stack_id": "stack-7"
            })))
        })
        .unwrap();

    assert_eq!(created.name, "RG1");
    assert_eq!(created.description.as_deref(), Some("first group"));
    assert_eq!(created.strategy_type, StrategyType::Ufr);
    assert_eq!(created.stack_id.as_deref(), Some("stack-7"));
    assert_eq!(created.record.project_id, "t1");
    assert_eq!(created.record.scope, Scope::Private);
    assert!(created.record.is_live());
    assert_eq!(created.record.created_at, created.record.updated_at);

    let repo = session.repo::<ResiliencyGroup>();
    let first = repo.get(created.record.id).unwrap();
    let second = repo.get(created.record.id).unwrap();
    assert_eq!(first, created);
    assert_eq!(first, second);
}

#[test]
fn list_is_ordered_by_name_and_honours_filters() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    session
        .transaction(|s| {
            let repo = s.repo::<ResiliencyGroup>();
            repo.create(&values(json!({ "name": "charlie", "strategy_type": "nm" })))?;
            repo.create(&values(json!({ "name": "alpha", "strategy_type": "ufr" })))?;
            repo.create(&values(json!({ "name": "bravo", "strategy_type": "ufr", "stack_id": "s" })))?;
            Ok::<_, RepoError>(())
        })
        .unwrap();

    let repo = session.repo::<ResiliencyGroup>();
    let names: Vec<String> = repo
        .list(&Values::new())
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect();
    assert_eq!(names, vec!["alpha", "bravo", "charlie"]);

    let ufr = repo.list(&values(json!({ "strategy_type": "ufr" }))).unwrap();
    assert_eq!(ufr.len(), 2);

    let without_stack = repo
        .list(&values(json!({ "strategy_type": "ufr", "stack_id": null })))
        .unwrap();
    assert_eq!(without_stack.len(), 1);
    assert_eq!(without_stack[0].name, "alpha");
}

#[test]
fn update_overwrites_only_given_fields() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    let (created, updated) = session
        .transaction(|s| {
            let repo = s.repo::<ResiliencyGroup>();
            let created = repo.create(&values(json!({
                "name": "RG1",
                "description": "before",
                "strategy_type": "ft"
            })))?;
            let updated =
                repo.update(created.record.id, &values(json!({ "description": "after" })))?;
            Ok::<_, RepoError>((created, updated))
        })
        .unwrap();

    assert_eq!(updated.name, "RG1");
    assert_eq!(updated.description.as_deref(), Some("after"));
    assert_eq!(updated.strategy_type, StrategyType::Ft);
    assert_eq!(updated.record.created_at, created.record.created_at);
    assert!(updated.record.updated_at >= created.record.updated_at);
    assert_eq!(session.repo::<ResiliencyGroup>().get(created.record.id).unwrap(), updated);
}

#[test]
fn create_or_update_creates_with_supplied_id_then_updates() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    let id = Uuid::new_v4();

    let created = session
        .transaction(|s| {
            s.repo::<ResiliencyGroup>().create_or_update(
                id,
                &values(json!({ "name": "RG9", "strategy_type": "nm" })),
            )
        })
        .unwrap();
    assert_eq!(created.record.id, id);

    let updated = session
        .transaction(|s| {
            s.repo::<ResiliencyGroup>()
                .create_or_update(id, &values(json!({ "description": "patched" })))
        })
        .unwrap();
    assert_eq!(updated.record.id, id);
    assert_eq!(updated.name, "RG9");
    assert_eq!(updated.description.as_deref(), Some("patched"));
    assert_eq!(session.repo::<ResiliencyGroup>().list(&Values::new()).unwrap().len(), 1);
}

#[test]
fn system_managed_and_unknown_fields_are_rejected() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    session.begin().unwrap();
    let repo = session.repo::<ResiliencyGroup>();

    for field in ["id", "project_id", "created_at", "updated_at", "deleted_at"] {
        let mut input = values(json!({ "name": "RG1", "strategy_type": "ufr" }));
        input.insert(field.to_string(), json!("t2"));
        let err = repo.create(&input).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput, "field {field}");
    }

    let err = repo
        .create(&values(json!({ "name": "RG1", "strategy_type": "ufr", "colour": "red" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert!(err.to_string().contains("colour"));

    session.end().unwrap();
}

#[test]
fn mistyped_or_missing_values_are_invalid_input() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    session.begin().unwrap();
    let repo = session.repo::<ResiliencyGroup>();

    let wrong_type = repo
        .create(&values(json!({ "name": 42, "strategy_type": "ufr" })))
        .unwrap_err();
    assert_eq!(wrong_type.kind(), ErrorKind::InvalidInput);

    let unknown_strategy = repo
        .create(&values(json!({ "name": "RG1", "strategy_type": "raid" })))
        .unwrap_err();
    assert_eq!(unknown_strategy.kind(), ErrorKind::InvalidInput);

    let missing_name = repo
        .create(&values(json!({ "strategy_type": "ufr" })))
        .unwrap_err();
    assert_eq!(missing_name.kind(), ErrorKind::InvalidInput);

    let bad_filter = repo
        .list(&values(json!({ "strategy_type": 3 })))
        .unwrap_err();
    assert_eq!(bad_filter.kind(), ErrorKind::InvalidInput);

    session.end().unwrap();
}

#[test]
fn duplicate_name_in_same_project_is_rejected() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    session.begin().unwrap();
    let repo = session.repo::<ResiliencyGroup>();

    repo.create(&values(json!({ "name": "RG1", "strategy_type": "ufr" })))
        .unwrap();
    let err = repo
        .create(&values(json!({ "name": "RG1", "strategy_type": "ft" })))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::DuplicateEntry);
    assert_eq!(
        err.to_string(),
        "Duplicate entry for ResiliencyGroup: name=RG1, project_id=t1"
    );
    session.end().unwrap();
}

#[test]
fn missing_rows_and_references_are_not_found() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    session.begin().unwrap();

    let ghost = Uuid::new_v4();
    let err = session.repo::<ResiliencyGroup>().get(ghost).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(
        err.to_string(),
        format!("ResiliencyGroup not found [id={ghost}]")
    );
    assert!(session.repo::<ResiliencyGroup>().find(ghost).unwrap().is_none());

    let err = session
        .repo::<ResiliencyGroup>()
        .update(ghost, &values(json!({ "description": "x" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = session.repo::<ResiliencyGroup>().delete(ghost).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = session
        .repo::<ResiliencyServerGroup>()
        .create(&values(json!({
            "name": "RSG1",
            "strategy_type": "ufr",
            "resiliency_group_id": ghost.to_string()
        })))
        .unwrap_err();
    match err {
        RepoError::NotFound { entity, id } => {
            assert_eq!(entity, EntityKind::ResiliencyGroup.label());
            assert_eq!(id, ghost.to_string());
        }
        other => panic!("unexpected error: {other}"),
    }

    session.end().unwrap();
}

#[test]
fn mutations_require_an_active_transaction() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    let repo = session.repo::<ResiliencyGroup>();

    let err = repo
        .create(&values(json!({ "name": "RG1", "strategy_type": "ufr" })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataAccessFailure);
    assert!(matches!(err, RepoError::Db(DbError::NoActiveTransaction)));

    assert!(matches!(
        repo.delete_all(&Values::new()).unwrap_err(),
        RepoError::Db(DbError::NoActiveTransaction)
    ));

    // Reads run without a transaction.
    assert!(repo.list(&Values::new()).unwrap().is_empty());
}

#[test]
fn server_defaults_are_stored_and_read_back() {
    let store = setup();
    let session = store.session(tenant("t1")).unwrap();
    let server = session
        .transaction(|s| {
            let group = s
                .repo::<ResiliencyServerGroup>()
                .create(&values(json!({ "name": "pair", "strategy_type": "ufr" })))?;
            s.repo::<ResiliencyServer>().create(&values(json!({
                "name": "srv-a",
                "strategy_type": "ufr",
                "resiliency_id": 1,
                "affinity": "rack-1",
                "resiliency_server_group_id": group.record.id.to_string()
            })))
        })
        .unwrap();

    let loaded = session.repo::<ResiliencyServer>().get(server.record.id).unwrap();
    assert!(!loaded.is_recovery);
    assert!(!loaded.was_relocated);
    assert_eq!(loaded.resiliency_id, Some(1));
    assert_eq!(loaded.affinity.as_deref(), Some("rack-1"));
    assert_eq!(loaded, server);
}
