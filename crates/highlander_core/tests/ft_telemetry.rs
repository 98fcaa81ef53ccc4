use highlander_core::model::ft::{
    FtALink, FtAx, FtDisk, FtGuest, FtGuestOs, FtLDisk, FtLNic, FtLinkA, FtNic, FtPath, FtPvm,
    FtQLink, FtQuorum,
};
use highlander_core::model::resiliency::{
    ResiliencyGroup, ResiliencyNic, ResiliencyServer, ResiliencyServerGroup,
};
use highlander_core::{
    into_values, CallerContext, Entity, EntityId, ErrorKind, RepoError, Session, Store, Values,
};
use serde_json::json;

fn setup() -> Store {
    let store = Store::open_in_memory().unwrap();
    store.setup_schema().unwrap();
    store
}

fn tenant() -> CallerContext {
    CallerContext::new("ft-lab").unwrap()
}

fn values(value: serde_json::Value) -> Values {
    into_values(value).unwrap()
}

fn ft_server(session: &Session<'_>, name: &str) -> ResiliencyServer {
    let group = session
        .repo::<ResiliencyGroup>()
        .create(&values(json!({ "name": format!("rg-{name}"), "strategy_type": "ft" })))
        .unwrap();
    let pair = session
        .repo::<ResiliencyServerGroup>()
        .create(&values(json!({
            "name": format!("rsg-{name}"),
            "strategy_type": "ft",
            "resiliency_group_id": group.record.id
        })))
        .unwrap();
    session
        .repo::<ResiliencyServer>()
        .create(&values(json!({
            "name": name,
            "strategy_type": "ft",
            "resiliency_id": 1,
            "resiliency_server_group_id": pair.record.id
        })))
        .unwrap()
}

fn create<E: Entity>(session: &Session<'_>, value: serde_json::Value) -> E {
    session.repo::<E>().create(&values(value)).unwrap()
}

fn live<E: Entity>(session: &Session<'_>) -> usize {
    session.repo::<E>().list(&Values::new()).unwrap().len()
}

/// One row of every FT kind under `server`.
fn telemetry_tree(session: &Session<'_>, server: EntityId) -> FtPvm {
    let nic: ResiliencyNic = create(
        session,
        json!({ "name": format!("nic-{server}"), "resiliency_server_id": server }),
    );
    let pvm: FtPvm = create(
        session,
        json!({
            "resiliency_server_id": server,
            "name": "pvm",
            "state": { "operational": "online", "alarms": [] },
            "ft_protected": true,
            "preferred_ax": 1
        }),
    );
    let guest_os: FtGuestOs = create(
        session,
        json!({
            "ft_pvm_id": pvm.record.id,
            "synch_idle_timer_limits": { "min": 1, "max": 60 }
        }),
    );
    let ldisk: FtLDisk = create(
        session,
        json!({ "ft_guest_os_id": guest_os.record.id, "ldisk_id": 0, "boot_device": true }),
    );
    let lnic: FtLNic = create(
        session,
        json!({
            "ft_guest_os_id": guest_os.record.id,
            "lnic_id": 0,
            "resiliency_nic_id": nic.record.id
        }),
    );
    let alink: FtALink = create(session, json!({ "ft_pvm_id": pvm.record.id }));
    let _: FtPath = create(session, json!({ "ft_alink_id": alink.record.id, "path_id": 1 }));
    let quorum: FtQuorum = create(
        session,
        json!({ "ft_pvm_id": pvm.record.id, "enabled": true, "preferred_host_port": 7777 }),
    );
    let _: FtQLink = create(
        session,
        json!({ "ft_quorum_id": quorum.record.id, "qlink_id": 1, "which": "preferred" }),
    );
    let ax: FtAx = create(session, json!({ "ft_pvm_id": pvm.record.id, "ax_id": 1 }));
    let _: FtGuest = create(session, json!({ "ft_ax_id": ax.record.id, "auto_boot": true }));
    let _: FtDisk = create(
        session,
        json!({
            "ft_ax_id": ax.record.id,
            "ft_ldisk_id": ldisk.record.id,
            "ft_scrub_status": { "pass": 2, "percent": 40 }
        }),
    );
    let _: FtNic = create(
        session,
        json!({
            "ft_ax_id": ax.record.id,
            "ft_lnic_id": lnic.record.id,
            "ft_ip_config": { "address": "10.0.0.2", "prefix": 24 },
            "mac": "52:54:00:12:34:56"
        }),
    );
    let _: FtLinkA = create(session, json!({ "ft_ax_id": ax.record.id, "adapter_id": 3 }));
    pvm
}

fn live_counts(session: &Session<'_>) -> [usize; 13] {
    [
        live::<FtPvm>(session),
        live::<FtGuestOs>(session),
        live::<FtLDisk>(session),
        live::<FtLNic>(session),
        live::<FtALink>(session),
        live::<FtPath>(session),
        live::<FtQuorum>(session),
        live::<FtQLink>(session),
        live::<FtAx>(session),
        live::<FtGuest>(session),
        live::<FtDisk>(session),
        live::<FtNic>(session),
        live::<FtLinkA>(session),
    ]
}

#[test]
fn json_state_and_flags_round_trip() {
    let store = setup();
    let session = store.session(tenant()).unwrap();
    session.begin().unwrap();

    let server = ft_server(&session, "srv-1");
    let pvm = telemetry_tree(&session, server.record.id);

    let loaded = session.repo::<FtPvm>().get(pvm.record.id).unwrap();
    assert_eq!(
        loaded.state,
        Some(json!({ "operational": "online", "alarms": [] }))
    );
    assert_eq!(loaded.ft_protected, Some(true));
    assert_eq!(loaded.automated_recovery, None);
    assert_eq!(loaded.preferred_ax, Some(1));
    assert_eq!(loaded, pvm);

    let nics = session.repo::<FtNic>().list(&Values::new()).unwrap();
    assert_eq!(
        nics[0].ft_ip_config,
        Some(json!({ "address": "10.0.0.2", "prefix": 24 }))
    );

    let patched = session
        .repo::<FtPvm>()
        .update(
            pvm.record.id,
            &values(json!({ "state": { "operational": "degraded" }, "ft_protected": false })),
        )
        .unwrap();
    assert_eq!(patched.state, Some(json!({ "operational": "degraded" })));
    assert_eq!(patched.ft_protected, Some(false));
    assert_eq!(patched.name.as_deref(), Some("pvm"));

    session.end().unwrap();
}

#[test]
fn telemetry_lists_follow_creation_order() {
    let store = setup();
    let session = store.session(tenant()).unwrap();
    session.begin().unwrap();

    let server = ft_server(&session, "srv-1");
    let pvm = telemetry_tree(&session, server.record.id);
    let first = session
        .repo::<FtAx>()
        .list(&values(json!({ "ft_pvm_id": pvm.record.id })))
        .unwrap();
    let mut created: Vec<EntityId> = first.iter().map(|ax| ax.record.id).collect();
    // Slots descend; the list must still follow insertion.
    for ax_id in (2..22).rev() {
        let ax: FtAx = create(&session, json!({ "ft_pvm_id": pvm.record.id, "ax_id": ax_id }));
        created.push(ax.record.id);
    }

    let listed: Vec<EntityId> = session
        .repo::<FtAx>()
        .list(&values(json!({ "ft_pvm_id": pvm.record.id })))
        .unwrap()
        .into_iter()
        .map(|ax| ax.record.id)
        .collect();
    assert_eq!(listed.len(), 21);
    assert_eq!(listed, created);

    session.end().unwrap();
}

#[test]
fn qlink_slots_are_unique_per_quorum() {
    let store = setup();
    let session = store.session(tenant()).unwrap();
    session.begin().unwrap();

    let server = ft_server(&session, "srv-1");
    let pvm = telemetry_tree(&session, server.record.id);
    let quorums = session
        .repo::<FtQuorum>()
        .list(&values(json!({ "ft_pvm_id": pvm.record.id })))
        .unwrap();
    let quorum = &quorums[0];

    let err = session
        .repo::<FtQLink>()
        .create(&values(json!({
            "ft_quorum_id": quorum.record.id,
            "qlink_id": 1,
            "which": "preferred"
        })))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DuplicateEntry);

    let alternate: FtQLink = create(
        &session,
        json!({ "ft_quorum_id": quorum.record.id, "qlink_id": 1, "which": "alternate" }),
    );
    assert_eq!(alternate.which.as_deref(), Some("alternate"));

    session.end().unwrap();
}

#[test]
fn deleting_a_pvm_clears_its_telemetry() {
    let store = setup();
    let session = store.session(tenant()).unwrap();

    let (pvm, _other) = session
        .transaction(|s| {
            let first = ft_server(s, "srv-1");
            let second = ft_server(s, "srv-2");
            Ok::<_, RepoError>((
                telemetry_tree(s, first.record.id),
                telemetry_tree(s, second.record.id),
            ))
        })
        .unwrap();
    assert_eq!(live_counts(&session), [2; 13]);

    session
        .transaction(|s| s.repo::<FtPvm>().delete(pvm.record.id))
        .unwrap();
    assert_eq!(live_counts(&session), [1; 13]);
    assert_eq!(live::<ResiliencyServer>(&session), 2);
    assert_eq!(live::<ResiliencyNic>(&session), 2);
}

#[test]
fn deleting_a_server_clears_its_pvm_tree() {
    let store = setup();
    let session = store.session(tenant()).unwrap();

    let server = session
        .transaction(|s| {
            let server = ft_server(s, "srv-1");
            telemetry_tree(s, server.record.id);
            Ok::<_, RepoError>(server)
        })
        .unwrap();

    session
        .transaction(|s| s.repo::<ResiliencyServer>().delete(server.record.id))
        .unwrap();
    assert_eq!(live_counts(&session), [0; 13]);
    assert_eq!(live::<ResiliencyNic>(&session), 0);
    assert_eq!(live::<ResiliencyServerGroup>(&session), 1);
}
