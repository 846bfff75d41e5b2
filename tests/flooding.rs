use std::time::Duration;
use sospf::NoPath;
use sospf::network::{Connection, TransportSettings};
use sospf::protocol::messages::LsaUpdateMessage;
use sospf::protocol::{LinkDescription, Lsa, ProcessAddress, ProtocolMessage};

mod common;
use common::harness::*;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn line_converges_and_copies_match_the_owner() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    let c = spawn_router("10.0.0.3").await;

    connect(&a, &b, 1).await;
    connect(&b, &c, 1).await;

    eventually("A to learn a path to C", || async {
        path_to(&a, "10.0.0.3").await == Some(vec!["10.0.0.1".into(), "10.0.0.2".into(), "10.0.0.3".into()])
    })
    .await;
    eventually("C to learn a path to A", || async {
        path_to(&c, "10.0.0.1").await == Some(vec!["10.0.0.3".into(), "10.0.0.2".into(), "10.0.0.1".into()])
    })
    .await;

    // C never talked to A directly; its copy of A's LSA came through B.
    let a_own = a.router.database().await.own_lsa().clone();
    let c_router = &c.router;
    eventually("C to hold A's latest LSA", || {
        let expected = a_own.clone();
        async move { c_router.database().await.get("10.0.0.1") == Some(&expected) }
    })
    .await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn late_joiner_learns_the_existing_topology() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    connect(&a, &b, 1).await;
    eventually("A and B to converge", || async { path_to(&b, "10.0.0.1").await.is_some() }).await;

    let d = spawn_router("10.0.0.4").await;
    connect(&d, &b, 2).await;

    eventually("D to learn A", || async {
        path_to(&d, "10.0.0.1").await == Some(vec!["10.0.0.4".into(), "10.0.0.2".into(), "10.0.0.1".into()])
    })
    .await;
    eventually("A to learn D", || async { path_to(&a, "10.0.0.4").await.is_some() }).await;
    assert_eq!(d.router.detect("10.0.0.1").await.unwrap().cost, 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn disconnect_tears_down_both_ends_and_is_advertised() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    let c = spawn_router("10.0.0.3").await;

    let port = connect(&a, &b, 1).await;
    connect(&b, &c, 1).await;
    eventually("C to reach A", || async { path_to(&c, "10.0.0.1").await.is_some() }).await;

    let link = a.router.disconnect(port).await.unwrap();
    assert_eq!(link.neighbor.router_id, "10.0.0.2");
    assert!(a.router.ports().await.is_empty());
    assert!(a.router.database().await.neighbors().is_empty());
    assert!(a.router.detect("10.0.0.3").await.is_err());

    eventually("B to drop its link to A", || async {
        b.router.ports().await.iter().all(|l| l.neighbor.router_id != "10.0.0.1")
    })
    .await;
    eventually("C to lose its path to A", || async {
        c.router.detect("10.0.0.1").await == Err(NoPath::Unreachable)
    })
    .await;

    assert!(a.router.disconnect(port).await.is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn weight_change_reroutes_and_floods() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    let c = spawn_router("10.0.0.3").await;

    connect(&a, &b, 1).await;
    connect(&b, &c, 1).await;
    let direct = connect(&a, &c, 10).await;

    eventually("A to prefer the two-hop path", || async {
        path_to(&a, "10.0.0.3").await == Some(vec!["10.0.0.1".into(), "10.0.0.2".into(), "10.0.0.3".into()])
    })
    .await;

    a.router.update_weight(direct, 1).await.unwrap();
    let path = a.router.detect("10.0.0.3").await.unwrap();
    assert_eq!(path.path, vec!["10.0.0.1", "10.0.0.3"]);
    assert_eq!(path.cost, 1);

    eventually("C to see the new weight", || async {
        c.router
            .database()
            .await
            .get("10.0.0.1")
            .and_then(|lsa| lsa.neighbors().find(|l| l.link_id == "10.0.0.3").map(|l| l.weight))
            == Some(1)
    })
    .await;

    // Same weight again is not a change.
    let seq = a.router.database().await.own_lsa().sequence_number;
    a.router.update_weight(direct, 1).await.unwrap();
    assert_eq!(a.router.database().await.own_lsa().sequence_number, seq);
}

async fn deliver_update(to: &TestRouter, sender: &str, lsa: Lsa) {
    let mut conn = Connection::dial(&ProcessAddress::new(HOST, to.port), TransportSettings::default())
        .await
        .unwrap();
    conn.send(&ProtocolMessage::LsaUpdate(LsaUpdateMessage {
        sender: sender.to_string(),
        lsas: vec![lsa],
    }))
    .await
    .unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn fresh_updates_skip_the_sender_and_stale_ones_are_dropped() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    let c = spawn_router("10.0.0.3").await;

    connect(&a, &b, 1).await;
    connect(&b, &c, 1).await;
    eventually("C to reach A", || async { path_to(&c, "10.0.0.1").await.is_some() }).await;

    // An LSA for a router nobody is attached to, handed to B as if A sent it.
    let mut remote = Lsa::init_self("10.0.0.9");
    remote.sequence_number = i32::MIN + 5;
    remote.links.push(LinkDescription::new("10.0.0.2", 0, 1));
    deliver_update(&b, "10.0.0.1", remote.clone()).await;

    let c_router = &c.router;
    eventually("C to learn 10.0.0.9 through B", || {
        let expected = remote.clone();
        async move { c_router.database().await.get("10.0.0.9") == Some(&expected) }
    })
    .await;
    assert_eq!(b.router.database().await.get("10.0.0.9"), Some(&remote));

    // B names A as the sender, so A must not get it back.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(a.router.database().await.get("10.0.0.9").is_none());

    // Same or older sequence numbers change nothing, whatever they carry.
    let mut same = remote.clone();
    same.links.push(LinkDescription::new("10.0.0.3", 1, 7));
    deliver_update(&b, "10.0.0.1", same).await;

    let mut older = Lsa::init_self("10.0.0.9");
    older.sequence_number = i32::MIN + 2;
    deliver_update(&b, "10.0.0.1", older).await;

    let mut stale_a = a.router.database().await.own_lsa().clone();
    stale_a.sequence_number -= 1;
    stale_a.links.truncate(1);
    let a_before = b.router.database().await.get("10.0.0.1").cloned();
    deliver_update(&b, "10.0.0.3", stale_a).await;

    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(b.router.database().await.get("10.0.0.9"), Some(&remote));
    assert_eq!(c.router.database().await.get("10.0.0.9"), Some(&remote));
    assert_eq!(b.router.database().await.get("10.0.0.1").cloned(), a_before);
    assert_eq!(
        path_to(&c, "10.0.0.1").await,
        Some(vec!["10.0.0.3".into(), "10.0.0.2".into(), "10.0.0.1".into()])
    );
}
