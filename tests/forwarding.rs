use std::time::Duration;
use sospf::{Delivery, NoPath, Notice, Router, RouterConfig};

mod common;
use common::harness::*;

const SECRET: &str = "launch codes: 0000";

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn message_crosses_a_line_and_only_the_destination_sees_it() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    let c = spawn_router("10.0.0.3").await;
    let d = spawn_router("10.0.0.4").await;

    connect(&a, &b, 1).await;
    connect(&b, &c, 1).await;
    connect(&c, &d, 1).await;

    for (router, hops) in [(&a, 4), (&b, 3), (&c, 2)] {
        eventually("every hop to know the way to D", || async move {
            path_to(router, "10.0.0.4").await.is_some_and(|p| p.len() == hops)
        })
        .await;
    }

    let mut b_notices = b.router.subscribe();
    let mut c_notices = c.router.subscribe();
    let mut d_notices = d.router.subscribe();

    let delivery = a.router.send("10.0.0.4", SECRET).await.unwrap();
    assert_eq!(delivery, Delivery::Sent { next_hop: "10.0.0.2".to_string() });

    let received = wait_for_notice(&mut d_notices, |n| matches!(n, Notice::Received { .. })).await;
    assert_eq!(
        received,
        Notice::Received {
            source: "10.0.0.1".to_string(),
            payload: SECRET.to_string(),
        }
    );
    assert_eq!(received.to_string(), format!("Received message from 10.0.0.1:\n{}", SECRET));

    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(drain(&mut d_notices).iter().all(|n| !matches!(n, Notice::Received { .. })));

    let expected = Notice::Forwarding {
        source: "10.0.0.1".to_string(),
        destination: "10.0.0.4".to_string(),
    };
    for notices in [&mut b_notices, &mut c_notices] {
        let seen = drain(notices);
        let forwarded: Vec<&Notice> = seen.iter().filter(|n| matches!(n, Notice::Forwarding { .. })).collect();
        assert_eq!(forwarded, vec![&expected]);
        assert!(seen.iter().all(|n| !n.to_string().contains(SECRET)));
    }
}

#[tokio::test]
async fn self_send_never_touches_the_network() {
    // Never bound: any network I/O would fail.
    let (router, _approvals) = Router::new(&RouterConfig::new("10.0.0.1"));
    let mut notices = router.subscribe();

    assert_eq!(router.send("10.0.0.1", "hi me").await.unwrap(), Delivery::Local);
    assert_eq!(
        drain(&mut notices),
        vec![
            Notice::Sending { destination: "10.0.0.1".to_string() },
            Notice::Received {
                source: "10.0.0.1".to_string(),
                payload: "hi me".to_string(),
            },
        ]
    );
}

#[tokio::test]
async fn unknown_destination_reports_no_path() {
    let a = spawn_router("10.0.0.1").await;
    let mut notices = a.router.subscribe();

    let delivery = a.router.send("10.0.0.9", "anyone?").await.unwrap();
    assert_eq!(delivery, Delivery::NoPath(NoPath::UnknownDestination));

    let seen = drain(&mut notices);
    assert_eq!(seen.last().map(|n| n.to_string()), Some("No path found".to_string()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn init_links_do_not_carry_traffic() {
    let a = spawn_router("10.0.0.1").await;
    let b = spawn_router("10.0.0.2").await;
    a.router.attach(HOST, b.port, b.id(), 1).await.unwrap();

    assert_eq!(
        a.router.send("10.0.0.2", "too early").await.unwrap(),
        Delivery::NoPath(NoPath::UnknownDestination)
    );
}
