use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::TryRecvError;
use sospf::{Notice, Router, RouterConfig};

pub const HOST: &str = "127.0.0.1";

/// A listening router whose operator always gives the same answer.
pub struct TestRouter {
    pub router: Router,
    pub port: u16,
}

impl TestRouter {
    pub fn id(&self) -> &str {
        self.router.id()
    }
}

pub async fn spawn_router(id: &str) -> TestRouter {
    spawn_router_with(id, true).await
}

pub async fn spawn_router_with(id: &str, accept: bool) -> TestRouter {
    let mut config = RouterConfig::new(id);
    config.handshake_timeout_secs = 10;
    let (router, mut approvals) = Router::new(&config);
    let addr = router.bind().await.unwrap();

    tokio::spawn(async move {
        while let Some(request) = approvals.next().await {
            request.resolve(accept);
        }
    });

    TestRouter {
        router,
        port: addr.port(),
    }
}

/// `from` attaches to `to` and brings the adjacency up. Returns `from`'s port.
pub async fn connect(from: &TestRouter, to: &TestRouter, weight: u32) -> usize {
    from.router
        .connect(HOST, to.port, to.id(), weight)
        .await
        .unwrap_or_else(|e| panic!("{} could not connect to {}: {}", from.id(), to.id(), e))
}

/// Polls `check` until it holds, failing the test after a few seconds.
pub async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !check().await {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

pub async fn path_to(router: &TestRouter, destination: &str) -> Option<Vec<String>> {
    router.router.detect(destination).await.ok().map(|p| p.path)
}

/// Everything already sitting in the receiver.
pub fn drain(notices: &mut broadcast::Receiver<Notice>) -> Vec<Notice> {
    let mut seen = Vec::new();
    loop {
        match notices.try_recv() {
            Ok(notice) => seen.push(notice),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return seen,
        }
    }
}

/// Waits for the first notice matching `pred`.
pub async fn wait_for_notice<P>(notices: &mut broadcast::Receiver<Notice>, mut pred: P) -> Notice
where
    P: FnMut(&Notice) -> bool,
{
    let found = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match notices.recv().await {
                Ok(notice) if pred(&notice) => return notice,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => panic!("notice channel closed"),
            }
        }
    })
    .await;
    found.expect("notice never arrived")
}
