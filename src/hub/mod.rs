//! The hub: fan-out switchboard between one rotator and many clients.
//!
//! [`Hub`] keeps one client set per [`Transport`], pushes every status
//! change to all of them and routes inbound client commands to the
//! rotator. Listeners live in [`tcp`] and [`http`].
//!
//! # Concurrency
//!
//! Registration, removal and both broadcast paths serialize on a single
//! mutex. A broadcast pass holds it for the whole pass, so one slow
//! client delays delivery to the others in that cycle.

pub mod client;
pub mod http;
pub mod tcp;

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{Mutex, broadcast};
use tokio::task::AbortHandle;

pub use client::{Client, ClientSink, CommandStream, Transport};

use crate::domain::{ClientId, Event, Request, Rotator, RotatorEvent, Status};
use crate::error::HubError;

/// A registered client and the task draining its inbound commands.
#[derive(Debug)]
struct Registration {
    client: Client,
    inbound: AbortHandle,
}

#[derive(Debug, Default)]
struct ClientSets {
    tcp: HashMap<ClientId, Registration>,
    ws: HashMap<ClientId, Registration>,
}

impl ClientSets {
    fn of(&mut self, transport: Transport) -> &mut HashMap<ClientId, Registration> {
        match transport {
            Transport::Tcp => &mut self.tcp,
            Transport::Ws => &mut self.ws,
        }
    }
}

/// Makes one rotator available to many network clients.
#[derive(Debug)]
pub struct Hub {
    rotator: Arc<dyn Rotator>,
    clients: Mutex<ClientSets>,
}

impl Hub {
    /// Creates a hub serving `rotator` with no clients.
    #[must_use]
    pub fn new(rotator: Arc<dyn Rotator>) -> Self {
        Self {
            rotator,
            clients: Mutex::new(ClientSets::default()),
        }
    }

    /// Returns the served rotator.
    #[must_use]
    pub fn rotator(&self) -> &Arc<dyn Rotator> {
        &self.rotator
    }

    /// Registers `client` and starts its inbound command task.
    ///
    /// The task decodes every message from `inbound` as a [`Request`] and
    /// runs it against the rotator; when `inbound` ends the client is
    /// removed. A previous registration with the same id is replaced and
    /// its inbound task aborted, so only the newest stream can remove the
    /// client.
    pub async fn add_client(
        self: &Arc<Self>,
        transport: Transport,
        client: Client,
        inbound: CommandStream,
    ) {
        {
            let mut sets = self.clients.lock().await;
            let set = sets.of(transport);
            if let Some(stale) = set.remove(&client.id()) {
                stale.inbound.abort();
                tracing::debug!(
                    %transport,
                    client_id = %client.id(),
                    "replacing stale registration"
                );
            }
            let task = tokio::spawn(Arc::clone(self).run_inbound(
                transport,
                client.clone(),
                inbound,
            ));
            set.insert(
                client.id(),
                Registration {
                    client: client.clone(),
                    inbound: task.abort_handle(),
                },
            );
        }
        tracing::info!(%transport, addr = %client.remote_addr(), "client connected");
    }

    /// Unregisters and closes `client`. Safe to call more than once.
    pub async fn remove_client(&self, transport: Transport, client: &Client) {
        let mut sets = self.clients.lock().await;
        let removed = sets.of(transport).remove(&client.id()).is_some();
        client.close().await;
        if removed {
            tracing::info!(%transport, addr = %client.remote_addr(), "client disconnected");
        }
    }

    /// Returns the number of clients registered on `transport`.
    pub async fn client_count(&self, transport: Transport) -> usize {
        self.clients.lock().await.of(transport).len()
    }

    /// Pushes `status` to every connected client.
    pub async fn broadcast(&self, status: &Status) {
        self.broadcast_to_tcp_clients(status).await;
        if let Err(e) = self.broadcast_to_ws_clients(status).await {
            tracing::warn!(error = %e, "websocket broadcast failed");
        }
    }

    /// Writes `status` as a `+0AAA+0EEE` line to every TCP client.
    ///
    /// Clients whose write fails are removed and closed.
    pub async fn broadcast_to_tcp_clients(&self, status: &Status) {
        let line = status.to_tcp_line();
        let mut sets = self.clients.lock().await;
        deliver(sets.of(Transport::Tcp), Transport::Tcp, line.as_bytes()).await;
    }

    /// Writes `status` as a JSON `heading` event to every WebSocket client.
    ///
    /// Clients whose write fails are removed and closed.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Serialization`] if the event cannot be encoded;
    /// nothing is sent in that case.
    pub async fn broadcast_to_ws_clients(&self, status: &Status) -> Result<(), HubError> {
        let payload = serde_json::to_vec(&Event::heading(status.clone()))?;
        let mut sets = self.clients.lock().await;
        deliver(sets.of(Transport::Ws), Transport::Ws, &payload).await;
        Ok(())
    }

    /// Broadcasts the status of every event received from the rotator's
    /// event bus until the bus closes.
    pub async fn run_broadcast_pump(
        self: Arc<Self>,
        mut events: broadcast::Receiver<RotatorEvent>,
    ) {
        loop {
            match events.recv().await {
                Ok(event) => self.broadcast(&event.status).await,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(lagged = n, "broadcast pump lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
        tracing::debug!("broadcast pump stopped");
    }

    async fn run_inbound(
        self: Arc<Self>,
        transport: Transport,
        client: Client,
        mut inbound: CommandStream,
    ) {
        while let Some(message) = inbound.next().await {
            match message {
                Ok(payload) => self.dispatch(&client, &payload).await,
                Err(e) => {
                    tracing::debug!(
                        %transport,
                        addr = %client.remote_addr(),
                        error = %e,
                        "client read failed"
                    );
                    break;
                }
            }
        }
        self.remove_client(transport, &client).await;
    }

    async fn dispatch(&self, client: &Client, payload: &[u8]) {
        if payload.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        let request = match serde_json::from_slice::<Request>(payload) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!(
                    addr = %client.remote_addr(),
                    error = %e,
                    "dropping malformed request"
                );
                return;
            }
        };
        tracing::debug!(addr = %client.remote_addr(), ?request, "executing request");
        if let Err(e) = self.rotator.execute_request(request).await {
            tracing::warn!(addr = %client.remote_addr(), ?request, error = %e, "request failed");
        }
    }
}

/// Writes `payload` to every client in `set`, then drops the ones that
/// failed.
async fn deliver(
    set: &mut HashMap<ClientId, Registration>,
    transport: Transport,
    payload: &[u8],
) {
    let mut failed = Vec::new();
    for (id, registration) in set.iter() {
        let client = &registration.client;
        if let Err(e) = client.send(payload).await {
            tracing::warn!(
                %transport,
                addr = %client.remote_addr(),
                error = %e,
                "write failed, disconnecting client"
            );
            failed.push(*id);
        }
    }
    for id in failed {
        if let Some(registration) = set.remove(&id) {
            registration.client.close().await;
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;
    use std::io;
    use std::net::SocketAddr;
    use std::sync::PoisonError;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use futures_util::stream;

    use crate::domain::{Axis, EventBus, EventKind};
    use crate::error::ClientError;
    use crate::rotator::{DummyConfig, DummyRotator};

    #[derive(Debug)]
    struct RecordingSink {
        addr: SocketAddr,
        frames: std::sync::Mutex<Vec<Vec<u8>>>,
        fail: AtomicBool,
        closed: AtomicBool,
    }

    impl RecordingSink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                addr: SocketAddr::from(([127, 0, 0, 1], 40_000)),
                frames: std::sync::Mutex::new(Vec::new()),
                fail: AtomicBool::new(false),
                closed: AtomicBool::new(false),
            })
        }

        fn frames(&self) -> Vec<Vec<u8>> {
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        }

        fn is_closed(&self) -> bool {
            self.closed.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ClientSink for RecordingSink {
        fn remote_addr(&self) -> SocketAddr {
            self.addr
        }

        async fn send(&self, payload: &[u8]) -> Result<(), ClientError> {
            if self.fail.load(Ordering::SeqCst) {
                return Err(ClientError::Io(io::Error::new(
                    io::ErrorKind::BrokenPipe,
                    "peer gone",
                )));
            }
            self.frames
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(payload.to_vec());
            Ok(())
        }

        async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }

    fn make_hub() -> (Arc<Hub>, Arc<DummyRotator>) {
        let rotator = Arc::new(DummyRotator::spawn(DummyConfig::default(), None));
        let hub = Arc::new(Hub::new(Arc::clone(&rotator) as Arc<dyn Rotator>));
        (hub, rotator)
    }

    fn client_for(sink: &Arc<RecordingSink>) -> Client {
        Client::new(Arc::clone(sink) as Arc<dyn ClientSink>)
    }

    fn idle() -> CommandStream {
        stream::pending().boxed()
    }

    fn status(azimuth: i32, elevation: i32) -> Status {
        Status {
            name: "test".to_string(),
            azimuth,
            elevation,
            ..Status::default()
        }
    }

    async fn wait_for<F: FnMut() -> bool>(mut cond: F) -> bool {
        for _ in 0..200 {
            if cond() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        cond()
    }

    async fn wait_for_count(hub: &Hub, transport: Transport, expected: usize) -> bool {
        for _ in 0..200 {
            if hub.client_count(transport).await == expected {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    #[tokio::test]
    async fn tcp_broadcasts_arrive_in_order() {
        let (hub, _rotator) = make_hub();
        let sink = RecordingSink::new();
        hub.add_client(Transport::Tcp, client_for(&sink), idle()).await;

        for az in 0..10 {
            hub.broadcast(&status(az, 45)).await;
        }

        let frames = sink.frames();
        assert_eq!(frames.len(), 10);
        for (az, frame) in (0..10).zip(frames) {
            assert_eq!(frame, status(az, 45).to_tcp_line().into_bytes());
        }
    }

    #[tokio::test]
    async fn ws_broadcast_sends_heading_event() {
        let (hub, _rotator) = make_hub();
        let sink = RecordingSink::new();
        hub.add_client(Transport::Ws, client_for(&sink), idle()).await;

        hub.broadcast(&status(123, 7)).await;

        let frames = sink.frames();
        let Some(frame) = frames.first() else {
            panic!("no frame delivered");
        };
        let Ok(event) = serde_json::from_slice::<Event>(frame) else {
            panic!("frame is not an event");
        };
        assert_eq!(event.name, EventKind::Heading);
        assert_eq!(event.status, status(123, 7));
    }

    #[tokio::test]
    async fn transports_receive_only_their_format() {
        let (hub, _rotator) = make_hub();
        let tcp = RecordingSink::new();
        let ws = RecordingSink::new();
        hub.add_client(Transport::Tcp, client_for(&tcp), idle()).await;
        hub.add_client(Transport::Ws, client_for(&ws), idle()).await;

        hub.broadcast(&status(5, 120)).await;

        assert_eq!(tcp.frames(), vec![b"+0005+0120\r\n".to_vec()]);
        assert_eq!(ws.frames().len(), 1);
        assert!(ws.frames().iter().all(|f| f.first() == Some(&b'{')));
    }

    #[tokio::test]
    async fn readding_client_keeps_single_entry() {
        let (hub, _rotator) = make_hub();
        let client = Client::new(RecordingSink::new());

        hub.add_client(Transport::Tcp, client.clone(), idle()).await;
        hub.add_client(Transport::Tcp, client.clone(), idle()).await;

        assert_eq!(hub.client_count(Transport::Tcp).await, 1);
        assert_eq!(hub.client_count(Transport::Ws).await, 0);
    }

    #[tokio::test]
    async fn replaced_stream_ending_keeps_new_registration() {
        let (hub, rotator) = make_hub();
        let sink = RecordingSink::new();
        let client = client_for(&sink);
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<Vec<u8>>();
        let first = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|payload| (Ok(payload), rx))
        })
        .boxed();

        hub.add_client(Transport::Tcp, client.clone(), first).await;
        hub.add_client(Transport::Tcp, client.clone(), idle()).await;

        // The first stream is no longer drained and its end is not observed.
        let _ = tx.send(br#"{"azimuth":90}"#.to_vec());
        drop(tx);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(hub.client_count(Transport::Tcp).await, 1);
        assert!(!sink.is_closed());
        assert_eq!(rotator.az_preset(), 0);
    }

    #[tokio::test]
    async fn failing_client_is_removed_and_closed() {
        let (hub, _rotator) = make_hub();
        let healthy = RecordingSink::new();
        let broken = RecordingSink::new();
        broken.fail.store(true, Ordering::SeqCst);
        hub.add_client(Transport::Ws, client_for(&healthy), idle()).await;
        hub.add_client(Transport::Ws, client_for(&broken), idle()).await;

        hub.broadcast(&status(1, 1)).await;

        assert_eq!(hub.client_count(Transport::Ws).await, 1);
        assert!(broken.is_closed());
        assert!(!healthy.is_closed());

        // A recovered socket is not re-registered by later broadcasts.
        broken.fail.store(false, Ordering::SeqCst);
        hub.broadcast(&status(2, 2)).await;

        assert!(broken.frames().is_empty());
        assert_eq!(healthy.frames().len(), 2);
    }

    #[tokio::test]
    async fn remove_client_is_idempotent() {
        let (hub, _rotator) = make_hub();
        let sink = RecordingSink::new();
        let client = client_for(&sink);
        hub.add_client(Transport::Tcp, client.clone(), idle()).await;

        hub.remove_client(Transport::Tcp, &client).await;
        hub.remove_client(Transport::Tcp, &client).await;

        assert_eq!(hub.client_count(Transport::Tcp).await, 0);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn inbound_requests_reach_rotator() {
        let (hub, rotator) = make_hub();
        let inbound = stream::iter(vec![
            Ok(b"not json".to_vec()),
            Ok(b"   ".to_vec()),
            Ok(br#"{"azimuth":90}"#.to_vec()),
        ])
        .chain(stream::pending())
        .boxed();
        hub.add_client(Transport::Ws, Client::new(RecordingSink::new()), inbound).await;

        assert!(wait_for(|| rotator.az_preset() == 90).await);
        // Malformed input does not cost the client its connection.
        assert_eq!(hub.client_count(Transport::Ws).await, 1);
    }

    #[tokio::test]
    async fn rejected_request_keeps_client() {
        let (hub, rotator) = make_hub();
        let inbound = stream::iter(vec![
            Ok(br#"{"elevation":500}"#.to_vec()),
            Ok(br#"{"elevation":30}"#.to_vec()),
        ])
        .chain(stream::pending())
        .boxed();
        hub.add_client(Transport::Tcp, Client::new(RecordingSink::new()), inbound).await;

        assert!(wait_for(|| rotator.el_preset() == 30).await);
        assert_eq!(hub.client_count(Transport::Tcp).await, 1);
    }

    #[tokio::test]
    async fn closed_inbound_stream_removes_client() {
        let (hub, _rotator) = make_hub();
        let sink = RecordingSink::new();
        hub.add_client(
            Transport::Tcp,
            client_for(&sink),
            stream::empty().boxed(),
        )
        .await;

        assert!(wait_for_count(&hub, Transport::Tcp, 0).await);
        assert!(sink.is_closed());
    }

    #[tokio::test]
    async fn read_error_removes_client() {
        let (hub, _rotator) = make_hub();
        let inbound = stream::iter(vec![Err(ClientError::WebSocket("reset".to_string()))])
            .chain(stream::pending())
            .boxed();
        hub.add_client(Transport::Ws, Client::new(RecordingSink::new()), inbound).await;

        assert!(wait_for_count(&hub, Transport::Ws, 0).await);
    }

    #[tokio::test]
    async fn broadcast_pump_forwards_bus_events() {
        let (hub, _rotator) = make_hub();
        let bus = EventBus::new(16);
        let sink = RecordingSink::new();
        hub.add_client(Transport::Tcp, client_for(&sink), idle()).await;
        tokio::spawn(Arc::clone(&hub).run_broadcast_pump(bus.subscribe()));

        bus.publish(RotatorEvent {
            axis: Axis::Azimuth,
            status: status(270, 10),
        });

        assert!(wait_for(|| sink.frames().len() == 1).await);
        assert_eq!(sink.frames(), vec![b"+0270+0010\r\n".to_vec()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_add_remove_stays_bounded() {
        const TASKS: usize = 8;
        const PER_TASK: usize = 25;

        let (hub, _rotator) = make_hub();
        let registered = Arc::new(tokio::sync::Barrier::new(TASKS + 1));
        let release = Arc::new(tokio::sync::Barrier::new(TASKS + 1));

        let mut handles = Vec::new();
        for _ in 0..TASKS {
            let hub = Arc::clone(&hub);
            let registered = Arc::clone(&registered);
            let release = Arc::clone(&release);
            handles.push(tokio::spawn(async move {
                let clients: Vec<Client> = (0..PER_TASK)
                    .map(|_| Client::new(RecordingSink::new()))
                    .collect();
                for client in &clients {
                    hub.add_client(Transport::Ws, client.clone(), idle()).await;
                    hub.add_client(Transport::Ws, client.clone(), idle()).await;
                    assert!(hub.client_count(Transport::Ws).await <= TASKS * PER_TASK);
                }
                registered.wait().await;
                release.wait().await;
                for client in &clients {
                    hub.remove_client(Transport::Ws, client).await;
                }
            }));
        }

        registered.wait().await;
        assert_eq!(hub.client_count(Transport::Ws).await, TASKS * PER_TASK);
        release.wait().await;

        for handle in handles {
            assert!(handle.await.is_ok());
        }
        assert_eq!(hub.client_count(Transport::Ws).await, 0);
    }
}
