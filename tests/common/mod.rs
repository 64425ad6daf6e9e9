//! Shared utilities for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::sync::CancellationToken;

use ledger_gateway::config::GatewayConfig;
use ledger_gateway::health::{CoreState, CoreStateCell};
use ledger_gateway::http::GatewayServer;
use ledger_gateway::ledger::envelope::{
    DecoratedSignature, Memo, Operation, TimeBounds, Transaction, TransactionEnvelope,
};
use ledger_gateway::ledger::{Ledger, TransactionRecord};
use ledger_gateway::txsub::{BroadcastOutcome, CoreStatus, NetworkSink, SinkError, Submission};

pub const PASSPHRASE: &str = "Test Ledger Network ; January 2024";

/// A signed envelope for `sequence`, base64 encoded.
pub fn envelope(sequence: i64) -> String {
    envelope_with_bounds(sequence, None)
}

pub fn envelope_with_bounds(sequence: i64, time_bounds: Option<TimeBounds>) -> String {
    TransactionEnvelope {
        tx: Transaction {
            source_account: [3u8; 32],
            fee: 100,
            sequence,
            time_bounds,
            memo: Memo::Id(7),
            operations: vec![Operation {
                source_account: None,
                body: vec![0, 1],
            }],
        },
        signatures: vec![DecoratedSignature {
            hint: [0, 0, 0, 1],
            signature: vec![5; 64],
        }],
    }
    .to_base64()
    .unwrap()
}

/// What the mock core does with a broadcast.
#[derive(Debug, Clone)]
pub enum CoreReply {
    Include,
    Reject(String),
    Hang,
}

/// Scripted consensus core.
pub struct MockCore {
    pub broadcasts: AtomicU32,
    pub synced: AtomicBool,
    reply: CoreReply,
    delay: Duration,
}

impl MockCore {
    pub fn new(reply: CoreReply, synced: bool) -> Arc<Self> {
        Self::with_delay(reply, synced, Duration::ZERO)
    }

    pub fn with_delay(reply: CoreReply, synced: bool, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            broadcasts: AtomicU32::new(0),
            synced: AtomicBool::new(synced),
            reply,
            delay,
        })
    }

    pub fn broadcast_count(&self) -> u32 {
        self.broadcasts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NetworkSink for MockCore {
    async fn broadcast(&self, submission: &Submission) -> Result<BroadcastOutcome, SinkError> {
        self.broadcasts.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        match &self.reply {
            CoreReply::Include => Ok(BroadcastOutcome::Included(TransactionRecord {
                hash: submission.hash.clone(),
                ledger: 77,
                application_order: 3,
                created_at: Utc::now(),
                successful: true,
                fee_charged: 100,
                envelope_xdr: submission.raw.clone(),
                result_xdr: "AAAAAAAAAGQAAAAAAAAAAA==".to_string(),
                result_meta_xdr: String::new(),
            })),
            CoreReply::Reject(result_xdr) => Ok(BroadcastOutcome::Rejected {
                result_xdr: result_xdr.clone(),
            }),
            CoreReply::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(SinkError::Transport("hung".into()))
            }
        }
    }

    async fn status(&self) -> Result<CoreStatus, SinkError> {
        Ok(CoreStatus {
            synced: self.synced.load(Ordering::SeqCst),
            latest_ledger: 76,
        })
    }
}

/// A running gateway on an ephemeral port.
pub struct TestGateway {
    pub addr: SocketAddr,
    pub core: Arc<MockCore>,
    pub shutdown: CancellationToken,
}

impl TestGateway {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }
}

impl Drop for TestGateway {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Start a gateway in front of `core`, with the core state already published.
pub async fn start_gateway(config: GatewayConfig, core: Arc<MockCore>) -> TestGateway {
    let cell = CoreStateCell::new();
    cell.set(CoreState {
        synced: core.synced.load(Ordering::SeqCst),
        latest_ledger: 76,
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = CancellationToken::new();

    let server = GatewayServer::with_core_state(config, core.clone(), cell);
    let token = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, token).await;
    });

    TestGateway {
        addr,
        core,
        shutdown,
    }
}

pub fn ledger(sequence: u32) -> Ledger {
    Ledger {
        id: format!("ledger-{sequence}"),
        paging_token: ((sequence as u64) << 32).to_string(),
        hash: hex::encode([sequence as u8; 32]),
        prev_hash: None,
        sequence,
        successful_transaction_count: 1,
        failed_transaction_count: Some(0),
        operation_count: 1,
        closed_at: Utc::now(),
        total_coins: "100000000000.0000000".into(),
        fee_pool: "0.0000100".into(),
        base_fee_in_stroops: 100,
        base_reserve_in_stroops: 5_000_000,
        max_tx_set_size: 100,
        protocol_version: 20,
    }
}

/// Behaviour of the mock ledger stream.
#[derive(Debug, Clone)]
pub struct StreamScript {
    /// Ledgers 1..=total exist.
    pub total: u32,
    /// Connection is closed after this many events.
    pub per_connection: u32,
    /// The first `fail_first` connections are answered with `fail_status`.
    pub fail_first: u32,
    pub fail_status: u16,
    /// Send an undecodable unit instead of the first ledger.
    pub malformed: bool,
}

impl Default for StreamScript {
    fn default() -> Self {
        Self {
            total: 10,
            per_connection: 4,
            fail_first: 0,
            fail_status: 503,
            malformed: false,
        }
    }
}

/// A mock `ledgers` SSE endpoint honouring `cursor` on every connection.
pub struct LedgerStreamServer {
    pub addr: SocketAddr,
    pub connections: Arc<AtomicU32>,
    pub cursors: Arc<Mutex<Vec<Option<String>>>>,
}

impl LedgerStreamServer {
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    pub fn cursors(&self) -> Vec<Option<String>> {
        self.cursors.lock().unwrap().clone()
    }
}

pub async fn start_ledger_stream(script: StreamScript) -> LedgerStreamServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let connections = Arc::new(AtomicU32::new(0));
    let cursors = Arc::new(Mutex::new(Vec::new()));

    let server = LedgerStreamServer {
        addr,
        connections: connections.clone(),
        cursors: cursors.clone(),
    };

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let attempt = connections.fetch_add(1, Ordering::SeqCst);
                    let script = script.clone();
                    let cursors = cursors.clone();
                    tokio::spawn(async move {
                        serve_stream(socket, attempt, script, cursors).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    server
}

async fn serve_stream(
    mut socket: TcpStream,
    attempt: u32,
    script: StreamScript,
    cursors: Arc<Mutex<Vec<Option<String>>>>,
) {
    let cursor = read_cursor(&mut socket).await;
    cursors.lock().unwrap().push(cursor.clone());

    if attempt < script.fail_first {
        let body = format!(
            r#"{{"type":"server_error","title":"Unavailable","status":{},"detail":""}}"#,
            script.fail_status
        );
        let response = format!(
            "HTTP/1.1 {} Error\r\nContent-Type: application/problem+json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            script.fail_status,
            body.len(),
            body
        );
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
        return;
    }

    let head = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nDate: {}\r\nConnection: close\r\n\r\nretry: 10\nevent: open\ndata: \"hello\"\n\n",
        Utc::now().format("%a, %d %b %Y %H:%M:%S GMT")
    );
    if socket.write_all(head.as_bytes()).await.is_err() {
        return;
    }

    if script.malformed {
        let _ = socket.write_all(b"id: 1\ndata: {not json\n\n").await;
        tokio::time::sleep(Duration::from_secs(60)).await;
        return;
    }

    let start = cursor.and_then(|c| c.parse::<u32>().ok()).unwrap_or(0) + 1;
    let end = script.total.min(start + script.per_connection - 1);
    if start > end {
        // Caught up: hold the connection open like a live stream.
        tokio::time::sleep(Duration::from_secs(60)).await;
        return;
    }

    for sequence in start..=end {
        let unit = format!(
            "id: {}\ndata: {}\n\n",
            sequence,
            serde_json::to_string(&ledger(sequence)).unwrap()
        );
        if socket.write_all(unit.as_bytes()).await.is_err() {
            return;
        }
    }
    let _ = socket.shutdown().await;
}

async fn read_cursor(socket: &mut TcpStream) -> Option<String> {
    let mut buffer = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buffer.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buffer.extend_from_slice(&chunk[..n]),
        }
    }

    let head = String::from_utf8_lossy(&buffer);
    let target = head.lines().next()?.split_whitespace().nth(1)?.to_string();
    let url = url::Url::parse(&format!("http://mock{target}")).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "cursor")
        .map(|(_, value)| value.into_owned())
}
