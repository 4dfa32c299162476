//! Integration test common infrastructure.
//!
//! Spawns a relay on an ephemeral port and provides line-framed clients.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::codec::{Framed, LinesCodec};
use tokio_util::sync::CancellationToken;

use chat_relay::{run_acceptor, AppError, ChatServer, Config, ConnectionSettings, ServerCommand};

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A relay running in the background of a test.
pub struct TestServer {
    pub addr: SocketAddr,
    pub cmd_tx: mpsc::Sender<ServerCommand>,
    pub shutdown: CancellationToken,
    pub acceptor: JoinHandle<Result<(), AppError>>,
}

impl TestServer {
    /// Spawn with default configuration.
    pub async fn spawn() -> Self {
        Self::spawn_with(Config::default()).await
    }

    /// Spawn with the given configuration; `listen` is ignored.
    pub async fn spawn_with(config: Config) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");

        let (cmd_tx, cmd_rx) = mpsc::channel(config.command_buffer);
        tokio::spawn(ChatServer::with_policy(cmd_rx, config.duplicate_names).run());

        let shutdown = CancellationToken::new();
        let acceptor = tokio::spawn(run_acceptor(
            listener,
            cmd_tx.clone(),
            ConnectionSettings::from(&config),
            shutdown.clone(),
        ));

        Self {
            addr,
            cmd_tx,
            shutdown,
            acceptor,
        }
    }

    /// Registered names in registration order.
    pub async fn roster(&self) -> Vec<String> {
        let (reply, rx) = oneshot::channel();
        self.cmd_tx
            .send(ServerCommand::Roster { reply })
            .await
            .expect("server alive");
        rx.await.expect("roster reply")
    }

    /// Poll the roster until it equals `expected`.
    pub async fn wait_for_roster(&self, expected: &[&str]) {
        let mut last = Vec::new();
        for _ in 0..500 {
            last = self.roster().await;
            if last == expected {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("roster is {:?}, expected {:?}", last, expected);
    }

    /// Connect a client and wait until it is registered.
    pub async fn join(&self, name: &str) -> TestClient {
        let client = TestClient::connect(self.addr, name).await;
        for _ in 0..500 {
            if self.roster().await.iter().any(|n| n == name) {
                return client;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("{} never registered", name);
    }

    /// Connect clients one after another and consume every join notice,
    /// leaving each client with an empty inbox.
    pub async fn join_all(&self, names: &[&str]) -> Vec<TestClient> {
        let mut clients: Vec<TestClient> = Vec::new();
        for name in names {
            let newcomer = self.join(name).await;
            for client in clients.iter_mut() {
                assert_eq!(client.recv().await, format!("Server: {} подключился к чату.", name));
            }
            clients.push(newcomer);
        }
        clients
    }
}

/// A line-framed test client.
pub struct TestClient {
    framed: Framed<TcpStream, LinesCodec>,
}

impl TestClient {
    /// Connect and send the name line.
    pub async fn connect(addr: SocketAddr, name: &str) -> Self {
        let stream = TcpStream::connect(addr).await.expect("connect");
        let mut client = Self {
            framed: Framed::new(stream, LinesCodec::new_with_max_length(1 << 20)),
        };
        client.send(name).await;
        client
    }

    /// Send one line.
    pub async fn send(&mut self, line: &str) {
        self.framed.send(line.to_string()).await.expect("send line");
    }

    /// Receive one line, failing the test after a timeout.
    pub async fn recv(&mut self) -> String {
        match timeout(RECV_TIMEOUT, self.framed.next()).await {
            Ok(Some(Ok(line))) => line,
            Ok(Some(Err(e))) => panic!("read error: {}", e),
            Ok(None) => panic!("connection closed"),
            Err(_) => panic!("no line within {:?}", RECV_TIMEOUT),
        }
    }

    /// Assert nothing arrives for a short while.
    pub async fn assert_silent(&mut self) {
        if let Ok(Some(line)) = timeout(Duration::from_millis(200), self.framed.next()).await {
            panic!("unexpected line: {:?}", line);
        }
    }

    /// Read until the server closes the connection, returning what arrived.
    pub async fn recv_until_closed(&mut self) -> Vec<String> {
        let mut lines = Vec::new();
        loop {
            match timeout(RECV_TIMEOUT, self.framed.next()).await {
                Ok(Some(Ok(line))) => lines.push(line),
                Ok(Some(Err(_))) | Ok(None) => return lines,
                Err(_) => panic!("connection still open, got {:?}", lines),
            }
        }
    }

    /// Stream of received lines, for tests reading from a spawned task.
    pub fn into_framed(self) -> Framed<TcpStream, LinesCodec> {
        self.framed
    }
}
