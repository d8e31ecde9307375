use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use eau2_errors::NetError;
use eau2_messaging::{decode_directory, recv_message, send_message, Message, NodeAddr, Tag};
use eau2_net::{connect, Listener};
use parking_lot::{Condvar, Mutex};
use tracing::{info, instrument, warn};

use crate::handler::MessageHandler;

const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// A registered peer in the cluster (§4.4). Owns a listener thread and the known directory; all
/// tags it does not itself own (PUT/GET) are delegated to a `MessageHandler`.
pub struct Node {
    id: usize,
    host: String,
    port: u16,
    coordinator_host: String,
    coordinator_port: u16,
    directory: Mutex<Vec<NodeAddr>>,
    directory_ready: Condvar,
    registered: AtomicBool,
    shutting_down: AtomicBool,
}

impl Node {
    /// Binds the listener, registers with the coordinator, and blocks until the first directory
    /// update arrives, exactly as §4.4 describes node startup.
    #[instrument(skip(handler), fields(id, host = %host, port))]
    pub fn bootstrap(
        id: usize,
        host: impl Into<String>,
        port: u16,
        coordinator_host: impl Into<String>,
        coordinator_port: u16,
        handler: Arc<dyn MessageHandler>,
    ) -> Result<Arc<Node>, NetError> {
        let node = Arc::new(Node {
            id,
            host: host.into(),
            port,
            coordinator_host: coordinator_host.into(),
            coordinator_port,
            directory: Mutex::new(Vec::new()),
            directory_ready: Condvar::new(),
            registered: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
        });

        let listener = Listener::bind(&node.host, node.port)?;
        {
            let node = node.clone();
            std::thread::spawn(move || node.run_listener(listener, handler));
        }

        node.register()?;
        node.wait_for_first_directory();
        Ok(node)
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn is_registered(&self) -> bool {
        self.registered.load(Ordering::SeqCst)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    pub fn directory(&self) -> Vec<NodeAddr> {
        self.directory.lock().clone()
    }

    /// The number of registered nodes, used throughout the column layer's `chunk_index mod N`.
    pub fn node_count(&self) -> usize {
        self.directory.lock().len()
    }

    fn register(&self) -> Result<(), NetError> {
        let mut stream = connect(&self.coordinator_host, self.coordinator_port)?;
        let payload = format!("{}:{}", self.host, self.port);
        let register = Message::new(self.host.clone(), self.port, Tag::Register, payload);
        send_message(&mut stream, &register)?;
        let ack = recv_message(&mut stream)?;
        if ack.tag != Tag::Ack {
            warn!(?ack.tag, "coordinator did not ACK registration");
        }
        self.registered.store(true, Ordering::SeqCst);
        info!("registered with coordinator");
        Ok(())
    }

    fn wait_for_first_directory(&self) {
        let mut directory = self.directory.lock();
        while directory.is_empty() {
            self.directory_ready.wait(&mut directory);
        }
    }

    fn run_listener(self: Arc<Self>, listener: Listener, handler: Arc<dyn MessageHandler>) {
        while !self.is_shutting_down() {
            match listener.accept_with_timeout(ACCEPT_POLL) {
                Ok(Some(mut stream)) => {
                    if let Err(e) = self.handle_connection(&mut stream, &handler) {
                        warn!(error = %e, "connection handling failed");
                    }
                }
                Ok(None) => continue,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    continue;
                }
            }
        }
    }

    fn handle_connection(
        &self,
        stream: &mut TcpStream,
        handler: &Arc<dyn MessageHandler>,
    ) -> Result<(), NetError> {
        let msg = recv_message(stream)?;
        match msg.tag {
            Tag::Directory => self.handle_directory(stream, &msg),
            Tag::Shutdown => self.handle_shutdown(stream, &msg),
            _ => {
                let reply = handler.handle(&msg);
                send_message(stream, &reply)
            }
        }
    }

    fn handle_directory(&self, stream: &mut TcpStream, msg: &Message) -> Result<(), NetError> {
        let roster = decode_directory(&msg.payload).map_err(NetError::Codec)?;
        {
            let mut directory = self.directory.lock();
            if let Some(mine) = roster.get(self.id) {
                if mine.host != self.host || mine.port != self.port {
                    warn!(
                        expected = %format!("{}:{}", self.host, self.port),
                        got = %mine.encode(),
                        "node id does not match its position in the received directory"
                    );
                }
            }
            *directory = roster;
        }
        self.directory_ready.notify_all();
        send_message(stream, &self.reply(Tag::Ack, ""))
    }

    fn handle_shutdown(&self, stream: &mut TcpStream, _msg: &Message) -> Result<(), NetError> {
        send_message(stream, &self.reply(Tag::Ack, ""))?;
        self.shutting_down.store(true, Ordering::SeqCst);
        self.registered.store(false, Ordering::SeqCst);
        info!("node shutting down");
        Ok(())
    }

    fn reply(&self, tag: Tag, payload: impl Into<String>) -> Message {
        Message::new(self.host.clone(), self.port, tag, payload)
    }
}
