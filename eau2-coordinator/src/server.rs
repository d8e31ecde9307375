use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eau2_errors::NetError;
use eau2_messaging::{encode_directory, recv_message, send_message, Message, NodeAddr, Tag};
use eau2_net::Listener;
use tracing::{info, instrument, warn};

use crate::roster::Roster;

const ACCEPT_POLL: Duration = Duration::from_millis(200);

/// Accepts registrations, maintains the directory, and broadcasts it on every change (§4.3).
pub struct Coordinator {
    host: String,
    port: u16,
    roster: Roster,
    shutting_down: AtomicBool,
}

impl Coordinator {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            roster: Roster::new(),
            shutting_down: AtomicBool::new(false),
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Binds the listener and serves registrations until `shutdown` is called from another
    /// thread. Returns once the listener observes the shutting-down flag.
    #[instrument(skip(self), fields(host = %self.host, port = self.port))]
    pub fn run(&self) -> Result<(), NetError> {
        let listener = Listener::bind(&self.host, self.port)?;
        info!("coordinator listening");
        while !self.is_shutting_down() {
            match listener.accept_with_timeout(ACCEPT_POLL)? {
                Some(mut stream) => {
                    if let Err(e) = self.handle_connection(&mut stream) {
                        warn!(error = %e, "connection handling failed");
                    }
                }
                None => continue,
            }
        }
        Ok(())
    }

    fn handle_connection(&self, stream: &mut TcpStream) -> Result<(), NetError> {
        let msg = recv_message(stream)?;
        match msg.tag {
            Tag::Register => self.handle_register(stream, &msg),
            other => {
                warn!(?other, "coordinator received an unexpected tag");
                send_message(stream, &self.reply(Tag::Nack, ""))
            }
        }
    }

    fn handle_register(&self, stream: &mut TcpStream, msg: &Message) -> Result<(), NetError> {
        let addr = NodeAddr::decode(&msg.payload).map_err(NetError::Codec)?;
        let id = self.roster.register(addr.clone());
        info!(node_id = id, addr = %addr.encode(), "registered node");

        send_message(stream, &self.reply(Tag::Ack, ""))?;

        self.broadcast_directory();
        Ok(())
    }

    /// Opens a fresh connection to every registered node and sends the full roster, per §4.3's
    /// "broadcast to all nodes on every change" mandate (§9 resolves the open question this way).
    fn broadcast_directory(&self) {
        let roster = self.roster.snapshot();
        let payload = encode_directory(&roster);
        for addr in &roster {
            if let Err(e) = self.send_directory_to(addr, &payload) {
                warn!(target = %addr.encode(), error = %e, "failed to deliver directory update");
            }
        }
    }

    fn send_directory_to(&self, addr: &NodeAddr, payload: &str) -> Result<(), NetError> {
        let mut stream = eau2_net::connect(&addr.host, addr.port)?;
        send_message(&mut stream, &self.reply(Tag::Directory, payload))?;
        let ack = recv_message(&mut stream)?;
        if ack.tag != Tag::Ack {
            warn!(target = %addr.encode(), "node did not ACK directory update");
        }
        Ok(())
    }

    /// Sets the shutting-down flag, then notifies every registered node. The listener thread
    /// (running `run` elsewhere) exits at its next poll.
    #[instrument(skip(self))]
    pub fn shutdown(&self) {
        self.shutting_down.store(true, Ordering::SeqCst);
        let roster = self.roster.snapshot();
        for addr in &roster {
            let mut stream = match eau2_net::connect(&addr.host, addr.port) {
                Ok(s) => s,
                Err(e) => {
                    warn!(target = %addr.encode(), error = %e, "could not reach node for shutdown");
                    continue;
                }
            };
            if let Err(e) = send_message(&mut stream, &self.reply(Tag::Shutdown, "")) {
                warn!(target = %addr.encode(), error = %e, "failed to send shutdown");
                continue;
            }
            match recv_message(&mut stream) {
                Ok(ack) if ack.tag == Tag::Ack => {}
                _ => warn!(target = %addr.encode(), "node did not ACK shutdown"),
            }
        }
    }

    fn reply(&self, tag: Tag, payload: impl Into<String>) -> Message {
        Message::new(self.host.clone(), self.port, tag, payload)
    }
}
