use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use eau2_errors::KvError;
use eau2_messaging::{Message, Tag};
use eau2_net::request;
use eau2_node::{MessageHandler, Node};
use eau2_value::Key;
use parking_lot::{Condvar, Mutex};
use tracing::{instrument, warn};

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct State {
    map: HashMap<String, String>,
    put_occurred: bool,
}

/// Local map + lock + condition variable, with transparent remote forwarding for keys homed
/// elsewhere (§4.5). `attach_node` resolves the chicken-and-egg between `Node::bootstrap` (which
/// needs a handler up front) and the store (which needs the bootstrapped node to route by
/// directory).
pub struct KvStore {
    own_id: usize,
    state: Mutex<State>,
    put_cv: Condvar,
    node: OnceLock<Arc<Node>>,
    poll_interval: Duration,
}

impl KvStore {
    pub fn new(own_id: usize) -> Arc<Self> {
        Self::with_poll_interval(own_id, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(own_id: usize, poll_interval: Duration) -> Arc<Self> {
        Arc::new(Self {
            own_id,
            state: Mutex::new(State {
                map: HashMap::new(),
                put_occurred: false,
            }),
            put_cv: Condvar::new(),
            node: OnceLock::new(),
            poll_interval,
        })
    }

    pub fn attach_node(&self, node: Arc<Node>) {
        let _ = self.node.set(node);
    }

    pub fn own_id(&self) -> usize {
        self.own_id
    }

    fn node(&self) -> &Arc<Node> {
        self.node.get().expect("KvStore used before attach_node")
    }

    fn is_local(&self, key: &Key) -> bool {
        key.home_node() == self.own_id
    }

    #[instrument(skip(self, value_bytes), fields(key = %key.name()))]
    pub fn put(&self, key: &Key, value_bytes: &str) -> Result<(), KvError> {
        if self.is_local(key) {
            self.put_local(key.name(), value_bytes);
            Ok(())
        } else {
            self.put_remote(key, value_bytes)
        }
    }

    fn put_local(&self, name: &str, value_bytes: &str) {
        let mut state = self.state.lock();
        state.map.insert(name.to_string(), value_bytes.to_string());
        state.put_occurred = true;
        self.put_cv.notify_one();
    }

    fn put_remote(&self, key: &Key, value_bytes: &str) -> Result<(), KvError> {
        let addr = self.home_addr(key)?;
        let payload = eau2_codec::encode_put_payload(key.name(), value_bytes);
        let msg = Message::new(self.node().host(), self.node().port(), Tag::Put, payload);
        let reply = self.roundtrip(&addr, &msg)?;
        if reply.tag != Tag::Ack {
            return Err(KvError::Rejected(key.home_node()));
        }
        Ok(())
    }

    #[instrument(skip(self), fields(key = %key.name()))]
    pub fn get(&self, key: &Key) -> Result<Option<String>, KvError> {
        if self.is_local(key) {
            Ok(self.get_local(key.name()))
        } else {
            self.get_remote(key)
        }
    }

    fn get_local(&self, name: &str) -> Option<String> {
        self.state.lock().map.get(name).cloned()
    }

    fn get_remote(&self, key: &Key) -> Result<Option<String>, KvError> {
        let addr = self.home_addr(key)?;
        let msg = Message::new(self.node().host(), self.node().port(), Tag::Get, key.name());
        let reply = self.roundtrip(&addr, &msg)?;
        match reply.tag {
            Tag::Ack => Ok(Some(reply.payload)),
            _ => Ok(None),
        }
    }

    /// Blocks until `key` has a value. Local keys wait on the put condition variable; remote keys
    /// poll `get` at `poll_interval` because the remote node has no channel to push arrival
    /// notifications (§4.5, §9).
    #[instrument(skip(self), fields(key = %key.name()))]
    pub fn wait_and_get(&self, key: &Key) -> Result<String, KvError> {
        if !self.is_local(key) {
            loop {
                if let Some(v) = self.get(key)? {
                    return Ok(v);
                }
                std::thread::sleep(self.poll_interval);
            }
        }

        let mut state = self.state.lock();
        loop {
            while !state.put_occurred {
                self.put_cv.wait(&mut state);
            }
            let found = state.map.get(key.name()).cloned();
            state.put_occurred = false;
            if let Some(v) = found {
                return Ok(v);
            }
        }
    }

    fn home_addr(&self, key: &Key) -> Result<eau2_messaging::NodeAddr, KvError> {
        let directory = self.node().directory();
        directory
            .get(key.home_node())
            .cloned()
            .ok_or(KvError::UnknownHomeNode(key.home_node(), directory.len()))
    }

    fn roundtrip(&self, addr: &eau2_messaging::NodeAddr, msg: &Message) -> Result<Message, KvError> {
        let reply_bytes = request(&addr.host, addr.port, msg.encode().as_bytes())?;
        let reply = Message::decode(&String::from_utf8_lossy(&reply_bytes))?;
        Ok(reply)
    }
}

impl MessageHandler for KvStore {
    fn handle(&self, msg: &Message) -> Message {
        match msg.tag {
            Tag::Put => self.handle_put(msg),
            Tag::Get => self.handle_get(msg),
            other => {
                warn!(?other, "kv store received an unexpected tag");
                Message::new(self.node().host(), self.node().port(), Tag::Nack, "")
            }
        }
    }
}

impl KvStore {
    fn handle_put(&self, msg: &Message) -> Message {
        match eau2_codec::decode_put_payload(&msg.payload) {
            Ok((name, value)) => {
                self.put_local(&name, &value);
                Message::new(self.node().host(), self.node().port(), Tag::Ack, "")
            }
            Err(e) => {
                warn!(error = %e, "malformed PUT payload");
                Message::new(self.node().host(), self.node().port(), Tag::Nack, "")
            }
        }
    }

    fn handle_get(&self, msg: &Message) -> Message {
        match self.get_local(&msg.payload) {
            Some(value) => Message::new(self.node().host(), self.node().port(), Tag::Ack, value),
            None => Message::new(self.node().host(), self.node().port(), Tag::Nack, ""),
        }
    }
}
