use eau2_messaging::NodeAddr;
use parking_lot::Mutex;

/// The append-only roster of registered node addresses. A node's id is its index in this list
/// (§4.3: "the roster is append-only and preserves registration order").
#[derive(Default)]
pub struct Roster {
    addrs: Mutex<Vec<NodeAddr>>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `addr` and returns its freshly assigned node id.
    pub fn register(&self, addr: NodeAddr) -> usize {
        let mut addrs = self.addrs.lock();
        addrs.push(addr);
        addrs.len() - 1
    }

    pub fn snapshot(&self) -> Vec<NodeAddr> {
        self.addrs.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_assigns_ids_in_order() {
        let roster = Roster::new();
        assert_eq!(roster.register(NodeAddr::new("127.0.0.1", 9001)), 0);
        assert_eq!(roster.register(NodeAddr::new("127.0.0.1", 9002)), 1);
        assert_eq!(roster.snapshot().len(), 2);
    }
}
