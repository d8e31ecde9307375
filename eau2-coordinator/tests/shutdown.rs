//! End-to-end SHUTDOWN cascade test (§4.3 item 2, §8 scenario 6): a coordinator and a node talk
//! over real TCP, and `Coordinator::shutdown` must bring the node's `is_shutting_down` flag up.

use std::sync::Arc;
use std::time::{Duration, Instant};

use eau2_coordinator::Coordinator;
use eau2_messaging::Message;
use eau2_node::{MessageHandler, Node};

struct EchoHandler;

impl MessageHandler for EchoHandler {
    fn handle(&self, msg: &Message) -> Message {
        Message::new(
            msg.sender_ip.clone(),
            msg.sender_port,
            eau2_messaging::Tag::Ack,
            msg.payload.clone(),
        )
    }
}

fn wait_until(mut predicate: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    predicate()
}

#[test]
fn shutdown_cascades_from_coordinator_to_a_registered_node() {
    let coordinator_listener = eau2_net::Listener::bind("127.0.0.1", 0).unwrap();
    let coordinator_port = coordinator_listener.local_addr().unwrap().port();
    drop(coordinator_listener);

    let coordinator = Arc::new(Coordinator::new("127.0.0.1", coordinator_port));
    let c2 = coordinator.clone();
    let coordinator_thread = std::thread::spawn(move || c2.run().unwrap());

    let node_port = {
        let probe = eau2_net::Listener::bind("127.0.0.1", 0).unwrap();
        probe.local_addr().unwrap().port()
    };
    let node = Node::bootstrap(
        0,
        "127.0.0.1",
        node_port,
        "127.0.0.1",
        coordinator_port,
        Arc::new(EchoHandler),
    )
    .unwrap();

    assert!(!node.is_shutting_down());

    coordinator.shutdown();

    assert!(wait_until(|| node.is_shutting_down(), Duration::from_secs(2)));
    assert!(wait_until(|| coordinator.is_shutting_down(), Duration::from_secs(2)));

    coordinator_thread.join().unwrap();
}
