//! Node runtime: registration, directory maintenance, and message dispatch (§4.4).

mod handler;
mod node;

pub use handler::MessageHandler;
pub use node::Node;

#[cfg(test)]
mod tests {
    use super::*;
    use eau2_messaging::{encode_directory, Message, NodeAddr, Tag};
    use eau2_net::{connect, recv_framed, send_framed, Listener};
    use std::sync::Arc;

    struct EchoHandler;
    impl MessageHandler for EchoHandler {
        fn handle(&self, msg: &Message) -> Message {
            Message::new(msg.sender_ip.clone(), msg.sender_port, Tag::Ack, msg.payload.clone())
        }
    }

    #[test]
    fn bootstrap_registers_and_waits_for_directory() {
        let coordinator_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let coordinator_port = coordinator_listener.local_addr().unwrap().port();

        // Reserve an ephemeral port, then release it immediately so `bootstrap` can rebind it;
        // the window between drop and rebind is negligible on loopback in practice.
        let node_port = {
            let probe = Listener::bind("127.0.0.1", 0).unwrap();
            probe.local_addr().unwrap().port()
        };

        let coordinator_thread = std::thread::spawn(move || {
            let (mut stream, _) = coordinator_listener.accept().unwrap();
            let frame = recv_framed(&mut stream).unwrap();
            let register = Message::decode(&String::from_utf8_lossy(&frame)).unwrap();
            assert_eq!(register.tag, Tag::Register);

            let ack = Message::new("127.0.0.1", coordinator_port, Tag::Ack, "");
            send_framed(&mut stream, ack.encode().as_bytes()).unwrap();
            drop(stream);

            let addr: eau2_messaging::NodeAddr = register_addr(&register.payload);
            let directory_payload = encode_directory(&[addr]);
            let mut dir_stream = connect(&register.sender_ip, register.sender_port).unwrap();
            let directory = Message::new("127.0.0.1", coordinator_port, Tag::Directory, directory_payload);
            send_framed(&mut dir_stream, directory.encode().as_bytes()).unwrap();
            let reply = recv_framed(&mut dir_stream).unwrap();
            let reply = Message::decode(&String::from_utf8_lossy(&reply)).unwrap();
            assert_eq!(reply.tag, Tag::Ack);
        });

        fn register_addr(payload: &str) -> NodeAddr {
            NodeAddr::decode(payload).unwrap()
        }

        let node = Node::bootstrap(0, "127.0.0.1", node_port, "127.0.0.1", coordinator_port, Arc::new(EchoHandler))
            .unwrap();

        assert_eq!(node.node_count(), 1);
        assert!(node.is_registered());

        coordinator_thread.join().unwrap();
    }
}
