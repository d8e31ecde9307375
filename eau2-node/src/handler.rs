use eau2_messaging::Message;

/// Dispatched to for any tag the node runtime does not own itself (§4.4: "On any other tag:
/// delegate to a subclass-provided handler"). The KV store implements this for PUT/GET.
pub trait MessageHandler: Send + Sync {
    fn handle(&self, msg: &Message) -> Message;
}
