//! Fan-out of session messages to attached views.

use crate::messages::ViewMessage;
use tokio::sync::mpsc::UnboundedSender;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ViewId(pub u64);

/// Registry of view channels. Channels whose receiver dropped are pruned on
/// the next broadcast.
#[derive(Debug, Default)]
pub struct Broadcaster {
    views: Vec<(ViewId, UnboundedSender<ViewMessage>)>,
    next_id: u64,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&mut self, sender: UnboundedSender<ViewMessage>) -> ViewId {
        let id = ViewId(self.next_id);
        self.next_id += 1;
        self.views.push((id, sender));
        tracing::debug!(view = id.0, "view attached");
        id
    }

    pub fn detach(&mut self, id: ViewId) {
        self.views.retain(|(view, _)| *view != id);
        tracing::debug!(view = id.0, "view detached");
    }

    pub fn view_count(&self) -> usize {
        self.views.len()
    }

    /// Send to every attached view, dropping channels that went away.
    pub fn broadcast(&mut self, message: ViewMessage) {
        self.views
            .retain(|(_, sender)| sender.send(message.clone()).is_ok());
    }

    /// Send to a single view. Returns false when the channel is gone.
    pub fn send_to(&self, id: ViewId, message: ViewMessage) -> bool {
        self.views
            .iter()
            .find(|(view, _)| *view == id)
            .map(|(_, sender)| sender.send(message).is_ok())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_broadcast_reaches_every_view() {
        let mut broadcaster = Broadcaster::new();
        let (tx_a, mut rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        broadcaster.attach(tx_a);
        broadcaster.attach(tx_b);

        broadcaster.broadcast(ViewMessage::update("x = 1\n".to_string()));
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_dead_channels_are_pruned() {
        let mut broadcaster = Broadcaster::new();
        let (tx_a, rx_a) = unbounded_channel();
        let (tx_b, mut rx_b) = unbounded_channel();
        broadcaster.attach(tx_a);
        broadcaster.attach(tx_b);
        drop(rx_a);

        broadcaster.broadcast(ViewMessage::update(String::new()));
        assert_eq!(broadcaster.view_count(), 1);
        assert!(rx_b.try_recv().is_ok());
    }

    #[test]
    fn test_detach_stops_delivery() {
        let mut broadcaster = Broadcaster::new();
        let (tx, mut rx) = unbounded_channel();
        let id = broadcaster.attach(tx);
        broadcaster.detach(id);

        broadcaster.broadcast(ViewMessage::update(String::new()));
        assert!(rx.try_recv().is_err());
    }
}
