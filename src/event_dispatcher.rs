use crate::renderer::events::RenderEvent;
use flume::{Receiver, Sender};

pub struct EventDispatcher {
    /// Receiver must only be consumed by the engine
    rend_read_chan: Receiver<RenderEvent>,
    rend_write_chan: Sender<RenderEvent>,
}

impl Default for EventDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher {
    pub fn new() -> Self {
        let (rsc, rrc) = flume::unbounded();

        Self {
            rend_read_chan: rrc,
            rend_write_chan: rsc,
        }
    }

    /// A handle the host can keep, and send from any thread.
    pub fn sender(&self) -> Sender<RenderEvent> {
        self.rend_write_chan.clone()
    }

    /// Everything queued so far, in send order.
    pub fn drain(&self) -> impl Iterator<Item = RenderEvent> + '_ {
        self.rend_read_chan.drain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_arrive_in_order() {
        let dispatcher = EventDispatcher::new();
        let sender = dispatcher.sender();
        sender.send(RenderEvent::CenterGraph).unwrap();
        sender.send(RenderEvent::Zoomed(2.0)).unwrap();

        let drained: Vec<_> = dispatcher.drain().collect();
        assert_eq!(drained, [RenderEvent::CenterGraph, RenderEvent::Zoomed(2.0)]);
        assert_eq!(dispatcher.drain().count(), 0);
    }
}
