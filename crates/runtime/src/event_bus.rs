use std::collections::VecDeque;

/// A non-blocking notice for the UI layer.
///
/// `kind` is a stable snake_case tag (for example `fetch_failed`); `seq` is
/// monotonically increasing for the lifetime of the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub seq: u64,
    pub kind: &'static str,
    pub message: String,
}

/// Bounded notice log. When full, the oldest event is dropped.
#[derive(Debug)]
pub struct EventBus {
    next_seq: u64,
    capacity: usize,
    events: VecDeque<Event>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_capacity(32)
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            next_seq: 0,
            capacity: capacity.max(1),
            events: VecDeque::new(),
        }
    }

    pub fn emit(&mut self, kind: &'static str, message: impl Into<String>) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(Event {
            seq,
            kind,
            message: message.into(),
        });
        seq
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.iter().cloned().collect()
    }

    pub fn drain(&mut self) -> Vec<Event> {
        self.events.drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::EventBus;

    #[test]
    fn records_events_in_order() {
        let mut bus = EventBus::new();
        bus.emit("fetch_failed", "timeout");
        bus.emit("location_unavailable", "denied");
        let kinds: Vec<_> = bus.events().iter().map(|e| e.kind).collect();
        assert_eq!(kinds, vec!["fetch_failed", "location_unavailable"]);
        assert_eq!(bus.events()[1].seq, 1);
    }

    #[test]
    fn drops_oldest_when_full() {
        let mut bus = EventBus::with_capacity(2);
        bus.emit("a", "1");
        bus.emit("b", "2");
        bus.emit("c", "3");
        let seqs: Vec<_> = bus.events().iter().map(|e| e.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn drain_clears_events() {
        let mut bus = EventBus::new();
        bus.emit("k", "m");
        let drained = bus.drain();
        assert_eq!(drained.len(), 1);
        assert!(bus.is_empty());
        assert_eq!(bus.emit("k", "again"), 1);
    }
}
