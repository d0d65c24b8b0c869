//! Per-chapter fan-out of outbound sync events.
//!
//! Each `(report, chapter)` pair gets its own bounded
//! [`tokio::sync::broadcast`] channel, created on first use. Publishing to a
//! chapter nobody listens to is a no-op. A subscriber that falls more than
//! the channel capacity behind loses the oldest events and must re-fetch the
//! chapter; the SSE handler turns that into a `resync` event.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use redline_api::OutboundEvent;
use tokio::sync::broadcast;

type ChapterKey = (String, String);

pub struct EventHub {
    capacity: usize,
    channels: Mutex<HashMap<ChapterKey, broadcast::Sender<OutboundEvent>>>,
}

impl EventHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            channels: Mutex::new(HashMap::new()),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<ChapterKey, broadcast::Sender<OutboundEvent>>> {
        // the map holds no invariant a panicking holder could break
        self.channels
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Subscribe to a chapter's outbound events.
    pub fn subscribe(&self, report_id: &str, chapter_id: &str) -> broadcast::Receiver<OutboundEvent> {
        let mut channels = self.channels();
        channels
            .entry((report_id.to_string(), chapter_id.to_string()))
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .subscribe()
    }

    /// Send `event` to every current subscriber of the chapter. Returns how
    /// many received it.
    pub fn publish(&self, report_id: &str, chapter_id: &str, event: OutboundEvent) -> usize {
        let key = (report_id.to_string(), chapter_id.to_string());
        let mut channels = self.channels();
        let Some(tx) = channels.get(&key) else {
            return 0;
        };
        match tx.send(event) {
            Ok(n) => n,
            Err(_) => {
                // every receiver is gone
                channels.remove(&key);
                0
            }
        }
    }
}
