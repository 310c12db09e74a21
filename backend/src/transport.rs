//! In-process reading transport
//!
//! Carries readings from the generator to the ingestion point over a
//! bounded channel and hands each message to an explicit handler, in
//! publish order. This replaces broker callbacks with a seam the rest of
//! the system can be tested against.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::SensorReading;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One reading in flight, stamped with its origin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadingMessage {
    pub timestamp: DateTime<Utc>,
    pub publisher_id: String,
    pub sensor_readings: SensorReading,
}

/// Receives transported readings, one call per message, in delivery order.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: ReadingMessage);
}

/// Publisher half of the transport.
#[derive(Clone)]
pub struct ReadingBus {
    tx: mpsc::Sender<ReadingMessage>,
}

impl ReadingBus {
    /// Publish a reading; returns false when the dispatcher is gone.
    pub async fn publish(&self, message: ReadingMessage) -> bool {
        if let Err(e) = self.tx.send(message).await {
            tracing::warn!("Reading transport closed: {e}");
            return false;
        }
        true
    }
}

/// Create a bounded transport and start its dispatch loop.
///
/// The loop drains the channel and invokes the handler per message; it ends
/// when every publisher handle is dropped.
pub fn spawn(
    capacity: usize,
    handler: std::sync::Arc<dyn MessageHandler>,
) -> (ReadingBus, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<ReadingMessage>(capacity);

    let dispatcher = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            handler.handle(message).await;
        }
        tracing::debug!("Reading transport dispatcher stopped");
    });

    (ReadingBus { tx }, dispatcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MessageHandler for Recorder {
        async fn handle(&self, message: ReadingMessage) {
            self.seen.lock().unwrap().push(message.publisher_id);
        }
    }

    #[tokio::test]
    async fn messages_arrive_in_publish_order() {
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let (bus, dispatcher) = spawn(8, recorder.clone());

        let reading = crate::generator::BASE_READING;
        for id in ["a", "b", "c"] {
            let delivered = bus
                .publish(ReadingMessage {
                    timestamp: chrono::Utc::now(),
                    publisher_id: id.to_string(),
                    sensor_readings: reading,
                })
                .await;
            assert!(delivered);
        }

        drop(bus);
        dispatcher.await.unwrap();

        assert_eq!(*recorder.seen.lock().unwrap(), vec!["a", "b", "c"]);
    }
}
