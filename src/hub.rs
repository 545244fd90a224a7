//! The single authority over "what has been said" and "who is listening".
use std::{collections::HashMap, sync::Arc};

use tokio::sync::{
    mpsc::{self, error::TrySendError},
    Mutex,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    history::{History, Snapshot},
    message::{Frame, Message},
};

pub type ConnId = Uuid;
pub type Tx = mpsc::Sender<Frame>;
pub type Rx = mpsc::Receiver<Frame>;

/* ------------ live set + log, one lock ------------ */
#[derive(Default)]
struct HubState {
    history: History,
    live:    HashMap<ConnId, Tx>,
}

/// Cloneable handle; every clone talks to the same hub.
#[derive(Clone)]
pub struct Hub {
    state:  Arc<Mutex<HubState>>,
    buffer: usize,
}

/// A registered client's side of the hub: its id and the queue of frames
/// published since it joined.
pub struct Connection {
    pub id:   ConnId,
    pub rx:   Rx,
    /// Live connections right after this one joined.
    pub live: usize,
}

impl Hub {
    pub fn new(buffer: usize) -> Self {
        Self { state: Arc::default(), buffer: buffer.max(1) }
    }

    /// Joins the live set and returns the history as of that instant.
    /// Frames in the snapshot are never also queued on the connection.
    pub async fn register(&self) -> (Connection, Snapshot) {
        let (tx, rx) = mpsc::channel(self.buffer);
        let id = Uuid::new_v4();

        let mut st = self.state.lock().await;
        st.live.insert(id, tx);
        let snapshot = st.history.snapshot();
        (Connection { id, rx, live: st.live.len() }, snapshot)
    }

    /// Appends to history and queues the frame to every live connection,
    /// sender included. Returns how many connections accepted it.
    pub async fn publish(&self, msg: &Message) -> AppResult<usize> {
        let frame = msg.encode()?;

        let mut st = self.state.lock().await;
        st.history.append(frame.clone());

        let mut delivered = 0;
        for (id, tx) in &st.live {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    tracing::warn!(conn = %id, "outbound queue full, message skipped")
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(conn = %id, "connection closed, message skipped")
                }
            }
        }
        tracing::debug!(history = st.history.len(), delivered, "published");
        Ok(delivered)
    }

    /// Removes a connection and returns how many remain, or `None` if it
    /// was not registered.
    pub async fn unregister(&self, id: ConnId) -> Option<usize> {
        let mut st = self.state.lock().await;
        st.live.remove(&id).map(|_| st.live.len())
    }

    #[cfg(test)]
    pub async fn live_count(&self) -> usize {
        self.state.lock().await.live.len()
    }

    #[cfg(test)]
    pub async fn history_len(&self) -> usize {
        self.state.lock().await.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Message {
        Message::text(s)
    }

    fn drain(conn: &mut Connection) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(f) = conn.rx.try_recv() {
            out.push(Message::parse(&f).unwrap());
        }
        out
    }

    #[tokio::test]
    async fn late_joiner_replays_everything_once() {
        let hub = Hub::new(16);
        for s in ["one", "two", "three"] {
            hub.publish(&text(s)).await.unwrap();
        }

        let (mut conn, snap) = hub.register().await;
        let replayed: Vec<_> = snap.map(|f| Message::parse(&f).unwrap()).collect();
        assert_eq!(replayed, vec![text("one"), text("two"), text("three")]);
        assert!(drain(&mut conn).is_empty());

        hub.publish(&text("four")).await.unwrap();
        assert_eq!(drain(&mut conn), vec![text("four")]);
    }

    #[tokio::test]
    async fn every_live_connection_gets_each_message_once() {
        let hub = Hub::new(16);
        let (mut a, _) = hub.register().await;
        let (mut b, _) = hub.register().await;
        let (mut c, _) = hub.register().await;
        assert_eq!((a.live, b.live, c.live), (1, 2, 3));

        let n = hub.publish(&text("hi")).await.unwrap();
        assert_eq!(n, 3);
        for conn in [&mut a, &mut b, &mut c] {
            assert_eq!(drain(conn), vec![text("hi")]);
        }
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = Hub::new(4);
        let (conn, _) = hub.register().await;

        assert_eq!(hub.unregister(conn.id).await, Some(0));
        assert_eq!(hub.unregister(conn.id).await, None);
        assert_eq!(hub.unregister(Uuid::new_v4()).await, None);
        assert_eq!(hub.live_count().await, 0);
    }

    #[tokio::test]
    async fn dead_or_slow_connections_do_not_block_others() {
        let hub = Hub::new(1);
        let (dead, _) = hub.register().await;
        let (_slow, _) = hub.register().await;
        let (mut ok, _) = hub.register().await;
        drop(dead.rx);

        hub.publish(&text("first")).await.unwrap();
        assert_eq!(drain(&mut ok), vec![text("first")]);

        // `_slow` never drains, so its single slot is still taken
        let n = hub.publish(&text("second")).await.unwrap();
        assert_eq!(n, 1);
        assert_eq!(drain(&mut ok), vec![text("second")]);
        assert_eq!(hub.history_len().await, 2);
    }

    #[tokio::test]
    async fn concurrent_publishers_agree_with_history_order() {
        let hub = Hub::new(1024);
        let (mut a, _) = hub.register().await;
        let (mut b, _) = hub.register().await;

        let mut tasks = Vec::new();
        for w in 0..8 {
            let hub = hub.clone();
            tasks.push(tokio::spawn(async move {
                for i in 0..25 {
                    hub.publish(&text(&format!("{w}-{i}"))).await.unwrap();
                }
            }));
        }
        for t in tasks {
            t.await.unwrap();
        }

        let (_late, snap) = hub.register().await;
        let history: Vec<_> = snap.map(|f| Message::parse(&f).unwrap()).collect();
        assert_eq!(history.len(), 200);
        assert_eq!(drain(&mut a), history);
        assert_eq!(drain(&mut b), history);
    }

    #[tokio::test]
    async fn sequential_publishes_keep_order() {
        let hub = Hub::new(8);
        let (mut conn, _) = hub.register().await;
        hub.publish(&text("A")).await.unwrap();
        hub.publish(&text("B")).await.unwrap();
        assert_eq!(drain(&mut conn), vec![text("A"), text("B")]);
    }
}
