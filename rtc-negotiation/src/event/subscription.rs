use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio_stream::Stream;

use crate::configuration::ReplayPolicy;

/// A lazy, unbounded sequence of items published by one session.
///
/// Each subscriber owns its own queue, so a subscriber that stops reading
/// never holds back the session or other subscribers. The sequence ends
/// once the session is closed and every queued item has been taken.
#[derive(Debug)]
pub struct Subscription<T> {
    rx: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    /// Waits for the next item, or `None` after the session closed.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Takes the next item if one is already queued.
    pub fn try_recv(&mut self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Stream for Subscription<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// Fan-out of one item kind to any number of subscribers.
#[derive(Debug)]
pub(crate) struct Topic<T> {
    subscribers: Vec<mpsc::UnboundedSender<T>>,
    history: VecDeque<T>,
    replay: ReplayPolicy,
    closed: bool,
}

impl<T: Clone> Topic<T> {
    pub(crate) fn new(replay: ReplayPolicy) -> Self {
        Self {
            subscribers: vec![],
            history: VecDeque::new(),
            replay,
            closed: false,
        }
    }

    /// Delivers `item` to every live subscriber and records it for replay.
    pub(crate) fn publish(&mut self, item: T) {
        if self.closed {
            return;
        }

        match self.replay.capacity() {
            Some(0) => {}
            Some(n) => {
                if self.history.len() == n {
                    self.history.pop_front();
                }
                self.history.push_back(item.clone());
            }
            None => self.history.push_back(item.clone()),
        }

        // forget subscribers whose receiving half was dropped
        self.subscribers.retain(|tx| tx.send(item.clone()).is_ok());
    }

    /// Registers a subscriber, first handing it the replayed history.
    pub(crate) fn subscribe(&mut self) -> Subscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.closed {
            for item in &self.history {
                let _ = tx.send(item.clone());
            }
            self.subscribers.push(tx);
        }
        Subscription { rx }
    }

    /// Ends every subscription. Later subscribers get an ended sequence.
    pub(crate) fn close(&mut self) {
        self.closed = true;
        self.subscribers.clear();
        self.history.clear();
    }

    pub(crate) fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
