use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rand::Rng;
use serde::Serialize;
use strum::Display;
use time::OffsetDateTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Wall-clock milliseconds scaled up with a random fraction in the low digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct NotificationId(u64);

impl NotificationId {
    const JITTER_SPACE: u64 = 1_000;

    fn fresh() -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let millis = u64::try_from(millis).unwrap_or_default();
        let jitter = rand::thread_rng().gen_range(0..Self::JITTER_SPACE);
        NotificationId(millis.saturating_mul(Self::JITTER_SPACE) + jitter)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationEntry {
    pub id: NotificationId,
    pub message: String,
    pub kind: NotificationKind,
}

impl NotificationEntry {
    pub fn new(message: impl Into<String>, kind: NotificationKind) -> Self {
        Self {
            id: NotificationId::fresh(),
            message: message.into(),
            kind,
        }
    }
}

pub type NotificationHandler = Arc<dyn Fn(&[NotificationEntry]) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionToken(u64);

struct Subscriber {
    token: SubscriptionToken,
    handler: NotificationHandler,
}

struct Inner {
    queue: VecDeque<NotificationEntry>,
    subscriber: Option<Subscriber>,
    next_token: u64,
    visible_for: Duration,
    deadline: Option<Instant>,
}

impl Inner {
    fn arm_if_idle(&mut self, now: Instant) {
        if self.deadline.is_none() && self.subscriber.is_some() && !self.queue.is_empty() {
            self.deadline = Some(now + self.visible_for);
        }
    }

    fn delivery(&self) -> Option<(NotificationHandler, Vec<NotificationEntry>)> {
        self.subscriber.as_ref().map(|subscriber| {
            (
                subscriber.handler.clone(),
                self.queue.iter().cloned().collect(),
            )
        })
    }
}

/// Process-wide notification queue. Any holder of a handle can post; at most
/// one display surface subscribes to receive queue snapshots. Entries posted
/// while nobody is subscribed are buffered and handed over in full on the
/// next subscription. The oldest entry is evicted once per visible interval
/// while a surface is attached.
#[derive(Clone)]
pub struct NotificationService {
    inner: Arc<Mutex<Inner>>,
}

impl fmt::Debug for NotificationService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("NotificationService")
            .field("queued", &inner.queue.len())
            .field("subscribed", &inner.subscriber.is_some())
            .field("deadline", &inner.deadline)
            .finish()
    }
}

impl NotificationService {
    pub fn new(visible_for: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                queue: VecDeque::new(),
                subscriber: None,
                next_token: 0,
                visible_for,
                deadline: None,
            })),
        }
    }

    pub fn post(&self, message: impl Into<String>, kind: NotificationKind) -> NotificationId {
        self.post_at(Instant::now(), message, kind)
    }

    pub fn post_at(
        &self,
        now: Instant,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> NotificationId {
        self.publish_at(now, NotificationEntry::new(message, kind))
    }

    pub fn publish(&self, entry: NotificationEntry) -> NotificationId {
        self.publish_at(Instant::now(), entry)
    }

    /// Appends `entry` to the tail, re-keying it if its id is still queued.
    pub fn publish_at(&self, now: Instant, mut entry: NotificationEntry) -> NotificationId {
        let (id, delivery) = {
            let mut inner = self.inner.lock();
            while inner.queue.iter().any(|queued| queued.id == entry.id) {
                entry.id = NotificationId(entry.id.0.wrapping_add(1));
            }
            tracing::debug!(id = %entry.id, kind = %entry.kind, message = %entry.message, "notification posted");
            let id = entry.id;
            inner.queue.push_back(entry);
            inner.arm_if_idle(now);
            (id, inner.delivery())
        };
        deliver(delivery);
        id
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionToken
    where
        F: Fn(&[NotificationEntry]) + Send + Sync + 'static,
    {
        self.subscribe_at(Instant::now(), handler)
    }

    /// Installs `handler` as the only display surface, replacing any previous
    /// one, and immediately hands it everything buffered so far.
    pub fn subscribe_at<F>(&self, now: Instant, handler: F) -> SubscriptionToken
    where
        F: Fn(&[NotificationEntry]) + Send + Sync + 'static,
    {
        let (token, delivery) = {
            let mut inner = self.inner.lock();
            inner.next_token += 1;
            let token = SubscriptionToken(inner.next_token);
            if inner.subscriber.is_some() {
                tracing::debug!("replacing existing notification subscriber");
            }
            inner.subscriber = Some(Subscriber {
                token,
                handler: Arc::new(handler),
            });
            inner.arm_if_idle(now);
            (token, inner.delivery())
        };
        deliver(delivery);
        token
    }

    /// Subscribes and returns a guard that unsubscribes when dropped.
    pub fn attach<F>(&self, handler: F) -> Subscription
    where
        F: Fn(&[NotificationEntry]) + Send + Sync + 'static,
    {
        let token = self.subscribe(handler);
        Subscription {
            service: self.clone(),
            token,
        }
    }

    /// Detaches the subscriber if `token` is still current. Expiry pauses
    /// until the next subscription; queued entries stay buffered.
    pub fn unsubscribe(&self, token: SubscriptionToken) -> bool {
        let mut inner = self.inner.lock();
        match &inner.subscriber {
            Some(subscriber) if subscriber.token == token => {
                inner.subscriber = None;
                inner.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Evicts at most one entry, the oldest, if the expiry deadline passed.
    pub fn poll_at(&self, now: Instant) -> Option<NotificationEntry> {
        let (evicted, delivery) = {
            let mut inner = self.inner.lock();
            let due = inner.deadline.map(|deadline| now >= deadline).unwrap_or(false);
            if !due {
                return None;
            }
            let evicted = inner.queue.pop_front();
            inner.deadline = None;
            inner.arm_if_idle(now);
            (evicted, inner.delivery())
        };
        deliver(delivery);
        evicted
    }

    pub fn snapshot(&self) -> Vec<NotificationEntry> {
        self.inner.lock().queue.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().queue.is_empty()
    }

    pub fn has_subscriber(&self) -> bool {
        self.inner.lock().subscriber.is_some()
    }

    pub fn next_expiry(&self) -> Option<Instant> {
        self.inner.lock().deadline
    }

    pub fn shutdown(&self) {
        let mut inner = self.inner.lock();
        inner.subscriber = None;
        inner.deadline = None;
        let dropped = inner.queue.len();
        inner.queue.clear();
        tracing::info!(dropped, "notification service shut down");
    }
}

fn deliver(delivery: Option<(NotificationHandler, Vec<NotificationEntry>)>) {
    if let Some((handler, snapshot)) = delivery {
        handler(&snapshot);
    }
}

/// Keeps a subscription alive; dropping it unsubscribes.
pub struct Subscription {
    service: NotificationService,
    token: SubscriptionToken,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.service.unsubscribe(self.token);
    }
}
