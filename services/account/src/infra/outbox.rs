//! Outbox relay: delivers notification rows written by committed units of work.

use std::future::Future;
use std::time::Duration;

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{LockBehavior, LockType};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
};
use tokio::time::interval;
use tracing::{debug, info, warn};

use passage_account_schema::outbox_events;

use crate::domain::types::CodeEmailPayload;

/// Attempts before a row is marked failed.
pub const MAX_ATTEMPTS: i32 = 3;

const BASE_BACKOFF: Duration = Duration::from_secs(5);
const MAX_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Delivery transport for outbox notifications.
pub trait EmailSender: Send + Sync + 'static {
    fn send(
        &self,
        kind: &str,
        payload: &CodeEmailPayload,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;
}

/// Writes each notification to the log instead of sending it.
#[derive(Debug, Clone, Default)]
pub struct LogEmailSender;

impl EmailSender for LogEmailSender {
    async fn send(&self, kind: &str, payload: &CodeEmailPayload) -> anyhow::Result<()> {
        info!(
            kind,
            user_id = %payload.user_id,
            email = %payload.email,
            expires_in_minutes = payload.verification_code_expiration,
            "email dispatched"
        );
        Ok(())
    }
}

/// Delay before retry number `attempts` (1-based): 5s, 10s, 20s, ... capped at 5 min.
pub fn backoff(attempts: i32) -> Duration {
    let exponent = attempts.saturating_sub(1).clamp(0, 16) as u32;
    BASE_BACKOFF
        .saturating_mul(1u32 << exponent)
        .min(MAX_BACKOFF)
}

/// Outcome of one delivery attempt, applied to its row.
fn next_state(
    row: outbox_events::Model,
    result: anyhow::Result<()>,
    now: DateTime<Utc>,
) -> outbox_events::ActiveModel {
    let attempts = row.attempts + 1;
    let mut active: outbox_events::ActiveModel = row.into();
    active.attempts = Set(attempts);
    match result {
        Ok(()) => {
            active.processed_at = Set(Some(now));
            active.last_error = Set(None);
        }
        Err(e) => {
            active.last_error = Set(Some(format!("{e:#}")));
            if attempts >= MAX_ATTEMPTS {
                active.failed_at = Set(Some(now));
            } else {
                let delay = chrono::Duration::from_std(backoff(attempts))
                    .unwrap_or_else(|_| chrono::Duration::seconds(5));
                active.next_attempt_at = Set(now + delay);
            }
        }
    }
    active
}

pub struct OutboxRelay<S: EmailSender> {
    db: DatabaseConnection,
    sender: S,
    poll_interval: Duration,
    batch_size: u64,
}

impl<S: EmailSender> OutboxRelay<S> {
    pub fn new(db: DatabaseConnection, sender: S) -> Self {
        Self {
            db,
            sender,
            poll_interval: Duration::from_secs(1),
            batch_size: 32,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn with_batch_size(mut self, batch_size: u64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Deliver one batch of due rows. Rows are locked with `SKIP LOCKED`, so
    /// several relays can run side by side. Returns the number handled.
    pub async fn run_once(&self) -> anyhow::Result<usize> {
        let txn = self.db.begin().await.context("begin outbox transaction")?;
        let now = Utc::now();
        let due = outbox_events::Entity::find()
            .filter(outbox_events::Column::ProcessedAt.is_null())
            .filter(outbox_events::Column::FailedAt.is_null())
            .filter(outbox_events::Column::NextAttemptAt.lte(now))
            .order_by_asc(outbox_events::Column::NextAttemptAt)
            .limit(self.batch_size)
            .lock_with_behavior(LockType::Update, LockBehavior::SkipLocked)
            .all(&txn)
            .await
            .context("select due outbox events")?;

        let handled = due.len();
        for row in due {
            let result = match serde_json::from_value::<CodeEmailPayload>(row.payload.clone()) {
                Ok(payload) => self.sender.send(&row.kind, &payload).await,
                Err(e) => Err(anyhow::Error::new(e).context("decode outbox payload")),
            };
            if let Err(ref e) = result {
                warn!(event_id = %row.id, kind = %row.kind, attempts = row.attempts + 1, error = %e, "outbox delivery failed");
            }
            next_state(row, result, now)
                .update(&txn)
                .await
                .context("update outbox event")?;
        }
        txn.commit().await.context("commit outbox transaction")?;
        Ok(handled)
    }

    /// Spawn the polling loop. Abort the handle to stop it.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = interval(self.poll_interval);
            loop {
                ticker.tick().await;
                match self.run_once().await {
                    Ok(0) => {}
                    Ok(n) => debug!(count = n, "outbox batch delivered"),
                    Err(e) => warn!(error = %e, "outbox poll failed"),
                }
            }
        })
    }
}
