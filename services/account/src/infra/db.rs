use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection,
    DatabaseTransaction, DbErr, EntityTrait, QueryFilter, QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use passage_account_schema::{outbox_events, users};

use crate::domain::repository::{UserRepository, UserUnitOfWork};
use crate::domain::types::{OutboxEvent, User};
use crate::error::AccountError;

// ── User repository ───────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    type UnitOfWork = DbUnitOfWork;

    async fn begin(&self) -> Result<DbUnitOfWork, AccountError> {
        let txn = self.db.begin().await.context("begin transaction")?;
        Ok(DbUnitOfWork { txn })
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn ping(&self) -> bool {
        self.db.ping().await.is_ok()
    }
}

// ── Unit of work ──────────────────────────────────────────────────────────────

/// One database transaction. Rows read here are locked `FOR UPDATE` until
/// commit, so concurrent verifications of the same account serialize.
/// Dropping without `commit` rolls back.
pub struct DbUnitOfWork {
    txn: DatabaseTransaction,
}

impl UserUnitOfWork for DbUnitOfWork {
    async fn find_by_email(&mut self, email: &str) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .lock_exclusive()
            .one(&self.txn)
            .await
            .context("find user by email for update")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_id(&mut self, id: Uuid) -> Result<Option<User>, AccountError> {
        let model = users::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&self.txn)
            .await
            .context("find user by id for update")?;
        model.map(user_from_model).transpose()
    }

    async fn create(&mut self, user: &User) -> Result<(), AccountError> {
        match users::Entity::insert(user_to_active_model(user))
            .exec(&self.txn)
            .await
        {
            Ok(_) => Ok(()),
            Err(e) if is_unique_violation(&e) => Err(AccountError::Conflict),
            Err(e) => Err(anyhow::Error::new(e).context("insert user").into()),
        }
    }

    async fn update(&mut self, user: &User) -> Result<(), AccountError> {
        user_to_active_model(user)
            .update(&self.txn)
            .await
            .context("update user")?;
        Ok(())
    }

    async fn enqueue(&mut self, event: &OutboxEvent) -> Result<(), AccountError> {
        insert_outbox_event(&self.txn, event)
            .await
            .context("insert outbox event")?;
        Ok(())
    }

    async fn commit(self) -> Result<(), AccountError> {
        self.txn.commit().await.context("commit transaction")?;
        Ok(())
    }
}

fn is_unique_violation(err: &DbErr) -> bool {
    matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
}

async fn insert_outbox_event<C: ConnectionTrait>(
    conn: &C,
    event: &OutboxEvent,
) -> Result<(), DbErr> {
    let now = Utc::now();
    outbox_events::ActiveModel {
        id: Set(event.id),
        kind: Set(event.kind.clone()),
        payload: Set(event.payload.clone()),
        idempotency_key: Set(event.idempotency_key.clone()),
        attempts: Set(0),
        last_error: Set(None),
        created_at: Set(now),
        next_attempt_at: Set(now),
        processed_at: Set(None),
        failed_at: Set(None),
    }
    .insert(conn)
    .await?;
    Ok(())
}

fn user_to_active_model(user: &User) -> users::ActiveModel {
    users::ActiveModel {
        id: Set(user.id),
        email: Set(user.email.clone()),
        name: Set(user.name.clone()),
        password_hash: Set(user.password_hash.clone()),
        status: Set(user.status.as_str().to_owned()),
        email_verified_at: Set(user.email_verified_at),
        two_factor_secret: Set(user.two_factor_secret.clone()),
        two_factor_enabled: Set(user.two_factor_enabled),
        two_factor_last_step: Set(user.two_factor_last_step),
        created_at: Set(user.created_at),
        updated_at: Set(user.updated_at),
    }
}

fn user_from_model(model: users::Model) -> Result<User, AccountError> {
    Ok(User {
        id: model.id,
        status: model
            .status
            .parse()
            .with_context(|| format!("user {}", model.id))?,
        email: model.email,
        name: model.name,
        password_hash: model.password_hash,
        email_verified_at: model.email_verified_at,
        two_factor_secret: model.two_factor_secret,
        two_factor_enabled: model.two_factor_enabled,
        two_factor_last_step: model.two_factor_last_step,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
