//! Contact message repository

use crate::db::{Backend, DynDatabasePool};
use crate::models::{ContactInput, ListParams, Message, MessageFilter, MessageUpdate};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::sync::Arc;

#[async_trait]
pub trait MessageRepository: Send + Sync {
    async fn create(&self, input: &ContactInput) -> Result<Message>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Message>>;

    /// Newest first
    async fn list(&self, filter: MessageFilter, params: &ListParams) -> Result<(Vec<Message>, i64)>;

    /// Apply the flags present in `update`; `None` when the id is unknown
    async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Option<Message>>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count_unread(&self) -> Result<i64>;
}

pub struct SqlxMessageRepository {
    pool: DynDatabasePool,
}

impl SqlxMessageRepository {
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn MessageRepository> {
        Arc::new(Self::new(pool))
    }
}

const MESSAGE_COLUMNS: &str =
    "id, name, email, phone, company, subject, message, is_read, is_archived, created_at";

fn row_to_message_sqlite(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        subject: row.get("subject"),
        message: row.get("message"),
        is_read: row.get("is_read"),
        is_archived: row.get("is_archived"),
        created_at: row.get("created_at"),
    }
}

fn row_to_message_mysql(row: &sqlx::mysql::MySqlRow) -> Message {
    Message {
        id: row.get("id"),
        name: row.get("name"),
        email: row.get("email"),
        phone: row.get("phone"),
        company: row.get("company"),
        subject: row.get("subject"),
        message: row.get("message"),
        is_read: row.get("is_read"),
        is_archived: row.get("is_archived"),
        created_at: row.get("created_at"),
    }
}

fn filter_clause(filter: MessageFilter) -> &'static str {
    if filter.unread_only {
        "WHERE is_archived = ? AND is_read = ?"
    } else {
        "WHERE is_archived = ?"
    }
}

#[async_trait]
impl MessageRepository for SqlxMessageRepository {
    async fn create(&self, input: &ContactInput) -> Result<Message> {
        let sql = r#"
            INSERT INTO messages (name, email, phone, company, subject, message, is_read, is_archived, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#;
        let now = Utc::now();
        let id = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.phone)
                .bind(&input.company)
                .bind(&input.subject)
                .bind(&input.message)
                .bind(false)
                .bind(false)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to store message")?
                .last_insert_rowid(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(&input.name)
                .bind(&input.email)
                .bind(&input.phone)
                .bind(&input.company)
                .bind(&input.subject)
                .bind(&input.message)
                .bind(false)
                .bind(false)
                .bind(now)
                .execute(pool)
                .await
                .context("Failed to store message")?
                .last_insert_id() as i64,
        };

        Ok(Message {
            id,
            name: input.name.clone(),
            email: input.email.clone(),
            phone: input.phone.clone(),
            company: input.company.clone(),
            subject: input.subject.clone(),
            message: input.message.clone(),
            is_read: false,
            is_archived: false,
            created_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Message>> {
        let sql = format!("SELECT {} FROM messages WHERE id = ?", MESSAGE_COLUMNS);
        let message = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get message")?
                .as_ref()
                .map(row_to_message_sqlite),
            Backend::Mysql(pool) => sqlx::query(&sql)
                .bind(id)
                .fetch_optional(pool)
                .await
                .context("Failed to get message")?
                .as_ref()
                .map(row_to_message_mysql),
        };
        Ok(message)
    }

    async fn list(&self, filter: MessageFilter, params: &ListParams) -> Result<(Vec<Message>, i64)> {
        let clause = filter_clause(filter);
        let count_sql = format!("SELECT COUNT(*) AS total FROM messages {}", clause);
        let list_sql = format!(
            "SELECT {} FROM messages {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            MESSAGE_COLUMNS, clause
        );

        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                let mut count = sqlx::query(&count_sql).bind(filter.archived);
                let mut list = sqlx::query(&list_sql).bind(filter.archived);
                if filter.unread_only {
                    count = count.bind(false);
                    list = list.bind(false);
                }
                let total: i64 = count
                    .fetch_one(pool)
                    .await
                    .context("Failed to count messages")?
                    .get("total");
                let rows = list
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
                    .context("Failed to list messages")?;
                Ok((rows.iter().map(row_to_message_sqlite).collect(), total))
            }
            Backend::Mysql(pool) => {
                let mut count = sqlx::query(&count_sql).bind(filter.archived);
                let mut list = sqlx::query(&list_sql).bind(filter.archived);
                if filter.unread_only {
                    count = count.bind(false);
                    list = list.bind(false);
                }
                let total: i64 = count
                    .fetch_one(pool)
                    .await
                    .context("Failed to count messages")?
                    .get("total");
                let rows = list
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(pool)
                    .await
                    .context("Failed to list messages")?;
                Ok((rows.iter().map(row_to_message_mysql).collect(), total))
            }
        }
    }

    async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Option<Message>> {
        let Some(current) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let is_read = update.is_read.unwrap_or(current.is_read);
        let is_archived = update.is_archived.unwrap_or(current.is_archived);

        let sql = "UPDATE messages SET is_read = ?, is_archived = ? WHERE id = ?";
        match self.pool.backend() {
            Backend::Sqlite(pool) => {
                sqlx::query(sql)
                    .bind(is_read)
                    .bind(is_archived)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update message")?;
            }
            Backend::Mysql(pool) => {
                sqlx::query(sql)
                    .bind(is_read)
                    .bind(is_archived)
                    .bind(id)
                    .execute(pool)
                    .await
                    .context("Failed to update message")?;
            }
        }

        Ok(Some(Message {
            is_read,
            is_archived,
            ..current
        }))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let sql = "DELETE FROM messages WHERE id = ?";
        let affected = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete message")?
                .rows_affected(),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to delete message")?
                .rows_affected(),
        };
        Ok(affected > 0)
    }

    async fn count_unread(&self) -> Result<i64> {
        let sql = "SELECT COUNT(*) AS total FROM messages WHERE is_read = ? AND is_archived = ?";
        let total: i64 = match self.pool.backend() {
            Backend::Sqlite(pool) => sqlx::query(sql)
                .bind(false)
                .bind(false)
                .fetch_one(pool)
                .await
                .context("Failed to count unread messages")?
                .get("total"),
            Backend::Mysql(pool) => sqlx::query(sql)
                .bind(false)
                .bind(false)
                .fetch_one(pool)
                .await
                .context("Failed to count unread messages")?
                .get("total"),
        };
        Ok(total)
    }
}
