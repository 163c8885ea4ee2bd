//! Contact form submissions and the admin inbox

use crate::db::repositories::MessageRepository;
use crate::models::{
    ContactInput, ListParams, Message, MessageFilter, MessageUpdate, PagedResult, RateLimitDecision,
};
use crate::services::rate_limiter::{RateLimiter, CONTACT_ACTION};
use anyhow::Context;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum MessageServiceError {
    #[error("Message not found")]
    NotFound,

    #[error("Too many requests")]
    RateLimited { retry_after_minutes: i64 },

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub struct MessageService {
    repo: Arc<dyn MessageRepository>,
    rate_limiter: Arc<RateLimiter>,
    contact_max: i64,
}

impl MessageService {
    pub fn new(repo: Arc<dyn MessageRepository>, rate_limiter: Arc<RateLimiter>, contact_max: i64) -> Self {
        Self {
            repo,
            rate_limiter,
            contact_max,
        }
    }

    /// Store a contact form submission from `ip`.
    ///
    /// The IP's counter only moves once the message is stored, so a failed
    /// insert does not use up the allowance.
    pub async fn submit(&self, ip: &str, input: ContactInput) -> Result<Message, MessageServiceError> {
        if let RateLimitDecision::Limited { retry_after_minutes } =
            self.rate_limiter.check(ip, CONTACT_ACTION, self.contact_max).await?
        {
            tracing::warn!(ip, retry_after_minutes, "Contact form rate limit hit");
            return Err(MessageServiceError::RateLimited { retry_after_minutes });
        }

        let message = self
            .repo
            .create(&input)
            .await
            .context("Failed to store contact message")?;
        self.rate_limiter.increment(ip, CONTACT_ACTION).await?;

        tracing::info!(message_id = message.id, "Contact message received");
        Ok(message)
    }

    pub async fn list(
        &self,
        filter: MessageFilter,
        params: &ListParams,
    ) -> Result<PagedResult<Message>, MessageServiceError> {
        let (items, total) = self
            .repo
            .list(filter, params)
            .await
            .context("Failed to list messages")?;
        Ok(PagedResult::new(items, total, params))
    }

    pub async fn unread_count(&self) -> Result<i64, MessageServiceError> {
        Ok(self.repo.count_unread().await.context("Failed to count messages")?)
    }

    pub async fn update(&self, id: i64, update: &MessageUpdate) -> Result<Message, MessageServiceError> {
        self.repo
            .update(id, update)
            .await
            .context("Failed to update message")?
            .ok_or(MessageServiceError::NotFound)
    }

    pub async fn delete(&self, id: i64) -> Result<(), MessageServiceError> {
        let deleted = self
            .repo
            .delete(id)
            .await
            .context("Failed to delete message")?;
        if !deleted {
            return Err(MessageServiceError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxMessageRepository, SqlxRateLimitRepository};
    use crate::db::{create_test_pool, migrations};
    use chrono::Duration;

    async fn setup_service() -> MessageService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let limiter = RateLimiter::new(SqlxRateLimitRepository::boxed(pool.clone()), Duration::minutes(15));
        MessageService::new(SqlxMessageRepository::boxed(pool), Arc::new(limiter), 5)
    }

    fn contact() -> ContactInput {
        serde_json::from_value(serde_json::json!({
            "name": "  Ada Lovelace ",
            "email": "ada@example.com",
            "phone": "   ",
            "company": " Analytical Engines ",
            "message": "Could you send me a quote?"
        }))
        .expect("valid contact payload")
    }

    #[tokio::test]
    async fn test_submit_stores_trimmed_fields() {
        let service = setup_service().await;
        let message = service.submit("10.0.0.1", contact()).await.unwrap();
        assert_eq!(message.name, "Ada Lovelace");
        assert!(message.phone.is_none());
        assert_eq!(message.company.as_deref(), Some("Analytical Engines"));
    }

    #[tokio::test]
    async fn test_sixth_submission_is_rate_limited() {
        let service = setup_service().await;
        for _ in 0..5 {
            service.submit("10.0.0.1", contact()).await.unwrap();
        }

        match service.submit("10.0.0.1", contact()).await {
            Err(MessageServiceError::RateLimited { retry_after_minutes }) => {
                assert!((1..=15).contains(&retry_after_minutes));
            }
            other => panic!("expected rate limit, got {:?}", other.map(|m| m.id)),
        }

        let inbox = service.list(MessageFilter::default(), &ListParams::default()).await.unwrap();
        assert_eq!(inbox.total, 5);
        assert!(service.submit("10.0.0.2", contact()).await.is_ok());
    }

    #[tokio::test]
    async fn test_inbox_update_and_delete() {
        let service = setup_service().await;
        let message = service.submit("10.0.0.1", contact()).await.unwrap();
        assert_eq!(service.unread_count().await.unwrap(), 1);

        let read = service
            .update(message.id, &MessageUpdate { is_read: Some(true), is_archived: None })
            .await
            .unwrap();
        assert!(read.is_read);
        assert_eq!(service.unread_count().await.unwrap(), 0);

        service.delete(message.id).await.unwrap();
        assert!(matches!(service.delete(message.id).await, Err(MessageServiceError::NotFound)));
        assert!(matches!(
            service.update(message.id, &MessageUpdate::default()).await,
            Err(MessageServiceError::NotFound)
        ));
    }
}
