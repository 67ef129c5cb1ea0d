//! In-memory refresh token repository implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::DomainError;
use crate::domain::token::{RefreshToken, RefreshTokenRepository};
use crate::domain::user::UserId;

type Slot = (UserId, String);

#[derive(Debug, Default)]
struct Tables {
    /// Rows keyed by device slot, which enforces one row per slot
    rows: HashMap<Slot, RefreshToken>,
    /// Token value -> slot lookup
    token_index: HashMap<String, Slot>,
}

impl Tables {
    fn remove_slot(&mut self, slot: &Slot) -> Option<RefreshToken> {
        let row = self.rows.remove(slot)?;
        self.token_index.remove(row.token());
        Some(row)
    }
}

fn slot_of(token: &RefreshToken) -> Slot {
    (*token.user_id(), token.user_agent().to_string())
}

/// In-memory implementation of RefreshTokenRepository
#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenRepository {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn find_by_device(
        &self,
        user_id: &UserId,
        user_agent: &str,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables.rows.get(&(*user_id, user_agent.to_string())).cloned())
    }

    async fn create(&self, token: &RefreshToken) -> Result<RefreshToken, DomainError> {
        let mut tables = self.tables.write().await;
        let slot = slot_of(token);

        tables.remove_slot(&slot);
        tables
            .token_index
            .insert(token.token().to_string(), slot.clone());
        tables.rows.insert(slot, token.clone());

        Ok(token.clone())
    }

    async fn rotate(
        &self,
        current: &str,
        next: &str,
        exp: DateTime<Utc>,
    ) -> Result<Option<RefreshToken>, DomainError> {
        let mut tables = self.tables.write().await;

        let Some(slot) = tables.token_index.remove(current) else {
            return Ok(None);
        };

        let Some(row) = tables.rows.get_mut(&slot) else {
            return Ok(None);
        };

        row.rotate(next, exp);
        let rotated = row.clone();
        tables.token_index.insert(next.to_string(), slot);

        Ok(Some(rotated))
    }

    async fn delete_by_token(&self, token: &str) -> Result<Option<RefreshToken>, DomainError> {
        let mut tables = self.tables.write().await;

        let Some(slot) = tables.token_index.get(token).cloned() else {
            return Ok(None);
        };

        Ok(tables.remove_slot(&slot))
    }

    async fn delete_by_user(&self, user_id: &UserId) -> Result<u64, DomainError> {
        let mut tables = self.tables.write().await;

        let slots: Vec<Slot> = tables
            .rows
            .keys()
            .filter(|(owner, _)| owner == user_id)
            .cloned()
            .collect();

        for slot in &slots {
            tables.remove_slot(slot);
        }

        Ok(slots.len() as u64)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, DomainError> {
        let mut tables = self.tables.write().await;

        let slots: Vec<Slot> = tables
            .rows
            .iter()
            .filter(|(_, row)| row.is_expired_at(now))
            .map(|(slot, _)| slot.clone())
            .collect();

        for slot in &slots {
            tables.remove_slot(slot);
        }

        Ok(slots.len() as u64)
    }
}
