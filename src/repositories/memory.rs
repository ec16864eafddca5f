//! Process-local stores, used by tests and the `memory` storage backend.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    models::{
        loan::{Loan, LoanRecord},
        session::Session,
        user::User,
    },
    repositories::{loan::LoanStore, session::SessionStore, user::UserStore},
};

/// In-memory `LoanStore`. Loans are kept in insertion order.
#[derive(Default, Clone)]
pub struct InMemoryLoanStore {
    loans: Arc<RwLock<Vec<Loan>>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of loans across all owners.
    pub async fn len(&self) -> usize {
        self.loans.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.loans.read().await.is_empty()
    }
}

#[async_trait]
impl LoanStore for InMemoryLoanStore {
    async fn insert(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Loan> {
        let mut loans = self.loans.write().await;
        if loans.iter().any(|loan| loan.id == id) {
            return Err(AppError::Internal(format!("Duplicate loan id {}", id)));
        }
        let loan = Loan::from_record(id, user_id, record.clone(), Utc::now());
        loans.push(loan.clone());
        Ok(loan)
    }

    async fn find(&self, id: Uuid, user_id: Uuid) -> Result<Option<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans
            .iter()
            .find(|loan| loan.id == id && loan.user_id == user_id)
            .cloned())
    }

    async fn list(&self, user_id: Uuid) -> Result<Vec<Loan>> {
        let loans = self.loans.read().await;
        Ok(loans
            .iter()
            .rev()
            .filter(|loan| loan.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn update(&self, id: Uuid, user_id: Uuid, record: &LoanRecord) -> Result<Option<Loan>> {
        let mut loans = self.loans.write().await;
        match loans
            .iter_mut()
            .find(|loan| loan.id == id && loan.user_id == user_id)
        {
            Some(loan) => {
                loan.apply(record.clone(), Utc::now());
                Ok(Some(loan.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<bool> {
        let mut loans = self.loans.write().await;
        let before = loans.len();
        loans.retain(|loan| !(loan.id == id && loan.user_id == user_id));
        Ok(loans.len() < before)
    }
}

/// In-memory `UserStore`, keyed by email.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn create(&self, name: &str, email: &str, password_hash: &str) -> Result<User> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(AppError::Conflict("Email already in use".to_string()));
        }
        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<User>> {
        Ok(self
            .users
            .read()
            .await
            .values()
            .find(|user| user.id == user_id)
            .cloned())
    }
}

/// In-memory `SessionStore` with TTLs checked on read.
#[derive(Default, Clone)]
pub struct InMemorySessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, (Session, Instant)>>>,
    csrf_tokens: Arc<RwLock<HashMap<String, Instant>>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn deadline(ttl_secs: u64) -> Instant {
    Instant::now() + Duration::from_secs(ttl_secs)
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save(&self, token: Uuid, session: &Session, ttl_secs: u64) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(token, (session.clone(), deadline(ttl_secs)));
        Ok(())
    }

    async fn load(&self, token: Uuid) -> Result<Option<Session>> {
        let mut sessions = self.sessions.write().await;
        match sessions.get(&token) {
            Some((_, expires)) if *expires <= Instant::now() => {
                sessions.remove(&token);
                Ok(None)
            }
            Some((session, _)) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: Uuid) -> Result<()> {
        self.sessions.write().await.remove(&token);
        Ok(())
    }

    async fn save_csrf(&self, token: &str, ttl_secs: u64) -> Result<()> {
        self.csrf_tokens
            .write()
            .await
            .insert(token.to_string(), deadline(ttl_secs));
        Ok(())
    }

    async fn csrf_is_live(&self, token: &str) -> Result<bool> {
        let mut tokens = self.csrf_tokens.write().await;
        match tokens.get(token) {
            Some(expires) if *expires <= Instant::now() => {
                tokens.remove(token);
                Ok(false)
            }
            Some(_) => Ok(true),
            None => Ok(false),
        }
    }

    async fn revoke_csrf(&self, token: &str) -> Result<()> {
        self.csrf_tokens.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::loan::LoanStatus;

    fn record(amount: f64) -> LoanRecord {
        LoanRecord {
            amount,
            interest_rate: 5.0,
            term_months: 12,
            purpose: None,
            status: LoanStatus::Pending,
            monthly_payment: None,
            total_interest: None,
            total_amount: None,
            start_date: None,
            end_date: None,
        }
    }

    #[tokio::test]
    async fn loans_are_scoped_to_their_owner() {
        let store = InMemoryLoanStore::new();
        let owner = Uuid::new_v4();
        let stranger = Uuid::new_v4();
        let id = Uuid::new_v4();
        store.insert(id, owner, &record(100.0)).await.unwrap();

        assert!(store.find(id, owner).await.unwrap().is_some());
        assert!(store.find(id, stranger).await.unwrap().is_none());
        assert!(store.update(id, stranger, &record(5.0)).await.unwrap().is_none());
        assert!(!store.delete(id, stranger).await.unwrap());
        assert_eq!(store.find(id, owner).await.unwrap().unwrap().amount, 100.0);
    }

    #[tokio::test]
    async fn list_returns_newest_first() {
        let store = InMemoryLoanStore::new();
        let owner = Uuid::new_v4();
        for amount in [1.0, 2.0, 3.0] {
            store.insert(Uuid::new_v4(), owner, &record(amount)).await.unwrap();
        }
        store.insert(Uuid::new_v4(), Uuid::new_v4(), &record(9.0)).await.unwrap();

        let amounts: Vec<f64> = store
            .list(owner)
            .await
            .unwrap()
            .iter()
            .map(|loan| loan.amount)
            .collect();
        assert_eq!(amounts, vec![3.0, 2.0, 1.0]);
        assert_eq!(store.len().await, 4);
    }

    #[tokio::test]
    async fn duplicate_emails_conflict() {
        let store = InMemoryUserStore::new();
        store.create("Ada Lovelace", "ada@example.com", "hash").await.unwrap();
        let err = store
            .create("Ada Again", "ada@example.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn zero_ttl_sessions_expire_immediately() {
        let store = InMemorySessionStore::new();
        let token = Uuid::new_v4();
        let session = Session::start(Uuid::new_v4(), 1);

        store.save(token, &session, 0).await.unwrap();
        assert!(store.load(token).await.unwrap().is_none());

        store.save(token, &session, 60).await.unwrap();
        assert_eq!(store.load(token).await.unwrap(), Some(session));

        store.save_csrf("abc", 60).await.unwrap();
        assert!(store.csrf_is_live("abc").await.unwrap());
        store.revoke_csrf("abc").await.unwrap();
        assert!(!store.csrf_is_live("abc").await.unwrap());
    }
}
