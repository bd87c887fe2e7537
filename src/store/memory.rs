//! In-memory store fakes for tests.

use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use crate::{
    auth::jwt::Identity,
    errors::AppError,
    models::account::Account,
    store::{
        account::AccountStore,
        refresh::{refresh_token_key, RefreshTokenStore},
        reset::ResetTokenStore,
    },
};

#[derive(Default)]
pub struct MemoryRefreshTokenStore {
    records: Mutex<HashMap<String, (String, Instant)>>,
    pub fail_saves: Mutex<bool>,
}

#[async_trait]
impl RefreshTokenStore for MemoryRefreshTokenStore {
    async fn save(
        &self,
        identity: &Identity,
        fingerprint: &str,
        ttl_seconds: u64,
    ) -> Result<(), AppError> {
        if *self.fail_saves.lock().unwrap() {
            return Err(AppError::Store("save failed".into()));
        }
        let expires = Instant::now() + Duration::from_secs(ttl_seconds);
        self.records
            .lock()
            .unwrap()
            .insert(refresh_token_key(identity), (fingerprint.to_string(), expires));
        Ok(())
    }

    async fn get(&self, identity: &Identity) -> Result<Option<String>, AppError> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(&refresh_token_key(identity))
            .filter(|(_, expires)| *expires > Instant::now())
            .map(|(fingerprint, _)| fingerprint.clone()))
    }

    async fn delete(&self, identity: &Identity) -> Result<(), AppError> {
        self.records
            .lock()
            .unwrap()
            .remove(&refresh_token_key(identity));
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: Mutex<Vec<Account>>,
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id.to_hex() == id)
            .cloned())
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.iter().any(|a| a.email == account.email) {
            return Err(AppError::AccountAlreadyExists);
        }
        accounts.push(account.clone());
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        match accounts.iter_mut().find(|a| a.id == account.id) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryResetTokenStore {
    records: Mutex<HashMap<String, String>>,
}

#[async_trait]
impl ResetTokenStore for MemoryResetTokenStore {
    async fn save(
        &self,
        token: &str,
        account_id: &str,
        _ttl_seconds: u64,
    ) -> Result<(), AppError> {
        self.records
            .lock()
            .unwrap()
            .insert(token.to_string(), account_id.to_string());
        Ok(())
    }

    async fn get(&self, token: &str) -> Result<Option<String>, AppError> {
        Ok(self.records.lock().unwrap().get(token).cloned())
    }

    async fn delete(&self, token: &str) -> Result<(), AppError> {
        self.records.lock().unwrap().remove(token);
        Ok(())
    }
}
