use async_trait::async_trait;
use mongodb::{
    bson::{doc, oid::ObjectId},
    Collection,
};

use crate::{errors::AppError, models::account::Account};

/// Document-store collaborator for accounts. Email uniqueness is enforced
/// here (unique index in the MongoDB implementation).
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError>;

    /// Unknown and unparsable ids both resolve to `None`.
    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError>;

    async fn insert(&self, account: &Account) -> Result<(), AppError>;

    async fn save(&self, account: &Account) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct MongoAccountStore {
    accounts: Collection<Account>,
}

impl MongoAccountStore {
    pub fn new(accounts: Collection<Account>) -> Self {
        Self { accounts }
    }
}

#[async_trait]
impl AccountStore for MongoAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AppError> {
        Ok(self.accounts.find_one(doc! { "email": email }).await?)
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Account>, AppError> {
        let Ok(oid) = ObjectId::parse_str(id) else {
            return Ok(None);
        };
        Ok(self.accounts.find_one(doc! { "_id": oid }).await?)
    }

    async fn insert(&self, account: &Account) -> Result<(), AppError> {
        self.accounts.insert_one(account).await?;
        Ok(())
    }

    async fn save(&self, account: &Account) -> Result<(), AppError> {
        self.accounts
            .replace_one(doc! { "_id": account.id }, account)
            .await?;
        Ok(())
    }
}
