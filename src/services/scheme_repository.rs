use crate::entities::{prelude::*, schemes};
use anyhow::Result;
use async_trait::async_trait;
use sea_orm::{DatabaseConnection, EntityTrait, QueryOrder};

#[async_trait]
pub trait SchemeRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<schemes::Model>>;
    async fn find_by_id(&self, id: i32) -> Result<Option<schemes::Model>>;
}

pub struct SeaOrmSchemeRepository {
    db: DatabaseConnection,
}

impl SeaOrmSchemeRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SchemeRepository for SeaOrmSchemeRepository {
    async fn list(&self) -> Result<Vec<schemes::Model>> {
        Ok(Schemes::find()
            .order_by_asc(schemes::Column::Id)
            .all(&self.db)
            .await?)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<schemes::Model>> {
        Ok(Schemes::find_by_id(id).one(&self.db).await?)
    }
}
