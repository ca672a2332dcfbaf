use crate::entities::{prelude::*, user_documents};
use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    QueryFilter, QueryOrder,
};

/// Persistence for uploaded documents
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<user_documents::Model>>;

    async fn find_for_user(
        &self,
        user_id: &str,
        scheme_id: Option<i32>,
    ) -> Result<Vec<user_documents::Model>>;

    /// The record occupying a (user, scheme, document type) slot, if any
    async fn find_slot(
        &self,
        user_id: &str,
        scheme_id: i32,
        document_type: &str,
    ) -> Result<Option<user_documents::Model>>;

    async fn insert(&self, model: user_documents::Model) -> Result<user_documents::Model>;

    /// Overwrites every column of an existing record
    async fn replace(&self, model: user_documents::Model) -> Result<user_documents::Model>;

    /// Records an outcome only while the record still points at
    /// `expected_storage_key`. Returns None when nothing matched.
    async fn set_verification(
        &self,
        id: &str,
        expected_storage_key: &str,
        status: &str,
        result: serde_json::Value,
    ) -> Result<Option<user_documents::Model>>;

    /// Returns false when no record had this id
    async fn delete(&self, id: &str) -> Result<bool>;
}

pub struct SeaOrmDocumentRepository {
    db: DatabaseConnection,
}

impl SeaOrmDocumentRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DocumentRepository for SeaOrmDocumentRepository {
    async fn find_by_id(&self, id: &str) -> Result<Option<user_documents::Model>> {
        Ok(UserDocuments::find_by_id(id.to_string()).one(&self.db).await?)
    }

    async fn find_for_user(
        &self,
        user_id: &str,
        scheme_id: Option<i32>,
    ) -> Result<Vec<user_documents::Model>> {
        let mut query =
            UserDocuments::find().filter(user_documents::Column::UserId.eq(user_id));

        if let Some(scheme_id) = scheme_id {
            query = query.filter(user_documents::Column::SchemeId.eq(scheme_id));
        }

        Ok(query
            .order_by_asc(user_documents::Column::CreatedAt)
            .all(&self.db)
            .await?)
    }

    async fn find_slot(
        &self,
        user_id: &str,
        scheme_id: i32,
        document_type: &str,
    ) -> Result<Option<user_documents::Model>> {
        Ok(UserDocuments::find()
            .filter(user_documents::Column::UserId.eq(user_id))
            .filter(user_documents::Column::SchemeId.eq(scheme_id))
            .filter(user_documents::Column::DocumentType.eq(document_type))
            .one(&self.db)
            .await?)
    }

    async fn insert(&self, model: user_documents::Model) -> Result<user_documents::Model> {
        let active: user_documents::ActiveModel = model.into();
        Ok(active.insert(&self.db).await?)
    }

    async fn replace(&self, model: user_documents::Model) -> Result<user_documents::Model> {
        let active = model.into_active_model().reset_all();
        Ok(active.update(&self.db).await?)
    }

    async fn set_verification(
        &self,
        id: &str,
        expected_storage_key: &str,
        status: &str,
        result: serde_json::Value,
    ) -> Result<Option<user_documents::Model>> {
        let res = UserDocuments::update_many()
            .col_expr(user_documents::Column::VerificationStatus, Expr::value(status))
            .col_expr(user_documents::Column::VerificationResult, Expr::value(result))
            .col_expr(user_documents::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user_documents::Column::Id.eq(id))
            .filter(user_documents::Column::StorageKey.eq(expected_storage_key))
            .exec(&self.db)
            .await?;

        if res.rows_affected == 0 {
            return Ok(None);
        }
        self.find_by_id(id).await
    }

    async fn delete(&self, id: &str) -> Result<bool> {
        let res = UserDocuments::delete_by_id(id.to_string())
            .exec(&self.db)
            .await?;
        Ok(res.rows_affected > 0)
    }
}
