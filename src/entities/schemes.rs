use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "schemes")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub category: String,
    pub eligibility: String,
    /// JSON array of document type labels
    pub required_documents: Json,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Text")]
    pub benefits: String,
    pub application_link: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_documents::Entity")]
    UserDocuments,
}

impl Related<super::user_documents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserDocuments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
