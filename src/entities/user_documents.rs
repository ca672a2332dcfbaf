use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user_documents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub scheme_id: i32,
    pub document_type: String,
    pub file_name: String,
    pub storage_key: String,
    pub file_url: String,
    pub file_size: i64,
    pub mime_type: String,
    pub checksum: String,
    pub verification_status: String, // pending | verified | failed
    pub verification_result: Option<Json>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::schemes::Entity",
        from = "Column::SchemeId",
        to = "super::schemes::Column::Id",
        on_delete = "Cascade"
    )]
    Schemes,
}

impl Related<super::schemes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Schemes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
