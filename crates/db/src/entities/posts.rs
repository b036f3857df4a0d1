//! `SeaORM` Entity for posts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub pdf_filename: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub pdf_attachment: Option<Json>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::pdf_contents::Entity")]
    PdfContents,
}

impl Related<super::pdf_contents::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PdfContents.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
