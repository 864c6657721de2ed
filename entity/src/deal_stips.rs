use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "deal_stips")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub deal_id: Uuid,
    pub text: String,
    pub done: bool,
    pub resolved_by: Option<String>,
    pub file_url: Option<String>,
    pub visibility: Visibility,
    pub category: Option<Category>,
    pub auto: bool,
    pub added_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::deals::Entity",
        from = "Column::DealId",
        to = "super::deals::Column::Id"
    )]
    Deal,
}

impl Related<super::deals::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deal.def()
    }
}

/// Which portal audience may see a stipulation. Stored only; readers enforce it.
#[derive(
    Copy, Clone, Debug, Default, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    #[sea_orm(string_value = "all")]
    All,
    #[sea_orm(string_value = "dealer")]
    Dealer,
    #[sea_orm(string_value = "internal")]
    Internal,
}

/// Shared by stipulations and funding items.
#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[sea_orm(string_value = "credit")]
    Credit,
    #[sea_orm(string_value = "identity")]
    Identity,
    #[sea_orm(string_value = "financials")]
    Financials,
    #[sea_orm(string_value = "equipment")]
    Equipment,
    #[sea_orm(string_value = "insurance")]
    Insurance,
    #[sea_orm(string_value = "title")]
    Title,
    #[sea_orm(string_value = "documents")]
    Documents,
    #[sea_orm(string_value = "other")]
    Other,
}

impl ActiveModelBehavior for ActiveModel {}
