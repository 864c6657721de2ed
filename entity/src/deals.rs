use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "deals")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub account_id: Option<Uuid>,
    pub code: Option<String>,
    pub biz: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cust_password_hash: Option<String>,
    pub eq_type: Option<String>,
    pub eq_detail: Option<String>,
    pub eq_year: Option<i32>,
    pub eq_make: Option<String>,
    pub eq_model: Option<String>,
    pub eq_vin: Option<String>,
    pub eq_mileage: Option<i32>,
    pub eq_new_used: Option<EquipmentCondition>,
    pub eq_serial: Option<String>,
    pub amount: Option<f64>,
    #[sea_orm(indexed)]
    pub dealer_id: Option<Uuid>,
    pub dealer_name: Option<String>,
    #[sea_orm(indexed)]
    pub lender_id: Option<Uuid>,
    pub stage: Stage,
    pub source: Option<String>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub disposition: Option<String>,
    pub accepted: Option<bool>,
    pub tax_choice: Option<String>,
    pub show_tax_choice: bool,
    pub approval_letter: Option<String>,
    pub email_conf_sent: Option<DateTimeWithTimeZone>,
    pub email_code_sent: Option<DateTimeWithTimeZone>,
    pub credit_app: Option<String>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::deal_history::Entity")]
    History,
    #[sea_orm(has_many = "super::deal_stips::Entity")]
    Stips,
    #[sea_orm(has_many = "super::deal_funding_items::Entity")]
    FundingItems,
}

impl Related<super::deal_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::History.def()
    }
}

impl Related<super::deal_stips::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Stips.def()
    }
}

impl Related<super::deal_funding_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FundingItems.def()
    }
}

/// Position of a deal in the approval/funding pipeline.
#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Hash, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "approved")]
    Approved,
    #[sea_orm(string_value = "funded")]
    Funded,
    #[sea_orm(string_value = "declined")]
    Declined,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Pending => "pending",
            Stage::Approved => "approved",
            Stage::Funded => "funded",
            Stage::Declined => "declined",
        }
    }
}

#[derive(
    Copy, Clone, Debug, EnumIter, DeriveActiveEnum, Eq, PartialEq, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(8))")]
#[serde(rename_all = "lowercase")]
pub enum EquipmentCondition {
    #[sea_orm(string_value = "new")]
    New,
    #[sea_orm(string_value = "used")]
    Used,
}

impl ActiveModelBehavior for ActiveModel {}
