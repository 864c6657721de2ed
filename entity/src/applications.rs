use sea_orm::entity::prelude::*;

/// Raw credit-application submission, stored as the applicant typed it.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub business_name: String,
    pub dba: Option<String>,
    pub business_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    #[sea_orm(indexed)]
    pub email: String,
    pub federal_tax_id: Option<String>,
    pub years_in_business: Option<String>,
    pub entity_type: Option<String>,
    pub owner_name: Option<String>,
    pub owner_title: Option<String>,
    pub owner_ssn: Option<String>,
    pub owner_dob: Option<String>,
    pub owner_address: Option<String>,
    pub owner_phone: Option<String>,
    pub owner_email: Option<String>,
    pub ownership_pct: Option<String>,
    pub equipment_description: Option<String>,
    pub equipment_cost: Option<String>,
    pub vendor_name: Option<String>,
    pub amount_requested: Option<String>,
    pub term_requested: Option<String>,
    pub additional_info: Option<String>,
    pub status: super::deals::Stage,
    pub deal_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
