use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "lenders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(indexed)]
    pub name: String,
    pub code: Option<String>,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub tax_rule: Option<String>,
    pub lienholder: Option<String>,
    pub ins_list_ymm: bool,
    pub ins_list_vin: bool,
    pub ins_property_cov: Option<String>,
    pub ins_max_deductible: Option<f64>,
    pub ins_comp_collision: bool,
    pub ins_acv: bool,
    pub ins_addl_notes: Option<String>,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
