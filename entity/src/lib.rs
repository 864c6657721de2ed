//! sea-orm models for the deal desk tables. Column names are the storage (snake_case)
//! side of the wire mapping; the camelCase domain side lives in `products-crm`.

pub mod account_activities;
pub mod accounts;
pub mod applications;
pub mod deal_activities;
pub mod deal_documents;
pub mod deal_funding_items;
pub mod deal_history;
pub mod deal_notes;
pub mod deal_stips;
pub mod dealer_notes;
pub mod dealers;
pub mod deals;
pub mod lenders;
pub mod profiles;
pub mod reminders;
