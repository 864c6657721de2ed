//! Credit applications from the public form, and their promotion to deals.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, TransactionTrait};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{CrmError, CrmResult, require_text};
use crate::history::append_history;
use crate::model::{Application, Deal, DealActivity, Stage, parse_amount};
use crate::repository::{find_on, insert_on, list_on, upsert_on};

/// The apply form as submitted. Everything except the business name and email is optional
/// free text.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ApplicationForm {
    pub business_name: String,
    pub dba: Option<String>,
    pub business_address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
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
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct Intake {
    db: Arc<DatabaseConnection>,
}

impl Intake {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn submit(&self, form: ApplicationForm) -> CrmResult<Application> {
        require_text("businessName", &form.business_name)?;
        let email = normalize_email(&form.email);
        if !email.contains('@') {
            return Err(CrmError::invalid("email must be a valid address"));
        }
        let application = Application {
            id: Uuid::new_v4(),
            business_name: form.business_name.trim().to_string(),
            dba: form.dba,
            business_address: form.business_address,
            city: form.city,
            state: form.state,
            zip: form.zip,
            phone: form.phone,
            email,
            federal_tax_id: form.federal_tax_id,
            years_in_business: form.years_in_business,
            entity_type: form.entity_type,
            owner_name: form.owner_name,
            owner_title: form.owner_title,
            owner_ssn: form.owner_ssn,
            owner_dob: form.owner_dob,
            owner_address: form.owner_address,
            owner_phone: form.owner_phone,
            owner_email: form.owner_email,
            ownership_pct: form.ownership_pct,
            equipment_description: form.equipment_description,
            equipment_cost: form.equipment_cost,
            vendor_name: form.vendor_name,
            amount_requested: form.amount_requested,
            term_requested: form.term_requested,
            additional_info: form.additional_info,
            status: Stage::Pending,
            deal_id: None,
            created_at: Utc::now(),
        };
        insert_on(self.db.as_ref(), application.clone())
            .await
            .inspect_err(|err| tracing::error!(error = %err, "application insert failed"))?;
        tracing::info!(application_id = %application.id, "application submitted");
        Ok(application)
    }

    /// The customer portal view, newest first.
    pub async fn list_for_email(&self, email: &str) -> CrmResult<Vec<Application>> {
        list_on(
            self.db.as_ref(),
            Condition::all().add(entity::applications::Column::Email.eq(normalize_email(email))),
        )
        .await
    }

    pub async fn list(&self) -> CrmResult<Vec<Application>> {
        list_on(self.db.as_ref(), Condition::all()).await
    }

    /// Creates the `pending` deal for an application, with its first history entry, atomically.
    pub async fn open_deal(&self, application_id: Uuid, actor: &str) -> CrmResult<Deal> {
        let txn = self.db.begin().await?;
        let mut application: Application = find_on(&txn, application_id)
            .await?
            .ok_or_else(|| CrmError::not_found("application", application_id))?;
        if let Some(deal_id) = application.deal_id {
            return Err(CrmError::Conflict(format!(
                "application {application_id} already opened as deal {deal_id}"
            )));
        }

        let deal = deal_from_application(&application);
        insert_on(&txn, deal.clone()).await?;
        append_history(
            &txn,
            deal.id,
            Stage::Pending,
            Some("Application received".to_string()),
            deal.created_at,
        )
        .await?;
        insert_on(
            &txn,
            DealActivity {
                id: Uuid::new_v4(),
                deal_id: deal.id,
                kind: "created".to_string(),
                actor: actor.to_string(),
                detail: format!("Opened from application {application_id}"),
                created_at: deal.created_at,
            },
        )
        .await?;

        application.deal_id = Some(deal.id);
        upsert_on(&txn, application).await?;
        txn.commit()
            .await
            .inspect_err(|err| tracing::error!(%application_id, error = %err, "open deal commit failed"))?;
        tracing::info!(%application_id, deal_id = %deal.id, "application opened as deal");
        Ok(deal)
    }
}

fn deal_from_application(app: &Application) -> Deal {
    let mut deal = Deal::new(app.business_name.clone());
    deal.contact = app.owner_name.clone();
    deal.email = Some(app.email.clone());
    deal.phone = app.phone.clone().or_else(|| app.owner_phone.clone());
    deal.eq_detail = app.equipment_description.clone();
    deal.amount = app
        .amount_requested
        .as_deref()
        .or(app.equipment_cost.as_deref())
        .map(parse_amount)
        .unwrap_or(0.0);
    deal.source = Some("application".to_string());
    deal.terms = app.term_requested.clone();
    deal.credit_app = Some(app.id.to_string());
    deal
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn application_fields_carry_into_deal() {
        let app = Application {
            id: Uuid::new_v4(),
            business_name: "Ridge Excavating".into(),
            dba: None,
            business_address: None,
            city: None,
            state: None,
            zip: None,
            phone: None,
            email: "owner@ridge.example".into(),
            federal_tax_id: None,
            years_in_business: None,
            entity_type: None,
            owner_name: Some("Dana Ridge".into()),
            owner_title: None,
            owner_ssn: None,
            owner_dob: None,
            owner_address: None,
            owner_phone: Some("555-0100".into()),
            owner_email: None,
            ownership_pct: None,
            equipment_description: Some("2019 CAT 320".into()),
            equipment_cost: Some("$150,000".into()),
            vendor_name: None,
            amount_requested: Some("$120,000".into()),
            term_requested: Some("60 months".into()),
            additional_info: None,
            status: Stage::Pending,
            deal_id: None,
            created_at: Utc::now(),
        };
        let deal = deal_from_application(&app);
        assert_eq!(deal.amount, 120_000.0);
        assert_eq!(deal.stage, Stage::Pending);
        assert_eq!(deal.phone.as_deref(), Some("555-0100"));
        assert_eq!(deal.contact.as_deref(), Some("Dana Ridge"));
    }
}
