//! Domain records. Field names serialize as camelCase; the snake_case storage side is the
//! matching `entity` row, joined by one `wire_mapping!` per kind.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use entity::deal_stips::{Category, Visibility};
pub use entity::deals::{EquipmentCondition, Stage};
pub use entity::profiles::Role;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: Uuid,
    pub account_id: Option<Uuid>,
    pub code: Option<String>,
    pub biz: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing, default)]
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
    pub amount: f64,
    pub dealer_id: Option<Uuid>,
    pub dealer_name: Option<String>,
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
    pub email_conf_sent: Option<DateTime<Utc>>,
    pub email_code_sent: Option<DateTime<Utc>>,
    pub credit_app: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

wire_mapping!(entity::deals::Model => Deal {
    fields: [
        id, account_id, code, biz, contact, email, phone, cust_password_hash,
        eq_type, eq_detail, eq_year, eq_make, eq_model, eq_vin, eq_mileage, eq_new_used,
        eq_serial, dealer_id, dealer_name, lender_id, stage, source, notes, terms,
        disposition, accepted, tax_choice, show_tax_choice, approval_letter, credit_app,
        created_at, updated_at,
    ],
    optional: [email_conf_sent, email_code_sent],
    coerced: [amount],
});

impl Deal {
    /// A fresh `pending` deal with nothing attached.
    pub fn new(biz: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            account_id: None,
            code: None,
            biz: biz.into(),
            contact: None,
            email: None,
            phone: None,
            cust_password_hash: None,
            eq_type: None,
            eq_detail: None,
            eq_year: None,
            eq_make: None,
            eq_model: None,
            eq_vin: None,
            eq_mileage: None,
            eq_new_used: None,
            eq_serial: None,
            amount: 0.0,
            dealer_id: None,
            dealer_name: None,
            lender_id: None,
            stage: Stage::Pending,
            source: None,
            notes: None,
            terms: None,
            disposition: None,
            accepted: None,
            tax_choice: None,
            show_tax_choice: false,
            approval_letter: None,
            email_conf_sent: None,
            email_code_sent: None,
            credit_app: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealHistoryEntry {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub stage: Stage,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_history::Model => DealHistoryEntry {
    fields: [id, deal_id, stage, note, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealActivity {
    pub id: Uuid,
    pub deal_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_activities::Model => DealActivity {
    fields: [id, deal_id, kind, actor, detail, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountActivity {
    pub id: Uuid,
    pub account_id: Uuid,
    #[serde(rename = "type")]
    pub kind: String,
    pub actor: String,
    pub detail: String,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::account_activities::Model => AccountActivity {
    fields: [id, account_id, kind, actor, detail, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealDocument {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub doc_id: String,
    pub name: String,
    pub uploaded_by: Option<String>,
    pub file_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_documents::Model => DealDocument {
    fields: [id, deal_id, doc_id, name, uploaded_by, file_url, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stipulation {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub text: String,
    pub done: bool,
    pub resolved_by: Option<String>,
    pub file_url: Option<String>,
    pub visibility: Visibility,
    pub category: Option<Category>,
    pub auto: bool,
    pub added_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_stips::Model => Stipulation {
    fields: [
        id, deal_id, text, done, resolved_by, file_url, visibility, category, auto, added_at,
    ],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FundingItem {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub text: String,
    pub done: bool,
    pub file_url: Option<String>,
    pub category: Option<Category>,
    pub auto: bool,
    pub added_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_funding_items::Model => FundingItem {
    fields: [id, deal_id, text, done, file_url, category, auto, added_at],
});

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dealer {
    pub id: Uuid,
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    #[serde(skip_serializing, default)]
    pub password_hash: Option<String>,
    pub commission_rate: Option<f64>,
    pub notes: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::dealers::Model => Dealer {
    fields: [
        id, name, contact, email, phone, address, password_hash, commission_rate, notes,
        active, created_at,
    ],
});

impl Dealer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            contact: None,
            email: None,
            phone: None,
            address: None,
            password_hash: None,
            commission_rate: None,
            notes: None,
            active: true,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: Uuid,
    pub biz: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub industry: Option<String>,
    pub date_started: Option<NaiveDate>,
    pub notes: Option<String>,
    #[serde(skip_serializing, default)]
    pub cust_password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::accounts::Model => Account {
    fields: [
        id, biz, contact, email, phone, address, industry, date_started, notes,
        cust_password_hash, created_at,
    ],
});

impl Account {
    pub fn new(biz: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            biz: biz.into(),
            contact: None,
            email: None,
            phone: None,
            address: None,
            industry: None,
            date_started: None,
            notes: None,
            cust_password_hash: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lender {
    pub id: Uuid,
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

wire_mapping!(entity::lenders::Model => Lender {
    fields: [
        id, name, code, contact, email, phone, address, tax_rule, lienholder, ins_list_ymm,
        ins_list_vin, ins_property_cov, ins_max_deductible, ins_comp_collision, ins_acv,
        ins_addl_notes, active,
    ],
});

impl Lender {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            code: None,
            contact: None,
            email: None,
            phone: None,
            address: None,
            tax_rule: None,
            lienholder: None,
            ins_list_ymm: false,
            ins_list_vin: false,
            ins_property_cov: None,
            ins_max_deductible: None,
            ins_comp_collision: false,
            ins_acv: false,
            ins_addl_notes: None,
            active: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealNote {
    pub id: Uuid,
    pub deal_id: Uuid,
    pub text: String,
    pub author: String,
    pub pinned: bool,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::deal_notes::Model => DealNote {
    fields: [id, deal_id, text, author, pinned, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealerNote {
    pub id: Uuid,
    pub deal_id: Option<Uuid>,
    pub dealer_id: Uuid,
    pub dealer_name: String,
    pub text: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::dealer_notes::Model => DealerNote {
    fields: [id, deal_id, dealer_id, dealer_name, text, read, created_at],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub due_at: DateTime<Utc>,
    pub deal_id: Option<Uuid>,
    pub deal_biz: Option<String>,
    pub fired: bool,
    pub dismissed: bool,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::reminders::Model => Reminder {
    fields: [id, user_id, text, due_at, deal_id, deal_biz, fired, dismissed, created_at],
});

impl Reminder {
    /// Due once the wall clock reaches `due_at`. Flags do not affect due-ness.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now >= self.due_at
    }

    /// Due and neither fired nor dismissed yet.
    pub fn needs_attention(&self, now: DateTime<Utc>) -> bool {
        self.is_due(now) && !self.fired && !self.dismissed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: Uuid,
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
    #[serde(skip_serializing, default)]
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
    pub status: Stage,
    pub deal_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::applications::Model => Application {
    fields: [
        id, business_name, dba, business_address, city, state, zip, phone, email,
        federal_tax_id, years_in_business, entity_type, owner_name, owner_title, owner_ssn,
        owner_dob, owner_address, owner_phone, owner_email, ownership_pct,
        equipment_description, equipment_cost, vendor_name, amount_requested,
        term_requested, additional_info, status, deal_id, created_at,
    ],
});

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub role: Role,
    pub full_name: Option<String>,
    pub dealer_id: Option<Uuid>,
    pub account_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

wire_mapping!(entity::profiles::Model => Profile {
    fields: [id, email, role, full_name, dealer_id, account_id, created_at],
});

/// Stored amounts are nullable; the domain treats a missing or non-finite amount as zero.
pub fn coerce_amount(raw: Option<f64>) -> f64 {
    raw.filter(|v| v.is_finite()).unwrap_or(0.0)
}

/// Parses a free-text money amount such as `"$45,000.00"`. Unparseable input is zero.
pub fn parse_amount(raw: &str) -> f64 {
    let cleaned: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '-'))
        .collect();
    coerce_amount(cleaned.parse::<f64>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).single().unwrap()
    }

    fn round_trip<R, D>(value: D) -> D
    where
        R: From<D>,
        D: From<R>,
    {
        D::from(R::from(value))
    }

    #[test]
    fn amounts_coerce_to_zero() {
        assert_eq!(coerce_amount(None), 0.0);
        assert_eq!(coerce_amount(Some(f64::NAN)), 0.0);
        assert_eq!(coerce_amount(Some(12.5)), 12.5);
        assert_eq!(parse_amount("$45,000.50"), 45000.5);
        assert_eq!(parse_amount("about fifty grand"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn null_amount_reads_as_zero() {
        let mut row: entity::deals::Model = Deal::new("Acme Paving").into();
        row.amount = None;
        assert_eq!(Deal::from(row).amount, 0.0);
    }

    #[test]
    fn deal_round_trips_every_field() {
        let mut deal = Deal::new("Acme Paving");
        deal.account_id = Some(Uuid::new_v4());
        deal.code = Some("AP-1001".into());
        deal.cust_password_hash = Some("$argon2id$stub".into());
        deal.eq_year = Some(2021);
        deal.eq_mileage = Some(18_000);
        deal.eq_new_used = Some(EquipmentCondition::Used);
        deal.amount = 87_500.25;
        deal.stage = Stage::Approved;
        deal.accepted = Some(true);
        deal.show_tax_choice = true;
        deal.email_conf_sent = Some(at(60));
        deal.created_at = at(0);
        deal.updated_at = at(120);
        assert_eq!(round_trip::<entity::deals::Model, _>(deal.clone()), deal);
    }

    #[test]
    fn satellites_round_trip() {
        let deal_id = Uuid::new_v4();
        let stip = Stipulation {
            id: Uuid::new_v4(),
            deal_id,
            text: "Two months bank statements".into(),
            done: true,
            resolved_by: Some("jo".into()),
            file_url: Some("https://files.example.com/bs.pdf".into()),
            visibility: Visibility::Dealer,
            category: Some(Category::Financials),
            auto: false,
            added_at: at(5),
        };
        assert_eq!(round_trip::<entity::deal_stips::Model, _>(stip.clone()), stip);

        let item = FundingItem {
            id: Uuid::new_v4(),
            deal_id,
            text: "Vendor invoice".into(),
            done: false,
            file_url: None,
            category: Some(Category::Equipment),
            auto: true,
            added_at: at(6),
        };
        assert_eq!(round_trip::<entity::deal_funding_items::Model, _>(item.clone()), item);

        let activity = DealActivity {
            id: Uuid::new_v4(),
            deal_id,
            kind: "call".into(),
            actor: "sam".into(),
            detail: "left voicemail".into(),
            created_at: at(7),
        };
        assert_eq!(
            round_trip::<entity::deal_activities::Model, _>(activity.clone()),
            activity
        );
    }

    #[test]
    fn parties_round_trip() {
        let mut lender = Lender::new("First Equipment Bank");
        lender.lienholder = Some("First Equipment Bank ISAOA".into());
        lender.ins_list_vin = true;
        lender.ins_max_deductible = Some(2500.0);
        assert_eq!(round_trip::<entity::lenders::Model, _>(lender.clone()), lender);

        let mut dealer = Dealer::new("Big Iron Sales");
        dealer.commission_rate = Some(0.03);
        assert_eq!(round_trip::<entity::dealers::Model, _>(dealer.clone()), dealer);

        let mut account = Account::new("Acme Paving");
        account.date_started = NaiveDate::from_ymd_opt(2019, 4, 1);
        assert_eq!(round_trip::<entity::accounts::Model, _>(account.clone()), account);
    }

    #[test]
    fn audit_and_notes_round_trip() {
        let deal_id = Uuid::new_v4();
        let entry = DealHistoryEntry {
            id: Uuid::new_v4(),
            deal_id,
            stage: Stage::Declined,
            note: Some("credit too thin".into()),
            created_at: at(8),
        };
        assert_eq!(round_trip::<entity::deal_history::Model, _>(entry.clone()), entry);

        let document = DealDocument {
            id: Uuid::new_v4(),
            deal_id,
            doc_id: "invoice-1".into(),
            name: "Vendor invoice.pdf".into(),
            uploaded_by: Some("dealer".into()),
            file_url: None,
            created_at: at(9),
        };
        assert_eq!(
            round_trip::<entity::deal_documents::Model, _>(document.clone()),
            document
        );

        let note = DealNote {
            id: Uuid::new_v4(),
            deal_id,
            text: "Owner prefers email".into(),
            author: "admin".into(),
            pinned: true,
            created_at: at(10),
        };
        assert_eq!(round_trip::<entity::deal_notes::Model, _>(note.clone()), note);

        let dealer_note = DealerNote {
            id: Uuid::new_v4(),
            deal_id: None,
            dealer_id: Uuid::new_v4(),
            dealer_name: "Big Iron Sales".into(),
            text: "Rate sheet updated".into(),
            read: true,
            created_at: at(11),
        };
        assert_eq!(
            round_trip::<entity::dealer_notes::Model, _>(dealer_note.clone()),
            dealer_note
        );

        let activity = AccountActivity {
            id: Uuid::new_v4(),
            account_id: Uuid::new_v4(),
            kind: "meeting".into(),
            actor: "sam".into(),
            detail: "site visit".into(),
            created_at: at(12),
        };
        assert_eq!(
            round_trip::<entity::account_activities::Model, _>(activity.clone()),
            activity
        );
    }

    #[test]
    fn reminder_due_at_survives_offset_storage() {
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            text: "Chase insurance cert".into(),
            due_at: at(86_400) + Duration::milliseconds(250),
            deal_id: Some(Uuid::new_v4()),
            deal_biz: Some("Acme Paving".into()),
            fired: true,
            dismissed: false,
            created_at: at(13),
        };
        let row = entity::reminders::Model::from(reminder.clone());
        assert_eq!(row.due_at.offset().local_minus_utc(), 0);
        assert_eq!(Reminder::from(row), reminder);
    }

    #[test]
    fn intake_and_profiles_round_trip() {
        let application = Application {
            id: Uuid::new_v4(),
            business_name: "Acme Paving".into(),
            dba: Some("Acme".into()),
            business_address: Some("1 Main St".into()),
            city: Some("Springfield".into()),
            state: Some("IL".into()),
            zip: Some("62701".into()),
            phone: Some("555-0100".into()),
            email: "ops@acme.example".into(),
            federal_tax_id: Some("12-3456789".into()),
            years_in_business: Some("7".into()),
            entity_type: Some("LLC".into()),
            owner_name: Some("Pat Owner".into()),
            owner_title: Some("CEO".into()),
            owner_ssn: Some("000-00-0000".into()),
            owner_dob: Some("1980-01-01".into()),
            owner_address: None,
            owner_phone: None,
            owner_email: Some("pat@acme.example".into()),
            ownership_pct: Some("100".into()),
            equipment_description: Some("Asphalt paver".into()),
            equipment_cost: Some("$85,000".into()),
            vendor_name: Some("Big Iron Sales".into()),
            amount_requested: Some("$85,000".into()),
            term_requested: Some("60".into()),
            additional_info: None,
            status: Stage::Approved,
            deal_id: Some(Uuid::new_v4()),
            created_at: at(14),
        };
        assert_eq!(
            round_trip::<entity::applications::Model, _>(application.clone()),
            application
        );

        let profile = Profile {
            id: Uuid::new_v4(),
            email: Some("dee@example.com".into()),
            role: Role::Dealer,
            full_name: Some("Dee Dealer".into()),
            dealer_id: Some(Uuid::new_v4()),
            account_id: None,
            created_at: at(15),
        };
        assert_eq!(round_trip::<entity::profiles::Model, _>(profile.clone()), profile);
    }

    #[test]
    fn serializes_camel_case_and_hides_hashes() {
        let mut deal = Deal::new("Acme Paving");
        deal.cust_password_hash = Some("secret-hash".into());
        let json = serde_json::to_value(&deal).unwrap();
        assert!(json.get("eqNewUsed").is_some());
        assert!(json.get("showTaxChoice").is_some());
        assert!(json.get("custPasswordHash").is_none());

        let activity = DealActivity {
            id: Uuid::nil(),
            deal_id: Uuid::nil(),
            kind: "email".into(),
            actor: "ops".into(),
            detail: "sent docs".into(),
            created_at: at(0),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "email");
    }

    #[test]
    fn reminder_due_check_is_inclusive() {
        let due = at(0);
        let reminder = Reminder {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            text: "Call back".into(),
            due_at: due,
            deal_id: None,
            deal_biz: None,
            fired: false,
            dismissed: false,
            created_at: at(-3600),
        };
        assert!(!reminder.is_due(due - Duration::seconds(1)));
        assert!(reminder.is_due(due));
        assert!(reminder.is_due(due + Duration::seconds(1)));
        assert!(reminder.needs_attention(due + Duration::seconds(1)));

        let mut fired = reminder.clone();
        fired.fired = true;
        assert!(fired.is_due(due + Duration::seconds(1)));
        assert!(!fired.needs_attention(due + Duration::seconds(1)));
    }
}
