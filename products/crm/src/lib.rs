//! Deal lifecycle and checklist engine.
//!
//! Every component takes the shared connection pool at construction; nothing holds
//! in-process mutable state. [`Crm`] bundles them for callers that want the whole engine.

use std::sync::Arc;

use sea_orm::DatabaseConnection;

#[macro_use]
mod mapping;

pub mod access;
pub mod admin;
pub mod checklist;
pub mod credentials;
pub mod dealer_notes;
pub mod dealers;
pub mod error;
pub mod history;
pub mod intake;
pub mod loader;
pub mod model;
pub mod portal;
pub mod reminders;
pub mod repository;
pub mod satellites;

pub use error::{CrmError, CrmResult};

#[derive(Clone)]
pub struct Crm {
    pub repo: repository::Repository,
    pub loader: loader::Loader,
    pub history: history::StageRecorder,
    pub checklists: checklist::Checklists,
    pub inbox: dealer_notes::DealerInbox,
    pub reminders: reminders::Reminders,
    pub intake: intake::Intake,
    pub satellites: satellites::Satellites,
    pub dealers: dealers::DealerDirectory,
    pub credentials: credentials::Credentials,
    pub portals: portal::Portals,
}

impl Crm {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            repo: repository::Repository::new(db.clone()),
            loader: loader::Loader::new(db.clone()),
            history: history::StageRecorder::new(db.clone()),
            checklists: checklist::Checklists::new(db.clone()),
            inbox: dealer_notes::DealerInbox::new(db.clone()),
            reminders: reminders::Reminders::new(db.clone()),
            intake: intake::Intake::new(db.clone()),
            satellites: satellites::Satellites::new(db.clone()),
            dealers: dealers::DealerDirectory::new(db.clone()),
            credentials: credentials::Credentials::new(db.clone()),
            portals: portal::Portals::new(db),
        }
    }
}
