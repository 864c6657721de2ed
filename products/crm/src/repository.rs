//! Typed list/upsert/delete for every persisted kind.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait,
    DatabaseConnection, EntityTrait, FromQueryResult, IdenStatic, IntoActiveModel, Iterable, ModelTrait,
    PrimaryKeyToColumn, QueryFilter, QueryOrder, Select,
};
use uuid::Uuid;

use crate::error::{CrmError, CrmResult};
use crate::model::*;

/// A domain record backed by one table, keyed by a UUID primary key.
pub trait Record: Clone + Send + Sync + Sized + 'static {
    type Entity: EntityTrait<Model = Self::Row>;
    type Row: ModelTrait<Entity = Self::Entity>
        + FromQueryResult
        + From<Self>
        + Into<Self>
        + IntoActiveModel<Self::Active>
        + Send
        + Sync;
    type Active: ActiveModelTrait<Entity = Self::Entity>
        + ActiveModelBehavior
        + From<Self::Row>
        + Send;

    const KIND: &'static str;

    /// Columns an upsert never overwrites once the row exists, besides the key.
    const PRESERVED: &'static [&'static str] = &["created_at"];

    fn id(&self) -> Uuid;
    fn id_column() -> <Self::Entity as EntityTrait>::Column;
    fn ordered(select: Select<Self::Entity>) -> Select<Self::Entity>;
}

macro_rules! record {
    ($domain:ty, $module:ident, $kind:literal, $order:ident($col:ident) $(, preserve: [$($keep:literal),*])?) => {
        impl Record for $domain {
            type Entity = entity::$module::Entity;
            type Row = entity::$module::Model;
            type Active = entity::$module::ActiveModel;

            const KIND: &'static str = $kind;
            $(const PRESERVED: &'static [&'static str] = &[$($keep),*];)?

            fn id(&self) -> Uuid {
                self.id
            }

            fn id_column() -> entity::$module::Column {
                entity::$module::Column::Id
            }

            fn ordered(select: Select<Self::Entity>) -> Select<Self::Entity> {
                select.$order(entity::$module::Column::$col)
            }
        }
    };
}

record!(Deal, deals, "deal", order_by_desc(CreatedAt),
    preserve: ["created_at", "cust_password_hash"]);
record!(DealHistoryEntry, deal_history, "history entry", order_by_asc(CreatedAt));
record!(DealActivity, deal_activities, "activity", order_by_asc(CreatedAt));
record!(AccountActivity, account_activities, "account activity", order_by_asc(CreatedAt));
record!(DealDocument, deal_documents, "document", order_by_asc(CreatedAt));
record!(Stipulation, deal_stips, "stipulation", order_by_asc(AddedAt),
    preserve: ["added_at", "auto", "deal_id"]);
record!(FundingItem, deal_funding_items, "funding item", order_by_asc(AddedAt),
    preserve: ["added_at", "auto", "deal_id"]);
record!(Dealer, dealers, "dealer", order_by_asc(Name),
    preserve: ["created_at", "password_hash"]);
record!(Account, accounts, "account", order_by_desc(CreatedAt),
    preserve: ["created_at", "cust_password_hash"]);
record!(Lender, lenders, "lender", order_by_asc(Name), preserve: []);
record!(DealNote, deal_notes, "deal note", order_by_desc(CreatedAt));
record!(DealerNote, dealer_notes, "dealer note", order_by_desc(CreatedAt),
    preserve: ["created_at", "read"]);
record!(Reminder, reminders, "reminder", order_by_asc(DueAt));
record!(Application, applications, "application", order_by_desc(CreatedAt));
record!(Profile, profiles, "profile", order_by_desc(CreatedAt));

/// Insert-or-replace keyed on the primary key. Every column except the key and
/// `R::PRESERVED` is overwritten when the row already exists.
pub(crate) async fn upsert_on<R, C>(conn: &C, record: R) -> CrmResult<()>
where
    R: Record,
    C: ConnectionTrait,
{
    let keys: Vec<_> = <R::Entity as EntityTrait>::PrimaryKey::iter()
        .map(|key| key.into_column())
        .collect();
    let key_names: Vec<&str> = keys.iter().map(|col| col.as_str()).collect();
    let mutable: Vec<_> = <R::Entity as EntityTrait>::Column::iter()
        .filter(|col| !key_names.contains(&col.as_str()) && !R::PRESERVED.contains(&col.as_str()))
        .collect();

    let mut conflict = OnConflict::columns(keys);
    if mutable.is_empty() {
        conflict.do_nothing();
    } else {
        conflict.update_columns(mutable);
    }

    let row: R::Row = record.into();
    let active = mark_all_set(R::Active::from(row));
    <R::Entity as EntityTrait>::insert(active)
        .on_conflict(conflict)
        .exec_without_returning(conn)
        .await
        .map_err(|err| CrmError::on_write(err, R::KIND))?;
    Ok(())
}

/// Plain insert for append-only kinds; a colliding id or unique key is a `Conflict`, never an overwrite.
pub(crate) async fn insert_on<R, C>(conn: &C, record: R) -> CrmResult<()>
where
    R: Record,
    C: ConnectionTrait,
{
    let row: R::Row = record.into();
    <R::Entity as EntityTrait>::insert(mark_all_set(R::Active::from(row)))
        .exec_without_returning(conn)
        .await
        .map_err(|err| CrmError::on_write(err, R::KIND))?;
    Ok(())
}

/// A model converted into an active model carries `Unchanged` values; an insert must see them as set.
fn mark_all_set<A: ActiveModelTrait>(mut active: A) -> A {
    for col in <A::Entity as EntityTrait>::Column::iter() {
        if let Some(value) = active.get(col).into_value() {
            active.set(col, value);
        }
    }
    active
}

pub(crate) async fn find_on<R, C>(conn: &C, id: Uuid) -> CrmResult<Option<R>>
where
    R: Record,
    C: ConnectionTrait,
{
    let row = <R::Entity as EntityTrait>::find()
        .filter(R::id_column().eq(id))
        .one(conn)
        .await?;
    Ok(row.map(Into::into))
}

pub(crate) async fn get_on<R, C>(conn: &C, id: Uuid) -> CrmResult<R>
where
    R: Record,
    C: ConnectionTrait,
{
    find_on::<R, C>(conn, id)
        .await?
        .ok_or_else(|| CrmError::not_found(R::KIND, id))
}

pub(crate) async fn list_on<R, C>(conn: &C, filter: Condition) -> CrmResult<Vec<R>>
where
    R: Record,
    C: ConnectionTrait,
{
    let rows = R::ordered(<R::Entity as EntityTrait>::find().filter(filter))
        .all(conn)
        .await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub(crate) async fn delete_on<R, C>(conn: &C, id: Uuid) -> CrmResult<bool>
where
    R: Record,
    C: ConnectionTrait,
{
    let result = <R::Entity as EntityTrait>::delete_many()
        .filter(R::id_column().eq(id))
        .exec(conn)
        .await?;
    Ok(result.rows_affected > 0)
}

/// Shared repository over the injected connection pool.
#[derive(Clone)]
pub struct Repository {
    db: Arc<DatabaseConnection>,
}

impl Repository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    pub async fn list<R: Record>(&self, filter: Condition) -> CrmResult<Vec<R>> {
        list_on(self.connection(), filter).await
    }

    pub async fn all<R: Record>(&self) -> CrmResult<Vec<R>> {
        self.list(Condition::all()).await
    }

    pub async fn find<R: Record>(&self, id: Uuid) -> CrmResult<Option<R>> {
        find_on(self.connection(), id).await
    }

    pub async fn get<R: Record>(&self, id: Uuid) -> CrmResult<R> {
        get_on(self.connection(), id).await
    }

    /// Last write wins; callers read, modify, then upsert the whole record. Returns the
    /// stored row, so preserved columns show their persisted values.
    pub async fn upsert<R: Record>(&self, record: R) -> CrmResult<R> {
        let id = record.id();
        upsert_on(self.connection(), record)
            .await
            .inspect_err(|err| tracing::error!(kind = R::KIND, %id, error = %err, "upsert failed"))?;
        self.get(id).await
    }

    /// Returns whether a row was removed.
    pub async fn delete<R: Record>(&self, id: Uuid) -> CrmResult<bool> {
        delete_on::<R, _>(self.connection(), id)
            .await
            .inspect_err(|err| tracing::error!(kind = R::KIND, %id, error = %err, "delete failed"))
    }

    /// Validates references and snapshots the dealer name before the upsert. An existing
    /// deal keeps its stored stage; stage moves go through `StageRecorder::change_stage`.
    pub async fn save_deal(&self, mut deal: Deal) -> CrmResult<Deal> {
        crate::error::require_text("biz", &deal.biz)?;
        if let Some(stored) = self.find::<Deal>(deal.id).await? {
            if stored.stage != deal.stage {
                tracing::debug!(deal_id = %deal.id, requested = deal.stage.as_str(), "save ignores stage change");
            }
            deal.stage = stored.stage;
        }
        deal.email = deal
            .email
            .map(|email| email.trim().to_lowercase())
            .filter(|email| !email.is_empty());
        let dealer = self.ensure_refs(&deal).await?;
        if let Some(dealer) = dealer {
            if deal.dealer_name.as_deref().is_none_or(|name| name.trim().is_empty()) {
                deal.dealer_name = Some(dealer.name);
            }
        }
        deal.updated_at = Utc::now();
        self.upsert(deal).await
    }

    pub async fn save_dealer(&self, dealer: Dealer) -> CrmResult<Dealer> {
        crate::error::require_text("name", &dealer.name)?;
        self.upsert(dealer).await
    }

    pub async fn save_lender(&self, lender: Lender) -> CrmResult<Lender> {
        crate::error::require_text("name", &lender.name)?;
        self.upsert(lender).await
    }

    pub async fn save_account(&self, account: Account) -> CrmResult<Account> {
        crate::error::require_text("biz", &account.biz)?;
        self.upsert(account).await
    }

    async fn ensure_refs(&self, deal: &Deal) -> CrmResult<Option<Dealer>> {
        let dealer = match deal.dealer_id {
            Some(id) => Some(self.reference::<Dealer>(id).await?),
            None => None,
        };
        if let Some(id) = deal.lender_id {
            self.reference::<Lender>(id).await?;
        }
        if let Some(id) = deal.account_id {
            self.reference::<Account>(id).await?;
        }
        Ok(dealer)
    }

    pub(crate) async fn reference<R: Record>(&self, id: Uuid) -> CrmResult<R> {
        self.find::<R>(id)
            .await?
            .ok_or(CrmError::InvalidReference { kind: R::KIND, id })
    }
}
