mod mutation;
mod query;

use async_graphql::{
    Context, EmptySubscription, Enum, Error, ErrorExtensions, Object, Schema, SimpleObject,
};
use platform_api::ApiError;
use products_crm::Crm;
use products_crm::access::Caller;
use products_crm::model::Stage;
use serde::Serialize;
use tracing::instrument;

pub use mutation::CrmMutation;
pub use query::CrmQuery;

pub type SchemaType = Schema<QueryRoot, MutationRoot, EmptySubscription>;

/// The engine is schema data; the caller is attached per request by the HTTP layer.
pub fn build_schema(crm: Crm) -> SchemaType {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(crm)
        .finish()
}

/// SDL without any runtime data attached.
pub fn sdl() -> String {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .finish()
        .sdl()
}

#[derive(Default)]
pub struct QueryRoot;

#[Object]
impl QueryRoot {
    #[instrument(name = "graphql.health", skip_all)]
    async fn health(&self) -> HealthPayload {
        HealthPayload { ok: true }
    }

    async fn version(&self) -> String {
        env!("CARGO_PKG_VERSION").to_string()
    }

    async fn crm(&self) -> CrmQuery {
        CrmQuery
    }
}

#[derive(Default)]
pub struct MutationRoot;

#[Object]
impl MutationRoot {
    async fn crm(&self) -> CrmMutation {
        CrmMutation
    }
}

#[derive(Clone, Debug, SimpleObject, Serialize)]
pub struct HealthPayload {
    pub ok: bool,
}

#[derive(Enum, Copy, Clone, Debug, Eq, PartialEq)]
pub enum DealStage {
    Pending,
    Approved,
    Funded,
    Declined,
}

impl From<DealStage> for Stage {
    fn from(value: DealStage) -> Self {
        match value {
            DealStage::Pending => Stage::Pending,
            DealStage::Approved => Stage::Approved,
            DealStage::Funded => Stage::Funded,
            DealStage::Declined => Stage::Declined,
        }
    }
}

fn engine<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Crm> {
    ctx.data::<Crm>()
        .map_err(|_| ApiError::internal(anyhow::anyhow!("engine missing from schema data")).extend())
}

fn caller<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Caller> {
    ctx.data::<Caller>()
        .map_err(|_| ApiError::Unauthenticated.extend())
}

fn require_staff<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Caller> {
    let caller = caller(ctx)?;
    caller.require_staff().map_err(gql)?;
    Ok(caller)
}

fn require_admin<'a>(ctx: &Context<'a>) -> async_graphql::Result<&'a Caller> {
    let caller = caller(ctx)?;
    caller.require_admin().map_err(gql)?;
    Ok(caller)
}

/// Maps engine and gate errors onto GraphQL errors carrying a `code` extension.
fn gql(err: impl Into<ApiError>) -> Error {
    err.into().extend()
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_graphql::Request;
    use serde_json::json;
    use std::sync::Arc;

    async fn schema() -> SchemaType {
        let db = sea_orm::Database::connect("sqlite::memory:").await.unwrap();
        build_schema(Crm::new(Arc::new(db)))
    }

    #[tokio::test]
    async fn health_query_returns_ok() {
        let schema = schema().await;
        let response = schema.execute(Request::new("{ health { ok } }")).await;
        assert!(response.errors.is_empty());
        let body = response.data.into_json().unwrap();
        assert_eq!(body, json!({"health": {"ok": true}}));
    }

    #[tokio::test]
    async fn crm_requires_a_caller() {
        let schema = schema().await;
        let response = schema.execute(Request::new("{ crm { lenders } }")).await;
        assert_eq!(response.errors.len(), 1);
        let code = response.errors[0]
            .extensions
            .as_ref()
            .and_then(|ext| ext.get("code"))
            .cloned();
        assert_eq!(code, Some(async_graphql::Value::from("UNAUTHENTICATED")));
    }
}
