//! Tests against a real PostgreSQL database
//!
//! Set `TEST_DATABASE_URL` to run them; without it every test returns early.
//! Fixtures carry unique codes so runs can share one database.

use std::sync::atomic::{AtomicU64, Ordering};

use axum::Json;
use axum::extract::State;
use shared::error::{AppError, ErrorCode};
use shared::models::{
    CompanyCreate, JobCard, JobCardCreate, PrepressJob, ProcessSequenceCreate,
    ProcessSequenceDetail, ProcessStepInput, Product, ProductCreate,
};
use sqlx::postgres::PgPoolOptions;

use crate::auth::CurrentUser;
use crate::config::Config;
use crate::db;
use crate::db::users::NewUser;
use crate::error::ServiceError;
use crate::services;
use crate::state::AppState;

mod test_auth;
mod test_process;
mod test_stock;
mod test_workflow;

fn test_config() -> Option<Config> {
    let url = std::env::var("TEST_DATABASE_URL")
        .ok()
        .filter(|v| !v.is_empty())?;
    let config = Config::from_lookup(|name| match name {
        "DATABASE_URL" => Some(url.clone()),
        _ => None,
    })
    .unwrap();
    Some(config)
}

/// Connected and migrated state, `None` when no test database is configured
async fn test_state() -> Option<AppState> {
    let config = test_config()?;
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&config.database_url)
        .await
        .unwrap();
    sqlx::migrate!("./migrations").run(&pool).await.unwrap();
    Some(AppState::with_pool(pool, &config))
}

fn unique(prefix: &str) -> String {
    static NEXT: AtomicU64 = AtomicU64::new(0);
    format!(
        "{prefix}-{}-{}",
        shared::util::now_millis(),
        NEXT.fetch_add(1, Ordering::Relaxed)
    )
}

fn code(err: ServiceError) -> ErrorCode {
    AppError::from(err).code
}

async fn user_with_role(state: &AppState, role_id: i64) -> CurrentUser {
    let username = unique("user");
    let id = db::users::create(
        &state.pool,
        &NewUser {
            username: &username,
            password_hash: "unused",
            full_name: "Test User",
            email: None,
            role_id,
            department: None,
        },
    )
    .await
    .unwrap();
    db::users::find_credentials_by_id(&state.pool, id)
        .await
        .unwrap()
        .unwrap()
        .into_current_user()
}

async fn admin(state: &AppState) -> CurrentUser {
    let role = db::roles::find_by_name(&state.pool, "admin")
        .await
        .unwrap()
        .unwrap();
    user_with_role(state, role.id).await
}

fn step(name: &str, compulsory: bool) -> ProcessStepInput {
    ProcessStepInput {
        step_name: name.to_string(),
        department: name.to_string(),
        is_compulsory: compulsory,
    }
}

/// Prepress, CTP, optional Lamination, Dispatch for a fresh product type
async fn sequence(state: &AppState) -> ProcessSequenceDetail {
    crate::api::process::create(
        State(state.clone()),
        Json(ProcessSequenceCreate {
            product_type: unique("type"),
            description: None,
            steps: vec![
                step("Prepress", true),
                step("CTP", true),
                step("Lamination", false),
                step("Dispatch", true),
            ],
        }),
    )
    .await
    .unwrap()
    .0
}

fn step_id(sequence: &ProcessSequenceDetail, name: &str) -> i64 {
    sequence
        .steps
        .iter()
        .find(|s| s.step_name == name)
        .map(|s| s.id)
        .unwrap()
}

async fn product(state: &AppState, product_type: &str) -> Product {
    let company = db::companies::create(
        &state.pool,
        &CompanyCreate {
            code: unique("C"),
            name: "Acme Foods".to_string(),
            contact_person: None,
            email: None,
            phone: None,
            address: None,
        },
    )
    .await
    .unwrap();
    db::products::create(
        &state.pool,
        &ProductCreate {
            code: unique("P"),
            name: "Cereal carton".to_string(),
            product_type: product_type.to_string(),
            company_id: Some(company.id),
            description: None,
        },
    )
    .await
    .unwrap()
}

async fn job(state: &AppState, user: &CurrentUser, product: &Product) -> JobCard {
    services::jobs::create(
        &state.pool,
        user,
        &JobCardCreate {
            company_id: product.company_id.unwrap(),
            product_id: product.id,
            po_number: None,
            quantity: 5_000,
            delivery_date: None,
            priority: None,
            notes: None,
        },
    )
    .await
    .unwrap()
    .job
}

async fn reload(state: &AppState, id: i64) -> JobCard {
    db::job_cards::find_by_id(&state.pool, id)
        .await
        .unwrap()
        .unwrap()
}

async fn prepress_row(state: &AppState, job_card_id: i64) -> PrepressJob {
    db::prepress::list(&state.pool, None, None)
        .await
        .unwrap()
        .into_iter()
        .find(|p| p.job_card_id == job_card_id)
        .unwrap()
}
