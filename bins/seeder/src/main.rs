//! Database seeder for Tresorerie development and testing.
//!
//! Seeds one user per role with known credentials and a few budget lines
//! for the current fiscal year. Inserts are idempotent: fixed ids are
//! checked before writing, so the seeder can run repeatedly.
//!
//! Usage: cargo run --bin seeder

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use std::str::FromStr;
use uuid::Uuid;

use tresorerie_core::auth::hash_password;
use tresorerie_core::fiscal::FiscalYearResolver;
use tresorerie_db::entities::{budget_lines, users};

/// Fixed ids so re-running the seeder never duplicates fixtures.
const SUBMITTER_ID: &str = "00000000-0000-0000-0000-000000000001";
const MANAGER_ID: &str = "00000000-0000-0000-0000-000000000002";
const APPROVER_ID: &str = "00000000-0000-0000-0000-000000000003";

/// Password shared by every seeded account. Development only.
const DEV_PASSWORD: &str = "tresorerie-dev";

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").expect("DATABASE_URL must be set in environment");
    let timezone =
        std::env::var("TRESORERIE__FISCAL__TIMEZONE").unwrap_or_else(|_| "America/Toronto".into());

    println!("Connecting to database...");
    let db = tresorerie_db::connect(&database_url, 5, 1)
        .await
        .expect("Failed to connect to database");

    let fiscal = FiscalYearResolver::from_name(&timezone).expect("Unknown timezone");
    let fiscal_year = fiscal.current();

    println!("Seeding users...");
    seed_user(&db, SUBMITTER_ID, "submitter@tresorerie.dev", "Sam Submitter", "submitter").await;
    seed_user(&db, MANAGER_ID, "manager@tresorerie.dev", "Morgan Manager", "manager").await;
    seed_user(
        &db,
        APPROVER_ID,
        "approver@tresorerie.dev",
        "Alex Approver",
        "manager,approver",
    )
    .await;

    println!("Seeding budget lines for fiscal year {fiscal_year}...");
    for (fund_type, revenue_type, label, amount) in [
        ("fonds_courant", "subvention", "Operating grant", "25000.00"),
        ("fonds_courant", "commandite", "Sponsorships", "8000.00"),
        ("fonds_projets", "activite", "Project activities", "12000.00"),
    ] {
        seed_budget_line(&db, fiscal_year, fund_type, revenue_type, label, amount).await;
    }

    println!("Seeding complete!");
}

fn fixed_id(raw: &str) -> Uuid {
    Uuid::parse_str(raw).expect("seed id is a valid uuid")
}

async fn seed_user(db: &DatabaseConnection, id: &str, email: &str, full_name: &str, roles: &str) {
    let id = fixed_id(id);
    if users::Entity::find_by_id(id)
        .one(db)
        .await
        .ok()
        .flatten()
        .is_some()
    {
        println!("  {email} already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let user = users::ActiveModel {
        id: Set(id),
        email: Set(email.to_string()),
        password_hash: Set(hash_password(DEV_PASSWORD).expect("hashing the dev password")),
        full_name: Set(full_name.to_string()),
        roles: Set(roles.to_string()),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = user.insert(db).await {
        eprintln!("Failed to insert {email}: {e}");
    } else {
        println!("  Created {email} ({roles})");
    }
}

async fn seed_budget_line(
    db: &DatabaseConnection,
    fiscal_year: i32,
    fund_type: &str,
    revenue_type: &str,
    label: &str,
    amount: &str,
) {
    let existing = budget_lines::Entity::find()
        .filter(budget_lines::Column::FiscalYear.eq(fiscal_year))
        .filter(budget_lines::Column::FundType.eq(fund_type))
        .filter(budget_lines::Column::RevenueType.eq(revenue_type))
        .one(db)
        .await
        .ok()
        .flatten();
    if existing.is_some() {
        println!("  {fund_type}/{revenue_type} already exists, skipping...");
        return;
    }

    let now = Utc::now().into();
    let line = budget_lines::ActiveModel {
        id: Set(Uuid::new_v4()),
        fiscal_year: Set(fiscal_year),
        fund_type: Set(fund_type.to_string()),
        revenue_type: Set(revenue_type.to_string()),
        label: Set(Some(label.to_string())),
        amount: Set(Decimal::from_str(amount).expect("seed amount is a valid decimal")),
        created_by: Set(fixed_id(MANAGER_ID)),
        modified_by: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
    };

    if let Err(e) = line.insert(db).await {
        eprintln!("Failed to insert {fund_type}/{revenue_type}: {e}");
    } else {
        println!("  Created {fund_type}/{revenue_type} = {amount}");
    }
}
