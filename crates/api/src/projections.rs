//! Row projections returned by the read API and carried in change events.
//!
//! Amounts serialize as plain JSON numbers and dates as ISO-8601 strings;
//! the same projection feeds the HTTP response and the realtime payload, so
//! a listener and a re-fetch always agree on the shape.

use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tresorerie_db::entities::sea_orm_active_enums::{ExpenseAccountMode, InvoiceStatus};
use tresorerie_db::entities::{attachments, budget_lines, expense_accounts, invoices, users};
use tresorerie_shared::auth::{parse_role_list, Role, UserInfo};
use uuid::Uuid;

/// Serializes a projection for an event payload. These structs contain only
/// maps with string keys and finite numbers, so serialization cannot fail;
/// `Null` stands in if it somehow does.
pub fn event_payload<T: Serialize>(projection: &T) -> Value {
    serde_json::to_value(projection).unwrap_or(Value::Null)
}

/// Invoice row as the API returns it.
#[derive(Debug, Clone, Serialize)]
pub struct InvoiceProjection {
    pub id: Uuid,
    pub fiscal_year: i32,
    pub sequence_number: i64,
    pub issue_date: NaiveDate,
    pub supplier: String,
    pub description: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub status: InvoiceStatus,
    pub code: Option<String>,
    pub expense_account_id: Option<Uuid>,
    pub submitted_by: Uuid,
    pub approved_by: Option<Uuid>,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<invoices::Model> for InvoiceProjection {
    fn from(model: invoices::Model) -> Self {
        Self {
            id: model.id,
            fiscal_year: model.fiscal_year,
            sequence_number: model.sequence_number,
            issue_date: model.issue_date,
            supplier: model.supplier,
            description: model.description,
            amount: model.amount,
            currency: model.currency,
            status: model.status,
            code: model.code,
            expense_account_id: model.expense_account_id,
            submitted_by: model.submitted_by,
            approved_by: model.approved_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Expense account row as the API returns it.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseAccountProjection {
    pub id: Uuid,
    pub cid: String,
    pub fiscal_year: i32,
    pub sequence_number: i64,
    pub mode: ExpenseAccountMode,
    pub global_code: Option<String>,
    pub requester_name: String,
    pub submitted_date: NaiveDate,
    pub created_by: Uuid,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<expense_accounts::Model> for ExpenseAccountProjection {
    fn from(model: expense_accounts::Model) -> Self {
        Self {
            id: model.id,
            cid: model.cid,
            fiscal_year: model.fiscal_year,
            sequence_number: model.sequence_number,
            mode: model.mode,
            global_code: model.global_code,
            requester_name: model.requester_name,
            submitted_date: model.submitted_date,
            created_by: model.created_by,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Attachment metadata as the API returns it. The stored path stays
/// server-side; clients address bytes by (owner, file_index).
#[derive(Debug, Clone, Serialize)]
pub struct AttachmentProjection {
    pub owner_id: Uuid,
    pub file_index: i32,
    pub original_name: String,
    pub generated: bool,
    /// False once the bytes went missing and the row was healed.
    pub available: bool,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTime<FixedOffset>,
}

impl From<attachments::Model> for AttachmentProjection {
    fn from(model: attachments::Model) -> Self {
        Self {
            owner_id: model.owner_id,
            file_index: model.file_index,
            original_name: model.original_name,
            generated: model.generated,
            available: model.stored_path.is_some(),
            uploaded_by: model.uploaded_by,
            uploaded_at: model.uploaded_at,
        }
    }
}

/// Budget line row as the API returns it.
#[derive(Debug, Clone, Serialize)]
pub struct BudgetLineProjection {
    pub id: Uuid,
    pub fiscal_year: i32,
    pub fund_type: String,
    pub revenue_type: String,
    pub label: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: DateTime<FixedOffset>,
}

impl From<budget_lines::Model> for BudgetLineProjection {
    fn from(model: budget_lines::Model) -> Self {
        Self {
            id: model.id,
            fiscal_year: model.fiscal_year,
            fund_type: model.fund_type,
            revenue_type: model.revenue_type,
            label: model.label,
            amount: model.amount,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// User row as the API returns it (never the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserProjection {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub roles: Vec<Role>,
    pub is_active: bool,
    pub created_at: DateTime<FixedOffset>,
}

impl From<users::Model> for UserProjection {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            email: model.email,
            full_name: model.full_name,
            roles: parse_role_list(&model.roles),
            is_active: model.is_active,
            created_at: model.created_at,
        }
    }
}

/// The auth-response shape, shared with the login payload.
pub fn user_info(model: &users::Model) -> UserInfo {
    UserInfo {
        id: model.id,
        email: model.email.clone(),
        full_name: model.full_name.clone(),
        roles: parse_role_list(&model.roles),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;

    fn sample_invoice() -> invoices::Model {
        invoices::Model {
            id: Uuid::new_v4(),
            fiscal_year: 2025,
            sequence_number: 7,
            issue_date: NaiveDate::from_ymd_opt(2025, 9, 3).unwrap(),
            supplier: "Café Dépôt".into(),
            description: None,
            amount: dec!(1234.56),
            currency: "CAD".into(),
            status: InvoiceStatus::Submitted,
            code: None,
            expense_account_id: None,
            submitted_by: Uuid::new_v4(),
            approved_by: None,
            modified_by: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    #[test]
    fn amounts_serialize_as_plain_numbers() {
        let projection = InvoiceProjection::from(sample_invoice());
        let value = event_payload(&projection);
        assert!(value["amount"].is_number());
        assert_eq!(value["amount"], 1234.56);
    }

    #[test]
    fn dates_serialize_as_iso_strings() {
        let projection = InvoiceProjection::from(sample_invoice());
        let value = event_payload(&projection);
        assert_eq!(value["issue_date"], "2025-09-03");
    }

    #[test]
    fn attachment_availability_follows_the_stored_path() {
        let base = attachments::Model {
            id: Uuid::new_v4(),
            owner_kind: tresorerie_db::entities::sea_orm_active_enums::AttachmentOwner::Invoice,
            owner_id: Uuid::new_v4(),
            file_index: 1,
            stored_path: Some("invoices/2025/x.pdf".into()),
            original_name: "x.pdf".into(),
            generated: false,
            uploaded_by: Uuid::new_v4(),
            uploaded_at: Utc::now().into(),
        };
        assert!(AttachmentProjection::from(base.clone()).available);

        let healed = attachments::Model {
            stored_path: None,
            ..base
        };
        assert!(!AttachmentProjection::from(healed).available);
    }

    #[test]
    fn user_projection_never_leaks_the_hash() {
        let model = users::Model {
            id: Uuid::new_v4(),
            email: "a@b.c".into(),
            password_hash: "$argon2id$secret".into(),
            full_name: "A".into(),
            roles: "manager,approver".into(),
            is_active: true,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        };
        let value = event_payload(&UserProjection::from(model));
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["roles"][0], "manager");
    }
}
