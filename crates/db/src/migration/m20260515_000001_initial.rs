//! Initial database migration.
//!
//! Creates the enums, tables, constraints, and triggers for users, sequence
//! counters, invoices, expense accounts, attachments, and budget lines.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: IDENTITY
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: SEQUENCE COUNTERS
        // ============================================================
        db.execute_unprepared(SEQUENCE_COUNTERS_SQL).await?;

        // ============================================================
        // PART 4: FINANCIAL RECORDS
        // ============================================================
        db.execute_unprepared(EXPENSE_ACCOUNTS_SQL).await?;
        db.execute_unprepared(INVOICES_SQL).await?;
        db.execute_unprepared(BUDGET_LINES_SQL).await?;

        // ============================================================
        // PART 5: ATTACHMENTS
        // ============================================================
        db.execute_unprepared(ATTACHMENTS_SQL).await?;

        // ============================================================
        // PART 6: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.get_connection().execute_unprepared(DOWN_SQL).await?;
        Ok(())
    }
}

const ENUMS_SQL: &str = r"
-- Invoice lifecycle
CREATE TYPE invoice_status AS ENUM (
    'submitted',
    'approved',
    'rejected',
    'paid'
);

-- Expense account code assignment
CREATE TYPE expense_account_mode AS ENUM ('global_code', 'distinct_code');

-- Attachment owner family
CREATE TYPE attachment_owner AS ENUM ('invoice', 'expense_account');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id UUID PRIMARY KEY,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    full_name TEXT NOT NULL,
    roles TEXT NOT NULL DEFAULT 'submitter',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const SEQUENCE_COUNTERS_SQL: &str = r"
-- One counter per (kind, fiscal year). Issuance is a single upsert on the
-- caller's transaction, so numbers move forward even under contention.
CREATE TABLE sequence_counters (
    resource_kind TEXT NOT NULL,
    fiscal_year INTEGER NOT NULL,
    value BIGINT NOT NULL,
    PRIMARY KEY (resource_kind, fiscal_year)
);
";

const EXPENSE_ACCOUNTS_SQL: &str = r"
CREATE TABLE expense_accounts (
    id UUID PRIMARY KEY,
    cid TEXT NOT NULL UNIQUE,
    fiscal_year INTEGER NOT NULL,
    sequence_number BIGINT NOT NULL,
    mode expense_account_mode NOT NULL DEFAULT 'distinct_code',
    global_code TEXT,
    requester_name TEXT NOT NULL,
    submitted_date DATE NOT NULL,
    created_by UUID NOT NULL REFERENCES users(id),
    modified_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT expense_accounts_sequence_unique UNIQUE (fiscal_year, sequence_number),
    CONSTRAINT expense_accounts_global_code_present
        CHECK (mode <> 'global_code' OR global_code IS NOT NULL)
);

CREATE INDEX idx_expense_accounts_fiscal_year ON expense_accounts(fiscal_year);
";

const INVOICES_SQL: &str = r"
CREATE TABLE invoices (
    id UUID PRIMARY KEY,
    fiscal_year INTEGER NOT NULL,
    sequence_number BIGINT NOT NULL,
    issue_date DATE NOT NULL,
    supplier TEXT NOT NULL DEFAULT '',
    description TEXT,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
    currency TEXT NOT NULL DEFAULT 'CAD',
    status invoice_status NOT NULL DEFAULT 'submitted',
    code TEXT,
    expense_account_id UUID REFERENCES expense_accounts(id) ON DELETE SET NULL,
    submitted_by UUID NOT NULL REFERENCES users(id),
    approved_by UUID REFERENCES users(id),
    modified_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT invoices_sequence_unique UNIQUE (fiscal_year, sequence_number)
);

CREATE INDEX idx_invoices_fiscal_year ON invoices(fiscal_year);
CREATE INDEX idx_invoices_status ON invoices(status);
CREATE INDEX idx_invoices_expense_account ON invoices(expense_account_id);
";

const BUDGET_LINES_SQL: &str = r"
CREATE TABLE budget_lines (
    id UUID PRIMARY KEY,
    fiscal_year INTEGER NOT NULL,
    fund_type TEXT NOT NULL,
    revenue_type TEXT NOT NULL,
    label TEXT,
    amount NUMERIC(14, 2) NOT NULL CHECK (amount >= 0),
    created_by UUID NOT NULL REFERENCES users(id),
    modified_by UUID REFERENCES users(id),
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT budget_lines_natural_key UNIQUE (fiscal_year, fund_type, revenue_type)
);

CREATE INDEX idx_budget_lines_fiscal_year ON budget_lines(fiscal_year);
";

const ATTACHMENTS_SQL: &str = r"
CREATE TABLE attachments (
    id UUID PRIMARY KEY,
    owner_kind attachment_owner NOT NULL,
    owner_id UUID NOT NULL,
    file_index INTEGER NOT NULL CHECK (file_index >= 1),
    stored_path TEXT,
    original_name TEXT NOT NULL,
    generated BOOLEAN NOT NULL DEFAULT FALSE,
    uploaded_by UUID NOT NULL REFERENCES users(id),
    uploaded_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    CONSTRAINT attachments_owner_index_unique UNIQUE (owner_kind, owner_id, file_index)
);

CREATE INDEX idx_attachments_owner ON attachments(owner_kind, owner_id);
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER users_set_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER expense_accounts_set_updated_at
    BEFORE UPDATE ON expense_accounts
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER invoices_set_updated_at
    BEFORE UPDATE ON invoices
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();

CREATE TRIGGER budget_lines_set_updated_at
    BEFORE UPDATE ON budget_lines
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DOWN_SQL: &str = r"
-- Drop tables (reverse dependency order)
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS budget_lines CASCADE;
DROP TABLE IF EXISTS invoices CASCADE;
DROP TABLE IF EXISTS expense_accounts CASCADE;
DROP TABLE IF EXISTS sequence_counters CASCADE;
DROP TABLE IF EXISTS users CASCADE;

-- Drop functions
DROP FUNCTION IF EXISTS set_updated_at CASCADE;

-- Drop enums
DROP TYPE IF EXISTS attachment_owner CASCADE;
DROP TYPE IF EXISTS expense_account_mode CASCADE;
DROP TYPE IF EXISTS invoice_status CASCADE;
";
