//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations, hiding
//! the `SeaORM` implementation details from the rest of the application.
//! Everything transactional lives here: sequence issuance, attachment
//! indexing, and the two-phase row-then-bytes deletes.

pub mod attachment;
pub mod budget;
pub mod expense_account;
pub mod invoice;
pub mod sequence;
pub mod user;

pub use attachment::{AttachmentError, AttachmentRepository};
pub use budget::{
    BudgetError, BudgetFilter, BudgetRepository, CreateBudgetLineInput, UpdateBudgetLineInput,
};
pub use expense_account::{
    CreateExpenseAccountInput, ExpenseAccountError, ExpenseAccountFilter,
    ExpenseAccountRepository, LinkOutcome, UpdateExpenseAccountInput,
};
pub use invoice::{
    CreateInvoiceInput, InvoiceError, InvoiceFilter, InvoiceRepository, UpdateInvoiceInput,
};
pub use sequence::{SequenceIssuer, SequenceKind};
pub use user::{UpdateUserInput, UserError, UserRepository};
