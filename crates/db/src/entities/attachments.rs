//! `SeaORM` Entity for the attachments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::AttachmentOwner;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub owner_kind: AttachmentOwner,
    pub owner_id: Uuid,
    /// 1-based ordinal within the owner, unique per owner.
    pub file_index: i32,
    /// Storage key relative to the upload root. `None` records a file whose
    /// bytes went missing; the row stays as the audit trail.
    pub stored_path: Option<String>,
    pub original_name: String,
    /// True for documents the system produced itself (rendered PDFs), which
    /// live under the `generated/` subfolder.
    pub generated: bool,
    pub uploaded_by: Uuid,
    pub uploaded_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
