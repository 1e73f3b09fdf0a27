//! Entity structs for source and target directory records.
//!
//! Source entities deserialize from the source platform's JSON listing shape
//! (snake_case, `user_id`, `phone_number`, ...). Target entities are the
//! platform-neutral view the engine reads and writes; adapters translate them
//! to and from their own wire format.

mod organization;
mod password;
mod role;
mod source_identity;
mod target_identity;

pub use organization::OrganizationRecord;
pub use password::{
    BcryptHash, ExportObjectId, HashedPasswordUser, PasswordBatchResult, PasswordRecord,
};
pub use role::{MemberRecord, PermissionRecord, RoleRecord};
pub use source_identity::{ConnectionIdentity, SourceIdentity};
pub use target_identity::{ATTR_CONNECTION, ATTR_FRESHLY_MIGRATED, TargetIdentity};
