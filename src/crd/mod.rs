pub mod support_archive;

pub use support_archive::{
    Condition, ConditionStatus, ConditionType, ExcludedContents, StatusPhase,
    SupportArchive, SupportArchiveSpec, SupportArchiveStatus,
};
