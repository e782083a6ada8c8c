use chrono::Utc;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(CustomResource, Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[kube(
    group = "k8s.cloudogu.com",
    version = "v1",
    kind = "SupportArchive",
    plural = "supportarchives",
    namespaced,
    status = "SupportArchiveStatus"
)]
#[serde(rename_all = "camelCase")]
pub struct SupportArchiveSpec {
    /// Collector categories to leave out of the archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excluded_contents: Option<ExcludedContents>,
    /// Free-form reference to the support case this archive belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExcludedContents {
    #[serde(default)]
    pub logs: bool,
    #[serde(default)]
    pub events: bool,
    #[serde(default)]
    pub system_state: bool,
    #[serde(default)]
    pub sensitive_data: bool,
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SupportArchiveStatus {
    /// Coarse lifecycle phase; exactly one is active at a time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phase: Option<StatusPhase>,
    /// Collector errors in the order they occurred. Never deduplicated.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
    /// Where the finished archive can be fetched.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<String>,
    /// K8s-style conditions, at most one per type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

#[derive(
    Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq,
)]
#[serde(rename_all = "lowercase")]
pub enum StatusPhase {
    Creating,
    Created,
    Deleting,
    Failed,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq)]
pub struct Condition {
    #[serde(rename = "type")]
    pub type_: ConditionType,
    pub status: ConditionStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(
        rename = "lastTransitionTime",
        skip_serializing_if = "Option::is_none"
    )]
    pub last_transition_time: Option<String>,
}

#[derive(Deserialize, Serialize, Clone, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionType {
    Created,
    Progressing,
    Errored,
    #[serde(other)]
    Unknown,
}

#[derive(Deserialize, Serialize, Clone, Copy, Debug, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl Condition {
    /// Build a condition stamped with the current time.
    pub fn new(
        type_: ConditionType,
        status: ConditionStatus,
        reason: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            type_,
            status,
            reason: Some(reason.into()),
            message: Some(message.into()),
            last_transition_time: Some(Utc::now().to_rfc3339()),
        }
    }
}

impl SupportArchiveStatus {
    /// Insert or replace the condition of the same type. When the boolean
    /// status did not change, the previous transition time is kept so that
    /// repeated reconciles do not churn the timestamp.
    pub fn upsert_condition(&mut self, incoming: Condition) {
        if let Some(idx) = self
            .conditions
            .iter()
            .position(|c| c.type_ == incoming.type_)
        {
            let mut incoming = incoming;
            if self.conditions[idx].status == incoming.status {
                incoming.last_transition_time =
                    self.conditions[idx].last_transition_time.clone();
            }
            self.conditions[idx] = incoming;
        } else {
            self.conditions.push(incoming);
        }
    }

    pub fn condition(&self, type_: &ConditionType) -> Option<&Condition> {
        self.conditions.iter().find(|c| &c.type_ == type_)
    }

    pub fn append_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }
}
