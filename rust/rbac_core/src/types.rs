//! Domain types shared across rbac_core modules.
//!
//! The serde shapes follow the `rbac.authorization.k8s.io/v1` wire format so a
//! binding read from a cluster can be written back without losing fields.

use serde::{Deserialize, Deserializer, Serialize};
use std::hash::{Hash, Hasher};

/// API group of RBAC objects and of `User` / `Group` subjects.
pub const RBAC_API_GROUP: &str = "rbac.authorization.k8s.io";

/// `apiVersion` of a single role binding.
pub const RBAC_API_VERSION: &str = "rbac.authorization.k8s.io/v1";

/// `kind` of a single role binding.
pub const ROLE_BINDING_KIND: &str = "RoleBinding";

/// Role reference kind that is displayed without a namespace prefix.
pub const CLUSTER_ROLE_KIND: &str = "ClusterRole";

/// Closed set of subject kinds. Unrecognised kinds land in `Other` with the
/// original string kept so it serialises back unchanged.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SubjectKind {
    User,
    Group,
    ServiceAccount,
    Other(String),
}

impl SubjectKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::User => "User",
            Self::Group => "Group",
            Self::ServiceAccount => "ServiceAccount",
            Self::Other(kind) => kind,
        }
    }
}

impl From<String> for SubjectKind {
    fn from(kind: String) -> Self {
        match kind.as_str() {
            "User" => Self::User,
            "Group" => Self::Group,
            "ServiceAccount" => Self::ServiceAccount,
            _ => Self::Other(kind),
        }
    }
}

impl From<&str> for SubjectKind {
    fn from(kind: &str) -> Self {
        Self::from(kind.to_string())
    }
}

impl From<SubjectKind> for String {
    fn from(kind: SubjectKind) -> Self {
        match kind {
            SubjectKind::Other(kind) => kind,
            known => known.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An identity referenced by a role binding.
///
/// Identity is `(kind, namespace, name)`, compared case-sensitively.
/// `api_group` only rides along for wire fidelity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    pub kind: SubjectKind,
    #[serde(rename = "apiGroup", default, skip_serializing_if = "Option::is_none")]
    pub api_group: Option<String>,
    pub name: String,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub namespace: Option<String>,
}

impl Subject {
    pub fn user(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::User,
            api_group: Some(RBAC_API_GROUP.to_string()),
            name: name.into(),
            namespace: None,
        }
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::Group,
            api_group: Some(RBAC_API_GROUP.to_string()),
            name: name.into(),
            namespace: None,
        }
    }

    /// Service accounts always live in a namespace.
    pub fn service_account(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: SubjectKind::ServiceAccount,
            api_group: None,
            name: name.into(),
            namespace: Some(namespace.into()),
        }
    }

    pub fn other(kind: impl Into<String>, namespace: Option<&str>, name: impl Into<String>) -> Self {
        let kind: String = kind.into();
        Self {
            kind: SubjectKind::from(kind),
            api_group: None,
            name: name.into(),
            namespace: namespace.map(str::to_string),
        }
    }

    pub fn namespace_or_empty(&self) -> &str {
        self.namespace.as_deref().unwrap_or("")
    }
}

impl PartialEq for Subject {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind && self.namespace == other.namespace && self.name == other.name
    }
}

impl Eq for Subject {}

impl Hash for Subject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.kind.hash(state);
        self.namespace.hash(state);
        self.name.hash(state);
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Reference to the role a binding grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    #[serde(rename = "apiGroup", default)]
    pub api_group: String,
    pub kind: String,
    pub name: String,
}

impl RoleRef {
    pub fn role(name: impl Into<String>) -> Self {
        Self {
            api_group: RBAC_API_GROUP.to_string(),
            kind: "Role".to_string(),
            name: name.into(),
        }
    }

    pub fn cluster_role(name: impl Into<String>) -> Self {
        Self {
            api_group: RBAC_API_GROUP.to_string(),
            kind: CLUSTER_ROLE_KIND.to_string(),
            name: name.into(),
        }
    }
}

/// Object metadata. Fields the engine does not read (uid, labels,
/// annotations, managedFields, ...) are kept in `extra` untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    #[serde(rename = "resourceVersion", default, skip_serializing_if = "Option::is_none")]
    pub resource_version: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A namespaced binding of subjects to a role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBinding {
    #[serde(rename = "apiVersion", default, skip_serializing_if = "Option::is_none")]
    pub api_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    pub metadata: ObjectMeta,
    #[serde(rename = "roleRef")]
    pub role_ref: RoleRef,
    /// Order matters and duplicates are legal.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<Subject>,
}

impl RoleBinding {
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        role_ref: RoleRef,
        subjects: Vec<Subject>,
    ) -> Self {
        Self {
            api_version: Some(RBAC_API_VERSION.to_string()),
            kind: Some(ROLE_BINDING_KIND.to_string()),
            metadata: ObjectMeta {
                name: name.into(),
                namespace: Some(namespace.into()),
                ..ObjectMeta::default()
            },
            role_ref,
            subjects,
        }
    }

    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    pub fn namespace(&self) -> &str {
        self.metadata.namespace.as_deref().unwrap_or("")
    }

    /// `<namespace>/<role>` for namespaced roles, `<role>` for cluster roles.
    pub fn role_display_name(&self) -> String {
        if self.role_ref.kind == CLUSTER_ROLE_KIND {
            self.role_ref.name.clone()
        } else {
            format!("{}/{}", self.namespace(), self.role_ref.name)
        }
    }

    /// Fill in `apiVersion` / `kind` when a list response left them out.
    pub fn ensure_type_meta(&mut self) {
        if self.api_version.is_none() {
            self.api_version = Some(RBAC_API_VERSION.to_string());
        }
        if self.kind.is_none() {
            self.kind = Some(ROLE_BINDING_KIND.to_string());
        }
    }
}

/// Generic `v1` `List` wrapper used for structured output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleBindingList {
    #[serde(rename = "apiVersion")]
    pub api_version: String,
    pub kind: String,
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
    #[serde(default)]
    pub items: Vec<RoleBinding>,
}

impl RoleBindingList {
    pub fn new(items: Vec<RoleBinding>) -> Self {
        Self {
            api_version: "v1".to_string(),
            kind: "List".to_string(),
            metadata: serde_json::Map::new(),
            items,
        }
    }
}

impl Default for RoleBindingList {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
