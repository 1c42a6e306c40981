//! Per-binding diff and action decision, plus the aggregate report.

use std::collections::{BTreeMap, BTreeSet};

use crate::remover::{remove_subjects, RemovalRequest};
use crate::subject::{Category, SubjectBuckets};
use crate::types::{RoleBinding, Subject};

/// What to do with one binding after removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Subject count unchanged.
    NoOp,
    /// Some subjects left.
    Update,
    /// Nothing left of a previously non-empty list.
    Delete,
}

impl Action {
    pub fn decide(original: usize, remaining: usize) -> Self {
        if remaining == original {
            Self::NoOp
        } else if remaining == 0 {
            Self::Delete
        } else {
            Self::Update
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoOp => "noop",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of planning a single binding. `binding` is the untouched source.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationResult {
    pub binding: RoleBinding,
    pub remaining: Vec<Subject>,
    /// Only non-empty categories are present.
    pub removed: BTreeMap<Category, BTreeSet<String>>,
    pub action: Action,
}

impl ReconciliationResult {
    /// The binding as it should look after the change.
    pub fn mutated(&self) -> RoleBinding {
        let mut binding = self.binding.clone();
        binding.subjects = self.remaining.clone();
        binding
    }

    pub fn into_mutated(self) -> RoleBinding {
        let mut binding = self.binding;
        binding.subjects = self.remaining;
        binding
    }

    /// One `Removing ...` line per non-empty category, in category order.
    pub fn report_lines(&self, namespace: &str) -> Vec<ReportLine> {
        let role = self.binding.role_display_name();
        self.removed
            .iter()
            .map(|(category, names)| ReportLine::Removed {
                role: role.clone(),
                category: *category,
                names: names.iter().cloned().collect(),
                namespace: namespace.to_string(),
            })
            .collect()
    }
}

/// Compute remaining subjects, per-category removals and the action for one
/// binding. Never mutates the input.
pub fn plan_binding(binding: &RoleBinding, request: &RemovalRequest) -> ReconciliationResult {
    let original = binding.subjects.as_slice();
    let before = SubjectBuckets::classify(original);

    let remaining = remove_subjects(original, request);
    let action = Action::decide(original.len(), remaining.len());

    let mut removed = BTreeMap::new();
    if action != Action::NoOp {
        let after = SubjectBuckets::classify(&remaining);
        for category in Category::ALL {
            let diff = before.removed_since(&after, category);
            if !diff.is_empty() {
                removed.insert(category, diff);
            }
        }
    }

    ReconciliationResult {
        binding: binding.clone(),
        remaining,
        removed,
        action,
    }
}

/// Requested identities that no binding in the namespace carried.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotFound {
    pub users: BTreeSet<String>,
    pub groups: BTreeSet<String>,
}

impl NotFound {
    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }
}

/// Aggregate of one reconciliation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub users_removed: BTreeSet<String>,
    pub groups_removed: BTreeSet<String>,
    pub service_accounts_removed: BTreeSet<String>,
    pub others_removed: BTreeSet<String>,
    pub not_found: NotFound,
    pub bindings_updated: usize,
    pub bindings_deleted: usize,
}

impl Report {
    /// Fold one binding's diff into the aggregate.
    pub fn absorb(&mut self, result: &ReconciliationResult) {
        for (category, names) in &result.removed {
            self.removed_mut(*category).extend(names.iter().cloned());
        }
        match result.action {
            Action::Update => self.bindings_updated += 1,
            Action::Delete => self.bindings_deleted += 1,
            Action::NoOp => {}
        }
    }

    pub fn removed(&self, category: Category) -> &BTreeSet<String> {
        match category {
            Category::Users => &self.users_removed,
            Category::Groups => &self.groups_removed,
            Category::ServiceAccounts => &self.service_accounts_removed,
            Category::Others => &self.others_removed,
        }
    }

    fn removed_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
        match category {
            Category::Users => &mut self.users_removed,
            Category::Groups => &mut self.groups_removed,
            Category::ServiceAccounts => &mut self.service_accounts_removed,
            Category::Others => &mut self.others_removed,
        }
    }

    /// Fill `not_found` from the request and the aggregated removals.
    pub fn finish(&mut self, request: &RemovalRequest) {
        self.not_found = NotFound {
            users: request
                .users
                .difference(&self.users_removed)
                .cloned()
                .collect(),
            groups: request
                .groups
                .difference(&self.groups_removed)
                .cloned()
                .collect(),
        };
    }

    /// Whether any binding lost a subject.
    pub fn has_changes(&self) -> bool {
        self.bindings_updated + self.bindings_deleted > 0
    }

    /// At most one line for users and one for groups.
    pub fn not_found_lines(&self, namespace: &str) -> Vec<ReportLine> {
        let mut lines = Vec::new();
        if !self.not_found.users.is_empty() {
            lines.push(ReportLine::NotBound {
                category: Category::Users,
                names: self.not_found.users.iter().cloned().collect(),
                namespace: namespace.to_string(),
            });
        }
        if !self.not_found.groups.is_empty() {
            lines.push(ReportLine::NotBound {
                category: Category::Groups,
                names: self.not_found.groups.iter().cloned().collect(),
                namespace: namespace.to_string(),
            });
        }
        lines
    }
}

/// One human-readable line of the textual report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportLine {
    Removed {
        role: String,
        category: Category,
        names: Vec<String>,
        namespace: String,
    },
    NotBound {
        category: Category,
        names: Vec<String>,
        namespace: String,
    },
}

impl ReportLine {
    /// The line without its trailing period, so a presentation layer can
    /// insert a marker such as ` (dry client run)` before it.
    pub fn body(&self) -> String {
        match self {
            Self::Removed {
                role,
                category,
                names,
                namespace,
            } => format!(
                "Removing {} from {} {} in project {}",
                role,
                category.label(),
                bracketed(names),
                namespace
            ),
            Self::NotBound {
                category,
                names,
                namespace,
            } => format!(
                "{} {} were not bound to roles in project {}",
                capitalized(category.label()),
                bracketed(names),
                namespace
            ),
        }
    }
}

impl std::fmt::Display for ReportLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.", self.body())
    }
}

fn bracketed(names: &[String]) -> String {
    format!("[{}]", names.join(" "))
}

fn capitalized(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
