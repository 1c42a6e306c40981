//! Subject classification for diff reporting.
//!
//! Buckets are keyed by the rendered identity string, so two occurrences of
//! the same subject collapse into one entry here. Removal itself works on the
//! ordered subject list (see `remover`) and never consults these buckets.

use ahash::AHashSet;
use std::collections::BTreeSet;

use crate::types::{Subject, SubjectKind};

/// Reporting category of a subject.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub enum Category {
    Users,
    Groups,
    ServiceAccounts,
    Others,
}

impl Category {
    /// Report line order.
    pub const ALL: [Category; 4] = [
        Category::Users,
        Category::Groups,
        Category::ServiceAccounts,
        Category::Others,
    ];

    /// Word used in `Removing ... from <word> [...]` lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Groups => "groups",
            Self::ServiceAccounts => "serviceaccounts",
            Self::Others => "subjects",
        }
    }

    pub fn of(kind: &SubjectKind) -> Self {
        match kind {
            SubjectKind::User => Self::Users,
            SubjectKind::Group => Self::Groups,
            SubjectKind::ServiceAccount => Self::ServiceAccounts,
            SubjectKind::Other(_) => Self::Others,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity string used in reports:
/// - `User` / `Group`: `name`
/// - `ServiceAccount`: `namespace/name`
/// - anything else: `kind/namespace/name`
pub fn display_identity(subject: &Subject) -> String {
    match &subject.kind {
        SubjectKind::User | SubjectKind::Group => subject.name.clone(),
        SubjectKind::ServiceAccount => {
            format!("{}/{}", subject.namespace_or_empty(), subject.name)
        }
        SubjectKind::Other(kind) => {
            format!("{}/{}/{}", kind, subject.namespace_or_empty(), subject.name)
        }
    }
}

/// Four disjoint identity sets derived from one subject list.
#[derive(Debug, Clone, Default)]
pub struct SubjectBuckets {
    pub users: AHashSet<String>,
    pub groups: AHashSet<String>,
    pub service_accounts: AHashSet<String>,
    pub others: AHashSet<String>,
}

impl SubjectBuckets {
    pub fn classify(subjects: &[Subject]) -> Self {
        let mut buckets = Self::default();
        for subject in subjects {
            buckets
                .bucket_mut(Category::of(&subject.kind))
                .insert(display_identity(subject));
        }
        buckets
    }

    pub fn bucket(&self, category: Category) -> &AHashSet<String> {
        match category {
            Category::Users => &self.users,
            Category::Groups => &self.groups,
            Category::ServiceAccounts => &self.service_accounts,
            Category::Others => &self.others,
        }
    }

    fn bucket_mut(&mut self, category: Category) -> &mut AHashSet<String> {
        match category {
            Category::Users => &mut self.users,
            Category::Groups => &mut self.groups,
            Category::ServiceAccounts => &mut self.service_accounts,
            Category::Others => &mut self.others,
        }
    }

    /// Identities present in `self` but not in `remaining`, sorted.
    pub fn removed_since(&self, remaining: &SubjectBuckets, category: Category) -> BTreeSet<String> {
        let after = remaining.bucket(category);
        self.bucket(category)
            .iter()
            .filter(|identity| !after.contains(*identity))
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.users.len() + self.groups.len() + self.service_accounts.len() + self.others.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
