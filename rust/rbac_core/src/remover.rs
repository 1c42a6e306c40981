//! Removal of requested users and groups from one subject list.

use std::collections::BTreeSet;

use crate::types::{Subject, SubjectKind};

/// Identities to strip from every binding in a namespace.
///
/// Only `User` and `Group` subjects are ever targeted; service accounts and
/// other kinds pass through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalRequest {
    pub users: BTreeSet<String>,
    pub groups: BTreeSet<String>,
}

impl RemovalRequest {
    pub fn new<U, G>(users: U, groups: G) -> Self
    where
        U: IntoIterator,
        U::Item: Into<String>,
        G: IntoIterator,
        G::Item: Into<String>,
    {
        Self {
            users: users.into_iter().map(Into::into).collect(),
            groups: groups.into_iter().map(Into::into).collect(),
        }
    }

    pub fn users<I>(users: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(users, std::iter::empty::<String>())
    }

    pub fn groups<I>(groups: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::new(std::iter::empty::<String>(), groups)
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty() && self.groups.is_empty()
    }

    /// Whether `subject` is targeted. Namespace plays no part: users and
    /// groups are cluster-wide identities.
    pub fn targets(&self, subject: &Subject) -> bool {
        match subject.kind {
            SubjectKind::User => self.users.contains(&subject.name),
            SubjectKind::Group => self.groups.contains(&subject.name),
            SubjectKind::ServiceAccount | SubjectKind::Other(_) => false,
        }
    }
}

/// Return `subjects` minus every occurrence of a targeted identity, keeping
/// the relative order of the survivors. The input is not modified.
pub fn remove_subjects(subjects: &[Subject], request: &RemovalRequest) -> Vec<Subject> {
    subjects
        .iter()
        .filter(|subject| !request.targets(subject))
        .cloned()
        .collect()
}
