use serde::{Deserialize, Serialize};

/// An opaque identity token: a username, a user id, an email. This layer never
/// looks inside it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Principal {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered collection of principals. The first entry is the primary identity
/// by convention; duplicates are not rejected here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalCollection(Vec<Principal>);

impl PrincipalCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn primary(&self) -> Option<&Principal> {
        self.0.first()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, principal: impl Into<Principal>) {
        self.0.push(principal.into());
    }

    pub fn iter(&self) -> impl Iterator<Item = &Principal> {
        self.0.iter()
    }
}

impl<P: Into<Principal>> FromIterator<P> for PrincipalCollection {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl IntoIterator for PrincipalCollection {
    type Item = Principal;
    type IntoIter = std::vec::IntoIter<Principal>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// What a successful login produces. This layer only consumes the principal
/// collection; credential material never reaches it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub principals: PrincipalCollection,
}

impl Account {
    pub fn new(principals: PrincipalCollection) -> Self {
        Self { principals }
    }
}
