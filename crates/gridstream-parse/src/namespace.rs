//! Namespace identity for the XML parser.
//!
//! Namespace URIs are interned process-wide in a [`NamespaceRepository`] and
//! referred to everywhere else by numeric [`NsId`]. The parser maintains the
//! prefix scoping rules itself; consumers only ever see resolved identifiers.

/// Numeric identifier of an interned namespace URI.
pub type NsId = u32;

/// Identifier used for names with no namespace (or an undeclared prefix).
pub const NS_NONE: NsId = 0;

/// Interner for namespace URIs.
///
/// Identifier 0 is reserved for "no namespace"; the first interned URI gets
/// identifier 1, and so on.
#[derive(Debug)]
pub struct NamespaceRepository {
    uris: Vec<String>,
}

impl NamespaceRepository {
    pub fn new() -> Self {
        Self {
            uris: vec![String::new()],
        }
    }

    /// Intern a URI, returning its stable identifier.
    pub fn intern(&mut self, uri: &str) -> NsId {
        if uri.is_empty() {
            return NS_NONE;
        }
        if let Some(pos) = self.uris.iter().position(|u| u == uri) {
            return pos as NsId;
        }
        self.uris.push(uri.to_string());
        (self.uris.len() - 1) as NsId
    }

    /// Look up an already-interned URI without inserting.
    pub fn get(&self, uri: &str) -> Option<NsId> {
        self.uris.iter().position(|u| u == uri).map(|p| p as NsId)
    }

    /// The URI for an identifier; empty string for [`NS_NONE`].
    pub fn uri(&self, id: NsId) -> &str {
        self.uris.get(id as usize).map(String::as_str).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.uris.len()
    }

    pub fn is_empty(&self) -> bool {
        // Slot 0 is always present.
        false
    }
}

impl Default for NamespaceRepository {
    fn default() -> Self {
        Self::new()
    }
}

/// Prefix-to-namespace bindings for the element currently in scope.
///
/// Bindings are pushed per element as `xmlns` attributes are seen and popped
/// when the element closes; resolution walks the innermost scope outwards.
#[derive(Debug, Default)]
pub struct NamespaceContext {
    // (prefix, ns) pairs in declaration order, plus a per-element marker
    // stack recording how many bindings each open element added.
    bindings: Vec<(String, NsId)>,
    scope_sizes: Vec<usize>,
}

impl NamespaceContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new element scope.
    pub fn push_scope(&mut self) {
        self.scope_sizes.push(0);
    }

    /// Bind a prefix (empty string for the default namespace) in the current
    /// scope.
    pub fn bind(&mut self, prefix: &str, ns: NsId) {
        self.bindings.push((prefix.to_string(), ns));
        if let Some(n) = self.scope_sizes.last_mut() {
            *n += 1;
        }
    }

    /// Close the innermost element scope, dropping its bindings.
    pub fn pop_scope(&mut self) {
        if let Some(n) = self.scope_sizes.pop() {
            self.bindings.truncate(self.bindings.len() - n);
        }
    }

    /// Resolve a prefix to a namespace identifier.
    ///
    /// An unbound prefix (and the default namespace when none is declared)
    /// resolves to [`NS_NONE`].
    pub fn resolve(&self, prefix: &str) -> NsId {
        self.bindings
            .iter()
            .rev()
            .find(|(p, _)| p == prefix)
            .map(|(_, ns)| *ns)
            .unwrap_or(NS_NONE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_interns_stably() {
        let mut repo = NamespaceRepository::new();
        let a = repo.intern("urn:a");
        let b = repo.intern("urn:b");
        assert_ne!(a, b);
        assert_eq!(repo.intern("urn:a"), a);
        assert_eq!(repo.uri(a), "urn:a");
        assert_eq!(repo.uri(NS_NONE), "");
    }

    #[test]
    fn test_context_scoping() {
        let mut repo = NamespaceRepository::new();
        let outer = repo.intern("urn:outer");
        let inner = repo.intern("urn:inner");

        let mut cxt = NamespaceContext::new();
        cxt.push_scope();
        cxt.bind("a", outer);
        assert_eq!(cxt.resolve("a"), outer);

        cxt.push_scope();
        cxt.bind("a", inner);
        assert_eq!(cxt.resolve("a"), inner);

        cxt.pop_scope();
        assert_eq!(cxt.resolve("a"), outer);

        cxt.pop_scope();
        assert_eq!(cxt.resolve("a"), NS_NONE);
    }

    #[test]
    fn test_context_default_namespace() {
        let mut repo = NamespaceRepository::new();
        let ns = repo.intern("urn:default");
        let mut cxt = NamespaceContext::new();
        cxt.push_scope();
        assert_eq!(cxt.resolve(""), NS_NONE);
        cxt.bind("", ns);
        assert_eq!(cxt.resolve(""), ns);
    }
}
