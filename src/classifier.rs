//! Route classification.
//!
//! Maps a request path to the protection classes that apply to it. The rule
//! table is a process-wide constant and is never exposed; callers only get the
//! pure [`classify`] function.

/// A protection class a path can fall into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtectionClass {
    /// Requires a primary session; enforced by the request gate.
    PrimaryProtected,
    /// Administrative UI; passed through the gate and guarded downstream.
    AdminNamespace,
}

/// The (possibly empty) set of classes a path belongs to. Empty means public.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassSet {
    primary_protected: bool,
    admin_namespace: bool,
}

impl ClassSet {
    pub fn contains(&self, class: ProtectionClass) -> bool {
        match class {
            ProtectionClass::PrimaryProtected => self.primary_protected,
            ProtectionClass::AdminNamespace => self.admin_namespace,
        }
    }

    pub fn is_public(&self) -> bool {
        !self.primary_protected && !self.admin_namespace
    }

    /// Whether the request gate must resolve a session and possibly redirect.
    /// Admin membership always wins over primary protection.
    pub fn requires_primary_session(&self) -> bool {
        self.primary_protected && !self.admin_namespace
    }

    fn insert(&mut self, class: ProtectionClass) {
        match class {
            ProtectionClass::PrimaryProtected => self.primary_protected = true,
            ProtectionClass::AdminNamespace => self.admin_namespace = true,
        }
    }
}

// Ordered prefix rules. The admin prefix is deliberately absent from the
// protected list.
const RULES: &[(&str, ProtectionClass)] = &[
    ("/discover", ProtectionClass::PrimaryProtected),
    ("/stack-card", ProtectionClass::PrimaryProtected),
    ("/home", ProtectionClass::PrimaryProtected),
    ("/lists", ProtectionClass::PrimaryProtected),
    ("/projects", ProtectionClass::PrimaryProtected),
    ("/logs", ProtectionClass::PrimaryProtected),
    ("/profile", ProtectionClass::PrimaryProtected),
    ("/settings", ProtectionClass::PrimaryProtected),
    ("/onboarding", ProtectionClass::PrimaryProtected),
    ("/admin", ProtectionClass::AdminNamespace),
];

// Paths the gate never sees: framework assets, favicon, and the resource API,
// whose endpoints authorize themselves.
const GATE_EXCLUSIONS: &[&str] = &["/_next/static", "/_next/image", "/favicon.ico", "/api"];

/// classify
///
/// Plain string-prefix matching against the rule table, so `/homepage` is as
/// protected as `/home/feed`. Depends on nothing but the path.
pub fn classify(path: &str) -> ClassSet {
    let mut classes = ClassSet::default();
    for (prefix, class) in RULES {
        if path.starts_with(prefix) {
            classes.insert(*class);
        }
    }
    classes
}

/// Whether the request gate should run for this path at all.
pub fn is_gated(path: &str) -> bool {
    !GATE_EXCLUSIONS
        .iter()
        .any(|prefix| path.starts_with(prefix))
}
