//! The policy registry and its compiler.
//!
//! A [`Policy`] is meant to be built once at startup and then shared across
//! request handlers. Compilation is lazy: the sorted header value is built on
//! the first [`Policy::compile`] after a change and reused until the next
//! change. Only policies containing [`NONCE_PLACEHOLDER`] do any per-call work.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::directive::{is_valueless, normalize_directive};
use crate::source::{self, NONCE_PLACEHOLDER};

pub const CSP_HEADER: &str = "Content-Security-Policy";
pub const CSP_REPORT_ONLY_HEADER: &str = "Content-Security-Policy-Report-Only";

/// Whether the compiled policy is enforced or only reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderMode {
    #[default]
    Enforce,
    ReportOnly,
}

impl HeaderMode {
    /// Response header the compiled value belongs in
    pub fn header_name(self) -> &'static str {
        match self {
            HeaderMode::Enforce => CSP_HEADER,
            HeaderMode::ReportOnly => CSP_REPORT_ONLY_HEADER,
        }
    }
}

/// Everything guarded by the policy lock.
struct PolicyState {
    /// Directive name -> sources. An empty set is a valueless directive.
    directives: HashMap<String, HashSet<String>>,
    /// Last compiled value, placeholder still in place
    cache: Arc<str>,
    is_compiled: bool,
    needs_nonce: bool,
}

impl PolicyState {
    fn new(directives: HashMap<String, HashSet<String>>) -> Self {
        Self {
            directives,
            cache: Arc::from(""),
            is_compiled: false,
            needs_nonce: false,
        }
    }

    fn invalidate(&mut self) {
        self.is_compiled = false;
        self.needs_nonce = false;
        self.cache = Arc::from("");
    }

    /// Serializes the directives in sorted order and marks the cache valid.
    fn rebuild(&mut self) {
        let mut names: Vec<&String> = self.directives.keys().collect();
        names.sort();

        let mut out = String::new();
        let mut needs_nonce = false;

        for (i, name) in names.iter().enumerate() {
            if i > 0 {
                out.push_str("; ");
            }
            out.push_str(name);

            let mut sources: Vec<&String> = self.directives[*name].iter().collect();
            sources.sort();

            for source in sources {
                out.push(' ');
                out.push_str(source);
                needs_nonce |= source.as_str() == NONCE_PLACEHOLDER;
            }
        }

        log::debug!(
            "Compiled CSP with {} directives (nonce required: {})",
            self.directives.len(),
            needs_nonce
        );

        self.cache = Arc::from(out);
        self.needs_nonce = needs_nonce;
        self.is_compiled = true;
    }
}

/// Thread-safe Content Security Policy with cached compilation.
///
/// Every operation takes `&self`, so a policy can sit behind an `Arc` and be
/// used from any number of threads.
pub struct Policy {
    state: Mutex<PolicyState>,
    mode: HeaderMode,
}

impl Policy {
    /// Create an empty, enforcing policy
    pub fn new() -> Self {
        Self::with_mode(HeaderMode::Enforce)
    }

    /// Create an empty policy for the report-only header
    pub fn report_only() -> Self {
        Self::with_mode(HeaderMode::ReportOnly)
    }

    pub fn with_mode(mode: HeaderMode) -> Self {
        Self {
            state: Mutex::new(PolicyState::new(HashMap::new())),
            mode,
        }
    }

    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    /// Name of the header the compiled value should be sent in
    pub fn header_name(&self) -> &'static str {
        self.mode.header_name()
    }

    /// Adds sources to a directive, keeping the ones already present.
    ///
    /// Blank sources are ignored. With no usable sources only valueless
    /// directives (e.g. `upgrade-insecure-requests`) are recorded.
    pub fn add(&self, directive: &str, sources: &[&str]) {
        let Some(key) = normalize_directive(directive) else {
            log::trace!("Ignoring add for blank directive name");
            return;
        };

        let valid = clean_sources(sources);
        if valid.is_empty() && !is_valueless(&key) {
            log::trace!("Ignoring add for {} with no usable sources", key);
            return;
        }

        let mut state = self.state.lock();
        let mut changed = false;

        let entry = state.directives.entry(key).or_insert_with(|| {
            changed = true;
            HashSet::new()
        });
        for source in valid {
            changed |= entry.insert(source.to_string());
        }

        if changed {
            state.invalidate();
        }
    }

    /// Replaces every source of a directive.
    ///
    /// With no usable sources a valueless directive is kept without values and
    /// any other directive is removed from the policy.
    pub fn set(&self, directive: &str, sources: &[&str]) {
        let Some(key) = normalize_directive(directive) else {
            log::trace!("Ignoring set for blank directive name");
            return;
        };

        let fresh: HashSet<String> = clean_sources(sources)
            .into_iter()
            .map(str::to_string)
            .collect();

        let mut state = self.state.lock();
        if fresh.is_empty() && !is_valueless(&key) {
            state.directives.remove(&key);
        } else {
            state.directives.insert(key, fresh);
        }
        state.invalidate();
    }

    /// Removes a directive. Removing an absent directive keeps the cache.
    pub fn remove(&self, directive: &str) {
        let Some(key) = normalize_directive(directive) else {
            return;
        };

        let mut state = self.state.lock();
        if state.directives.remove(&key).is_some() {
            state.invalidate();
        } else {
            log::trace!("Directive {} not present, nothing to remove", key);
        }
    }

    /// Compiles the policy into a header value.
    ///
    /// Directives and their sources are emitted in sorted order. If the policy
    /// contains [`NONCE_PLACEHOLDER`] it is replaced by `'nonce-<nonce>'`; when
    /// no nonce (or an empty one) is given the placeholder stays visible as
    /// `'nonce-{{nonce}}'`. A nonce passed to a policy without the placeholder
    /// is ignored.
    pub fn compile(&self, nonce: Option<&str>) -> Arc<str> {
        let (cached, needs_nonce) = {
            let mut state = self.state.lock();
            if !state.is_compiled {
                state.rebuild();
            }
            (Arc::clone(&state.cache), state.needs_nonce)
        };

        if !needs_nonce {
            return cached;
        }

        let value = match nonce {
            Some(value) if !value.is_empty() => value,
            _ => {
                log::warn!("CSP requires a nonce but none was supplied; emitting placeholder");
                NONCE_PLACEHOLDER
            }
        };

        Arc::from(cached.replace(NONCE_PLACEHOLDER, &source::nonce(value)))
    }

    /// Header name together with the compiled value
    pub fn header(&self, nonce: Option<&str>) -> (&'static str, Arc<str>) {
        (self.header_name(), self.compile(nonce))
    }

    /// Whether the cached value reflects the current directives
    pub fn is_compiled(&self) -> bool {
        self.state.lock().is_compiled
    }

    /// Whether the last compiled value contains the nonce placeholder.
    ///
    /// Always `false` while the policy is not compiled.
    pub fn needs_nonce(&self) -> bool {
        self.state.lock().needs_nonce
    }

    /// Number of directives present
    pub fn len(&self) -> usize {
        self.state.lock().directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().directives.is_empty()
    }

    pub fn contains(&self, directive: &str) -> bool {
        match normalize_directive(directive) {
            Some(key) => self.state.lock().directives.contains_key(&key),
            None => false,
        }
    }

    /// Sorted copy of a directive's sources, `None` if the directive is absent
    pub fn sources(&self, directive: &str) -> Option<Vec<String>> {
        let key = normalize_directive(directive)?;
        let state = self.state.lock();
        let mut sources: Vec<String> = state.directives.get(&key)?.iter().cloned().collect();
        sources.sort();
        Some(sources)
    }

    /// Sorted snapshot of every directive and its sources
    pub fn directives(&self) -> BTreeMap<String, BTreeSet<String>> {
        self.state
            .lock()
            .directives
            .iter()
            .map(|(name, sources)| (name.clone(), sources.iter().cloned().collect()))
            .collect()
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for Policy {
    fn clone(&self) -> Self {
        Self {
            state: Mutex::new(PolicyState::new(self.state.lock().directives.clone())),
            mode: self.mode,
        }
    }
}

impl fmt::Debug for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("mode", &self.mode)
            .field("directives", &self.directives())
            .finish()
    }
}

/// Trims sources and drops the blank ones.
fn clean_sources<'a>(sources: &[&'a str]) -> Vec<&'a str> {
    sources
        .iter()
        .map(|source| source.trim())
        .filter(|source| !source.is_empty())
        .collect()
}
