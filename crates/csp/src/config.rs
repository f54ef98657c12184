//! Declarative policy configuration.
//!
//! Lets a policy be described in a JSON document (or built in code) and then
//! turned into a live [`Policy`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::directive::{self, is_valueless, normalize_directive};
use crate::error::{CspError, CspResult};
use crate::policy::{HeaderMode, Policy};
use crate::source;

/// Serializable description of a policy
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Send the policy in the report-only header
    pub report_only: bool,
    /// Directive name -> sources
    pub directives: BTreeMap<String, Vec<String>>,
}

impl PolicyConfig {
    /// Parse a configuration from JSON, e.g.
    /// `{"report_only": false, "directives": {"default-src": ["'self'"]}}`
    pub fn from_json(json: &str) -> CspResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> CspResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A locked-down starting point: same-origin resources only, nonce-gated
    /// scripts, no plugins, no framing.
    pub fn strict() -> Self {
        let mut directives = BTreeMap::new();
        directives.insert(directive::DEFAULT_SRC.to_string(), vec![source::SOURCE_SELF.to_string()]);
        directives.insert(directive::BASE_URI.to_string(), vec![source::SOURCE_SELF.to_string()]);
        directives.insert(directive::FORM_ACTION.to_string(), vec![source::SOURCE_SELF.to_string()]);
        directives.insert(directive::FRAME_ANCESTORS.to_string(), vec![source::SOURCE_NONE.to_string()]);
        directives.insert(directive::OBJECT_SRC.to_string(), vec![source::SOURCE_NONE.to_string()]);
        directives.insert(
            directive::SCRIPT_SRC.to_string(),
            vec![source::SOURCE_SELF.to_string(), source::SOURCE_NONCE.to_string()],
        );
        directives.insert(directive::UPGRADE_INSECURE_REQUESTS.to_string(), Vec::new());

        Self {
            report_only: false,
            directives,
        }
    }

    pub fn mode(&self) -> HeaderMode {
        if self.report_only {
            HeaderMode::ReportOnly
        } else {
            HeaderMode::Enforce
        }
    }

    /// Rejects entries that a permissive build would silently drop.
    pub fn validate(&self) -> CspResult<()> {
        for (name, sources) in &self.directives {
            let key = normalize_directive(name).ok_or_else(|| {
                CspError::InvalidConfiguration("directive name must not be blank".to_string())
            })?;

            let has_source = sources.iter().any(|source| !source.trim().is_empty());
            if !has_source && !is_valueless(&key) {
                return Err(CspError::InvalidConfiguration(format!(
                    "directive {} requires at least one source",
                    key
                )));
            }
        }

        Ok(())
    }
}

impl Policy {
    /// Build a policy from configuration, dropping blank entries.
    pub fn from_config(config: &PolicyConfig) -> Self {
        let policy = Policy::with_mode(config.mode());
        for (name, sources) in &config.directives {
            let sources: Vec<&str> = sources.iter().map(String::as_str).collect();
            policy.set(name, &sources);
        }
        policy
    }

    /// Validate the configuration, then build a policy from it.
    pub fn try_from_config(config: &PolicyConfig) -> CspResult<Self> {
        config.validate()?;
        Ok(Self::from_config(config))
    }

    /// Snapshot of the current state as configuration
    pub fn to_config(&self) -> PolicyConfig {
        PolicyConfig {
            report_only: self.mode() == HeaderMode::ReportOnly,
            directives: self
                .directives()
                .into_iter()
                .map(|(name, sources)| (name, sources.into_iter().collect()))
                .collect(),
        }
    }
}

impl From<&PolicyConfig> for Policy {
    fn from(config: &PolicyConfig) -> Self {
        Policy::from_config(config)
    }
}
