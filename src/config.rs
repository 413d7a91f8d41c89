use chrono::format::{Item, StrftimeItems};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::path::Path;

use crate::composer::{Audience, AudiencePolicy};
use crate::error::{GuideError, Result};

#[derive(Debug, Clone, Deserialize)]
pub struct GuideConfig {
    /// Fixed line appended to every emergency block.
    #[serde(default = "default_poison_control")]
    pub poison_control: String,

    /// strftime format of the generation timestamp in the footer.
    #[serde(default = "default_footer_format")]
    pub footer_format: String,

    /// Per-audience overrides of the built-in policies.
    #[serde(default)]
    pub audiences: BTreeMap<Audience, AudiencePolicy>,
}

fn default_poison_control() -> String {
    "**Poison Control:** 1-800-222-1222".to_string()
}

fn default_footer_format() -> String {
    "%B %-d, %Y at %H:%M UTC".to_string()
}

impl Default for GuideConfig {
    fn default() -> Self {
        Self {
            poison_control: default_poison_control(),
            footer_format: default_footer_format(),
            audiences: BTreeMap::new(),
        }
    }
}

impl GuideConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: GuideConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.poison_control.trim().is_empty() {
            return Err(GuideError::InvalidConfig(
                "poison_control must not be empty".to_string(),
            ));
        }
        if StrftimeItems::new(&self.footer_format).any(|item| matches!(item, Item::Error)) {
            return Err(GuideError::InvalidConfig(format!(
                "invalid footer_format '{}'",
                self.footer_format
            )));
        }
        Ok(())
    }

    /// Policy for `audience`: the configured override or the built-in one.
    pub fn policy(&self, audience: Audience) -> Cow<'_, AudiencePolicy> {
        match self.audiences.get(&audience) {
            Some(policy) => Cow::Borrowed(policy),
            None => Cow::Owned(AudiencePolicy::default_for(audience)),
        }
    }
}
