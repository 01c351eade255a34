//! Vision configuration.
//!
//! The engine reads and writes one value per role: the name of the provider
//! selected for it. [`VisionSettings`] stores those names with optional named
//! profiles layered on top of the base selection, and persists them as TOML:
//!
//! ```toml
//! [vision]
//! highlighter = "defaultHighlighter"
//!
//! [profiles.reading]
//! magnifier = "none"
//! colorEnhancer = "screenCurtain"
//! ```
//!
//! A profile value overrides the base value for the same role. The special
//! name `none` (case-insensitive) selects no provider, which lets a profile
//! switch a role off explicitly.
//!
//! The handler only sees the [`ConfigStore`] trait. Hosts that need to keep
//! reading the settings after handing them to the handler use
//! [`SharedSettings`].

use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use horizon_vision_core::logging::targets;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::role::Role;

/// Provider name meaning "no provider for this role".
pub const NO_PROVIDER: &str = "none";

/// Whether `name` selects no provider.
#[inline]
pub fn is_no_provider(name: &str) -> bool {
    name.is_empty() || name.eq_ignore_ascii_case(NO_PROVIDER)
}

/// Read/write access to the per-role provider selection.
pub trait ConfigStore {
    /// The provider configured for `role`, or `None` if the role is off.
    fn provider_for(&self, role: Role) -> Option<String>;

    /// Record the provider selected for `role`. `None` turns the role off.
    fn set_provider_for(&mut self, role: Role, name: Option<&str>);
}

/// A provider name per role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RoleSelection {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub magnifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlighter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color_enhancer: Option<String>,
}

impl RoleSelection {
    /// The raw value stored for `role`.
    pub fn get(&self, role: Role) -> Option<&str> {
        match role {
            Role::Magnifier => self.magnifier.as_deref(),
            Role::Highlighter => self.highlighter.as_deref(),
            Role::ColorEnhancer => self.color_enhancer.as_deref(),
        }
    }

    /// Replace the raw value stored for `role`.
    pub fn set(&mut self, role: Role, name: Option<String>) {
        let slot = match role {
            Role::Magnifier => &mut self.magnifier,
            Role::Highlighter => &mut self.highlighter,
            Role::ColorEnhancer => &mut self.color_enhancer,
        };
        *slot = name;
    }
}

/// Persisted vision settings with optional profiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSettings {
    /// Base selection, used when no profile is active or the active profile
    /// leaves a role unset.
    pub vision: RoleSelection,
    /// Named profiles.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub profiles: BTreeMap<String, RoleSelection>,
    #[serde(skip)]
    active_profile: Option<String>,
}

impl VisionSettings {
    /// Empty settings: no provider for any role.
    pub fn new() -> Self {
        Self::default()
    }

    /// The active profile, if any.
    pub fn active_profile(&self) -> Option<&str> {
        self.active_profile.as_deref()
    }

    /// The effective provider for `role`, with the active profile applied.
    pub fn provider_for(&self, role: Role) -> Option<&str> {
        self.active_profile
            .as_ref()
            .and_then(|name| self.profiles.get(name))
            .and_then(|profile| profile.get(role))
            .or_else(|| self.vision.get(role))
            .filter(|name| !is_no_provider(name))
    }

    /// Record the provider for `role` in the active profile, or in the base
    /// selection when no profile is active.
    pub fn set_provider_for(&mut self, role: Role, name: Option<&str>) {
        let profile = self
            .active_profile
            .as_ref()
            .and_then(|active| self.profiles.get_mut(active));
        match profile {
            // An unset profile value falls back to the base, so "off" has to
            // be stored explicitly.
            Some(profile) => profile.set(role, Some(name.unwrap_or(NO_PROVIDER).to_owned())),
            None => self.vision.set(role, name.map(str::to_owned)),
        }
    }

    /// Add or replace a profile. Returns the previous profile of that name.
    pub fn add_profile(
        &mut self,
        name: impl Into<String>,
        selection: RoleSelection,
    ) -> Option<RoleSelection> {
        self.profiles.insert(name.into(), selection)
    }

    /// Remove a profile, deactivating it if it is active.
    pub fn remove_profile(&mut self, name: &str) -> Option<RoleSelection> {
        if self.active_profile.as_deref() == Some(name) {
            self.active_profile = None;
        }
        self.profiles.remove(name)
    }

    /// Activate the profile `name`, or the base selection for `None`.
    ///
    /// Returns whether the effective provider of any role changed.
    pub fn switch_profile(&mut self, name: Option<&str>) -> Result<bool, ConfigError> {
        if let Some(name) = name
            && !self.profiles.contains_key(name)
        {
            return Err(ConfigError::UnknownProfile(name.to_owned()));
        }
        let before = self.effective();
        self.active_profile = name.map(str::to_owned);
        let changed = before != self.effective();
        tracing::debug!(
            target: targets::CONFIG,
            profile = name.unwrap_or("(base)"),
            changed,
            "switched configuration profile"
        );
        Ok(changed)
    }

    fn effective(&self) -> [Option<String>; 3] {
        Role::ALL.map(|role| self.provider_for(role).map(str::to_owned))
    }

    /// Parse settings from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Serialize settings to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Load settings from a TOML file.
    pub fn load_toml(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let settings = Self::from_toml_str(&content)?;
        tracing::debug!(target: targets::CONFIG, path = %path.display(), "loaded vision settings");
        Ok(settings)
    }

    /// Save settings to a TOML file.
    ///
    /// The file is written atomically using a temporary file in the same
    /// directory and a rename.
    pub fn save_toml(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = self.to_toml_string()?;
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));

        let mut file = tempfile::NamedTempFile::new_in(parent).map_err(|e| ConfigError::io(path, e))?;
        file.write_all(content.as_bytes())
            .map_err(|e| ConfigError::io(path, e))?;
        file.as_file()
            .sync_all()
            .map_err(|e| ConfigError::io(path, e))?;
        file.persist(path)
            .map_err(|e| ConfigError::io(path, e.error))?;

        tracing::debug!(target: targets::CONFIG, path = %path.display(), "saved vision settings");
        Ok(())
    }
}

impl ConfigStore for VisionSettings {
    fn provider_for(&self, role: Role) -> Option<String> {
        VisionSettings::provider_for(self, role).map(str::to_owned)
    }

    fn set_provider_for(&mut self, role: Role, name: Option<&str>) {
        VisionSettings::set_provider_for(self, role, name);
    }
}

/// Settings shared between the handler and the host.
pub type SharedSettings = Arc<RwLock<VisionSettings>>;

impl ConfigStore for SharedSettings {
    fn provider_for(&self, role: Role) -> Option<String> {
        self.read().provider_for(role).map(str::to_owned)
    }

    fn set_provider_for(&mut self, role: Role, name: Option<&str>) {
        self.write().set_provider_for(role, name);
    }
}
