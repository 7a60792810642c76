use serde::{Deserialize, Serialize};
use tracing::info;

use super::model::GameProfile;
use crate::core::error::{LauncherError, LauncherResult};

pub const DEFAULT_PROFILE_NAME: &str = "Default";
const NEW_PROFILE_BASE: &str = "New Profile";

/// Add-on that enforces the FPS cap in game.
pub const FPS_ADDON: &str = "fps";
/// Plugin that hosts every Lua add-on.
pub const ADDONS_PLUGIN: &str = "addons";

/// The saved profiles plus which one is active.
///
/// Names are unique and non-empty, and the set is never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ProfileSet {
    profiles: Vec<GameProfile>,
    active_profile_name: String,
}

impl Default for ProfileSet {
    fn default() -> Self {
        Self {
            profiles: vec![GameProfile::named(DEFAULT_PROFILE_NAME)],
            active_profile_name: DEFAULT_PROFILE_NAME.into(),
        }
    }
}

impl ProfileSet {
    /// Repair whatever a hand-edited or older state file left behind.
    pub fn normalize(&mut self) {
        self.profiles.retain(|p| !p.name.trim().is_empty());
        let mut seen = std::collections::HashSet::new();
        self.profiles.retain(|p| seen.insert(p.name.clone()));
        if self.profiles.is_empty() {
            self.profiles.push(GameProfile::named(DEFAULT_PROFILE_NAME));
        }
        if self.find(&self.active_profile_name).is_none() {
            self.active_profile_name = self.profiles[0].name.clone();
        }
    }

    pub fn profiles(&self) -> &[GameProfile] {
        &self.profiles
    }

    pub fn names(&self) -> Vec<&str> {
        self.profiles.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn active_name(&self) -> &str {
        &self.active_profile_name
    }

    /// Active profile, falling back to the first one when the pointer dangles.
    pub fn active(&self) -> &GameProfile {
        self.find(&self.active_profile_name)
            .or_else(|| self.profiles.first())
            .unwrap_or_else(|| default_profile())
    }

    pub fn get(&self, name: &str) -> LauncherResult<&GameProfile> {
        self.find(name)
            .ok_or_else(|| LauncherError::ProfileNotFound(name.to_string()))
    }

    fn find(&self, name: &str) -> Option<&GameProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    fn get_mut(&mut self, name: &str) -> LauncherResult<&mut GameProfile> {
        self.profiles
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| LauncherError::ProfileNotFound(name.to_string()))
    }

    /// Add a default-valued profile under the first free `New Profile[ N]` name.
    pub fn create(&mut self) -> &GameProfile {
        let mut name = NEW_PROFILE_BASE.to_string();
        let mut counter = 1;
        while self.find(&name).is_some() {
            name = format!("{} {}", NEW_PROFILE_BASE, counter);
            counter += 1;
        }
        info!("Created profile '{}'", name);
        self.profiles.push(GameProfile::named(name));
        let idx = self.profiles.len() - 1;
        &self.profiles[idx]
    }

    /// Replace the settings of an existing profile, keeping its name.
    pub fn update(&mut self, profile: GameProfile) -> LauncherResult<()> {
        let slot = self.get_mut(&profile.name)?;
        *slot = profile;
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> LauncherResult<()> {
        let new = new.trim();
        if new.is_empty() {
            return Err(LauncherError::EmptyProfileName);
        }
        if old == new {
            return self.get(old).map(|_| ());
        }
        if self.find(new).is_some() {
            return Err(LauncherError::ProfileAlreadyExists(new.to_string()));
        }
        self.get_mut(old)?.name = new.to_string();
        if self.active_profile_name == old {
            self.active_profile_name = new.to_string();
        }
        info!("Renamed profile '{}' to '{}'", old, new);
        Ok(())
    }

    pub fn delete(&mut self, name: &str) -> LauncherResult<()> {
        self.get(name)?;
        if self.profiles.len() <= 1 {
            return Err(LauncherError::LastProfile);
        }
        self.profiles.retain(|p| p.name != name);
        if self.active_profile_name == name {
            self.active_profile_name = self.profiles[0].name.clone();
        }
        info!("Deleted profile '{}'", name);
        Ok(())
    }

    pub fn activate(&mut self, name: &str) -> LauncherResult<()> {
        self.get(name)?;
        self.active_profile_name = name.to_string();
        Ok(())
    }

    /// Set the FPS tier. Returns `true` when the load script must be regenerated.
    pub fn set_fps_cap(&mut self, name: &str, tier: i32) -> LauncherResult<bool> {
        let profile = self.get_mut(name)?;
        let mut changed = profile.fps_cap != tier;
        profile.fps_cap = tier;
        if tier > 0 && !contains(&profile.enabled_addons, FPS_ADDON) {
            profile.enabled_addons.push(FPS_ADDON.to_string());
            info!("Enabled '{}' add-on for FPS cap", FPS_ADDON);
            changed = true;
        }
        Ok(changed)
    }

    /// Toggle an add-on. Returns `true` when the load script must be regenerated.
    ///
    /// Enabling any add-on also enables the host plugin. The FPS add-on stays
    /// on while a cap is set.
    pub fn set_addon_enabled(
        &mut self,
        name: &str,
        addon: &str,
        enabled: bool,
    ) -> LauncherResult<bool> {
        let profile = self.get_mut(name)?;
        let mut changed = false;
        if enabled {
            if !contains(&profile.enabled_addons, addon) {
                profile.enabled_addons.push(addon.to_string());
                changed = true;
            }
            if !contains(&profile.enabled_plugins, ADDONS_PLUGIN) {
                profile.enabled_plugins.push(ADDONS_PLUGIN.to_string());
                changed = true;
            }
        } else {
            if addon.eq_ignore_ascii_case(FPS_ADDON) && profile.fps_cap > 0 {
                return Ok(false);
            }
            let before = profile.enabled_addons.len();
            profile.enabled_addons.retain(|a| a != addon);
            changed = before != profile.enabled_addons.len();
        }
        Ok(changed)
    }

    /// Toggle a plugin. Returns `true` when the load script must be regenerated.
    pub fn set_plugin_enabled(
        &mut self,
        name: &str,
        plugin: &str,
        enabled: bool,
    ) -> LauncherResult<bool> {
        let profile = self.get_mut(name)?;
        if enabled {
            if contains(&profile.enabled_plugins, plugin) {
                return Ok(false);
            }
            profile.enabled_plugins.push(plugin.to_string());
            return Ok(true);
        }
        let before = profile.enabled_plugins.len();
        profile.enabled_plugins.retain(|p| p != plugin);
        Ok(before != profile.enabled_plugins.len())
    }
}

fn contains(list: &[String], item: &str) -> bool {
    list.iter().any(|s| s == item)
}

fn default_profile() -> &'static GameProfile {
    static DEFAULT: std::sync::OnceLock<GameProfile> = std::sync::OnceLock::new();
    DEFAULT.get_or_init(|| GameProfile::named(DEFAULT_PROFILE_NAME))
}
