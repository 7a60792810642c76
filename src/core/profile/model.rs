use serde::{Deserialize, Serialize};

/// Display mode stored in the profile as its raw integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    Fullscreen,
    Windowed,
    Borderless,
}

impl WindowMode {
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(WindowMode::Fullscreen),
            1 => Some(WindowMode::Windowed),
            3 => Some(WindowMode::Borderless),
            _ => None,
        }
    }

    pub fn raw(self) -> i32 {
        match self {
            WindowMode::Fullscreen => 0,
            WindowMode::Windowed => 1,
            WindowMode::Borderless => 3,
        }
    }
}

/// Named bag of client settings persisted in `state.json`.
///
/// Keys are PascalCase to stay readable by launchers that wrote the file
/// before this one. Missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct GameProfile {
    pub name: String,
    pub username: Option<String>,

    // ── Display ──
    pub resolution_width: i32,
    pub resolution_height: i32,
    pub windowed: bool,
    /// 0 fullscreen, 1 windowed, 3 borderless. Other values pass through untouched.
    pub window_mode: i32,

    // ── Graphics ──
    /// 0-6
    pub graphics_quality: i32,
    pub hardware_mouse_cursor: bool,
    pub mip_mapping: bool,
    pub bump_mapping: bool,
    pub env_diffuse_mapping: bool,
    pub environment_animations: i32,
    pub texture_compression: i32,
    pub map_texture_compression: i32,
    pub font_compression: i32,
    pub graphics_stabilization: i32,

    // ── Direct3D8 ──
    pub back_buffer_count: i32,
    pub multi_sample_type: i32,
    /// 0 uncapped, 1 = 60fps, 2 = 30fps
    pub fps_cap: i32,
    pub presentation_interval: i32,

    // ── Visual ──
    pub show_opening_movie: bool,
    pub simplified_char_creation: bool,
    pub gamma_base: i32,
    pub maintain_aspect_ratio: bool,

    // ── Audio ──
    pub sound_enabled: bool,
    pub sound_effects_volume: i32,
    pub sound_always_on: bool,

    // ── Input ──
    pub keyboard_block_input: bool,
    pub keyboard_block_binds_during_input: bool,
    pub keyboard_silent_binds: bool,
    pub keyboard_windows_key_enabled: bool,
    pub mouse_block_input: bool,
    pub mouse_unhook: bool,
    pub gamepad_allow_background: bool,
    pub gamepad_disable_enumeration: bool,

    // ── Map ──
    pub map_compression_type: i32,

    // ── Diagnostics ──
    pub log_level: i32,
    pub crash_dumps: bool,
    pub addons_silent: bool,
    pub plugins_silent: bool,

    // ── Extensions ──
    pub enabled_addons: Vec<String>,
    pub enabled_plugins: Vec<String>,
}

impl GameProfile {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn window_mode_kind(&self) -> Option<WindowMode> {
        WindowMode::from_raw(self.window_mode)
    }
}

impl Default for GameProfile {
    fn default() -> Self {
        Self {
            name: "Default".into(),
            username: None,
            resolution_width: 1920,
            resolution_height: 1080,
            windowed: true,
            window_mode: 3,
            graphics_quality: 4,
            hardware_mouse_cursor: true,
            mip_mapping: true,
            bump_mapping: false,
            env_diffuse_mapping: false,
            environment_animations: 2,
            texture_compression: 2,
            map_texture_compression: 1,
            font_compression: 2,
            graphics_stabilization: 0,
            back_buffer_count: -1,
            multi_sample_type: -1,
            fps_cap: 0,
            presentation_interval: -1,
            show_opening_movie: false,
            simplified_char_creation: false,
            gamma_base: 0,
            maintain_aspect_ratio: false,
            sound_enabled: true,
            sound_effects_volume: 20,
            sound_always_on: true,
            keyboard_block_input: false,
            keyboard_block_binds_during_input: true,
            keyboard_silent_binds: false,
            keyboard_windows_key_enabled: false,
            mouse_block_input: false,
            mouse_unhook: true,
            gamepad_allow_background: false,
            gamepad_disable_enumeration: false,
            map_compression_type: 2,
            log_level: 5,
            crash_dumps: true,
            addons_silent: true,
            plugins_silent: true,
            enabled_addons: Vec::new(),
            enabled_plugins: Vec::new(),
        }
    }
}
