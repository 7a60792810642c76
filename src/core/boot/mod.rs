// ─── Boot config ───
// Renders the Ashita boot INI for one launch from a profile.

use crate::core::fsutil::to_host_newlines;
use crate::core::profile::GameProfile;

const TEMPLATE: &str = include_str!("template.ini");

/// Boot file used when the user chose to remember credentials.
pub const PERSISTENT_CONFIG: &str = "mistxi.ini";
/// Boot file for one-off sessions.
pub const SESSION_CONFIG: &str = "mistxi.session.ini";

pub fn config_file_name(credentials_persisted: bool) -> &'static str {
    if credentials_persisted {
        PERSISTENT_CONFIG
    } else {
        SESSION_CONFIG
    }
}

/// Connection details baked into `[ashita.boot] command`.
#[derive(Debug, Clone, Copy)]
pub struct BootTarget<'a> {
    pub ffxi_dir: &'a str,
    pub server_host: &'a str,
    pub username: Option<&'a str>,
    pub password: Option<&'a str>,
}

/// XiLoader arguments. Credentials are only added as a pair, unquoted.
pub fn login_command(server_host: &str, username: Option<&str>, password: Option<&str>) -> String {
    let mut command = format!("--server {}", server_host);
    fn present(v: Option<&str>) -> Option<&str> {
        v.filter(|s| !s.trim().is_empty())
    }
    if let (Some(user), Some(pass)) = (present(username), present(password)) {
        command.push_str(&format!(" --user {} --pass {}", user, pass));
    }
    command
}

/// Value written to registry key `0000`, which predates the window-mode key.
pub fn legacy_window_value(window_mode: i32) -> &'static str {
    match window_mode {
        0 => "1",
        1 => "6",
        _ => "3",
    }
}

fn flag(value: bool) -> String {
    if value { "1" } else { "0" }.to_string()
}

/// Render the complete document. Pure: identical inputs give identical bytes.
///
/// Values are written as given; nothing is range-checked.
pub fn render(profile: &GameProfile, target: &BootTarget<'_>) -> String {
    let p = profile;
    let replacements: [(&str, String); 28] = [
        (
            "{COMMAND}",
            login_command(target.server_host, target.username, target.password),
        ),
        ("{FFXIDIR}", target.ffxi_dir.to_string()),
        ("{WINDOW_MODE}", p.window_mode.to_string()),
        ("{WINDOWED}", legacy_window_value(p.window_mode).to_string()),
        ("{RES_WIDTH}", p.resolution_width.to_string()),
        ("{RES_HEIGHT}", p.resolution_height.to_string()),
        ("{GRAPHICS_QUALITY}", p.graphics_quality.to_string()),
        ("{HARDWARE_MOUSE}", flag(p.hardware_mouse_cursor)),
        ("{MIPMAPPING}", flag(p.mip_mapping)),
        ("{BUMP_MAPPING}", flag(p.bump_mapping)),
        ("{ENV_DIFFUSE}", flag(p.env_diffuse_mapping)),
        ("{MAP_COMPRESSION}", p.map_compression_type.to_string()),
        ("{SOUND_EFFECTS_VOLUME}", p.sound_effects_volume.to_string()),
        ("{BACKBUFFER_COUNT}", p.back_buffer_count.to_string()),
        ("{MULTISAMPLE_TYPE}", p.multi_sample_type.to_string()),
        ("{PRESENTATION_INTERVAL}", p.presentation_interval.to_string()),
        ("{GAMEPAD_ALLOW_BACKGROUND}", flag(p.gamepad_allow_background)),
        ("{GAMEPAD_DISABLE_ENUMERATION}", flag(p.gamepad_disable_enumeration)),
        ("{KEYBOARD_BLOCK_INPUT}", flag(p.keyboard_block_input)),
        ("{KEYBOARD_BLOCK_BINDS}", flag(p.keyboard_block_binds_during_input)),
        ("{KEYBOARD_SILENT_BINDS}", flag(p.keyboard_silent_binds)),
        ("{KEYBOARD_WINDOWS_KEY}", flag(p.keyboard_windows_key_enabled)),
        ("{MOUSE_BLOCK_INPUT}", flag(p.mouse_block_input)),
        ("{MOUSE_UNHOOK}", flag(p.mouse_unhook)),
        ("{LOG_LEVEL}", p.log_level.to_string()),
        ("{CRASH_DUMPS}", flag(p.crash_dumps)),
        ("{ADDONS_SILENT}", flag(p.addons_silent)),
        ("{PLUGINS_SILENT}", flag(p.plugins_silent)),
    ];

    let mut ini = TEMPLATE.to_string();
    for (placeholder, value) in &replacements {
        ini = ini.replace(placeholder, value);
    }
    to_host_newlines(&ini)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target<'a>(user: Option<&'a str>, pass: Option<&'a str>) -> BootTarget<'a> {
        BootTarget {
            ffxi_dir: r"C:\Program Files (x86)\PlayOnline\SquareEnix\FINAL FANTASY XI",
            server_host: "play.mistxi.com",
            username: user,
            password: pass,
        }
    }

    fn line<'a>(ini: &'a str, key: &str) -> Option<&'a str> {
        ini.lines()
            .find(|l| l.starts_with(key) && l[key.len()..].trim_start().starts_with('='))
            .map(|l| l.split_once('=').map(|(_, v)| v.trim()).unwrap_or(""))
    }

    #[test]
    fn credentials_only_added_as_pair() {
        assert_eq!(login_command("h", Some("u"), Some("p")), "--server h --user u --pass p");
        assert_eq!(login_command("h", Some("u"), None), "--server h");
        assert_eq!(login_command("h", Some("u"), Some("  ")), "--server h");
        assert_eq!(login_command("h", None, None), "--server h");
    }

    #[test]
    fn default_profile_renders_expected_values() {
        let ini = render(&GameProfile::default(), &target(Some("bob"), Some("hunter2")));

        assert_eq!(
            line(&ini, "command"),
            Some("--server play.mistxi.com --user bob --pass hunter2")
        );
        assert_eq!(line(&ini, "file"), Some(r".\bootloader\xiloader.exe"));
        assert_eq!(line(&ini, "script"), Some("mistxi.txt"));
        assert_eq!(line(&ini, "0000"), Some("3"));
        assert_eq!(line(&ini, "0001"), Some("1920"));
        assert_eq!(line(&ini, "0034"), Some("3"));
        assert_eq!(line(&ini, "0037"), Some("1920"));
        assert_eq!(line(&ini, "0019"), Some("1"));
        assert_eq!(line(&ini, "0022"), Some("0"));
        assert_eq!(
            line(&ini, "0042"),
            Some(r"C:\Program Files (x86)\PlayOnline\SquareEnix\FINAL FANTASY XI")
        );
        assert_eq!(line(&ini, "mouse.unhook"), Some("1"));
        assert_eq!(line(&ini, "addons.silent"), Some("1"));
        assert!(!ini.contains('{'));
    }

    #[test]
    fn window_mode_maps_both_registry_keys() {
        for (mode, legacy) in [(0, "1"), (1, "6"), (3, "3"), (7, "3")] {
            let profile = GameProfile {
                window_mode: mode,
                ..GameProfile::default()
            };
            let ini = render(&profile, &target(None, None));
            assert_eq!(line(&ini, "0000"), Some(legacy));
            assert_eq!(line(&ini, "0034"), Some(mode.to_string().as_str()));
        }
    }

    #[test]
    fn rendering_is_deterministic() {
        let profile = GameProfile {
            back_buffer_count: 2,
            presentation_interval: 1,
            ..GameProfile::default()
        };
        let a = render(&profile, &target(None, None));
        let b = render(&profile, &target(None, None));
        assert_eq!(a, b);
        assert_eq!(line(&a, "presentparams.backbuffercount"), Some("2"));
        assert_eq!(line(&a, "command"), Some("--server play.mistxi.com"));
    }

    #[test]
    fn config_name_tracks_persistence() {
        assert_eq!(config_file_name(true), "mistxi.ini");
        assert_eq!(config_file_name(false), "mistxi.session.ini");
    }
}
