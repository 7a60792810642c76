use chrono::NaiveDateTime;

use crate::core::fsutil::to_host_newlines;

const RULE: &str = "##########################################################################";

/// What goes into `scripts/mistxi.txt`.
#[derive(Debug, Clone)]
pub struct ScriptInputs<'a> {
    pub plugins: &'a [String],
    pub addons: &'a [String],
    /// 0 leaves the frame rate alone.
    pub fps_cap: i32,
    pub generated_at: NaiveDateTime,
}

/// Render the Ashita startup script.
///
/// Plugins load before the wait so add-ons see them; the FPS command comes
/// last because it is handled by the `fps` add-on. The initialization wait is
/// emitted even when both lists are empty.
pub fn render_script(inputs: &ScriptInputs<'_>) -> String {
    let mut lines: Vec<String> = vec![
        RULE.to_string(),
        "# MistXI Launcher - Auto-generated Ashita script".to_string(),
        format!(
            "# Generated: {}",
            inputs.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        RULE.to_string(),
        String::new(),
    ];

    if !inputs.plugins.is_empty() {
        lines.push("# Load Plugins".to_string());
        lines.extend(inputs.plugins.iter().map(|p| format!("/load {}", p)));
        lines.push(String::new());
    }

    lines.extend(
        [
            RULE,
            "# Wait for initialization",
            "#",
            "# Important: This wait is required! Without it, addons will not",
            "# load properly or see commands in this file!",
            RULE,
            "/wait 3",
            RULE,
            "",
        ]
        .iter()
        .map(|l| l.to_string()),
    );

    if !inputs.addons.is_empty() {
        lines.push("# Load Addons".to_string());
        lines.extend(inputs.addons.iter().map(|a| format!("/addon load {}", a)));
        lines.push(String::new());
    }

    if inputs.fps_cap > 0 {
        lines.push("# FPS Cap".to_string());
        lines.push("/wait 3".to_string());
        lines.push(format!("/fps {}", inputs.fps_cap));
    }

    let mut out = String::new();
    for line in &lines {
        out.push_str(line);
        out.push('\n');
    }
    to_host_newlines(&out)
}
