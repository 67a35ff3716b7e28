// Build script - reads config.yaml at compile time and generates defaults
// This allows changing defaults during development without editing source code

use std::env;
use std::fs;
use std::path::Path;

fn main() {
    // Tell Cargo to rerun if config.yaml changes
    println!("cargo:rerun-if-changed=src/config.yaml");

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("compiled_config.rs");

    // Try to read config.yaml from src/, fall back to hardcoded defaults if not found
    let config = if Path::new("src/config.yaml").exists() {
        let content = fs::read_to_string("src/config.yaml")
            .expect("Failed to read src/config.yaml");
        parse_config(&content)
    } else {
        CompiledConfig::default()
    };

    let generated = format!(
        r#"// Auto-generated from config.yaml at compile time
// Do not edit - modify config.yaml and rebuild instead

pub const SOURCE_ROOT: &str = {source_root:?};
pub const DESTINATION: &str = {destination:?};
pub const MOUNT_POINT: &str = {mount_point:?};
pub const RECORD_FILE: &str = {record_file:?};
pub const SELECTION_FILE: &str = {selection_file:?};

pub const QUALIFYING_PATTERNS: &[&str] = &[
{patterns}
];

pub const LOG_LEVEL: &str = {log_level:?};
"#,
        source_root = config.source_root,
        destination = config.destination,
        mount_point = config.mount_point,
        record_file = config.record_file,
        selection_file = config.selection_file,
        patterns = config.qualifying_patterns
            .iter()
            .map(|p| format!("    {:?},", p))
            .collect::<Vec<_>>()
            .join("\n"),
        log_level = config.log_level,
    );

    fs::write(&dest_path, generated).expect("Failed to write compiled config");
}

struct CompiledConfig {
    source_root: String,
    destination: String,
    mount_point: String,
    record_file: String,
    selection_file: String,
    qualifying_patterns: Vec<String>,
    log_level: String,
}

impl Default for CompiledConfig {
    fn default() -> Self {
        Self {
            source_root: "~/m/music".to_string(),
            destination: "/mnt/player/music".to_string(),
            mount_point: String::new(),
            record_file: "~/.local/share/album-sync/last-synced.json".to_string(),
            selection_file: "~/.local/share/album-sync/selection.yaml".to_string(),
            qualifying_patterns: vec![
                "*.flac".to_string(),
                "*.mp3".to_string(),
            ],
            log_level: "info".to_string(),
        }
    }
}

#[derive(PartialEq)]
enum Section {
    None,
    Paths,
    Patterns,
    Logging,
}

fn parse_config(content: &str) -> CompiledConfig {
    let mut config = CompiledConfig::default();

    // Simple YAML parsing (avoiding external dependencies in build script)
    let mut section = Section::None;

    for line in content.lines() {
        let trimmed = line.trim();

        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        // Top-level keys open a new section
        if !line.starts_with(' ') && !line.starts_with('\t') {
            section = match trimmed {
                "paths:" => Section::Paths,
                "qualifying_patterns:" => {
                    config.qualifying_patterns.clear(); // Start fresh when we see the section
                    Section::Patterns
                }
                "logging:" => Section::Logging,
                _ => Section::None,
            };
            continue;
        }

        if section == Section::Patterns {
            if let Some(item) = trimmed.strip_prefix("- ") {
                config.qualifying_patterns.push(unquote(item).to_string());
            }
            continue;
        }

        if let Some((key, value)) = parse_kv(trimmed) {
            match (&section, key) {
                (Section::Paths, "source_root") => config.source_root = value.to_string(),
                (Section::Paths, "destination") => config.destination = value.to_string(),
                (Section::Paths, "mount_point") => config.mount_point = value.to_string(),
                (Section::Paths, "record_file") => config.record_file = value.to_string(),
                (Section::Paths, "selection_file") => config.selection_file = value.to_string(),
                (Section::Logging, "level") => config.log_level = value.to_string(),
                _ => {}
            }
        }
    }

    config
}

fn parse_kv(line: &str) -> Option<(&str, &str)> {
    let colon_pos = line.find(':')?;
    let key = line[..colon_pos].trim();
    let mut value = line[colon_pos + 1..].trim();

    // Remove inline comments
    if let Some(comment_pos) = value.find(" #") {
        value = value[..comment_pos].trim();
    }

    // Skip if value is empty (section header)
    if value.is_empty() {
        return None;
    }

    Some((key, unquote(value)))
}

fn unquote(s: &str) -> &str {
    s.trim().trim_matches('"').trim_matches('\'')
}
