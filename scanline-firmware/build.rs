//! Build script for scanline-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates board.toml at compile time
//! - Links the emulator core library and stages its ROM and disk images

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Images the firmware embeds, by env var and staged file name
const IMAGES: [(&str, &str); 2] = [("UMAC_ROM", "umac-rom.bin"), ("UMAC_DISC", "umac-disc.bin")];

fn main() {
    setup_linker();
    validate_config();
    link_emulator();
    stage_images();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate board.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=board.toml");

    let config_path = Path::new("board.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: board.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds board.toml as its default configuration.    ║\n\
            ║  Please create one in the scanline-firmware directory.           ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read board.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in board.toml                        ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    validate_required_sections(&config);
    validate_values(&config);

    println!("cargo:warning=board.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Panic with a boxed list of errors, if there are any
fn report(title: &str, errors: &[String]) {
    if errors.is_empty() {
        return;
    }
    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<56} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title,
        errors
            .iter()
            .map(|e| format!("║  • {:<62} ║", e))
            .collect::<Vec<_>>()
            .join("\n")
    );
}

/// Validate that required sections exist
fn validate_required_sections(config: &toml::Value) {
    let errors: Vec<String> = ["video", "input", "bridge"]
        .iter()
        .filter(|name| !matches!(config.get(**name), Some(toml::Value::Table(_))))
        .map(|name| format!("Missing [{}] section", name))
        .collect();

    report("Missing required sections in board.toml", &errors);
}

/// Check an integer key against an inclusive range
fn check_int(
    config: &toml::Value,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => {}
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max))
        }
        Some(_) => errors.push(format!("[{}] {} must be an integer", section, key)),
    }
}

/// Check a boolean key
fn check_bool(config: &toml::Value, section: &str, key: &str, errors: &mut Vec<String>) {
    if let Some(v) = config.get(section).and_then(|s| s.get(key)) {
        if !v.is_bool() {
            errors.push(format!("[{}] {} must be true or false", section, key));
        }
    }
}

/// Check a string key against its allowed values
fn check_choice(
    config: &toml::Value,
    section: &str,
    key: &str,
    choices: &[&str],
    errors: &mut Vec<String>,
) {
    match config.get(section).and_then(|s| s.get(key)) {
        None => {}
        Some(toml::Value::String(v)) if choices.contains(&v.to_ascii_lowercase().as_str()) => {}
        Some(_) => errors.push(format!(
            "[{}] {} must be one of: {}",
            section,
            key,
            choices.join(", ")
        )),
    }
}

/// Validate value types and ranges
fn validate_values(config: &toml::Value) {
    let mut errors = Vec::new();

    check_choice(config, "video", "blank", &["black", "white"], &mut errors);
    check_bool(config, "video", "high_drive", &mut errors);

    check_int(config, "input", "pointer_clamp", 1, 127, &mut errors);
    check_bool(config, "input", "invert_y", &mut errors);
    check_bool(config, "input", "any_button", &mut errors);

    check_int(config, "bridge", "baud", 9_600, 3_000_000, &mut errors);
    check_int(config, "bridge", "link_timeout_ms", 100, 60_000, &mut errors);

    check_int(config, "emulator", "vsync_period_us", 1_000, 100_000, &mut errors);
    check_int(config, "emulator", "second_period_us", 100_000, 10_000_000, &mut errors);

    check_choice(config, "disk", "source", &["flash", "embedded"], &mut errors);
    check_bool(config, "disk", "read_only", &mut errors);

    check_int(config, "status", "blink_ms", 10, 10_000, &mut errors);

    report("Invalid values in board.toml", &errors);
}

/// Link the emulator core static library
fn link_emulator() {
    println!("cargo:rerun-if-env-changed=UMAC_LIB_DIR");

    match env::var("UMAC_LIB_DIR") {
        Ok(dir) => {
            println!("cargo:rustc-link-search=native={}", dir);
            println!("cargo:rustc-link-lib=static=umac");
        }
        Err(_) => {
            println!(
                "cargo:warning=UMAC_LIB_DIR not set; the firmware will not link without libumac.a"
            );
        }
    }
}

/// Copy the ROM and disk images into OUT_DIR for include_bytes!
///
/// A missing image is staged as an empty file so the firmware still builds;
/// it refuses to start the emulator without a ROM.
fn stage_images() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    for (var, name) in IMAGES {
        println!("cargo:rerun-if-env-changed={}", var);
        let dest = out_dir.join(name);

        match env::var(var) {
            Ok(src) => {
                println!("cargo:rerun-if-changed={}", src);
                if let Err(e) = fs::copy(&src, &dest) {
                    panic!("failed to copy {} from {}: {}", var, src, e);
                }
            }
            Err(_) => {
                println!("cargo:warning={} not set; embedding an empty {}", var, name);
                File::create(&dest).unwrap();
            }
        }
    }
}
