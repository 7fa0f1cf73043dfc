//! Doctor command - verify system requirements and configuration.

use crate::cli::Output;
use crate::config::{
    Settings, ELEVENLABS_KEY_ENV, OPENAI_KEY_ENV, SCRIPT_KEY_ENV, SPEECH_KEY_ENV,
    UNDERSTANDING_KEY_ENV,
};
use console::style;
use std::path::Path;
use std::process::Command;

/// Outcome of one diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

/// One diagnostic line with an optional fix-it hint.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

impl CheckResult {
    fn new(status: CheckStatus, name: &str, message: &str, hint: Option<&str>) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.to_string(),
            hint: hint.map(str::to_string),
        }
    }

    fn ok(name: &str, message: &str) -> Self {
        Self::new(CheckStatus::Ok, name, message, None)
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Warning, name, message, Some(hint))
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self::new(CheckStatus::Error, name, message, Some(hint))
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };
        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);
        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub fn run_doctor(settings: &Settings, config_path: &Path) -> anyhow::Result<()> {
    Output::header("Podsmith Doctor");
    println!("\nChecking tools, keys and directories...\n");

    let mut checks = Vec::new();
    let mut section = |title: &str, results: Vec<CheckResult>| {
        println!("{}", style(title).bold());
        for check in &results {
            check.print();
        }
        println!();
        checks.extend(results);
    };

    section(
        "External Tools",
        vec![check_tool(&settings.ingestion.yt_dlp_path)],
    );
    section("API Configuration", check_credentials(settings));
    section("Directories", check_directories(settings));
    section("Configuration", vec![check_config_file(config_path)]);

    let count = |status: CheckStatus| checks.iter().filter(|c| c.status == status).count();
    let (errors, warnings) = (count(CheckStatus::Error), count(CheckStatus::Warning));

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Fix them or use --offline.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Podsmith is ready to use.");
    }

    Ok(())
}

/// yt-dlp is only needed for video sources, so a missing binary is a warning.
fn check_tool(name: &str) -> CheckResult {
    let hint = install_hint_ytdlp();
    match Command::new(name).arg("--version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok(name, &version)
        }
        Ok(_) => CheckResult::warning(name, "installed but not working", hint),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CheckResult::warning(name, "not found (video sources unavailable)", hint)
        }
        Err(e) => CheckResult::warning(name, &format!("error: {}", e), hint),
    }
}

/// One result per back-end key.
fn check_credentials(settings: &Settings) -> Vec<CheckResult> {
    let credentials = settings.credentials();
    vec![
        check_key(
            "Understanding key",
            credentials.understanding_api_key.as_deref(),
            UNDERSTANDING_KEY_ENV,
            OPENAI_KEY_ENV,
        ),
        check_key(
            "Script key",
            credentials.script_api_key.as_deref(),
            SCRIPT_KEY_ENV,
            OPENAI_KEY_ENV,
        ),
        check_key(
            "Speech key",
            credentials.speech_api_key.as_deref(),
            SPEECH_KEY_ENV,
            ELEVENLABS_KEY_ENV,
        ),
    ]
}

fn check_key(name: &str, key: Option<&str>, primary: &str, fallback: &str) -> CheckResult {
    match key {
        Some(key) => CheckResult::ok(name, &format!("configured ({})", mask_key(key))),
        None => CheckResult::error(
            name,
            "not set",
            &format!("Set {} or {}, or add it to the config file", primary, fallback),
        ),
    }
}

/// Show only the ends of a key.
pub(crate) fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 12 {
        return "***".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

fn check_directories(settings: &Settings) -> Vec<CheckResult> {
    [
        ("Output directory", settings.output_dir()),
        ("Temp directory", settings.temp_dir()),
    ]
    .into_iter()
    .map(|(name, dir)| {
        if dir.is_dir() {
            CheckResult::ok(name, &dir.display().to_string())
        } else if dir.exists() {
            CheckResult::error(
                name,
                &format!("{} is not a directory", dir.display()),
                "Point the setting at a directory",
            )
        } else {
            CheckResult::warning(
                name,
                &format!("{} (will be created)", dir.display()),
                "Directory will be created on first use",
            )
        }
    })
    .collect()
}

fn check_config_file(config_path: &Path) -> CheckResult {
    if config_path.exists() {
        CheckResult::ok("Config file", &config_path.display().to_string())
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            "Create with: podsmith config init",
        )
    }
}

/// Platform-specific install hint for yt-dlp.
fn install_hint_ytdlp() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install yt-dlp"
    } else if cfg!(target_os = "linux") {
        "Install with: pip install yt-dlp (or your package manager)"
    } else {
        "Install from: https://github.com/yt-dlp/yt-dlp"
    }
}
