//! Doctor command - verify credentials and configuration.

use crate::cli::Output;
use crate::config::{Settings, ASSEMBLYAI_KEY_VAR, OPENAI_KEY_VAR};
use console::style;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
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
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Referent Doctor");
    println!();
    println!("Checking credentials and configuration...\n");

    let mut checks = Vec::new();

    println!("{}", style("API Configuration").bold());
    let key_checks = check_api_keys(settings);
    for check in &key_checks {
        check.print();
    }
    checks.extend(key_checks);

    println!();

    println!("{}", style("Configuration").bold());
    let config_checks = check_configuration(settings);
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    let errors = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Error)
        .count();
    let warnings = checks
        .iter()
        .filter(|c| c.status == CheckStatus::Warning)
        .count();

    if errors > 0 {
        Output::error(&format!(
            "{} error(s) found. Please fix them before using Referent.",
            errors
        ));
        std::process::exit(1);
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! Referent is ready to use.");
    }

    Ok(())
}

fn check_api_keys(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    results.push(check_env_key(
        ASSEMBLYAI_KEY_VAR,
        "Set with: export ASSEMBLYAI_API_KEY='...'",
    ));

    let openai = check_env_key(OPENAI_KEY_VAR, "Set with: export OPENAI_API_KEY='sk-...'");
    if !settings.summarize.enabled && openai.status == CheckStatus::Error {
        // missing summarizer key is harmless while summarize is off
        results.push(CheckResult::warning(
            OPENAI_KEY_VAR,
            "not set (summarize is disabled, so not required)",
            "Set it before re-enabling summarize in config",
        ));
    } else {
        results.push(openai);
    }

    results
}

fn check_env_key(name: &str, hint: &str) -> CheckResult {
    match std::env::var(name) {
        Ok(key) if key.trim().is_empty() => CheckResult::error(name, "empty", hint),
        Ok(key) if key.chars().count() > 12 => {
            // byte indexes can split a multi-byte character
            let chars: Vec<char> = key.chars().collect();
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            CheckResult::ok(name, &format!("configured ({}...{})", head, tail))
        }
        Ok(_) => CheckResult::warning(name, "set but unusually short", hint),
        Err(_) => CheckResult::error(name, "not set", hint),
    }
}

fn check_configuration(settings: &Settings) -> Vec<CheckResult> {
    let mut results = Vec::new();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        results.push(CheckResult::ok(
            "Config file",
            &format!("{}", config_path.display()),
        ));
    } else {
        results.push(CheckResult::warning(
            "Config file",
            "using defaults",
            "Create one with: referent config show > config.toml (then edit)",
        ));
    }

    let transcription = &settings.transcription;
    if transcription.poll_interval_secs == 0 {
        results.push(CheckResult::error(
            "Polling",
            "poll_interval_secs is 0, which would spin against the provider",
            "Set transcription.poll_interval_secs to 1 or more",
        ));
    } else if transcription.max_wait_secs <= transcription.poll_interval_secs {
        results.push(CheckResult::error(
            "Polling",
            &format!(
                "max_wait_secs ({}) leaves no room for a {}s poll interval",
                transcription.max_wait_secs, transcription.poll_interval_secs
            ),
            "Raise transcription.max_wait_secs well above the poll interval",
        ));
    } else {
        results.push(CheckResult::ok(
            "Polling",
            &format!(
                "every {}s, giving up after {}s",
                transcription.poll_interval_secs, transcription.max_wait_secs
            ),
        ));
    }

    if settings.streaming.max_in_flight == 0 {
        results.push(CheckResult::warning(
            "Streaming",
            "max_in_flight is 0; the server will treat it as 1",
            "Set streaming.max_in_flight to 1 or more",
        ));
    } else {
        results.push(CheckResult::ok(
            "Streaming",
            &format!(
                "up to {} chunks in flight, {} on close",
                settings.streaming.max_in_flight, settings.streaming.close_policy
            ),
        ));
    }

    results
}
