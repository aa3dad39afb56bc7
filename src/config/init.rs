use anyhow::{Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use crate::config::{get_config_path, Config, InputsConfig};
use crate::funding::{Mechanism, RoundConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Keep asking until the answer parses and passes `check`.
fn prompt_parsed<T, F>(message: &str, default: &str, check: F) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&T) -> Result<(), String>,
{
    loop {
        let input = prompt_with_default(message, default)?;
        match input.parse::<T>() {
            Ok(v) => match check(&v) {
                Ok(()) => return Ok(v),
                Err(e) => println!("  Invalid: {}. Try again.", e),
            },
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

fn non_negative(v: &f64) -> Result<(), String> {
    if v.is_finite() && *v >= 0.0 {
        Ok(())
    } else {
        Err("must be a non-negative number".to_string())
    }
}

fn cap_range(v: &f64) -> Result<(), String> {
    if *v > 0.0 && *v <= 1.0 {
        Ok(())
    } else {
        Err("must be greater than 0 and at most 1".to_string())
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Tunable QF Round Wizard");
    println!("=======================");
    println!();

    // 1. Inputs
    typewriter("First, where does the round data live? Tables can be .csv or .json.");
    typewriter("Relative paths are resolved against the directory the config is saved in.");
    let contributions = loop {
        let c = prompt("Contributions table: ")?;
        if !c.is_empty() {
            break PathBuf::from(c);
        }
        println!("  Contributions table is required.");
    };
    let boosts = prompt("Boosts table (leave empty if nobody is boosted): ")?;
    let boosts = (!boosts.is_empty()).then(|| PathBuf::from(boosts));

    // 2. Round parameters
    println!();
    let defaults = RoundConfig::default();
    let configure_round = prompt_yes_no("Configure round parameters? (n accepts defaults)", true)?;

    let round = if configure_round {
        println!();
        typewriter("The mechanism decides how contributions turn into a project's score:");
        typewriter("  Quadratic Funding  -- rewards many small contributors");
        typewriter("  Direct Donations   -- proportional to money raised");
        typewriter("  Cluster Mapping    -- like QF, but identical portfolios count once");
        let mechanism: Mechanism =
            prompt_parsed("Mechanism", defaults.mechanism.label(), |_| Ok(()))?;

        println!();
        typewriter("The matching pool is split across projects in proportion to their score.");
        let matching_pool: f64 =
            prompt_parsed("Matching pool", &defaults.matching_pool.to_string(), non_negative)?;

        println!();
        typewriter("The cap limits how much of the pool a single project can take (0.2 = 20%).");
        let matching_percentage_cap: f64 = prompt_parsed(
            "Matching percentage cap",
            &defaults.matching_percentage_cap.to_string(),
            cap_range,
        )?;

        println!();
        typewriter("Boosted contributions are scaled by 1 + coefficient * total_boost.");
        typewriter("Use 0 to ignore boosts.");
        let boost_coefficient: f64 = prompt_parsed(
            "Boost coefficient",
            &defaults.boost_coefficient.to_string(),
            non_negative,
        )?;

        RoundConfig {
            mechanism,
            matching_pool,
            matching_percentage_cap,
            boost_coefficient,
            ..defaults
        }
    } else {
        defaults
    };

    // 3. Config path
    let default_config_path = match default_path {
        Some(path) => path,
        None => get_config_path()?,
    };
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    // Check if file already exists
    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 4. Write config
    let config = Config {
        inputs: InputsConfig {
            contributions: Some(contributions),
            boosts,
            ..InputsConfig::default()
        },
        round,
    };

    let yaml = serde_saphyr::to_string(&config)
        .map_err(|e| anyhow::anyhow!("Failed to serialize config: {}", e))?;

    // Create parent directories
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }

    std::fs::write(&config_path, &yaml)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!();
    println!("Config written to {}", config_path.display());
    typewriter("Header names and the negative matching, redistribution and join policies");
    typewriter("can be tuned in the config file.");
    println!("Run `tunable-qf` to compute the round.");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_negative() {
        assert!(non_negative(&0.0).is_ok());
        assert!(non_negative(&25_000.0).is_ok());
        assert!(non_negative(&-1.0).is_err());
        assert!(non_negative(&f64::INFINITY).is_err());
    }

    #[test]
    fn test_cap_range() {
        assert!(cap_range(&0.2).is_ok());
        assert!(cap_range(&1.0).is_ok());
        assert!(cap_range(&0.0).is_err());
        assert!(cap_range(&1.5).is_err());
        assert!(cap_range(&f64::NAN).is_err());
    }
}
