//! Configuration command handlers

use crate::cli::{ConfigAction, ConfigArgs, ConfigFormat, ConfigInitArgs, ConfigShowArgs};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::output::OutputWriter;
use std::path::Path;

pub fn handle_config(args: ConfigArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    match args.action {
        ConfigAction::Show(show_args) => handle_config_show(show_args, config, output),
        ConfigAction::Init(init_args) => handle_config_init(init_args, output),
        ConfigAction::Path => handle_config_path(config, output),
    }
}

fn handle_config_show(args: ConfigShowArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let extension = match args.format {
        ConfigFormat::Toml => "toml",
        ConfigFormat::Json => "json",
        ConfigFormat::Yaml => "yaml",
    };

    let content = config.to_string_for(Path::new("config").with_extension(extension).as_path())?;
    if content.ends_with('\n') {
        output.write(&content)
    } else {
        output.writeln(&content)
    }
}

fn handle_config_init(args: ConfigInitArgs, output: &mut OutputWriter) -> Result<()> {
    let path = match args.path {
        Some(path) => path,
        None => Config::user_config_path()
            .ok_or_else(|| Error::config("Unable to determine user config directory"))?,
    };

    if path.exists() && !args.force {
        output.warning(&format!(
            "Config already exists at {} (use --force to overwrite)",
            path.display()
        ))?;
        return Ok(());
    }

    Config::default().save(&path)?;
    output.success(&format!("✓ Created config at {}", path.display()))?;
    Ok(())
}

fn handle_config_path(config: &Config, output: &mut OutputWriter) -> Result<()> {
    match &config.source {
        Some(path) => output.writeln(&path.display().to_string()),
        None => {
            output.info("No configuration file found; using defaults. Searched:")?;
            for path in Config::default_config_paths() {
                output.info(&format!("  {}", path.display()))?;
            }
            Ok(())
        }
    }
}
