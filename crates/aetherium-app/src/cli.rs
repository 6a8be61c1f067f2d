//! Command-line interface of the `aetherium` binary.

use crate::error::{AppError, AppResult};
use crate::shortcuts::ShortcutRegistry;
use crate::{export_svg, validate_file};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "aetherium")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Render automaton snapshots as SVG")]
#[command(long_about = r#"
Loads an automaton snapshot (JSON), routes its transitions and writes the
diagram as a standalone SVG document to stdout.

EXAMPLES:
  # Render with the default layout settings
  aetherium blink.json > blink.svg

  # Render with an editor configuration file
  aetherium blink.json --config editor.json > blink.svg

  # Check a snapshot without rendering it
  aetherium --validate blink.json

ENVIRONMENT VARIABLES:
  RUST_LOG    Log filter (trace, debug, info, warn, error)
"#)]
pub struct Cli {
    /// Automaton snapshot to render
    #[arg(value_name = "AUTOMATON", required_unless_present_any = ["validate", "shortcuts"])]
    pub automaton: Option<PathBuf>,

    /// Editor configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Check an automaton snapshot and exit
    #[arg(long, value_name = "FILE", conflicts_with = "automaton")]
    pub validate: Option<PathBuf>,

    /// Print the keyboard shortcuts and exit
    #[arg(long)]
    pub shortcuts: bool,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Default log filter for this invocation. `RUST_LOG` overrides it.
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "debug" } else { "warn" }
    }

    /// Run the requested command and return what goes to stdout.
    pub fn execute(&self) -> AppResult<String> {
        if self.shortcuts {
            return Ok(ShortcutRegistry::describe());
        }
        if let Some(path) = &self.validate {
            let report = validate_file(path)?;
            return Ok(format!("{}\n", report));
        }
        match &self.automaton {
            Some(path) => export_svg(path, self.config.as_deref()),
            None => Err(AppError::Usage("an automaton file is required".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use std::io::Write;

    const VALID: &str = r#"{
        "name": "Blink",
        "states": {
            "off": { "id": "off", "name": "Off", "position": { "x": 0.0, "y": 0.0 } },
            "on": { "id": "on", "name": "On", "position": { "x": 300.0, "y": 0.0 } }
        },
        "transitions": {
            "t1": { "id": "t1", "source": "off", "target": "on", "name": "tick" }
        }
    }"#;

    fn snapshot(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_parse_render_args() {
        let cli = Cli::try_parse_from(["aetherium", "blink.json", "--config", "editor.json"])
            .unwrap();
        assert_eq!(cli.automaton, Some(PathBuf::from("blink.json")));
        assert_eq!(cli.config, Some(PathBuf::from("editor.json")));
        assert!(cli.validate.is_none());
        assert_eq!(cli.log_filter(), "warn");

        let cli = Cli::try_parse_from(["aetherium", "-v", "blink.json"]).unwrap();
        assert_eq!(cli.log_filter(), "debug");
    }

    #[test]
    fn test_help_and_version() {
        let help = Cli::try_parse_from(["aetherium", "--help"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
        let text = help.to_string();
        assert!(text.contains("Usage"));
        assert!(text.contains("--validate"));

        let version = Cli::try_parse_from(["aetherium", "--version"]).unwrap_err();
        assert_eq!(version.kind(), ErrorKind::DisplayVersion);
        assert!(version.to_string().contains(env!("CARGO_PKG_VERSION")));
    }

    #[test]
    fn test_argument_errors() {
        let missing = Cli::try_parse_from(["aetherium"]).unwrap_err();
        assert_eq!(missing.kind(), ErrorKind::MissingRequiredArgument);

        let conflict =
            Cli::try_parse_from(["aetherium", "a.json", "--validate", "b.json"]).unwrap_err();
        assert_eq!(conflict.kind(), ErrorKind::ArgumentConflict);
    }

    #[test]
    fn test_validate_valid_file() {
        let file = snapshot(VALID);
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["aetherium", "--validate", path]).unwrap();

        let output = cli.execute().unwrap();
        assert!(output.contains("Blink"));
        assert!(output.contains("2 states"));
        assert!(output.contains("1 transitions"));
    }

    #[test]
    fn test_validate_invalid_file() {
        let dangling = VALID.replace(r#""target": "on""#, r#""target": "missing""#);
        let file = snapshot(&dangling);
        let path = file.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["aetherium", "--validate", path]).unwrap();
        assert!(matches!(cli.execute(), Err(AppError::Automaton(_))));

        let garbage = snapshot("states: [");
        let path = garbage.path().to_str().unwrap();
        let cli = Cli::try_parse_from(["aetherium", "--validate", path]).unwrap();
        assert!(cli.execute().is_err());
    }

    #[test]
    fn test_render_and_shortcuts() {
        let file = snapshot(VALID);
        let path = file.path().to_str().unwrap();
        let svg = Cli::try_parse_from(["aetherium", path])
            .unwrap()
            .execute()
            .unwrap();
        assert!(svg.starts_with("<svg"));

        let shortcuts = Cli::try_parse_from(["aetherium", "--shortcuts"])
            .unwrap()
            .execute()
            .unwrap();
        assert!(shortcuts.contains("Ctrl+A"));
    }
}
