//! Shared helpers for locating and loading the project configuration.

use std::path::{Path, PathBuf};

use log::debug;
use strobe_config::{load_config, load_config_from_str, StrobeConfig, CONFIG_FILE};
use strobe_sim::SystemParams;

use crate::GlobalArgs;

/// Walks up from `start` looking for a directory containing `strobe.toml`.
pub fn find_project_root(start: &Path) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CONFIG_FILE).exists() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(format!(
                "could not find {CONFIG_FILE} in {} or any parent directory",
                start.display()
            )
            .into());
        }
    }
}

/// Loads the configuration selected by the global CLI args.
///
/// If `--config` names a file, that file is read directly; if it names a
/// directory, its `strobe.toml` is read. Otherwise walks up from the current
/// directory looking for `strobe.toml`. Returns the file path alongside the
/// parsed configuration.
pub fn load_project(
    global: &GlobalArgs,
) -> Result<(PathBuf, StrobeConfig), Box<dyn std::error::Error>> {
    match global.config {
        Some(ref config_path) => {
            let p = PathBuf::from(config_path);
            if p.is_file() {
                let content = std::fs::read_to_string(&p)?;
                Ok((p, load_config_from_str(&content)?))
            } else {
                let config = load_config(&p)?;
                Ok((p.join(CONFIG_FILE), config))
            }
        }
        None => {
            let root = find_project_root(&std::env::current_dir()?)?;
            let config = load_config(&root)?;
            Ok((root.join(CONFIG_FILE), config))
        }
    }
}

/// Loads the configuration and resolves it into simulator parameters.
pub fn load_params(
    global: &GlobalArgs,
) -> Result<(PathBuf, SystemParams), Box<dyn std::error::Error>> {
    let (path, config) = load_project(global)?;
    let params = strobe_config::resolve(&config)?;
    debug!(
        "resolved {}: bit time {} cycles, debounce threshold {} cycles",
        path.display(),
        params.uart.bit_time,
        params.debounce.threshold
    );
    Ok((path, params))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn global(config: Option<&Path>) -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: false,
            config: config.map(|p| p.to_str().unwrap().to_string()),
        }
    }

    #[test]
    fn find_project_root_in_current_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[clock]\nfrequency = \"50MHz\"\n").unwrap();
        let root = find_project_root(tmp.path()).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_in_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[clock]\nfrequency = \"50MHz\"\n").unwrap();
        let sub = tmp.path().join("sim");
        fs::create_dir_all(&sub).unwrap();
        let root = find_project_root(&sub).unwrap();
        assert_eq!(root, tmp.path());
    }

    #[test]
    fn find_project_root_not_found() {
        let tmp = TempDir::new().unwrap();
        let result = find_project_root(tmp.path());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("could not find strobe.toml"));
    }

    #[test]
    fn load_project_from_config_file() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join("board.toml");
        fs::write(&config_path, "[clock]\nfrequency = \"12MHz\"\n").unwrap();
        let (path, config) = load_project(&global(Some(&config_path))).unwrap();
        assert_eq!(path, config_path);
        assert_eq!(config.clock.unwrap().frequency, "12MHz");
    }

    #[test]
    fn load_project_from_config_dir() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[clock]\nfrequency = \"25MHz\"\n").unwrap();
        let (path, config) = load_project(&global(Some(tmp.path()))).unwrap();
        assert_eq!(path, tmp.path().join(CONFIG_FILE));
        assert_eq!(config.clock.unwrap().frequency, "25MHz");
    }

    #[test]
    fn load_params_reports_parameter_errors() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILE),
            "[clock]\nfrequency = \"50MHz\"\n[reset]\nstages = 1\n",
        )
        .unwrap();
        let err = load_params(&global(Some(tmp.path()))).unwrap_err();
        assert!(err.to_string().contains("at least 2 stages"));
    }
}
