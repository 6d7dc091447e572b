//! Layered run configuration: defaults, then `graphfmt.toml`, then flags

use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use anyhow::Context;
use graphfmt_decoder::DecoderKind;
use graphfmt_printer::DEFAULT_FORMAT;
use serde::Deserialize;

/// Config file looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE: &str = "graphfmt.toml";

pub const DEFAULT_EXTENSION: &str = "in";

/// Contents of a `graphfmt.toml` file. Every key is optional.
#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub decoder: Option<DecoderKind>,
    pub jobs: Option<usize>,
    pub diagnostics: Option<SocketAddr>,
}

impl FileConfig {
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    /// Load `explicit` if given, otherwise `graphfmt.toml` from the working
    /// directory when it exists.
    pub fn discover(explicit: Option<&Path>) -> anyhow::Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let implicit = Path::new(CONFIG_FILE);
        if implicit.is_file() {
            tracing::debug!("Using {}", implicit.display());
            return Self::load(implicit);
        }
        Ok(Self::default())
    }
}

/// Settings given on the command line; `None` defers to the config file.
#[derive(Debug, Default, Clone)]
pub struct ConvertOverrides {
    pub format: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub extension: Option<String>,
    pub decoder: Option<DecoderKind>,
    pub jobs: Option<usize>,
    pub diagnostics: Option<SocketAddr>,
    pub progress: bool,
}

/// Fully resolved settings for a `convert` run.
#[derive(Debug, Clone, PartialEq)]
pub struct ConvertSettings {
    pub format: String,
    pub output_dir: PathBuf,
    pub extension: String,
    pub decoder: DecoderKind,
    pub jobs: usize,
    pub diagnostics: Option<SocketAddr>,
    pub progress: bool,
}

impl Default for ConvertSettings {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), ConvertOverrides::default())
    }
}

impl ConvertSettings {
    /// Merge flags over the config file over built-in defaults.
    ///
    /// Empty strings count as unset, so `--format ""` means the default format.
    pub fn resolve(file: FileConfig, flags: ConvertOverrides) -> Self {
        let format = non_empty(flags.format)
            .or_else(|| non_empty(file.format))
            .unwrap_or_else(|| DEFAULT_FORMAT.to_string());

        let output_dir = flags
            .output_dir
            .filter(|dir| !dir.as_os_str().is_empty())
            .or_else(|| file.output_dir.filter(|dir| !dir.as_os_str().is_empty()))
            .unwrap_or_else(|| PathBuf::from("."));

        let extension = non_empty(flags.extension.map(|e| e.trim_start_matches('.').to_string()))
            .or_else(|| non_empty(file.extension.map(|e| e.trim_start_matches('.').to_string())))
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());

        let jobs = flags
            .jobs
            .or(file.jobs)
            .filter(|&jobs| jobs > 0)
            .unwrap_or_else(default_jobs);

        Self {
            format,
            output_dir,
            extension,
            decoder: flags.decoder.or(file.decoder).unwrap_or_default(),
            jobs,
            diagnostics: flags.diagnostics.or(file.diagnostics),
            progress: flags.progress,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}
