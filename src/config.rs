use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Style settings threaded explicitly into every formatting call.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FormatStyle {
    /// Style name or `file`; `None` leaves the formatter's default.
    pub style: Option<String>,
    /// Used when `style` is `file` and no style file is found.
    pub fallback_style: Option<String>,
    /// Filename hint for style discovery and language detection.
    pub assume_filename: Option<PathBuf>,
}

impl FormatStyle {
    /// Fill in the filename hint from the document path when unset.
    #[must_use]
    pub fn with_default_filename(&self, path: Option<&Path>) -> Self {
        let mut style = self.clone();
        if style.assume_filename.is_none() {
            style.assume_filename = path.map(Path::to_path_buf);
        }
        style
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub style: Option<String>,
    pub fallback_style: Option<String>,
    pub revision: Option<String>,
    pub formatter: Option<PathBuf>,
    pub diff: Option<PathBuf>,
    pub git: Option<PathBuf>,
    pub verbose: bool,
}

impl ConfigFlags {
    /// Merge two layers; options from `other` win, booleans accumulate.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            style: other.style.clone().or_else(|| self.style.clone()),
            fallback_style: other
                .fallback_style
                .clone()
                .or_else(|| self.fallback_style.clone()),
            revision: other.revision.clone().or_else(|| self.revision.clone()),
            formatter: other.formatter.clone().or_else(|| self.formatter.clone()),
            diff: other.diff.clone().or_else(|| self.diff.clone()),
            git: other.git.clone().or_else(|| self.git.clone()),
            verbose: self.verbose || other.verbose,
        }
    }

    pub fn format_style(&self, assume_filename: Option<PathBuf>) -> FormatStyle {
        FormatStyle {
            style: self.style.clone(),
            fallback_style: self.fallback_style.clone(),
            assume_filename,
        }
    }

    pub fn revision_or_head(&self) -> &str {
        self.revision.as_deref().unwrap_or("HEAD")
    }
}

pub fn global_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        if let Some(appdata) = std::env::var_os("APPDATA") {
            return PathBuf::from(appdata).join("fmtpatch").join("config");
        }
    }

    #[cfg(target_os = "macos")]
    {
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("fmtpatch")
                .join("config");
        }
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME") {
            return PathBuf::from(xdg).join("fmtpatch").join("config");
        }
        if let Some(home) = std::env::var_os("HOME") {
            return PathBuf::from(home)
                .join(".config")
                .join("fmtpatch")
                .join("config");
        }
    }

    PathBuf::from(".fmtpatchrc")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".fmtpatchrc")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# fmtpatch defaults (saved with --save)".to_string());
    if let Some(style) = &flags.style {
        lines.push(format!("--style {style}"));
    }
    if let Some(style) = &flags.fallback_style {
        lines.push(format!("--fallback-style {style}"));
    }
    if let Some(revision) = &flags.revision {
        lines.push(format!("--revision {revision}"));
    }
    if let Some(path) = &flags.formatter {
        lines.push(format!("--formatter {}", path.display()));
    }
    if let Some(path) = &flags.diff {
        lines.push(format!("--diff {}", path.display()));
    }
    if let Some(path) = &flags.git {
        lines.push(format!("--git {}", path.display()));
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Flags that take a value, as `--flag value` or `--flag=value`.
const VALUE_FLAGS: &[&str] = &[
    "--style",
    "--fallback-style",
    "--revision",
    "--formatter",
    "--diff",
    "--git",
];

pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = tokens[i].as_str();
        if token == "--verbose" || token == "-v" {
            flags.verbose = true;
            i += 1;
            continue;
        }

        let (name, value) = match token.split_once('=') {
            Some((name, value)) if VALUE_FLAGS.contains(&name) => (name, Some(value.to_string())),
            _ if VALUE_FLAGS.contains(&token) => {
                i += 1;
                (token, tokens.get(i).cloned())
            }
            _ => (token, None),
        };

        if let Some(value) = value {
            match name {
                "--style" => flags.style = Some(value),
                "--fallback-style" => flags.fallback_style = Some(value),
                "--revision" => flags.revision = Some(value),
                "--formatter" => flags.formatter = Some(PathBuf::from(value)),
                "--diff" => flags.diff = Some(PathBuf::from(value)),
                "--git" => flags.git = Some(PathBuf::from(value)),
                _ => {}
            }
        }
        i += 1;
    }
    flags
}
