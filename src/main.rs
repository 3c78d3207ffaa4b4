//! fmtpatch - apply formatter replacements to a file.
//!
//! # Usage
//!
//! ```bash
//! fmtpatch --in-place src/main.cc
//! fmtpatch --region 120:480 --cursor 300 --print-cursor src/main.cc
//! fmtpatch --changed --revision HEAD~1 --style file --in-place src/main.cc
//! ```

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use fmtpatch::config::{
    ConfigFlags, clear_config_flags, global_config_path, load_config_flags, local_override_path,
    parse_flag_tokens, save_config_flags,
};
use fmtpatch::diff::GnuDiff;
use fmtpatch::editor::Document;
use fmtpatch::formatter::ClangFormat;
use fmtpatch::operation::{Outcome, format_buffer, format_changed_lines, format_region};
use fmtpatch::vcs::Git;

/// Apply clang-format replacements to a file, optionally only on changed lines
#[derive(Parser, Debug)]
#[command(name = "fmtpatch", version, about, long_about = None)]
struct Cli {
    /// Source file to format
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Formatting style (e.g. LLVM, Google, file)
    #[arg(long, value_name = "STYLE")]
    style: Option<String>,

    /// Style used when --style=file finds no style file
    #[arg(long, value_name = "STYLE")]
    fallback_style: Option<String>,

    /// Filename used for style discovery instead of FILE
    #[arg(long, value_name = "PATH")]
    assume_filename: Option<PathBuf>,

    /// Cursor position in characters, counting each line break (CRLF too) as one
    #[arg(long, value_name = "CHAR", default_value_t = 0)]
    cursor: usize,

    /// Only format characters START:END, counting each line break (CRLF too) as one
    #[arg(long, value_name = "START:END", value_parser = parse_region, conflicts_with = "changed")]
    region: Option<(usize, usize)>,

    /// Only format lines changed since --revision
    #[arg(long)]
    changed: bool,

    /// Revision to compare against with --changed (default HEAD)
    #[arg(long, value_name = "REV")]
    revision: Option<String>,

    /// Rewrite FILE instead of printing the result
    #[arg(short, long)]
    in_place: bool,

    /// Report the relocated cursor on stderr, in the same units as --cursor
    #[arg(long)]
    print_cursor: bool,

    /// Path to the clang-format executable
    #[arg(long, value_name = "PATH")]
    formatter: Option<PathBuf>,

    /// Path to the GNU diff executable
    #[arg(long, value_name = "PATH")]
    diff: Option<PathBuf>,

    /// Path to the git executable
    #[arg(long, value_name = "PATH")]
    git: Option<PathBuf>,

    /// Log external tool invocations and edit application
    #[arg(short, long)]
    verbose: bool,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn parse_region(s: &str) -> Result<(usize, usize), String> {
    let (start, end) = s
        .split_once(':')
        .ok_or_else(|| format!("expected START:END, got {s:?}"))?;
    let start = start.parse().map_err(|_| format!("invalid start {start:?}"))?;
    let end = end.parse().map_err(|_| format!("invalid end {end:?}"))?;
    Ok((start, end))
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();
}

fn main() -> Result<()> {
    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);
    init_logging(effective.verbose);

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let host_text = std::fs::read_to_string(&cli.file)
        .with_context(|| format!("Failed to read {}", cli.file.display()))?;
    let mut document = Document::from_text(&host_text);

    let style = effective.format_style(
        cli.assume_filename
            .clone()
            .or_else(|| Some(cli.file.clone())),
    );
    let formatter = effective
        .formatter
        .clone()
        .map_or_else(ClangFormat::default, ClangFormat::new);

    let result = if cli.changed {
        let diff = effective.diff.clone().map_or_else(GnuDiff::default, GnuDiff::new);
        let git = effective.git.clone().map_or_else(Git::default, Git::new);
        format_changed_lines(
            &mut document,
            Some(cli.file.as_path()),
            effective.revision_or_head(),
            cli.cursor,
            &style,
            &formatter,
            &diff,
            &git,
        )
    } else if let Some((start, end)) = cli.region {
        format_region(&mut document, start, end, cli.cursor, &style, &formatter)
    } else {
        format_buffer(&mut document, cli.cursor, &style, &formatter)
    };
    let outcome = result.with_context(|| format!("Failed to format {}", cli.file.display()))?;

    match outcome {
        Outcome::Unchanged => {
            eprintln!(
                "[info] No changes since {}; nothing to format",
                effective.revision_or_head()
            );
        }
        Outcome::Formatted(applied) if applied.incomplete => {
            eprintln!("[warn] Formatting incomplete (syntax errors)");
        }
        Outcome::Formatted(_) => {}
    }

    if cli.in_place {
        if document.is_dirty() {
            std::fs::write(&cli.file, document.to_host_text())
                .with_context(|| format!("Failed to write {}", cli.file.display()))?;
            document.mark_clean();
        }
    } else {
        let mut stdout = std::io::stdout().lock();
        stdout
            .write_all(document.to_host_text().as_bytes())
            .context("Failed to write output")?;
        stdout.flush().context("Failed to write output")?;
    }

    if cli.print_cursor {
        let cursor = outcome.cursor_or(cli.cursor);
        let (line, col) = document.line_col(cursor);
        eprintln!("cursor {cursor} (line {}, column {})", line + 1, col + 1);
    }

    Ok(())
}
