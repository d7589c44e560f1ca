//! Siphon CLI - Streaming record-format conversion tool
//!
//! This binary provides command-line interfaces for:
//! - convert: stream a record file into another serialization format
//! - count: count the records in a source file without converting it

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use siphon_codec::{Limits, RecordStream, SourceFormat, TargetFormat};
use siphon_io::{
    convert, CancelToken, ConvertOptions, ConvertRequest, FileResolver, LocalFileStore,
    LogMetrics, Result, SiphonError, SourceResolver,
};

#[derive(Parser)]
#[command(name = "siphon")]
#[command(about = "Streaming conversion of record files between serialization formats")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a record file into another serialization format
    Convert {
        /// Input file
        input: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Source format (ion, jsonl); inferred from the input extension
        #[arg(long, value_name = "FORMAT")]
        source_format: Option<String>,
        /// Target format (jsonl, csv); inferred from the output extension
        #[arg(long, value_name = "FORMAT")]
        target_format: Option<String>,
        /// Do not emit a header row (tabular targets)
        #[arg(long)]
        no_header: bool,
        /// Field separator character (tabular targets)
        #[arg(long, default_value = ",")]
        field_separator: char,
        /// Text delimiter character (tabular targets)
        #[arg(long, default_value = "\"")]
        text_delimiter: char,
        /// Record terminator; \n, \r and \t escapes are recognized
        #[arg(long, default_value = "\\n")]
        line_delimiter: String,
        /// Quote every text field, not just the ones that need it
        #[arg(long)]
        always_delimit_text: bool,
        /// Output character set
        #[arg(long, default_value = "UTF-8")]
        charset: String,
        /// Keep annotation wrappers instead of stripping them
        #[arg(long)]
        keep_annotations: bool,
        /// Capacity of the decode→write handoff queue, in records
        #[arg(long, default_value = "256")]
        queue_capacity: usize,
        /// Show a progress spinner while converting
        #[arg(long)]
        progress: bool,
    },
    /// Count records in a source file without converting it
    Count {
        /// Input file
        input: PathBuf,
        /// Source format (ion, jsonl); inferred from the input extension
        #[arg(long, value_name = "FORMAT")]
        source_format: Option<String>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Convert {
            input,
            output,
            source_format,
            target_format,
            no_header,
            field_separator,
            text_delimiter,
            line_delimiter,
            always_delimit_text,
            charset,
            keep_annotations,
            queue_capacity,
            progress,
        } => {
            let source_format = resolve_source_format(source_format.as_deref(), &input)?;
            let target_format = resolve_target_format(target_format.as_deref(), &output)?;

            let mut options = ConvertOptions::new(
                input.display().to_string(),
                source_format,
                target_format,
            );
            options.header = !no_header;
            options.field_separator = field_separator;
            options.text_delimiter = text_delimiter;
            options.line_delimiter = unescape_delimiter(&line_delimiter);
            options.always_delimit_text = always_delimit_text;
            options.charset = charset;
            options.keep_annotations = keep_annotations;
            options.queue_capacity = queue_capacity;

            let spinner = progress.then(|| {
                let bar = ProgressBar::new_spinner();
                bar.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner} {msg}")
                        .expect("valid template"),
                );
                bar.set_message(format!("converting {}", input.display()));
                bar.enable_steady_tick(std::time::Duration::from_millis(100));
                bar
            });

            let store = LocalFileStore::new(&output);
            let metrics = LogMetrics;
            let summary = convert(ConvertRequest {
                options,
                resolver: &FileResolver,
                storage: &store,
                metrics: &metrics,
                cancel: CancelToken::new(),
            });

            if let Some(bar) = spinner {
                bar.finish_and_clear();
            }
            let summary = summary?;
            println!("{} records -> {}", summary.records, summary.output);
            Ok(())
        }
        Commands::Count {
            input,
            source_format,
        } => {
            let source_format = resolve_source_format(source_format.as_deref(), &input)?;
            let source = FileResolver.open(&input.display().to_string())?;
            let mut count = 0u64;
            for record in RecordStream::open(source_format, source, Limits::default()) {
                record?;
                count += 1;
            }
            println!("{count}");
            Ok(())
        }
    }
}

/// Resolve the source format from a flag or the file extension.
fn resolve_source_format(flag: Option<&str>, path: &Path) -> Result<SourceFormat> {
    if let Some(name) = flag {
        return SourceFormat::from_name(name);
    }
    match format_extension(path).as_deref() {
        Some("ion") => Ok(SourceFormat::Ion),
        Some("jsonl") | Some("ndjson") | Some("json") => Ok(SourceFormat::JsonLines),
        _ => Err(SiphonError::Config(format!(
            "cannot infer source format of '{}'; pass --source-format",
            path.display()
        ))),
    }
}

/// Resolve the target format from a flag or the file extension.
fn resolve_target_format(flag: Option<&str>, path: &Path) -> Result<TargetFormat> {
    if let Some(name) = flag {
        return TargetFormat::from_name(name);
    }
    match format_extension(path).as_deref() {
        Some("jsonl") | Some("ndjson") | Some("json") => Ok(TargetFormat::JsonLines),
        Some("csv") => Ok(TargetFormat::Csv),
        _ => Err(SiphonError::Config(format!(
            "cannot infer target format of '{}'; pass --target-format",
            path.display()
        ))),
    }
}

/// File extension that decides the format, looking through a compression
/// suffix (`records.ion.zst` → `ion`).
fn format_extension(path: &Path) -> Option<String> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    if extension == "zst" || extension == "zstd" {
        return format_extension(Path::new(path.file_stem()?));
    }
    Some(extension)
}

/// Recognize backslash escapes in a delimiter argument.
fn unescape_delimiter(raw: &str) -> String {
    raw.replace("\\r\\n", "\r\n")
        .replace("\\n", "\n")
        .replace("\\r", "\r")
        .replace("\\t", "\t")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_extension_sees_through_compression() {
        let cases = vec![
            ("records.ion", Some("ion")),
            ("records.ion.zst", Some("ion")),
            ("records.JSONL", Some("jsonl")),
            ("records", None),
        ];
        for (path, expected) in cases {
            assert_eq!(
                format_extension(Path::new(path)).as_deref(),
                expected,
                "extension of {path}"
            );
        }
    }

    #[test]
    fn test_unescape_delimiter() {
        assert_eq!(unescape_delimiter("\\n"), "\n");
        assert_eq!(unescape_delimiter("\\r\\n"), "\r\n");
        assert_eq!(unescape_delimiter(";"), ";");
    }
}
