use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::merge::{self, MergeOptions};
use crate::report;

#[derive(Debug, Parser)]
#[command(name = "docmerge", version, about = "document merge CLI")]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Merge same-type documents into one output file.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[arg(long)]
        no_bookmarks: bool,
        #[arg(long)]
        json: bool,
    },
    /// Show what a merge would do without writing anything.
    Preview {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        #[arg(long)]
        json: bool,
    },
    /// Inspect a single file.
    Info {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// List supported document kinds and extensions.
    Formats,
}

pub fn run() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match execute(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err);
            if let Some(hint) = err.hint() {
                eprintln!("help: {}", hint);
            }
            err.exit_code()
        }
    }
}

fn execute(cli: Cli) -> AppResult<()> {
    let config = Config::load_default()?;
    match cli.command {
        Commands::Merge {
            files,
            output,
            no_bookmarks,
            json,
        } => {
            let options = MergeOptions {
                bookmarks: if no_bookmarks { Some(false) } else { None },
            };
            let report = merge::merge_files(&config, &files, output.as_deref(), &options);
            if json {
                println!("{}", to_json(&report)?);
            } else {
                print!("{}", report::render_report(&report));
            }
            if let Some(err) = report.to_error() {
                return Err(err);
            }
        }
        Commands::Preview { files, json } => {
            let preview = merge::preview(&config, &files);
            if json {
                println!("{}", to_json(&preview)?);
            } else {
                print!("{}", report::render_preview(&preview)?);
            }
            if !preview.valid {
                return Err(AppError::input(
                    preview.errors.join("; "),
                    Some(crate::tr!(
                        "入力ファイルを確認してください",
                        "Check the input files."
                    )),
                ));
            }
        }
        Commands::Info { file, json } => {
            let info = merge::file_info(&file);
            if json {
                println!("{}", to_json(&info)?);
            } else {
                print!("{}", report::render_info(&info)?);
            }
            if let Some(message) = &info.error {
                return Err(AppError::input(message.clone(), None));
            }
        }
        Commands::Formats => {
            print!("{}", report::render_formats());
        }
    }
    Ok(())
}

fn to_json(value: &impl Serialize) -> AppResult<String> {
    serde_json::to_string_pretty(value).map_err(|err| {
        AppError::merge(
            crate::tr!(
                "JSON 出力に失敗しました",
                "Failed to serialize JSON output"
            ),
            Some(err.to_string()),
        )
    })
}
