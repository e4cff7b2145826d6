//! ThisAssembly CLI - Bridge interface for build hosts
//!
//! Commands: generate, languages
//! Generated text (or JSON) goes to stdout, logs to stderr
//! Returns 1 on a bad payload, 2 on generation failure

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use thisassembly_core::{logging::init_logging, CodeGenerator, CodeLanguage, MetadataRecord};

#[derive(Parser)]
#[command(name = "thisassembly-cli")]
#[command(about = "ThisAssembly CLI - version-info source generator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log generation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List supported code languages
    Languages,

    /// Generate version-info source
    Generate {
        /// JSON payload (MetadataRecord)
        #[arg(short, long)]
        payload: String,

        /// Override the payload's codeLanguage
        #[arg(short, long)]
        language: Option<String>,

        /// Print a JSON manifest with digests instead of bare source
        #[arg(short, long)]
        manifest: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Languages => {
            let languages: Vec<_> = CodeLanguage::all()
                .iter()
                .map(|l| serde_json::json!({
                    "selector": l.selector(),
                    "extension": l.file_extension(),
                }))
                .collect();

            println!("{}", serde_json::Value::Array(languages));
            ExitCode::SUCCESS
        }

        Commands::Generate { payload, language, manifest } => {
            let mut record: MetadataRecord = match serde_json::from_str(&payload) {
                Ok(r) => r,
                Err(e) => {
                    let output = serde_json::json!({
                        "success": false,
                        "error": format!("Invalid payload: {}", e),
                    });
                    println!("{}", output);
                    return ExitCode::FAILURE;
                }
            };

            if let Some(language) = language {
                record.code_language = language;
            }

            let generator = CodeGenerator::new();
            let result = if manifest {
                generator
                    .generate_manifest(&record)
                    .and_then(|m| Ok(serde_json::to_string_pretty(&m)? + "\n"))
            } else {
                generator.generate(&record)
            };

            match result {
                Ok(text) => {
                    print!("{}", text);
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    tracing::warn!(error = %e, "generation failed");
                    let output = serde_json::json!({
                        "success": false,
                        "error": e.to_string(),
                    });
                    println!("{}", output);
                    ExitCode::from(2)
                }
            }
        }
    }
}
