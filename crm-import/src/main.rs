//! crm-import - bulk lead import command line
//!
//! Stages the operator's spreadsheet as a temporary upload, runs the import
//! pipeline against the CRM database and prints the result as JSON.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crm_common::config::{load_default_config, prepare_root_folder, resolve_root_folder, ROOT_FOLDER_ENV};
use crm_common::ActingUser;
use crm_import::models::ClassificationNames;
use crm_import::{
    resolve_import_settings, ImportError, ImportPipeline, ImportRequest, LeadKind, TempUpload,
};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Command-line arguments for crm-import
#[derive(Parser, Debug)]
#[command(name = "crm-import")]
#[command(about = "Bulk import of CRM contacts and customers from spreadsheets")]
#[command(version)]
struct Cli {
    /// Root folder holding the database and uploads
    #[arg(long, global = true)]
    root_folder: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import a spreadsheet of leads
    Import {
        /// Lead kind: contact or customer
        #[arg(long)]
        kind: LeadKind,

        /// Spreadsheet to import (xlsx, xls, ods, csv)
        #[arg(long)]
        file: PathBuf,

        /// Manual header mapping as a JSON object, e.g. '{"Cell": "ContactNo"}'
        #[arg(long)]
        mapping: Option<String>,

        /// Campaign applied to every row
        #[arg(long)]
        campaign: Option<String>,

        /// Type applied to every row (requires --campaign)
        #[arg(long = "type")]
        lead_type: Option<String>,

        /// Sub-type applied to every row (requires --type)
        #[arg(long)]
        sub_type: Option<String>,

        /// Field stamped onto every row, as KEY=VALUE (repeatable)
        #[arg(long = "field", value_parser = parse_key_value)]
        fields: Vec<(String, String)>,

        /// Id of the user performing the import
        #[arg(long)]
        user_id: Uuid,

        /// City assigned to the importing user
        #[arg(long)]
        city: Option<String>,
    },

    /// Print the header row of a spreadsheet
    Headers {
        #[arg(long)]
        file: PathBuf,
    },
}

fn parse_key_value(raw: &str) -> std::result::Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    if key.trim().is_empty() {
        return Err(format!("empty field name in '{}'", raw));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_default_config();

    // Logs go to stderr; stdout carries the JSON result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.logging.level)),
        )
        .with_writer(std::io::stderr)
        .init();

    info!("Starting crm-import v{}", env!("CARGO_PKG_VERSION"));

    let root_folder = resolve_root_folder(cli.root_folder.as_deref(), ROOT_FOLDER_ENV, &config);
    let db_path = prepare_root_folder(&root_folder)?;
    info!("Database: {}", db_path.display());

    let settings = resolve_import_settings(&root_folder, &config)?;
    let pool = crm_common::db::init_database(&db_path)
        .await
        .context("Failed to open database")?;
    let pipeline = ImportPipeline::new(pool.clone(), settings);

    let outcome = match cli.command {
        Command::Import {
            kind,
            file,
            mapping,
            campaign,
            lead_type,
            sub_type,
            fields,
            user_id,
            city,
        } => {
            let mut request = ImportRequest::new(kind).with_batch_classification(
                ClassificationNames::new(campaign, lead_type, sub_type),
            );
            if let Some(mapping) = mapping {
                request = request.with_field_mapping(mapping);
            }
            for (key, value) in fields {
                request = request.with_batch_field(key, value);
            }
            let actor = ActingUser::new(user_id, city);

            match TempUpload::stage(&file, &pipeline.settings().uploads_dir) {
                Ok(upload) => pipeline
                    .run(upload, request, &actor)
                    .await
                    .and_then(|summary| {
                        let mut value = serde_json::to_value(&summary)
                            .map_err(|e| ImportError::Internal(e.to_string()))?;
                        value["message"] = serde_json::Value::String(summary.message());
                        Ok(value)
                    }),
                Err(e) => Err(e),
            }
        }
        Command::Headers { file } => {
            match TempUpload::stage(&file, &pipeline.settings().uploads_dir) {
                Ok(upload) => pipeline
                    .read_headers(upload)
                    .await
                    .map(|headers| serde_json::json!({ "headers": headers })),
                Err(e) => Err(e),
            }
        }
    };

    pool.close().await;

    match outcome {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(e) => {
            let error = serde_json::json!({ "error": e.error_code(), "message": e.to_string() });
            println!("{}", serde_json::to_string_pretty(&error)?);
            std::process::exit(1);
        }
    }
}
