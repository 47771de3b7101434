use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stackforge::api;
use stackforge::assembly::ExportAssembler;
use stackforge::config::AppConfig;
use stackforge::db::Database;
use stackforge::error::AssemblyError;

#[derive(Parser)]
#[command(name = "stackforge")]
#[command(about = "Assemble agents, rules and hooks into per-project bundles")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API
    Serve {
        /// Port for HTTP API (overrides STACKFORGE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Apply pending database migrations and exit
    Migrate,
    /// Export a project bundle to disk
    Export {
        /// Project id or slug
        project: String,

        /// Output directory (overrides STACKFORGE_EXPORT_DIR)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
    /// Show export history for a project
    History {
        /// Project id or slug
        project: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "stackforge=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn serve(db: Database, port: u16) -> anyhow::Result<()> {
    let app = api::create_router(db);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("stackforge listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn find_project(db: &Database, handle: &str) -> anyhow::Result<stackforge::models::Project> {
    db.find_project(handle)?
        .with_context(|| format!("No project matches '{}'", handle))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = AppConfig::from_env()?;
    let db = config.open_database()?;

    match cli.command {
        Some(Commands::Serve { port }) => {
            serve(db, port.unwrap_or(config.port)).await?;
        }
        None => {
            serve(db, config.port).await?;
        }
        Some(Commands::Migrate) => {
            // open_database already migrated
            println!("Database is up to date");
        }
        Some(Commands::Export { project, out }) => {
            let project = find_project(&db, &project)?;
            let out = out.unwrap_or(config.export_dir);

            let bundle = match ExportAssembler::new(&db).export(project.id) {
                Ok(bundle) => bundle,
                Err(AssemblyError::ExportValidationFailed(report)) => {
                    for item in &report.items {
                        eprintln!("  [{}] {}", item.code, item.message);
                    }
                    anyhow::bail!("Export of '{}' refused", project.slug);
                }
                Err(e) => return Err(e.into()),
            };
            bundle.write_to(&out)?;

            for file in &bundle.manifest.files {
                println!("{:>8}  {}", file.bytes, file.path);
            }
            println!(
                "Wrote {} files ({} bytes) to {}",
                bundle.manifest.files.len(),
                bundle.manifest.total_bytes,
                out.display()
            );
        }
        Some(Commands::History { project }) => {
            let project = find_project(&db, &project)?;
            let records = db.get_export_records(project.id)?;
            if records.is_empty() {
                println!("No exports for '{}'", project.slug);
            }
            for record in records {
                println!(
                    "{}  {:<9}  {} files  {} bytes{}",
                    record.started_at.format("%Y-%m-%d %H:%M:%S"),
                    record.status.as_str(),
                    record.files.len(),
                    record.total_bytes,
                    record
                        .error
                        .map(|e| format!("  ({})", e))
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
