//! Dirsweep CLI - audit and remediate directory state from CSV rosters
//!
//! # Main Commands
//!
//! ```bash
//! dirsweep groups users.csv            # Disabled accounts still in w365 groups
//! dirsweep mfa users.csv               # Registered auth methods per user
//! dirsweep add-devices pcs.csv --group-id <id>   # Add devices to a group
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! dirsweep parse users.csv             # Just parse the roster and show it
//! ```
//!
//! Credentials come from `GRAPH_TENANT_ID`, `GRAPH_CLIENT_ID`, and
//! `GRAPH_CLIENT_SECRET` (a `.env` file is honored).

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use dirsweep::audit::devices::{self, DeviceAddOptions};
use dirsweep::audit::groups::{self, GroupAuditOptions};
use dirsweep::audit::mfa::{self, MfaAuditOptions};
use dirsweep::{load_roster, report, AuditResult, GraphClient, GraphCredentials, Roster};

#[derive(Parser)]
#[command(name = "dirsweep")]
#[command(about = "Audit and remediate directory state from CSV rosters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report disabled accounts still present in matching groups
    Groups {
        /// Input roster CSV
        roster: PathBuf,

        /// Roster column holding the UPN
        #[arg(short, long, default_value = "UserPrincipalName")]
        column: String,

        /// Substring a group name must contain (case-insensitive)
        #[arg(long, default_value = "w365")]
        name_contains: String,

        /// Export findings to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Report registered authentication methods per user
    Mfa {
        /// Input roster CSV
        roster: PathBuf,

        /// Roster column holding the UPN
        #[arg(short, long, default_value = "UserPrincipalName")]
        column: String,

        /// Export findings to a CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Process at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Add roster devices to a group by exact display-name match
    AddDevices {
        /// Input roster CSV
        roster: PathBuf,

        /// Target group object id
        #[arg(short, long)]
        group_id: String,

        /// Roster column holding the device name
        #[arg(short, long, default_value = "DeviceName")]
        column: String,

        /// Process at most this many rows
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Parse a roster and show its metadata (no directory calls)
    Parse {
        /// Input roster CSV
        roster: PathBuf,

        /// Rows to preview
        #[arg(long, default_value = "5")]
        preview: usize,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Groups {
            roster,
            column,
            name_contains,
            output,
            limit,
        } => {
            cmd_groups(
                &roster,
                GroupAuditOptions {
                    column,
                    name_contains,
                    limit,
                },
                output.as_deref(),
            )
            .await
        }

        Commands::Mfa {
            roster,
            column,
            output,
            limit,
        } => cmd_mfa(&roster, MfaAuditOptions { column, limit }, output.as_deref()).await,

        Commands::AddDevices {
            roster,
            group_id,
            column,
            limit,
        } => {
            cmd_add_devices(
                &roster,
                DeviceAddOptions {
                    column,
                    group_id,
                    limit,
                },
            )
            .await
        }

        Commands::Parse { roster, preview } => cmd_parse(&roster, preview),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

/// Load the roster, echo its parse metadata, and verify the key column.
fn read_roster(path: &Path, column: &str) -> AuditResult<Roster> {
    eprintln!("📄 Reading roster: {}", path.display());

    let roster = load_roster(path)?;
    roster.require_column(column)?;

    eprintln!("   Encoding: {}", roster.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(roster.delimiter));
    eprintln!("   Columns: {}", roster.headers.join(", "));
    eprintln!("   Rows: {}", roster.rows.len());

    Ok(roster)
}

/// Establish the run's directory session.
async fn connect() -> AuditResult<GraphClient> {
    eprintln!("🔑 Authenticating...");
    let credentials = GraphCredentials::from_env()?;
    let client = GraphClient::connect(credentials).await?;
    eprintln!(
        "   Token acquired (expires {})",
        client.token_expires_at().format("%H:%M:%S UTC")
    );
    Ok(client)
}

async fn cmd_groups(
    roster_path: &Path,
    options: GroupAuditOptions,
    output: Option<&Path>,
) -> AuditResult<()> {
    let roster = read_roster(roster_path, &options.column)?;
    let client = connect().await?;

    eprintln!(
        "\n🔍 Auditing group memberships (name contains '{}')...",
        options.name_contains
    );
    let result = groups::run(&client, &roster, &options).await;

    println!("\n{}", report::group_findings_table(&result.findings));
    report::print_summary(&result.counters);

    if let Some(path) = output {
        report::export_or_warn(path, &result.findings);
    }

    Ok(())
}

async fn cmd_mfa(
    roster_path: &Path,
    options: MfaAuditOptions,
    output: Option<&Path>,
) -> AuditResult<()> {
    let roster = read_roster(roster_path, &options.column)?;
    let client = connect().await?;

    eprintln!("\n🔍 Auditing authentication methods...");
    let result = mfa::run(&client, &roster, &options).await;

    println!("\n{}", report::mfa_findings_table(&result.findings));
    report::print_summary(&result.counters);

    if let Some(path) = output {
        report::export_or_warn(path, &result.findings);
    }

    Ok(())
}

async fn cmd_add_devices(
    roster_path: &Path,
    options: DeviceAddOptions,
) -> AuditResult<()> {
    let roster = read_roster(roster_path, &options.column)?;
    let client = connect().await?;

    eprintln!("\n🔧 Adding devices to group {}...", options.group_id);
    let result = devices::run(&client, &roster, &options).await;

    report::print_summary(&result.counters);
    eprintln!("   Added: {}", result.added);

    Ok(())
}

fn cmd_parse(roster_path: &Path, preview: usize) -> AuditResult<()> {
    eprintln!("📄 Parsing roster: {}", roster_path.display());

    let roster = load_roster(roster_path)?;

    eprintln!("   Encoding: {}", roster.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(roster.delimiter));
    eprintln!("   Columns: {}", roster.headers.join(", "));
    eprintln!("✅ Parsed {} rows", roster.rows.len());

    for (i, row) in roster.rows.iter().take(preview).enumerate() {
        let cells: Vec<String> = roster
            .headers
            .iter()
            .map(|h| row.get(h).cloned().unwrap_or_default())
            .collect();
        println!("  [{:2}] {}", i + 1, cells.join(" | "));
    }
    if roster.rows.len() > preview {
        println!("  ... {} more rows", roster.rows.len() - preview);
    }

    Ok(())
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}
