mod commands;
mod output;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "ptrab",
    version,
    about = "Budget line-item consolidation for P Trab work plans"
)]
struct Cli {
    /// Log debug details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Aggregate a plan's records into budget line items
    Items {
        /// JSON snapshot of the record tables
        snapshot: PathBuf,

        /// Plan (P Trab) id
        #[arg(long = "ptrab", value_name = "ID")]
        ptrab: String,

        /// Custom table catalog (default: built-in "tabelas")
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Consolidate line items into DOR groups following a plan file
    Dor {
        /// JSON snapshot of the record tables
        snapshot: PathBuf,

        /// Plan (P Trab) id
        #[arg(long = "ptrab", value_name = "ID")]
        ptrab: String,

        /// Grouping plan: [{ "name": ..., "items": [item ids] }]
        #[arg(long, value_name = "FILE")]
        plan: PathBuf,

        /// Custom table catalog (default: built-in "tabelas")
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Reject groups whose items span more than one subitem
        #[arg(long)]
        single_subitem: bool,

        /// Save the groups into this JSON file (replacing the plan's previous groups)
        #[arg(long, value_name = "FILE")]
        save: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Split a category total between ND 30 and ND 39
    Split {
        /// Category total (accepts 1.234,56)
        #[arg(long, allow_hyphen_values = true)]
        total: String,

        /// ND 39 amount entered by the user
        #[arg(long, allow_hyphen_values = true)]
        nd39: String,

        /// Destination organizational unit; commits the allocation when given
        #[arg(long, value_name = "OM")]
        destination: Option<String>,

        /// Destination budget unit (CODUG)
        #[arg(long, value_name = "CODUG")]
        ug: Option<String>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Compute Classe III fuel consumption and cost
    Fuel {
        /// JSON list of consumption requests
        input_file: PathBuf,

        /// First day of the plan period (YYYY-MM-DD)
        #[arg(long)]
        from: NaiveDate,

        /// Last day of the plan period (YYYY-MM-DD)
        #[arg(long)]
        to: NaiveDate,

        /// Use local prices for this locality instead of national ones
        #[arg(long, value_name = "LOCALITY")]
        local: Option<String>,

        /// Custom price catalog (default: built-in "precos")
        #[arg(long, value_name = "FILE")]
        prices: Option<PathBuf>,

        /// Custom equipment catalog (default: built-in "equipamentos")
        #[arg(long, value_name = "FILE")]
        equipment: Option<PathBuf>,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate directive catalogs
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List predefined catalogs
    List,
    /// Print a predefined catalog
    Show {
        /// Preset name (tabelas, equipamentos, precos)
        preset: String,
    },
    /// Validate a custom catalog file
    Validate {
        /// Catalog kind: tables, equipment or prices
        kind: String,
        /// Path to JSON catalog file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "ptrab=debug,ptrab_core=debug"
    } else {
        "ptrab=info,ptrab_core=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Items {
            snapshot,
            ptrab,
            catalog,
            output,
        } => commands::items::run(&snapshot, &ptrab, catalog.as_deref(), &output),
        Commands::Dor {
            snapshot,
            ptrab,
            plan,
            catalog,
            single_subitem,
            save,
            output,
        } => commands::dor::run(commands::dor::DorArgs {
            snapshot,
            ptrab,
            plan,
            catalog,
            single_subitem,
            save,
            output,
        }),
        Commands::Split {
            total,
            nd39,
            destination,
            ug,
            output,
        } => commands::split::run(&total, &nd39, destination.as_deref(), ug.as_deref(), &output),
        Commands::Fuel {
            input_file,
            from,
            to,
            local,
            prices,
            equipment,
            output,
        } => commands::fuel::run(commands::fuel::FuelArgs {
            input_file,
            from,
            to,
            local,
            prices,
            equipment,
            output,
        }),
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(),
            CatalogAction::Show { preset } => commands::catalog::show(&preset),
            CatalogAction::Validate { kind, file } => commands::catalog::validate(&kind, &file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
