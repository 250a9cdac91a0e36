use api_client::HttpBackend;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use scanreg_core::config::{
    backend_url_from_env_value, exempt_categories_from_env_value, http_timeout_from_env_value,
};
use scanreg_core::constants::{
    DEFAULT_CATALOG_FILE, DEFAULT_CATEGORY, DEFAULT_PATIENT_DATA_DIR,
};
use scanreg_core::{
    check_amount, compute_charges, compute_due, currency, is_settled, CoreConfig, Directory,
    FileDirectory, FilePatientStore, ScanId,
};
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scanreg")]
#[command(about = "Diagnostic-centre registration pricing CLI")]
struct Cli {
    /// YAML catalog used when no backend URL is set
    #[arg(long, global = true, env = "SCANREG_CATALOG_FILE", default_value = DEFAULT_CATALOG_FILE)]
    catalog_file: PathBuf,
    /// Backend base URL; takes precedence over the catalog file
    #[arg(long, global = true, env = "SCANREG_BACKEND_URL")]
    backend_url: Option<String>,
    /// Root of the file patient store
    #[arg(long, global = true, env = "PATIENT_DATA_DIR", default_value = DEFAULT_PATIENT_DATA_DIR)]
    data_dir: PathBuf,
    /// Comma-separated fee-exempt categories
    #[arg(long, global = true, env = "SCANREG_EXEMPT_CATEGORIES")]
    exempt_categories: Option<String>,
    /// Backend request timeout in seconds
    #[arg(long, global = true, env = "SCANREG_HTTP_TIMEOUT_SECS")]
    http_timeout_secs: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// List patient categories and whether each is fee-exempt
    Categories,
    /// List the scan catalog
    Catalog,
    /// Price a scan selection
    Quote {
        /// Patient category
        #[arg(long, default_value = DEFAULT_CATEGORY)]
        category: String,
        /// Scan id (repeatable)
        #[arg(long = "scan", required = true)]
        scans: Vec<u64>,
    },
    /// Outstanding amount: total - received - discount
    Due {
        /// Payable total
        total: Decimal,
        /// Amount received
        #[arg(long, default_value_t = Decimal::ZERO)]
        received: Decimal,
        /// Discount given
        #[arg(long, default_value_t = Decimal::ZERO)]
        discount: Decimal,
    },
    /// List registrations in the file store
    List,
}

impl Cli {
    fn config(&self) -> Result<CoreConfig, Box<dyn std::error::Error>> {
        Ok(CoreConfig::new(
            self.data_dir.clone(),
            self.catalog_file.clone(),
            backend_url_from_env_value(self.backend_url.clone())?,
            exempt_categories_from_env_value(self.exempt_categories.clone())?,
            http_timeout_from_env_value(self.http_timeout_secs.clone())?,
        )?)
    }
}

fn directory(cfg: &CoreConfig) -> Result<Box<dyn Directory>, Box<dyn std::error::Error>> {
    match HttpBackend::from_config(cfg)? {
        Some(backend) => Ok(Box::new(backend)),
        None => Ok(Box::new(FileDirectory::new(cfg.catalog_file()))),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scanreg=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let cfg = cli.config()?;

    match cli.command {
        Some(Commands::Categories) => {
            for category in cfg.category_table().categories() {
                let marker = if category.is_fee_exempt {
                    "exempt"
                } else {
                    "paid"
                };
                println!("{:<14} {}", category.name, marker);
            }
        }
        Some(Commands::Catalog) => {
            let scans = directory(&cfg)?.scans().await?;
            if scans.is_empty() {
                println!("No scans found.");
            } else {
                for scan in scans {
                    println!(
                        "ID: {}, Name: {}, Charge: {}, Minutes: {}",
                        scan.id,
                        scan.name,
                        currency(scan.charge),
                        scan.estimated_minutes
                    );
                }
            }
        }
        Some(Commands::Quote { category, scans }) => {
            let catalog = directory(&cfg)?.scans().await?;
            let selected: BTreeSet<ScanId> = scans.into_iter().map(ScanId).collect();
            for id in &selected {
                if !catalog.iter().any(|scan| scan.id == *id) {
                    eprintln!("Warning: scan {} is not in the catalog and was ignored", id);
                }
            }
            let category = cfg.category_table().category(&category);
            let charges = compute_charges(&selected, &catalog, &category);

            println!("Category: {}", category.name);
            println!("Gross: {}", currency(charges.gross_amount));
            if category.is_fee_exempt {
                println!("Fee-exempt category: charges waived");
            }
            println!("Total: {}", currency(charges.total_amount));
            println!("Minutes: {}", charges.total_minutes);
        }
        Some(Commands::Due {
            total,
            received,
            discount,
        }) => {
            check_amount("total", total)?;
            check_amount("received", received)?;
            check_amount("discount", discount)?;
            let due = compute_due(total, received, discount);
            println!("Due: {}", currency(due));
            if is_settled(due) {
                println!("Settled: receipt may be printed");
            }
        }
        Some(Commands::List) => {
            let store = FilePatientStore::new(&cfg);
            let registrations = store.list_registrations();
            if registrations.is_empty() {
                println!("No registrations found.");
            } else {
                for stored in registrations {
                    let reg = &stored.registration;
                    println!(
                        "CRO: {}, Name: {}, Scans: {}, Total: {}, Due: {}, Created: {}",
                        reg.cro,
                        reg.patient_name,
                        reg.scan_type,
                        reg.total_amount,
                        reg.due_amount,
                        stored.created_at
                    );
                }
            }
        }
        None => {
            println!("Use 'scanreg --help' for commands");
        }
    }

    Ok(())
}
