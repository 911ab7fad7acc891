mod commands;
mod i18n;
mod logging;
mod profile;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use portal_logging::{portal_info, portal_warn};
use results_core::{PatientInfo, PortalConfig};
use results_engine::{ClientSettings, PortalClient};

use crate::commands::{CliError, OutputOptions};
use crate::i18n::{Catalog, Language};
use crate::profile::ProfileStore;

#[derive(Parser)]
#[command(name = "lab-results")]
#[command(about = "Fetch lab results and their PDF reports from the results portal")]
struct Cli {
    /// Portal origin (defaults to the public portal)
    #[arg(long, global = true)]
    base_url: Option<String>,
    /// Message language, `es` or `en` (defaults to the saved preference)
    #[arg(long, global = true)]
    lang: Option<String>,
    /// Directory holding the saved patient profile
    #[arg(long, global = true, default_value = ".")]
    profile_dir: PathBuf,
    /// Also write a debug log to this file
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// More log output (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save, show or clear the patient profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Save the preferred message language
    Language {
        /// `es` or `en`
        code: String,
    },
    /// Fetch results by control number and lab license
    Fetch {
        #[arg(long)]
        control: String,
        #[arg(long)]
        license: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Fetch results from a link shared by the lab
    Link {
        url: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Save patient last names and birth date
    Set {
        /// Last names as registered at the lab
        #[arg(long)]
        name: String,
        #[arg(long)]
        year: String,
        #[arg(long)]
        month: String,
        #[arg(long)]
        day: String,
    },
    /// Print the saved patient
    Show,
    /// Forget the saved patient
    Clear,
}

#[derive(Args)]
struct OutputArgs {
    /// Print results as JSON
    #[arg(long)]
    json: bool,
    /// Download every result PDF into this directory
    #[arg(long)]
    download: Option<PathBuf>,
}

impl From<OutputArgs> for OutputOptions {
    fn from(args: OutputArgs) -> Self {
        Self {
            json: args.json,
            download_dir: args.download,
        }
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::initialize(
        portal_logging::level_for_verbosity(cli.verbose),
        cli.log_file.as_deref(),
    );

    let store = ProfileStore::new(cli.profile_dir.clone());
    let catalog = Catalog::new(resolve_language(cli.lang.as_deref(), &store));
    let config = match cli.base_url.as_deref() {
        Some(base_url) => PortalConfig::with_base_url(base_url),
        None => PortalConfig::default(),
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let outcome = match cli.command {
        Commands::Profile { action } => match action {
            ProfileAction::Set {
                name,
                year,
                month,
                day,
            } => commands::set_patient(&store, &catalog, PatientInfo::new(name, year, month, day)),
            ProfileAction::Show => commands::show_patient(&store),
            ProfileAction::Clear => commands::clear_patient(&store, &catalog),
        },
        Commands::Language { code } => commands::set_language(&store, &code).map(|_| ()),
        Commands::Fetch {
            control,
            license,
            output,
        } => commands::manual_key(&control, &license).and_then(|key| {
            runtime.block_on(lookup(&store, &catalog, config, key, output.into()))
        }),
        Commands::Link { url, output } => commands::link_key(&url).and_then(|key| {
            runtime.block_on(lookup(&store, &catalog, config, key, output.into()))
        }),
    };

    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(err) => {
            portal_info!("Command failed: {}", err);
            eprintln!("{}", commands::user_message(&catalog, &err));
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn lookup(
    store: &ProfileStore,
    catalog: &Catalog,
    config: PortalConfig,
    key: results_core::LookupKey,
    options: OutputOptions,
) -> Result<(), CliError> {
    let patient = store.patient().ok_or(CliError::NoPatientInfo)?;
    let mut client = PortalClient::new(config, ClientSettings::default()).map_err(CliError::Fetch)?;
    commands::run_lookup(&mut client, catalog, &patient, &key, &options)
        .await
        .map(|_| ())
}

/// Flag, then saved preference, then Spanish.
fn resolve_language(flag: Option<&str>, store: &ProfileStore) -> Language {
    if let Some(code) = flag {
        match Language::from_code(code) {
            Some(language) => return language,
            None => portal_warn!("Ignoring unsupported language {:?}", code),
        }
    }
    store
        .language()
        .as_deref()
        .and_then(Language::from_code)
        .unwrap_or_default()
}
