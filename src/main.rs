//! Football match prediction CLI
//!
//! Trains per-league outcome classifiers from historical CSVs and serves
//! predictions over HTTP.

use clap::{Parser, Subcommand};
use footy::{Config, Result};

#[derive(Parser)]
#[command(name = "footy")]
#[command(about = "Football match outcome prediction from team form", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train classifiers from league history
    Train {
        /// Train a single league instead of every league found
        #[arg(long)]
        league: Option<String>,
        /// Override number of epochs
        #[arg(long)]
        epochs: Option<usize>,
        /// Override learning rate
        #[arg(long)]
        lr: Option<f64>,
    },
    /// Predict one fixture
    Predict {
        /// League identifier (case-insensitive)
        league: String,
        /// Home team name
        home: String,
        /// Away team name
        away: String,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Run the prediction HTTP server
    Serve {
        /// Override listen port
        #[arg(long)]
        port: Option<u16>,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Show per-league data status
    Status,
}

#[derive(Clone, Debug)]
enum OutputFormat {
    Table,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}. Use table or json.", s)),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train { league, epochs, lr } => commands::train(&config, league, epochs, lr),
        Commands::Predict {
            league,
            home,
            away,
            format,
        } => commands::predict(&config, &league, &home, &away, format),
        Commands::Serve { port } => commands::serve(&config, port),
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use std::path::Path;

    use footy::data::loader;
    use footy::features::form::FormLedger;
    use footy::predict::registry::{self, format_forecast, LeagueDir, LeagueRegistry, SnapshotBundle};
    use footy::training::train_classifier;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all(&config.data.data_dir)?;
        std::fs::create_dir_all(&config.data.model_dir)?;
        println!(
            "Created {}/ and {}/ directories",
            config.data.data_dir, config.data.model_dir
        );

        println!("\nNext steps:");
        println!("  1. Drop league CSVs into {}/<league>/", config.data.data_dir);
        println!("  2. Run 'footy train' to fit a classifier per league");
        println!("  3. Run 'footy serve' to expose /api/predict");

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let leagues = registry::discover_leagues(Path::new(&config.data.data_dir))?;
        if leagues.is_empty() {
            println!("No leagues under {}/", config.data.data_dir);
            return Ok(());
        }

        println!("Data Status");
        println!("───────────────────────────────");
        for league in leagues {
            let report = loader::load_league_dir(&league.path, config.data.dayfirst)?;

            let mut teams: Vec<&str> = report
                .events
                .iter()
                .flat_map(|e| [e.home_team.as_str(), e.away_team.as_str()])
                .collect();
            teams.sort();
            teams.dedup();

            println!("  {}:", league.id);
            println!(
                "    Files:    {} read, {} skipped",
                report.files_read, report.files_skipped
            );
            println!(
                "    Matches:  {} ({} rows dropped)",
                report.events.len(),
                report.rows_skipped
            );
            println!("    Teams:    {}", teams.len());
            if let (Some(first), Some(last)) = (report.events.first(), report.events.last()) {
                println!("    Range:    {} to {}", first.date, last.date);
            }
        }

        Ok(())
    }

    pub fn train(
        config: &Config,
        league: Option<String>,
        epochs: Option<usize>,
        lr: Option<f64>,
    ) -> Result<()> {
        use burn::backend::{Autodiff, NdArray};
        type TrainingBackend = Autodiff<NdArray<f32>>;

        let mut training_config = config.training.clone();
        if let Some(e) = epochs {
            training_config.epochs = e;
        }
        if let Some(lr) = lr {
            training_config.learning_rate = lr;
        }

        // Matching by lowercased id keeps the on-disk directory spelling
        // intact for filesystem access
        let discovered = registry::discover_leagues(Path::new(&config.data.data_dir))?;
        let leagues: Vec<LeagueDir> = match league {
            Some(l) => {
                let id = l.to_lowercase();
                let matched: Vec<LeagueDir> =
                    discovered.into_iter().filter(|d| d.id == id).collect();
                if matched.is_empty() {
                    return Err(footy::FootyError::Config(format!(
                        "No league directory for '{}' under {}/",
                        id, config.data.data_dir
                    )));
                }
                matched
            }
            None => discovered,
        };
        if leagues.is_empty() {
            return Err(footy::FootyError::Config(format!(
                "No league directories under {}/",
                config.data.data_dir
            )));
        }

        let device = Default::default();
        for league in leagues {
            println!("Training league '{}'...", league.id);

            let report = loader::load_league_dir(&league.path, config.data.dayfirst)?;
            println!(
                "  {} matches from {} files ({} rows dropped)",
                report.events.len(),
                report.files_read,
                report.rows_skipped
            );

            let mut ledger = FormLedger::new(config.form.window);
            let rows = ledger.process(&report.events);

            let (model, scaler, labels, train_report) =
                train_classifier::<TrainingBackend>(&device, &rows, &training_config)?;

            println!("  Train: {}", train_report.train_metrics);
            println!("  Val:   {}", train_report.val_metrics);

            // Persist the bundle: weights + scaler + label decoder
            let league_dir = Path::new(&config.data.model_dir).join(&league.id);
            std::fs::create_dir_all(&league_dir)?;

            let classifier_path = LeagueRegistry::classifier_path(config, &league.id);
            model.save(classifier_path.to_str().ok_or_else(|| {
                footy::FootyError::Config("non-utf8 model path".to_string())
            })?)?;
            SnapshotBundle::new(scaler, labels)
                .save(&LeagueRegistry::bundle_path(config, &league.id))?;

            println!("  Saved bundle under {}", league_dir.display());
        }

        Ok(())
    }

    pub fn predict(
        config: &Config,
        league: &str,
        home: &str,
        away: &str,
        format: OutputFormat,
    ) -> Result<()> {
        let registry = LeagueRegistry::load(config)?;

        let forecast = registry.predict(league, home, away);
        match format {
            OutputFormat::Table => {
                print!("{}", format_forecast(&forecast, home, away));
            }
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&forecast)?);
            }
        }

        Ok(())
    }

    pub fn serve(config: &Config, port: Option<u16>) -> Result<()> {
        let mut config = config.clone();
        if let Some(p) = port {
            config.server.port = p;
        }

        let registry = LeagueRegistry::load(&config)?;
        if registry.is_empty() {
            log::warn!("No trained leagues loaded; every request will get the fallback forecast");
        } else {
            log::info!("Serving leagues: {}", registry.league_ids().join(", "));
        }

        let runtime = tokio::runtime::Runtime::new()?;
        runtime.block_on(footy::serve::run(registry, &config))
    }
}
