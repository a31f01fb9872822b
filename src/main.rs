//! Boxer ingestion and matchup prediction CLI

use clap::{Parser, Subcommand};
use ringside::{Config, Result};

#[derive(Parser)]
#[command(name = "ringside")]
#[command(about = "Boxer profile scraper and Elo-style matchup predictor", long_about = None)]
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
    /// Create a default config file and data directories
    Init,
    /// Crawl the category listing into the batch URL file
    Links,
    /// Ingest a single profile page
    Ingest {
        /// Profile page URL
        url: String,
    },
    /// Ingest every URL in the batch file
    Batch {
        /// Override the URL list path
        #[arg(long)]
        file: Option<String>,
    },
    /// Resolve missing opponent/winner references in stored bouts
    Resolve,
    /// Show database status
    Status,
    /// Print an athlete document as JSON
    Show {
        /// Athlete ID
        id: i64,
    },
    /// Predict a hypothetical matchup between two athletes
    Predict {
        /// Athlete A ID (ties favor this side)
        athlete_a: i64,
        /// Athlete B ID
        athlete_b: i64,
    },
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
        Commands::Init => commands::init(&cli.config),
        Commands::Links => commands::links(&config),
        Commands::Ingest { url } => commands::ingest(&config, &url),
        Commands::Batch { file } => commands::batch(&config, file),
        Commands::Resolve => commands::resolve(&config),
        Commands::Status => commands::status(&config),
        Commands::Show { id } => commands::show(&config, id),
        Commands::Predict { athlete_a, athlete_b } => {
            commands::predict(&config, athlete_a, athlete_b)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use ringside::data::scrapers::category::{self, CategoryCrawler};
    use ringside::data::scrapers::PageClient;
    use ringside::data::{Database, Resolver};
    use ringside::ingest::Ingestor;
    use ringside::{report, AthleteId};

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        println!("Created data/ directory");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'ringside links' to collect profile URLs");
        println!("  3. Run 'ringside batch' to ingest them");
        println!("  4. Run 'ringside resolve' to repair cross-references");
        println!("  5. Run 'ringside predict <a> <b>' to forecast a matchup");

        Ok(())
    }

    pub fn links(config: &Config) -> Result<()> {
        let client = PageClient::new(&config.scrape)?;
        let crawler = CategoryCrawler::new(&client);

        println!("Crawling {}...", config.scrape.category_url);
        let members = crawler.collect_member_urls(&config.scrape.category_url)?;
        println!("Found {} member pages, filtering professionals...", members.len());

        let professionals = crawler.filter_professionals(&members);
        category::write_urls(&professionals, &config.data.urls_path)?;
        println!(
            "Wrote {} professional profile URLs to {}",
            professionals.len(),
            config.data.urls_path
        );

        Ok(())
    }

    pub fn ingest(config: &Config, url: &str) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let ingestor = Ingestor::new(&db, config)?;

        let (outcome, bouts) = ingestor.ingest_url(url)?;
        println!("{:?}: {} bouts inserted", outcome, bouts);

        Ok(())
    }

    pub fn batch(config: &Config, file: Option<String>) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let ingestor = Ingestor::new(&db, config)?;
        let urls_path = file.unwrap_or_else(|| config.data.urls_path.clone());

        println!("Ingesting from {}...", urls_path);
        let report = ingestor.run_batch(&urls_path)?;

        println!("Batch complete");
        println!("  Pages:          {}", report.pages);
        println!("  Ingested:       {}", report.ingested);
        println!("  Already known:  {}", report.already_known);
        println!("  Skipped:        {}", report.skipped);
        println!("  Bouts stored:   {}", report.bouts);
        println!("\nRun 'ringside resolve' to repair cross-references.");

        Ok(())
    }

    pub fn resolve(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let resolver = Resolver::new(
            config.resolve.batch_size,
            &config.data.unresolved_opponents_log,
            &config.data.unresolved_winners_log,
        );

        let report = resolver.run(&db)?;
        println!("Resolved opponents and winners in bouts table");
        println!("  Examined:            {}", report.examined);
        println!("  Opponents resolved:  {}", report.opponents_resolved);
        println!("  Winners resolved:    {}", report.winners_resolved);
        println!(
            "  Still unresolved:    {} opponents, {} winners (logged to files)",
            report.opponents_unresolved, report.winners_unresolved
        );

        Ok(())
    }

    pub fn status(config: &Config) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let stats = db.stats()?;

        println!("Database Status");
        println!("───────────────────────────────");
        println!("  Path:        {}", config.data.database_path);
        println!("  Athletes:    {}", stats.athlete_count);
        println!("  Bouts:       {}", stats.bout_count);
        println!("  Unresolved:  {}", stats.unresolved_count);

        Ok(())
    }

    pub fn show(config: &Config, id: i64) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let document = report::athlete_document(&db, AthleteId(id))?;
        println!("{}", serde_json::to_string_pretty(&document).map_err(|e| {
            ringside::RingsideError::Parse(e.to_string())
        })?);
        Ok(())
    }

    pub fn predict(config: &Config, athlete_a: i64, athlete_b: i64) -> Result<()> {
        let db = Database::open(&config.data.database_path)?;
        let forecast =
            report::prediction_document(&db, AthleteId(athlete_a), AthleteId(athlete_b))?;

        println!("Predicted winner: {} ({})", forecast.winner_name, forecast.winner_id);
        println!("  Win probability:  {:.1}%", forecast.win_probability);
        println!("  Outcome:          {}", forecast.outcome);
        println!("  {}", forecast.rating_differential);
        println!("  KO likelihood:    {}", forecast.ko_likelihood);

        Ok(())
    }
}
