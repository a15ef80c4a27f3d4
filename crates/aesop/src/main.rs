use aesop::{
    AesopConfig, Cli, Commands, FileSystemStore, HttpImageFetcher, MediaStore, OpenAiImageClient,
    PgStoryStore, StorybookPipeline, establish_pool,
};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AesopConfig::from_file(path)?,
        None => AesopConfig::load()?,
    };

    // The CLI is the only layer that reads the environment; everything
    // downstream receives explicit configuration.
    if config.image.api_key.is_none() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.image.api_key = Some(key);
        }
    }
    if config.database.url.is_none() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database.url = Some(url);
        }
    }

    let database_url = config
        .database
        .url
        .clone()
        .ok_or("database URL not configured (set [database].url or DATABASE_URL)")?;

    let pool = establish_pool(&database_url)?;
    let repo = PgStoryStore::new(pool);
    let store = FileSystemStore::new(&config.storage.root)?;
    let generator = OpenAiImageClient::new(config.image.clone())?;
    let fetcher = HttpImageFetcher::new(&config.document)?;
    let pipeline = StorybookPipeline::new(generator, store, repo, fetcher, &config);

    match cli.command {
        Commands::Illustrate { story_id } => {
            let report = pipeline.illustrate(story_id).await?;
            println!(
                "story {}: {} ({}/{} pages illustrated{})",
                story_id,
                report.status,
                report.succeeded,
                report.total_pages,
                if report.budget_exhausted {
                    ", run budget exhausted"
                } else {
                    ""
                }
            );
            if let Some(summary) = &report.failure_summary {
                println!("  {}", summary);
            }
        }
        Commands::Status { story_id } => {
            let (story, attempt) = pipeline.status(story_id).await?;
            println!("story {}: {}", story_id, story.status);
            if let Some(summary) = &story.failure_summary {
                println!("  {}", summary);
            }
            if let Some(attempt) = attempt {
                println!(
                    "  last generation ({}): {}{}",
                    attempt.kind,
                    attempt.status,
                    attempt
                        .error_message
                        .as_deref()
                        .map(|msg| format!(" - {}", msg))
                        .unwrap_or_default()
                );
            }
        }
        Commands::Export { story_id, output } => {
            let stored = pipeline.export(story_id).await?;
            println!(
                "exported story {} to {} ({} bytes)",
                story_id, stored.key, stored.size_bytes
            );
            if let Some(path) = output {
                let bytes = pipeline.store().get(&stored.key).await?;
                std::fs::write(&path, bytes)?;
                println!("wrote {}", path.display());
            }
        }
    }

    Ok(())
}
