use clap::Parser;
use prozorro_tenders::utils::{logger, validation::Validate};
use prozorro_tenders::{CliConfig, EtlEngine, LocalStorage, TenderPipeline};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CliConfig::parse();

    if cli.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting prozorro-tenders");
    if cli.verbose {
        tracing::debug!("CLI flags: {:?}", cli);
    }

    let config = match cli.resolve().and_then(|config| config.validate().map(|_| config)) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("❌ Configuration validation failed: {}", e);
            tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
            eprintln!("❌ {}", e.user_friendly_message());
            std::process::exit(1);
        }
    };

    tracing::info!(
        "🔧 Buyer {} | year {} | output: {}",
        config.edrpou,
        config.year,
        config.output_path
    );

    let storage = LocalStorage::new(config.output_path.clone());
    let pipeline = TenderPipeline::new(storage, config)?;
    let engine = EtlEngine::new(pipeline);

    match engine.run().await {
        Ok(Some(_)) => {
            tracing::info!("✅ ETL process completed successfully!");
        }
        Ok(None) => {
            println!("Тендери не знайдено :(");
        }
        Err(e) => {
            tracing::error!(
                "❌ ETL process failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}
