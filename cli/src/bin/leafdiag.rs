use clap::{Parser, Subcommand};
use cli::{
    config_schema, failure_exit_code, load_config, render_error, render_report, save_config,
};
use color_eyre::eyre::Result;
use leaf_diag::{AnalysisConfig, LeafAnalyzer, VisionRuntime, acquisition::acquire_file};
use std::{
    path::{Path, PathBuf},
    process::ExitCode,
};
use tracing::info;
use tracing_subscriber::{self, EnvFilter};

#[derive(Parser)]
#[command(author, version, about = "Estimate leaf disease severity from a photograph", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a leaf photograph
    Analyze {
        /// Path to the leaf image
        #[arg(short, long)]
        input: PathBuf,
        /// Where to save the image with lesion outlines
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Analysis configuration (.toml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Where to save the JSON summary
        #[arg(long)]
        json: Option<PathBuf>,
    },
    /// Write the default configuration to a file
    InitConfig {
        /// Destination (.toml or .json)
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Print the JSON schema of the configuration file
    Schema,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Analyze { input, output, config, json } => {
            return analyze(input, output.as_deref(), config.as_deref(), json.as_deref()).await;
        }
        Commands::InitConfig { output } => {
            save_config(&AnalysisConfig::default(), output)?;
            info!("📄 Default configuration saved to: {:?}", output);
        }
        Commands::Schema => {
            println!("{}", config_schema()?);
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Analysis failures are reported once through `render_error` and turned
/// into a failing exit code; setup errors still propagate to `color_eyre`.
async fn analyze(
    input: &Path,
    output: Option<&Path>,
    config_path: Option<&Path>,
    json_output: Option<&Path>,
) -> Result<ExitCode> {
    let config = match config_path {
        Some(path) => load_config(path)?,
        None => AnalysisConfig::default(),
    };

    info!("🔄 Loading vision backend...");
    let runtime = VisionRuntime::load_default().await?;
    let analyzer = LeafAnalyzer::builder().with_config(config).try_build(runtime)?;

    info!("🔬 Analyzing {:?}", input);
    let outcome = match acquire_file(input, &analyzer.config().acquisition).await {
        Ok(image) => analyzer.analyze(&image),
        Err(err) => Err(err),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            eprintln!("{}", render_error(&err));
            return Ok(failure_exit_code(&err));
        }
    };

    let summary = result.summary();
    println!("{}", render_report(&summary));

    if let Some(path) = output {
        result.annotated.save(path)?;
        info!("🖼️  Annotated image saved to: {:?}", path);
    }

    if let Some(path) = json_output {
        std::fs::write(path, summary.to_json()?)?;
        info!("📄 Summary saved to: {:?}", path);
    }

    info!("✅ Analysis complete");
    Ok(ExitCode::SUCCESS)
}
