use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use retouch::app::App;
use retouch::models::{Config, SubjectType};
use retouch::session::Action;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "retouch")]
#[command(about = "AI-assisted photo filters and generative edits")]
struct CliArgs {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Suggest filter settings for a photo and print them as JSON.
    Analyze {
        image: PathBuf,
        /// Second image whose look should be matched.
        #[arg(long)]
        reference: Option<PathBuf>,
        #[arg(long, default_value = "nature", value_parser = parse_subject_arg)]
        subject: SubjectType,
        #[arg(long, default_value = "")]
        instruction: String,
    },
    /// Generate an edited version of a photo.
    Edit {
        image: PathBuf,
        #[arg(long)]
        instruction: Option<String>,
        #[arg(long, short)]
        output: PathBuf,
    },
    /// Import several photos and export them with a manifest.
    Batch {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        #[arg(long)]
        out: PathBuf,
        /// Run filter analysis on each photo before exporting.
        #[arg(long)]
        analyze: bool,
    },
}

fn parse_subject_arg(input: &str) -> std::result::Result<SubjectType, String> {
    input.parse().map_err(|e: retouch::Error| e.to_string())
}

async fn run(command: Command) -> Result<()> {
    let config = Config::from_env()?;
    let mut app = App::from_config(&config);

    match command {
        Command::Analyze {
            image,
            reference,
            subject,
            instruction,
        } => {
            app.load_image(&image).await?;
            if let Some(reference) = reference {
                app.load_reference(&reference).await?;
            }
            app.dispatch(Action::SetSubject(subject));
            app.dispatch(Action::SetInstruction(instruction));

            let result = app.suggest_filters().await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            info!("CSS filter: {}", app.state().css_filter());
        }
        Command::Edit {
            image,
            instruction,
            output,
        } => {
            app.load_image(&image).await?;
            let edited = app.generate_edit(instruction.as_deref()).await?;
            tokio::fs::write(&output, edited.decode()?)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Saved edited image to {}", output.display());
        }
        Command::Batch {
            images,
            out,
            analyze,
        } => {
            let items = app.import_batch(&images).await?;
            if analyze {
                let analyzed = app.analyze_collection().await?;
                info!("Analyzed {} of {} images", analyzed.len(), items.len());
            }
            let entries = app.export_batch(&out).await?;
            info!("Exported {} images to {}", entries.len(), out.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "retouch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = CliArgs::parse();

    if let Err(e) = run(args.command).await {
        match e.downcast_ref::<retouch::Error>() {
            Some(app_error) => error!("{} ({})", app_error.user_message(), app_error),
            None => error!("{:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}
