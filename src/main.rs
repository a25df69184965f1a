use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use voicecheck::audio::PathListPicker;
use voicecheck::config::AppConfig;
use voicecheck::flow::{Route, Workflow};
use voicecheck::playback::PlaybackState;
use voicecheck::present::{Notification, ResultPresenter};
use voicecheck::upload::{Operation, UploadClient};

#[derive(Parser)]
#[command(name = "voicecheck")]
#[command(version, about = "Check voice clips for AI generation and manage audio watermarks")]
struct Cli {
    /// Configuration file (defaults to <config dir>/voicecheck/config.toml)
    #[arg(long, env = "VOICECHECK_CONFIG")]
    config: Option<PathBuf>,

    /// Server root; derives every endpoint from it
    #[arg(long, env = "VOICECHECK_SERVER")]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Classify one or more clips as real or fake
    Classify {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Show the server's last classification
    Poll,
    /// Add or detect an audio watermark
    Watermark {
        #[command(subcommand)]
        action: WatermarkAction,
    },
    /// Perturb a clip against cloning and watermark it
    Protect {
        file: PathBuf,
        /// Save the protected clip to the download directory
        #[arg(long)]
        download: bool,
    },
    /// Record from the microphone
    Record {
        #[arg(long, default_value_t = 5)]
        seconds: u64,
        /// Send the recording once it is saved
        #[arg(long, value_enum)]
        send: Option<SendTo>,
    },
    /// Play a clip to the end
    Play { file: PathBuf },
}

#[derive(Subcommand)]
enum WatermarkAction {
    Add {
        file: PathBuf,
        /// Save the watermarked clip to the download directory
        #[arg(long)]
        download: bool,
    },
    Detect { file: PathBuf },
}

#[derive(Clone, Copy, ValueEnum)]
enum SendTo {
    Classify,
    WatermarkAdd,
    WatermarkDetect,
}

impl From<SendTo> for Operation {
    fn from(send: SendTo) -> Self {
        match send {
            SendTo::Classify => Operation::Classify,
            SendTo::WatermarkAdd => Operation::WatermarkAdd,
            SendTo::WatermarkDetect => Operation::WatermarkDetect,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voicecheck=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        debug!("Command failed: {}", e);
        eprintln!("{}", Notification::from_error(&e));
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(cli: &Cli) -> voicecheck::Result<AppConfig> {
    let config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default()?,
    };

    let config = match &cli.server {
        Some(base) => config.with_server(base),
        None => config,
    };
    config.validate()?;
    Ok(config)
}

async fn run(cli: Cli) -> voicecheck::Result<()> {
    let config = load_config(&cli)?;
    info!("Using classify endpoint {}", config.server.classify_url);

    match cli.command {
        Command::Classify { files } => classify(&config, files).await,
        Command::Poll => {
            let client = UploadClient::new(&config.server)?;
            let result = client.fetch_classification().await?;
            print!("{}", ResultPresenter::present(&result));
            Ok(())
        }
        Command::Watermark { action } => match action {
            WatermarkAction::Add { file, download } => {
                send_from_watermark(&config, file, Operation::WatermarkAdd, download).await
            }
            WatermarkAction::Detect { file } => {
                send_from_watermark(&config, file, Operation::WatermarkDetect, false).await
            }
        },
        Command::Protect { file, download } => {
            send_from_watermark(&config, file, Operation::Protect, download).await
        }
        Command::Record { seconds, send } => record(&config, seconds, send).await,
        Command::Play { file } => play(&config, file).await,
    }
}

/// Every clip is sent from its own preview screen; one failure does not
/// stop the rest
async fn classify(config: &AppConfig, files: Vec<PathBuf>) -> voicecheck::Result<()> {
    let mut workflow = Workflow::from_config(config, Box::new(PathListPicker::new(files)))?;
    let clips = workflow.pick_batch()?;
    let mut failed = None;

    for clip in clips {
        workflow.navigate(Route::Playback(clip.clone()))?;
        println!("{} ({})", clip.display_name(), clip.duration_label());

        match workflow.submit(Operation::Classify).await {
            Ok(result) => {
                print!("{}", ResultPresenter::present(result));
                workflow.back()?;
            }
            Err(e) => {
                eprintln!("{}", workflow.notify(&e));
                failed = Some(e);
            }
        }
        workflow.back()?;
    }

    match failed {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn send_from_watermark(
    config: &AppConfig,
    file: PathBuf,
    operation: Operation,
    download: bool,
) -> voicecheck::Result<()> {
    let mut workflow = Workflow::from_config(config, Box::new(PathListPicker::new(vec![file])))?;
    workflow.pick()?;
    workflow.navigate(Route::Watermark)?;

    let result = workflow.submit(operation).await?;
    print!("{}", ResultPresenter::present(result));

    if download {
        let saved = workflow.download().await?;
        println!("Saved {}", saved.uri().display());
    }
    Ok(())
}

async fn record(config: &AppConfig, seconds: u64, send: Option<SendTo>) -> voicecheck::Result<()> {
    let mut workflow = Workflow::from_config(config, Box::new(PathListPicker::default()))?;
    workflow.navigate(Route::Recording)?;
    workflow.start_recording()?;

    println!("Recording for {}s...", seconds);
    tokio::time::sleep(Duration::from_secs(seconds)).await;

    let clip = workflow.stop_recording()?;
    println!("Saved {} ({})", clip.uri().display(), clip.duration_label());

    if let Some(send) = send {
        let result = workflow.submit(send.into()).await?;
        print!("{}", ResultPresenter::present(result));
    }
    Ok(())
}

async fn play(config: &AppConfig, file: PathBuf) -> voicecheck::Result<()> {
    let mut workflow = Workflow::from_config(config, Box::new(PathListPicker::new(vec![file])))?;
    let clip = workflow.pick()?;
    workflow.open_playback()?;

    println!("Playing {} ({})", clip.display_name(), clip.duration_label());
    workflow.preview()?;
    while workflow.poll_playback() == PlaybackState::Playing {
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    workflow.back()?;
    Ok(())
}
