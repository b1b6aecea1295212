use canvas_grid_uploader::api::types::Point;
use canvas_grid_uploader::assets::list_directory;
use canvas_grid_uploader::config::{
    parse_canvas_position, Direction, IngestionPolicy, DEFAULT_API_VERSION, DEFAULT_PORTAL_URL,
};
use canvas_grid_uploader::notes::fetch_note_texts;
use canvas_grid_uploader::{
    api, classify, ApiConfig, BluescapeClient, ConfigError, LayoutConfig, LayoutError,
    LayoutOrchestrator, UploadMethod, UploadReport, VerticalAlignment,
};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "canvas-grid-upload",
    version,
    about = "Upload assets into a new canvas laid out as a grid in a Bluescape workspace"
)]
struct Cli {
    #[command(flatten)]
    api: ApiArgs,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Args)]
struct ApiArgs {
    /// OAuth2 access token
    #[arg(long, env = "BLUESCAPE_TOKEN", hide_env_values = true, global = true)]
    token: Option<String>,

    /// Workspace receiving the content
    #[arg(long, env = "BLUESCAPE_WORKSPACE_ID", global = true)]
    workspace_id: Option<String>,

    #[arg(long, env = "BLUESCAPE_API_URL", default_value = DEFAULT_PORTAL_URL, global = true)]
    api_url: String,

    #[arg(long, env = "BLUESCAPE_API_VERSION", default_value = DEFAULT_API_VERSION, global = true)]
    api_version: String,

    /// Give up on a single GraphQL request after this many seconds
    #[arg(long, global = true)]
    request_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload files (from a local folder or by URL) into a grid on a new canvas
    Upload {
        /// URL or LOCAL
        #[arg(long)]
        upload_method: UploadMethod,

        /// Folder whose files are uploaded (LOCAL)
        #[arg(long)]
        path_to_files: Option<PathBuf>,

        /// '|' separated list of URLs (URL)
        #[arg(long)]
        assets_to_upload_by_url: Option<String>,

        /// Default: "UPLOADED CONTENT - <timestamp>"
        #[arg(long)]
        canvas_name: Option<String>,

        /// Proposed canvas position, "(x,y)"
        #[arg(long, value_parser = parse_canvas_position, default_value = "(0,0)")]
        canvas_position: Point,

        /// Upload into this existing canvas instead of creating one
        #[arg(long)]
        canvas_id: Option<String>,

        /// Direction to look for free space: up, down, left, right
        #[arg(long, default_value = "right")]
        direction: Direction,

        /// Vertical alignment inside grid cells: top, center, bottom
        #[arg(long, default_value = "center")]
        vertical_alignment: VerticalAlignment,

        /// ffprobe executable, used for video dimensions
        #[arg(long, default_value = "ffprobe")]
        ffprobe_path: PathBuf,

        /// Give up waiting for the platform to ingest an asset after this many seconds
        #[arg(long, default_value_t = 600)]
        ingestion_timeout_secs: u64,

        #[arg(long)]
        max_concurrent_uploads: Option<usize>,
    },

    /// Print the text of every sticky note in a workspace or canvas
    Notes {
        #[arg(long)]
        canvas_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    canvas_grid_uploader::init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("An error occurred while processing: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), LayoutError> {
    let token = cli
        .api
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or(ConfigError::MissingArgument("token"))?;
    let workspace_id = cli
        .api
        .workspace_id
        .filter(|w| !w.trim().is_empty())
        .ok_or(ConfigError::MissingArgument("workspaceId"))?;

    let mut api_config = ApiConfig::new(token);
    api_config.portal_url = cli.api.api_url;
    api_config.api_version = cli.api.api_version;
    api_config.request_timeout = cli.api.request_timeout_secs.map(Duration::from_secs);
    api_config.validate()?;

    match cli.cmd {
        Commands::Upload {
            upload_method,
            path_to_files,
            assets_to_upload_by_url,
            canvas_name,
            canvas_position,
            canvas_id,
            direction,
            vertical_alignment,
            ffprobe_path,
            ingestion_timeout_secs,
            max_concurrent_uploads,
        } => {
            let names: Vec<String> = match upload_method {
                UploadMethod::Url => assets_to_upload_by_url
                    .ok_or(ConfigError::MissingArgument("assetsToUploadByUrl"))?
                    .split('|')
                    .map(|url| url.trim().to_string())
                    .filter(|url| !url.is_empty())
                    .collect(),
                UploadMethod::Local => {
                    let dir = path_to_files.ok_or(ConfigError::MissingArgument("pathToFiles"))?;
                    list_directory(&dir)
                        .map_err(|source| ConfigError::UnreadableDirectory { path: dir, source })?
                }
            };

            let assets = classify(&names);
            if assets.is_empty() {
                return Err(ConfigError::EmptyAssetList.into());
            }

            let mut config = LayoutConfig::new(workspace_id, upload_method);
            if let Some(name) = canvas_name {
                config.canvas_name = name;
            }
            config.canvas_origin = canvas_position;
            config.direction = direction;
            config.vertical_alignment = vertical_alignment;
            config.ffprobe_path = ffprobe_path;
            config.ingestion = IngestionPolicy {
                timeout: Duration::from_secs(ingestion_timeout_secs),
                ..IngestionPolicy::default()
            };
            config.max_concurrent_uploads = max_concurrent_uploads;

            let client = BluescapeClient::new(api_config)?;
            let http = client.http_client();
            let orchestrator = LayoutOrchestrator::new(Arc::new(client), http);

            let outcomes = match canvas_id {
                Some(id) => orchestrator.layout_into_canvas(&assets, &id, &config).await?,
                None => orchestrator.layout(&assets, &config).await?,
            };
            print!("{}", UploadReport::from_outcomes(&outcomes));
        }

        Commands::Notes { canvas_id } => {
            let client = BluescapeClient::new(api_config)?;

            let workspace = api::fetch_workspace(&client, &workspace_id).await?;
            tracing::info!("Workspace: {} ({})", workspace.name, workspace.id);
            if let Some(id) = canvas_id.as_deref() {
                let canvas = api::fetch_canvas(&client, &workspace_id, id).await?;
                tracing::info!("Canvas: {} ({})", canvas.name.unwrap_or_default(), canvas.id);
            }

            for note in fetch_note_texts(&client, &workspace_id, canvas_id.as_deref()).await? {
                println!("{}", note.text);
            }
        }
    }

    Ok(())
}
