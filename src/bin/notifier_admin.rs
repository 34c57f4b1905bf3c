use clap::{Args, Parser, Subcommand};
use tracing::info;

use contentful_slack_notifier::{errors::AppError, handlers::AppState, logging, timestamp::{from_millis, now_millis}};

/// Support tasks against the deployed token table. Reads the same environment as the Lambda.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct App {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct RevokeWorkspaceArgs {
    #[arg(long)]
    workspace_id: String,
}

#[derive(Debug, Args)]
struct ShowTokenArgs {
    #[arg(long)]
    installation_uuid: String,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Deletes every stored token of a Slack workspace
    RevokeWorkspace(RevokeWorkspaceArgs),
    /// Prints a stored token record with its secrets masked
    ShowToken(ShowTokenArgs),
}

fn mask(secret: &str) -> String {
    let visible: String = secret.chars().take(8).collect();
    format!("{}***", visible)
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    logging::init_cli();

    let app = App::parse();
    let state = AppState::from_env().await?;

    match app.command {
        Command::RevokeWorkspace(args) => {
            state.auth_tokens.delete_by_workspace_id(&args.workspace_id).await?;
            info!(workspace_id = %args.workspace_id, "Revoked workspace tokens");
            println!("Revoked tokens of workspace {}", args.workspace_id);
        }
        Command::ShowToken(args) => match state.auth_tokens.find(&args.installation_uuid).await? {
            Some(token) => {
                let expires_at = from_millis(token.expires_at).map(|t| t.to_rfc3339()).unwrap_or_default();

                println!("installation:  {}", args.installation_uuid);
                println!("workspace:     {}", token.slack_workspace_id);
                println!("space:         {}/{}", token.space_id, token.environment_id);
                println!("token:         {}", mask(&token.token));
                println!("refresh token: {}", mask(&token.refresh_token));
                println!("expires at:    {} (expired: {})", expires_at, token.expires_at < now_millis());
            }
            None => println!("No token stored for installation {}", args.installation_uuid),
        },
    }

    Ok(())
}
