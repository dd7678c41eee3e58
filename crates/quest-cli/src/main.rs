use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "quest")]
#[command(about = "Quest CLI - daily quests, proofs and lobbies from the terminal", long_about = None)]
struct Cli {
    /// Directory holding config.toml, session.json and logs
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backend URL, overrides config.toml and QUEST_API_URL
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Print read commands as `{"status": "ok"|"error", ...}` JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show who is signed in
    Session,
    /// Sign in with email and password
    Login {
        email: String,
        #[arg(long, env = "QUEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        #[arg(long, env = "QUEST_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and forget the stored session
    Logout,
    /// List today's quests
    Quests,
    /// Show the community proof feed
    Feed,
    /// Show your own proofs, or another user's
    Journal {
        /// Id of the user whose journal to show
        #[arg(long)]
        user: Option<String>,
    },
    /// Show a single proof
    Proof { proof_id: String },
    /// Toggle your belief in a proof
    Believe { proof_id: String },
    /// Submit a proof for a quest
    Submit {
        quest_id: String,
        #[arg(long, default_value = "")]
        text: String,
        /// Photo to attach (repeatable)
        #[arg(long = "image")]
        images: Vec<PathBuf>,
        /// Voice note to attach (repeatable)
        #[arg(long = "voice")]
        voices: Vec<PathBuf>,
    },
    /// Browse, create and join lobbies
    Lobbies {
        #[command(subcommand)]
        action: LobbyAction,
    },
}

#[derive(Subcommand)]
enum LobbyAction {
    /// List lobbies
    List,
    /// Create a lobby owned by you
    Create {
        name: String,
        topic: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a lobby and its member count
    Show { lobby_id: String },
    /// Join a lobby
    Join { lobby_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = commands::connect(cli.config_dir, cli.api_url).await?;
    let app = &client.app;

    match cli.command {
        Commands::Session => commands::auth::session(app, cli.json).await?,
        Commands::Login { email, password } => commands::auth::login(app, email, password).await?,
        Commands::Register {
            username,
            email,
            password,
        } => commands::auth::register(app, username, email, password).await?,
        Commands::Logout => commands::auth::logout(app).await?,
        Commands::Quests => commands::quests::list(app, cli.json).await?,
        Commands::Feed => commands::proofs::feed(app, cli.json).await?,
        Commands::Journal { user } => commands::proofs::journal(app, user, cli.json).await?,
        Commands::Proof { proof_id } => commands::proofs::proof(app, &proof_id, cli.json).await?,
        Commands::Believe { proof_id } => commands::proofs::believe(app, &proof_id).await?,
        Commands::Submit {
            quest_id,
            text,
            images,
            voices,
        } => commands::proofs::submit(app, quest_id, text, images, voices).await?,
        Commands::Lobbies { action } => match action {
            LobbyAction::List => commands::lobbies::list(app, cli.json).await?,
            LobbyAction::Create {
                name,
                topic,
                description,
            } => commands::lobbies::create(app, name, topic, description).await?,
            LobbyAction::Show { lobby_id } => {
                commands::lobbies::show(app, &lobby_id, cli.json).await?
            }
            LobbyAction::Join { lobby_id } => commands::lobbies::join(app, &lobby_id).await?,
        },
    }

    Ok(())
}
