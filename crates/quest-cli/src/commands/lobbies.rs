use super::{describe, emit_json, ensure, require};
use anyhow::Result;
use quest_application::{AppContext, Route};
use quest_core::lobby::{LobbyFeedItem, NewLobby};

async fn fetch(app: &AppContext) -> quest_core::Result<Vec<LobbyFeedItem>> {
    app.lobbies.refresh().await?;
    Ok(app.lobbies.lobbies().await)
}

pub async fn list(app: &AppContext, json: bool) -> Result<()> {
    if json {
        let result = match ensure(app, Route::Lobbies).await {
            Ok(()) => fetch(app).await,
            Err(err) => Err(err),
        };
        return emit_json(result);
    }

    require(app, Route::Lobbies).await?;
    let lobbies = fetch(app).await.map_err(describe)?;
    if lobbies.is_empty() {
        println!("No lobbies yet. Create one with `quest lobbies create`.");
    }
    for item in lobbies {
        let marker = if item.is_member { "joined" } else { "" };
        println!("{:<30} #{:<15} {}", item.lobby.name, item.lobby.topic, marker);
        if let Some(description) = &item.lobby.description {
            println!("    {}", description);
        }
        println!("    {}", item.lobby.ulid);
    }
    Ok(())
}

pub async fn show(app: &AppContext, lobby_id: &str, json: bool) -> Result<()> {
    if json {
        let result = match ensure(app, Route::Lobbies).await {
            Ok(()) => app.lobbies.details(lobby_id).await,
            Err(err) => Err(err),
        };
        return emit_json(result);
    }

    require(app, Route::Lobbies).await?;
    let details = app.lobbies.details(lobby_id).await.map_err(describe)?;
    let lobby = &details.lobby;
    println!("{} #{}", lobby.name, lobby.topic);
    if let Some(description) = &lobby.description {
        println!("    {}", description);
    }
    println!(
        "    {} member(s), since {}",
        details.members_count,
        lobby.created_at.format("%Y-%m-%d")
    );
    println!("    {}", lobby.ulid);
    Ok(())
}

pub async fn create(
    app: &AppContext,
    name: String,
    topic: String,
    description: Option<String>,
) -> Result<()> {
    require(app, Route::Lobbies).await?;

    let lobby = app
        .lobbies
        .create_lobby(NewLobby {
            name,
            topic,
            description,
        })
        .await
        .map_err(describe)?;

    println!("Lobby \"{}\" created ({})", lobby.name, lobby.ulid);
    Ok(())
}

pub async fn join(app: &AppContext, lobby_id: &str) -> Result<()> {
    require(app, Route::Lobbies).await?;
    app.lobbies.refresh().await.map_err(describe)?;

    match app.lobbies.join_lobby(lobby_id).await.map_err(describe)? {
        Some(member) => println!("Joined {} as {:?}", member.lobby_id, member.role),
        None => println!("A join for this lobby is already running."),
    }
    Ok(())
}
