use super::{describe, emit_json, ensure, require};
use anyhow::Result;
use quest_application::{AppContext, Route};
use quest_core::quest::QuestEntry;

async fn fetch(app: &AppContext) -> quest_core::Result<Vec<QuestEntry>> {
    app.quests.refresh().await?;
    Ok(app.quests.tasks().await)
}

pub async fn list(app: &AppContext, json: bool) -> Result<()> {
    if json {
        let result = match ensure(app, Route::Home).await {
            Ok(()) => fetch(app).await,
            Err(err) => Err(err),
        };
        return emit_json(result);
    }

    require(app, Route::Home).await?;
    let tasks = fetch(app).await.map_err(describe)?;
    if tasks.is_empty() {
        println!("No quests today.");
        return Ok(());
    }

    for entry in tasks {
        let (current, target) = entry.progress();
        println!(
            "{:<12} {}  {}/{}  +{} XP",
            format!("{:?}", entry.status),
            entry.quest.title,
            current,
            target,
            entry.reward()
        );
        println!("             {}", entry.quest.ulid);
    }
    Ok(())
}
