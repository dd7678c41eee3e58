use super::{describe, emit_json, ensure, require};
use anyhow::{Result, bail};
use quest_application::optimistic::{SubmissionOutcome, SubmissionPhase, ToggleOutcome};
use quest_application::store::ProofStore;
use quest_application::{AppContext, Route};
use quest_core::proof::{AttachmentSource, ProofDetails};
use std::path::PathBuf;

fn print_proof(proof: &ProofDetails) {
    let marker = if proof.is_believed { "*" } else { " " };
    println!(
        "{} {}  {} on \"{}\"  [{}]  {} believers",
        marker,
        proof.created_at.format("%Y-%m-%d %H:%M"),
        proof.username,
        proof.quest_title,
        proof.status,
        proof.beliefs_count
    );
    if let Some(text) = &proof.proof_text {
        println!("    {}", text);
    }
    let attachments = proof.photo_urls.len() + proof.voice_urls.len();
    if attachments > 0 {
        println!("    {} attachment(s)", attachments);
    }
    println!("    {}", proof.ulid);
}

async fn fetch(store: &ProofStore) -> quest_core::Result<Vec<ProofDetails>> {
    store.refresh().await?;
    Ok(store.proofs().await)
}

async fn show(app: &AppContext, store: &ProofStore, route: Route, json: bool) -> Result<()> {
    if json {
        let result = match ensure(app, route).await {
            Ok(()) => fetch(store).await,
            Err(err) => Err(err),
        };
        return emit_json(result);
    }

    require(app, route).await?;
    let proofs = fetch(store).await.map_err(describe)?;
    if proofs.is_empty() {
        println!("Nothing here yet.");
    }
    for proof in &proofs {
        print_proof(proof);
    }
    if store.has_more() {
        println!("(more proofs available)");
    }
    Ok(())
}

pub async fn feed(app: &AppContext, json: bool) -> Result<()> {
    show(app, &app.feed, Route::Feed, json).await
}

pub async fn journal(app: &AppContext, user: Option<String>, json: bool) -> Result<()> {
    match user {
        Some(user) => show(app, &app.user_journal(user), Route::Journal, json).await,
        None => show(app, &app.journal, Route::Journal, json).await,
    }
}

pub async fn proof(app: &AppContext, proof_id: &str, json: bool) -> Result<()> {
    if json {
        let result = match ensure(app, Route::Feed).await {
            Ok(()) => app.feed.reload(proof_id).await,
            Err(err) => Err(err),
        };
        return emit_json(result);
    }

    require(app, Route::Feed).await?;
    let proof = app.feed.reload(proof_id).await.map_err(describe)?;
    print_proof(&proof);
    for url in proof.photo_urls.iter().chain(&proof.voice_urls) {
        println!("    {}", url);
    }
    Ok(())
}

pub async fn believe(app: &AppContext, proof_id: &str) -> Result<()> {
    require(app, Route::Feed).await?;

    app.feed.refresh().await.map_err(describe)?;
    let store = if app.feed.get_by_id(proof_id).await.is_some() {
        &app.feed
    } else {
        app.journal.refresh().await.map_err(describe)?;
        &app.journal
    };

    match store.toggle_belief(proof_id).await.map_err(describe)? {
        ToggleOutcome::Confirmed(state) => {
            let verb = if state.is_believed { "Believed" } else { "Unbelieved" };
            println!("{} ({} believers)", verb, state.beliefs_count);
        }
        ToggleOutcome::Reconciled { server, .. } => {
            println!(
                "Server reports believed={} ({} believers)",
                server.is_believed, server.beliefs_count
            );
        }
        ToggleOutcome::RolledBack { error, .. } => {
            bail!("Belief not saved: {}", error.display_message())
        }
        ToggleOutcome::InFlight => println!("A toggle for this proof is already running."),
    }
    Ok(())
}

pub async fn submit(
    app: &AppContext,
    quest_id: String,
    text: String,
    images: Vec<PathBuf>,
    voices: Vec<PathBuf>,
) -> Result<()> {
    require(app, Route::Home).await?;

    app.quests.refresh().await.map_err(describe)?;
    let Some(entry) = app.quests.get_task_by_id(&quest_id).await else {
        bail!("No quest {} in today's list", quest_id)
    };

    let mut draft = app.new_draft();
    draft.select_target(entry.quest.ulid.clone());
    draft.set_text(text);
    for path in images {
        draft.add_image(AttachmentSource::File(path));
    }
    for path in voices {
        draft.add_voice(AttachmentSource::File(path));
    }

    let mut phases = app.submitter.subscribe();
    let progress = tokio::spawn(async move {
        while phases.changed().await.is_ok() {
            let phase = *phases.borrow_and_update();
            if phase != SubmissionPhase::Idle {
                eprintln!("  {:?}...", phase);
            }
        }
    });
    let result = app.submitter.submit(&mut draft).await;
    progress.abort();

    match result {
        Ok(SubmissionOutcome::Submitted(response)) => {
            println!(
                "Proof {} submitted for \"{}\" ({})",
                response.proof_ulid, entry.quest.title, response.status
            );
            Ok(())
        }
        Ok(SubmissionOutcome::NoTarget) => bail!("No quest selected"),
        Ok(SubmissionOutcome::AlreadySubmitting) => bail!("A submission is already running"),
        Err(err) => {
            let (photos, voices) = draft.counts();
            eprintln!(
                "Draft kept: {} photo(s), {} voice note(s).",
                photos, voices
            );
            Err(describe(err))
        }
    }
}
