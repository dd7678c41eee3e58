use super::{describe, emit_json, require};
use anyhow::Result;
use quest_application::{AppContext, AuthStatus, Route};
use quest_core::session::{LoginRequest, RegisterRequest, UserSession};

fn print_session(session: &UserSession) {
    println!("{} <{}>", session.username, session.email);
    println!("  level: {}", session.level);
    println!("  id:    {}", session.user_ulid);
}

pub async fn session(app: &AppContext, json: bool) -> Result<()> {
    if json {
        app.session.check_session().await;
        return emit_json(Ok(app.session.session().await));
    }

    match app.session.check_session().await {
        AuthStatus::Authenticated => {
            if let Some(session) = app.session.session().await {
                print_session(&session);
            }
        }
        AuthStatus::Unauthenticated => {
            println!("Not signed in.");
            if let Some(err) = app.session.last_error().await {
                println!("  ({})", err.display_message());
            }
        }
        AuthStatus::Loading => println!("Session check still running."),
    }
    Ok(())
}

pub async fn login(app: &AppContext, email: String, password: String) -> Result<()> {
    require(app, Route::Login).await?;

    let session = app
        .session
        .login(LoginRequest { email, password })
        .await
        .map_err(describe)?;

    println!("Welcome back, {}!", session.username);
    Ok(())
}

pub async fn register(
    app: &AppContext,
    username: String,
    email: String,
    password: String,
) -> Result<()> {
    require(app, Route::Register).await?;

    let session = app
        .session
        .register(RegisterRequest {
            username,
            email,
            password,
        })
        .await
        .map_err(describe)?;

    println!("Account created. Welcome, {}!", session.username);
    Ok(())
}

pub async fn logout(app: &AppContext) -> Result<()> {
    app.session.logout().await;
    println!("Signed out.");
    Ok(())
}
