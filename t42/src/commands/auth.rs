use super::Context;
use crate::cli::AuthAction;
use crate::output::{self, yes_no};
use anyhow::{Context as _, Result};
use chrono::Utc;
use serde_json::json;
use t42_api::Request;
use t42_auth::{AuthError, Credentials, LoginFlow, NoBrowser};
use tokio::io::BufReader;

pub async fn run(action: AuthAction, ctx: &Context) -> Result<()> {
    match action {
        AuthAction::Login {
            with_secret,
            redirect_port,
            no_browser,
            no_localhost,
        } => login(ctx, with_secret, redirect_port, no_browser, no_localhost).await,
        AuthAction::Status => status(ctx).await,
        AuthAction::Logout => logout(ctx),
    }
}

async fn login(
    ctx: &Context,
    with_secret: bool,
    redirect_port: Option<u16>,
    no_browser: bool,
    no_localhost: bool,
) -> Result<()> {
    let store = ctx.store()?;
    let mut flow = LoginFlow::new(&ctx.settings)?;
    if let Some(port) = redirect_port {
        flow = flow.redirect_port(port);
    }
    if no_browser {
        flow = flow.with_browser(NoBrowser);
    }

    let credentials = if with_secret {
        flow.client_credentials(&ctx.cancel)
            .await
            .context("Client credentials login failed")?
    } else if no_localhost {
        let stdin = BufReader::new(tokio::io::stdin());
        flow.authorize_pasted(&ctx.cancel, stdin)
            .await
            .context("Login failed")?
    } else {
        flow.authorize(&ctx.cancel).await.context("Login failed")?
    };

    store.save(&credentials)?;
    tracing::info!(path = %store.path().display(), "Credentials saved");

    if ctx.json {
        let grant = if with_secret {
            "client_credentials"
        } else {
            "authorization_code"
        };
        return output::print_json(&json!({
            "logged_in": true,
            "grant": grant,
            "expires_at": credentials.expires_at,
            "refreshable": credentials.can_refresh(),
            "path": store.path(),
        }));
    }

    println!("Login successful. Credentials saved to {}", store.path().display());
    println!("Token expires at {}", credentials.expires_at.to_rfc3339());
    if !credentials.can_refresh() {
        println!("This token cannot be refreshed; run `t42 auth login` again once it expires.");
    }
    Ok(())
}

async fn status(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let credentials = match store.load() {
        Ok(credentials) => credentials,
        Err(AuthError::NotLoggedIn) => {
            if ctx.json {
                return output::print_json(&json!({ "logged_in": false }));
            }
            println!("Not logged in. Run `t42 auth login` to authenticate.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // The stored token is shown even when the server cannot be reached
    let token_info = match ctx.user_client().await {
        Ok(client) => client.send(Request::token().info()).await.map_err(anyhow::Error::from),
        Err(e) => Err(e),
    };

    if ctx.json {
        let (info, error) = match &token_info {
            Ok(info) => (Some(info), None),
            Err(e) => (None, Some(format!("{e:#}"))),
        };
        return output::print_json(&json!({
            "logged_in": true,
            "credentials": summary(&credentials),
            "path": store.path(),
            "token_info": info,
            "token_info_error": error,
        }));
    }

    let now = Utc::now();
    println!("Credentials: {}", store.path().display());
    println!("Token type:  {}", credentials.token_type);
    println!("Scope:       {}", output::or_dash(Some(credentials.scope.as_str())));
    println!("Expires at:  {}", credentials.expires_at.to_rfc3339());
    if credentials.is_expired(now) {
        println!("Status:      expired");
    } else {
        println!(
            "Status:      valid for {} more minutes",
            credentials.remaining(now).num_minutes()
        );
    }
    println!("Refreshable: {}", yes_no(credentials.can_refresh()));

    match token_info {
        Ok(info) => {
            println!();
            println!("Token info from the API:");
            if let Some(owner) = info.resource_owner_id {
                println!("  Resource owner: {owner}");
            }
            if !info.scopes.is_empty() {
                println!("  Scopes:         {}", info.scopes.join(", "));
            }
            if let Some(seconds) = info.expires_in_seconds {
                println!("  Expires in:     {seconds}s");
            }
            if let Some(app) = &info.application {
                println!("  Application:    {}", app.uid);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "Token info request failed");
            eprintln!("Could not query token info: {e:#}");
        }
    }
    Ok(())
}

fn logout(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let existed = store.path().exists();
    store.delete()?;

    if ctx.json {
        return output::print_json(&json!({ "logged_out": true, "had_credentials": existed }));
    }
    if existed {
        println!("Logged out. Credentials file deleted.");
    } else {
        println!("Already logged out (no credentials file found).");
    }
    Ok(())
}

fn summary(credentials: &Credentials) -> serde_json::Value {
    json!({
        "token_type": credentials.token_type,
        "scope": credentials.scope,
        "created_at": credentials.created_at,
        "expires_at": credentials.expires_at,
        "expires_in": credentials.expires_in(),
        "expired": credentials.is_expired(Utc::now()),
        "refreshable": credentials.can_refresh(),
    })
}
