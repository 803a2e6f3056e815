//! Auth command handlers.

use std::io::{self, Read};

use anyhow::{Context, Result, anyhow};
use trafego_core::api::{ApiError, Registration, mask_token};

use super::{AppContext, NOT_LOGGED_IN, prompt_line};

/// Where a secret comes from.
pub enum SecretSource {
    /// Whole stdin, trailing newline stripped
    Stdin,
    /// Already provided (flag or environment)
    Value(String),
    /// Ask on the terminal (or read a line when piped)
    Prompt,
}

fn read_secret(source: SecretSource, label: &str) -> Result<String> {
    let secret = match source {
        SecretSource::Stdin => {
            let mut buf = String::new();
            io::stdin()
                .lock()
                .read_to_string(&mut buf)
                .context("read password from stdin")?;
            buf.trim_end_matches(['\r', '\n']).to_string()
        }
        SecretSource::Value(value) => value,
        SecretSource::Prompt => prompt_line(label)?,
    };
    if secret.is_empty() {
        anyhow::bail!("{label} is required");
    }
    Ok(secret)
}

pub async fn login(ctx: &mut AppContext, username: Option<String>, password: SecretSource) -> Result<()> {
    let username = match username {
        Some(username) => username,
        None => prompt_line("Username (email)")?,
    };
    let password = read_secret(password, "Password")?;

    if let Err(err) = ctx.gate.login(&ctx.base, &username, &password).await {
        return Err(match err.downcast::<ApiError>() {
            Ok(api_error) if api_error.is_authentication() => {
                anyhow::Error::new(api_error).context("Login failed: invalid credentials")
            }
            Ok(api_error) => ctx.fail(api_error).context("Login failed"),
            Err(other) => other.context("Login failed"),
        });
    }

    let session = ctx.gate.session();
    if let (Some(user), Some(token)) = (session.user(), session.token()) {
        tracing::debug!(token = %mask_token(token), "logged in");
        println!("Logged in as {} ({})", user.name, user.role);
    }
    Ok(())
}

pub fn logout(ctx: &mut AppContext) -> Result<()> {
    let was_logged_in = ctx.gate.session().is_authenticated();
    ctx.gate.logout()?;
    if was_logged_in {
        println!("Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub async fn whoami(ctx: &mut AppContext) -> Result<()> {
    let profile = ctx.call(|client| async move { client.fetch_profile().await }).await?;
    println!("{} ({})", profile.name, profile.role);
    if let Some(email) = &profile.email {
        println!("{email}");
    }
    Ok(())
}

pub async fn register(
    ctx: &mut AppContext,
    email: String,
    name: String,
    role: String,
    password: SecretSource,
) -> Result<()> {
    let password = read_secret(password, "Password")?;
    let registration = Registration {
        email,
        full_name: name,
        password,
        role,
    };

    let profile = ctx
        .base
        .with_token(None)
        .register(&registration)
        .await
        .map_err(|e| ctx.fail(e).context("Registration failed"))?;
    println!(
        "Registered {} ({}). Run `trafego login` to sign in.",
        profile.name, profile.role
    );
    Ok(())
}

pub async fn change_password(ctx: &mut AppContext, from_stdin: bool) -> Result<()> {
    if !ctx.gate.session().is_authenticated() {
        return Err(anyhow!(NOT_LOGGED_IN));
    }

    let (current, new) = if from_stdin {
        let mut buf = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut buf)
            .context("read passwords from stdin")?;
        let mut lines = buf.lines();
        let current = lines.next().unwrap_or_default().to_string();
        let new = lines.next().unwrap_or_default().to_string();
        (current, new)
    } else {
        (
            read_secret(SecretSource::Prompt, "Current password")?,
            read_secret(SecretSource::Prompt, "New password")?,
        )
    };
    if current.is_empty() || new.is_empty() {
        anyhow::bail!("Both current and new password are required (one per line on stdin)");
    }

    ctx.call(|client| async move { client.change_password(&current, &new).await })
        .await?;
    println!("Password changed.");
    Ok(())
}
