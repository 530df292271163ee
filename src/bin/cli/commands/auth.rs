use anyhow::{bail, Context, Result};

use mapmynotes_lib::auth::{Authenticator, Credentials, Login};
use mapmynotes_lib::config::Backend;

use crate::app::App;
use crate::OutputFormat;

pub async fn run_login(
    app: &App,
    url: Option<&str>,
    username: &str,
    password: &str,
    format: &OutputFormat,
) -> Result<()> {
    let url = match url.or(app.config.store.url.as_deref()) {
        Some(url) => url.to_string(),
        None => bail!("No server URL. Pass --url or set [store] url in the config file."),
    };
    if app.config.store.backend != Backend::Webdav {
        log::warn!("Signing in while the configured backend is local; set [store] backend = \"webdav\" to use it");
    }

    let login = Login {
        url,
        credentials: Credentials::new(username, password),
    };
    let login = app
        .authenticator()
        .authenticate(login)
        .await
        .context("Sign-in failed")?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "url": login.url,
                "username": login.credentials.username,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Signed in to {} as {}", login.url, login.credentials.username);
        }
    }
    Ok(())
}

pub fn run_logout(app: &App) -> Result<()> {
    let auth = app.authenticator();
    let was_signed_in = auth.is_authenticated();
    auth.logout().context("Failed to sign out")?;
    if was_signed_in {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub fn run_status(app: &App, format: &OutputFormat) -> Result<()> {
    let login = app
        .authenticator()
        .current()
        .context("Failed to read stored credentials")?;
    let backend = match app.config.store.backend {
        Backend::Local => "local",
        Backend::Webdav => "webdav",
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "backend": backend,
                "dataDir": app.data_dir.to_string_lossy(),
                "root": app.config.store.root,
                "signedIn": login.is_some(),
                "url": login.as_ref().map(|l| l.url.clone()),
                "username": login.as_ref().map(|l| l.credentials.username.clone()),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            println!("Backend:   {}", backend);
            println!("Data dir:  {}", app.data_dir.display());
            println!("Root:      {}", app.config.store.root);
            match login {
                Some(login) => println!(
                    "Signed in: {} at {}",
                    login.credentials.username, login.url
                ),
                None => println!("Signed in: no"),
            }
        }
    }
    Ok(())
}
