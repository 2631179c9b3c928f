//! Session commands: login, logout, me

use anyhow::Context;
use tracing::info;

use super::{connect, invalid_input, load_config, prompt, GlobalArgs, LoginArgs};
use crate::api::HttpApi;
use crate::forms::LoginForm;
use crate::model::current_scenario;
use crate::output::user_summary;
use crate::session::Session;

pub async fn login(global: &GlobalArgs, args: LoginArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;

    let form = LoginForm {
        email: match args.email {
            Some(email) => email,
            None => prompt("Email")?,
        },
        password: match args.password {
            Some(password) => password,
            None => prompt("Password")?,
        },
    };
    let request = form.to_request().map_err(invalid_input)?;

    let api = HttpApi::new(&config.api, None)?;
    let auth = api.login(&request).await.context("Login failed")?;

    let session = Session::from_login(&request.email, auth);
    session
        .save(&config.session_file)
        .with_context(|| format!("Failed to save session to {}", config.session_file.display()))?;
    info!("Session saved to {}", config.session_file.display());

    println!("Signed in as {}", session.email);
    Ok(())
}

pub fn logout(global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    if Session::clear(&config.session_file)? {
        println!("Signed out");
    } else {
        println!("Not signed in");
    }
    Ok(())
}

pub async fn me(global: &GlobalArgs) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let api = connect(&config, global)?;
    let (user, scenarios, services) =
        futures::try_join!(api.me(), api.list_scenarios(), api.list_services())?;

    print!("{}", user_summary(&user));
    match current_scenario(&scenarios) {
        Some(current) => println!(
            "Current scenario: {} ({} to {})",
            current.name, current.start_date, current.end_date
        ),
        None => println!("Current scenario: none"),
    }
    println!("Scenarios: {} · Services: {}", scenarios.len(), services.len());
    Ok(())
}
