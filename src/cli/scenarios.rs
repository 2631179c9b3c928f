use anyhow::bail;
use tracing::info;

use super::{
    confirm, connect, invalid_input, load_config, GlobalArgs, ScenarioFormArgs, ScenariosCommand,
};
use crate::api::HttpApi;
use crate::forms::ScenarioForm;
use crate::model::{current_scenario, Scenario, ScenarioId};
use crate::output::scenario_table;

pub async fn execute(global: &GlobalArgs, command: ScenariosCommand) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let api = connect(&config, global)?;

    match command {
        ScenariosCommand::List => {
            let scenarios = api.list_scenarios().await?;
            print!("{}", scenario_table(&scenarios));
        }
        ScenariosCommand::Current => {
            let scenarios = api.list_scenarios().await?;
            match current_scenario(&scenarios) {
                Some(current) => print!("{}", scenario_table(std::slice::from_ref(current))),
                None => println!("No current scenario"),
            }
        }
        ScenariosCommand::Create(args) => {
            let mut form = ScenarioForm::default();
            apply_args(&mut form, args);
            let dto = form.to_create_dto().map_err(invalid_input)?;
            let created = api.create_scenario(&dto).await?;
            info!("Created scenario {}", created.id);
            println!("Created scenario \"{}\" ({})", created.name, created.id);
        }
        ScenariosCommand::Update { id, form: args } => {
            let existing = find_scenario(&api, &id).await?;
            let mut form = ScenarioForm::for_edit(&existing);
            apply_args(&mut form, args);
            let dto = form.to_update_dto().map_err(invalid_input)?;
            let updated = api.update_scenario(&existing.id, &dto).await?;
            println!("Updated scenario \"{}\"", updated.name);
        }
        ScenariosCommand::Activate { id } => {
            let scenario = find_scenario(&api, &id).await?;
            api.activate_scenario(&scenario.id).await?;
            println!("\"{}\" is now the current scenario", scenario.name);
        }
        ScenariosCommand::Delete { id, yes } => {
            let scenario = find_scenario(&api, &id).await?;
            if !yes && !confirm(&format!("Delete scenario \"{}\" and all its nodes?", scenario.name))? {
                println!("Cancelled");
                return Ok(());
            }
            api.delete_scenario(&scenario.id).await?;
            println!("Deleted scenario \"{}\"", scenario.name);
        }
        ScenariosCommand::Rollover { id, form: args } => {
            let source = find_scenario(&api, &id).await?;
            let mut form = ScenarioForm::for_rollover(&source);
            apply_args(&mut form, args);
            let dto = form.to_rollover_dto().map_err(invalid_input)?;
            let created = api.rollover_scenario(&source.id, &dto).await?;
            info!("Rolled {} over into {}", source.id, created.id);
            println!(
                "Created \"{}\" ({} to {}) from \"{}\"",
                created.name, created.start_date, created.end_date, source.name
            );
        }
    }

    Ok(())
}

async fn find_scenario(api: &HttpApi, id: &str) -> anyhow::Result<Scenario> {
    let id = ScenarioId::from(id);
    let scenarios = api.list_scenarios().await?;
    match scenarios.into_iter().find(|s| s.id == id) {
        Some(scenario) => Ok(scenario),
        None => bail!("Scenario {} not found", id),
    }
}

fn apply_args(form: &mut ScenarioForm, args: ScenarioFormArgs) {
    if let Some(name) = args.name {
        form.name = name;
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(start) = args.start {
        form.start_date = start;
    }
    if let Some(end) = args.end {
        form.end_date = end;
    }
}
