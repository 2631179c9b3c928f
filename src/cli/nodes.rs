//! `planctl nodes ...` - the explorer workflow from the command line

use anyhow::{bail, Context};
use tracing::{debug, info};

use super::{confirm, connect, invalid_input, load_config, GlobalArgs, NodeFormArgs, NodesCommand};
use crate::api::{HttpApi, PlanDataSource};
use crate::cache::QueryCache;
use crate::forms::PlanNodeForm;
use crate::model::{NodeId, NodeType, PlanNode, Scenario, ScenarioId};
use crate::nodes::{build_tree_checked, ExplorerState, NoticeTone};
use crate::output::{render_tree, render_tree_json};

pub async fn execute(global: &GlobalArgs, command: NodesCommand) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let api = connect(&config, global)?;

    match command {
        NodesCommand::Tree { scenario, json } => tree(&api, scenario, json).await,
        NodesCommand::Create(form) => create(&api, form).await,
        NodesCommand::Edit { id, scenario, form } => edit(&api, id, scenario, form).await,
        NodesCommand::Delete { id, scenario, yes } => delete(&api, id, scenario, yes).await,
    }
}

/// Current scenario plus the scenario id being looked at
async fn resolve_scenario(
    api: &HttpApi,
    requested: Option<String>,
) -> anyhow::Result<(Option<Scenario>, Option<ScenarioId>)> {
    let current = api.fetch_current_scenario().await?;
    let viewed = requested
        .map(ScenarioId::from)
        .or_else(|| current.as_ref().map(|s| s.id.clone()));
    debug!("Viewing scenario {:?}", viewed);
    Ok((current, viewed))
}

async fn tree(api: &HttpApi, scenario: Option<String>, json: bool) -> anyhow::Result<()> {
    let (current, viewed) = resolve_scenario(api, scenario).await?;
    let nodes = api.fetch_plan_nodes(viewed.as_ref()).await?;
    let forest = build_tree_checked(&nodes)?;

    if json {
        println!("{}", render_tree_json(&forest)?);
        return Ok(());
    }

    match (&viewed, &current) {
        (Some(viewed), Some(current)) if viewed == &current.id => {
            println!("Scenario: {} (current)\n", current.name);
        }
        (Some(viewed), _) => println!("Scenario: {} (read-only)\n", viewed),
        (None, _) => println!("No current scenario. Activate one with `planctl scenarios activate`.\n"),
    }
    print!("{}", render_tree(&forest));
    Ok(())
}

async fn find_plan_node(
    api: &HttpApi,
    scenario: Option<&ScenarioId>,
    id: &NodeId,
) -> anyhow::Result<PlanNode> {
    let nodes = api.fetch_plan_nodes(scenario).await?;
    match nodes.into_iter().find(|n| &n.id == id) {
        Some(node) => Ok(node),
        None => bail!("Plan node {} not found", id),
    }
}

fn apply_args(form: &mut PlanNodeForm, args: NodeFormArgs) -> anyhow::Result<()> {
    if let Some(title) = args.title {
        form.title = title;
    }
    if let Some(node_type) = args.node_type {
        form.node_type = Some(node_type.parse::<NodeType>().map_err(anyhow::Error::msg)?);
    }
    if let Some(description) = args.description {
        form.description = description;
    }
    if let Some(order) = args.order {
        form.display_order = order;
    }
    Ok(())
}

/// Outcome of a finished dialog as a command result
fn report(state: &ExplorerState, done: bool) -> anyhow::Result<()> {
    if !state.form_errors().is_empty() {
        return Err(invalid_input(state.form_errors().clone()));
    }
    match state.notice() {
        Some(notice) if done || notice.tone == NoticeTone::Success => {
            println!("{}", notice.message);
            Ok(())
        }
        Some(notice) => bail!("{}", notice.message),
        None if done => Ok(()),
        None => bail!("Nothing was changed"),
    }
}

async fn create(api: &HttpApi, args: NodeFormArgs) -> anyhow::Result<()> {
    let Some(current) = api.fetch_current_scenario().await? else {
        bail!("No current scenario to add nodes to");
    };

    let parent = match &args.parent {
        Some(parent_id) => Some(
            find_plan_node(api, Some(&current.id), &NodeId::from(parent_id.as_str()))
                .await
                .context("Parent must be a node of the current scenario")?,
        ),
        None => None,
    };

    let mut form = PlanNodeForm::for_create(parent.as_ref());
    apply_args(&mut form, args)?;

    let mut state = ExplorerState::new();
    let mut cache = QueryCache::new();
    state.request_create(parent.as_ref());
    let Some(target) = state.form_target(&current.id) else {
        bail!("Create dialog did not open");
    };
    let saved = state.submit_form(&form, &target, api, &mut cache).await;
    report(&state, saved)
}

async fn edit(
    api: &HttpApi,
    id: String,
    scenario: Option<String>,
    args: NodeFormArgs,
) -> anyhow::Result<()> {
    let (current, viewed) = resolve_scenario(api, scenario).await?;
    let node = find_plan_node(api, viewed.as_ref(), &NodeId::from(id)).await?;

    let mut state = ExplorerState::new();
    if !state.request_edit(&node, current.as_ref()) {
        bail!("Node {} belongs to a scenario that is not current and is read-only", node.id);
    }

    let mut form = PlanNodeForm::for_edit(&node);
    apply_args(&mut form, args)?;

    let Some(target) = state.form_target(&node.scenario_id) else {
        bail!("Edit dialog did not open");
    };
    let mut cache = QueryCache::new();
    let saved = state.submit_form(&form, &target, api, &mut cache).await;
    report(&state, saved)
}

async fn delete(api: &HttpApi, id: String, scenario: Option<String>, yes: bool) -> anyhow::Result<()> {
    let (current, viewed) = resolve_scenario(api, scenario).await?;
    let node = find_plan_node(api, viewed.as_ref(), &NodeId::from(id)).await?;

    let mut state = ExplorerState::new();
    if !state.request_delete(&node, current.as_ref()) {
        bail!("Node {} belongs to a scenario that is not current and is read-only", node.id);
    }

    if !yes && !confirm(&format!("Delete \"{}\" ({})?", node.title, node.id))? {
        state.cancel();
        info!("Delete of {} cancelled", node.id);
        println!("Cancelled");
        return Ok(());
    }

    let mut cache = QueryCache::new();
    let deleted = state.confirm_delete(&node, api, &mut cache).await;
    report(&state, deleted)
}
