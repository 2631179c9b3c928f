use super::{connect, invalid_input, load_config, GlobalArgs, ServicesCommand};
use crate::forms::ServiceForm;
use crate::output::service_table;

pub async fn execute(global: &GlobalArgs, command: ServicesCommand) -> anyhow::Result<()> {
    let config = load_config(global)?;
    let api = connect(&config, global)?;

    match command {
        ServicesCommand::List => {
            let services = api.list_services().await?;
            print!("{}", service_table(&services));
        }
        ServicesCommand::Create { name, slug, order } => {
            let form = ServiceForm {
                name,
                slug,
                display_order: order,
            };
            let dto = form.to_create_dto().map_err(invalid_input)?;
            let created = api.create_service(&dto).await?;
            println!("Created service \"{}\" ({})", created.name, created.slug);
        }
    }

    Ok(())
}
