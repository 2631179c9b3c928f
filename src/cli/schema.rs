use crate::config::Config;
use schemars::schema_for;

/// Print the JSON Schema of `planctl.yaml`
pub fn execute() -> anyhow::Result<()> {
    let schema = schema_for!(Config);
    let json = serde_json::to_string_pretty(&schema)?;
    println!("{}", json);
    Ok(())
}
