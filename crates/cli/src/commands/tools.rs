//! `steward tools`: print the tool definitions shown to the model.

pub fn run() -> anyhow::Result<()> {
    for tool in steward_tools::definitions() {
        println!("{}", tool.name);
        println!("  {}", tool.description);
        let schema = serde_json::to_string_pretty(&tool.parameters)?;
        for line in schema.lines() {
            println!("  {line}");
        }
        println!();
    }
    Ok(())
}
