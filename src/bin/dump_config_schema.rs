use anyhow::Result;

/// Prints the JSON schema of `config.toml`, for editor completion.
fn main() -> Result<()> {
    let schema = snapflow::Config::json_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
