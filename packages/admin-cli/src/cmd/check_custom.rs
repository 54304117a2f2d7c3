use anyhow::{Context, Result};
use colored::Colorize;
use federation_client::{FieldCatalog, FieldType};
use std::sync::Arc;

pub async fn run(field_type: &str, value: &str) -> Result<()> {
    let field_type: FieldType = field_type
        .parse()
        .with_context(|| format!("Unknown field type '{field_type}'"))?;

    let (client, config) = crate::client_from_env()?;
    let catalog = FieldCatalog::from_config(Arc::new(client), &config);

    let check = catalog
        .check_custom_value(field_type, value)
        .await
        .context("Custom value check failed")?;

    if check.is_duplicate {
        println!("{} '{}' duplicates a known {}", "✗".bright_red(), value.trim(), field_type);
        if let Some(suggested) = &check.suggested_value {
            println!("  Use: {}", suggested.bright_green());
        }
    } else {
        println!("{} '{}' is new", "✓".bright_green(), value.trim());
    }
    if !check.message.is_empty() {
        println!("  {}", check.message);
    }
    Ok(())
}
