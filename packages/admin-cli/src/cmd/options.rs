use anyhow::{bail, Result};
use colored::Colorize;
use federation_client::{schema::catalog_for_field, FieldCatalog, FieldType, OptionsOrigin};
use std::sync::Arc;

pub async fn run(field: &str) -> Result<()> {
    let field_type = field_type_for(field)?;

    let (client, config) = crate::client_from_env()?;
    let catalog = FieldCatalog::from_config(Arc::new(client), &config);

    let result = catalog
        .resolve(field_type, field_type.predefined())
        .await?;

    if let Some(error) = &result.error {
        println!("{} {}", "⚠".bright_yellow(), error);
    }
    let origin = match result.origin {
        OptionsOrigin::Cache => "cache",
        OptionsOrigin::Remote => "remote",
        OptionsOrigin::Fallback => "default list",
    };
    println!(
        "{} ({} options, {})",
        field_type.to_string().bright_cyan().bold(),
        result.options.len(),
        origin
    );
    for option in &result.options {
        println!("  {option}");
    }
    Ok(())
}

/// Accepts a catalog key (`rubber_brand`) or a form select (`drive_rubber_brand`).
fn field_type_for(field: &str) -> Result<FieldType> {
    if let Ok(field_type) = field.parse::<FieldType>() {
        return Ok(field_type);
    }
    match catalog_for_field(field.trim()) {
        Some(field_type) => Ok(field_type),
        None => bail!("Unknown field '{field}'"),
    }
}
