//! Rule table listing for the `providers` command.

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::PipelineConfig;
use crate::log;
use crate::provider::{Provider, ProviderRegistry};

/// Print every loaded rule table, marking the ones in the provider table.
pub fn list_providers(config: &PipelineConfig) -> Result<()> {
    let registry = config.load_registry()?;
    let sources = match config.load_sources(&registry) {
        Ok(sources) => Some(sources),
        Err(err) => {
            log!("warning"; "{}", err);
            None
        }
    };

    for provider in registry.iter() {
        let source = sources
            .as_ref()
            .and_then(|table| table.iter().find(|entry| entry.id == provider.id));
        let line = describe(provider);
        match source {
            Some(entry) => println!("{} {}\n    {}", "●".green(), line, entry.url.as_str().dimmed()),
            None => println!("{} {}", "○".dimmed(), line),
        }
    }

    if let Some(path) = config.rules_path() {
        log!("providers"; "{} loaded (extra rules: {})", registry.len(), path.display());
    }
    unknown_sources(&registry, config);
    Ok(())
}

/// `AWS (aws) aliases: amazon, 2 rules, paths filter`
fn describe(provider: &Provider) -> String {
    let aliases = if provider.aliases.is_empty() {
        "-".to_string()
    } else {
        provider.aliases.join(", ")
    };
    format!(
        "{} ({}) aliases: {}, {}, {} filter",
        provider.id.bold(),
        provider.short,
        aliases,
        crate::utils::plural_count(provider.rules.len(), "rule"),
        provider.filter.kind()
    )
}

fn unknown_sources(registry: &ProviderRegistry, config: &PipelineConfig) {
    let Ok(content) = std::fs::read_to_string(&config.paths.sources) else {
        return;
    };
    let Ok(map) = serde_json::from_str::<serde_json::Map<String, serde_json::Value>>(&content) else {
        return;
    };
    for id in map.keys().filter(|id| registry.get(id).is_none()) {
        log!("warning"; "{} is in the provider table but has no rules", id);
    }
}
