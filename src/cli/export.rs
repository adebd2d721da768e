use anyhow::Result;

use qabot::config::QabotConfig;
use qabot::knowledge::KnowledgeStore;

/// Export all learned Q/A pairs as JSON to stdout.
pub fn export(config: &QabotConfig) -> Result<()> {
    let store = KnowledgeStore::open(config.resolved_knowledge_path())?;
    let entries = store.export_all();

    let json = serde_json::to_string_pretty(&entries)?;
    println!("{json}");

    eprintln!("Exported {} learned Q/A pairs.", entries.len());
    Ok(())
}
