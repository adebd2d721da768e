use anyhow::Result;

use qabot::config::QabotConfig;
use qabot::knowledge::KnowledgeStore;

/// Display knowledge store statistics in the terminal.
pub fn stats(config: &QabotConfig) -> Result<()> {
    let path = config.resolved_knowledge_path();
    let store = KnowledgeStore::open(&path)?;
    let response = store.get_stats();

    let file_size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

    println!("Knowledge Statistics");
    println!("{}", "=".repeat(40));
    println!("  Learned Q/A pairs:   {}", response.total_learned_qa);
    println!("  Total messages:      {}", response.total_messages);
    println!("  Conversations:       {}", response.total_conversations);
    println!();
    println!("Store file:            {}", path.display());
    println!("File size:             {file_size} bytes");

    if let Some(top) = store.export_all().first() {
        println!();
        println!("Most used ({}x):", top.uses);
        println!("  Q: {}", top.question);
    }

    Ok(())
}
