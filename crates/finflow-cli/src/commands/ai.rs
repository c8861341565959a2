//! AI command implementations
//!
//! - `cmd_advice` - Spending advice from the remote service
//! - `cmd_ai` - Backend configuration, model tiers and connectivity

use anyhow::Result;
use finflow_core::advice::AdviceSummarizer;
use finflow_core::ai::{AIBackend, RemoteClassifier};
use finflow_core::db::Database;
use finflow_core::model_router::default_config_path;
use finflow_core::prompts::default_prompts_dir;

use super::remote_from_env;

pub async fn cmd_advice(db: &Database, remote: Option<&RemoteClassifier>) -> Result<()> {
    let transactions = db.list_transactions()?;

    println!("🤖 Asking the advisor about {} transactions...", transactions.len());
    let advice = AdviceSummarizer::standard(remote)
        .summarize_advice(&transactions)
        .await;

    println!();
    println!("{}", advice);
    Ok(())
}

pub async fn cmd_ai(offline: bool) -> Result<()> {
    let Some(remote) = remote_from_env() else {
        println!("⚠️  No AI backend configured. Categorization uses keyword rules only.");
        println!();
        println!("To enable the remote classifier:");
        println!("  Gemini (default): export GEMINI_API_KEY=<key>");
        println!("  Ollama:           export AI_BACKEND=ollama OLLAMA_HOST=http://localhost:11434");
        return Ok(());
    };

    print_ai_status(&remote);

    if offline {
        return Ok(());
    }

    println!();
    println!("🔍 Checking connectivity...");
    for tier in remote.tiers() {
        let client = remote.client().with_model(&tier.model);
        let status = if client.health_check().await {
            "✅ reachable"
        } else {
            "❌ unreachable"
        };
        println!("   {:<28} {}", tier.model, status);
    }

    Ok(())
}

fn print_ai_status(remote: &RemoteClassifier) {
    let info = remote.client().info();

    println!("🤖 AI backend: {}", info.backend);
    println!("   Host: {}", info.host);
    println!();
    println!("   Model tiers (tried in order):");
    for (i, tier) in remote.tiers().iter().enumerate() {
        println!(
            "   {}. {:<28} timeout {}s",
            i + 1,
            tier.model,
            tier.timeout.as_secs()
        );
    }

    println!();
    match default_config_path() {
        Some(path) if path.exists() => println!("   Model config: {}", path.display()),
        Some(path) => println!("   Model config: built-in (override at {})", path.display()),
        None => println!("   Model config: built-in"),
    }
    if let Some(dir) = default_prompts_dir() {
        println!("   Prompt overrides: {}", dir.display());
    }
}
