use crate::cli::DedupArgs;
use crate::config::CanonConfig;
use anyhow::{Context, Result};
use canon_core::*;
use std::io::{Read, Write};
use std::path::Path;
use std::time::Duration;

pub fn run(args: DedupArgs, config: CanonConfig) -> Result<()> {
    let dedup_config = apply_overrides(config.dedup.clone(), &args);

    let embeddings = if dedup_config.method == Method::Embeddings {
        Some(config.embedding_service()?)
    } else {
        None
    };
    let deduplicator = Deduplicator::new(dedup_config, embeddings)?;

    let text = read_input(&args.file)?;
    let input = DedupInput::from_json_str(&text)
        .with_context(|| format!("Failed to read a batch from {}", args.file.display()))?;

    tracing::info!(
        "Deduplicating {} {} with {}",
        input.len(),
        match input {
            DedupInput::Entities(_) => "entities",
            DedupInput::Facts(_) => "facts",
        },
        deduplicator.method()
    );

    let (output, stats) = deduplicator.deduplicate_with_stats(input)?;

    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", rendered)?;
        }
    }

    if args.stats {
        eprintln!("{}", serde_json::to_string_pretty(&stats)?);
    }

    Ok(())
}

/// Command-line flags win over canon.toml.
fn apply_overrides(mut config: DedupConfig, args: &DedupArgs) -> DedupConfig {
    if let Some(method) = args.method {
        config = config.with_method(method);
    }
    if let Some(distance) = args.fuzzy_distance {
        config = config.with_fuzzy_distance(distance);
    }
    if let Some(distance) = args.embeddings_distance {
        config = config.with_embeddings_distance(distance);
    }
    if let Some(max_distance) = args.max_distance {
        config = config.with_max_distance(max_distance);
    }
    if args.any_label {
        config = config.with_require_same_label(false);
    }
    if let Some(ms) = args.timeout_ms {
        config = config.with_timeout(Duration::from_millis(ms));
    }
    config
}

fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}
