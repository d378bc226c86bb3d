use std::path::Path;

use anyhow::Context;
use konjure::{ResourceList, StaticResolver};

datatest_stable::harness! {
    { test = test, root = "tests/konjure/testdata", pattern = r".*/input.yaml" },
}

fn test(path: &Path) -> datatest_stable::Result<()> {
    let dir = path.parent().context("input has no parent directory")?;
    let input = std::fs::read_to_string(path).context("reading input")?;
    let list = serde_yaml::from_str::<ResourceList>(&input).context("parsing input")?;

    let secrets = dir.join("secrets.yaml");
    let resolver = if secrets.exists() {
        let secrets = std::fs::read_to_string(&secrets).context("reading secrets")?;
        serde_yaml::from_str::<StaticResolver>(&secrets).context("parsing secrets")?
    } else {
        StaticResolver::default()
    };

    match konjure::transform(list, resolver) {
        Ok(resources) => snapshot(&dir.join("expected.yaml"), &resources.to_string())?,
        Err(err) => {
            eprintln!("Error transforming {}: {err}", path.display());
            snapshot(&dir.join("expected.stderr"), &format!("{err:?}"))?;
        }
    }
    Ok(())
}

fn snapshot(path: &Path, actual: &str) -> datatest_stable::Result<()> {
    if !path.exists() || std::env::var("UPDATE_SNAPSHOTS").is_ok() {
        std::fs::write(path, actual).context("writing snapshot")?;
        return Ok(());
    }

    let expected = std::fs::read_to_string(path).context("reading snapshot")?;
    if expected == actual {
        return Ok(());
    }

    let formatted = format_chunks(dissimilar::diff(&expected, actual));
    eprintln!("Snapshot mismatch for {}:\n{}", path.display(), formatted);

    Err(format!("Snapshot mismatch for {}", path.display()).into())
}

fn format_chunks(chunks: Vec<dissimilar::Chunk>) -> String {
    let mut buf = String::new();
    for chunk in chunks {
        let formatted = match chunk {
            dissimilar::Chunk::Equal(text) => text.into(),
            dissimilar::Chunk::Delete(text) => format!("\x1b[4m\x1b[31m{}\x1b[0m", text),
            dissimilar::Chunk::Insert(text) => format!("\x1b[4m\x1b[32m{}\x1b[0m", text),
        };
        buf.push_str(&formatted);
    }
    buf
}
