//! Edits to a kustomization manifest.

use anyhow::{Context, bail};
use glob::{MatchOptions, Pattern};
use indexmap::IndexSet;

use crate::manifest::{Kustomization, Str};

/// Where a kustomization manifest is loaded from and saved to.
pub trait KustomizationStore {
    fn read(&self) -> anyhow::Result<Kustomization>;

    fn write(&mut self, kustomization: Kustomization) -> anyhow::Result<()>;
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Shell-style path matching, `*` does not cross `/`.
pub fn glob_matches(pattern: &str, candidate: &str) -> anyhow::Result<bool> {
    let pattern =
        Pattern::new(pattern).with_context(|| format!("invalid generator pattern `{pattern}`"))?;
    Ok(pattern.matches_with(candidate, MATCH_OPTIONS))
}

/// Removes the generators matching any of `patterns` from the manifest and
/// returns them in the order they were matched.
///
/// The manifest is written back only if something matched.
#[tracing::instrument(skip(store))]
pub fn remove_generators(
    store: &mut dyn KustomizationStore,
    patterns: &[&str],
) -> anyhow::Result<Vec<Str>> {
    if patterns.is_empty() {
        bail!("must specify a generator file");
    }

    let mut kustomization = store.read()?;

    let mut matched = IndexSet::new();
    for pattern in patterns {
        for generator in &kustomization.generators {
            if glob_matches(pattern, generator)? {
                matched.insert(generator.clone());
            }
        }
    }

    if matched.is_empty() {
        tracing::debug!("no generators matched");
        return Ok(vec![]);
    }

    kustomization
        .generators
        .retain(|generator| !matched.contains(generator));
    store.write(kustomization)?;

    Ok(matched.into_iter().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        kustomization: Kustomization,
        writes: usize,
    }

    impl KustomizationStore for MemoryStore {
        fn read(&self) -> anyhow::Result<Kustomization> {
            Ok(self.kustomization.clone())
        }

        fn write(&mut self, kustomization: Kustomization) -> anyhow::Result<()> {
            self.kustomization = kustomization;
            self.writes += 1;
            Ok(())
        }
    }

    fn store(yaml: &str) -> MemoryStore {
        MemoryStore {
            kustomization: serde_yaml::from_str(yaml).unwrap(),
            writes: 0,
        }
    }

    const KUSTOMIZATION: &str = r#"
apiVersion: kustomize.config.k8s.io/v1beta1
kind: Kustomization
resources:
- deployment.yaml
generators:
- secrets/db.yaml
- secrets/api.yaml
- configmaps.yaml
- secrets/nested/tls.yaml
"#;

    #[test]
    fn removes_matching_generators() -> anyhow::Result<()> {
        let mut store = store(KUSTOMIZATION);

        let removed = remove_generators(&mut store, &["configmaps.yaml", "secrets/*.yaml"])?;
        assert_eq!(removed, ["configmaps.yaml", "secrets/db.yaml", "secrets/api.yaml"]);
        assert_eq!(store.kustomization.generators, ["secrets/nested/tls.yaml"]);
        assert!(store.kustomization.rest.contains_key("resources"));
        assert_eq!(store.writes, 1);
        Ok(())
    }

    #[test]
    fn overlapping_patterns_match_once() -> anyhow::Result<()> {
        let mut store = store(KUSTOMIZATION);

        let removed = remove_generators(&mut store, &["secrets/db.yaml", "secrets/d*"])?;
        assert_eq!(removed, ["secrets/db.yaml"]);
        assert_eq!(
            store.kustomization.generators,
            ["secrets/api.yaml", "configmaps.yaml", "secrets/nested/tls.yaml"]
        );
        Ok(())
    }

    #[test]
    fn no_match_writes_nothing() -> anyhow::Result<()> {
        let mut store = store(KUSTOMIZATION);
        let before = store.kustomization.clone();

        assert!(remove_generators(&mut store, &["missing.yaml"])?.is_empty());
        assert_eq!(store.writes, 0);
        assert_eq!(store.kustomization, before);
        Ok(())
    }

    #[test]
    fn requires_a_pattern() {
        let mut store = store(KUSTOMIZATION);
        let err = remove_generators(&mut store, &[]).unwrap_err();
        assert_eq!(err.to_string(), "must specify a generator file");
    }

    #[test]
    fn invalid_pattern_is_an_error() {
        let mut store = store(KUSTOMIZATION);
        let err = remove_generators(&mut store, &["secrets/[.yaml"]).unwrap_err();
        assert_eq!(err.to_string(), "invalid generator pattern `secrets/[.yaml`");
        assert_eq!(store.writes, 0);
    }

    #[test]
    fn glob_semantics() -> anyhow::Result<()> {
        assert!(glob_matches("*.yaml", "a.yaml")?);
        assert!(!glob_matches("*.yaml", "dir/a.yaml")?);
        assert!(glob_matches("dir/?.yaml", "dir/a.yaml")?);
        assert!(glob_matches("[ab].yaml", "b.yaml")?);
        assert!(!glob_matches("A.yaml", "a.yaml")?);
        Ok(())
    }
}
