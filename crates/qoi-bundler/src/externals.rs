//! External-dependency resolution.
//!
//! Everything the package depends on, plus the runtime's built-in modules,
//! stays external unless a `resolve` selector asks for it to be bundled.

use indexmap::IndexSet;
use qoi_config::{PackageJson, ResolveMode};
use tracing::debug;

/// Node.js built-in module names.
pub const NODE_BUILTINS: &[&str] = &[
    "assert",
    "assert/strict",
    "async_hooks",
    "buffer",
    "child_process",
    "cluster",
    "console",
    "constants",
    "crypto",
    "dgram",
    "diagnostics_channel",
    "dns",
    "dns/promises",
    "domain",
    "events",
    "fs",
    "fs/promises",
    "http",
    "http2",
    "https",
    "inspector",
    "module",
    "net",
    "os",
    "path",
    "path/posix",
    "path/win32",
    "perf_hooks",
    "process",
    "punycode",
    "querystring",
    "readline",
    "readline/promises",
    "repl",
    "stream",
    "stream/consumers",
    "stream/promises",
    "stream/web",
    "string_decoder",
    "sys",
    "timers",
    "timers/promises",
    "tls",
    "trace_events",
    "tty",
    "url",
    "util",
    "util/types",
    "v8",
    "vm",
    "wasi",
    "worker_threads",
    "zlib",
];

/// Built-in modules followed by every peer, runtime and dev dependency.
pub fn base_externals(pkg: &PackageJson) -> Vec<String> {
    NODE_BUILTINS
        .iter()
        .copied()
        .chain(pkg.dependency_names())
        .map(str::to_string)
        .collect()
}

/// Apply a resolve selector to the external candidates.
///
/// `All` bundles everything, `Only` removes exactly the listed identifiers,
/// `None` keeps the candidates. Empty tokens and duplicates are dropped while
/// keeping first-seen order.
pub fn resolve_externals<I, S>(candidates: I, mode: &ResolveMode) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if matches!(mode, ResolveMode::All) {
        debug!("resolve=all, bundling every dependency");
        return Vec::new();
    }

    let externals: IndexSet<String> = candidates
        .into_iter()
        .map(|id| id.as_ref().trim().to_string())
        .filter(|id| !id.is_empty())
        .filter(|id| match mode {
            ResolveMode::Only(bundled) => !bundled.contains(id),
            _ => true,
        })
        .collect();

    externals.into_iter().collect()
}

/// Split a comma-joined CLI value into tokens, dropping empty ones.
pub fn split_csv(value: &str) -> impl Iterator<Item = &str> {
    value.split(',').map(str::trim).filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn pkg() -> PackageJson {
        PackageJson {
            name: "@x/y".into(),
            dependencies: Some(IndexMap::from([("a".to_string(), "1".to_string())])),
            peer_dependencies: Some(IndexMap::from([("b".to_string(), "1".to_string())])),
            dev_dependencies: Some(IndexMap::from([("c".to_string(), "1".to_string())])),
            ..Default::default()
        }
    }

    #[test]
    fn base_externals_cover_builtins_and_every_dependency_kind() {
        let externals = base_externals(&pkg());
        assert!(externals.iter().any(|e| e == "fs"));
        let tail: Vec<&str> = externals[NODE_BUILTINS.len()..]
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(tail, ["b", "a", "c"]);
    }

    #[test]
    fn resolve_all_empties_the_list() {
        assert!(resolve_externals(base_externals(&pkg()), &ResolveMode::All).is_empty());
    }

    #[test]
    fn resolve_only_removes_exactly_the_listed_ids() {
        let before = base_externals(&pkg());
        let after = resolve_externals(&before, &ResolveMode::only(["a", "b"]));
        assert_eq!(after.len(), before.len() - 2);
        assert!(!after.iter().any(|e| e == "a" || e == "b"));
        assert!(after.iter().any(|e| e == "c"));
    }

    #[test]
    fn resolve_none_keeps_everything() {
        let before = base_externals(&pkg());
        assert_eq!(resolve_externals(&before, &ResolveMode::None), before);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        let externals = resolve_externals(["", " lodash ", "", "lodash"], &ResolveMode::None);
        assert_eq!(externals, ["lodash"]);
    }

    #[test]
    fn csv_split() {
        assert_eq!(split_csv("a,,b , ").collect::<Vec<_>>(), ["a", "b"]);
    }
}
