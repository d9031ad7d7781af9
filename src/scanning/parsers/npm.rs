//! npm family: `package.json`, `package-lock.json`, `yarn.lock`, `pnpm-lock.yaml`

use super::{exact_version, QueryList};
use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::Result;
use anyhow::Context;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static RANGE_VERSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+\.\d+\.\d+(?:-[0-9A-Za-z.-]+)?)").expect("static regex")
});

/// Dependency sections of `package.json` that are looked up
const DEPENDENCY_SECTIONS: [&str; 3] = ["dependencies", "devDependencies", "optionalDependencies"];

/// Specifiers that are valid for npm but name no registry version
fn is_non_registry_specifier(spec: &str) -> bool {
    let v = spec.trim();
    v.starts_with("git")
        || v.starts_with("file:")
        || v.starts_with("link:")
        || v.starts_with("workspace:")
        || v.starts_with("npm:")
        || v.starts_with("github:")
        || v.contains("://")
        || (v.contains('/') && !v.starts_with('@'))
        || v.starts_with('.')
}

/// Normalizes an npm version range to a concrete `X.Y.Z` version.
///
/// Leading operators (`^`, `~`, `>=`, `<=`, `>`, `<`, `=`, `v`) are stripped and
/// the remainder must start with `X.Y.Z`. Anything else (`*`, `latest`,
/// `1.x`, URLs) yields `None`.
pub fn normalize_range(spec: &str) -> Option<String> {
    if is_non_registry_specifier(spec) {
        return None;
    }
    let first_alternative = spec.split("||").next().unwrap_or_default();
    let stripped = first_alternative
        .trim()
        .trim_start_matches(|c: char| matches!(c, '^' | '~' | '>' | '<' | '=' | 'v' | ' '));
    RANGE_VERSION
        .captures(stripped)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parses `package.json` declared ranges.
///
/// Ranges that do not normalize to `X.Y.Z` are dropped, not reported.
pub fn parse_package_json(content: &str) -> Result<Vec<PackageQuery>> {
    let json: Value = serde_json::from_str(content).context("package.json is not valid JSON")?;
    let mut queries = QueryList::default();

    for section in DEPENDENCY_SECTIONS {
        let Some(deps) = json.get(section).and_then(Value::as_object) else {
            continue;
        };
        for (name, spec) in deps {
            let Some(version) = spec.as_str().and_then(normalize_range) else {
                continue;
            };
            if let Ok(query) = PackageQuery::pinned(name, Ecosystem::Npm, &version) {
                queries.push(query);
            }
        }
    }

    Ok(queries.into_vec())
}

/// Parses `package-lock.json` (v1 `dependencies` tree and v2/v3 `packages` map)
pub fn parse_package_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let json: Value =
        serde_json::from_str(content).context("package-lock.json is not valid JSON")?;
    let mut queries = QueryList::default();

    if let Some(packages) = json.get("packages").and_then(Value::as_object) {
        for (path, entry) in packages {
            if path.is_empty() || entry.get("link").and_then(Value::as_bool) == Some(true) {
                continue;
            }
            let name = entry
                .get("name")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| package_name_from_path(path));
            let version = entry.get("version").and_then(Value::as_str);
            if let (Some(name), Some(version)) = (name, version.and_then(exact_version)) {
                if let Ok(query) = PackageQuery::pinned(&name, Ecosystem::Npm, &version) {
                    queries.push(query);
                }
            }
        }
    } else if let Some(dependencies) = json.get("dependencies").and_then(Value::as_object) {
        collect_v1_dependencies(dependencies, &mut queries);
    }

    Ok(queries.into_vec())
}

fn collect_v1_dependencies(dependencies: &Map<String, Value>, queries: &mut QueryList) {
    for (name, entry) in dependencies {
        if let Some(version) = entry
            .get("version")
            .and_then(Value::as_str)
            .and_then(exact_version)
        {
            if let Ok(query) = PackageQuery::pinned(name, Ecosystem::Npm, &version) {
                queries.push(query);
            }
        }
        if let Some(nested) = entry.get("dependencies").and_then(Value::as_object) {
            collect_v1_dependencies(nested, queries);
        }
    }
}

/// `node_modules/a/node_modules/@scope/b` -> `@scope/b`
fn package_name_from_path(path: &str) -> Option<String> {
    let idx = path.rfind("node_modules/")?;
    let name = &path[idx + "node_modules/".len()..];
    (!name.is_empty()).then(|| name.to_string())
}

/// Parses `yarn.lock`, both classic (v1) and berry formats
pub fn parse_yarn_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let mut queries = QueryList::default();
    let mut current_name: Option<String> = None;

    for line in content.lines() {
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if !line.starts_with(' ') {
            current_name = line
                .trim_end_matches(':')
                .split(',')
                .next()
                .and_then(yarn_descriptor_name);
            continue;
        }

        let trimmed = line.trim();
        let Some(rest) = trimmed.strip_prefix("version") else {
            continue;
        };
        let version = rest.trim_start_matches(':').trim().trim_matches('"');
        if let (Some(name), Some(version)) = (current_name.as_deref(), exact_version(version)) {
            if let Ok(query) = PackageQuery::pinned(name, Ecosystem::Npm, &version) {
                queries.push(query);
            }
            current_name = None;
        }
    }

    Ok(queries.into_vec())
}

/// `"@babel/core@^7.0.0"` / `lodash@npm:^4.17.21` -> package name
fn yarn_descriptor_name(descriptor: &str) -> Option<String> {
    let descriptor = descriptor.trim().trim_matches('"');
    if descriptor.is_empty() || descriptor.starts_with("__metadata") {
        return None;
    }
    let at = name_separator(descriptor, false)?;
    Some(descriptor[..at].to_string())
}

/// Parses `pnpm-lock.yaml` package keys (v5 slash form, v6+/v9 `@` form)
pub fn parse_pnpm_lock(content: &str) -> Result<Vec<PackageQuery>> {
    let yaml: serde_yaml_ng::Value =
        serde_yaml_ng::from_str(content).context("pnpm-lock.yaml is not valid YAML")?;

    let lockfile_version = yaml
        .get("lockfileVersion")
        .and_then(|v| v.as_f64().or_else(|| v.as_str().and_then(|s| s.parse().ok())))
        .unwrap_or(9.0);
    let slash_form = lockfile_version < 6.0;

    let mut queries = QueryList::default();
    let Some(packages) = yaml.get("packages").and_then(|p| p.as_mapping()) else {
        return Ok(queries.into_vec());
    };

    for key in packages.keys().filter_map(|k| k.as_str()) {
        if let Some((name, version)) = pnpm_key(key, slash_form) {
            if let Ok(query) = PackageQuery::pinned(&name, Ecosystem::Npm, &version) {
                queries.push(query);
            }
        }
    }

    Ok(queries.into_vec())
}

fn pnpm_key(key: &str, slash_form: bool) -> Option<(String, String)> {
    let key = key.trim_start_matches('/');
    let key = key.split('(').next().unwrap_or(key);

    let (name, version) = match name_separator(key, true) {
        Some(at) if !slash_form => (&key[..at], &key[at + 1..]),
        _ => {
            let (name, version) = key.rsplit_once('/')?;
            (name, version.split('_').next().unwrap_or(version))
        }
    };

    let version = exact_version(version)?;
    (!name.is_empty()).then(|| (name.to_string(), version))
}

/// Byte index of the `@` separating name and version, ignoring a leading scope `@`
fn name_separator(descriptor: &str, last: bool) -> Option<usize> {
    let mut separators = descriptor
        .char_indices()
        .skip(1)
        .filter(|(_, c)| *c == '@')
        .map(|(i, _)| i);
    if last {
        separators.last()
    } else {
        separators.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn versions(queries: &[PackageQuery]) -> Vec<(String, Option<String>)> {
        queries
            .iter()
            .map(|q| (q.name().to_string(), q.version().map(str::to_string)))
            .collect()
    }

    fn sorted_versions(queries: &[PackageQuery]) -> Vec<(String, Option<String>)> {
        let mut v = versions(queries);
        v.sort();
        v
    }

    #[test]
    fn test_normalize_range() {
        assert_eq!(normalize_range("^4.17.15").as_deref(), Some("4.17.15"));
        assert_eq!(normalize_range("~1.2.3").as_deref(), Some("1.2.3"));
        assert_eq!(normalize_range(">=2.0.0 <3.0.0").as_deref(), Some("2.0.0"));
        assert_eq!(normalize_range("= 1.0.0").as_deref(), Some("1.0.0"));
        assert_eq!(normalize_range("v3.1.4").as_deref(), Some("3.1.4"));
        assert_eq!(normalize_range("1.0.0-beta.1").as_deref(), Some("1.0.0-beta.1"));
        assert_eq!(normalize_range("^1.0.0 || ^2.0.0").as_deref(), Some("1.0.0"));
    }

    #[test]
    fn test_normalize_range_unparsable() {
        assert_eq!(normalize_range("*"), None);
        assert_eq!(normalize_range("latest"), None);
        assert_eq!(normalize_range("1.x"), None);
        assert_eq!(normalize_range("^4"), None);
        assert_eq!(normalize_range("git+https://github.com/a/b.git"), None);
        assert_eq!(normalize_range("file:../local"), None);
        assert_eq!(normalize_range("user/repo#main"), None);
    }

    #[test]
    fn test_package_json_single_dependency() {
        let content = r#"{"name": "app", "dependencies": {"lodash": "^4.17.15"}}"#;
        let queries = parse_package_json(content).unwrap();
        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0], PackageQuery::pinned("lodash", Ecosystem::Npm, "4.17.15").unwrap());
    }

    #[test]
    fn test_package_json_drops_unparsable_ranges() {
        let content = r#"{
            "dependencies": {"express": "4.18.2", "left-pad": "*"},
            "devDependencies": {"jest": "~29.7.0", "local": "file:./pkg"}
        }"#;
        let queries = parse_package_json(content).unwrap();
        assert_eq!(
            sorted_versions(&queries),
            vec![
                ("express".to_string(), Some("4.18.2".to_string())),
                ("jest".to_string(), Some("29.7.0".to_string())),
            ]
        );
    }

    #[test]
    fn test_package_json_invalid_json_is_error() {
        assert!(parse_package_json("{ not json").is_err());
    }

    #[test]
    fn test_package_lock_v3() {
        let content = r#"{
            "lockfileVersion": 3,
            "packages": {
                "": {"name": "app", "version": "1.0.0"},
                "node_modules/lodash": {"version": "4.17.21"},
                "node_modules/a/node_modules/@scope/b": {"version": "2.0.0"},
                "node_modules/linked": {"link": true, "resolved": "../linked"}
            }
        }"#;
        let queries = parse_package_lock(content).unwrap();
        assert_eq!(
            sorted_versions(&queries),
            vec![
                ("@scope/b".to_string(), Some("2.0.0".to_string())),
                ("lodash".to_string(), Some("4.17.21".to_string())),
            ]
        );
    }

    #[test]
    fn test_package_lock_v1_nested() {
        let content = r#"{
            "lockfileVersion": 1,
            "dependencies": {
                "express": {
                    "version": "4.17.1",
                    "dependencies": {"debug": {"version": "2.6.9"}}
                }
            }
        }"#;
        let queries = parse_package_lock(content).unwrap();
        assert_eq!(queries.len(), 2);
        assert!(queries.contains(&PackageQuery::pinned("debug", Ecosystem::Npm, "2.6.9").unwrap()));
    }

    #[test]
    fn test_yarn_lock_classic() {
        let content = r#"# yarn lockfile v1

lodash@^4.17.15, lodash@^4.17.20:
  version "4.17.21"
  resolved "https://registry.yarnpkg.com/lodash/-/lodash-4.17.21.tgz"

"@babel/core@^7.0.0":
  version "7.23.0"
"#;
        let queries = parse_yarn_lock(content).unwrap();
        assert_eq!(
            versions(&queries),
            vec![
                ("lodash".to_string(), Some("4.17.21".to_string())),
                ("@babel/core".to_string(), Some("7.23.0".to_string())),
            ]
        );
    }

    #[test]
    fn test_yarn_lock_berry() {
        let content = r#"__metadata:
  version: 6

"lodash@npm:^4.17.21":
  version: 4.17.21
  resolution: "lodash@npm:4.17.21"
"#;
        let queries = parse_yarn_lock(content).unwrap();
        assert_eq!(
            versions(&queries),
            vec![("lodash".to_string(), Some("4.17.21".to_string()))]
        );
    }

    #[test]
    fn test_pnpm_lock_v6() {
        let content = r#"lockfileVersion: '6.0'
packages:
  /lodash@4.17.21:
    resolution: {integrity: sha512-x}
  /@babel/core@7.23.0(supports-color@8.1.1):
    resolution: {integrity: sha512-y}
"#;
        let queries = parse_pnpm_lock(content).unwrap();
        assert_eq!(
            versions(&queries),
            vec![
                ("lodash".to_string(), Some("4.17.21".to_string())),
                ("@babel/core".to_string(), Some("7.23.0".to_string())),
            ]
        );
    }

    #[test]
    fn test_pnpm_lock_v5_slash_form() {
        let content = r#"lockfileVersion: 5.4
packages:
  /lodash/4.17.21:
    dev: false
  /@babel/core/7.12.0_supports-color@8.1.1:
    dev: true
"#;
        let queries = parse_pnpm_lock(content).unwrap();
        assert_eq!(
            versions(&queries),
            vec![
                ("lodash".to_string(), Some("4.17.21".to_string())),
                ("@babel/core".to_string(), Some("7.12.0".to_string())),
            ]
        );
    }

    #[test]
    fn test_parsers_are_deterministic() {
        let content = r#"{"dependencies": {"b": "1.0.0", "a": "^2.0.0"}}"#;
        assert_eq!(
            parse_package_json(content).unwrap(),
            parse_package_json(content).unwrap()
        );
    }
}
