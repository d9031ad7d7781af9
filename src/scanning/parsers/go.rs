//! Go modules: `go.mod`

use super::{exact_version, QueryList};
use crate::scanning::domain::{Ecosystem, PackageQuery};
use crate::shared::Result;

/// Parses `require` directives, both single-line and `require ( ... )` blocks.
///
/// Trailing `//` comments such as `// indirect` are ignored. `replace` and
/// `exclude` directives do not contribute queries.
pub fn parse_go_mod(content: &str) -> Result<Vec<PackageQuery>> {
    let mut queries = QueryList::default();
    let mut in_require_block = false;
    let mut in_other_block = false;

    for raw_line in content.lines() {
        let line = raw_line.split("//").next().unwrap_or_default().trim();
        if line.is_empty() {
            continue;
        }

        if in_require_block || in_other_block {
            if line == ")" {
                in_require_block = false;
                in_other_block = false;
            } else if in_require_block {
                push_requirement(line, &mut queries);
            }
            continue;
        }

        let (directive, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();
        match directive {
            "require" if rest == "(" => in_require_block = true,
            "require" => push_requirement(rest, &mut queries),
            _ if rest == "(" => in_other_block = true,
            _ => {}
        }
    }

    Ok(queries.into_vec())
}

/// `github.com/gin-gonic/gin v1.9.1`
fn push_requirement(spec: &str, queries: &mut QueryList) {
    let mut parts = spec.split_whitespace();
    let (Some(module), Some(version)) = (parts.next(), parts.next()) else {
        tracing::debug!(spec = %spec, "Skipping malformed go.mod requirement");
        return;
    };
    let Some(version) = exact_version(version) else {
        return;
    };
    if let Ok(query) = PackageQuery::pinned(module, Ecosystem::Go, &version) {
        queries.push(query);
    }
}
