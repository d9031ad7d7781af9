use crate::scanning::domain::ConfigFinding;
use crate::scanning::rules::config_rules::{
    CompiledPredicate, ConfigTarget, COMPILED_CONFIG_RULES,
};

const EVIDENCE_MAX_LEN: usize = 120;

/// Runs every rule that applies to the file's shape.
///
/// Paths the auditor does not recognize yield no findings. Output order
/// follows the rule catalogue, then line order.
pub fn audit_file(path: &str, content: &str) -> Vec<ConfigFinding> {
    let Some(target) = ConfigTarget::classify(path) else {
        return Vec::new();
    };

    let mut findings = Vec::new();
    for rule in COMPILED_CONFIG_RULES
        .iter()
        .filter(|r| r.def.targets.contains(&target))
    {
        let hit_lines: Vec<(usize, &str)> = match &rule.predicate {
            CompiledPredicate::Line(re) => content
                .lines()
                .enumerate()
                .filter(|(_, line)| !is_comment(line) && re.is_match(line))
                .collect(),
            CompiledPredicate::LineWithout { present, absent } => {
                if content.lines().any(|line| !is_comment(line) && absent.is_match(line)) {
                    Vec::new()
                } else {
                    content
                        .lines()
                        .enumerate()
                        .find(|(_, line)| !is_comment(line) && present.is_match(line))
                        .into_iter()
                        .collect()
                }
            }
        };

        for (idx, line) in hit_lines {
            findings.push(ConfigFinding {
                rule_id: rule.def.id.to_string(),
                title: rule.def.title.to_string(),
                description: rule.def.description.to_string(),
                severity: rule.def.severity,
                file_path: path.to_string(),
                line: Some(idx + 1),
                evidence: (!rule.def.redact_evidence)
                    .then(|| line.trim().chars().take(EVIDENCE_MAX_LEN).collect()),
            });
        }
    }

    findings
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with('#') || trimmed.starts_with("//")
}
