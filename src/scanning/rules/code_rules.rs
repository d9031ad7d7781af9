//! Insecure-code heuristics evaluated by the static pattern scanner

use crate::scanning::domain::Severity;
use regex::Regex;
use std::sync::LazyLock;

/// Request-derived or otherwise user-controlled input
const USER_INPUT: &str = r"(?i)(?:\breq(?:uest)?\.(?:query|body|params|headers|cookies|args|form|values|json|files|get|post|data)\b|\$_(?:GET|POST|REQUEST|COOKIE|SERVER)\b|\buser_?input\b|\bparams\[|\bprocess\.argv\b|\bsys\.argv\b|\blocation\.(?:search|hash)\b)";

/// Groups rules so a line reports at most one hit per family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleFamily {
    DynamicCode,
    CommandInjection,
    SqlInjection,
    ReflectedOutput,
    PathTraversal,
    WeakHash,
}

/// Static definition of one heuristic.
///
/// A rule fires on line N when every `line_patterns` entry matches line N and
/// `window_pattern` (if any) matches the window of lines N-1..=N+1.
pub struct CodeRuleDef {
    pub id: &'static str,
    pub family: RuleFamily,
    pub title: &'static str,
    pub description: &'static str,
    pub severity: Severity,
    pub line_patterns: &'static [&'static str],
    pub window_pattern: Option<&'static str>,
    pub references: &'static [&'static str],
}

/// Rule catalogue, evaluated in order
pub const CODE_RULES: &[CodeRuleDef] = &[
    CodeRuleDef {
        id: "dynamic-code-execution",
        family: RuleFamily::DynamicCode,
        title: "Dynamic code execution",
        description: "eval() executes a string as code; attacker-influenced input leads to code injection",
        severity: Severity::High,
        line_patterns: &[r"\beval\s*\("],
        window_pattern: None,
        references: &["https://cwe.mitre.org/data/definitions/95.html"],
    },
    CodeRuleDef {
        id: "dynamic-function-constructor",
        family: RuleFamily::DynamicCode,
        title: "Dynamic code construction",
        description: "Code is constructed at runtime from strings (Function constructor, exec, string timers)",
        severity: Severity::High,
        line_patterns: &[r#"(?:\bnew\s+Function\s*\(|(?:^|[^.\w])exec\s*\(\s*[\w"'f]|\bset(?:Timeout|Interval)\s*\(\s*["'`])"#],
        window_pattern: None,
        references: &["https://cwe.mitre.org/data/definitions/95.html"],
    },
    CodeRuleDef {
        id: "command-injection",
        family: RuleFamily::CommandInjection,
        title: "OS command built from user input",
        description: "A shell or process is spawned near request-derived input",
        severity: Severity::High,
        line_patterns: &[r"(?:\bchild_process\b|\b(?:exec|execSync|execFile|spawn|spawnSync)\s*\(|\bos\.(?:system|popen)\s*\(|\bsubprocess\.(?:call|run|Popen|check_output)\s*\(|\b(?:system|shell_exec|passthru|proc_open|popen)\s*\(|Runtime\.getRuntime\(\)\.exec\s*\()"],
        window_pattern: Some(USER_INPUT),
        references: &["https://cwe.mitre.org/data/definitions/78.html"],
    },
    CodeRuleDef {
        id: "sql-injection",
        family: RuleFamily::SqlInjection,
        title: "SQL query built by string concatenation",
        description: "A SQL statement is concatenated or interpolated with request-derived input",
        severity: Severity::High,
        line_patterns: &[
            r"(?i)\b(?:select\b.+\bfrom|insert\s+into|update\s+\w+\s+set|delete\s+from)\b",
            r#"(?:["'`]\s*\+|\+\s*["'`]|\$\{|%\s*\(|\.format\s*\(|\bf["'])"#,
        ],
        window_pattern: Some(USER_INPUT),
        references: &["https://cwe.mitre.org/data/definitions/89.html"],
    },
    CodeRuleDef {
        id: "reflected-xss",
        family: RuleFamily::ReflectedOutput,
        title: "Reflected request input in response",
        description: "Raw request-derived input is written to the response or the DOM",
        severity: Severity::Medium,
        line_patterns: &[
            r"(?:\bres\.(?:send|write|end)\s*\(|\bresponse\.write\s*\(|\bdocument\.write\s*\(|\.innerHTML\s*=|\becho\b|\bHttpResponse\s*\()",
            USER_INPUT,
        ],
        window_pattern: None,
        references: &["https://cwe.mitre.org/data/definitions/79.html"],
    },
    CodeRuleDef {
        id: "path-traversal",
        family: RuleFamily::PathTraversal,
        title: "File path built from user input",
        description: "A filesystem read or path resolution uses request-derived input",
        severity: Severity::High,
        line_patterns: &[r"(?:\bfs\.(?:readFile|readFileSync|createReadStream|readdir|stat|access)\s*\(|\bpath\.(?:join|resolve)\s*\(|\bsendFile\s*\(|\bsend_file\s*\(|\bopen\s*\(|\b(?:file_get_contents|fopen|readfile)\s*\()"],
        window_pattern: Some(USER_INPUT),
        references: &["https://cwe.mitre.org/data/definitions/22.html"],
    },
    CodeRuleDef {
        id: "weak-hash",
        family: RuleFamily::WeakHash,
        title: "Weak hash algorithm",
        description: "MD5 and SHA-1 are broken for security purposes",
        severity: Severity::Medium,
        line_patterns: &[r#"(?i)(?:createHash\s*\(\s*["'](?:md5|sha1)["']|\bhashlib\.(?:md5|sha1)\b|\b(?:md5|sha1)\s*\(|getInstance\s*\(\s*"(?:md5|sha-?1)"|\bDigest::(?:MD5|SHA1)\b)"#],
        window_pattern: None,
        references: &["https://cwe.mitre.org/data/definitions/328.html"],
    },
];

/// A rule with its patterns compiled
pub struct CompiledCodeRule {
    pub def: &'static CodeRuleDef,
    line_patterns: Vec<Regex>,
    window_pattern: Option<Regex>,
}

impl CompiledCodeRule {
    pub fn matches(&self, line: &str, window: &str) -> bool {
        self.line_patterns.iter().all(|re| re.is_match(line))
            && self
                .window_pattern
                .as_ref()
                .map_or(true, |re| re.is_match(window))
    }
}

/// Compiled catalogue, built on first use
pub static COMPILED_CODE_RULES: LazyLock<Vec<CompiledCodeRule>> = LazyLock::new(|| {
    CODE_RULES
        .iter()
        .filter_map(|def| {
            let line_patterns: Result<Vec<Regex>, _> =
                def.line_patterns.iter().map(|p| Regex::new(p)).collect();
            let window_pattern = def.window_pattern.map(Regex::new).transpose();
            match (line_patterns, window_pattern) {
                (Ok(line_patterns), Ok(window_pattern)) => Some(CompiledCodeRule {
                    def,
                    line_patterns,
                    window_pattern,
                }),
                _ => {
                    tracing::warn!(rule_id = %def.id, "Failed to compile code rule pattern");
                    None
                }
            }
        })
        .collect()
});

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(id: &str) -> &'static CompiledCodeRule {
        COMPILED_CODE_RULES
            .iter()
            .find(|r| r.def.id == id)
            .unwrap()
    }

    #[test]
    fn test_all_rules_compile() {
        assert_eq!(COMPILED_CODE_RULES.len(), CODE_RULES.len());
    }

    #[test]
    fn test_rule_ids_unique() {
        let mut ids: Vec<_> = CODE_RULES.iter().map(|r| r.id).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), CODE_RULES.len());
    }

    #[test]
    fn test_eval() {
        let r = rule("dynamic-code-execution");
        assert!(r.matches("eval(userInput)", "eval(userInput)"));
        assert!(!r.matches("ast.literal_eval(data)", ""));
        assert!(!r.matches("const evaluation = 1;", ""));
    }

    #[test]
    fn test_exec_method_is_not_dynamic_code() {
        let r = rule("dynamic-function-constructor");
        assert!(!r.matches("const m = pattern.exec(text);", ""));
        assert!(r.matches("exec(code)", ""));
        assert!(r.matches("const f = new Function('a', body);", ""));
    }

    #[test]
    fn test_command_injection_needs_user_input_in_window() {
        let r = rule("command-injection");
        let line = "exec('ls ' + dir, cb);";
        assert!(!r.matches(line, "const dir = '/tmp';\nexec('ls ' + dir, cb);"));
        assert!(r.matches(line, "const dir = req.query.dir;\nexec('ls ' + dir, cb);"));
    }

    #[test]
    fn test_sql_concatenation() {
        let r = rule("sql-injection");
        let line = r#"db.query("SELECT * FROM users WHERE id = " + req.params.id);"#;
        assert!(r.matches(line, line));
        let safe = r#"db.query("SELECT * FROM users WHERE id = ?", [id]);"#;
        assert!(!r.matches(safe, safe));
    }

    #[test]
    fn test_reflected_output() {
        let r = rule("reflected-xss");
        assert!(r.matches("res.send('Hello ' + req.query.name);", ""));
        assert!(!r.matches("res.send('Hello');", "const n = req.query.name;"));
        assert!(r.matches("echo $_GET['q'];", ""));
    }

    #[test]
    fn test_path_traversal() {
        let r = rule("path-traversal");
        let window = "const file = req.query.file;\nfs.readFile(path.join(root, file), cb);";
        assert!(r.matches("fs.readFile(path.join(root, file), cb);", window));
        assert!(!r.matches("fs.readFile('static.txt', cb);", "fs.readFile('static.txt', cb);"));
    }

    #[test]
    fn test_weak_hash() {
        let r = rule("weak-hash");
        assert!(r.matches("crypto.createHash('md5').update(pw)", ""));
        assert!(r.matches("h = hashlib.sha1(data)", ""));
        assert!(!r.matches("crypto.createHash('sha256')", ""));
    }
}
