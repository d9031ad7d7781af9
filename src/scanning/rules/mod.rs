pub mod code_rules;
pub mod config_rules;

pub use code_rules::{CodeRuleDef, RuleFamily, CODE_RULES};
pub use config_rules::{ConfigRuleDef, ConfigTarget, CONFIG_RULES};
