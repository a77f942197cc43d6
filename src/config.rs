//! Interpreter settings.

use std::env;

pub const DEFAULT_MAX_CALL_DEPTH: usize = 256;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Java-strict mode: undeclared assignments and undefined reads fault, and maps
    /// can't be indexed with `[]` or `{}`.
    pub strict_java: bool,
    /// Script method frames allowed before evaluation faults.
    pub max_call_depth: usize,
    /// Packages imported into every global scope.
    pub default_imports: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            strict_java: false,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            default_imports: ["java.lang", "java.util", "java.util.function", "beanscript"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl Config {
    /// Defaults overridden by `BEANSCRIPT_STRICT_JAVA` and `BEANSCRIPT_MAX_CALL_DEPTH`.
    pub fn from_env() -> Self {
        let mut config = Config::default();
        if let Ok(strict) = env::var("BEANSCRIPT_STRICT_JAVA") {
            config.strict_java = parse_flag(&strict);
        }
        if let Some(depth) = env::var("BEANSCRIPT_MAX_CALL_DEPTH")
            .ok()
            .and_then(|d| d.trim().parse().ok())
        {
            config.max_call_depth = depth;
        }
        config
    }

    pub fn strict_java(mut self, strict: bool) -> Self {
        self.strict_java = strict;
        self
    }

    pub fn max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn default_import(mut self, package: &str) -> Self {
        self.default_imports.push(package.to_string());
        self
    }
}

fn parse_flag(text: &str) -> bool {
    matches!(
        text.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
