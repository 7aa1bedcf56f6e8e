//! Terraform invocation options.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Default executable name.
pub const DEFAULT_BINARY: &str = "terraform";

/// Options applied to every Terraform invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerraformOptions {
    /// Executable to run (`terraform`, `tofu`, or an absolute path)
    pub binary: String,
    /// Pass `-no-color` to commands that accept it
    pub no_color: bool,
    /// Extra environment variables for the child process
    pub env: HashMap<String, String>,
}

impl Default for TerraformOptions {
    fn default() -> Self {
        let mut env = HashMap::new();
        env.insert("TF_IN_AUTOMATION".to_string(), "1".to_string());

        Self {
            binary: DEFAULT_BINARY.to_string(),
            no_color: false,
            env,
        }
    }
}

impl TerraformOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary(mut self, binary: impl Into<String>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn no_color(mut self) -> Self {
        self.no_color = true;
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = TerraformOptions::default();
        assert_eq!(options.binary, "terraform");
        assert!(!options.no_color);
        assert_eq!(options.env.get("TF_IN_AUTOMATION").map(String::as_str), Some("1"));
    }

    #[test]
    fn test_options_builder() {
        let options = TerraformOptions::new()
            .binary("tofu")
            .no_color()
            .env("TF_LOG", "DEBUG");

        assert_eq!(options.binary, "tofu");
        assert!(options.no_color);
        assert_eq!(options.env.get("TF_LOG").map(String::as_str), Some("DEBUG"));
    }
}
