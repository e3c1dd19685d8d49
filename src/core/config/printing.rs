use crate::core::config::data::Config;
use crate::core::secrets::mask_secret;

impl Config {
    /// Settings summary, one entry per line. The credential is masked.
    pub fn summary_lines(&self, api_key: Option<&str>) -> Vec<String> {
        let mut lines = vec!["Current configuration:".to_string()];
        match api_key {
            Some(key) if !key.is_empty() => lines.push(format!("  api-key: {}", mask_secret(key))),
            _ => lines.push("  api-key: (unset)".to_string()),
        }
        match &self.theme {
            Some(theme) => lines.push(format!("  theme: {theme}")),
            None => lines.push(format!("  theme: {} (default)", self.color_scheme())),
        }
        match &self.model {
            Some(model) => lines.push(format!("  model: {model}")),
            None => lines.push(format!("  model: {} (default)", self.model_or_default())),
        }
        if let Some(base_url) = &self.base_url {
            lines.push(format!("  base-url: {base_url}"));
        }
        lines
    }

    pub fn print_all(&self, api_key: Option<&str>) {
        for line in self.summary_lines(api_key) {
            println!("{line}");
        }
    }
}
