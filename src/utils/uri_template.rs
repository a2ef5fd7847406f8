//! RFC 6570 Level 1 URI template matching for resource templates.
//!
//! Only the simple-string expansion form (`{var}`) is supported; this is
//! the subset resource templates actually need (`file:///{path}`,
//! `db://{table}/{id}`). Anything beyond Level 1 (reserved expansion,
//! fragment expansion, list/associative-array expansion) is out of scope.

use std::collections::HashMap;

use regex::Regex;

use crate::core::error::{McpError, McpResult};

/// A compiled RFC 6570 Level 1 URI template.
///
/// Compilation turns each `{var}` placeholder into a named capture group
/// and escapes everything else as a regex literal, so `matches` can both
/// test membership and recover the variable bindings in one pass.
#[derive(Debug, Clone)]
pub struct UriTemplate {
    template: String,
    variables: Vec<String>,
    pattern: Regex,
}

impl UriTemplate {
    /// Compile a template string. Returns [`McpError::DefinitionError`] if
    /// the template contains no `{var}` placeholders at all, since such a
    /// "template" is indistinguishable from a plain URI and would shadow
    /// exact-match lookups.
    pub fn compile(template: &str) -> McpResult<Self> {
        let var_re = Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}")
            .expect("static variable-placeholder pattern is valid");

        let mut variables = Vec::new();
        let mut pattern = String::from("^");
        let mut last_end = 0;

        for caps in var_re.captures_iter(template) {
            let whole = caps.get(0).unwrap();
            pattern.push_str(&regex::escape(&template[last_end..whole.start()]));
            let name = caps.get(1).unwrap().as_str().to_string();
            pattern.push_str(&format!("(?P<{name}>[^/]+)"));
            variables.push(name);
            last_end = whole.end();
        }

        if variables.is_empty() {
            return Err(McpError::DefinitionError(format!(
                "URI template '{template}' has no {{variable}} placeholders"
            )));
        }

        pattern.push_str(&regex::escape(&template[last_end..]));
        pattern.push('$');

        let compiled = Regex::new(&pattern)
            .map_err(|e| McpError::DefinitionError(format!("invalid URI template '{template}': {e}")))?;

        Ok(Self {
            template: template.to_string(),
            variables,
            pattern: compiled,
        })
    }

    /// The original template string.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Names of the variables this template captures, in order of appearance.
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Match a concrete URI against this template, returning the captured
    /// variable bindings on success.
    pub fn matches(&self, uri: &str) -> Option<HashMap<String, String>> {
        let caps = self.pattern.captures(uri)?;
        Some(
            self.variables
                .iter()
                .filter_map(|name| caps.name(name).map(|m| (name.clone(), m.as_str().to_string())))
                .collect(),
        )
    }

    /// `true` if `uri` matches this template.
    pub fn is_match(&self, uri: &str) -> bool {
        self.pattern.is_match(uri)
    }
}
