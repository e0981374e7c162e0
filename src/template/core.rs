use regex::Regex;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Name of the capture group holding the unmatched path suffix.
const FINAL_GROUP: &str = "final";

/// Regex used for `{name}` variables without an explicit pattern.
const DEFAULT_VARIABLE_PATTERN: &str = "[^/]+?";

/// Ordered multi-valued map of names to values. Used for template
/// variables and for structured query/matrix/form parameters.
pub type MultiMap = BTreeMap<String, Vec<String>>;

/// Error raised while compiling a path template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated variable in template '{0}'")]
    UnterminatedVariable(String),
    #[error("empty variable name in template '{0}'")]
    EmptyVariableName(String),
    #[error("invalid regex for variable '{name}' in template '{template}': {reason}")]
    InvalidRegex {
        template: String,
        name: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Variable { name: String, pattern: Option<String> },
}

/// Compiled URI path template such as `/widgets/{id}` or
/// `/files/{path: .+}`.
///
/// Matching is anchored at the start of the path and leaves whatever follows
/// the template as the *final group*, so a resource template `/widgets`
/// matches `/widgets/7` with `/7` left over for operation matching.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    value: String,
    literal_chars: String,
    variables: Vec<String>,
    custom_variables: Vec<String>,
    pattern: String,
    regex: Regex,
}

impl PathTemplate {
    /// Compile a template. A leading `/` is added when missing and a trailing
    /// `/` is dropped, so `widgets/` and `/widgets` are the same template.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError`] for unbalanced braces, empty variable names
    /// or variable regexes that do not compile.
    pub fn new(template: &str) -> Result<Self, TemplateError> {
        let value = normalize(template);
        let segments = parse_segments(&value)?;

        let mut literal_chars = String::new();
        let mut variables = Vec::new();
        let mut custom_variables = Vec::new();
        let mut pattern = String::with_capacity(value.len() + 16);
        pattern.push('^');

        for segment in &segments {
            match segment {
                Segment::Literal(text) => {
                    literal_chars.push_str(text);
                    pattern.push_str(&regex::escape(text));
                }
                Segment::Variable { name, pattern: custom } => {
                    let group = format!("v{}", variables.len());
                    let body = match custom {
                        Some(re) => {
                            Regex::new(re).map_err(|e| TemplateError::InvalidRegex {
                                template: value.clone(),
                                name: name.clone(),
                                reason: e.to_string(),
                            })?;
                            custom_variables.push(name.clone());
                            re.as_str()
                        }
                        None => DEFAULT_VARIABLE_PATTERN,
                    };
                    pattern.push_str(&format!("(?P<{group}>{body})"));
                    variables.push(name.clone());
                }
            }
        }

        // "/" contributes nothing before the final group
        if pattern.ends_with('/') {
            pattern.pop();
        }
        pattern.push_str(&format!("(?P<{FINAL_GROUP}>/.*)?$"));

        let regex = Regex::new(&pattern).map_err(|e| TemplateError::InvalidRegex {
            template: value.clone(),
            name: String::new(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            value,
            literal_chars,
            variables,
            custom_variables,
            pattern,
            regex,
        })
    }

    /// Root template `/`.
    #[must_use]
    pub fn root() -> Self {
        // The root pattern has no user input to reject.
        Self {
            value: "/".to_string(),
            literal_chars: "/".to_string(),
            variables: Vec::new(),
            custom_variables: Vec::new(),
            pattern: format!("^(?P<{FINAL_GROUP}>/.*)?$"),
            regex: root_regex(),
        }
    }

    /// Normalized template text.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Literal characters of the template with all variables removed.
    #[must_use]
    pub fn literal_chars(&self) -> &str {
        &self.literal_chars
    }

    /// Variable names in declaration order.
    #[must_use]
    pub fn variables(&self) -> &[String] {
        &self.variables
    }

    /// Variables that declare their own regex.
    #[must_use]
    pub fn custom_variables(&self) -> &[String] {
        &self.custom_variables
    }

    /// Compiled regex source.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Match `path` against this template.
    ///
    /// On success the captured variables are appended to `values` and the
    /// leftover suffix replaces `values`' remaining path. On failure
    /// `values` is left untouched.
    pub fn match_path(&self, path: &str, values: &mut PathValues) -> bool {
        let path = if path.is_empty() { "/" } else { path };
        let Some(caps) = self.regex.captures(path) else {
            return false;
        };

        for (i, name) in self.variables.iter().enumerate() {
            if let Some(m) = caps.name(&format!("v{i}")) {
                values.add(name, m.as_str());
            }
        }
        values.remaining = caps
            .name(FINAL_GROUP)
            .map(|m| m.as_str().to_string())
            .filter(|s| !s.is_empty());
        true
    }

    /// Specificity ordering. `Less` means `self` is more specific: more
    /// literal characters first, then fewer variables, then more
    /// regex-constrained variables, then the compiled pattern text.
    #[must_use]
    pub fn compare_specificity(&self, other: &PathTemplate) -> Ordering {
        other
            .literal_chars
            .len()
            .cmp(&self.literal_chars.len())
            .then_with(|| self.variables.len().cmp(&other.variables.len()))
            .then_with(|| other.custom_variables.len().cmp(&self.custom_variables.len()))
            .then_with(|| self.pattern.cmp(&other.pattern))
    }
}

impl PartialEq for PathTemplate {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern
    }
}

impl Eq for PathTemplate {}

impl fmt::Display for PathTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

#[allow(clippy::expect_used)]
fn root_regex() -> Regex {
    Regex::new("^(?P<final>/.*)?$").expect("root template regex is valid")
}

fn normalize(template: &str) -> String {
    let trimmed = template.trim();
    let mut value = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    };
    if value.len() > 1 && value.ends_with('/') {
        value.pop();
    }
    value
}

/// Split a template into literal runs and `{name[: regex]}` variables.
/// Braces inside a variable's regex (`{id: \d{3}}`) are balanced.
fn parse_segments(template: &str) -> Result<Vec<Segment>, TemplateError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = template.chars();

    while let Some(c) = chars.next() {
        if c != '{' {
            literal.push(c);
            continue;
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }

        let mut depth = 1;
        let mut body = String::new();
        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                }
                _ => {}
            }
            body.push(c);
        }
        if depth != 0 {
            return Err(TemplateError::UnterminatedVariable(template.to_string()));
        }

        let (name, pattern) = match body.split_once(':') {
            Some((name, re)) => (name.trim(), Some(re.trim().to_string())),
            None => (body.trim(), None),
        };
        if name.is_empty() {
            return Err(TemplateError::EmptyVariableName(template.to_string()));
        }
        segments.push(Segment::Variable {
            name: name.to_string(),
            pattern: pattern.filter(|p| !p.is_empty()),
        });
    }
    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}

/// Variables captured along a match chain plus the path suffix still to be
/// matched.
///
/// Repeated variable names keep every captured value; [`PathValues::get`]
/// returns the most recent one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathValues {
    vars: MultiMap,
    remaining: Option<String>,
}

impl PathValues {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a value for `name`.
    pub fn add(&mut self, name: &str, value: &str) {
        self.vars
            .entry(name.to_string())
            .or_default()
            .push(value.to_string());
    }

    /// Last value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars
            .get(name)
            .and_then(|v| v.last())
            .map(String::as_str)
    }

    /// Every value captured for `name`, oldest first.
    #[must_use]
    pub fn get_all(&self, name: &str) -> &[String] {
        self.vars.get(name).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn vars(&self) -> &MultiMap {
        &self.vars
    }

    /// Suffix left by the last match, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<&str> {
        self.remaining.as_deref()
    }

    /// Path to match next: the remaining suffix, or `/` when nothing is left.
    #[must_use]
    pub fn current_path(&self) -> &str {
        self.remaining.as_deref().unwrap_or("/")
    }

    /// `true` when the last match consumed the whole path (nothing or only
    /// `/` left).
    #[must_use]
    pub fn is_final(&self) -> bool {
        matches!(self.remaining.as_deref(), None | Some("") | Some("/"))
    }
}
