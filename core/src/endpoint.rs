//! Operation name → endpoint lookup.
//!
//! # Design
//! The registry replaces dynamic attribute dispatch with an explicit table:
//! `ResourceClient::invoke` takes any operation name and resolves it here.
//! Templates are parsed once at registration so malformed entries are
//! rejected up front instead of at call time.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use crate::error::{ApiError, RegistryError};
use crate::http::HttpMethod;

/// Built-in resource backend surface: (operation, template, method).
const DASHBOARD_ENDPOINTS: &[(&str, &str, HttpMethod)] = &[
    ("get_menus", "menus", HttpMethod::Get),
    ("get_menu", "menus/{id}", HttpMethod::Get),
    ("update_menu", "menus/{id}", HttpMethod::Put),
    ("delete_menu", "menus/{id}", HttpMethod::Delete),
    ("get_restaurants", "restaurants", HttpMethod::Get),
    ("get_tags", "tags", HttpMethod::Get),
    ("get_user", "users/{id}", HttpMethod::Get),
];

static DASHBOARD: LazyLock<Arc<EndpointRegistry>> = LazyLock::new(|| {
    let mut registry = EndpointRegistry::new();
    for (name, template, method) in DASHBOARD_ENDPOINTS {
        registry
            .register(name, template, *method)
            .expect("built-in endpoint table is well formed");
    }
    Arc::new(registry)
});

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A parsed URL template such as `menus/{id}`.
///
/// `{{` and `}}` stand for literal braces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl UrlTemplate {
    pub fn parse(template: &str) -> Result<Self, RegistryError> {
        let invalid = |reason: &str| RegistryError::InvalidTemplate {
            template: template.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(invalid("single '}' encountered")),
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => return Err(invalid("nested '{' in placeholder")),
                            Some(c) => name.push(c),
                            None => return Err(invalid("unclosed placeholder")),
                        }
                    }
                    if name.is_empty() {
                        return Err(invalid("empty placeholder name"));
                    }
                    if name.contains([':', '!']) {
                        return Err(invalid("format specs and conversions are not supported"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(name));
                }
                c => literal.push(c),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Placeholder names in template order, each listed once.
    pub fn placeholders(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Placeholder(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Render the template, looking each placeholder up with `value_of`.
    ///
    /// Returns the name of the first placeholder `value_of` cannot resolve.
    pub fn render<'a, F>(&'a self, mut value_of: F) -> Result<String, &'a str>
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => out.push_str(&value_of(name).ok_or(name.as_str())?),
            }
        }
        Ok(out)
    }
}

/// Where and how an operation is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointDefinition {
    pub template: UrlTemplate,
    pub method: HttpMethod,
}

/// Static lookup table of operation name → endpoint.
#[derive(Debug, Clone, Default)]
pub struct EndpointRegistry {
    entries: BTreeMap<String, EndpointDefinition>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The resource backend table shared by every `ResourceClient`.
    pub fn dashboard() -> Arc<EndpointRegistry> {
        Arc::clone(&DASHBOARD)
    }

    pub fn register(&mut self, name: &str, template: &str, method: HttpMethod) -> Result<(), RegistryError> {
        if self.entries.contains_key(name) {
            return Err(RegistryError::DuplicateOperation(name.to_string()));
        }
        let template = UrlTemplate::parse(template)?;
        self.entries
            .insert(name.to_string(), EndpointDefinition { template, method });
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<&EndpointDefinition, ApiError> {
        self.entries
            .get(name)
            .ok_or_else(|| ApiError::UnsupportedOperation(name.to_string()))
    }

    /// Registered operation names in sorted order.
    pub fn operations(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
