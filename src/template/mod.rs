// src/template/mod.rs

//! URI template multiplexing
//!
//! A repository template such as `/{{ .release }}/Everything/{{ .archs }}/os/`
//! is expanded against an [`Inventory`] into every concrete string:
//!
//! ```
//! use krawler::template::{multiplex, Inventory};
//!
//! let mut inventory = Inventory::new();
//! inventory.insert("archs", ["x86_64", "aarch64"]);
//! let urls = multiplex("/Everything/{{ .archs }}/os/", &inventory).unwrap();
//! assert_eq!(urls, vec!["/Everything/x86_64/os/", "/Everything/aarch64/os/"]);
//! ```
//!
//! The template is cut after every closing `}}`; text after the last
//! delimiter belongs to the last fragment. Each fragment renders to one
//! column of the [`crate::matrix`] engine, and the engine's rows are the
//! result.

use crate::error::{Error, Result};
use crate::matrix::{Column, Matrix};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const DOT: &str = "{{ . }}";

fn variable_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\{\{\s*\.([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid variable regex")
    })
}

/// Substitution values keyed by variable name
///
/// Values are stored as strings; anything `Display` can be inserted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    values: BTreeMap<String, Vec<String>>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the values for `name`, replacing any previous entry
    pub fn insert<I, V>(&mut self, name: impl Into<String>, values: I)
    where
        I: IntoIterator<Item = V>,
        V: ToString,
    {
        self.values
            .insert(name.into(), values.into_iter().map(|v| v.to_string()).collect());
    }

    pub fn get(&self, name: &str) -> Option<&[String]> {
        self.values.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Copy every entry of `other` into `self`, `other` winning on conflict
    pub fn extend(&mut self, other: &Inventory) {
        for (name, values) in &other.values {
            self.values.insert(name.clone(), values.clone());
        }
    }
}

impl<K, V> FromIterator<(K, Vec<V>)> for Inventory
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<T: IntoIterator<Item = (K, Vec<V>)>>(iter: T) -> Self {
        let mut inventory = Inventory::new();
        for (name, values) in iter {
            inventory.insert(name, values);
        }
        inventory
    }
}

/// One concrete string and the variable values that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expansion {
    pub value: String,
    pub bindings: BTreeMap<String, String>,
}

/// True if the template references at least one `{{ .name }}` variable
pub fn has_placeholders(template: &str) -> bool {
    variable_regex().is_match(template)
}

/// Variable names referenced by the template, in order of appearance
pub fn variables(template: &str) -> Vec<String> {
    variable_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// A piece of the template bound to at most one variable
#[derive(Debug, Clone)]
struct Fragment {
    variable: Option<String>,
    /// Text before and after the `{{ . }}` action
    before: String,
    after: String,
}

impl Fragment {
    /// Normalise `{{ .name }}` to `{{ . }}` and compile the result
    fn parse(text: &str) -> Result<Self> {
        let opens = text.matches(OPEN).count();
        let Some(caps) = variable_regex().captures(text) else {
            if opens > 0 {
                return Err(Error::TemplateError(format!(
                    "unsupported template action in '{text}'"
                )));
            }
            return Ok(Self {
                variable: None,
                before: text.to_string(),
                after: String::new(),
            });
        };
        if opens != 1 {
            return Err(Error::TemplateError(format!(
                "unbalanced delimiters in '{text}'"
            )));
        }

        let name = caps[1].to_string();
        let normalized = variable_regex().replace(text, DOT);
        let (before, after) = normalized
            .split_once(DOT)
            .ok_or_else(|| Error::TemplateError(format!("cannot compile fragment '{text}'")))?;

        Ok(Self {
            variable: Some(name),
            before: before.to_string(),
            after: after.to_string(),
        })
    }

    fn execute(&self, value: &str) -> String {
        format!("{}{}{}", self.before, value, self.after)
    }

    /// Render once per inventory value; literal fragments render once
    fn render(&self, inventory: &Inventory) -> Result<Column> {
        let Some(name) = &self.variable else {
            return Column::new([self.before.clone()]);
        };
        let values = inventory.get(name).unwrap_or_default();
        if values.is_empty() {
            return Err(Error::TemplateError(format!(
                "no inventory values for variable '{name}'"
            )));
        }
        Column::new(values.iter().map(|v| self.execute(v)))
    }
}

/// Cut the template after every closing delimiter
fn split_fragments(template: &str) -> Result<Vec<Fragment>> {
    let mut pieces: Vec<&str> = Vec::new();
    let mut rest = template;
    while let Some(at) = rest.find(CLOSE) {
        let (head, tail) = rest.split_at(at + CLOSE.len());
        pieces.push(head);
        rest = tail;
    }

    if pieces.is_empty() {
        return Err(Error::TemplateError(format!(
            "template '{template}' has no closing delimiter"
        )));
    }

    let mut owned: Vec<String> = pieces.into_iter().map(str::to_string).collect();
    if !rest.is_empty() {
        if rest.contains(OPEN) {
            return Err(Error::TemplateError(format!(
                "unterminated action in template '{template}'"
            )));
        }
        if let Some(last) = owned.last_mut() {
            last.push_str(rest);
        }
    }

    owned.iter().map(|text| Fragment::parse(text)).collect()
}

fn build(template: &str, inventory: &Inventory) -> Result<(Vec<Fragment>, Matrix)> {
    if !has_placeholders(template) {
        return Err(Error::TemplateError(format!(
            "template '{template}' references no variables"
        )));
    }

    let fragments = split_fragments(template)?;
    let columns = fragments
        .iter()
        .map(|fragment| fragment.render(inventory))
        .collect::<Result<Vec<_>>>()?;
    Ok((fragments, Matrix::new(columns)?))
}

/// Expand a template into every concrete string, in odometer order
pub fn multiplex(template: &str, inventory: &Inventory) -> Result<Vec<String>> {
    let (_, matrix) = build(template, inventory)?;
    Ok(matrix.rows().map(|row| row.value).collect())
}

/// Like [`multiplex`], also reporting which value each variable took
pub fn multiplex_with_bindings(template: &str, inventory: &Inventory) -> Result<Vec<Expansion>> {
    let (fragments, matrix) = build(template, inventory)?;

    let expansions = matrix
        .rows()
        .map(|row| {
            let bindings = fragments
                .iter()
                .zip(&row.coordinates)
                .filter_map(|(fragment, &at)| {
                    let name = fragment.variable.as_ref()?;
                    let value = inventory.get(name)?.get(at)?;
                    Some((name.clone(), value.clone()))
                })
                .collect();
            Expansion {
                value: row.value,
                bindings,
            }
        })
        .collect();
    Ok(expansions)
}
