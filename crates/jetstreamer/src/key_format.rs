use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};

/// Case target for [`Transform::Camelize`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaseStyle {
    /// `first_name` becomes `firstName`.
    #[default]
    Lower,
    /// `first_name` becomes `FirstName`.
    Upper,
}

/// A single key-transform step. Steps apply in declared order, each consuming
/// the previous step's output.
#[derive(Clone)]
pub enum Transform {
    Camelize(CaseStyle),
    Upcase,
    Downcase,
    /// `foo_bar` becomes `foo-bar`.
    Dasherize,
    /// `FooBar` / `foo-bar` become `foo_bar`.
    Underscore,
    Custom(Arc<TransformFn>),
}

pub type TransformFn = dyn Fn(&str) -> std::result::Result<String, String> + Send + Sync;

impl Transform {
    /// Custom step that cannot fail.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Transform::Custom(Arc::new(move |key| Ok(f(key))))
    }

    /// Custom step that may reject a key; the rejection aborts the render as
    /// a key format error.
    pub fn try_custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> std::result::Result<String, String> + Send + Sync + 'static,
    {
        Transform::Custom(Arc::new(f))
    }

    fn apply(&self, key: &str) -> Result<String> {
        match self {
            Transform::Camelize(style) => Ok(camelize(key, *style)),
            Transform::Upcase => Ok(key.to_uppercase()),
            Transform::Downcase => Ok(key.to_lowercase()),
            Transform::Dasherize => Ok(key.replace('_', "-")),
            Transform::Underscore => Ok(underscore(key)),
            Transform::Custom(f) => f(key).map_err(Error::KeyFormat),
        }
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transform::Camelize(style) => f.debug_tuple("Camelize").field(style).finish(),
            Transform::Upcase => f.write_str("Upcase"),
            Transform::Downcase => f.write_str("Downcase"),
            Transform::Dasherize => f.write_str("Dasherize"),
            Transform::Underscore => f.write_str("Underscore"),
            Transform::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Ordered transform pipeline with a per-instance memo of formatted keys.
/// Cloning yields the same steps with an empty memo, so a template formatter
/// (for example the one held by `Options`) never accumulates state from the
/// builders seeded off it.
pub struct KeyFormatter {
    steps: Vec<Transform>,
    memo: RefCell<HashMap<String, String>>,
}

impl KeyFormatter {
    pub fn new<I>(steps: I) -> Self
    where
        I: IntoIterator<Item = Transform>,
    {
        KeyFormatter {
            steps: steps.into_iter().collect(),
            memo: RefCell::new(HashMap::new()),
        }
    }

    /// Formatter that leaves keys untouched.
    pub fn identity() -> Self {
        KeyFormatter::new([])
    }

    pub fn format(&self, key: &str) -> Result<String> {
        if self.steps.is_empty() {
            return Ok(key.to_owned());
        }
        if let Some(hit) = self.memo.borrow().get(key) {
            return Ok(hit.clone());
        }
        let mut value = key.to_owned();
        for step in &self.steps {
            value = step.apply(&value)?;
        }
        self.memo
            .borrow_mut()
            .insert(key.to_owned(), value.clone());
        Ok(value)
    }
}

impl Default for KeyFormatter {
    fn default() -> Self {
        KeyFormatter::identity()
    }
}

impl Clone for KeyFormatter {
    fn clone(&self) -> Self {
        KeyFormatter {
            steps: self.steps.clone(),
            memo: RefCell::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for KeyFormatter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyFormatter")
            .field("steps", &self.steps)
            .field("memoized", &self.memo.borrow().len())
            .finish()
    }
}

fn camelize(key: &str, style: CaseStyle) -> String {
    let mut out = String::with_capacity(key.len());
    let mut first = true;
    let mut upper_next = false;
    for ch in key.chars() {
        if ch == '_' || ch == '-' {
            upper_next = true;
            continue;
        }
        if first {
            match style {
                CaseStyle::Lower => out.extend(ch.to_lowercase()),
                CaseStyle::Upper => out.extend(ch.to_uppercase()),
            }
            first = false;
        } else if upper_next {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        upper_next = false;
    }
    out
}

fn underscore(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut prev_lower = false;
    for ch in key.chars() {
        if ch == '-' {
            out.push('_');
            prev_lower = false;
        } else if ch.is_uppercase() {
            if prev_lower {
                out.push('_');
            }
            out.extend(ch.to_lowercase());
            prev_lower = false;
        } else {
            out.push(ch);
            prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        }
    }
    out
}
