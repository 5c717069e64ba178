use std::collections::HashMap;

use crate::value::Value;

/// Bind parameters for one execution of a statement.
///
/// Positional parameters bind in declaration order, covering both unnamed `?`
/// placeholders and the first-occurrence order of named ones. Named
/// parameters are looked up verbatim, so the sigil (`:`, `@`, or `$`) is part
/// of the key: the placeholder `:id` binds from the key `":id"`.
#[derive(Debug, Clone, Default)]
pub enum Params {
    /// Bind nothing. Placeholders the statement declares stay NULL, per the
    /// engine's contract for unbound parameters.
    #[default]
    None,
    Positional(Vec<Value>),
    Named(Vec<(String, Value)>),
}

impl From<()> for Params {
    fn from((): ()) -> Self {
        Params::None
    }
}

impl From<Vec<Value>> for Params {
    fn from(values: Vec<Value>) -> Self {
        Params::Positional(values)
    }
}

impl From<&[Value]> for Params {
    fn from(values: &[Value]) -> Self {
        Params::Positional(values.to_vec())
    }
}

impl<const N: usize> From<[Value; N]> for Params {
    fn from(values: [Value; N]) -> Self {
        Params::Positional(values.into())
    }
}

impl From<Vec<(String, Value)>> for Params {
    fn from(pairs: Vec<(String, Value)>) -> Self {
        Params::Named(pairs)
    }
}

impl<'a, const N: usize> From<[(&'a str, Value); N]> for Params {
    fn from(pairs: [(&'a str, Value); N]) -> Self {
        Params::Named(pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect())
    }
}

impl From<HashMap<String, Value>> for Params {
    fn from(pairs: HashMap<String, Value>) -> Self {
        Params::Named(pairs.into_iter().collect())
    }
}
