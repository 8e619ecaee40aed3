use ndarray::ArrayD;

/// A member of an [`AnySpace`](super::AnySpace). The variant mirrors the kind
/// of space that produced it.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Discrete(i64),
    Box(ArrayD<f64>),
    /// Named entries in the order of the owning `DictSpace`.
    Dict(Vec<(String, Value)>),
    Tuple(Vec<Value>),
}

impl Value {
    /// Look up a named entry of a `Dict` value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            Value::Dict(entries) => lookup(entries, name),
            _ => None,
        }
    }

    pub fn as_discrete(&self) -> Option<i64> {
        match self { Value::Discrete(v) => Some(*v), _ => None }
    }

    pub fn as_box(&self) -> Option<&ArrayD<f64>> {
        match self { Value::Box(a) => Some(a), _ => None }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self { Value::Tuple(items) => Some(items), _ => None }
    }
}

pub(crate) fn lookup<'a>(entries: &'a [(String, Value)], name: &str) -> Option<&'a Value> {
    entries.iter().find(|(k, _)| k == name).map(|(_, v)| v)
}
