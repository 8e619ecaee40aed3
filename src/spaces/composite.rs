//! Composite spaces and the tagged [`AnySpace`] they are built from.
//!
//! Composites split the incoming key into one sub-key per child, in order, and
//! check membership by counting violations over every child rather than
//! stopping at the first failure.

use std::collections::HashSet;

use crate::core::{GymError, Result};
use crate::utils::rng::PrngKey;

use super::value::{lookup, Value};
use super::{BoxSpace, Discrete, Space};

/// Any space, as a tagged variant. Elements are [`Value`]s.
#[derive(Clone, Debug, PartialEq)]
pub enum AnySpace {
    Discrete(Discrete),
    Box(BoxSpace),
    Dict(DictSpace),
    Tuple(TupleSpace),
}

impl Space for AnySpace {
    type Element = Value;

    fn sample(&self, key: PrngKey) -> Value {
        match self {
            AnySpace::Discrete(s) => Value::Discrete(s.sample(key)),
            AnySpace::Box(s) => Value::Box(s.sample(key)),
            AnySpace::Dict(s) => Value::Dict(s.sample(key)),
            AnySpace::Tuple(s) => Value::Tuple(s.sample(key)),
        }
    }

    fn contains(&self, elem: &Value) -> bool {
        match (self, elem) {
            (AnySpace::Discrete(s), Value::Discrete(v)) => s.contains(v),
            (AnySpace::Box(s), Value::Box(v)) => s.contains(v),
            (AnySpace::Dict(s), Value::Dict(v)) => s.contains(v),
            (AnySpace::Tuple(s), Value::Tuple(v)) => s.contains(v),
            _ => false,
        }
    }
}

impl From<Discrete> for AnySpace { fn from(s: Discrete) -> Self { AnySpace::Discrete(s) } }
impl From<BoxSpace> for AnySpace { fn from(s: BoxSpace) -> Self { AnySpace::Box(s) } }
impl From<DictSpace> for AnySpace { fn from(s: DictSpace) -> Self { AnySpace::Dict(s) } }
impl From<TupleSpace> for AnySpace { fn from(s: TupleSpace) -> Self { AnySpace::Tuple(s) } }

/// Ordered mapping from names to spaces.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct DictSpace {
    spaces: Vec<(String, AnySpace)>,
}

impl DictSpace {
    /// Entries keep the order given. Duplicate names are rejected.
    pub fn new<I, K>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, AnySpace)>,
        K: Into<String>,
    {
        let spaces: Vec<(String, AnySpace)> = entries.into_iter().map(|(k, s)| (k.into(), s)).collect();
        let mut seen = HashSet::with_capacity(spaces.len());
        for (name, _) in &spaces {
            if !seen.insert(name.as_str()) {
                return Err(GymError::InvalidSpaceConfig(format!("DictSpace has duplicate entry {name:?}")));
            }
        }
        Ok(Self { spaces })
    }

    /// For entry lists whose names are known to be distinct.
    pub(crate) fn new_unchecked(spaces: Vec<(String, AnySpace)>) -> Self {
        Self { spaces }
    }

    pub fn get(&self, name: &str) -> Option<&AnySpace> {
        self.spaces.iter().find(|(k, _)| k == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.spaces.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnySpace)> {
        self.spaces.iter().map(|(k, s)| (k.as_str(), s))
    }

    pub fn len(&self) -> usize { self.spaces.len() }

    pub fn is_empty(&self) -> bool { self.spaces.is_empty() }
}

impl Space for DictSpace {
    type Element = Vec<(String, Value)>;

    fn sample(&self, key: PrngKey) -> Self::Element {
        let keys = key.split(self.spaces.len());
        self.spaces
            .iter()
            .zip(keys)
            .map(|((name, space), k)| (name.clone(), space.sample(k)))
            .collect()
    }

    fn contains(&self, elem: &Self::Element) -> bool {
        let out_of_space: usize = self
            .spaces
            .iter()
            .map(|(name, space)| {
                let inside = lookup(elem, name).is_some_and(|v| space.contains(v));
                usize::from(!inside)
            })
            .sum();
        out_of_space == 0
    }
}

/// Ordered product of spaces.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct TupleSpace {
    spaces: Vec<AnySpace>,
}

impl TupleSpace {
    pub fn new<I: IntoIterator<Item = AnySpace>>(spaces: I) -> Self {
        Self { spaces: spaces.into_iter().collect() }
    }

    pub fn get(&self, index: usize) -> Option<&AnySpace> { self.spaces.get(index) }

    pub fn iter(&self) -> impl Iterator<Item = &AnySpace> { self.spaces.iter() }

    pub fn len(&self) -> usize { self.spaces.len() }

    pub fn is_empty(&self) -> bool { self.spaces.is_empty() }
}

impl Space for TupleSpace {
    type Element = Vec<Value>;

    fn sample(&self, key: PrngKey) -> Self::Element {
        let keys = key.split(self.spaces.len());
        self.spaces.iter().zip(keys).map(|(space, k)| space.sample(k)).collect()
    }

    /// Element `i` is checked against space `i`; a length mismatch counts as
    /// one violation per missing or surplus element.
    fn contains(&self, elem: &Self::Element) -> bool {
        let missing = self.spaces.len().abs_diff(elem.len());
        let out_of_space: usize = self
            .spaces
            .iter()
            .zip(elem)
            .map(|(space, v)| usize::from(!space.contains(v)))
            .sum();
        out_of_space + missing == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spaces::Dtype;

    fn agent_space() -> DictSpace {
        DictSpace::new([
            ("move", AnySpace::from(Discrete::new(4).unwrap())),
            ("aim", BoxSpace::new(-1.0, 1.0, &[2], Dtype::F32).unwrap().into()),
        ])
        .unwrap()
    }

    #[test]
    fn dict_preserves_order_and_contains_samples() {
        let space = agent_space();
        assert_eq!(space.names().collect::<Vec<_>>(), vec!["move", "aim"]);
        let v = space.sample(PrngKey::new(11));
        assert_eq!(v[0].0, "move");
        assert_eq!(v[1].0, "aim");
        assert!(space.contains(&v));
    }

    #[test]
    fn dict_sample_matches_split_children() {
        let space = agent_space();
        let v = space.sample(PrngKey::new(3));
        let keys = PrngKey::new(3).split(2);
        let mv = space.get("move").unwrap().sample(keys[0].clone());
        let aim = space.get("aim").unwrap().sample(keys[1].clone());
        assert_eq!(v, vec![("move".to_string(), mv), ("aim".to_string(), aim)]);
    }

    #[test]
    fn dict_rejects_single_bad_or_missing_entry() {
        let space = agent_space();
        let mut v = space.sample(PrngKey::new(12));
        v[0].1 = Value::Discrete(4);
        assert!(!space.contains(&v));
        let partial = vec![("move".to_string(), Value::Discrete(1))];
        assert!(!space.contains(&partial));
    }

    #[test]
    fn dict_rejects_duplicate_names() {
        let d = || AnySpace::from(Discrete::new(2).unwrap());
        let err = DictSpace::new([("a", d()), ("a", d())]).unwrap_err();
        assert!(matches!(err, GymError::InvalidSpaceConfig(_)));
    }

    #[test]
    fn tuple_checks_elementwise() {
        let space = TupleSpace::new([
            AnySpace::from(Discrete::new(2).unwrap()),
            AnySpace::from(Discrete::new(10).unwrap()),
        ]);
        let v = space.sample(PrngKey::new(21));
        assert!(space.contains(&v));
        assert!(space.contains(&vec![Value::Discrete(1), Value::Discrete(9)]));
        assert!(!space.contains(&vec![Value::Discrete(9), Value::Discrete(1)]));
        assert!(!space.contains(&vec![Value::Discrete(1)]));
        assert!(!space.contains(&vec![Value::Discrete(1), Value::Discrete(1), Value::Discrete(1)]));
    }

    #[test]
    fn nested_composites_round_trip_containment() {
        let inner = agent_space();
        let space = AnySpace::Tuple(TupleSpace::new([AnySpace::from(inner), AnySpace::from(Discrete::new(3).unwrap())]));
        for key in PrngKey::new(99).split(25) {
            let v = space.sample(key);
            assert!(space.contains(&v));
        }
    }

    #[test]
    fn mismatched_variant_is_not_contained() {
        let space = AnySpace::from(Discrete::new(3).unwrap());
        assert!(!space.contains(&Value::Tuple(vec![])));
        let empty = AnySpace::from(TupleSpace::default());
        assert!(empty.contains(&Value::Tuple(vec![])));
    }
}
