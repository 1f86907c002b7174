//! Typed Predicate Tree
//!
//! Strict, typed view of a normalized catalogue predicate. Used wherever the
//! predicate has to be rewritten or evaluated rather than just displayed.

use std::collections::BTreeSet;

use serde_json::{Map, Value};
use smallvec::SmallVec;

use crate::predicates::{CatalogueEntity, IDS, Operator, PredicateError};

/// Ordered, de-duplicated set of opaque entity ids.
pub type IdSet = BTreeSet<String>;

/// Leaf filter: the entity's id must be one of `ids`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityFilter {
    /// Entity the filter applies to.
    pub entity: CatalogueEntity,

    /// Accepted ids.
    pub ids: IdSet,
}

impl EntityFilter {
    /// Create a filter from any iterable of ids.
    pub fn new<I, S>(entity: CatalogueEntity, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entity,
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    fn matches(&self, facts: &ProductFacts<'_>) -> bool {
        match self.entity {
            CatalogueEntity::Product => self.ids.contains(facts.product),
            CatalogueEntity::Category => facts
                .category
                .is_some_and(|category| self.ids.contains(category)),
            CatalogueEntity::Collection => !self.ids.is_disjoint(facts.collections),
            CatalogueEntity::Variant => !self.ids.is_disjoint(facts.variants),
        }
    }

    fn to_value(&self) -> Value {
        let ids = self.ids.iter().cloned().map(Value::String).collect();
        let mut filter = Map::new();

        filter.insert(IDS.to_string(), Value::Array(ids));

        Value::Object(filter)
    }
}

/// Catalogue membership facts of one product, used for evaluation.
#[derive(Debug, Clone, Copy)]
pub struct ProductFacts<'a> {
    /// Product id.
    pub product: &'a str,

    /// Category the product belongs to.
    pub category: Option<&'a str>,

    /// Collections the product belongs to.
    pub collections: &'a IdSet,

    /// Ids of the product's variants.
    pub variants: &'a IdSet,
}

/// Typed catalogue predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CataloguePredicate {
    /// Every child must match.
    And(Vec<CataloguePredicate>),

    /// At least one child must match.
    Or(Vec<CataloguePredicate>),

    /// Field filters sharing one JSON object; all of them must match.
    /// No filters at all is the empty predicate `{}`.
    Filters(SmallVec<[EntityFilter; 1]>),
}

impl CataloguePredicate {
    /// The empty predicate.
    #[must_use]
    pub fn empty() -> Self {
        Self::Filters(SmallVec::new())
    }

    /// A single-entity filter node.
    pub fn filter<I, S>(entity: CatalogueEntity, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut filters = SmallVec::new();

        filters.push(EntityFilter::new(entity, ids));

        Self::Filters(filters)
    }

    /// Whether this is the empty predicate.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Filters(filters) if filters.is_empty())
    }

    /// Evaluate the predicate for one product.
    ///
    /// The empty predicate and empty composites match nothing.
    #[must_use]
    pub fn matches(&self, facts: &ProductFacts<'_>) -> bool {
        match self {
            Self::And(children) => {
                !children.is_empty() && children.iter().all(|child| child.matches(facts))
            }
            Self::Or(children) => children.iter().any(|child| child.matches(facts)),
            Self::Filters(filters) => {
                !filters.is_empty() && filters.iter().all(|filter| filter.matches(facts))
            }
        }
    }

    /// Canonical JSON form with camelCase keys and sorted ids.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::And(children) => composite_value(Operator::And, children),
            Self::Or(children) => composite_value(Operator::Or, children),
            Self::Filters(filters) => Value::Object(
                filters
                    .iter()
                    .map(|filter| (filter.entity.field().to_string(), filter.to_value()))
                    .collect(),
            ),
        }
    }

    /// Visit every entity filter, depth first.
    pub fn for_each_filter<F>(&self, visit: &mut F)
    where
        F: FnMut(&EntityFilter),
    {
        match self {
            Self::And(children) | Self::Or(children) => {
                for child in children {
                    child.for_each_filter(visit);
                }
            }
            Self::Filters(filters) => {
                for filter in filters {
                    visit(filter);
                }
            }
        }
    }
}

impl Default for CataloguePredicate {
    fn default() -> Self {
        Self::empty()
    }
}

fn composite_value(op: Operator, children: &[CataloguePredicate]) -> Value {
    let mut node = Map::new();

    node.insert(
        op.key().to_string(),
        Value::Array(children.iter().map(CataloguePredicate::to_value).collect()),
    );

    Value::Object(node)
}

impl TryFrom<&Value> for CataloguePredicate {
    type Error = PredicateError;

    /// Parse a normalized predicate. `null` is read as the empty predicate.
    fn try_from(value: &Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Self::empty()),
            Value::Object(map) => parse_node(map),
            _ => Err(PredicateError::Malformed("predicate".to_string())),
        }
    }
}

fn parse_node(map: &Map<String, Value>) -> Result<CataloguePredicate, PredicateError> {
    let mut entries = map.iter();

    if let (Some((key, value)), None) = (entries.next(), entries.next())
        && let Some(op) = Operator::from_key(key)
    {
        let Value::Array(items) = value else {
            return Err(PredicateError::Malformed(key.clone()));
        };

        let children = items
            .iter()
            .map(|item| match item {
                Value::Object(child) => parse_node(child),
                _ => Err(PredicateError::Malformed(key.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        return Ok(match op {
            Operator::And => CataloguePredicate::And(children),
            Operator::Or => CataloguePredicate::Or(children),
        });
    }

    if map.len() > 1 && map.keys().any(|key| Operator::from_key(key).is_some()) {
        return Err(PredicateError::MixedOperators { index: None });
    }

    let mut filters = map
        .iter()
        .map(|(key, value)| parse_filter(key, value))
        .collect::<Result<SmallVec<[EntityFilter; 1]>, _>>()?;

    filters.sort_by_key(|filter| filter.entity);

    Ok(CataloguePredicate::Filters(filters))
}

fn parse_filter(key: &str, value: &Value) -> Result<EntityFilter, PredicateError> {
    let entity =
        CatalogueEntity::from_field(key).ok_or_else(|| PredicateError::UnknownField(key.into()))?;

    let Value::Object(filter) = value else {
        return Err(PredicateError::Malformed(key.to_string()));
    };

    if let Some(unknown) = filter.keys().find(|field| field.as_str() != IDS) {
        return Err(PredicateError::UnknownField(format!("{key}.{unknown}")));
    }

    let ids = match filter.get(IDS) {
        None | Some(Value::Null) => IdSet::new(),
        Some(Value::Array(ids)) => ids
            .iter()
            .map(|id| match id {
                Value::String(id) => Ok(id.clone()),
                _ => Err(PredicateError::Malformed(format!("{key}.{IDS}"))),
            })
            .collect::<Result<IdSet, _>>()?,
        Some(_) => return Err(PredicateError::Malformed(format!("{key}.{IDS}"))),
    };

    Ok(EntityFilter { entity, ids })
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use smallvec::smallvec;
    use testresult::TestResult;

    use super::*;

    fn ids(values: &[&str]) -> IdSet {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn parses_nested_operators() -> TestResult {
        let value = json!({
            "AND": [
                {"categoryPredicate": {"ids": ["C1"]}},
                {"OR": [
                    {"productPredicate": {"ids": ["P2", "P1"]}},
                    {"variantPredicate": {"ids": ["V1"]}}
                ]}
            ]
        });

        let predicate = CataloguePredicate::try_from(&value)?;

        assert_eq!(
            predicate,
            CataloguePredicate::And(vec![
                CataloguePredicate::filter(CatalogueEntity::Category, ["C1"]),
                CataloguePredicate::Or(vec![
                    CataloguePredicate::filter(CatalogueEntity::Product, ["P1", "P2"]),
                    CataloguePredicate::filter(CatalogueEntity::Variant, ["V1"]),
                ]),
            ])
        );

        Ok(())
    }

    #[test]
    fn serializes_back_to_canonical_json() -> TestResult {
        let value = json!({
            "OR": [
                {"productPredicate": {"ids": ["P2", "P1", "P2"]}},
                {"categoryPredicate": {"ids": ["C1"]}, "collectionPredicate": {"ids": ["L1"]}}
            ]
        });

        let predicate = CataloguePredicate::try_from(&value)?;

        assert_eq!(
            predicate.to_value(),
            json!({
                "OR": [
                    {"productPredicate": {"ids": ["P1", "P2"]}},
                    {"categoryPredicate": {"ids": ["C1"]}, "collectionPredicate": {"ids": ["L1"]}}
                ]
            })
        );

        Ok(())
    }

    #[test]
    fn null_and_empty_object_are_the_empty_predicate() -> TestResult {
        assert!(CataloguePredicate::try_from(&Value::Null)?.is_empty());
        assert!(CataloguePredicate::try_from(&json!({}))?.is_empty());
        assert_eq!(CataloguePredicate::empty().to_value(), json!({}));

        Ok(())
    }

    #[test]
    fn rejects_unknown_fields_and_bad_ids() {
        assert_eq!(
            CataloguePredicate::try_from(&json!({"brandPredicate": {"ids": []}})),
            Err(PredicateError::UnknownField("brandPredicate".to_string()))
        );

        assert_eq!(
            CataloguePredicate::try_from(&json!({"productPredicate": {"ids": [1]}})),
            Err(PredicateError::Malformed("productPredicate.ids".to_string()))
        );

        assert_eq!(
            CataloguePredicate::try_from(&json!({"productPredicate": {"slugs": ["a"]}})),
            Err(PredicateError::UnknownField("productPredicate.slugs".to_string()))
        );

        assert_eq!(
            CataloguePredicate::try_from(&json!({"OR": {"productPredicate": {"ids": []}}})),
            Err(PredicateError::Malformed("OR".to_string()))
        );
    }

    #[test]
    fn rejects_mixed_operators() {
        assert_eq!(
            CataloguePredicate::try_from(&json!({"OR": [], "productPredicate": {"ids": []}})),
            Err(PredicateError::MixedOperators { index: None })
        );
    }

    #[test]
    fn evaluates_and_or_semantics() {
        let collections = ids(&["summer"]);
        let variants = ids(&["V1", "V2"]);

        let facts = ProductFacts {
            product: "P1",
            category: Some("shoes"),
            collections: &collections,
            variants: &variants,
        };

        let both = CataloguePredicate::And(vec![
            CataloguePredicate::filter(CatalogueEntity::Category, ["shoes"]),
            CataloguePredicate::filter(CatalogueEntity::Collection, ["winter"]),
        ]);

        let either = CataloguePredicate::Or(vec![
            CataloguePredicate::filter(CatalogueEntity::Category, ["shoes"]),
            CataloguePredicate::filter(CatalogueEntity::Collection, ["winter"]),
        ]);

        let implicit_and = CataloguePredicate::Filters(smallvec![
            EntityFilter::new(CatalogueEntity::Product, ["P1"]),
            EntityFilter::new(CatalogueEntity::Variant, ["V2"]),
        ]);

        assert!(!both.matches(&facts));
        assert!(either.matches(&facts));
        assert!(implicit_and.matches(&facts));
        assert!(!CataloguePredicate::empty().matches(&facts));
        assert!(!CataloguePredicate::And(Vec::new()).matches(&facts));
        assert!(!CataloguePredicate::Or(Vec::new()).matches(&facts));
    }

    #[test]
    fn visits_every_filter() {
        let predicate = CataloguePredicate::Or(vec![
            CataloguePredicate::filter(CatalogueEntity::Product, ["P1"]),
            CataloguePredicate::And(vec![CataloguePredicate::filter(
                CatalogueEntity::Variant,
                ["V1"],
            )]),
        ]);

        let mut seen = Vec::new();

        predicate.for_each_filter(&mut |filter| seen.push(filter.entity));

        assert_eq!(seen, vec![CatalogueEntity::Product, CatalogueEntity::Variant]);
    }
}
