//! Catalogue ⇄ Predicate Conversion
//!
//! Legacy sales and vouchers describe their catalogue as four flat id sets.
//! Promotion rules store the same information as an `OR` of entity filters.
//! This module converts between the two and merges incremental changes.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::predicates::{
    AND, CatalogueEntity, CataloguePredicate, IDS, IdSet, OR, PredicateError,
};

/// Flat catalogue snapshot.
///
/// Derived from a predicate for display and diffing only; it cannot tell
/// `AND` from `OR` and must never be used to decide membership.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogueInfo {
    /// Product ids.
    #[serde(default)]
    pub products: IdSet,

    /// Category ids.
    #[serde(default)]
    pub categories: IdSet,

    /// Collection ids.
    #[serde(default)]
    pub collections: IdSet,

    /// Variant ids.
    #[serde(default)]
    pub variants: IdSet,
}

impl CatalogueInfo {
    /// Whether every set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
            && self.categories.is_empty()
            && self.collections.is_empty()
            && self.variants.is_empty()
    }

    /// Ids for one entity kind.
    #[must_use]
    pub fn ids(&self, entity: CatalogueEntity) -> &IdSet {
        match entity {
            CatalogueEntity::Product => &self.products,
            CatalogueEntity::Category => &self.categories,
            CatalogueEntity::Collection => &self.collections,
            CatalogueEntity::Variant => &self.variants,
        }
    }

    /// Mutable ids for one entity kind.
    pub fn ids_mut(&mut self, entity: CatalogueEntity) -> &mut IdSet {
        match entity {
            CatalogueEntity::Product => &mut self.products,
            CatalogueEntity::Category => &mut self.categories,
            CatalogueEntity::Collection => &mut self.collections,
            CatalogueEntity::Variant => &mut self.variants,
        }
    }

    /// Set union, entity by entity.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        self.combine(other, |left, right| left.union(right).cloned().collect())
    }

    /// Set difference, entity by entity.
    #[must_use]
    pub fn difference(&self, other: &Self) -> Self {
        self.combine(other, |left, right| left.difference(right).cloned().collect())
    }

    fn combine<F>(&self, other: &Self, op: F) -> Self
    where
        F: Fn(&IdSet, &IdSet) -> IdSet,
    {
        let mut combined = Self::default();

        for entity in CatalogueEntity::ALL {
            *combined.ids_mut(entity) = op(self.ids(entity), other.ids(entity));
        }

        combined
    }

    /// What changed between `previous` and `current`.
    #[must_use]
    pub fn diff(previous: &Self, current: &Self) -> CatalogueDiff {
        CatalogueDiff {
            added: current.difference(previous),
            removed: previous.difference(current),
        }
    }
}

/// Change between two catalogue snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CatalogueDiff {
    /// Ids present only in the current snapshot.
    pub added: CatalogueInfo,

    /// Ids present only in the previous snapshot.
    pub removed: CatalogueInfo,
}

impl CatalogueDiff {
    /// Whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Every id touched by the change.
    #[must_use]
    pub fn touched(&self) -> CatalogueInfo {
        self.added.union(&self.removed)
    }
}

/// Build an `OR` predicate with one filter per non-empty id set.
///
/// Filters appear in collection, category, product, variant order. When every
/// set is empty the result is `{}`, meaning "no catalogue predicate".
pub fn build_predicate_from_catalogue<C, K, P, V>(
    collections: C,
    categories: K,
    products: P,
    variants: V,
) -> Value
where
    C: IntoIterator,
    C::Item: Into<String>,
    K: IntoIterator,
    K::Item: Into<String>,
    P: IntoIterator,
    P::Item: Into<String>,
    V: IntoIterator,
    V::Item: Into<String>,
{
    let catalogue = CatalogueInfo {
        products: products.into_iter().map(Into::into).collect(),
        categories: categories.into_iter().map(Into::into).collect(),
        collections: collections.into_iter().map(Into::into).collect(),
        variants: variants.into_iter().map(Into::into).collect(),
    };

    catalogue_predicate(&catalogue).to_value()
}

/// Typed form of [`build_predicate_from_catalogue`].
#[must_use]
pub fn catalogue_predicate(catalogue: &CatalogueInfo) -> CataloguePredicate {
    let filters: Vec<_> = CatalogueEntity::ALL
        .into_iter()
        .filter(|entity| !catalogue.ids(*entity).is_empty())
        .map(|entity| CataloguePredicate::filter(entity, catalogue.ids(entity).iter().cloned()))
        .collect();

    if filters.is_empty() {
        CataloguePredicate::empty()
    } else {
        CataloguePredicate::Or(filters)
    }
}

/// Collect every id mentioned anywhere in a stored predicate.
///
/// Walks the raw JSON depth first. Unknown keys, non-string ids and
/// malformed filters are skipped rather than rejected.
#[must_use]
pub fn extract_catalogue_from_predicate(predicate: &Value) -> CatalogueInfo {
    let mut catalogue = CatalogueInfo::default();

    collect_catalogue(predicate, &mut catalogue);

    catalogue
}

fn collect_catalogue(node: &Value, catalogue: &mut CatalogueInfo) {
    match node {
        Value::Array(items) => {
            for item in items {
                collect_catalogue(item, catalogue);
            }
        }
        Value::Object(map) => {
            for (key, value) in map {
                if let Some(entity) = CatalogueEntity::from_field(key) {
                    collect_ids(value, catalogue.ids_mut(entity));
                } else if key == AND || key == OR {
                    collect_catalogue(value, catalogue);
                }
            }
        }
        _ => {}
    }
}

fn collect_ids(filter: &Value, ids: &mut IdSet) {
    if let Some(Value::Array(values)) = filter.get(IDS) {
        ids.extend(values.iter().filter_map(Value::as_str).map(str::to_string));
    }
}

/// Strict catalogue view of a predicate written by [`build_predicate_from_catalogue`].
///
/// # Errors
///
/// Returns [`PredicateError::NotCatalogueShaped`] for anything other than the
/// empty predicate, a single-entity filter, or an `OR` of single-entity
/// filters, and conversion errors for malformed JSON.
pub fn catalogue_from_predicate(predicate: &Value) -> Result<CatalogueInfo, PredicateError> {
    let typed = CataloguePredicate::try_from(predicate)?;
    let mut catalogue = CatalogueInfo::default();

    let leaves = match &typed {
        CataloguePredicate::Or(children) => children.as_slice(),
        CataloguePredicate::Filters(_) => std::slice::from_ref(&typed),
        CataloguePredicate::And(_) => return Err(PredicateError::NotCatalogueShaped),
    };

    for leaf in leaves {
        let CataloguePredicate::Filters(filters) = leaf else {
            return Err(PredicateError::NotCatalogueShaped);
        };

        if filters.len() > 1 {
            return Err(PredicateError::NotCatalogueShaped);
        }

        for filter in filters {
            catalogue
                .ids_mut(filter.entity)
                .extend(filter.ids.iter().cloned());
        }
    }

    Ok(catalogue)
}

/// Union `added` into a catalogue predicate.
///
/// Ids land in the matching entity filter instead of a new sibling, so
/// applying the same delta twice is a no-op.
///
/// # Errors
///
/// Fails when `existing` is not catalogue-shaped; see [`catalogue_from_predicate`].
pub fn merge_predicates(existing: &Value, added: &CatalogueInfo) -> Result<Value, PredicateError> {
    let current = catalogue_from_predicate(existing)?;

    Ok(catalogue_predicate(&current.union(added)).to_value())
}

/// Remove `removed` from a catalogue predicate.
///
/// Filters left without ids disappear; removing everything yields `{}`.
///
/// # Errors
///
/// Fails when `existing` is not catalogue-shaped; see [`catalogue_from_predicate`].
pub fn subtract_from_predicate(
    existing: &Value,
    removed: &CatalogueInfo,
) -> Result<Value, PredicateError> {
    let current = catalogue_from_predicate(existing)?;

    Ok(catalogue_predicate(&current.difference(removed)).to_value())
}

/// Empty JSON object, the stored form of "no predicate".
#[must_use]
pub fn empty_predicate() -> Value {
    Value::Object(Map::new())
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use testresult::TestResult;

    use super::*;

    fn set(values: &[&str]) -> IdSet {
        values.iter().map(ToString::to_string).collect()
    }

    fn info(
        products: &[&str],
        categories: &[&str],
        collections: &[&str],
        variants: &[&str],
    ) -> CatalogueInfo {
        CatalogueInfo {
            products: set(products),
            categories: set(categories),
            collections: set(collections),
            variants: set(variants),
        }
    }

    #[test]
    fn builds_or_of_non_empty_leaves() {
        let predicate =
            build_predicate_from_catalogue(["L1"], Vec::<String>::new(), ["P2", "P1"], ["V1"]);

        assert_eq!(
            predicate,
            json!({
                "OR": [
                    {"collectionPredicate": {"ids": ["L1"]}},
                    {"productPredicate": {"ids": ["P1", "P2"]}},
                    {"variantPredicate": {"ids": ["V1"]}}
                ]
            })
        );
    }

    #[test]
    fn empty_catalogue_builds_empty_predicate() {
        let none: [&str; 0] = [];

        assert_eq!(build_predicate_from_catalogue(none, none, none, none), json!({}));
    }

    #[test]
    fn build_then_extract_round_trips() {
        let cases = [
            info(&["P1", "P2"], &["C1"], &["L1"], &["V1"]),
            info(&[], &["C1", "C2"], &[], &[]),
            info(&["P1"], &[], &[], &["V1", "V2", "V3"]),
            CatalogueInfo::default(),
        ];

        for catalogue in cases {
            let predicate = build_predicate_from_catalogue(
                catalogue.collections.clone(),
                catalogue.categories.clone(),
                catalogue.products.clone(),
                catalogue.variants.clone(),
            );

            assert_eq!(extract_catalogue_from_predicate(&predicate), catalogue);
        }
    }

    #[test]
    fn extraction_over_approximates_nested_operators() {
        let predicate = json!({
            "AND": [
                {"productPredicate": {"ids": ["apples"]}},
                {"OR": [
                    {"productPredicate": {"ids": ["oranges"]}},
                    {"categoryPredicate": {"ids": ["fruit"]}, "unknownPredicate": {"ids": ["x"]}}
                ]}
            ]
        });

        assert_eq!(
            extract_catalogue_from_predicate(&predicate),
            info(&["apples", "oranges"], &["fruit"], &[], &[])
        );
    }

    #[test]
    fn extraction_skips_malformed_leaves() {
        let predicate = json!({
            "OR": [
                {"productPredicate": {"ids": ["P1", 7, null]}},
                {"variantPredicate": "V1"},
                {"collectionPredicate": {}}
            ]
        });

        assert_eq!(
            extract_catalogue_from_predicate(&predicate),
            info(&["P1"], &[], &[], &[])
        );
    }

    #[test]
    fn merge_unions_into_existing_leaves() -> TestResult {
        let existing = json!({"OR": [{"productPredicate": {"ids": ["P1"]}}]});
        let added = info(&["P2"], &["C1"], &[], &[]);

        let merged = merge_predicates(&existing, &added)?;

        assert_eq!(
            merged,
            json!({
                "OR": [
                    {"categoryPredicate": {"ids": ["C1"]}},
                    {"productPredicate": {"ids": ["P1", "P2"]}}
                ]
            })
        );

        Ok(())
    }

    #[test]
    fn merging_twice_is_a_no_op() -> TestResult {
        let existing = json!({
            "OR": [
                {"collectionPredicate": {"ids": ["L1"]}},
                {"variantPredicate": {"ids": ["V1"]}}
            ]
        });

        let added = info(&["P1"], &[], &["L1", "L2"], &["V2"]);

        let once = merge_predicates(&existing, &added)?;
        let twice = merge_predicates(&once, &added)?;

        assert_eq!(once, twice);

        Ok(())
    }

    #[test]
    fn merge_into_empty_predicate_builds_new_one() -> TestResult {
        let merged = merge_predicates(&json!({}), &info(&[], &[], &[], &["V1"]))?;

        assert_eq!(merged, json!({"OR": [{"variantPredicate": {"ids": ["V1"]}}]}));

        Ok(())
    }

    #[test]
    fn merge_rejects_non_catalogue_predicates() {
        let existing = json!({
            "AND": [
                {"productPredicate": {"ids": ["P1"]}},
                {"categoryPredicate": {"ids": ["C1"]}}
            ]
        });

        assert_eq!(
            merge_predicates(&existing, &CatalogueInfo::default()),
            Err(PredicateError::NotCatalogueShaped)
        );

        let implicit_and = json!({
            "OR": [{"productPredicate": {"ids": ["P1"]}, "categoryPredicate": {"ids": ["C1"]}}]
        });

        assert_eq!(
            merge_predicates(&implicit_and, &CatalogueInfo::default()),
            Err(PredicateError::NotCatalogueShaped)
        );
    }

    #[test]
    fn subtract_drops_emptied_leaves() -> TestResult {
        let existing = json!({
            "OR": [
                {"categoryPredicate": {"ids": ["C1"]}},
                {"productPredicate": {"ids": ["P1", "P2"]}}
            ]
        });

        let removed = subtract_from_predicate(&existing, &info(&["P1"], &["C1"], &[], &[]))?;

        assert_eq!(removed, json!({"OR": [{"productPredicate": {"ids": ["P2"]}}]}));

        let everything = subtract_from_predicate(&removed, &info(&["P2"], &[], &[], &[]))?;

        assert_eq!(everything, json!({}));

        Ok(())
    }

    #[test]
    fn diff_reports_added_and_removed() {
        let previous = info(&["P1", "P2"], &["C1"], &[], &[]);
        let current = info(&["P2", "P3"], &["C1"], &["L1"], &[]);

        let diff = CatalogueInfo::diff(&previous, &current);

        assert_eq!(diff.added, info(&["P3"], &[], &["L1"], &[]));
        assert_eq!(diff.removed, info(&["P1"], &[], &[], &[]));
        assert_eq!(diff.touched(), info(&["P1", "P3"], &[], &["L1"], &[]));
        assert!(CatalogueInfo::diff(&current, &current).is_empty());
    }
}
