//! Turning raw key/value pairs into filters.

use std::marker::PhantomData;

use sea_orm::{EntityTrait, RelationDef};

use super::{
    DefaultFilter, Filter, KeywordFilter, ManyToManyKeyValueJoinFilter, Operator,
    OneToManyKeyValueJoinFilter, OrFilter,
    key::{OR_SEPARATOR, segments},
};
use crate::{errors::FilterError, resource::Resource};

/// Picks the key/value filter shape from the key itself.
///
/// A side table reached over `to_intermediate` can be read two ways:
///
/// - `rel__name` or `rel__name__operator`: the intermediate table holds the
///   value, so this is a [`OneToManyKeyValueJoinFilter`] over `I`;
/// - `rel__name__column[__operator]`: the intermediate row links to a
///   secondary table, so this is a [`ManyToManyKeyValueJoinFilter`] over
///   `I` and `S`.
pub struct KeyValueJoinFactory<E, I, S> {
    key: String,
    value: String,
    to_intermediate: RelationDef,
    to_secondary: Option<RelationDef>,
    key_field: String,
    value_field: String,
    _entities: PhantomData<fn() -> (E, I, S)>,
}

impl<E, I, S> KeyValueJoinFactory<E, I, S>
where
    E: EntityTrait,
    I: EntityTrait,
    S: EntityTrait,
{
    pub fn new(
        key: impl Into<String>,
        value: impl Into<String>,
        to_intermediate: RelationDef,
        key_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            to_intermediate,
            to_secondary: None,
            key_field: key_field.into(),
            value_field: value_field.into(),
            _entities: PhantomData,
        }
    }

    /// Relation from the intermediate table to the secondary one, needed for
    /// the two-hop shape.
    #[must_use]
    pub fn with_secondary(mut self, to_secondary: RelationDef) -> Self {
        self.to_secondary = Some(to_secondary);
        self
    }

    fn is_single_hop(&self) -> bool {
        match segments(&self.key).as_slice() {
            [_, _] => true,
            [_, _, token] => Operator::parse(token).is_some(),
            _ => false,
        }
    }

    /// # Errors
    ///
    /// Returns [`FilterError::Incomplete`] when the key needs two hops and no
    /// secondary relation was given.
    pub fn build(self) -> Result<Box<dyn Filter<E>>, FilterError> {
        if self.is_single_hop() {
            return Ok(Box::new(OneToManyKeyValueJoinFilter::<E, I>::new(
                self.key,
                self.value,
                self.to_intermediate,
                self.key_field,
                self.value_field,
            )));
        }
        let Some(to_secondary) = self.to_secondary else {
            return Err(FilterError::Incomplete {
                key: self.key,
                missing: "secondary relation",
            });
        };
        Ok(Box::new(ManyToManyKeyValueJoinFilter::<E, I, S>::new(
            self.key,
            self.value,
            self.to_intermediate,
            to_secondary,
            self.key_field,
        )))
    }
}

type BuildFilter<E> =
    Box<dyn Fn(&str, &str) -> Result<Box<dyn Filter<E>>, FilterError> + Send + Sync>;

/// The filters a resource accepts from a query string.
///
/// Keys whose first segment is a registered relation prefix go to that
/// relation's builder; everything else is a column of the base table.
///
/// ```rust,ignore
/// let filters = FilterSet::<post::Entity>::new()
///     .relation("owner", |key, value| {
///         Ok(Box::new(OneToOneJoinFilter::<post::Entity, author::Entity>::new(
///             key, value, post::Relation::Owner.def(),
///         )))
///     })
///     .from_pairs(params);
/// ```
pub struct FilterSet<E> {
    keyword_param: String,
    relations: Vec<(String, BuildFilter<E>)>,
}

impl<E: Resource> Default for FilterSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Resource> FilterSet<E> {
    /// Parameter carrying free-text search unless changed.
    pub const DEFAULT_KEYWORD_PARAM: &'static str = "q";

    #[must_use]
    pub fn new() -> Self {
        Self {
            keyword_param: Self::DEFAULT_KEYWORD_PARAM.to_owned(),
            relations: Vec::new(),
        }
    }

    #[must_use]
    pub fn keyword_param(mut self, name: impl Into<String>) -> Self {
        self.keyword_param = name.into();
        self
    }

    /// Route keys starting with `prefix__` (or equal to `prefix`) to `build`.
    #[must_use]
    pub fn relation<F>(mut self, prefix: impl Into<String>, build: F) -> Self
    where
        F: Fn(&str, &str) -> Result<Box<dyn Filter<E>>, FilterError> + Send + Sync + 'static,
    {
        self.relations.push((prefix.into(), Box::new(build)));
        self
    }

    /// Whether `prefix` has a registered builder.
    #[must_use]
    pub fn has_relation(&self, prefix: &str) -> bool {
        self.relations.iter().any(|(p, _)| p == prefix)
    }

    /// Build the filter for one pair.
    ///
    /// # Errors
    ///
    /// Propagates the error of a relation builder.
    pub fn build(&self, key: &str, value: &str) -> Result<Box<dyn Filter<E>>, FilterError> {
        if key == self.keyword_param {
            return Ok(Box::new(KeywordFilter::<E>::new(key, value)));
        }

        let head = segments(key).first().copied().unwrap_or_default();
        if let Some((_, build)) = self.relations.iter().find(|(prefix, _)| prefix == head) {
            return build(key, value);
        }
        if head.contains(OR_SEPARATOR) {
            return Ok(Box::new(OrFilter::<E>::new(key, value)));
        }
        Ok(Box::new(DefaultFilter::<E>::new(key, value)))
    }

    /// Build every pair, skipping (and logging) those that fail.
    pub fn from_pairs<'a, I>(&self, pairs: I) -> Vec<Box<dyn Filter<E>>>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        pairs
            .into_iter()
            .filter_map(|(key, value)| match self.build(key, value) {
                Ok(filter) => Some(filter),
                Err(err) => {
                    tracing::debug!(%key, error = %err, "skipping filter");
                    None
                }
            })
            .collect()
    }
}
