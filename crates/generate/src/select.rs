use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use rtg_constraint::{InvalidConstraint, InvalidKind, Scope};
use rtg_core::{Catalog, Category, InstructionSpec};
use serde::Deserialize;
use thiserror::Error;

/// Relative weight of each selection category. Defaults to `1.0` everywhere.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CategoryWeights {
    pub r: f64,
    pub i: f64,
    pub s: f64,
    pub b: f64,
    pub u: f64,
    pub j: f64,
    pub special: f64,
}

impl Default for CategoryWeights {
    fn default() -> Self {
        Self::uniform()
    }
}

impl CategoryWeights {
    #[must_use]
    pub const fn uniform() -> Self {
        Self { r: 1.0, i: 1.0, s: 1.0, b: 1.0, u: 1.0, j: 1.0, special: 1.0 }
    }

    /// Every category at `0.0` except `category`.
    #[must_use]
    pub fn only(category: Category) -> Self {
        let mut weights = Self { r: 0.0, i: 0.0, s: 0.0, b: 0.0, u: 0.0, j: 0.0, special: 0.0 };
        weights.set(category, 1.0);
        weights
    }

    #[must_use]
    pub const fn get(&self, category: Category) -> f64 {
        match category {
            Category::R => self.r,
            Category::I => self.i,
            Category::S => self.s,
            Category::B => self.b,
            Category::U => self.u,
            Category::J => self.j,
            Category::Special => self.special,
        }
    }

    pub fn set(&mut self, category: Category, weight: f64) {
        let slot = match category {
            Category::R => &mut self.r,
            Category::I => &mut self.i,
            Category::S => &mut self.s,
            Category::B => &mut self.b,
            Category::U => &mut self.u,
            Category::J => &mut self.j,
            Category::Special => &mut self.special,
        };

        *slot = weight;
    }

    pub fn validate(&self) -> Result<(), InvalidConstraint> {
        match Category::ALL.into_iter().map(|it| self.get(it)).find(|it| !(it.is_finite() && *it >= 0.0)) {
            Some(weight) => Err(InvalidConstraint::new(
                Scope::CategoryWeights,
                InvalidKind::InvalidWeight(weight),
            )),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("no instruction is eligible for selection")]
pub struct NoSelectableInstruction;

/// Two stage weighted choice over a catalog: first a category, then an entry within it.
pub struct Selector<'c> {
    buckets: [Vec<(&'c InstructionSpec, f64)>; Category::COUNT],
}

impl<'c> Selector<'c> {
    /// `weight_of` gives each entry's weight within its category.
    pub fn new(catalog: &'c Catalog, mut weight_of: impl FnMut(&InstructionSpec) -> f64) -> Self {
        let mut buckets: [Vec<_>; Category::COUNT] = Default::default();

        for spec in catalog {
            buckets[spec.category().index()].push((spec, weight_of(spec)));
        }

        Self { buckets }
    }

    pub fn uniform(catalog: &'c Catalog) -> Self {
        Self::new(catalog, |_| 1.0)
    }

    fn eligible<'a, F>(
        &'a self,
        category: Category,
        filter: &'a F,
    ) -> impl Iterator<Item = (&'c InstructionSpec, f64)> + 'a
    where
        F: Fn(&InstructionSpec) -> bool,
    {
        self.buckets[category.index()]
            .iter()
            .copied()
            .filter(move |&(spec, weight)| weight > 0.0 && filter(spec))
    }

    /// Picks an entry passing `filter`.
    ///
    /// With a `restriction` only that category is considered and its weight is ignored.
    /// Categories and entries of weight `0.0` are never chosen.
    pub fn select<R, F>(
        &self,
        rng: &mut R,
        weights: &CategoryWeights,
        restriction: Option<Category>,
        filter: F,
    ) -> Result<&'c InstructionSpec, NoSelectableInstruction>
    where
        R: Rng,
        F: Fn(&InstructionSpec) -> bool,
    {
        let categories: Vec<(Category, f64)> = match restriction {
            Some(category) => vec![(category, 1.0)],
            None => Category::ALL.into_iter().map(|it| (it, weights.get(it))).collect(),
        };

        let categories: Vec<_> = categories
            .into_iter()
            .filter(|&(category, weight)| {
                weight > 0.0 && self.eligible(category, &filter).next().is_some()
            })
            .collect();

        if categories.is_empty() {
            return Err(NoSelectableInstruction);
        }

        let index = WeightedIndex::new(categories.iter().map(|&(_, weight)| weight))
            .map_err(|_| NoSelectableInstruction)?;
        let category = categories[index.sample(rng)].0;

        let entries: Vec<_> = self.eligible(category, &filter).collect();
        let index = WeightedIndex::new(entries.iter().map(|&(_, weight)| weight))
            .map_err(|_| NoSelectableInstruction)?;

        Ok(entries[index.sample(rng)].0)
    }
}
