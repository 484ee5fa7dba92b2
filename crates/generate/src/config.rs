use rtg_constraint::{ConstraintConfig, OffsetRange};
use rtg_core::Category;
use serde::Deserialize;

use crate::pattern::PatternKind;
use crate::select::CategoryWeights;
use crate::sequence::SequenceTemplate;

/// Where generated loads and stores may point, relative to their base register.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoadStoreConfig {
    /// Each access draws its offset from one of these windows.
    pub ranges: Vec<OffsetRange>,
    /// Whether a load/store pair may reuse an interval already touched through the same base.
    pub allow_identical: bool,
}

impl Default for LoadStoreConfig {
    fn default() -> Self {
        Self { ranges: vec![OffsetRange::FULL], allow_identical: false }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub seed: u64,
    pub weights: CategoryWeights,
    /// Limits plain random picks to a single category.
    pub restriction: Option<Category>,
    /// Longest distance, in instructions, between the two halves of a hazard.
    pub lookahead: usize,
    pub block_size: usize,
    pub load_store: LoadStoreConfig,
    /// Patterns [`PatternKind::Mixed`] chooses from.
    pub mixed: Vec<PatternKind>,
    pub loop_iterations: u16,
    pub constraints: ConstraintConfig,
    pub sequences: Vec<SequenceTemplate>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            weights: CategoryWeights::default(),
            restriction: None,
            lookahead: 8,
            block_size: 8,
            load_store: LoadStoreConfig::default(),
            mixed: vec![
                PatternKind::LoadStore,
                PatternKind::Raw,
                PatternKind::War,
                PatternKind::Waw,
            ],
            loop_iterations: 16,
            constraints: ConstraintConfig::default(),
            sequences: Vec::new(),
        }
    }
}
