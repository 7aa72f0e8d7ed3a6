//! Per-run build context.
//!
//! Tree construction used to be a natural place for global state (per-type
//! ordinal counters, the worklist of units to build). Both live here
//! instead, owned by one run and threaded through construction by
//! reference, so runs are isolated and tests never share counters.

use std::collections::HashMap;

use crate::config::Config;
use crate::recipe::RecipeRegistry;
use crate::tree::NodeId;

pub struct BuildContext<'a> {
    pub config: &'a Config,
    pub registry: &'a RecipeRegistry,
    counters: HashMap<String, u32>,
    worklist: Vec<NodeId>,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a Config, registry: &'a RecipeRegistry) -> Self {
        BuildContext {
            config,
            registry,
            counters: HashMap::new(),
            worklist: Vec::new(),
        }
    }

    /// Next ordinal for a unit type (1-based). Counts every unit of the
    /// type created during this run, named or not.
    pub fn next_ordinal(&mut self, unit_type: &str) -> u32 {
        let counter = self.counters.entry(unit_type.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Register a unit for building, in construction order.
    pub fn register(&mut self, id: NodeId) {
        self.worklist.push(id);
    }

    pub fn worklist(&self) -> &[NodeId] {
        &self.worklist
    }

    pub fn into_worklist(self) -> Vec<NodeId> {
        self.worklist
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinals_count_per_type() {
        let config = Config::default();
        let registry = RecipeRegistry::new();
        let mut ctx = BuildContext::new(&config, &registry);
        assert_eq!(ctx.next_ordinal("TP"), 1);
        assert_eq!(ctx.next_ordinal("TP"), 2);
        assert_eq!(ctx.next_ordinal("CM"), 1);
    }
}
