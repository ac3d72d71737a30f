//! Rules
//!
//! Customer and cart rules select between competing price lists. A [`RuleChain`] is the
//! ordered list of rules active for a context, most preferred first.

use std::fmt;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::prices::PriceCandidate;

/// Rule identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleId(String);

impl RuleId {
    /// Create a new rule identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Return the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RuleId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Ordered, duplicate-free list of rules, most preferred first.
///
/// The empty chain selects default prices only.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RuleChain {
    rules: SmallVec<[RuleId; 4]>,
}

impl RuleChain {
    /// The empty chain.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a chain from rules in priority order, dropping repeated rules.
    pub fn new(rules: impl IntoIterator<Item = RuleId>) -> Self {
        let mut chain = Self::empty();

        for rule in rules {
            if !chain.rules.contains(&rule) {
                chain.rules.push(rule);
            }
        }

        chain
    }

    /// Create a chain from string slices.
    pub fn from_strs(rules: &[&str]) -> Self {
        Self::new(rules.iter().copied().map(RuleId::from))
    }

    /// Iterate over the rules in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &RuleId> {
        self.rules.iter()
    }

    /// Check if the chain has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Get the number of rules in the chain.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Stable textual key, `default` for the empty chain, otherwise rule ids joined by `+`.
    pub fn key(&self) -> String {
        if self.is_empty() {
            return "default".to_string();
        }

        self.rules
            .iter()
            .map(RuleId::as_str)
            .collect::<Vec<_>>()
            .join("+")
    }
}

impl FromIterator<RuleId> for RuleChain {
    fn from_iter<I: IntoIterator<Item = RuleId>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl fmt::Display for RuleChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

/// The rule an entity resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppliedRule {
    /// A rule from the chain.
    Rule(RuleId),

    /// The default, rule-less prices.
    Default,
}

impl AppliedRule {
    /// Return the rule, or `None` for the default prices.
    pub fn rule(&self) -> Option<&RuleId> {
        match self {
            Self::Rule(rule) => Some(rule),
            Self::Default => None,
        }
    }
}

/// Candidates of one entity grouped by rule (`None` being the default prices).
pub type CandidatesByRule<'c> = FxHashMap<Option<&'c RuleId>, SmallVec<[&'c PriceCandidate; 4]>>;

/// Select the rule whose prices apply to a single entity.
///
/// The first rule of the chain with at least one candidate wins. Without a match the default
/// prices apply, and an entity without default prices contributes nothing.
pub fn select_applicable_rule(
    candidates_by_rule: &CandidatesByRule<'_>,
    rule_chain: &RuleChain,
) -> Option<AppliedRule> {
    let has_candidates = |key: Option<&RuleId>| {
        candidates_by_rule
            .get(&key)
            .is_some_and(|candidates| !candidates.is_empty())
    };

    if let Some(rule) = rule_chain.iter().find(|rule| has_candidates(Some(*rule))) {
        return Some(AppliedRule::Rule(rule.clone()));
    }

    has_candidates(None).then_some(AppliedRule::Default)
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::EUR};
    use smallvec::smallvec;

    use super::*;

    fn candidate(rule: Option<&str>, gross: i64) -> PriceCandidate {
        PriceCandidate::new(
            rule.map(RuleId::from),
            1,
            Money::from_minor(gross, EUR),
            Money::from_minor(gross, EUR),
        )
    }

    #[test]
    fn chain_drops_repeated_rules() {
        let chain = RuleChain::from_strs(&["rule-b", "rule-a", "rule-b"]);

        assert_eq!(chain.len(), 2);
        assert_eq!(chain.key(), "rule-b+rule-a");
    }

    #[test]
    fn empty_chain_key_is_default() {
        assert_eq!(RuleChain::empty().key(), "default");
    }

    #[test]
    fn first_rule_with_candidates_wins() {
        let rule_a = candidate(Some("rule-a"), 100);
        let rule_b = candidate(Some("rule-b"), 200);
        let rule_a_id = RuleId::from("rule-a");
        let rule_b_id = RuleId::from("rule-b");

        let mut groups = CandidatesByRule::default();
        groups.insert(Some(&rule_a_id), smallvec![&rule_a]);
        groups.insert(Some(&rule_b_id), smallvec![&rule_b]);

        let b_first = select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-b", "rule-a"]));
        let a_first = select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-a", "rule-b"]));

        assert_eq!(b_first, Some(AppliedRule::Rule(rule_b_id.clone())));
        assert_eq!(a_first, Some(AppliedRule::Rule(rule_a_id.clone())));
    }

    #[test]
    fn falls_back_to_default_prices() {
        let default = candidate(None, 100);

        let mut groups = CandidatesByRule::default();
        groups.insert(None, smallvec![&default]);

        let applied = select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-a"]));

        assert_eq!(applied, Some(AppliedRule::Default));
    }

    #[test]
    fn entity_without_default_prices_is_excluded() {
        let rule_a = candidate(Some("rule-a"), 100);
        let rule_a_id = RuleId::from("rule-a");

        let mut groups = CandidatesByRule::default();
        groups.insert(Some(&rule_a_id), smallvec![&rule_a]);
        groups.insert(None, SmallVec::new());

        assert_eq!(
            select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-b"])),
            None
        );
    }

    #[test]
    fn unmatched_leading_rule_equals_single_rule_chain() {
        let rule_b = candidate(Some("rule-b"), 100);
        let rule_b_id = RuleId::from("rule-b");

        let mut groups = CandidatesByRule::default();
        groups.insert(Some(&rule_b_id), smallvec![&rule_b]);

        assert_eq!(
            select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-a", "rule-b"])),
            select_applicable_rule(&groups, &RuleChain::from_strs(&["rule-b"]))
        );
    }
}
