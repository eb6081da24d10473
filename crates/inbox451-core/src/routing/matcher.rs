//! Rule matching.
//!
//! The rule set is treated as a routing table: an ordered list of exact-match
//! predicates, evaluated front to back. The first hit wins.

use crate::ingest::Envelope;
use crate::rule::ForwardRule;

/// Returns true if `rule` matches sender, receiver and subject exactly.
#[must_use]
pub fn rule_matches(rule: &ForwardRule, envelope: &Envelope) -> bool {
    rule.sender == envelope.sender
        && rule.receiver == envelope.receiver
        && rule.subject == envelope.subject
}

/// First rule in `rules` that matches `envelope`.
#[must_use]
pub fn find_matching_rule<'a>(
    rules: &'a [ForwardRule],
    envelope: &Envelope,
) -> Option<&'a ForwardRule> {
    rules.iter().find(|rule| rule_matches(rule, envelope))
}

/// A snapshot of the rule set in evaluation order.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    rules: Vec<ForwardRule>,
}

impl RoutingTable {
    /// Build a table from rules already in evaluation order.
    #[must_use]
    pub const fn new(rules: Vec<ForwardRule>) -> Self {
        Self { rules }
    }

    /// The rule that routes `envelope`, if any.
    #[must_use]
    pub fn route(&self, envelope: &Envelope) -> Option<&ForwardRule> {
        find_matching_rule(&self.rules, envelope)
    }

    /// Number of rules in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Returns true if the table has no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::id::{InboxId, RuleId};

    fn rule(id: i64, sender: &str, receiver: &str, subject: &str) -> ForwardRule {
        let mut rule = ForwardRule::new(InboxId::new(id * 10), sender, receiver, subject);
        rule.id = Some(RuleId::new(id));
        rule
    }

    fn envelope(sender: &str, receiver: &str, subject: &str) -> Envelope {
        Envelope::new(sender, receiver, subject, Vec::new())
    }

    #[test]
    fn test_all_three_fields_must_match() {
        let rules = [rule(1, "s@y.com", "a@x.com", "Hi")];
        assert!(find_matching_rule(&rules, &envelope("s@y.com", "a@x.com", "Hi")).is_some());
        assert!(find_matching_rule(&rules, &envelope("t@y.com", "a@x.com", "Hi")).is_none());
        assert!(find_matching_rule(&rules, &envelope("s@y.com", "b@x.com", "Hi")).is_none());
        assert!(find_matching_rule(&rules, &envelope("s@y.com", "a@x.com", "hi")).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let table = RoutingTable::new(vec![
            rule(1, "s@y.com", "a@x.com", "Other"),
            rule(2, "s@y.com", "a@x.com", "Hi"),
            rule(3, "s@y.com", "a@x.com", "Hi"),
        ]);
        let hit = table.route(&envelope("s@y.com", "a@x.com", "Hi")).unwrap();
        assert_eq!(hit.id, Some(RuleId::new(2)));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn test_empty_table() {
        let table = RoutingTable::default();
        assert!(table.is_empty());
        assert!(table.route(&envelope("s@y.com", "a@x.com", "Hi")).is_none());
    }

    fn field() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a@x.com", "b@x.com", "s@y.com"]).prop_map(String::from)
    }

    fn subject() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["", "Hi", "Re: Hi"]).prop_map(String::from)
    }

    fn rules() -> impl Strategy<Value = Vec<ForwardRule>> {
        prop::collection::vec((field(), field(), subject()), 0..12).prop_map(|triples| {
            triples
                .iter()
                .zip(1..)
                .map(|((s, r, subj), id)| rule(id, s, r, subj))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_result_is_earliest_exact_match(
            rules in rules(),
            sender in field(),
            receiver in field(),
            subj in subject(),
        ) {
            let env = envelope(&sender, &receiver, &subj);
            let expected = rules.iter().position(|r| {
                r.sender == sender && r.receiver == receiver && r.subject == subj
            });
            let actual = find_matching_rule(&rules, &env)
                .map(|hit| rules.iter().position(|r| std::ptr::eq(r, hit)).unwrap());
            prop_assert_eq!(actual, expected);
        }

        #[test]
        fn prop_non_matching_rules_do_not_interfere(
            rules in rules(),
            noise in rules(),
            sender in field(),
            receiver in field(),
            subj in subject(),
        ) {
            let env = envelope(&sender, &receiver, &subj);
            let before = find_matching_rule(&rules, &env).cloned();

            let mut mixed: Vec<ForwardRule> = Vec::new();
            let mut noise = noise.into_iter().filter(|r| !rule_matches(r, &env));
            for r in rules {
                mixed.extend(noise.next());
                mixed.push(r);
            }
            mixed.extend(noise);

            prop_assert_eq!(find_matching_rule(&mixed, &env).cloned(), before);
        }
    }
}
