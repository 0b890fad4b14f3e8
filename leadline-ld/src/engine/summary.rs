//! Grouped distribution summaries
//!
//! Two distinct views share one shape: the batch summary is built from the
//! partition output of the upload that just completed, while the history
//! summary regroups everything persisted for an owner. They are separate
//! operations on purpose; merging them made every upload's response absorb
//! the owner's earlier batches.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use leadline_common::db::AssignedItem;

use super::{AgentShare, ContactRecord};

/// Per-agent grouped view of a distribution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DistributionSummary {
    pub agent_id: String,
    pub agent_name: String,
    pub agent_email: String,
    pub count: usize,
    pub items: Vec<ContactRecord>,
}

/// Summary of the batch that just completed, in roster order.
///
/// Agents that received nothing are omitted from the presentation view.
pub fn summarize_batch(shares: &[AgentShare]) -> Vec<DistributionSummary> {
    shares
        .iter()
        .filter(|share| !share.items.is_empty())
        .map(|share| DistributionSummary {
            agent_id: share.agent.id.to_string(),
            agent_name: share.agent.name.clone(),
            agent_email: share.agent.email.clone(),
            count: share.items.len(),
            items: share.items.clone(),
        })
        .collect()
}

/// Lifetime summary for an owner, grouped by agent.
///
/// `items` must already be in insertion order; groups appear in
/// first-assignment order, which keeps repeated calls stable while the
/// underlying data is unchanged.
pub fn summarize_history(items: &[AssignedItem]) -> Vec<DistributionSummary> {
    let mut summaries: Vec<DistributionSummary> = Vec::new();
    let mut index_by_agent: HashMap<&str, usize> = HashMap::new();

    for item in items {
        let record = ContactRecord {
            first_name: item.first_name.clone(),
            phone: item.phone.clone(),
            notes: item.notes.clone(),
        };

        match index_by_agent.get(item.agent_id.as_str()) {
            Some(&i) => {
                summaries[i].count += 1;
                summaries[i].items.push(record);
            }
            None => {
                index_by_agent.insert(item.agent_id.as_str(), summaries.len());
                summaries.push(DistributionSummary {
                    agent_id: item.agent_id.clone(),
                    agent_name: item.agent_name.clone(),
                    agent_email: item.agent_email.clone(),
                    count: 1,
                    items: vec![record],
                });
            }
        }
    }

    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AgentRef;
    use chrono::Utc;
    use uuid::Uuid;

    fn share(name: &str, count: usize) -> AgentShare {
        AgentShare {
            agent: AgentRef {
                id: Uuid::new_v4(),
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            },
            items: (0..count)
                .map(|i| ContactRecord {
                    first_name: format!("{}-{}", name, i),
                    phone: format!("555-{:04}", i),
                    notes: String::new(),
                })
                .collect(),
        }
    }

    fn assigned(agent_id: &str, agent_name: &str, first_name: &str) -> AssignedItem {
        AssignedItem {
            guid: Uuid::new_v4().to_string(),
            owner_id: "owner-1".to_string(),
            agent_id: agent_id.to_string(),
            agent_name: agent_name.to_string(),
            agent_email: format!("{}@example.com", agent_name.to_lowercase()),
            batch_id: Uuid::new_v4().to_string(),
            position: 0,
            first_name: first_name.to_string(),
            phone: "555-0000".to_string(),
            notes: String::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn batch_summary_counts_match_and_zero_share_agents_are_omitted() {
        let shares = vec![share("A", 4), share("B", 3), share("C", 0)];
        let summaries = summarize_batch(&shares);

        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].agent_name, "A");
        assert_eq!(summaries[0].count, 4);
        assert_eq!(summaries[1].count, 3);

        let total: usize = summaries.iter().map(|s| s.count).sum();
        let fed: usize = shares.iter().map(|s| s.items.len()).sum();
        assert_eq!(total, fed);
    }

    #[test]
    fn history_summary_groups_by_agent_in_first_appearance_order() {
        let items = vec![
            assigned("a-1", "Asha", "One"),
            assigned("a-1", "Asha", "Two"),
            assigned("a-2", "Ben", "Three"),
            assigned("a-1", "Asha", "Four"),
        ];

        let summaries = summarize_history(&items);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].agent_name, "Asha");
        assert_eq!(summaries[0].count, 3);
        assert_eq!(summaries[1].agent_name, "Ben");
        assert_eq!(summaries[1].count, 1);

        let names: Vec<&str> = summaries[0]
            .items
            .iter()
            .map(|r| r.first_name.as_str())
            .collect();
        assert_eq!(names, vec!["One", "Two", "Four"]);
    }

    #[test]
    fn history_summary_is_stable_across_calls() {
        let items = vec![
            assigned("a-2", "Ben", "One"),
            assigned("a-1", "Asha", "Two"),
        ];

        let first = summarize_history(&items);
        let second = summarize_history(&items);
        let order_a: Vec<&str> = first.iter().map(|s| s.agent_id.as_str()).collect();
        let order_b: Vec<&str> = second.iter().map(|s| s.agent_id.as_str()).collect();
        assert_eq!(order_a, order_b);
    }

    #[test]
    fn empty_input_gives_empty_summary() {
        assert!(summarize_history(&[]).is_empty());
        assert!(summarize_batch(&[]).is_empty());
    }
}
