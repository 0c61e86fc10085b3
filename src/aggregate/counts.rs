// Per-topic category counts.
//
// A TopicAggregate maps topic number -> (category -> count). Categories
// within a topic keep insertion order so emitted listings follow the order
// in which categories were first seen; topics are emitted in ascending
// order.

use std::collections::{BTreeMap, HashMap};

/// Category -> count, iterated in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct CategoryCounts {
    order: Vec<String>,
    counts: HashMap<String, u64>,
}

impl CategoryCounts {
    pub fn increment(&mut self, category: &str) {
        match self.counts.get_mut(category) {
            Some(count) => *count += 1,
            None => {
                self.order.push(category.to_string());
                self.counts.insert(category.to_string(), 1);
            }
        }
    }

    pub fn get(&self, category: &str) -> u64 {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.order
            .iter()
            .map(|category| (category.as_str(), self.counts[category]))
    }

    /// Sum of all category counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Topic number -> category counts.
#[derive(Debug, Default, Clone)]
pub struct TopicAggregate {
    topics: BTreeMap<i32, CategoryCounts>,
}

impl TopicAggregate {
    pub fn increment(&mut self, topic: i32, category: &str) {
        self.topics.entry(topic).or_default().increment(category);
    }

    pub fn topic(&self, topic: i32) -> Option<&CategoryCounts> {
        self.topics.get(&topic)
    }

    /// Topics in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (i32, &CategoryCounts)> + '_ {
        self.topics.iter().map(|(topic, counts)| (*topic, counts))
    }

    pub fn topic_numbers(&self) -> Vec<i32> {
        self.topics.keys().copied().collect()
    }

    /// Number of increments recorded for `topic`.
    pub fn topic_total(&self, topic: i32) -> u64 {
        self.topics.get(&topic).map_or(0, CategoryCounts::total)
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }
}
