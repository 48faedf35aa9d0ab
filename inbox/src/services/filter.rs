//! View filtering over the working collection.

use crate::types::{Message, View};

/// Messages visible in `view`, in collection order
pub fn filter_view(messages: &[Message], view: View) -> Vec<&Message> {
    messages.iter().filter(|m| view.matches(m)).collect()
}

/// Unread messages visible in `view`
pub fn unread_count(messages: &[Message], view: View) -> usize {
    messages
        .iter()
        .filter(|m| view.matches(m) && !m.is_read)
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessageId;
    use chrono::{Duration, TimeZone, Utc};
    use std::collections::BTreeSet;

    fn collection() -> Vec<Message> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (1..=16)
            .map(|id| {
                let mut m = Message::new(id, "n", "n@x.y", "s", "m", start + Duration::hours(id));
                let bits = id % 8;
                m.is_archived = bits & 1 != 0;
                m.is_deleted = bits & 2 != 0;
                m.is_forever_deleted = bits & 4 != 0;
                m.is_read = id % 3 == 0;
                m
            })
            .collect()
    }

    fn ids(messages: &[&Message]) -> BTreeSet<MessageId> {
        messages.iter().map(|m| m.id).collect()
    }

    #[test]
    fn test_views_partition_live_messages() {
        let messages = collection();
        let regular = ids(&filter_view(&messages, View::Regular));
        let archived = ids(&filter_view(&messages, View::Archived));
        let deleted = ids(&filter_view(&messages, View::Deleted));

        assert!(regular.is_disjoint(&archived));
        assert!(regular.is_disjoint(&deleted));
        assert!(archived.is_disjoint(&deleted));

        let union: BTreeSet<MessageId> = regular.union(&archived).chain(deleted.iter()).copied().collect();
        let live: BTreeSet<MessageId> = messages.iter().filter(|m| m.is_live()).map(|m| m.id).collect();
        assert_eq!(union, live);
    }

    #[test]
    fn test_filter_keeps_collection_order() {
        let messages = collection();
        let regular: Vec<MessageId> = filter_view(&messages, View::Regular).iter().map(|m| m.id).collect();
        assert_eq!(regular, vec![8, 16]);
    }

    #[test]
    fn test_unread_count_only_counts_view() {
        let messages = collection();
        // deleted view: ids with bit 2 set and bit 4 clear -> 2, 3, 10, 11
        assert_eq!(unread_count(&messages, View::Deleted), 3);
    }
}
