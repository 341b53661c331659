use super::unread::is_unread_for;
use crate::models::{Conversation, Message};
use std::collections::HashMap;

/// Group the viewer's visible messages into one summary per thread, newest
/// conversation first.
///
/// Messages the viewer cannot see are ignored, so callers may pass a raw
/// slice of rows.
pub fn aggregate_conversations<'a>(
    messages: impl IntoIterator<Item = &'a Message>,
    viewer: i64,
) -> Vec<Conversation> {
    let mut by_thread: HashMap<&str, Conversation> = HashMap::new();

    for m in messages.into_iter().filter(|m| m.is_visible_to(viewer)) {
        let unread = i64::from(is_unread_for(m, viewer));
        by_thread
            .entry(m.thread_id.as_str())
            .and_modify(|c| {
                c.total_count += 1;
                c.unread_count += unread;
                if (m.created_at, m.id) > (c.last_message.created_at, c.last_message.id) {
                    c.last_message = m.clone();
                }
            })
            .or_insert_with(|| Conversation {
                thread_id: m.thread_id.clone(),
                partner_id: m.partner_of(viewer),
                last_message: m.clone(),
                unread_count: unread,
                total_count: 1,
            });
    }

    let mut conversations: Vec<Conversation> = by_thread.into_values().collect();
    conversations.sort_by(|a, b| {
        (b.last_message.created_at, b.last_message.id)
            .cmp(&(a.last_message.created_at, a.last_message.id))
    });
    conversations
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::fixtures::message;
    use chrono::{Duration, Utc};

    #[test]
    fn three_messages_form_one_conversation() {
        let t0 = Utc::now();
        let msgs = vec![
            message(1, 1, 2, t0),
            message(2, 1, 2, t0 + Duration::seconds(1)),
            message(3, 1, 2, t0 + Duration::seconds(2)),
        ];

        let convs = aggregate_conversations(&msgs, 2);
        assert_eq!(convs.len(), 1);
        assert_eq!(convs[0].partner_id, 1);
        assert_eq!(convs[0].unread_count, 3);
        assert_eq!(convs[0].total_count, 3);
        assert_eq!(convs[0].last_message.id, 3);

        let sender_view = aggregate_conversations(&msgs, 1);
        assert_eq!(sender_view[0].unread_count, 0);
    }

    #[test]
    fn ordered_by_latest_visible_message() {
        let t0 = Utc::now();
        let mut hidden = message(4, 1, 3, t0 + Duration::seconds(10));
        hidden.sender_deleted = true;
        let msgs = vec![
            message(1, 1, 2, t0),
            message(2, 3, 1, t0 + Duration::seconds(1)),
            message(3, 1, 2, t0 + Duration::seconds(5)),
            hidden,
        ];

        let convs = aggregate_conversations(&msgs, 1);
        let threads: Vec<&str> = convs.iter().map(|c| c.thread_id.as_str()).collect();
        assert_eq!(threads, vec!["1-2", "1-3"]);
        assert_eq!(convs[1].last_message.id, 2);
        assert_eq!(convs[1].total_count, 1);
    }

    #[test]
    fn threads_deleted_by_viewer_disappear() {
        let mut m = message(1, 1, 2, Utc::now());
        m.recipient_deleted = true;
        assert!(aggregate_conversations(&[m.clone()], 2).is_empty());
        assert_eq!(aggregate_conversations(&[m], 1).len(), 1);
    }
}
