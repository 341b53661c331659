use crate::models::Message;

/// A message counts as unread for `viewer` when the viewer received it,
/// has not read it and has not deleted it.
pub fn is_unread_for(message: &Message, viewer: i64) -> bool {
    message.recipient_id == viewer && !message.is_read && !message.recipient_deleted
}

pub fn count_unread<'a>(messages: impl IntoIterator<Item = &'a Message>, viewer: i64) -> i64 {
    messages
        .into_iter()
        .filter(|m| is_unread_for(m, viewer))
        .count() as i64
}
