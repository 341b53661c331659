pub mod clock;
pub mod conversations;
pub mod messaging;
pub mod notification;
pub mod recall;
pub mod thread_id;
pub mod unread;

pub use clock::{Clock, ManualClock, SystemClock};
pub use messaging::{MessagingService, Outcome};
pub use notification::{
    LoggingNotifier, NewMessageNotification, NotificationError, NotificationHook,
    WebhookNotifier,
};
