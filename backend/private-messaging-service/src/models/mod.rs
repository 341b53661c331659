pub mod attachment;
pub mod conversation;
pub mod message;
pub mod pagination;
pub mod requests;

pub use attachment::{Attachment, AttachmentKind};
pub use conversation::{Conversation, ConversationSummary};
pub use message::{Message, MessageView, NewMessage, RECALLED_PLACEHOLDER};
pub use pagination::{PageRequest, Paginated};
pub use requests::{EditMessageRequest, MessageDraft, SendMessageRequest};
