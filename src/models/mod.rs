pub mod booking;
pub mod context;
pub mod conversation;
pub mod intent;
pub mod lead;

pub use booking::BookingResult;
pub use context::TenantContext;
pub use conversation::{ChatMessage, ConversationState};
pub use intent::{Intent, UnsupportedIntent};
pub use lead::{LeadCaptureResult, LeadData, LeadRecord};
