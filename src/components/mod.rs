pub mod chat;
pub mod conversationlist;
pub mod dark_mode_toggle;
pub mod markdown;
pub mod messagelist;
pub mod toast;
