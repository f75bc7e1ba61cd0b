pub mod conversations;
pub mod webhook;
