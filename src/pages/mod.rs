pub mod chatroom;
