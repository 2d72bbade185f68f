pub mod chat;
pub mod recipe;
pub mod websocket;
