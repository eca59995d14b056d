pub mod chat_loop;
pub mod layout;
pub mod markup;
pub mod renderer;
pub mod theme;
