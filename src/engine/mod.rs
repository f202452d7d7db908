// Engine modules: input actions and local players

pub mod input;
pub mod players;
