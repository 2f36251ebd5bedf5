pub mod request;
pub mod settings;
pub mod unlockers;
