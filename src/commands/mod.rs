pub mod completions;
pub mod login;

pub use completions::CompletionsCommand;
pub use login::LoginCommand;
