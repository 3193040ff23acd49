//! Command handlers for CLI subcommands
//!
//! One submodule per subcommand; `main` dispatches on the parsed command.

mod call;
mod completions;
mod config;
mod methods;

pub use call::handle_call;
pub use completions::handle_completions;
pub use config::handle_config;
pub use methods::handle_methods;
