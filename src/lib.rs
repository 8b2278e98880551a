//! nlsh - an AI-assisted interactive shell wrapper.
//!
//! Every input line is first executed as an ordinary shell command. When that
//! fails, the line is treated as a natural-language request, translated into
//! a concrete command by an external completion service, and executed only
//! after an explicit single-keystroke confirmation.
//!
//! # Architecture
//!
//! - [`platform`] - Host OS classification and shell dialect selection
//! - [`executor`] - Subprocess execution and the `cd` builtin
//! - [`translator`] - Natural-language to command translation via DeepSeek
//! - [`raw_input`] - Raw-mode single-keystroke confirmation input
//! - [`repl`] - The interactive loop tying the pieces together
//! - [`http_client`] - HTTP client abstraction
//! - [`providers`] - Shared dependency injection traits
//!
//! # Example
//!
//! ```ignore
//! use nlsh::executor::Executor;
//! use nlsh::platform::PlatformKind;
//! use nlsh::raw_input::CrosstermKeyReader;
//! use nlsh::repl::Repl;
//! use nlsh::translator::AiTranslator;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let platform = PlatformKind::detect();
//!     let mut repl = Repl::new(
//!         Executor::new(platform),
//!         AiTranslator::new(platform)?,
//!         CrosstermKeyReader,
//!     );
//!     repl.run().await
//! }
//! ```
//!
//! # Fallback model
//!
//! The executor reports plain success or failure, and any failure triggers
//! the AI fallback. A real command exiting non-zero (grep without matches,
//! a failing build) therefore also produces a suggestion. That is the
//! intended interaction model, not an oversight.

pub mod executor;
pub mod http_client;
pub mod platform;
pub mod providers;
pub mod raw_input;
pub mod repl;
pub mod translator;
