//! The command table.
//!
//! Maps every [`CommandId`] to its argument parser and handler. The table is
//! an array indexed by the enum, so a missing entry is unrepresentable and
//! a lookup can never go out of range; unknown raw ids are rejected while
//! converting to [`CommandId`].

use std::panic::{catch_unwind, AssertUnwindSafe};

use cbridge_core::{args, Arguments, Backend, BackendResult, CommandId, Error, Reply, Result, Term};
use tracing::error;

use crate::handlers;

/// Argument parser: raw terms to a typed argument object.
pub type ArgParser = fn(&[Term]) -> Result<Arguments>;

/// Handler: run one command against a backend instance.
pub type Handler<B> = fn(Arguments, &mut B) -> BackendResult<Term>;

/// A (parser, handler) pair.
pub struct CommandEntry<B> {
    /// Validates and parses raw arguments
    pub parse: ArgParser,
    /// Executes the parsed command
    pub handler: Handler<B>,
}

// Manual impls: derive would require `B: Clone`.
impl<B> Clone for CommandEntry<B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for CommandEntry<B> {}

impl<B: Backend> CommandEntry<B> {
    /// Pair a parser with a handler.
    pub fn new(parse: ArgParser, handler: Handler<B>) -> Self {
        Self { parse, handler }
    }

    /// The built-in entry for `command`.
    pub fn standard(command: CommandId) -> Self {
        match command {
            CommandId::Connect => Self::new(args::parse_connect, handlers::session::connect::<B>),
            CommandId::Store => Self::new(args::parse_store, handlers::kv::store::<B>),
            CommandId::MultiGet => Self::new(args::parse_mget, handlers::kv::multi_get::<B>),
            CommandId::Unlock => Self::new(args::parse_unlock, handlers::kv::unlock::<B>),
            CommandId::Touch => Self::new(args::parse_mtouch, handlers::kv::touch::<B>),
            CommandId::Arithmetic => {
                Self::new(args::parse_arithmetic, handlers::kv::arithmetic::<B>)
            }
            CommandId::Remove => Self::new(args::parse_remove, handlers::kv::remove::<B>),
            CommandId::Http => Self::new(args::parse_http, handlers::http::http::<B>),
        }
    }
}

/// Immutable mapping from command id to entry.
pub struct CommandTable<B> {
    entries: [CommandEntry<B>; CommandId::COUNT],
}

impl<B: Backend> CommandTable<B> {
    /// Table wired with the built-in parsers and handlers.
    pub fn standard() -> Self {
        Self {
            entries: CommandId::ALL.map(CommandEntry::standard),
        }
    }

    /// Replace the handler for one command, keeping its parser.
    pub fn with_handler(mut self, command: CommandId, handler: Handler<B>) -> Self {
        self.entries[command.index()].handler = handler;
        self
    }

    /// Entry for a known command.
    pub fn lookup(&self, command: CommandId) -> &CommandEntry<B> {
        &self.entries[command.index()]
    }

    /// Resolve a raw wire id.
    ///
    /// # Errors
    ///
    /// `InvalidCommand` if `raw` names no command.
    pub fn resolve(&self, raw: i64) -> Result<(CommandId, &CommandEntry<B>)> {
        let command = CommandId::try_from(raw)?;
        Ok((command, self.lookup(command)))
    }

    /// Resolve `raw` and parse `terms` with the command's parser.
    pub fn parse(&self, raw: i64, terms: &[Term]) -> Result<(CommandId, Arguments)> {
        let (command, entry) = self.resolve(raw)?;
        let arguments = (entry.parse)(terms)?;
        if arguments.command() != command {
            return Err(Error::parse(
                command,
                format!("parser produced arguments for {}", arguments.command()),
            ));
        }
        Ok((command, arguments))
    }

    /// Run `command`'s handler and encode the outcome.
    ///
    /// A panicking handler is contained here and reported as an internal
    /// error, so every task yields exactly one reply.
    pub fn execute(&self, command: CommandId, arguments: Arguments, backend: &mut B) -> Reply {
        let handler = self.lookup(command).handler;
        match catch_unwind(AssertUnwindSafe(|| handler(arguments, backend))) {
            Ok(result) => Reply::from_result(result),
            Err(e) => {
                let msg = e
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| e.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "(non-string panic)".to_string());
                error!(
                    target: "cbridge::worker",
                    command = %command,
                    panic = %msg,
                    "Handler panicked"
                );
                Reply::internal(format!("{} handler panicked", command))
            }
        }
    }
}

impl<B: Backend> Default for CommandTable<B> {
    fn default() -> Self {
        Self::standard()
    }
}
