//! The unit of work handed from admission to an executor.

use cbridge_core::{Arguments, CommandId};

use crate::handle::HandleId;
use crate::issuer::Issuer;

/// One admitted request.
///
/// A task is built only after its arguments parsed successfully, is owned by
/// exactly one executor, and is dropped once its reply has been delivered.
/// It has no setters or getters; executors take it apart with `into_parts`.
#[derive(Debug)]
pub struct Task {
    command: CommandId,
    arguments: Arguments,
    issuer: Issuer,
    handle: HandleId,
}

impl Task {
    pub(crate) fn new(
        command: CommandId,
        arguments: Arguments,
        issuer: Issuer,
        handle: HandleId,
    ) -> Self {
        debug_assert_eq!(arguments.command(), command);
        Self {
            command,
            arguments,
            issuer,
            handle,
        }
    }

    pub(crate) fn into_parts(self) -> (CommandId, Arguments, Issuer, HandleId) {
        (self.command, self.arguments, self.issuer, self.handle)
    }
}
