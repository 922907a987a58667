use uuid::Uuid;

use crate::commands::Command;

/// Per-connection state.
///
/// The pending transaction is only a placeholder: commands are always executed as soon as they
/// are parsed, nothing reads the queue yet.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    transaction: Vec<Command>,
}

impl Session {
    pub fn new() -> Session {
        Session {
            id: Uuid::new_v4(),
            transaction: Vec::new(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn queue(&mut self, command: Command) {
        self.transaction.push(command);
    }

    pub fn take_transaction(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.transaction)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
