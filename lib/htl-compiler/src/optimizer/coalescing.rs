use super::StreamTransform;
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// Merges consecutive text writes into one.
#[derive(Debug, Default)]
pub(super) struct CoalescingWrites {
    pending: String,
}

impl CoalescingWrites {
    fn flush(&mut self, output: &mut PushStream) -> Result<(), CompilerError> {
        if self.pending.is_empty() {
            return Ok(());
        }
        output.write(Command::OutText(std::mem::take(&mut self.pending)))
    }
}

impl StreamTransform for CoalescingWrites {
    fn name(&self) -> &'static str {
        "coalescing_writes"
    }

    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError> {
        match command {
            Command::OutText(text) => {
                self.pending.push_str(text);
                Ok(())
            }
            other => {
                self.flush(output)?;
                output.write(other.clone())
            }
        }
    }

    fn on_close(&mut self, output: &mut PushStream) -> Result<(), CompilerError> {
        self.flush(output)
    }
}
