use htl_expression::Value;

use super::tracker::ConstantScopes;
use super::StreamTransform;
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

#[derive(Debug, PartialEq, Eq)]
enum Branch {
    /// The outcome is only known at render time.
    Keep,

    /// The condition always holds: the body is kept without the conditional around it.
    Unwrap,
}

/// Resolves conditionals over variables bound to constants.
#[derive(Debug, Default)]
pub(super) struct DeadCodeRemoval {
    scopes: ConstantScopes,
    branches: Vec<Branch>,

    /// Set while dropping the body of a conditional that never holds, to the number of scopes opened inside it.
    dropping: Option<usize>,
}

impl DeadCodeRemoval {
    fn truth_value(&self, variable: &str) -> Option<bool> {
        self.scopes
            .constant(variable)
            .and_then(Value::from_literal)
            .map(|value| value.is_truthy())
    }

    /// Returns `true` while the command is inside a dropped conditional, updating the drop state.
    fn skip(&mut self, command: &Command) -> bool {
        let Some(depth) = self.dropping.as_mut() else {
            return false;
        };
        if command.opens().is_some() {
            *depth += 1;
        } else if command.closes().is_some() {
            if *depth == 0 {
                self.dropping = None;
            } else {
                *depth -= 1;
            }
        }
        true
    }
}

impl StreamTransform for DeadCodeRemoval {
    fn name(&self) -> &'static str {
        "dead_code_removal"
    }

    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError> {
        if self.skip(command) {
            return Ok(());
        }

        match command {
            Command::ConditionalStart {
                variable,
                expected_truth_value,
            } => match self.truth_value(variable) {
                Some(truth) if truth != *expected_truth_value => {
                    self.dropping = Some(0);
                    Ok(())
                }
                Some(_) => {
                    self.scopes.observe(command);
                    self.branches.push(Branch::Unwrap);
                    Ok(())
                }
                None => {
                    self.scopes.observe(command);
                    self.branches.push(Branch::Keep);
                    output.write(command.clone())
                }
            },
            Command::ConditionalEnd => {
                self.scopes.observe(command);
                match self.branches.pop() {
                    Some(Branch::Unwrap) => Ok(()),
                    _ => output.write(command.clone()),
                }
            }
            _ => {
                self.scopes.observe(command);
                output.write(command.clone())
            }
        }
    }
}
