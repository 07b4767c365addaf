use htl_expression::ExpressionNode;

use super::StreamTransform;
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

#[derive(Debug)]
struct Binding {
    start: Command,
    variable: String,
    body: Vec<Command>,
    depth: usize,
}

/// Returns `true` if `command` opens a scope in which `variable` refers to something else.
fn shadows(command: &Command, variable: &str) -> bool {
    match command {
        Command::VariableBindingStart { variable: bound, .. } => bound == variable,
        Command::LoopStart {
            item_variable,
            index_variable,
            ..
        } => item_variable == variable || index_variable == variable,
        Command::ProcedureStart { .. } => true,
        _ => false,
    }
}

fn reads(command: &Command, variable: &str) -> bool {
    if command.variables_read().contains(&variable) {
        return true;
    }
    let mut found = false;
    if let Some(expression) = command.expression() {
        expression.walk(&mut |node| {
            if matches!(node, ExpressionNode::Identifier(name) if name == variable) {
                found = true;
            }
        });
    }
    found
}

/// Returns `true` if any command of `body` reads the binding of `variable` that encloses it.
fn references(variable: &str, body: &[Command]) -> bool {
    let mut shadowing = Vec::new();
    for command in body {
        if !shadowing.iter().any(|shadowed| *shadowed) && reads(command, variable) {
            return true;
        }
        if command.opens().is_some() {
            shadowing.push(shadows(command, variable));
        } else if command.closes().is_some() {
            shadowing.pop();
        }
    }
    false
}

/// Removes scoped bindings whose variable is never read.
///
/// Global bindings are kept, since they are visible past the end of the enclosing scopes.
#[derive(Debug, Default)]
pub(super) struct UnusedVariableRemoval {
    bindings: Vec<Binding>,
}

impl UnusedVariableRemoval {
    fn emit(&mut self, command: Command, output: &mut PushStream) -> Result<(), CompilerError> {
        match self.bindings.last_mut() {
            Some(binding) => {
                binding.body.push(command);
                Ok(())
            }
            None => output.write(command),
        }
    }

    fn finish(&mut self, end: Command, output: &mut PushStream) -> Result<(), CompilerError> {
        let Some(binding) = self.bindings.pop() else {
            return self.emit(end, output);
        };
        let used = references(&binding.variable, &binding.body);
        if used {
            self.emit(binding.start, output)?;
        }
        for command in binding.body {
            self.emit(command, output)?;
        }
        if used {
            self.emit(end, output)?;
        }
        Ok(())
    }
}

impl StreamTransform for UnusedVariableRemoval {
    fn name(&self) -> &'static str {
        "unused_variable_removal"
    }

    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError> {
        if let Command::VariableBindingStart { variable, .. } = command {
            self.bindings.push(Binding {
                start: command.clone(),
                variable: variable.clone(),
                body: Vec::new(),
                depth: 0,
            });
            return Ok(());
        }

        if let Some(binding) = self.bindings.last_mut() {
            if command.opens().is_some() {
                binding.depth += 1;
            } else if command.closes().is_some() {
                if binding.depth == 0 {
                    return self.finish(command.clone(), output);
                }
                binding.depth -= 1;
            }
        }
        self.emit(command.clone(), output)
    }

    fn on_close(&mut self, output: &mut PushStream) -> Result<(), CompilerError> {
        // Unbalanced input: flush what is buffered as it came in.
        while let Some(binding) = self.bindings.pop() {
            self.emit(binding.start, output)?;
            for command in binding.body {
                self.emit(command, output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use htl_expression::{BinaryOperator, ExpressionNode};
    use similar_asserts::assert_eq;

    use super::*;
    use crate::optimizer::tests::run;

    #[test]
    fn unread_bindings_are_removed() {
        let commands = run(
            UnusedVariableRemoval::default(),
            vec![
                Command::bind("unused", ExpressionNode::identifier("page")),
                Command::bind("used", ExpressionNode::identifier("page")),
                Command::output("used"),
                Command::VariableBindingEnd,
                Command::out_text("<p>"),
                Command::VariableBindingEnd,
            ],
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                Command::bind("used", ExpressionNode::identifier("page")),
                Command::output("used"),
                Command::VariableBindingEnd,
                Command::out_text("<p>"),
            ]
        );
    }

    #[test]
    fn reads_in_expressions_count() {
        let input = vec![
            Command::bind("a", ExpressionNode::identifier("page")),
            Command::bind(
                "b",
                ExpressionNode::binary(BinaryOperator::Add, ExpressionNode::identifier("a"), ExpressionNode::int(1)),
            ),
            Command::output("b"),
            Command::VariableBindingEnd,
            Command::VariableBindingEnd,
        ];
        assert_eq!(run(UnusedVariableRemoval::default(), input.clone()).unwrap(), input);
    }

    #[test]
    fn shadowed_reads_do_not_count() {
        let commands = run(
            UnusedVariableRemoval::default(),
            vec![
                Command::bind("item", ExpressionNode::identifier("page")),
                Command::loop_over("list", "item", "index"),
                Command::output("item"),
                Command::LoopEnd,
                Command::VariableBindingEnd,
            ],
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![
                Command::loop_over("list", "item", "index"),
                Command::output("item"),
                Command::LoopEnd,
            ]
        );
    }

    #[test]
    fn globals_are_kept() {
        let input = vec![Command::global("g", ExpressionNode::int(1)), Command::out_text("x")];
        assert_eq!(run(UnusedVariableRemoval::default(), input.clone()).unwrap(), input);
    }
}
