use std::convert::Infallible;

use htl_expression::ExpressionNode;

use super::StreamTransform;
use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;
use crate::symbols::is_generated;

/// A buffered binding of a generated variable to a map literal.
#[derive(Debug)]
struct MapBinding {
    variable: String,
    map: ExpressionNode,
    body: Vec<Command>,

    /// Scopes opened in the body and not closed yet.
    depth: usize,
}

impl MapBinding {
    fn uses(&self) -> (usize, usize) {
        let mut expression_uses = 0;
        let mut direct_reads = 0;
        for command in &self.body {
            direct_reads += command
                .variables_read()
                .into_iter()
                .filter(|variable| *variable == self.variable)
                .count();
            if let Some(expression) = command.expression() {
                expression.walk(&mut |node| {
                    if matches!(node, ExpressionNode::Identifier(name) if *name == self.variable) {
                        expression_uses += 1;
                    }
                });
            }
        }
        (expression_uses, direct_reads)
    }

    /// Returns the commands that replace the binding: its body, with the map inlined at its single use, or the
    /// binding unchanged.
    fn finish(self) -> Vec<Command> {
        if self.uses() != (1, 0) {
            let mut commands = Vec::with_capacity(self.body.len() + 2);
            commands.push(Command::bind(self.variable, self.map));
            commands.extend(self.body);
            commands.push(Command::VariableBindingEnd);
            return commands;
        }

        let variable = ExpressionNode::Identifier(self.variable);
        let map = self.map;
        let inline = |expression: ExpressionNode| -> ExpressionNode {
            let inlined = expression.transform(&mut |node| {
                Ok::<_, Infallible>(if node == variable { map.clone() } else { node })
            });
            match inlined {
                Ok(node) => node,
                Err(never) => match never {},
            }
        };
        self.body
            .into_iter()
            .map(|command| match command {
                Command::VariableBindingStart { variable, expression } => Command::bind(variable, inline(expression)),
                Command::VariableBindingGlobal { variable, expression } => {
                    Command::global(variable, inline(expression))
                }
                other => other,
            })
            .collect()
    }
}

/// Inlines map literals bound to generated variables that are used exactly once.
#[derive(Debug, Default)]
pub(super) struct SyntheticMapRemoval {
    bindings: Vec<MapBinding>,
}

impl SyntheticMapRemoval {
    fn emit(&mut self, command: Command, output: &mut PushStream) -> Result<(), CompilerError> {
        match self.bindings.last_mut() {
            Some(binding) => {
                binding.body.push(command);
                Ok(())
            }
            None => output.write(command),
        }
    }
}

impl StreamTransform for SyntheticMapRemoval {
    fn name(&self) -> &'static str {
        "synthetic_map_removal"
    }

    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError> {
        if let Command::VariableBindingStart {
            variable,
            expression: map @ ExpressionNode::MapLiteral(_),
        } = command
        {
            if is_generated(variable) {
                self.bindings.push(MapBinding {
                    variable: variable.clone(),
                    map: map.clone(),
                    body: Vec::new(),
                    depth: 0,
                });
                return Ok(());
            }
        }

        if let Some(binding) = self.bindings.last_mut() {
            if command.opens().is_some() {
                binding.depth += 1;
            } else if command.closes().is_some() {
                if binding.depth == 0 {
                    if let Some(binding) = self.bindings.pop() {
                        for command in binding.finish() {
                            self.emit(command, output)?;
                        }
                    }
                    return Ok(());
                }
                binding.depth -= 1;
            }
        }
        self.emit(command.clone(), output)
    }

    fn on_close(&mut self, output: &mut PushStream) -> Result<(), CompilerError> {
        // Only reachable with unbalanced input. Write what was buffered, unchanged.
        while let Some(binding) = self.bindings.pop() {
            let commands = std::iter::once(Command::bind(binding.variable, binding.map)).chain(binding.body);
            for command in commands {
                self.emit(command, output)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use htl_expression::RuntimeFunction;
    use indexmap::IndexMap;
    use similar_asserts::assert_eq;

    use super::*;
    use crate::optimizer::tests::run;

    fn options() -> ExpressionNode {
        let mut entries = IndexMap::new();
        entries.insert("path".to_string(), ExpressionNode::string("/a"));
        ExpressionNode::MapLiteral(entries)
    }

    fn use_call(argument: ExpressionNode) -> ExpressionNode {
        ExpressionNode::call(RuntimeFunction::Use, vec![ExpressionNode::string("Pojo"), argument])
    }

    #[test]
    fn single_use_is_inlined() {
        let commands = run(
            SyntheticMapRemoval::default(),
            vec![
                Command::bind("useOptions$0", options()),
                Command::global("bean", use_call(ExpressionNode::identifier("useOptions$0"))),
                Command::out_text("<div>"),
                Command::VariableBindingEnd,
            ],
        )
        .unwrap();
        assert_eq!(
            commands,
            vec![Command::global("bean", use_call(options())), Command::out_text("<div>")]
        );
    }

    #[test]
    fn direct_reads_keep_the_binding() {
        let input = vec![
            Command::bind("templateVar$0", ExpressionNode::identifier("lib")),
            Command::bind("templateOptions$1", options()),
            Command::ProcedureCall {
                template_variable: "templateVar$0".to_string(),
                arguments_variable: "templateOptions$1".to_string(),
            },
            Command::VariableBindingEnd,
            Command::VariableBindingEnd,
        ];
        assert_eq!(run(SyntheticMapRemoval::default(), input.clone()).unwrap(), input);
    }

    #[test]
    fn template_variables_are_left_alone() {
        let input = vec![
            Command::bind("options", options()),
            Command::global("bean", use_call(ExpressionNode::identifier("options"))),
            Command::VariableBindingEnd,
        ];
        assert_eq!(run(SyntheticMapRemoval::default(), input.clone()).unwrap(), input);
    }
}
