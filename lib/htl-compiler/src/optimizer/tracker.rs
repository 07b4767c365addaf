use std::collections::HashSet;

use htl_expression::ExpressionNode;

use crate::commands::Command;

#[derive(Debug, Default)]
struct Frame {
    bindings: Vec<(String, Option<ExpressionNode>)>,

    /// Procedure bodies run where the procedure is called, so outer bindings are not visible from them.
    opaque: bool,
}

/// Tracks which variables are bound to scalar constants, following the scopes of a command stream.
///
/// Every command of the stream must be observed, in order.
#[derive(Debug, Default)]
pub(super) struct ConstantScopes {
    frames: Vec<Frame>,
    globals: HashSet<String>,
}

impl ConstantScopes {
    pub(super) fn observe(&mut self, command: &Command) {
        match command {
            Command::VariableBindingStart { variable, expression } => {
                let constant = expression.is_scalar_constant().then(|| expression.clone());
                self.frames.push(Frame {
                    bindings: vec![(variable.clone(), constant)],
                    opaque: false,
                });
            }
            Command::VariableBindingGlobal { variable, .. } => {
                self.globals.insert(variable.clone());
            }
            Command::LoopStart {
                item_variable,
                index_variable,
                ..
            } => self.frames.push(Frame {
                bindings: vec![(item_variable.clone(), None), (index_variable.clone(), None)],
                opaque: false,
            }),
            Command::ProcedureStart { parameters, .. } => self.frames.push(Frame {
                bindings: parameters.iter().map(|parameter| (parameter.clone(), None)).collect(),
                opaque: true,
            }),
            Command::ConditionalStart { .. } => self.frames.push(Frame::default()),
            command if command.closes().is_some() => {
                self.frames.pop();
            }
            _ => {}
        }
    }

    /// Returns the constant bound to `variable` in the current scope, if any.
    ///
    /// Variables that are ever bound globally are never considered constant.
    pub(super) fn constant(&self, variable: &str) -> Option<&ExpressionNode> {
        if self.globals.contains(variable) {
            return None;
        }
        for frame in self.frames.iter().rev() {
            if let Some((_, constant)) = frame.bindings.iter().find(|(name, _)| name == variable) {
                return constant.as_ref();
            }
            if frame.opaque {
                return None;
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn inner_bindings_shadow_outer_ones() {
        let mut scopes = ConstantScopes::default();
        scopes.observe(&Command::bind("a", ExpressionNode::int(1)));
        assert_eq!(scopes.constant("a"), Some(&ExpressionNode::int(1)));

        scopes.observe(&Command::loop_over("list", "a", "i"));
        assert_eq!(scopes.constant("a"), None);
        scopes.observe(&Command::LoopEnd);
        assert_eq!(scopes.constant("a"), Some(&ExpressionNode::int(1)));

        scopes.observe(&Command::VariableBindingEnd);
        assert_eq!(scopes.constant("a"), None);
    }

    #[test]
    fn procedures_and_globals_hide_constants() {
        let mut scopes = ConstantScopes::default();
        scopes.observe(&Command::bind("a", ExpressionNode::string("x")));
        scopes.observe(&Command::ProcedureStart {
            name: "t".to_string(),
            parameters: Vec::new(),
        });
        assert_eq!(scopes.constant("a"), None);
        scopes.observe(&Command::ProcedureEnd);
        assert!(scopes.constant("a").is_some());

        scopes.observe(&Command::global("a", ExpressionNode::int(2)));
        assert_eq!(scopes.constant("a"), None);
    }
}
