//! Command stream optimizer.
//!
//! The optimizer is a chain of stream stages. Each stage consumes the commands of the stage before it and writes the
//! rewritten commands to the stage after it:
//!
//! 1. constant folding
//! 2. dead code removal
//! 3. synthetic map removal
//! 4. unused variable removal
//! 5. write coalescing
//!
//! Running the optimizer over its own output does not change it.

use tracing::trace;

use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::{CommandCollector, PushStream, StreamHandler, StreamMessage};

mod coalescing;
use self::coalescing::CoalescingWrites;

mod constant_folding;
use self::constant_folding::ConstantFolding;

mod dead_code;
use self::dead_code::DeadCodeRemoval;

mod synthetic_map;
use self::synthetic_map::SyntheticMapRemoval;

mod tracker;

mod unused_variables;
use self::unused_variables::UnusedVariableRemoval;

/// A rewrite of a command stream.
pub trait StreamTransform {
    /// Returns the name of the transform.
    fn name(&self) -> &'static str;

    /// Handles one command of the input stream, writing zero or more commands to `output`.
    ///
    /// # Errors
    ///
    /// If the command cannot be rewritten, or `output` fails, an error is returned.
    fn on_command(&mut self, command: &Command, output: &mut PushStream) -> Result<(), CompilerError>;

    /// Handles the end of the input stream, writing any buffered commands to `output`.
    ///
    /// # Errors
    ///
    /// If `output` fails, an error is returned.
    fn on_close(&mut self, _output: &mut PushStream) -> Result<(), CompilerError> {
        Ok(())
    }
}

/// Runs a transform as a handler of its input stream, owning its output stream.
struct Stage<T> {
    transform: T,
    output: PushStream,
    commands_in: usize,
}

impl<T: StreamTransform> StreamHandler for Stage<T> {
    fn on_command(&mut self, command: &Command) -> Result<(), CompilerError> {
        self.commands_in += 1;
        self.transform.on_command(command, &mut self.output)
    }

    fn on_warning(&mut self, warning: &StreamMessage) {
        self.output.warn(warning.clone());
    }

    fn on_close(&mut self) -> Result<(), CompilerError> {
        self.transform.on_close(&mut self.output)?;
        trace!(stage = self.transform.name(), commands_in = self.commands_in, "Optimizer stage finished.");
        self.output.close()
    }
}

fn stage<T>(transform: T, output: PushStream) -> Stage<T> {
    Stage {
        transform,
        output,
        commands_in: 0,
    }
}

fn input_of<T>(transform: T, output: PushStream) -> PushStream
where
    T: StreamTransform + 'static,
{
    let mut input = PushStream::new();
    input.add_handler(stage(transform, output));
    input
}

/// Attaches the optimizer to `head`, writing the optimized stream to `output`.
///
/// Handlers of `output` must be registered before calling this function.
pub fn attach(head: &mut PushStream, output: PushStream) {
    let output = input_of(CoalescingWrites::default(), output);
    let output = input_of(UnusedVariableRemoval::default(), output);
    let output = input_of(SyntheticMapRemoval::default(), output);
    let output = input_of(DeadCodeRemoval::default(), output);
    head.add_handler(stage(ConstantFolding::default(), output));
}

/// Optimizes a complete command sequence.
///
/// # Errors
///
/// If constant folding hits an invalid operation, an error is returned.
pub fn optimize(commands: Vec<Command>) -> Result<Vec<Command>, CompilerError> {
    let collector = CommandCollector::new();
    let mut output = PushStream::new();
    output.add_handler(collector.clone());

    let mut head = PushStream::new();
    attach(&mut head, output);
    for command in commands {
        head.write(command)?;
    }
    head.close()?;
    Ok(collector.take())
}

#[cfg(test)]
pub(crate) mod tests {
    use htl_expression::{BinaryOperator, ExpressionNode};
    use similar_asserts::assert_eq;

    use super::*;

    /// Runs a single transform over `commands`.
    pub(crate) fn run<T>(transform: T, commands: Vec<Command>) -> Result<Vec<Command>, CompilerError>
    where
        T: StreamTransform + 'static,
    {
        let collector = CommandCollector::new();
        let mut output = PushStream::new();
        output.add_handler(collector.clone());

        let mut input = input_of(transform, output);
        for command in commands {
            input.write(command)?;
        }
        input.close()?;
        Ok(collector.take())
    }

    #[test]
    fn constant_test_collapses_to_text() {
        let commands = vec![
            Command::bind("testVariable$0", ExpressionNode::BooleanConstant(true)),
            Command::when("testVariable$0", true),
            Command::out_text("<div"),
            Command::out_text(">"),
            Command::out_text("</div>"),
            Command::ConditionalEnd,
            Command::VariableBindingEnd,
        ];
        assert_eq!(optimize(commands).unwrap(), vec![Command::out_text("<div></div>")]);
    }

    #[test]
    fn warnings_reach_the_output() {
        let collector = CommandCollector::new();
        let mut output = PushStream::new();
        output.add_handler(collector.clone());
        struct Warnings(std::rc::Rc<std::cell::RefCell<usize>>);
        impl StreamHandler for Warnings {
            fn on_command(&mut self, _command: &Command) -> Result<(), CompilerError> {
                Ok(())
            }

            fn on_warning(&mut self, _warning: &StreamMessage) {
                *self.0.borrow_mut() += 1;
            }
        }
        let seen = std::rc::Rc::new(std::cell::RefCell::new(0));
        output.add_handler(Warnings(seen.clone()));

        let mut head = PushStream::new();
        attach(&mut head, output);
        head.warn(StreamMessage::new("careful", ""));
        head.close().unwrap();
        assert_eq!(*seen.borrow(), 1);
    }

    #[test]
    fn idempotent_over_a_mixed_stream() {
        let commands = vec![
            Command::bind("a$0", ExpressionNode::int(2)),
            Command::bind(
                "b$1",
                ExpressionNode::binary(BinaryOperator::Mul, ExpressionNode::identifier("a$0"), ExpressionNode::int(3)),
            ),
            Command::output("b$1"),
            Command::VariableBindingEnd,
            Command::VariableBindingEnd,
            Command::out_text("x"),
            Command::out_text("y"),
        ];
        let once = optimize(commands).unwrap();
        assert_eq!(
            once,
            vec![
                Command::bind("b$1", ExpressionNode::int(6)),
                Command::output("b$1"),
                Command::VariableBindingEnd,
                Command::out_text("xy"),
            ]
        );
        assert_eq!(optimize(once.clone()).unwrap(), once);
    }
}
