//! Command sequences shared by the front end and several plugins.

use htl_expression::{BinaryOperator, ExpressionNode};

use crate::commands::Command;
use crate::error::CompilerError;
use crate::stream::PushStream;

/// The name of an attribute written by [`AttributeVariables::write`].
#[derive(Clone, Copy, Debug)]
pub(crate) enum AttributeName<'a> {
    /// A name known at compile time.
    Static(&'a str),

    /// A name held in a variable.
    Variable(&'a str),
}

/// The variables used to write one attribute with a dynamic value.
#[derive(Clone, Debug)]
pub(crate) struct AttributeVariables {
    value: String,
    is_true: String,
    should_display: String,
}

impl AttributeVariables {
    pub(crate) fn generate<F: FnMut(&str) -> String>(mut generate_variable: F) -> Self {
        Self {
            value: generate_variable("attrValue"),
            is_true: generate_variable("isTrueAttr"),
            should_display: generate_variable("shouldDisplayAttr"),
        }
    }

    /// Writes an attribute whose value is only known at render time.
    ///
    /// The attribute is left out when its value is falsy, unless the value is the string `false`. A value of `true`
    /// writes the bare attribute name.
    pub(crate) fn write(
        &self, stream: &mut PushStream, name: AttributeName<'_>, value: ExpressionNode, quote: char,
    ) -> Result<(), CompilerError> {
        let value_var = ExpressionNode::identifier(&self.value);
        stream.write(Command::bind(&self.value, value))?;
        stream.write(Command::bind(
            &self.is_true,
            ExpressionNode::binary(
                BinaryOperator::Eq,
                value_var.clone(),
                ExpressionNode::BooleanConstant(true),
            ),
        ))?;
        stream.write(Command::bind(
            &self.should_display,
            ExpressionNode::binary(
                BinaryOperator::Or,
                value_var.clone(),
                ExpressionNode::binary(BinaryOperator::Eq, ExpressionNode::string("false"), value_var),
            ),
        ))?;

        stream.write(Command::when(&self.should_display, true))?;
        match name {
            AttributeName::Static(name) => stream.write(Command::out_text(format!(" {}", name)))?,
            AttributeName::Variable(variable) => {
                stream.write(Command::out_text(" "))?;
                stream.write(Command::output(variable))?;
            }
        }
        stream.write(Command::when(&self.is_true, false))?;
        stream.write(Command::out_text(format!("={}", quote)))?;
        stream.write(Command::output(&self.value))?;
        stream.write(Command::out_text(quote.to_string()))?;
        stream.write(Command::ConditionalEnd)?;
        stream.write(Command::ConditionalEnd)?;

        stream.write(Command::VariableBindingEnd)?;
        stream.write(Command::VariableBindingEnd)?;
        stream.write(Command::VariableBindingEnd)
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::stream::{verify_scopes, CommandCollector};
    use crate::symbols::SymbolGenerator;

    #[test]
    fn dynamic_attribute() {
        let collector = CommandCollector::new();
        let mut stream = PushStream::new();
        stream.add_handler(collector.clone());

        let mut symbols = SymbolGenerator::new();
        let variables = AttributeVariables::generate(|hint| symbols.next(hint));
        variables
            .write(
                &mut stream,
                AttributeName::Static("title"),
                ExpressionNode::identifier("title"),
                '\'',
            )
            .unwrap();

        let commands = collector.take();
        assert_eq!(verify_scopes(&commands), Ok(()));
        assert_eq!(commands.len(), 14);
        assert!(commands.contains(&Command::out_text(" title")));
        assert!(commands.contains(&Command::out_text("='")));
    }
}
