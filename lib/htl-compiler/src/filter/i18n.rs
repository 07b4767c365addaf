use htl_expression::{Expression, ExpressionNode, RuntimeFunction};

use super::{ConsumedOptions, Filter};

const I18N_OPTION: &str = "i18n";
const LOCALE_OPTION: &str = "locale";
const FORMAT_LOCALE_OPTION: &str = "formatLocale";

/// Translates the value of an expression.
///
/// Runs before the format filter, which sees the translation locale through the `formatLocale` option.
pub struct I18nFilter;

impl Filter for I18nFilter {
    fn name(&self) -> &'static str {
        "i18n"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn options(&self) -> &'static [&'static str] {
        &[I18N_OPTION, "hint", LOCALE_OPTION, "basename"]
    }

    fn required_options(&self) -> &'static [&'static str] {
        &[I18N_OPTION]
    }

    fn rewrite(&self, expression: Expression, consumed: ConsumedOptions) -> Expression {
        let locale = consumed.get(LOCALE_OPTION).cloned();
        let translation = ExpressionNode::call(
            RuntimeFunction::I18n,
            vec![expression.root().clone(), ExpressionNode::MapLiteral(consumed)],
        );

        let mut translated = expression.with_node(translation);
        if let Some(locale) = locale {
            translated.set_option(FORMAT_LOCALE_OPTION, locale);
        }
        translated
    }
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::context::ExpressionContext;
    use crate::filter::tests::expression;

    #[test]
    fn consumes_only_its_options() {
        let filtered = I18nFilter.apply(
            expression("'Hello' @ i18n, hint='greeting', format='x'"),
            ExpressionContext::Text,
        );
        assert_eq!(
            filtered.root().to_string(),
            "i18n('Hello', {'i18n': null, 'hint': 'greeting'})"
        );
        assert_eq!(filtered.options().keys().collect::<Vec<_>>(), vec!["format"]);
        assert!(!filtered.contains_option(FORMAT_LOCALE_OPTION));
    }

    #[test]
    fn locale_is_copied_for_formatting() {
        let filtered = I18nFilter.apply(expression("'Hello' @ i18n, locale=lang"), ExpressionContext::Attribute);
        assert_eq!(
            filtered.option(FORMAT_LOCALE_OPTION),
            Some(&ExpressionNode::identifier("lang"))
        );
    }
}
