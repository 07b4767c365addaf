//! Expression filters.
//!
//! A filter consumes some of an expression's options and wraps the expression's root in a runtime call that applies
//! them. Filters run in ascending priority order, so the output of one becomes the input of the next.

use htl_expression::{Expression, ExpressionNode};
use indexmap::IndexMap;

use crate::context::ExpressionContext;

mod format;
pub use self::format::FormatFilter;

mod i18n;
pub use self::i18n::I18nFilter;

mod join;
pub use self::join::JoinFilter;

mod uri;
pub use self::uri::UriManipulationFilter;

mod xss;
pub use self::xss::XssFilter;

/// Name of the option that selects the markup context of an expression.
pub const CONTEXT_OPTION: &str = "context";

/// Options consumed by a filter, in the order they were declared by the filter.
pub type ConsumedOptions = IndexMap<String, ExpressionNode>;

/// An expression rewrite driven by expression options.
pub trait Filter: Send + Sync {
    /// Returns the name of the filter.
    fn name(&self) -> &'static str;

    /// Returns the priority of the filter. Lower priorities run first.
    fn priority(&self) -> i32 {
        100
    }

    /// Returns the options this filter consumes.
    fn options(&self) -> &'static [&'static str];

    /// Returns the options that must all be present for this filter to run.
    fn required_options(&self) -> &'static [&'static str] {
        &[]
    }

    /// Returns `true` if the filter runs on expressions in the given context.
    fn applies_to(&self, context: ExpressionContext) -> bool {
        !context.is_parametrizable()
    }

    /// Rewrites an expression after its consumed options have been removed from it.
    fn rewrite(&self, expression: Expression, consumed: ConsumedOptions) -> Expression;

    /// Applies the filter.
    ///
    /// When the context is applicable and all required options are present, removes exactly the options declared by
    /// the filter and rewrites the expression. Otherwise, the expression is returned unchanged.
    fn apply(&self, mut expression: Expression, context: ExpressionContext) -> Expression {
        if !self.applies_to(context) {
            return expression;
        }
        if !self
            .required_options()
            .iter()
            .all(|option| expression.contains_option(option))
        {
            return expression;
        }

        let mut consumed = ConsumedOptions::new();
        for option in self.options() {
            if let Some(value) = expression.remove_option(option) {
                consumed.insert(option.to_string(), value);
            }
        }
        self.rewrite(expression, consumed)
    }
}

/// The filters of a compiler, sorted by priority.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Creates a new `FilterChain` from the given filters.
    ///
    /// Filters are sorted by priority. Filters with equal priorities keep their relative order.
    pub fn new(mut filters: Vec<Box<dyn Filter>>) -> Self {
        filters.sort_by_key(|filter| filter.priority());
        Self { filters }
    }

    /// Creates the chain of built-in filters.
    pub fn builtin() -> Self {
        Self::new(vec![
            Box::new(I18nFilter),
            Box::new(FormatFilter),
            Box::new(JoinFilter),
            Box::new(UriManipulationFilter),
            Box::new(XssFilter),
        ])
    }

    /// Runs every filter over the expression, in order.
    pub fn apply(&self, expression: Expression, context: ExpressionContext) -> Expression {
        self.filters
            .iter()
            .fold(expression, |expression, filter| filter.apply(expression, context))
    }

    /// Returns the names of the filters, in the order they run.
    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    /// Returns every option consumed by a filter of this chain.
    pub fn options(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.filters.iter().flat_map(|filter| filter.options().iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use htl_expression::{parse_expression, RuntimeFunction};
    use similar_asserts::assert_eq;

    use super::*;

    pub(super) fn expression(body: &str) -> Expression {
        parse_expression(body, &format!("${{{}}}", body)).unwrap()
    }

    #[test]
    fn builtin_order() {
        assert_eq!(
            FilterChain::builtin().names(),
            vec!["i18n", "format", "join", "uriManipulation", "xss"]
        );
    }

    #[test]
    fn i18n_runs_before_xss() {
        let filtered = FilterChain::builtin().apply(
            expression("'hello' @ i18n, locale='de', context='html'"),
            ExpressionContext::Text,
        );
        assert_eq!(
            filtered.root().to_string(),
            "xss(i18n('hello', {'i18n': null, 'locale': 'de'}), 'html')"
        );
        assert!(filtered.root().is_call_to(RuntimeFunction::Xss));
        assert_eq!(filtered.option("formatLocale"), Some(&ExpressionNode::string("de")));
    }

    #[test]
    fn parametrizable_contexts_are_left_alone() {
        let original = expression("'org.example.Pojo' @ path='/a/b/c', context='html'");
        let filtered = FilterChain::builtin().apply(original.clone(), ExpressionContext::PluginUse);
        assert_eq!(filtered, original);
    }

    #[test]
    fn missing_required_option_passes_through() {
        let original = expression("value @ locale='de'");
        let filtered = FilterChain::builtin().apply(original.clone(), ExpressionContext::Text);
        assert_eq!(filtered, original);
    }
}
