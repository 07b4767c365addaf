//! Markup and expression contexts.

/// The markup context an expression is rendered in, which decides how its value is escaped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MarkupContext {
    Html,
    Text,
    ElementName,
    AttributeName,
    Attribute,
    Uri,
    ScriptToken,
    ScriptString,
    ScriptComment,
    ScriptRegExp,
    StyleToken,
    StyleString,
    StyleComment,
    Comment,
    Number,
    Unsafe,
}

impl MarkupContext {
    /// Returns the markup context of the value of the attribute with the given name.
    pub fn for_attribute(name: &str) -> Self {
        if name.eq_ignore_ascii_case("src") || name.eq_ignore_ascii_case("href") {
            Self::Uri
        } else {
            Self::Attribute
        }
    }

    /// Returns the name used for this context in the `context` option.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Text => "text",
            Self::ElementName => "elementName",
            Self::AttributeName => "attributeName",
            Self::Attribute => "attribute",
            Self::Uri => "uri",
            Self::ScriptToken => "scriptToken",
            Self::ScriptString => "scriptString",
            Self::ScriptComment => "scriptComment",
            Self::ScriptRegExp => "scriptRegExp",
            Self::StyleToken => "styleToken",
            Self::StyleString => "styleString",
            Self::StyleComment => "styleComment",
            Self::Comment => "comment",
            Self::Number => "number",
            Self::Unsafe => "unsafe",
        }
    }
}

/// The place an expression appears in, which decides which filters apply to it and which options it may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ExpressionContext {
    PluginUse,
    PluginText,
    PluginAttribute,
    PluginElement,
    PluginTest,
    PluginSet,
    PluginList,
    PluginRepeat,
    PluginInclude,
    PluginResource,
    PluginTemplate,
    PluginCall,
    PluginUnwrap,
    Element,
    Text,
    Attribute,
}

impl ExpressionContext {
    /// All expression contexts.
    pub const ALL: [ExpressionContext; 16] = [
        Self::PluginUse,
        Self::PluginText,
        Self::PluginAttribute,
        Self::PluginElement,
        Self::PluginTest,
        Self::PluginSet,
        Self::PluginList,
        Self::PluginRepeat,
        Self::PluginInclude,
        Self::PluginResource,
        Self::PluginTemplate,
        Self::PluginCall,
        Self::PluginUnwrap,
        Self::Element,
        Self::Text,
        Self::Attribute,
    ];

    /// Returns the context of the plugin with the given name.
    pub fn for_plugin(name: &str) -> Option<Self> {
        let context = match name {
            "use" => Self::PluginUse,
            "text" => Self::PluginText,
            "attribute" => Self::PluginAttribute,
            "element" => Self::PluginElement,
            "test" => Self::PluginTest,
            "set" => Self::PluginSet,
            "list" => Self::PluginList,
            "repeat" => Self::PluginRepeat,
            "include" => Self::PluginInclude,
            "resource" => Self::PluginResource,
            "template" => Self::PluginTemplate,
            "call" => Self::PluginCall,
            "unwrap" => Self::PluginUnwrap,
            _ => return None,
        };
        Some(context)
    }

    /// Returns the options owned by this context.
    pub fn options(&self) -> &'static [&'static str] {
        match self {
            Self::PluginList | Self::PluginRepeat => &["begin", "step", "end"],
            Self::PluginInclude => &["appendPath", "prependPath", "file", "requestAttributes"],
            Self::PluginResource => &[
                "appendPath",
                "prependPath",
                "file",
                "selectors",
                "addSelectors",
                "removeSelectors",
                "resourceType",
                "requestAttributes",
            ],
            _ => &[],
        }
    }

    /// Returns `true` for the contexts whose options are free-form parameters: `use`, `template` and `call`.
    pub fn is_parametrizable(&self) -> bool {
        matches!(self, Self::PluginUse | Self::PluginTemplate | Self::PluginCall)
    }
}
