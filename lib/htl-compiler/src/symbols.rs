/// Generates variable names for the bindings the compiler introduces.
///
/// Generated names contain a `$`, which the expression grammar does not allow in identifiers, so they never collide
/// with names written in a template.
#[derive(Debug, Default)]
pub struct SymbolGenerator {
    counter: usize,
}

const SEPARATOR: char = '$';

impl SymbolGenerator {
    /// Creates a new `SymbolGenerator`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new, unique variable name built from `hint`.
    pub fn next(&mut self, hint: &str) -> String {
        let name = format!("{}{}{}", hint, SEPARATOR, self.counter);
        self.counter += 1;
        name
    }

    /// Returns the name of the global variable for `hint`.
    ///
    /// Unlike [`next`][Self::next], the same hint always yields the same name.
    pub fn global(&self, hint: &str) -> String {
        format!("{}{}global", hint, SEPARATOR)
    }
}

/// Returns `true` if `name` was produced by a [`SymbolGenerator`].
pub fn is_generated(name: &str) -> bool {
    name.contains(SEPARATOR)
}
