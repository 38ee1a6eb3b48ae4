//! Engine entry points.
//!
//! [`ScriptEngine`] owns the symbol-table aggregate and the include resolver.
//! [`ScriptEngine::compile`] runs the pre-pass and the main parse and returns
//! the executable AST; the evaluator that walks it lives outside this crate.

use crate::error::PrestoResult;
use crate::include::{EmbeddedCollectionProvider, SourceProvider};
use crate::parser::ast::{BlockStatement, Expression};
use crate::parser::builder::ExpressionTreeBuilder;
use crate::parser::prepass::run_prepass;
use crate::parser::symbols::{ApiClass, SymbolTables};
use crate::value::Value;

/// The parse result handed to the evaluator: the root block of the script.
#[derive(Debug)]
pub struct ParsedScript {
    /// Top-level statements, with block-level lock statements hoisted.
    pub root: BlockStatement,
}

/// One scripting-engine instance: symbol tables plus an include resolver.
///
/// Register callbacks, API classes, and globals before compiling.  On a
/// failed compile the tables keep whatever state the pre-pass reached; the
/// host is expected to discard the engine or retry after fixing the source.
///
/// # Example
///
/// ```
/// use presto_core::engine::ScriptEngine;
///
/// let mut engine = ScriptEngine::new();
/// let script = engine.compile("var x = 1 + 2;").unwrap();
/// assert_eq!(script.root.statements.len(), 1);
/// ```
pub struct ScriptEngine {
    tables: SymbolTables,
    provider: Box<dyn SourceProvider>,
}

impl ScriptEngine {
    /// Creates an engine whose includes resolve against an empty embedded
    /// collection (every include is a no-op).
    pub fn new() -> Self {
        Self::with_provider(Box::new(EmbeddedCollectionProvider::new()))
    }

    /// Creates an engine with the given include resolver.
    pub fn with_provider(provider: Box<dyn SourceProvider>) -> Self {
        Self {
            tables: SymbolTables::new(),
            provider,
        }
    }

    // ── Host registration ───────────────────────────────────────────────────

    /// Registers a callback entry point with a fixed parameter count.
    pub fn register_callback(&mut self, name: impl Into<String>, num_args: usize) {
        self.tables.register_callback(name, num_args);
    }

    /// Registers a host API class.
    pub fn register_api_class(&mut self, class: ApiClass) {
        self.tables.register_api_class(class);
    }

    /// Writes a property in the shared global bag.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.tables.set_global(name, value);
    }

    /// Read access to the symbol tables (for the evaluator and for
    /// diagnostics).
    pub fn symbol_tables(&self) -> &SymbolTables {
        &self.tables
    }

    /// Mutable access to the symbol tables (for the evaluator's writes to
    /// register slots, const slots, globals, and callback bags).
    pub fn symbol_tables_mut(&mut self) -> &mut SymbolTables {
        &mut self.tables
    }

    // ── Entry points ────────────────────────────────────────────────────────

    /// Compiles `code`: pre-pass, then the full parse.
    pub fn compile(&mut self, code: &str) -> PrestoResult<ParsedScript> {
        run_prepass(code, "", &mut self.tables, self.provider.as_ref())?;

        let mut builder =
            ExpressionTreeBuilder::new(code, "", &mut self.tables, self.provider.as_ref())?;
        let root = builder.parse_statement_list()?;
        if !builder.is_at_end() {
            return Err(builder
                .current_location()
                .error_parse("Found '}' when expecting a statement"));
        }
        Ok(ParsedScript { root })
    }

    /// Parses `code` as a single expression (pre-pass included, so constants
    /// and registers declared elsewhere in `code` resolve).
    pub fn parse_expression(&mut self, code: &str) -> PrestoResult<Expression> {
        run_prepass(code, "", &mut self.tables, self.provider.as_ref())?;

        let mut builder =
            ExpressionTreeBuilder::new(code, "", &mut self.tables, self.provider.as_ref())?;
        builder.parse_expression()
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests — end-to-end scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PrestoError;
    use crate::parser::ast::{Expression, Statement};
    use crate::parser::symbols::{uninitialised_sentinel, NamespaceId};

    #[test]
    fn test_const_then_reference() {
        let mut engine = ScriptEngine::new();
        let script = engine.compile("const var PI = 3.14; var x = PI;").unwrap();
        assert!(matches!(
            script.root.statements[0],
            Statement::ConstVar { .. }
        ));
        let tables = engine.symbol_tables();
        assert_eq!(
            tables.root.const_objects.get("PI"),
            Some(&uninitialised_sentinel())
        );
    }

    #[test]
    fn test_namespace_member_access() {
        let mut engine = ScriptEngine::new();
        let script = engine
            .compile("namespace A { const var k = 1; } var y = A.k;")
            .unwrap();
        let Statement::Var { initialiser: Some(init), .. } =
            script.root.statements.last().unwrap()
        else {
            panic!("expected var");
        };
        assert!(matches!(
            init,
            Expression::ConstReference { ns: NamespaceId::Named(0), index: 0, .. }
        ));
    }

    #[test]
    fn test_duplicate_storage_kinds() {
        let mut engine = ScriptEngine::new();
        let err = engine.compile("var v = 1; const var v = 2;").unwrap_err();
        assert!(matches!(err, PrestoError::Symbol(_, _)));
        assert!(err.message().contains("already exists in other storage"));
    }

    #[test]
    fn test_nested_namespaces_rejected() {
        let mut engine = ScriptEngine::new();
        let err = engine
            .compile("namespace A { namespace B { } }")
            .unwrap_err();
        assert!(matches!(err, PrestoError::Symbol(_, _)));
        assert!(err.message().contains("Nesting of namespaces is not allowed"));
    }

    #[test]
    fn test_inline_call_arity() {
        let mut engine = ScriptEngine::new();
        let err = engine
            .compile("inline function add(a, b) { return a + b; } var z = add(1,2,3);")
            .unwrap_err();
        assert!(matches!(err, PrestoError::Arity(_, _)));
        assert!(err
            .message()
            .contains("parameter amount mismatch: 3 (Expected: 2)"));
    }

    #[test]
    fn test_doc_comment_attaches_to_next_declaration_only() {
        let mut engine = ScriptEngine::new();
        engine
            .compile("/** doc */ inline function f(x) { return x; } inline function g() { return 0; }")
            .unwrap();
        let tables = engine.symbol_tables();
        assert_eq!(tables.root.inline_functions[0].comment_doc, "doc");
        assert_eq!(tables.root.inline_functions[1].comment_doc, "");
    }

    #[test]
    fn test_recursive_include_rejected() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("a.js", "include(\"a.js\");");
        let mut engine = ScriptEngine::with_provider(Box::new(provider));
        let err = engine.compile("include(\"a.js\");").unwrap_err();
        assert!(matches!(err, PrestoError::Include(_, _)));
        assert!(err.message().contains("included multiple times"));
        // The error names the deepest file of the include chain.
        assert_eq!(err.position().file, "a.js");
    }

    #[test]
    fn test_for_in_iterator_resolution() {
        let mut engine = ScriptEngine::new();
        let script = engine.compile("for (i in arr) total += i;").unwrap();
        let Statement::ForIn { iterator_name, .. } = &script.root.statements[0] else {
            panic!("expected for-in");
        };
        assert_eq!(iterator_name, "i");
    }

    #[test]
    fn test_include_chain_via_provider() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("a.js", "include(\"b.js\"); const var A = 1;");
        provider.insert("b.js", "const var B = 2;");
        let mut engine = ScriptEngine::with_provider(Box::new(provider));
        engine.compile("include(\"a.js\"); var x = A + B;").unwrap();
        let tables = engine.symbol_tables();
        assert!(tables.root.get_const_index("A").is_some());
        assert!(tables.root.get_const_index("B").is_some());
        assert!(tables.is_file_included("a.js"));
        assert!(tables.is_file_included("b.js"));
    }

    #[test]
    fn test_parse_expression_entry_point() {
        let mut engine = ScriptEngine::new();
        let expr = engine.parse_expression("1 + 2 * 3").unwrap();
        assert!(matches!(expr, Expression::Binary { .. }));
    }

    #[test]
    fn test_stray_close_brace_rejected() {
        let mut engine = ScriptEngine::new();
        let err = engine.compile("var x = 1; }").unwrap_err();
        assert!(err.message().contains("when expecting a statement"));
    }

    #[test]
    fn test_callback_roundtrip() {
        let mut engine = ScriptEngine::new();
        engine.register_callback("onNoteOn", 1);
        engine
            .compile("function onNoteOn(note) { local v = note; }")
            .unwrap();
        let tables = engine.symbol_tables();
        let callback = &tables.callbacks[0];
        assert_eq!(callback.parameters, vec!["note"]);
        assert!(callback.body.is_some());
    }

    #[test]
    fn test_failed_compile_keeps_prepass_state() {
        let mut engine = ScriptEngine::new();
        let err = engine.compile("const var A = 1; var = ;").unwrap_err();
        assert!(matches!(err, PrestoError::Parse(_, _)));
        // The pre-pass had already registered the constant.
        assert!(engine.symbol_tables().root.get_const_index("A").is_some());
    }
}
