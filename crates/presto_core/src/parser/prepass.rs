//! Declaration-discovery pre-pass.
//!
//! The pre-pass does a fast token-level scan of source text before the main
//! parse, populating the symbol tables with everything the parser needs to
//! resolve identifiers:
//!
//! - named namespaces (with their constant pools),
//! - `const var` identifiers (installed as `undeclared` placeholders),
//! - `register_var` slots,
//! - inline-function signatures,
//! - and, recursively, the contents of `include(…)`d files.
//!
//! `extern "C"` blocks are skipped wholesale; they are handled by the main
//! parse.  No AST is built here.

use std::collections::HashSet;

use crate::error::PrestoResult;
use crate::include::SourceProvider;
use crate::parser::lexer::{TokenIterator, TokenKind};
use crate::parser::symbols::{
    undeclared_sentinel, InlineFunction, NamedLocation, NamespaceId, SymbolTables,
};
use crate::value::Value;

/// Runs the pre-pass over `code`, mutating `tables`.
///
/// Includes are resolved through `provider` and scanned depth-first.  A file
/// included twice within one run is an error.
pub fn run_prepass(
    code: &str,
    external_file: &str,
    tables: &mut SymbolTables,
    provider: &dyn SourceProvider,
) -> PrestoResult<()> {
    let mut included = HashSet::new();
    prepass_source(code, external_file, tables, provider, &mut included)
}

fn prepass_source(
    code: &str,
    external_file: &str,
    tables: &mut SymbolTables,
    provider: &dyn SourceProvider,
    included: &mut HashSet<String>,
) -> PrestoResult<()> {
    if code.is_empty() {
        return Ok(());
    }

    let mut it = TokenIterator::new(code, external_file)?;
    let mut current = NamespaceId::Root;
    let mut brace_depth: i32 = 0;
    // Pending `const var` identifiers, flushed into the current namespace's
    // constant pool when it closes (or at EOF for the root).
    let mut pending_consts: Vec<String> = Vec::new();

    while it.current_type != TokenKind::Eof {
        match it.current_type {
            TokenKind::Namespace => {
                if current != NamespaceId::Root {
                    return Err(it
                        .location
                        .error_symbol("Nesting of namespaces is not allowed"));
                }
                flush_pending(tables, current, &mut pending_consts);
                it.match_token(TokenKind::Namespace)?;
                if it.current_type != TokenKind::Identifier {
                    return Err(it
                        .location
                        .error_parse("Expected identifier after 'namespace'"));
                }
                let name = it.current_string();
                if tables.find_namespace(&name).is_some() {
                    return Err(it
                        .location
                        .error_symbol(format!("Duplicate namespace {name}")));
                }
                current = tables.add_namespace(&name);
                it.match_token(TokenKind::Identifier)?;
            }

            // `extern "C" { … }` is resolved by the main parse; skip the
            // whole braced block here.
            TokenKind::Extern => {
                it.skip()?;
                let mut depth: i32 = 0;
                loop {
                    match it.current_type {
                        TokenKind::Eof => break,
                        TokenKind::OpenBrace => {
                            depth += 1;
                            it.skip()?;
                        }
                        TokenKind::CloseBrace => {
                            depth -= 1;
                            it.skip()?;
                            if depth <= 0 {
                                break;
                            }
                        }
                        _ => it.skip()?,
                    }
                }
            }

            TokenKind::Include => {
                it.match_token(TokenKind::Include)?;
                it.match_token(TokenKind::OpenParen)?;
                let argument = it.current_string();
                let resolved = provider
                    .resolve(&argument)
                    .map_err(|msg| it.location.error_include(msg))?;
                if !resolved.text.is_empty() {
                    if included.contains(&resolved.canonical_name) {
                        return Err(it.location.error_include(format!(
                            "File {} was included multiple times",
                            resolved.canonical_name
                        )));
                    }
                    included.insert(resolved.canonical_name.clone());
                    prepass_source(
                        &resolved.text,
                        &resolved.canonical_name,
                        tables,
                        provider,
                        included,
                    )?;
                }
                // The literal and the closing paren fall through to the
                // catch-all skip below.
            }

            TokenKind::OpenBrace => {
                brace_depth += 1;
                it.skip()?;
            }

            TokenKind::CloseBrace => {
                brace_depth -= 1;
                it.skip()?;
                if brace_depth == 0 && current != NamespaceId::Root {
                    flush_pending(tables, current, &mut pending_consts);
                    current = NamespaceId::Root;
                }
            }

            TokenKind::Inline => {
                it.skip()?;
                prepass_inline_function(&mut it, tables, current)?;
            }

            TokenKind::RegisterVar => {
                it.skip()?;
                prepass_register_var(&mut it, tables, current)?;
            }

            TokenKind::Const => {
                it.match_token(TokenKind::Const)?;
                it.match_if(TokenKind::Var)?;

                let expected_depth = match current {
                    NamespaceId::Root => 0,
                    NamespaceId::Named(_) => 1,
                };
                if brace_depth != expected_depth {
                    return Err(it
                        .location
                        .error_const("const var declaration must be on global level"));
                }
                if it.current_type != TokenKind::Identifier {
                    return Err(it
                        .location
                        .error_parse("Expected identifier for const var declaration"));
                }
                let name = it.current_string();
                let ns = tables.namespace(current);
                if pending_consts.contains(&name) || ns.const_objects.contains_key(&name) {
                    return Err(it
                        .location
                        .error_symbol("Duplicate const var declaration"));
                }
                let location = NamedLocation::from_location(&it.location);
                pending_consts.push(name);
                tables.namespace_mut(current).const_locations.push(location);
                it.match_token(TokenKind::Identifier)?;
            }

            _ => it.skip()?,
        }
    }

    if current != NamespaceId::Root {
        return Err(it.location.error_parse("Parsing error (open namespace)"));
    }
    flush_pending(tables, current, &mut pending_consts);

    debug_assert_eq!(
        tables.namespace(current).const_objects.len(),
        tables.namespace(current).const_locations.len()
    );
    Ok(())
}

/// Installs the pending const identifiers into `ns` as `undeclared`
/// placeholders.
fn flush_pending(tables: &mut SymbolTables, ns: NamespaceId, pending: &mut Vec<String>) {
    let pool = &mut tables.namespace_mut(ns).const_objects;
    for id in pending.drain(..) {
        pool.insert(id, undeclared_sentinel());
    }
}

/// `inline function <name>(a, b, …)` — records the signature; the body is
/// skipped here and parsed by the main pass.
fn prepass_inline_function(
    it: &mut TokenIterator,
    tables: &mut SymbolTables,
    current: NamespaceId,
) -> PrestoResult<()> {
    let location = NamedLocation::from_location(&it.location);
    it.match_token(TokenKind::Function)?;
    if it.current_type != TokenKind::Identifier {
        return Err(it
            .location
            .error_parse("Expected identifier for inline function"));
    }
    let name = it.current_string();
    it.match_token(TokenKind::Identifier)?;
    it.match_token(TokenKind::OpenParen)?;

    let mut parameters = Vec::new();
    while it.current_type != TokenKind::CloseParen {
        parameters.push(it.current_string());
        it.match_token(TokenKind::Identifier)?;
        if it.current_type != TokenKind::CloseParen {
            it.match_token(TokenKind::Comma)?;
        }
    }
    it.match_token(TokenKind::CloseParen)?;

    tables
        .namespace_mut(current)
        .inline_functions
        .push(InlineFunction::new(name, parameters, location));
    it.match_if(TokenKind::Semicolon)?;
    Ok(())
}

/// `register_var <name>` — claims a register slot and records its location.
fn prepass_register_var(
    it: &mut TokenIterator,
    tables: &mut SymbolTables,
    current: NamespaceId,
) -> PrestoResult<()> {
    if it.current_type != TokenKind::Identifier {
        return Err(it
            .location
            .error_parse("Expected identifier for register variable"));
    }
    let name = it.current_string();
    let location = NamedLocation::from_location(&it.location);

    let ns = tables.namespace_mut(current);
    if ns.var_register.get_register_index(&name).is_some() {
        return Err(it
            .location
            .error_symbol("Duplicate register_var declaration"));
    }
    if ns
        .var_register
        .add_register(&name, Value::Undefined)
        .is_none()
    {
        return Err(it.location.error_symbol("Register limit reached"));
    }
    ns.register_locations.push(location);
    debug_assert_eq!(
        ns.register_locations.len(),
        ns.var_register.num_used_registers()
    );

    it.match_token(TokenKind::Identifier)?;
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::include::EmbeddedCollectionProvider;

    fn prepass(code: &str) -> PrestoResult<SymbolTables> {
        prepass_with(code, EmbeddedCollectionProvider::new())
    }

    fn prepass_with(
        code: &str,
        provider: EmbeddedCollectionProvider,
    ) -> PrestoResult<SymbolTables> {
        let mut tables = SymbolTables::new();
        run_prepass(code, "", &mut tables, &provider)?;
        Ok(tables)
    }

    // ── Constants ────────────────────────────────────────────────────────────

    #[test]
    fn test_root_consts_are_registered_as_undeclared() {
        let tables = prepass("const var A = 1; const var B = 2;").unwrap();
        assert_eq!(tables.root.const_objects.len(), 2);
        assert_eq!(tables.root.get_const_index("A"), Some(0));
        assert_eq!(tables.root.get_const_index("B"), Some(1));
        assert_eq!(
            tables.root.const_objects.get("A"),
            Some(&undeclared_sentinel())
        );
        assert_eq!(tables.root.const_locations.len(), 2);
    }

    #[test]
    fn test_const_without_var_keyword() {
        let tables = prepass("const PI = 3.14;").unwrap();
        assert_eq!(tables.root.get_const_index("PI"), Some(0));
    }

    #[test]
    fn test_duplicate_const_fails() {
        let err = prepass("const var A = 1; const var A = 2;").unwrap_err();
        assert!(err.message().contains("Duplicate const var declaration"));
    }

    #[test]
    fn test_const_inside_braces_fails() {
        let err = prepass("{ const var A = 1; }").unwrap_err();
        assert!(err.message().contains("global level"));
    }

    #[test]
    fn test_const_missing_identifier_fails() {
        let err = prepass("const var = 1;").unwrap_err();
        assert!(err.message().contains("Expected identifier"));
    }

    // ── Namespaces ───────────────────────────────────────────────────────────

    #[test]
    fn test_namespace_collects_its_consts() {
        let tables = prepass("namespace A { const var k = 1; } const var r = 2;").unwrap();
        let ns = tables.namespace(tables.find_namespace("A").unwrap());
        assert_eq!(ns.get_const_index("k"), Some(0));
        assert_eq!(tables.root.get_const_index("r"), Some(0));
        assert_eq!(tables.root.get_const_index("k"), None);
    }

    #[test]
    fn test_nested_namespace_fails() {
        let err = prepass("namespace A { namespace B { } }").unwrap_err();
        assert!(err.message().contains("Nesting of namespaces is not allowed"));
    }

    #[test]
    fn test_duplicate_namespace_fails() {
        let err = prepass("namespace A { } namespace A { }").unwrap_err();
        assert!(err.message().contains("Duplicate namespace A"));
    }

    #[test]
    fn test_unclosed_namespace_fails() {
        let err = prepass("namespace A { const var k = 1;").unwrap_err();
        assert!(err.message().contains("open namespace"));
    }

    #[test]
    fn test_const_in_namespace_nested_block_fails() {
        let err = prepass("namespace A { { const var k = 1; } }").unwrap_err();
        assert!(err.message().contains("global level"));
    }

    // ── Registers ────────────────────────────────────────────────────────────

    #[test]
    fn test_register_var_registration() {
        let tables = prepass("register_var counter; register_var gain;").unwrap();
        assert_eq!(tables.root.var_register.num_used_registers(), 2);
        assert_eq!(tables.root.var_register.get_register_index("gain"), Some(1));
        assert_eq!(
            tables.root.register_locations.len(),
            tables.root.var_register.num_used_registers()
        );
    }

    #[test]
    fn test_register_var_in_namespace() {
        let tables = prepass("namespace A { register_var x; }").unwrap();
        let ns = tables.namespace(tables.find_namespace("A").unwrap());
        assert_eq!(ns.var_register.get_register_index("x"), Some(0));
        assert_eq!(tables.root.var_register.num_used_registers(), 0);
    }

    #[test]
    fn test_duplicate_register_var_fails() {
        let err = prepass("register_var x; register_var x;").unwrap_err();
        assert!(err.message().contains("Duplicate register_var"));
    }

    // ── Inline functions ─────────────────────────────────────────────────────

    #[test]
    fn test_inline_function_signature() {
        let tables = prepass("inline function add(a, b) { return a + b; }").unwrap();
        assert_eq!(tables.root.inline_functions.len(), 1);
        let f = &tables.root.inline_functions[0];
        assert_eq!(f.name, "add");
        assert_eq!(f.parameter_names, vec!["a", "b"]);
        assert!(f.body.is_none());
    }

    #[test]
    fn test_inline_function_in_namespace() {
        let tables = prepass("namespace M { inline function id(x) { return x; } }").unwrap();
        let ns = tables.namespace(tables.find_namespace("M").unwrap());
        assert_eq!(ns.get_inline_function_index("id"), Some(0));
        assert_eq!(tables.root.get_inline_function_index("id"), None);
    }

    #[test]
    fn test_inline_function_records_location() {
        // The location points at the `function` keyword.
        let tables = prepass("\n inline function f() {}").unwrap();
        assert_eq!(tables.root.inline_functions[0].location.char_number, 9);
    }

    // ── extern blocks ────────────────────────────────────────────────────────

    #[test]
    fn test_extern_block_is_skipped() {
        // The const inside the extern body must not be registered.
        let tables =
            prepass("extern \"C\" { var f(var a) { const int x = 1; } } const var A = 1;").unwrap();
        assert_eq!(tables.root.const_objects.len(), 1);
        assert_eq!(tables.root.get_const_index("A"), Some(0));
    }

    // ── Includes ─────────────────────────────────────────────────────────────

    #[test]
    fn test_include_is_prepassed_recursively() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("lib.js", "const var FROM_LIB = 1; register_var r;");
        let tables = prepass_with("include(\"lib.js\"); const var LOCAL = 2;", provider).unwrap();
        assert_eq!(tables.root.get_const_index("FROM_LIB"), Some(0));
        assert_eq!(tables.root.get_const_index("LOCAL"), Some(1));
        assert_eq!(tables.root.var_register.num_used_registers(), 1);
    }

    #[test]
    fn test_self_include_fails() {
        let mut provider = EmbeddedCollectionProvider::new();
        provider.insert("a.js", "include(\"a.js\");");
        let err = prepass_with("include(\"a.js\");", provider).unwrap_err();
        assert!(err.message().contains("included multiple times"));
        assert_eq!(err.position().file, "a.js");
    }

    #[test]
    fn test_missing_include_is_noop() {
        // The embedded collection resolves unknown names to empty text.
        let tables = prepass("include(\"unknown.js\"); const var A = 1;").unwrap();
        assert_eq!(tables.root.const_objects.len(), 1);
    }

    // ── Agreement invariants ─────────────────────────────────────────────────

    #[test]
    fn test_counts_agree_with_declarations() {
        let src = r#"
            const var A = 1;
            register_var r1;
            inline function f1(x) { return x; }
            namespace N {
                const var B = 2;
                const var C = 3;
                register_var r2;
                inline function f2() {}
            }
        "#;
        let tables = prepass(src).unwrap();
        assert_eq!(tables.root.const_objects.len(), 1);
        assert_eq!(tables.root.var_register.num_used_registers(), 1);
        assert_eq!(tables.root.inline_functions.len(), 1);
        let ns = tables.namespace(tables.find_namespace("N").unwrap());
        assert_eq!(ns.const_objects.len(), 2);
        assert_eq!(ns.const_locations.len(), 2);
        assert_eq!(ns.var_register.num_used_registers(), 1);
        assert_eq!(ns.register_locations.len(), 1);
        assert_eq!(ns.inline_functions.len(), 1);
    }
}
