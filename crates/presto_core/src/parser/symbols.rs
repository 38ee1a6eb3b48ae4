//! Symbol tables for the presto front-end.
//!
//! One [`SymbolTables`] aggregate exists per engine instance.  It is populated
//! by host registrations (callbacks, API classes, globals) and by the pre-pass
//! (namespaces, constants, register-variables, inline-function signatures),
//! then read by the main parse to resolve every identifier into a concrete
//! AST variant.
//!
//! Uniqueness across storage kinds is enforced by a single gate,
//! [`SymbolTables::check_if_exists_in_other_storage`], called from every
//! declaration site.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use crate::error::PrestoResult;
use crate::parser::ast::Statement;
use crate::parser::lexer::CodeLocation;
use crate::value::Value;

/// Number of typed register slots per namespace.
pub const NUM_VAR_REGISTERS: usize = 32;

/// Sentinel stored in a const slot by the pre-pass, before the declaration
/// statement has been parsed.
pub fn undeclared_sentinel() -> Value {
    Value::Str("undeclared".into())
}

/// Sentinel stored in a const slot once its declaration has been parsed but
/// not yet executed.
pub fn uninitialised_sentinel() -> Value {
    Value::Str("uninitialised".into())
}

// ─────────────────────────────────────────────────────────────────────────────
// Locations and identifiers
// ─────────────────────────────────────────────────────────────────────────────

/// File name + byte offset of a declaration, recorded for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedLocation {
    /// Name of the included file, or empty for top-level source.
    pub file_name: String,
    /// Byte offset of the declaration within its source buffer.
    pub char_number: usize,
}

impl NamedLocation {
    /// Records the position of `location`.
    pub fn from_location(location: &CodeLocation) -> Self {
        Self {
            file_name: location.file_name().to_owned(),
            char_number: location.offset,
        }
    }
}

/// Stable reference to a namespace: the root, or an index into
/// [`SymbolTables::namespaces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceId {
    /// The root namespace.
    Root,
    /// A named namespace, by index.
    Named(usize),
}

// ─────────────────────────────────────────────────────────────────────────────
// VarRegister
// ─────────────────────────────────────────────────────────────────────────────

/// Fixed-slot typed register file.
///
/// Registers are addressed by name at declaration time and by index
/// afterwards; the index of a register never changes.
#[derive(Debug, Default)]
pub struct VarRegister {
    ids: Vec<String>,
    values: Vec<Value>,
}

impl VarRegister {
    /// Appends a register slot for `id`, returning its index, or `None` when
    /// all [`NUM_VAR_REGISTERS`] slots are in use.
    pub fn add_register(&mut self, id: &str, initial: Value) -> Option<usize> {
        if let Some(index) = self.get_register_index(id) {
            return Some(index);
        }
        if self.ids.len() >= NUM_VAR_REGISTERS {
            return None;
        }
        self.ids.push(id.to_owned());
        self.values.push(initial);
        Some(self.ids.len() - 1)
    }

    /// Index of the register named `id`, if declared.
    pub fn get_register_index(&self, id: &str) -> Option<usize> {
        self.ids.iter().position(|r| r == id)
    }

    /// The name of the register at `index`.
    pub fn get_register_id(&self, index: usize) -> &str {
        &self.ids[index]
    }

    /// Current value of the register at `index`.
    pub fn get(&self, index: usize) -> &Value {
        &self.values[index]
    }

    /// Writes the register at `index`.
    pub fn set(&mut self, index: usize, value: Value) {
        self.values[index] = value;
    }

    /// Number of slots in use.
    pub fn num_used_registers(&self) -> usize {
        self.ids.len()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Inline functions
// ─────────────────────────────────────────────────────────────────────────────

/// A named callable whose signature is registered by the pre-pass and whose
/// body is installed by the main parse.
#[derive(Debug)]
pub struct InlineFunction {
    /// Function name.
    pub name: String,
    /// Parameter names in declaration order.
    pub parameter_names: Vec<String>,
    /// `local var` properties declared inside the body.
    pub local_properties: IndexMap<String, Value>,
    /// The parsed body, installed by the main parse.
    pub body: Option<Statement>,
    /// Doc-comment attached to the declaration.
    pub comment_doc: String,
    /// Declaration site.
    pub location: NamedLocation,
}

impl InlineFunction {
    /// Creates a signature-only entry (the pre-pass registration).
    pub fn new(name: String, parameter_names: Vec<String>, location: NamedLocation) -> Self {
        Self {
            name,
            parameter_names,
            local_properties: IndexMap::new(),
            body: None,
            comment_doc: String::new(),
            location,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Namespace
// ─────────────────────────────────────────────────────────────────────────────

/// A named container of constants, register-variables, and inline functions.
///
/// The root namespace has `id == None`.  Namespaces never nest.
#[derive(Debug, Default)]
pub struct Namespace {
    /// Namespace name, or `None` for the root.
    pub id: Option<String>,
    /// Constant pool; insertion order defines each constant's slot index.
    pub const_objects: IndexMap<String, Value>,
    /// Declaration sites of the constants, index-parallel to `const_objects`.
    pub const_locations: Vec<NamedLocation>,
    /// The typed register file.
    pub var_register: VarRegister,
    /// Declaration sites of the registers, index-parallel to the register
    /// file.
    pub register_locations: Vec<NamedLocation>,
    /// Inline functions declared in this namespace.
    pub inline_functions: Vec<InlineFunction>,
}

impl Namespace {
    /// Creates a named namespace.
    pub fn named(id: String) -> Self {
        Self {
            id: Some(id),
            ..Self::default()
        }
    }

    /// Slot index of the constant named `id`, if present.
    pub fn get_const_index(&self, id: &str) -> Option<usize> {
        self.const_objects.get_index_of(id)
    }

    /// Index of the inline function named `id`, if present.
    pub fn get_inline_function_index(&self, id: &str) -> Option<usize> {
        self.inline_functions.iter().position(|f| f.name == id)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Host-registered objects
// ─────────────────────────────────────────────────────────────────────────────

/// A method entry on an [`ApiClass`]: dispatch index plus fixed arity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiMethod {
    /// Host dispatch index.
    pub index: usize,
    /// Expected argument count.
    pub num_args: usize,
}

/// A host-provided class exposing named constants and index-dispatched
/// methods.
#[derive(Debug, Default)]
pub struct ApiClass {
    /// Class name as referenced from scripts.
    pub name: String,
    /// Named constants.
    pub constants: IndexMap<String, Value>,
    /// Named methods.
    pub methods: IndexMap<String, ApiMethod>,
}

impl ApiClass {
    /// Creates an empty API class.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds a named constant.
    pub fn with_constant(mut self, name: impl Into<String>, value: Value) -> Self {
        self.constants.insert(name.into(), value);
        self
    }

    /// Adds a method with its dispatch index and arity.
    pub fn with_method(mut self, name: impl Into<String>, index: usize, num_args: usize) -> Self {
        self.methods.insert(name.into(), ApiMethod { index, num_args });
        self
    }

    /// Value of the constant named `id`, if present.
    pub fn get_constant(&self, id: &str) -> Option<&Value> {
        self.constants.get(id)
    }

    /// Method entry named `id`, if present.
    pub fn get_method(&self, id: &str) -> Option<ApiMethod> {
        self.methods.get(id).copied()
    }
}

/// An `extern "C"` function: verbatim source captured for the external
/// back-end.
#[derive(Debug)]
pub struct ExternalCFunction {
    /// Function name.
    pub name: String,
    /// `false` when declared `void`.
    pub has_return_type: bool,
    /// Argument names in declaration order.
    pub arguments: Vec<String>,
    /// The raw C source of the body.
    pub code: String,
    /// Doc-comment attached to the declaration.
    pub comment_doc: String,
}

/// A host-registered named entry point with fixed arity.
///
/// The parameter names and the body are filled in by the parser when it
/// encounters `function <name>(…) { … }` for a registered callback.
#[derive(Debug)]
pub struct Callback {
    /// Callback name.
    pub name: String,
    /// Fixed parameter count.
    pub num_args: usize,
    /// Parameter names, filled by the parser.
    pub parameters: Vec<String>,
    /// Parameter value slots, written by the host before each invocation.
    pub parameter_values: Vec<Value>,
    /// `local var` properties declared inside the body.
    pub local_properties: IndexMap<String, Value>,
    /// The parsed body.
    pub body: Option<Statement>,
}

impl Callback {
    /// Creates an unparsed callback with `num_args` parameters.
    pub fn new(name: impl Into<String>, num_args: usize) -> Self {
        Self {
            name: name.into(),
            num_args,
            parameters: Vec::new(),
            parameter_values: vec![Value::Undefined; num_args],
            local_properties: IndexMap::new(),
            body: None,
        }
    }

    /// Index of the parameter named `id`, if the body has been parsed.
    pub fn get_parameter_index(&self, id: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p == id)
    }
}

/// An entry in the engine's included-file set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedFile {
    /// Canonical reference name returned by the include loader.
    pub canonical_name: String,
    /// Error message attached when a parse inside the file failed.
    pub error_message: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Uniqueness gate
// ─────────────────────────────────────────────────────────────────────────────

/// The storage kind a declaration site is about to claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariableStorageType {
    /// A root-level `var`.
    RootScope,
    /// A `const var`.
    ConstVariables,
    /// A `register_var`.
    Register,
    /// A `local var` inside an inline function or callback.
    LocalScope,
}

/// Where an identifier was found by the existing-storage probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExistingStorage {
    RootScope,
    ConstVariables,
    Register,
    Globals,
    ApiClass,
    InlineFunction,
    ExternalC,
    NamespaceName,
}

// ─────────────────────────────────────────────────────────────────────────────
// SymbolTables
// ─────────────────────────────────────────────────────────────────────────────

/// The per-engine symbol-table aggregate.
#[derive(Debug, Default)]
pub struct SymbolTables {
    /// The root namespace.
    pub root: Namespace,
    /// Named namespaces, referenced by [`NamespaceId::Named`].
    pub namespaces: Vec<Namespace>,
    /// The unordered global property bag shared across scripts.
    pub globals: HashMap<String, Value>,
    /// Host-registered API classes.
    pub api_classes: Vec<ApiClass>,
    /// Captured `extern "C"` functions.
    pub external_c_functions: Vec<ExternalCFunction>,
    /// Host-registered callbacks.
    pub callbacks: Vec<Callback>,
    /// Files loaded through the include mechanism, in load order.
    pub included_files: Vec<IncludedFile>,
    /// Root-level `var` names seen by the parser.
    root_variable_names: HashSet<String>,
}

impl SymbolTables {
    /// Creates empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    // ── Namespaces ──────────────────────────────────────────────────────────

    /// The namespace referenced by `id`.
    pub fn namespace(&self, id: NamespaceId) -> &Namespace {
        match id {
            NamespaceId::Root => &self.root,
            NamespaceId::Named(i) => &self.namespaces[i],
        }
    }

    /// Mutable access to the namespace referenced by `id`.
    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut Namespace {
        match id {
            NamespaceId::Root => &mut self.root,
            NamespaceId::Named(i) => &mut self.namespaces[i],
        }
    }

    /// Looks up a named namespace.
    pub fn find_namespace(&self, name: &str) -> Option<NamespaceId> {
        self.namespaces
            .iter()
            .position(|ns| ns.id.as_deref() == Some(name))
            .map(NamespaceId::Named)
    }

    /// Appends a new named namespace and returns its id.
    pub fn add_namespace(&mut self, name: &str) -> NamespaceId {
        self.namespaces.push(Namespace::named(name.to_owned()));
        NamespaceId::Named(self.namespaces.len() - 1)
    }

    // ── Host registrations ──────────────────────────────────────────────────

    /// Registers a callback entry point with fixed arity.
    pub fn register_callback(&mut self, name: impl Into<String>, num_args: usize) {
        self.callbacks.push(Callback::new(name, num_args));
    }

    /// Registers an API class.
    pub fn register_api_class(&mut self, class: ApiClass) {
        self.api_classes.push(class);
    }

    /// Writes a global property (creating it if absent).
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.insert(name.into(), value);
    }

    // ── Lookups ─────────────────────────────────────────────────────────────

    /// Index of the callback named `id`, if registered.
    pub fn get_callback_index(&self, id: &str) -> Option<usize> {
        self.callbacks.iter().position(|c| c.name == id)
    }

    /// Index of the API class named `id`, if registered.
    pub fn get_api_class_index(&self, id: &str) -> Option<usize> {
        self.api_classes.iter().position(|c| c.name == id)
    }

    /// Index of the external C function named `id`, if captured.
    pub fn get_external_c_index(&self, id: &str) -> Option<usize> {
        self.external_c_functions.iter().position(|f| f.name == id)
    }

    /// Marks a root-level `var` name as declared.
    pub fn add_root_variable(&mut self, name: &str) {
        self.root_variable_names.insert(name.to_owned());
    }

    // ── Included files ──────────────────────────────────────────────────────

    /// `true` when `canonical_name` has already been loaded this run.
    pub fn is_file_included(&self, canonical_name: &str) -> bool {
        self.included_files
            .iter()
            .any(|f| f.canonical_name == canonical_name)
    }

    /// Appends an included-file entry.
    pub fn add_included_file(&mut self, canonical_name: impl Into<String>) {
        self.included_files.push(IncludedFile {
            canonical_name: canonical_name.into(),
            error_message: None,
        });
    }

    /// Attaches an error message to the most recently included file.
    pub fn set_last_include_error(&mut self, message: impl Into<String>) {
        if let Some(last) = self.included_files.last_mut() {
            last.error_message = Some(message.into());
        }
    }

    // ── Uniqueness gate ─────────────────────────────────────────────────────

    /// Fails when `id` is already present in a storage other than `kind`.
    ///
    /// This is the single check every declaration site goes through.  A const
    /// slot still holding the pre-pass `undeclared` sentinel does not count as
    /// existing: its declaration statement has not been reached yet, so the
    /// conflict is reported there instead.
    pub fn check_if_exists_in_other_storage(
        &self,
        kind: VariableStorageType,
        id: &str,
        location: &CodeLocation,
    ) -> PrestoResult<()> {
        let Some(existing) = self.existing_storage(id) else {
            return Ok(());
        };
        let same = matches!(
            (kind, existing),
            (VariableStorageType::RootScope, ExistingStorage::RootScope)
                | (VariableStorageType::ConstVariables, ExistingStorage::ConstVariables)
                | (VariableStorageType::Register, ExistingStorage::Register)
        );
        if same {
            return Ok(());
        }
        Err(location.error_symbol(format!(
            "The identifier \"{id}\" already exists in other storage"
        )))
    }

    fn existing_storage(&self, id: &str) -> Option<ExistingStorage> {
        if self.root_variable_names.contains(id) {
            return Some(ExistingStorage::RootScope);
        }
        if let Some(value) = self.root.const_objects.get(id) {
            if *value != undeclared_sentinel() {
                return Some(ExistingStorage::ConstVariables);
            }
        }
        if self.root.var_register.get_register_index(id).is_some() {
            return Some(ExistingStorage::Register);
        }
        if self.globals.contains_key(id) {
            return Some(ExistingStorage::Globals);
        }
        if self.get_api_class_index(id).is_some() {
            return Some(ExistingStorage::ApiClass);
        }
        if self.root.get_inline_function_index(id).is_some() {
            return Some(ExistingStorage::InlineFunction);
        }
        if self.get_external_c_index(id).is_some() {
            return Some(ExistingStorage::ExternalC);
        }
        if self.find_namespace(id).is_some() {
            return Some(ExistingStorage::NamespaceName);
        }
        None
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::TokenIterator;

    fn location() -> CodeLocation {
        TokenIterator::new("x", "").unwrap().location
    }

    // ── VarRegister ──────────────────────────────────────────────────────────

    #[test]
    fn test_register_indices_are_stable() {
        let mut reg = VarRegister::default();
        assert_eq!(reg.add_register("a", Value::Undefined), Some(0));
        assert_eq!(reg.add_register("b", Value::Undefined), Some(1));
        assert_eq!(reg.add_register("a", Value::Undefined), Some(0));
        assert_eq!(reg.get_register_index("b"), Some(1));
        assert_eq!(reg.num_used_registers(), 2);
    }

    #[test]
    fn test_register_capacity() {
        let mut reg = VarRegister::default();
        for i in 0..NUM_VAR_REGISTERS {
            assert!(reg.add_register(&format!("r{i}"), Value::Undefined).is_some());
        }
        assert_eq!(reg.add_register("overflow", Value::Undefined), None);
    }

    #[test]
    fn test_register_read_write() {
        let mut reg = VarRegister::default();
        let i = reg.add_register("x", Value::Undefined).unwrap();
        reg.set(i, Value::Int(9));
        assert_eq!(reg.get(i), &Value::Int(9));
        assert_eq!(reg.get_register_id(i), "x");
    }

    // ── Namespaces ───────────────────────────────────────────────────────────

    #[test]
    fn test_namespace_lookup() {
        let mut tables = SymbolTables::new();
        let id = tables.add_namespace("Math");
        assert_eq!(tables.find_namespace("Math"), Some(id));
        assert_eq!(tables.find_namespace("Other"), None);
        assert_eq!(tables.namespace(id).id.as_deref(), Some("Math"));
    }

    #[test]
    fn test_const_slot_indices_follow_insertion_order() {
        let mut ns = Namespace::default();
        ns.const_objects.insert("A".into(), undeclared_sentinel());
        ns.const_objects.insert("B".into(), undeclared_sentinel());
        assert_eq!(ns.get_const_index("A"), Some(0));
        assert_eq!(ns.get_const_index("B"), Some(1));
    }

    // ── Uniqueness gate ──────────────────────────────────────────────────────

    #[test]
    fn test_gate_allows_fresh_identifier() {
        let tables = SymbolTables::new();
        assert!(tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, "x", &location())
            .is_ok());
    }

    #[test]
    fn test_gate_rejects_var_over_register() {
        let mut tables = SymbolTables::new();
        tables.root.var_register.add_register("r", Value::Undefined);
        let err = tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, "r", &location())
            .unwrap_err();
        assert!(err.message().contains("already exists in other storage"));
    }

    #[test]
    fn test_gate_rejects_const_over_root_var() {
        let mut tables = SymbolTables::new();
        tables.add_root_variable("v");
        assert!(tables
            .check_if_exists_in_other_storage(
                VariableStorageType::ConstVariables,
                "v",
                &location()
            )
            .is_err());
    }

    #[test]
    fn test_gate_ignores_undeclared_const_sentinel() {
        // The pre-pass installs const ids before the parse reaches the `var`
        // statement; those placeholders must not block an unrelated root var.
        let mut tables = SymbolTables::new();
        tables
            .root
            .const_objects
            .insert("PI".into(), undeclared_sentinel());
        assert!(tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, "PI", &location())
            .is_ok());
        tables
            .root
            .const_objects
            .insert("PI".into(), uninitialised_sentinel());
        assert!(tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, "PI", &location())
            .is_err());
    }

    #[test]
    fn test_gate_rejects_local_over_any_storage() {
        let mut tables = SymbolTables::new();
        tables.set_global("g", Value::Int(1));
        assert!(tables
            .check_if_exists_in_other_storage(VariableStorageType::LocalScope, "g", &location())
            .is_err());
    }

    #[test]
    fn test_gate_same_storage_is_allowed() {
        let mut tables = SymbolTables::new();
        tables.add_root_variable("v");
        assert!(tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, "v", &location())
            .is_ok());
    }

    // ── Included files ───────────────────────────────────────────────────────

    #[test]
    fn test_included_file_membership() {
        let mut tables = SymbolTables::new();
        assert!(!tables.is_file_included("a.js"));
        tables.add_included_file("a.js");
        assert!(tables.is_file_included("a.js"));
        tables.set_last_include_error("boom");
        assert_eq!(
            tables.included_files[0].error_message.as_deref(),
            Some("boom")
        );
    }

    // ── Callbacks and API classes ────────────────────────────────────────────

    #[test]
    fn test_callback_registration() {
        let mut tables = SymbolTables::new();
        tables.register_callback("onNoteOn", 2);
        let i = tables.get_callback_index("onNoteOn").unwrap();
        assert_eq!(tables.callbacks[i].num_args, 2);
        assert_eq!(tables.callbacks[i].parameter_values.len(), 2);
    }

    #[test]
    fn test_api_class_members() {
        let class = ApiClass::new("Math")
            .with_constant("PI", Value::Double(std::f64::consts::PI))
            .with_method("max", 4, 2);
        assert!(class.get_constant("PI").is_some());
        assert_eq!(class.get_method("max"), Some(ApiMethod { index: 4, num_args: 2 }));
        assert_eq!(class.get_method("missing"), None);
    }
}
