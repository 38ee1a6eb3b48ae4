//! AST node definitions for the presto scripting dialect.
//!
//! Two tagged sum types cover the tree: [`Statement`] and [`Expression`],
//! bridged by [`Statement::Expr`].  Every node owns its children and carries
//! its [`CodeLocation`]; references into the symbol tables use stable indices
//! ([`NamespaceId`] plus slot numbers), never pointers.

use smallvec::SmallVec;

use crate::parser::lexer::CodeLocation;
use crate::parser::symbols::NamespaceId;
use crate::value::Value;

/// Argument list of a call node.  Most call sites pass a handful of values.
pub type ArgumentList = SmallVec<[Expression; 2]>;

// ─────────────────────────────────────────────────────────────────────────────
// Operators
// ─────────────────────────────────────────────────────────────────────────────

/// The operator of a [`Expression::Binary`] node.
///
/// Compound assignments and the `++` / `--` forms reuse the `Add`, `Subtract`,
/// `LeftShift`, and `RightShift` members through
/// [`Expression::SelfAssignment`] / [`Expression::PostAssignment`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Subtract,
    /// `*`
    Multiply,
    /// `/`
    Divide,
    /// `%`
    Modulo,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `===`
    TypeEquals,
    /// `!==`
    TypeNotEquals,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `&&` (short-circuiting)
    LogicalAnd,
    /// `||` (short-circuiting)
    LogicalOr,
    /// `&`
    BitwiseAnd,
    /// `|`
    BitwiseOr,
    /// `^`
    BitwiseXor,
    /// `<<`
    LeftShift,
    /// `>>`
    RightShift,
    /// `>>>`
    RightShiftUnsigned,
}

// ─────────────────────────────────────────────────────────────────────────────
// Expressions
// ─────────────────────────────────────────────────────────────────────────────

/// An expression node.  Evaluating one produces a [`Value`].
#[derive(Debug, Clone)]
pub enum Expression {
    /// A literal value (`42`, `3.14`, `"text"`, `true`, `null`, `undefined`).
    Literal {
        /// Source location.
        loc: CodeLocation,
        /// The literal value.
        value: Value,
    },

    /// An identifier the parser could not resolve against any symbol table;
    /// the evaluator resolves it against the runtime scope chain.
    Unqualified {
        /// Source location.
        loc: CodeLocation,
        /// The identifier text.
        name: String,
    },

    /// The iterator variable of the enclosing for-in loop.
    IteratorName {
        /// Source location.
        loc: CodeLocation,
        /// The iterator identifier.
        name: String,
    },

    /// A reference to a constant slot in a namespace.
    ConstReference {
        /// Source location.
        loc: CodeLocation,
        /// Owning namespace.
        ns: NamespaceId,
        /// Slot index in the namespace's constant pool.
        index: usize,
    },

    /// A reference to a typed register slot.
    RegisterName {
        /// Source location.
        loc: CodeLocation,
        /// Owning namespace.
        ns: NamespaceId,
        /// Slot index in the namespace's register file.
        index: usize,
        /// The register name (kept for diagnostics).
        name: String,
    },

    /// A reference into the shared global property bag.
    GlobalReference {
        /// Source location.
        loc: CodeLocation,
        /// The global's name.
        name: String,
    },

    /// A parameter of the inline function currently being parsed.
    InlineParameterReference {
        /// Source location.
        loc: CodeLocation,
        /// Namespace owning the inline function.
        ns: NamespaceId,
        /// Index of the inline function within its namespace.
        function_index: usize,
        /// Parameter position.
        parameter_index: usize,
    },

    /// A `local var` property of the inline function currently being parsed.
    LocalReference {
        /// Source location.
        loc: CodeLocation,
        /// Namespace owning the inline function.
        ns: NamespaceId,
        /// Index of the inline function within its namespace.
        function_index: usize,
        /// The local property name.
        name: String,
    },

    /// A parameter of the callback currently being parsed.
    CallbackParameterReference {
        /// Source location.
        loc: CodeLocation,
        /// Index of the callback in the engine's callback list.
        callback_index: usize,
        /// Parameter position.
        parameter_index: usize,
    },

    /// A `local var` property of the callback currently being parsed.
    CallbackLocalReference {
        /// Source location.
        loc: CodeLocation,
        /// Index of the callback in the engine's callback list.
        callback_index: usize,
        /// The local property name.
        name: String,
    },

    /// A constant exposed by a host API class, resolved to its value at parse
    /// time.
    ApiConstant {
        /// Source location.
        loc: CodeLocation,
        /// The constant's value.
        value: Value,
    },

    /// A call to an API class method, dispatched by index.
    ApiCall {
        /// Source location.
        loc: CodeLocation,
        /// Index of the API class.
        class_index: usize,
        /// Host dispatch index of the method.
        function_index: usize,
        /// Argument expressions (arity-checked at parse time).
        arguments: Box<ArgumentList>,
    },

    /// A call to a pre-registered inline function.
    InlineCall {
        /// Source location.
        loc: CodeLocation,
        /// Namespace owning the inline function.
        ns: NamespaceId,
        /// Index of the inline function within its namespace.
        function_index: usize,
        /// Argument expressions (arity-checked at parse time).
        arguments: Box<ArgumentList>,
    },

    /// A call to a captured `extern "C"` function.
    ExternalCCall {
        /// Source location.
        loc: CodeLocation,
        /// Index into the engine's external-function list.
        function_index: usize,
        /// Argument expressions (arity-checked at parse time).
        arguments: Box<ArgumentList>,
    },

    /// A binary operation.  `&&` and `||` short-circuit; everything else is
    /// strict.
    Binary {
        /// Source location.
        loc: CodeLocation,
        /// The operator.
        op: BinaryOp,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },

    /// The ternary conditional `condition ? a : b`.
    Conditional {
        /// Source location.
        loc: CodeLocation,
        /// The tested condition.
        condition: Box<Expression>,
        /// Result when the condition is truthy.
        true_branch: Box<Expression>,
        /// Result when the condition is falsy.
        false_branch: Box<Expression>,
    },

    /// Plain assignment `target = value`.
    Assignment {
        /// Source location.
        loc: CodeLocation,
        /// Assignment target.
        target: Box<Expression>,
        /// Assigned value.
        value: Box<Expression>,
    },

    /// Compound assignment (`+=`, `-=`, `<<=`, `>>=`) and prefix `++` / `--`:
    /// `target = target op operand`, yielding the new value.
    SelfAssignment {
        /// Source location.
        loc: CodeLocation,
        /// The combining operator.
        op: BinaryOp,
        /// Assignment target (also the left operand).
        target: Box<Expression>,
        /// Right operand.
        operand: Box<Expression>,
    },

    /// Postfix `++` / `--`: like [`Expression::SelfAssignment`] but yielding
    /// the value the target held before the write.
    PostAssignment {
        /// Source location.
        loc: CodeLocation,
        /// The combining operator.
        op: BinaryOp,
        /// Assignment target.
        target: Box<Expression>,
        /// Right operand.
        operand: Box<Expression>,
    },

    /// A dynamic function call `object(arguments…)`.
    FunctionCall {
        /// Source location.
        loc: CodeLocation,
        /// The callee expression.
        object: Box<Expression>,
        /// Argument expressions.
        arguments: Box<ArgumentList>,
    },

    /// `new Name(.Member)*(arguments…)`.
    NewOperator {
        /// Source location.
        loc: CodeLocation,
        /// The constructor expression.
        object: Box<Expression>,
        /// Argument expressions.
        arguments: Box<ArgumentList>,
    },

    /// Member access `object.member`.
    DotOperator {
        /// Source location.
        loc: CodeLocation,
        /// The accessed object.
        object: Box<Expression>,
        /// Member name.
        member: String,
    },

    /// Subscript access `object[index]`.
    ArraySubscript {
        /// Source location.
        loc: CodeLocation,
        /// The accessed object.
        object: Box<Expression>,
        /// Index expression.
        index: Box<Expression>,
    },

    /// Object literal `{ key: value, … }`, insertion order preserved.
    ObjectLiteral {
        /// Source location.
        loc: CodeLocation,
        /// Key / initializer pairs in source order.
        properties: Vec<(String, Expression)>,
    },

    /// Array literal `[ a, b, … ]`.
    ArrayLiteral {
        /// Source location.
        loc: CodeLocation,
        /// Element expressions in source order.
        values: Vec<Expression>,
    },

    /// An anonymous `function (…) { … }` expression.
    AnonymousFunction {
        /// Source location.
        loc: CodeLocation,
        /// Parameter names.
        parameters: Vec<String>,
        /// The function body.
        body: Box<Statement>,
        /// Verbatim source text of the definition.
        source: String,
        /// Doc-comment preceding the definition.
        comment_doc: String,
    },
}

impl Expression {
    /// Source location of this expression.
    pub fn location(&self) -> &CodeLocation {
        match self {
            Expression::Literal { loc, .. }
            | Expression::Unqualified { loc, .. }
            | Expression::IteratorName { loc, .. }
            | Expression::ConstReference { loc, .. }
            | Expression::RegisterName { loc, .. }
            | Expression::GlobalReference { loc, .. }
            | Expression::InlineParameterReference { loc, .. }
            | Expression::LocalReference { loc, .. }
            | Expression::CallbackParameterReference { loc, .. }
            | Expression::CallbackLocalReference { loc, .. }
            | Expression::ApiConstant { loc, .. }
            | Expression::ApiCall { loc, .. }
            | Expression::InlineCall { loc, .. }
            | Expression::ExternalCCall { loc, .. }
            | Expression::Binary { loc, .. }
            | Expression::Conditional { loc, .. }
            | Expression::Assignment { loc, .. }
            | Expression::SelfAssignment { loc, .. }
            | Expression::PostAssignment { loc, .. }
            | Expression::FunctionCall { loc, .. }
            | Expression::NewOperator { loc, .. }
            | Expression::DotOperator { loc, .. }
            | Expression::ArraySubscript { loc, .. }
            | Expression::ObjectLiteral { loc, .. }
            | Expression::ArrayLiteral { loc, .. }
            | Expression::AnonymousFunction { loc, .. } => loc,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Statements
// ─────────────────────────────────────────────────────────────────────────────

/// `{ statements }` — also the root node of every parsed script.
///
/// Lock statements are hoisted out of `statements` into `lock_statements`:
/// they guard the whole block and are acquired before any statement runs.
#[derive(Debug, Clone, Default)]
pub struct BlockStatement {
    /// Statements in source order (lock statements excluded).
    pub statements: Vec<Statement>,
    /// Hoisted `rLock` / `wLock` statements for this block.
    pub lock_statements: Vec<LockStatement>,
}

/// `rLock(expr);` or `wLock(expr);` — scoped lock acquisition, released when
/// the enclosing block exits on any path.
#[derive(Debug, Clone)]
pub struct LockStatement {
    /// Source location.
    pub loc: CodeLocation,
    /// `true` for `rLock`, `false` for `wLock`.
    pub is_read_lock: bool,
    /// The expression producing the locked object.
    pub locked: Expression,
}

/// A `case` / `default` clause of a switch statement.
///
/// A clause with an empty body in source contributes its conditions to the
/// next non-empty clause, so parsed clauses always carry a body; the
/// `default` clause has no conditions.
#[derive(Debug, Clone)]
pub struct CaseClause {
    /// Source location.
    pub loc: CodeLocation,
    /// The matching conditions (several after fall-through stacking).
    pub conditions: Vec<Expression>,
    /// The clause body.
    pub body: BlockStatement,
}

/// A statement node.  Performing one produces no value.
#[derive(Debug, Clone)]
pub enum Statement {
    /// `{ … }`
    Block {
        /// Source location.
        loc: CodeLocation,
        /// The block.
        block: BlockStatement,
    },

    /// An expression evaluated for its side effect.
    Expr {
        /// Source location.
        loc: CodeLocation,
        /// The expression.
        expression: Expression,
    },

    /// `if (condition) … else …`
    If {
        /// Source location.
        loc: CodeLocation,
        /// The tested condition.
        condition: Expression,
        /// Taken branch.
        true_branch: Box<Statement>,
        /// Not-taken branch, if present.
        false_branch: Option<Box<Statement>>,
    },

    /// `while`, `do … while`, and C-style `for` loops.
    Loop {
        /// Source location.
        loc: CodeLocation,
        /// Loop initializer (`for` only).
        init: Option<Box<Statement>>,
        /// Loop condition; `None` means always true.
        condition: Option<Expression>,
        /// Step expression evaluated after each iteration (`for` only).
        step: Option<Expression>,
        /// Loop body.
        body: Box<Statement>,
        /// `true` for `do … while` (body runs before the first test).
        is_do_loop: bool,
    },

    /// `for (name in iterable) body`
    ForIn {
        /// Source location.
        loc: CodeLocation,
        /// The iterator variable.
        iterator_name: String,
        /// The iterated expression.
        iterable: Expression,
        /// Loop body.
        body: Box<Statement>,
    },

    /// `return value?;`
    Return {
        /// Source location.
        loc: CodeLocation,
        /// Optional return value.
        value: Option<Expression>,
    },

    /// `switch (condition) { cases }`
    Switch {
        /// Source location.
        loc: CodeLocation,
        /// The value being switched on.
        condition: Expression,
        /// `case` clauses after fall-through stacking.
        cases: Vec<CaseClause>,
        /// The `default` clause, if present.
        default: Option<CaseClause>,
    },

    /// `break;`
    Break {
        /// Source location.
        loc: CodeLocation,
    },

    /// `continue;`
    Continue {
        /// Source location.
        loc: CodeLocation,
    },

    /// `var name [= init];` — a root-scope variable.
    Var {
        /// Source location.
        loc: CodeLocation,
        /// Variable name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// `const var name [= init];` — first execution fills the namespace's
    /// constant slot.
    ConstVar {
        /// Source location.
        loc: CodeLocation,
        /// Owning namespace.
        ns: NamespaceId,
        /// Slot index in the namespace's constant pool.
        index: usize,
        /// Constant name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// `reg name = expr;` — assignment into a typed register slot.
    RegisterVar {
        /// Source location.
        loc: CodeLocation,
        /// Owning namespace.
        ns: NamespaceId,
        /// Slot index in the namespace's register file.
        index: usize,
        /// Register name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// `global name [= init];` — a property in the shared global bag.
    GlobalVar {
        /// Source location.
        loc: CodeLocation,
        /// Global name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// `local name [= init];` inside an inline function body.
    LocalVar {
        /// Source location.
        loc: CodeLocation,
        /// Namespace owning the inline function.
        ns: NamespaceId,
        /// Index of the inline function within its namespace.
        function_index: usize,
        /// Local property name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// `local name [= init];` inside a callback body.
    CallbackLocal {
        /// Source location.
        loc: CodeLocation,
        /// Index of the callback in the engine's callback list.
        callback_index: usize,
        /// Local property name.
        name: String,
        /// Optional initializer.
        initialiser: Option<Expression>,
    },

    /// A lock statement encountered outside hoisting (kept for completeness;
    /// [`BlockStatement`] hoists these on construction).
    Lock(LockStatement),

    /// The empty statement `;`.
    Empty {
        /// Source location.
        loc: CodeLocation,
    },
}

impl Statement {
    /// Source location of this statement.
    pub fn location(&self) -> &CodeLocation {
        match self {
            Statement::Block { loc, .. }
            | Statement::Expr { loc, .. }
            | Statement::If { loc, .. }
            | Statement::Loop { loc, .. }
            | Statement::ForIn { loc, .. }
            | Statement::Return { loc, .. }
            | Statement::Switch { loc, .. }
            | Statement::Break { loc }
            | Statement::Continue { loc }
            | Statement::Var { loc, .. }
            | Statement::ConstVar { loc, .. }
            | Statement::RegisterVar { loc, .. }
            | Statement::GlobalVar { loc, .. }
            | Statement::LocalVar { loc, .. }
            | Statement::CallbackLocal { loc, .. }
            | Statement::Empty { loc } => loc,
            Statement::Lock(l) => &l.loc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::lexer::TokenIterator;

    #[test]
    fn test_location_accessors() {
        let loc = TokenIterator::new("x", "").unwrap().location;
        let expr = Expression::Literal {
            loc: loc.clone(),
            value: Value::Int(1),
        };
        assert_eq!(expr.location().offset, 0);
        let stmt = Statement::Expr {
            loc: loc.clone(),
            expression: expr,
        };
        assert_eq!(stmt.location().offset, 0);
    }
}
