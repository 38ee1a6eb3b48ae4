//! Recursive-descent parser producing the executable AST.
//!
//! [`ExpressionTreeBuilder`] walks the token stream with one token of
//! lookahead and resolves every identifier against the symbol tables
//! (populated by the pre-pass and by host registrations) into the concrete
//! [`Expression`] variant that knows where to read or write.
//!
//! Parser state that the original design kept as mutable member fields — the
//! current namespace, the inline function or callback being parsed, the
//! active for-in iterator name — lives as explicit fields here and is
//! saved/restored around the constructs that scope it.

use crate::error::PrestoResult;
use crate::include::SourceProvider;
use crate::parser::ast::{
    ArgumentList, BinaryOp, BlockStatement, CaseClause, Expression, LockStatement, Statement,
};
use crate::parser::lexer::{CodeLocation, TokenIterator, TokenKind};
use crate::parser::symbols::{
    uninitialised_sentinel, NamespaceId, SymbolTables, VariableStorageType,
};
use crate::value::Value;

/// Recursive-descent parser over one source buffer.
///
/// Construct one per parse invocation; includes spawn nested builders over
/// the included text.
pub struct ExpressionTreeBuilder<'a> {
    it: TokenIterator,
    tables: &'a mut SymbolTables,
    provider: &'a dyn SourceProvider,
    current_namespace: NamespaceId,
    /// The inline function whose body is being parsed, if any.
    current_inline_function: Option<(NamespaceId, usize)>,
    /// The callback whose body is being parsed, if any.
    currently_parsed_callback: Option<usize>,
    /// Iterator name of the enclosing for-in loop, if any.
    current_iterator: Option<String>,
}

impl<'a> ExpressionTreeBuilder<'a> {
    /// Creates a builder over `code`.
    pub fn new(
        code: &str,
        external_file: &str,
        tables: &'a mut SymbolTables,
        provider: &'a dyn SourceProvider,
    ) -> PrestoResult<Self> {
        Ok(Self {
            it: TokenIterator::new(code, external_file)?,
            tables,
            provider,
            current_namespace: NamespaceId::Root,
            current_inline_function: None,
            currently_parsed_callback: None,
            current_iterator: None,
        })
    }

    /// Parses statements until `}` or end of input.
    ///
    /// Lock statements are hoisted out of the returned block's statement list
    /// into [`BlockStatement::lock_statements`].
    pub fn parse_statement_list(&mut self) -> PrestoResult<BlockStatement> {
        let mut block = BlockStatement::default();
        while !self
            .it
            .matches_any(&[TokenKind::CloseBrace, TokenKind::Eof])
        {
            match self.parse_statement()? {
                Statement::Lock(lock) => block.lock_statements.push(lock),
                statement => block.statements.push(statement),
            }
        }
        Ok(block)
    }

    /// Parses a single full expression.
    pub fn parse_expression(&mut self) -> PrestoResult<Expression> {
        let id_hint = match self.it.current_type {
            TokenKind::Identifier => Some(self.it.current_string()),
            _ => None,
        };

        let lhs = self.parse_logic_operator()?;

        // `lhs in rhs` — seen inside a for-loop header.  The right-hand side
        // is the iterable; the preceding identifier becomes the iterator
        // name for the loop about to be built.
        if self.it.match_if(TokenKind::In)? {
            let rhs = self.parse_expression()?;
            self.current_iterator = id_hint;
            return Ok(rhs);
        }

        if self.it.match_if(TokenKind::Question)? {
            return self.parse_ternary(lhs);
        }
        if self.it.match_if(TokenKind::Assign)? {
            let loc = self.loc();
            let value = self.parse_expression()?;
            return Ok(Expression::Assignment {
                loc,
                target: Box::new(lhs),
                value: Box::new(value),
            });
        }
        if self.it.match_if(TokenKind::PlusEquals)? {
            return self.parse_in_place_op(lhs, BinaryOp::Add);
        }
        if self.it.match_if(TokenKind::MinusEquals)? {
            return self.parse_in_place_op(lhs, BinaryOp::Subtract);
        }
        if self.it.match_if(TokenKind::LeftShiftEquals)? {
            return self.parse_in_place_op(lhs, BinaryOp::LeftShift);
        }
        if self.it.match_if(TokenKind::RightShiftEquals)? {
            return self.parse_in_place_op(lhs, BinaryOp::RightShift);
        }

        Ok(lhs)
    }

    /// `true` when the whole input has been consumed.
    pub fn is_at_end(&self) -> bool {
        self.it.current_type == TokenKind::Eof
    }

    /// Location of the current token (for error reporting by callers).
    pub fn current_location(&self) -> &CodeLocation {
        &self.it.location
    }

    // ── Small helpers ───────────────────────────────────────────────────────

    fn loc(&self) -> CodeLocation {
        self.it.location.clone()
    }

    fn parse_identifier(&mut self) -> PrestoResult<String> {
        let name = match self.it.current_type {
            TokenKind::Identifier => self.it.current_string(),
            _ => String::new(),
        };
        self.it.match_token(TokenKind::Identifier)?;
        Ok(name)
    }

    fn match_end_of_statement(&mut self, expression: Expression) -> PrestoResult<Statement> {
        if self.it.current_type != TokenKind::Eof {
            self.it.match_token(TokenKind::Semicolon)?;
        }
        let loc = expression.location().clone();
        Ok(Statement::Expr { loc, expression })
    }

    /// `( expr, expr, … )` — consumes both parentheses.
    fn parse_call_arguments(&mut self) -> PrestoResult<ArgumentList> {
        self.it.match_token(TokenKind::OpenParen)?;
        let mut arguments = ArgumentList::new();
        while self.it.current_type != TokenKind::CloseParen {
            arguments.push(self.parse_expression()?);
            if self.it.current_type != TokenKind::CloseParen {
                self.it.match_token(TokenKind::Comma)?;
            }
        }
        self.it.match_token(TokenKind::CloseParen)?;
        Ok(arguments)
    }

    // ── Statements ──────────────────────────────────────────────────────────

    fn parse_statement(&mut self) -> PrestoResult<Statement> {
        if self.it.match_if(TokenKind::Include)? {
            return self.parse_external_file();
        }
        if self.it.match_if(TokenKind::Inline)? {
            return self.parse_inline_function();
        }

        if self.it.current_type == TokenKind::OpenBrace {
            return self.parse_block();
        }

        if self.it.match_if(TokenKind::Const)? {
            return self.parse_const_var();
        }
        if self.it.match_if(TokenKind::Var)? {
            return self.parse_var();
        }
        if self.it.match_if(TokenKind::RegisterVar)? {
            return self.parse_register_var();
        }
        if self.it.match_if(TokenKind::Global)? {
            return self.parse_global_assignment();
        }
        if self.it.match_if(TokenKind::Local)? {
            return self.parse_local_assignment();
        }
        if self.it.match_if(TokenKind::Namespace)? {
            return self.parse_namespace();
        }
        if self.it.match_if(TokenKind::If)? {
            return self.parse_if();
        }
        if self.it.match_if(TokenKind::While)? {
            return self.parse_do_or_while_loop(false);
        }
        if self.it.match_if(TokenKind::Do)? {
            return self.parse_do_or_while_loop(true);
        }
        if self.it.match_if(TokenKind::For)? {
            return self.parse_for_loop();
        }
        if self.it.match_if(TokenKind::Return)? {
            return self.parse_return();
        }
        if self.it.match_if(TokenKind::Switch)? {
            return self.parse_switch_block();
        }
        if self.it.current_type == TokenKind::Break {
            let loc = self.loc();
            self.it.skip()?;
            return Ok(Statement::Break { loc });
        }
        if self.it.current_type == TokenKind::Continue {
            let loc = self.loc();
            self.it.skip()?;
            return Ok(Statement::Continue { loc });
        }
        if self.it.match_if(TokenKind::Function)? {
            return self.parse_function();
        }
        if self.it.match_if(TokenKind::Extern)? {
            return self.parse_external_c_function();
        }
        if self.it.current_type == TokenKind::Semicolon {
            let loc = self.loc();
            self.it.skip()?;
            return Ok(Statement::Empty { loc });
        }
        if self.it.match_if(TokenKind::PlusPlus)? {
            let expression = self.parse_pre_inc_dec(BinaryOp::Add)?;
            let loc = expression.location().clone();
            return Ok(Statement::Expr { loc, expression });
        }
        if self.it.match_if(TokenKind::MinusMinus)? {
            let expression = self.parse_pre_inc_dec(BinaryOp::Subtract)?;
            let loc = expression.location().clone();
            return Ok(Statement::Expr { loc, expression });
        }
        if self.it.match_if(TokenKind::RLock)? {
            return self.parse_lock_statement(true);
        }
        if self.it.match_if(TokenKind::WLock)? {
            return self.parse_lock_statement(false);
        }

        if self
            .it
            .matches_any(&[TokenKind::OpenParen, TokenKind::OpenBracket])
        {
            let expression = self.parse_factor(None)?;
            return self.match_end_of_statement(expression);
        }

        if self
            .it
            .matches_any(&[TokenKind::Identifier, TokenKind::Literal, TokenKind::Minus])
        {
            let expression = self.parse_expression()?;
            return self.match_end_of_statement(expression);
        }

        Err(self.it.location.error_parse(format!(
            "Found {} when expecting a statement",
            self.it.current_type.name()
        )))
    }

    fn parse_block(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        let block = self.parse_block_statement()?;
        Ok(Statement::Block { loc, block })
    }

    fn parse_block_statement(&mut self) -> PrestoResult<BlockStatement> {
        self.it.match_token(TokenKind::OpenBrace)?;
        let block = self.parse_statement_list()?;
        self.it.match_token(TokenKind::CloseBrace)?;
        Ok(block)
    }

    fn parse_if(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::OpenParen)?;
        let condition = self.parse_expression()?;
        self.it.match_token(TokenKind::CloseParen)?;
        let true_branch = Box::new(self.parse_statement()?);
        let false_branch = if self.it.match_if(TokenKind::Else)? {
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        Ok(Statement::If {
            loc,
            condition,
            true_branch,
            false_branch,
        })
    }

    fn parse_return(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        if self.it.match_if(TokenKind::Semicolon)? {
            return Ok(Statement::Return { loc, value: None });
        }
        let value = self.parse_expression()?;
        self.it.match_if(TokenKind::Semicolon)?;
        Ok(Statement::Return {
            loc,
            value: Some(value),
        })
    }

    // ── Variable declarations ───────────────────────────────────────────────

    /// Continues a comma-chained declaration: the remaining declarators parse
    /// as plain `var` statements wrapped with the first into one block.
    fn chain_declaration(&mut self, first: Statement) -> PrestoResult<Statement> {
        let loc = first.location().clone();
        let mut block = BlockStatement::default();
        block.statements.push(first);
        block.statements.push(self.parse_var()?);
        Ok(Statement::Block { loc, block })
    }

    fn parse_var(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        let name = self.parse_identifier()?;
        self.tables
            .check_if_exists_in_other_storage(VariableStorageType::RootScope, &name, &loc)?;
        self.tables.add_root_variable(&name);

        let initialiser = if self.it.match_if(TokenKind::Assign)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let statement = Statement::Var {
            loc,
            name,
            initialiser,
        };
        if self.it.match_if(TokenKind::Comma)? {
            return self.chain_declaration(statement);
        }
        self.it.match_token(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_const_var(&mut self) -> PrestoResult<Statement> {
        self.it.match_if(TokenKind::Var)?;

        let loc = self.loc();
        let name = self.parse_identifier()?;
        self.tables.check_if_exists_in_other_storage(
            VariableStorageType::ConstVariables,
            &name,
            &loc,
        )?;

        let ns = self.current_namespace;
        let Some(index) = self.tables.namespace(ns).get_const_index(&name) else {
            return Err(loc.error_const(format!("Unknown const variable {name}")));
        };

        let initialiser = if self.it.match_if(TokenKind::Assign)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let statement = Statement::ConstVar {
            loc,
            ns,
            index,
            name,
            initialiser,
        };
        if self.it.match_if(TokenKind::Comma)? {
            return self.chain_declaration(statement);
        }

        // The slot is filled at first execution; mark it as declared.
        let slot = &mut self.tables.namespace_mut(ns).const_objects[index];
        *slot = uninitialised_sentinel();
        Ok(statement)
    }

    fn parse_register_var(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        let name = self.parse_identifier()?;
        self.tables
            .check_if_exists_in_other_storage(VariableStorageType::Register, &name, &loc)?;

        let ns = self.current_namespace;
        let Some(index) = self
            .tables
            .namespace(ns)
            .var_register
            .get_register_index(&name)
        else {
            return Err(loc.error_symbol(format!("Unknown register variable {name}")));
        };

        let initialiser = if self.it.match_if(TokenKind::Assign)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let statement = Statement::RegisterVar {
            loc,
            ns,
            index,
            name,
            initialiser,
        };
        if self.it.match_if(TokenKind::Comma)? {
            return self.chain_declaration(statement);
        }
        self.it.match_token(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_global_assignment(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        let name = self.parse_identifier()?;
        if !self.tables.globals.contains_key(&name) {
            self.tables.set_global(name.clone(), Value::Undefined);
        }

        let initialiser = if self.it.match_if(TokenKind::Assign)? {
            Some(self.parse_expression()?)
        } else {
            None
        };
        let statement = Statement::GlobalVar {
            loc,
            name,
            initialiser,
        };
        if self.it.match_if(TokenKind::Comma)? {
            return self.chain_declaration(statement);
        }
        self.it.match_token(TokenKind::Semicolon)?;
        Ok(statement)
    }

    fn parse_local_assignment(&mut self) -> PrestoResult<Statement> {
        if let Some((ns, function_index)) = self.current_inline_function {
            let loc = self.loc();
            let name = self.parse_identifier()?;
            self.tables.check_if_exists_in_other_storage(
                VariableStorageType::LocalScope,
                &name,
                &loc,
            )?;
            self.tables.namespace_mut(ns).inline_functions[function_index]
                .local_properties
                .insert(name.clone(), Value::Undefined);

            let initialiser = if self.it.match_if(TokenKind::Assign)? {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let statement = Statement::LocalVar {
                loc,
                ns,
                function_index,
                name,
                initialiser,
            };
            if self.it.match_if(TokenKind::Comma)? {
                return self.chain_declaration(statement);
            }
            self.it.match_token(TokenKind::Semicolon)?;
            return Ok(statement);
        }

        if let Some(callback_index) = self.currently_parsed_callback {
            let loc = self.loc();
            let name = self.parse_identifier()?;
            self.tables.check_if_exists_in_other_storage(
                VariableStorageType::LocalScope,
                &name,
                &loc,
            )?;
            self.tables.callbacks[callback_index]
                .local_properties
                .insert(name.clone(), Value::Undefined);

            let initialiser = if self.it.match_if(TokenKind::Assign)? {
                Some(self.parse_expression()?)
            } else {
                None
            };
            let statement = Statement::CallbackLocal {
                loc,
                callback_index,
                name,
                initialiser,
            };
            if self.it.match_if(TokenKind::Comma)? {
                return self.chain_declaration(statement);
            }
            self.it.match_token(TokenKind::Semicolon)?;
            return Ok(statement);
        }

        Err(self.it.location.error_symbol(
            "Cannot define local variables outside of inline functions or callbacks.",
        ))
    }

    // ── Namespaces ──────────────────────────────────────────────────────────

    fn parse_namespace(&mut self) -> PrestoResult<Statement> {
        let name = self.parse_identifier()?;
        let Some(ns) = self.tables.find_namespace(&name) else {
            return Err(self.it.location.error_parse("Error at parsing namespace"));
        };
        self.current_namespace = ns;
        let block = self.parse_block();
        self.current_namespace = NamespaceId::Root;
        block
    }

    // ── Loops ───────────────────────────────────────────────────────────────

    fn parse_do_or_while_loop(&mut self, is_do_loop: bool) -> PrestoResult<Statement> {
        let loc = self.loc();

        if is_do_loop {
            let body = Box::new(self.parse_block()?);
            self.it.match_token(TokenKind::While)?;
            self.it.match_token(TokenKind::OpenParen)?;
            let condition = self.parse_expression()?;
            self.it.match_token(TokenKind::CloseParen)?;
            return Ok(Statement::Loop {
                loc,
                init: None,
                condition: Some(condition),
                step: None,
                body,
                is_do_loop: true,
            });
        }

        self.it.match_token(TokenKind::OpenParen)?;
        let condition = self.parse_expression()?;
        self.it.match_token(TokenKind::CloseParen)?;
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::Loop {
            loc,
            init: None,
            condition: Some(condition),
            step: None,
            body,
            is_do_loop: false,
        })
    }

    fn parse_for_loop(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::OpenParen)?;

        let is_var_initialiser = self.it.match_if(TokenKind::Var)?;
        let previous_iterator = self.current_iterator.take();
        let iter = self.parse_expression()?;

        // A `)` directly after the expression (with no `var`) means the
        // expression carried an `in`: this is a for-in loop and the iterator
        // name was recorded by `parse_expression`.
        if !is_var_initialiser && self.it.current_type == TokenKind::CloseParen {
            let iterator_name = self.current_iterator.clone().unwrap_or_default();
            self.it.match_token(TokenKind::CloseParen)?;
            let body = Box::new(self.parse_statement()?);
            self.current_iterator = previous_iterator;
            return Ok(Statement::ForIn {
                loc,
                iterator_name,
                iterable: iter,
                body,
            });
        }
        self.current_iterator = previous_iterator;

        let init = Box::new(self.match_end_of_statement(iter)?);
        let condition = if self.it.match_if(TokenKind::Semicolon)? {
            None
        } else {
            let c = self.parse_expression()?;
            self.it.match_token(TokenKind::Semicolon)?;
            Some(c)
        };
        let step = if self.it.match_if(TokenKind::CloseParen)? {
            None
        } else {
            let s = self.parse_expression()?;
            self.it.match_token(TokenKind::CloseParen)?;
            Some(s)
        };
        let body = Box::new(self.parse_statement()?);
        Ok(Statement::Loop {
            loc,
            init: Some(init),
            condition,
            step,
            body,
            is_do_loop: false,
        })
    }

    // ── Switch ──────────────────────────────────────────────────────────────

    /// Returns `(is_case, conditions, body)`; `body` is `None` for a clause
    /// with an empty body, whose conditions stack onto the next clause.
    fn parse_case_statement(
        &mut self,
    ) -> PrestoResult<(bool, Vec<Expression>, Option<(CodeLocation, BlockStatement)>)> {
        let loc = self.loc();
        let is_case = self.it.current_type == TokenKind::Case;
        self.it.skip()?;

        let mut conditions = Vec::new();
        if is_case {
            conditions.push(self.parse_expression()?);
        }
        self.it.match_token(TokenKind::Colon)?;

        if self.it.current_type == TokenKind::OpenBrace {
            let block = self.parse_block_statement()?;
            return Ok((is_case, conditions, Some((loc, block))));
        }
        if self.it.matches_any(&[
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::CloseBrace,
        ]) {
            return Ok((is_case, conditions, None));
        }

        let mut block = BlockStatement::default();
        while !self.it.matches_any(&[
            TokenKind::Case,
            TokenKind::Default,
            TokenKind::CloseBrace,
        ]) {
            block.statements.push(self.parse_statement()?);
        }
        Ok((is_case, conditions, Some((loc, block))))
    }

    fn parse_switch_block(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::OpenParen)?;
        let condition = self.parse_expression()?;
        self.it.match_token(TokenKind::CloseParen)?;
        self.it.match_token(TokenKind::OpenBrace)?;

        let mut cases = Vec::new();
        let mut default = None;
        let mut stacked_conditions: Vec<Expression> = Vec::new();

        while self
            .it
            .matches_any(&[TokenKind::Case, TokenKind::Default])
        {
            let (is_case, mut conditions, body) = self.parse_case_statement()?;
            match body {
                None => stacked_conditions.append(&mut conditions),
                Some((case_loc, body)) => {
                    conditions.extend(stacked_conditions.drain(..));
                    let clause = CaseClause {
                        loc: case_loc,
                        conditions,
                        body,
                    };
                    if is_case {
                        cases.push(clause);
                    } else {
                        default = Some(clause);
                    }
                }
            }
        }

        self.it.match_token(TokenKind::CloseBrace)?;
        Ok(Statement::Switch {
            loc,
            condition,
            cases,
            default,
        })
    }

    // ── Locks ───────────────────────────────────────────────────────────────

    fn parse_lock_statement(&mut self, is_read_lock: bool) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::OpenParen)?;
        let locked = self.parse_factor(None)?;
        self.it.match_token(TokenKind::CloseParen)?;
        self.it.match_token(TokenKind::Semicolon)?;
        Ok(Statement::Lock(LockStatement {
            loc,
            is_read_lock,
            locked,
        }))
    }

    // ── Functions and callbacks ─────────────────────────────────────────────

    /// `function` statement: either a callback definition (when the name is a
    /// registered callback) or a named function assigned to a root variable.
    fn parse_function(&mut self) -> PrestoResult<Statement> {
        if self.it.current_type == TokenKind::Identifier {
            let name = self.it.current_string();
            if let Some(callback_index) = self.tables.get_callback_index(&name) {
                return self.parse_callback(callback_index);
            }
        }

        let loc = self.loc();
        let (name, function) = self.parse_function_definition()?;
        let Some(name) = name else {
            return Err(self
                .it
                .location
                .error_parse("Functions defined at statement-level must have a name"));
        };
        Ok(Statement::Expr {
            loc: loc.clone(),
            expression: Expression::Assignment {
                loc: loc.clone(),
                target: Box::new(Expression::Unqualified { loc, name }),
                value: Box::new(function),
            },
        })
    }

    /// Parses `[name] (params) { body }`, capturing the verbatim source text
    /// and the pending doc-comment.
    fn parse_function_definition(&mut self) -> PrestoResult<(Option<String>, Expression)> {
        let loc = self.loc();
        let start = self.it.location.offset;

        let name = if self.it.current_type == TokenKind::Identifier {
            Some(self.parse_identifier()?)
        } else {
            None
        };

        self.it.match_token(TokenKind::OpenParen)?;
        let mut parameters = Vec::new();
        while self.it.current_type != TokenKind::CloseParen {
            parameters.push(self.it.current_string());
            self.it.match_token(TokenKind::Identifier)?;
            if self.it.current_type != TokenKind::CloseParen {
                self.it.match_token(TokenKind::Comma)?;
            }
        }
        self.it.match_token(TokenKind::CloseParen)?;

        let body = Box::new(self.parse_block()?);
        let source = self
            .it
            .source_slice(start, self.it.location.offset)
            .trim_end()
            .to_owned();
        let comment_doc = self.it.take_last_comment();

        Ok((
            name,
            Expression::AnonymousFunction {
                loc,
                parameters,
                body,
                source,
                comment_doc,
            },
        ))
    }

    /// `function <callback>(params) { body }` — installs parameter names and
    /// the body on the host-registered callback object.
    fn parse_callback(&mut self, callback_index: usize) -> PrestoResult<Statement> {
        let loc = self.loc();
        let name = self.parse_identifier()?;
        let num_args = self.tables.callbacks[callback_index].num_args;

        self.it.match_token(TokenKind::OpenParen)?;
        let mut parameters = Vec::new();
        while self.it.current_type != TokenKind::CloseParen {
            parameters.push(self.parse_identifier()?);
            if self.it.current_type != TokenKind::CloseParen {
                self.it.match_token(TokenKind::Comma)?;
            }
        }
        self.it.match_token(TokenKind::CloseParen)?;

        if parameters.len() != num_args {
            return Err(self.it.location.error_arity(format!(
                "Callback {}: parameter amount mismatch: {} (Expected: {})",
                name,
                parameters.len(),
                num_args
            )));
        }

        {
            let callback = &mut self.tables.callbacks[callback_index];
            callback.parameters = parameters;
            callback.parameter_values = vec![Value::Undefined; num_args];
        }

        let previous = self.currently_parsed_callback.replace(callback_index);
        let body = self.parse_block();
        self.currently_parsed_callback = previous;

        self.tables.callbacks[callback_index].body = Some(body?);
        Ok(Statement::Empty { loc })
    }

    /// `inline function <name>(…) { body }` — attaches the body to the
    /// signature pre-registered by the pre-pass.
    fn parse_inline_function(&mut self) -> PrestoResult<Statement> {
        if self.current_inline_function.is_some() {
            return Err(self
                .it
                .location
                .error_symbol("No nested inline functions allowed."));
        }

        let loc = self.loc();
        self.it.match_token(TokenKind::Function)?;
        let name = self.parse_identifier()?;

        // The parameter list was recorded by the pre-pass.
        self.it.match_token(TokenKind::OpenParen)?;
        while !self
            .it
            .matches_any(&[TokenKind::CloseParen, TokenKind::Eof])
        {
            self.it.skip()?;
        }
        self.it.match_token(TokenKind::CloseParen)?;

        let ns = self.current_namespace;
        let Some(function_index) = self.tables.namespace(ns).get_inline_function_index(&name)
        else {
            return Err(self
                .it
                .location
                .error_parse("Error at inline function parsing"));
        };

        let comment_doc = self.it.take_last_comment();
        self.tables.namespace_mut(ns).inline_functions[function_index].comment_doc = comment_doc;

        self.current_inline_function = Some((ns, function_index));
        let body = self.parse_block();
        self.current_inline_function = None;

        self.tables.namespace_mut(ns).inline_functions[function_index].body = Some(body?);
        self.it.match_if(TokenKind::Semicolon)?;
        Ok(Statement::Empty { loc })
    }

    // ── extern "C" ──────────────────────────────────────────────────────────

    /// `extern "C" { (void|var) name(var a, …) { … } … }` — captures each
    /// function's braced body verbatim for the external back-end.
    fn parse_external_c_function(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::Literal)?;
        self.it.match_token(TokenKind::OpenBrace)?;

        while self.it.current_type != TokenKind::CloseBrace {
            let has_return_type = if self.it.match_if(TokenKind::Void)? {
                false
            } else {
                self.it.match_token(TokenKind::Var)?;
                true
            };
            let name = self.parse_identifier()?;
            let comment_doc = self.it.take_last_comment();

            self.it.match_token(TokenKind::OpenParen)?;
            let mut arguments = Vec::new();
            while self.it.current_type != TokenKind::CloseParen {
                self.it.match_token(TokenKind::Var)?;
                arguments.push(self.it.current_string());
                self.it.match_token(TokenKind::Identifier)?;
                if self.it.current_type != TokenKind::CloseParen {
                    self.it.match_token(TokenKind::Comma)?;
                }
            }
            self.it.match_token(TokenKind::CloseParen)?;

            // Capture the braced body verbatim, tracking brace depth.
            if self.it.current_type != TokenKind::OpenBrace {
                return Err(self.it.location.error_parse(format!(
                    "Found {} when expecting '{{'",
                    self.it.current_type.name()
                )));
            }
            let start = self.it.location.offset;
            let mut depth = 0i32;
            let end;
            loop {
                match self.it.current_type {
                    TokenKind::Eof => {
                        return Err(self
                            .it
                            .location
                            .error_parse("Unterminated extern \"C\" function body"));
                    }
                    TokenKind::OpenBrace => {
                        depth += 1;
                        self.it.skip()?;
                    }
                    TokenKind::CloseBrace => {
                        depth -= 1;
                        if depth == 0 {
                            end = self.it.location.offset + 1;
                            self.it.skip()?;
                            break;
                        }
                        self.it.skip()?;
                    }
                    _ => self.it.skip()?,
                }
            }
            let code = self.it.source_slice(start, end).to_owned();

            self.tables
                .external_c_functions
                .push(crate::parser::symbols::ExternalCFunction {
                    name,
                    has_return_type,
                    arguments,
                    code,
                    comment_doc,
                });
        }

        self.it.match_token(TokenKind::CloseBrace)?;
        self.it.match_if(TokenKind::Semicolon)?;
        Ok(Statement::Empty { loc })
    }

    // ── Includes ────────────────────────────────────────────────────────────

    /// `include("file");` — loads, registers, and parses the external source,
    /// splicing its statements in as one block.
    fn parse_external_file(&mut self) -> PrestoResult<Statement> {
        let loc = self.loc();
        self.it.match_token(TokenKind::OpenParen)?;

        let argument = self.it.current_string();
        let resolved = self
            .provider
            .resolve(&argument)
            .map_err(|msg| self.it.location.error_include(msg))?;

        if resolved.text.is_empty() {
            self.it.match_token(TokenKind::Literal)?;
            self.it.match_token(TokenKind::CloseParen)?;
            self.it.match_token(TokenKind::Semicolon)?;
            return Ok(Statement::Empty { loc });
        }

        if self.tables.is_file_included(&resolved.canonical_name) {
            return Err(self.it.location.error_include(format!(
                "File {} was included multiple times",
                resolved.canonical_name
            )));
        }
        self.tables.add_included_file(&resolved.canonical_name);

        let parsed = {
            match ExpressionTreeBuilder::new(
                &resolved.text,
                &resolved.canonical_name,
                &mut *self.tables,
                self.provider,
            ) {
                Ok(mut nested) => nested.parse_statement_list(),
                Err(e) => Err(e),
            }
        };

        match parsed {
            Ok(block) => {
                self.it.match_token(TokenKind::Literal)?;
                self.it.match_token(TokenKind::CloseParen)?;
                self.it.match_token(TokenKind::Semicolon)?;
                Ok(Statement::Block { loc, block })
            }
            Err(e) => {
                self.tables.set_last_include_error(e.to_string());
                Err(e)
            }
        }
    }

    // ── Expression grammar ──────────────────────────────────────────────────

    fn parse_in_place_op(&mut self, lhs: Expression, op: BinaryOp) -> PrestoResult<Expression> {
        let loc = lhs.location().clone();
        let operand = self.parse_expression()?;
        Ok(Expression::SelfAssignment {
            loc,
            op,
            target: Box::new(lhs),
            operand: Box::new(operand),
        })
    }

    fn parse_ternary(&mut self, condition: Expression) -> PrestoResult<Expression> {
        let loc = condition.location().clone();
        let true_branch = self.parse_expression()?;
        self.it.match_token(TokenKind::Colon)?;
        let false_branch = self.parse_expression()?;
        Ok(Expression::Conditional {
            loc,
            condition: Box::new(condition),
            true_branch: Box::new(true_branch),
            false_branch: Box::new(false_branch),
        })
    }

    /// One folded layer for `&& || & | ^`, left-associative.
    fn parse_logic_operator(&mut self) -> PrestoResult<Expression> {
        let mut a = self.parse_comparator()?;
        loop {
            let op = match self.it.current_type {
                TokenKind::LogicalAnd => BinaryOp::LogicalAnd,
                TokenKind::LogicalOr => BinaryOp::LogicalOr,
                TokenKind::BitwiseAnd => BinaryOp::BitwiseAnd,
                TokenKind::BitwiseOr => BinaryOp::BitwiseOr,
                TokenKind::BitwiseXor => BinaryOp::BitwiseXor,
                _ => break,
            };
            self.it.skip()?;
            let b = self.parse_comparator()?;
            a = self.binary(op, a, b);
        }
        Ok(a)
    }

    fn parse_comparator(&mut self) -> PrestoResult<Expression> {
        let mut a = self.parse_shift_operator()?;
        loop {
            let op = match self.it.current_type {
                TokenKind::Equals => BinaryOp::Equals,
                TokenKind::NotEquals => BinaryOp::NotEquals,
                TokenKind::TypeEquals => BinaryOp::TypeEquals,
                TokenKind::TypeNotEquals => BinaryOp::TypeNotEquals,
                TokenKind::LessThan => BinaryOp::LessThan,
                TokenKind::LessThanOrEqual => BinaryOp::LessThanOrEqual,
                TokenKind::GreaterThan => BinaryOp::GreaterThan,
                TokenKind::GreaterThanOrEqual => BinaryOp::GreaterThanOrEqual,
                _ => break,
            };
            self.it.skip()?;
            let b = self.parse_shift_operator()?;
            a = self.binary(op, a, b);
        }
        Ok(a)
    }

    fn parse_shift_operator(&mut self) -> PrestoResult<Expression> {
        let mut a = self.parse_addition_subtraction()?;
        loop {
            let op = match self.it.current_type {
                TokenKind::LeftShift => BinaryOp::LeftShift,
                TokenKind::RightShift => BinaryOp::RightShift,
                TokenKind::RightShiftUnsigned => BinaryOp::RightShiftUnsigned,
                _ => break,
            };
            self.it.skip()?;
            let b = self.parse_addition_subtraction()?;
            a = self.binary(op, a, b);
        }
        Ok(a)
    }

    fn parse_addition_subtraction(&mut self) -> PrestoResult<Expression> {
        let mut a = self.parse_multiply_divide()?;
        loop {
            let op = match self.it.current_type {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.it.skip()?;
            let b = self.parse_multiply_divide()?;
            a = self.binary(op, a, b);
        }
        Ok(a)
    }

    fn parse_multiply_divide(&mut self) -> PrestoResult<Expression> {
        let mut a = self.parse_unary()?;
        loop {
            let op = match self.it.current_type {
                TokenKind::Times => BinaryOp::Multiply,
                TokenKind::Divide => BinaryOp::Divide,
                TokenKind::Modulo => BinaryOp::Modulo,
                _ => break,
            };
            self.it.skip()?;
            let b = self.parse_unary()?;
            a = self.binary(op, a, b);
        }
        Ok(a)
    }

    fn binary(&self, op: BinaryOp, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            loc: left.location().clone(),
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    fn parse_unary(&mut self) -> PrestoResult<Expression> {
        // `-x` lowers to `0 - x` and `!x` to `0 == x`.
        if self.it.match_if(TokenKind::Minus)? {
            let loc = self.loc();
            let zero = Expression::Literal {
                loc: loc.clone(),
                value: Value::Int(0),
            };
            let operand = self.parse_unary()?;
            return Ok(Expression::Binary {
                loc,
                op: BinaryOp::Subtract,
                left: Box::new(zero),
                right: Box::new(operand),
            });
        }
        if self.it.match_if(TokenKind::LogicalNot)? {
            let loc = self.loc();
            let zero = Expression::Literal {
                loc: loc.clone(),
                value: Value::Int(0),
            };
            let operand = self.parse_unary()?;
            return Ok(Expression::Binary {
                loc,
                op: BinaryOp::Equals,
                left: Box::new(zero),
                right: Box::new(operand),
            });
        }
        if self.it.match_if(TokenKind::PlusPlus)? {
            return self.parse_pre_inc_dec(BinaryOp::Add);
        }
        if self.it.match_if(TokenKind::MinusMinus)? {
            return self.parse_pre_inc_dec(BinaryOp::Subtract);
        }
        if self.it.match_if(TokenKind::Typeof)? {
            return self.parse_typeof();
        }
        self.parse_factor(None)
    }

    fn parse_typeof(&mut self) -> PrestoResult<Expression> {
        let loc = self.loc();
        let mut arguments = ArgumentList::new();
        arguments.push(self.parse_unary()?);
        Ok(Expression::FunctionCall {
            loc: loc.clone(),
            object: Box::new(Expression::Unqualified {
                loc,
                name: "typeof".into(),
            }),
            arguments: Box::new(arguments),
        })
    }

    fn parse_pre_inc_dec(&mut self, op: BinaryOp) -> PrestoResult<Expression> {
        let loc = self.loc();
        let target = self.parse_factor(None)?;
        let one = Expression::Literal {
            loc: loc.clone(),
            value: Value::Int(1),
        };
        Ok(Expression::SelfAssignment {
            loc,
            op,
            target: Box::new(target),
            operand: Box::new(one),
        })
    }

    fn parse_post_inc_dec(&mut self, op: BinaryOp, target: Expression) -> PrestoResult<Expression> {
        let loc = target.location().clone();
        let one = Expression::Literal {
            loc: loc.clone(),
            value: Value::Int(1),
        };
        Ok(Expression::PostAssignment {
            loc,
            op,
            target: Box::new(target),
            operand: Box::new(one),
        })
    }

    // ── Suffixes ────────────────────────────────────────────────────────────

    fn parse_suffixes(&mut self, input: Expression) -> PrestoResult<Expression> {
        if self.it.match_if(TokenKind::Dot)? {
            let loc = input.location().clone();
            let member = self.parse_identifier()?;
            return self.parse_suffixes(Expression::DotOperator {
                loc,
                object: Box::new(input),
                member,
            });
        }

        if self.it.current_type == TokenKind::OpenParen {
            let loc = input.location().clone();
            let arguments = self.parse_call_arguments()?;
            return self.parse_suffixes(Expression::FunctionCall {
                loc,
                object: Box::new(input),
                arguments: Box::new(arguments),
            });
        }

        if self.it.match_if(TokenKind::OpenBracket)? {
            let loc = input.location().clone();
            let index = self.parse_expression()?;
            self.it.match_token(TokenKind::CloseBracket)?;
            return self.parse_suffixes(Expression::ArraySubscript {
                loc,
                object: Box::new(input),
                index: Box::new(index),
            });
        }

        if self.it.match_if(TokenKind::PlusPlus)? {
            return self.parse_post_inc_dec(BinaryOp::Add, input);
        }
        if self.it.match_if(TokenKind::MinusMinus)? {
            return self.parse_post_inc_dec(BinaryOp::Subtract, input);
        }

        Ok(input)
    }

    // ── Factor resolution ───────────────────────────────────────────────────

    /// Parses a factor, resolving identifiers against the symbol tables.
    ///
    /// `ns` is the namespace a qualifying `Name.` prefix selected; only one
    /// level of qualification is allowed.  Inside a namespace body, the
    /// namespace's own tables are consulted without qualification.
    fn parse_factor(&mut self, ns: Option<NamespaceId>) -> PrestoResult<Expression> {
        if self.it.current_type == TokenKind::Identifier {
            return self.parse_identifier_factor(ns);
        }

        if self.it.match_if(TokenKind::OpenParen)? {
            let inner = self.parse_expression()?;
            self.it.match_token(TokenKind::CloseParen)?;
            return self.parse_suffixes(inner);
        }

        let loc = self.loc();
        if self.it.match_if(TokenKind::True)? {
            return self.parse_suffixes(Expression::Literal {
                loc,
                value: Value::Bool(true),
            });
        }
        if self.it.match_if(TokenKind::False)? {
            return self.parse_suffixes(Expression::Literal {
                loc,
                value: Value::Bool(false),
            });
        }
        if self.it.match_if(TokenKind::Null)? {
            return self.parse_suffixes(Expression::Literal {
                loc,
                value: Value::Null,
            });
        }
        if self.it.match_if(TokenKind::Undefined)? {
            return self.parse_suffixes(Expression::Literal {
                loc,
                value: Value::Undefined,
            });
        }

        if self.it.current_type == TokenKind::Literal {
            let value = self.it.current_value.clone();
            self.it.skip()?;
            return self.parse_suffixes(Expression::Literal { loc, value });
        }

        if self.it.match_if(TokenKind::OpenBrace)? {
            return self.parse_object_literal(loc);
        }
        if self.it.match_if(TokenKind::OpenBracket)? {
            return self.parse_array_literal(loc);
        }

        if self.it.match_if(TokenKind::Function)? {
            let (name, function) = self.parse_function_definition()?;
            if name.is_some() {
                return Err(self
                    .it
                    .location
                    .error_parse("Inline function definitions cannot have a name"));
            }
            return Ok(function);
        }

        if self.it.match_if(TokenKind::New)? {
            return self.parse_new_operator(loc);
        }

        Err(self.it.location.error_parse(format!(
            "Found {} when expecting an expression",
            self.it.current_type.name()
        )))
    }

    /// Identifier resolution, in the fixed storage order.
    fn parse_identifier_factor(&mut self, ns: Option<NamespaceId>) -> PrestoResult<Expression> {
        let id = self.it.current_string();
        let loc = self.loc();

        // Inside a namespace body, unqualified names resolve against that
        // namespace first.
        let ns = match ns {
            Some(n) => Some(n),
            None if self.current_namespace != NamespaceId::Root => Some(self.current_namespace),
            None => None,
        };

        // 1. The enclosing for-in iterator.
        if self.current_iterator.as_deref() == Some(id.as_str()) {
            let name = self.parse_identifier()?;
            return self.parse_suffixes(Expression::IteratorName { loc, name });
        }

        // 2. Parameters and locals of the inline function being parsed.
        if let Some((fn_ns, function_index)) = self.current_inline_function {
            let (parameter_position, is_local) = {
                let function = &self.tables.namespace(fn_ns).inline_functions[function_index];
                (
                    function.parameter_names.iter().position(|p| *p == id),
                    function.local_properties.contains_key(&id),
                )
            };
            if let Some(parameter_index) = parameter_position {
                self.parse_identifier()?;
                return self.parse_suffixes(Expression::InlineParameterReference {
                    loc,
                    ns: fn_ns,
                    function_index,
                    parameter_index,
                });
            }
            if is_local {
                let name = self.parse_identifier()?;
                return self.parse_suffixes(Expression::LocalReference {
                    loc,
                    ns: fn_ns,
                    function_index,
                    name,
                });
            }
        }

        // 3. A single level of namespace qualification.
        if ns.is_none() {
            if let Some(qualified) = self.tables.find_namespace(&id) {
                self.it.match_token(TokenKind::Identifier)?;
                self.it.match_token(TokenKind::Dot)?;
                return self.parse_factor(Some(qualified));
            }
        }

        let scope = ns.unwrap_or(NamespaceId::Root);

        // 4. The symbol tables, first hit wins.
        if let Some(function_index) = self.tables.namespace(scope).get_inline_function_index(&id)
        {
            let call = self.parse_inline_function_call(scope, function_index)?;
            return self.parse_suffixes(call);
        }
        if let Some(class_index) = self.tables.get_api_class_index(&id) {
            let expr = self.parse_api_expression(class_index)?;
            return self.parse_suffixes(expr);
        }
        if let Some(index) = self.tables.namespace(scope).get_const_index(&id) {
            self.parse_identifier()?;
            return self.parse_suffixes(Expression::ConstReference {
                loc,
                ns: scope,
                index,
            });
        }
        if let Some(function_index) = self.tables.get_external_c_index(&id) {
            let call = self.parse_external_c_call(function_index)?;
            return self.parse_suffixes(call);
        }
        if let Some(index) = self
            .tables
            .namespace(scope)
            .var_register
            .get_register_index(&id)
        {
            let name = self.parse_identifier()?;
            return self.parse_suffixes(Expression::RegisterName {
                loc,
                ns: scope,
                index,
                name,
            });
        }
        if self.tables.globals.contains_key(&id) {
            let name = self.parse_identifier()?;
            return self.parse_suffixes(Expression::GlobalReference { loc, name });
        }

        // 5. Parameters and locals of the callback being parsed.
        if let Some(callback_index) = self.currently_parsed_callback {
            let (parameter_position, is_local) = {
                let callback = &self.tables.callbacks[callback_index];
                (
                    callback.get_parameter_index(&id),
                    callback.local_properties.contains_key(&id),
                )
            };
            if let Some(parameter_index) = parameter_position {
                self.parse_identifier()?;
                return self.parse_suffixes(Expression::CallbackParameterReference {
                    loc,
                    callback_index,
                    parameter_index,
                });
            }
            if is_local {
                let name = self.parse_identifier()?;
                return self.parse_suffixes(Expression::CallbackLocalReference {
                    loc,
                    callback_index,
                    name,
                });
            }
        }

        // 6. Unresolved: left to the evaluator's scope chain.
        let name = self.parse_identifier()?;
        self.parse_suffixes(Expression::Unqualified { loc, name })
    }

    // ── Calls against registered signatures ─────────────────────────────────

    fn parse_inline_function_call(
        &mut self,
        ns: NamespaceId,
        function_index: usize,
    ) -> PrestoResult<Expression> {
        let loc = self.loc();
        let (name, num_args) = {
            let f = &self.tables.namespace(ns).inline_functions[function_index];
            (f.name.clone(), f.parameter_names.len())
        };
        self.parse_identifier()?;
        let arguments = self.parse_call_arguments()?;

        if arguments.len() != num_args {
            return Err(self.it.location.error_arity(format!(
                "Inline function call {}: parameter amount mismatch: {} (Expected: {})",
                name,
                arguments.len(),
                num_args
            )));
        }
        Ok(Expression::InlineCall {
            loc,
            ns,
            function_index,
            arguments: Box::new(arguments),
        })
    }

    fn parse_api_expression(&mut self, class_index: usize) -> PrestoResult<Expression> {
        let loc = self.loc();
        let class_name = self.parse_identifier()?;
        self.it.match_token(TokenKind::Dot)?;
        let member = self.parse_identifier()?;

        let class = &self.tables.api_classes[class_index];
        if let Some(value) = class.get_constant(&member) {
            return Ok(Expression::ApiConstant {
                loc,
                value: value.clone(),
            });
        }
        let pretty = format!("{class_name}.{member}");
        let Some(method) = class.get_method(&member) else {
            return Err(self
                .it
                .location
                .error_parse(format!("Function / constant not found: {pretty}")));
        };

        let arguments = self.parse_call_arguments()?;
        if arguments.len() > method.num_args {
            return Err(self.it.location.error_arity(format!(
                "Too many arguments in API call {pretty}(). Expected: {}",
                method.num_args
            )));
        }
        if arguments.len() < method.num_args {
            return Err(self.it.location.error_arity(format!(
                "Call to {pretty}(): argument amount mismatch: {} (Expected: {})",
                arguments.len(),
                method.num_args
            )));
        }
        Ok(Expression::ApiCall {
            loc,
            class_index,
            function_index: method.index,
            arguments: Box::new(arguments),
        })
    }

    fn parse_external_c_call(&mut self, function_index: usize) -> PrestoResult<Expression> {
        let loc = self.loc();
        let (name, num_args) = {
            let f = &self.tables.external_c_functions[function_index];
            (f.name.clone(), f.arguments.len())
        };
        self.parse_identifier()?;
        let arguments = self.parse_call_arguments()?;

        if arguments.len() != num_args {
            return Err(self.it.location.error_arity(format!(
                "External C function call {}: parameter amount mismatch: {} (Expected: {})",
                name,
                arguments.len(),
                num_args
            )));
        }
        Ok(Expression::ExternalCCall {
            loc,
            function_index,
            arguments: Box::new(arguments),
        })
    }

    // ── Literals and `new` ──────────────────────────────────────────────────

    fn parse_object_literal(&mut self, loc: CodeLocation) -> PrestoResult<Expression> {
        let mut properties = Vec::new();
        while self.it.current_type != TokenKind::CloseBrace {
            let key = self.it.current_string();
            if self.it.current_type == TokenKind::Literal && self.it.current_value.is_string() {
                self.it.match_token(TokenKind::Literal)?;
            } else {
                self.it.match_token(TokenKind::Identifier)?;
            }
            self.it.match_token(TokenKind::Colon)?;
            let value = self.parse_expression()?;
            properties.push((key, value));

            if self.it.current_type != TokenKind::CloseBrace {
                self.it.match_token(TokenKind::Comma)?;
            }
        }
        self.it.match_token(TokenKind::CloseBrace)?;
        self.parse_suffixes(Expression::ObjectLiteral { loc, properties })
    }

    fn parse_array_literal(&mut self, loc: CodeLocation) -> PrestoResult<Expression> {
        let mut values = Vec::new();
        while self.it.current_type != TokenKind::CloseBracket {
            values.push(self.parse_expression()?);
            if self.it.current_type != TokenKind::CloseBracket {
                self.it.match_token(TokenKind::Comma)?;
            }
        }
        self.it.match_token(TokenKind::CloseBracket)?;
        self.parse_suffixes(Expression::ArrayLiteral { loc, values })
    }

    fn parse_new_operator(&mut self, loc: CodeLocation) -> PrestoResult<Expression> {
        let mut object = Expression::Unqualified {
            loc: loc.clone(),
            name: self.parse_identifier()?,
        };
        while self.it.match_if(TokenKind::Dot)? {
            object = Expression::DotOperator {
                loc: loc.clone(),
                object: Box::new(object),
                member: self.parse_identifier()?,
            };
        }
        let arguments = self.parse_call_arguments()?;
        Ok(Expression::NewOperator {
            loc,
            object: Box::new(object),
            arguments: Box::new(arguments),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
