use std::{fmt::Display, rc::Rc};

use crate::{
    ast::ast::{NodeId, SyntaxTree},
    errors::errors::{Diagnostic, Diagnostics, InternalError},
    lexer::lexer::tokenize,
    parser::parser::parse,
    semantic::{
        binder::{binder::Binder, bound::BoundNode},
        passes::{check, declare, implicit, names, types},
        symbols::{
            assembly::{Assembly, Dependencies},
            table::SymbolTable,
            types::Ty,
        },
    },
};

#[derive(Debug, Clone)]
pub struct CompilationOptions {
    pub assembly_name: String,
    /// Safety bound on type-resolution rounds; exceeding it is an internal error.
    pub max_fixpoint_rounds: usize,
    pub dependencies: Dependencies,
}

impl Default for CompilationOptions {
    fn default() -> Self {
        CompilationOptions {
            assembly_name: String::from("main"),
            max_fixpoint_rounds: types::MAX_FIXPOINT_ROUNDS,
            dependencies: Dependencies::default(),
        }
    }
}

impl CompilationOptions {
    pub fn with_assembly_name(mut self, name: impl Into<String>) -> Self {
        self.assembly_name = name.into();
        self
    }

    pub fn with_max_fixpoint_rounds(mut self, rounds: usize) -> Self {
        self.max_fixpoint_rounds = rounds;
        self
    }

    pub fn with_dependency(mut self, assembly: Rc<Assembly>) -> Self {
        self.dependencies.push(assembly);
        self
    }
}

/// The analysis passes, in the order they run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Implicit,
    Declare,
    Names,
    Types,
    Check,
}

impl Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Implicit => write!(f, "implicit"),
            Phase::Declare => write!(f, "declare"),
            Phase::Names => write!(f, "names"),
            Phase::Types => write!(f, "types"),
            Phase::Check => write!(f, "check"),
        }
    }
}

/// One compilation unit and everything the analyzer learns about it.
///
/// All state is owned here; nothing is shared between compilations except the
/// read-only dependency assemblies.
pub struct Compilation {
    options: CompilationOptions,
    tree: SyntaxTree,
    table: SymbolTable,
    binder: Binder,
    diagnostics: Diagnostics,
    analyzed: bool,
    halted_at: Option<Phase>,
    rounds: usize,
}

impl Compilation {
    pub fn new(tree: SyntaxTree, options: CompilationOptions) -> Self {
        Compilation {
            options,
            tree,
            table: SymbolTable::new(),
            binder: Binder::new(),
            diagnostics: Diagnostics::new(),
            analyzed: false,
            halted_at: None,
            rounds: 0,
        }
    }

    /// Tokenizes and parses `source`. Syntax errors are returned as a single diagnostic.
    pub fn from_source(
        source: &str,
        file: &str,
        options: CompilationOptions,
    ) -> Result<Self, Diagnostic> {
        let tokens = tokenize(source.to_string(), Some(file.to_string()))?;
        let tree = parse(tokens, Rc::new(file.to_string()))?;
        Ok(Compilation::new(tree, options))
    }

    /// Runs every pass in order, stopping at the first phase that reported an error.
    ///
    /// Returns whether the program is valid. Running it again is a no-op.
    #[tracing::instrument(skip_all, fields(assembly = %self.options.assembly_name))]
    pub fn analyze(&mut self) -> Result<bool, InternalError> {
        if self.analyzed {
            return Ok(self.is_valid_program());
        }
        self.analyzed = true;

        implicit::run(&mut self.tree, &mut self.diagnostics)?;
        if self.halt(Phase::Implicit) {
            return Ok(false);
        }

        let imports = declare::run(
            &self.tree,
            &mut self.table,
            &mut self.binder,
            &mut self.diagnostics,
        )?;
        if self.halt(Phase::Declare) {
            return Ok(false);
        }

        names::run(
            &self.tree,
            &self.table,
            &self.options.dependencies,
            &mut self.binder,
            &imports,
            &mut self.diagnostics,
        )?;
        if self.halt(Phase::Names) {
            return Ok(false);
        }

        self.rounds = types::run(
            &self.tree,
            &mut self.table,
            &self.options.dependencies,
            &mut self.binder,
            &imports,
            self.options.max_fixpoint_rounds,
            &mut self.diagnostics,
        )?;
        if self.halt(Phase::Types) {
            return Ok(false);
        }

        check::run(
            &self.tree,
            &self.table,
            &self.options.dependencies,
            &self.binder,
            &mut self.diagnostics,
        )?;
        if self.halt(Phase::Check) {
            return Ok(false);
        }

        tracing::debug!(rounds = self.rounds, "analysis finished");
        Ok(true)
    }

    fn halt(&mut self, phase: Phase) -> bool {
        if !self.diagnostics.has_errors() {
            return false;
        }

        tracing::debug!(
            %phase,
            errors = self.diagnostics.error_count(),
            "stopping at phase boundary"
        );
        self.halted_at = Some(phase);
        true
    }

    /// True once analysis ran to the end without recording an error.
    pub fn is_valid_program(&self) -> bool {
        self.analyzed && self.halted_at.is_none() && !self.diagnostics.has_errors()
    }

    pub fn analyzed(&self) -> bool {
        self.analyzed
    }

    /// The phase after which analysis stopped because of errors.
    pub fn halted_at(&self) -> Option<Phase> {
        self.halted_at
    }

    /// Complete-analysis rounds the type fixpoint needed after its first pass.
    pub fn fixpoint_rounds(&self) -> usize {
        self.rounds
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    pub fn binder(&self) -> &Binder {
        &self.binder
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.table
    }

    pub fn dependencies(&self) -> &Dependencies {
        &self.options.dependencies
    }

    pub fn bound(&self, node: NodeId) -> Option<&BoundNode> {
        self.binder.get(node)
    }

    pub fn type_of(&self, node: NodeId) -> Ty {
        self.binder.type_of(node)
    }

    /// The finished symbol table, usable as a dependency. `None` unless the program is
    /// valid.
    pub fn into_assembly(self) -> Option<Assembly> {
        if !self.is_valid_program() {
            return None;
        }
        Some(Assembly::new(self.options.assembly_name, self.table))
    }
}
