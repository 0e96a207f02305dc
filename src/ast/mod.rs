/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the syntax tree
///
/// Submodules:
/// - ast: the node arena, node kinds and generic child traversal
/// - operators: binary, unary and assignment operators
pub mod ast;
pub mod operators;

#[cfg(test)]
mod tests;
