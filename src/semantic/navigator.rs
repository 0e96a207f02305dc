use crate::{
    ast::ast::NodeId,
    errors::errors::InternalError,
    semantic::{binder::binder::Binder, symbols::ids::ScopeId},
};

/// Cursor over the scope tree that follows the traversal of the syntax tree.
///
/// The root scope is never popped.
#[derive(Debug, Clone)]
pub struct ScopeNavigator {
    stack: Vec<ScopeId>,
}

impl ScopeNavigator {
    pub fn new(root: ScopeId) -> Self {
        ScopeNavigator { stack: vec![root] }
    }

    pub fn current(&self) -> ScopeId {
        // The stack always holds the root.
        self.stack[self.stack.len() - 1]
    }

    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn begin_scope(&mut self, scope: ScopeId) {
        self.stack.push(scope);
    }

    pub fn end_scope(&mut self) -> Result<ScopeId, InternalError> {
        if self.stack.len() == 1 {
            return Err(InternalError::ScopeUnderflow);
        }
        self.stack.pop().ok_or(InternalError::ScopeUnderflow)
    }

    pub fn begin_function(&mut self, binder: &Binder, node: NodeId) -> Result<(), InternalError> {
        self.begin_scope(binder.function_scope(node)?);
        Ok(())
    }

    pub fn begin_struct(&mut self, binder: &Binder, node: NodeId) -> Result<(), InternalError> {
        self.begin_scope(binder.struct_scope(node)?);
        Ok(())
    }

    pub fn begin_module(&mut self, binder: &Binder, node: NodeId) -> Result<(), InternalError> {
        self.begin_scope(binder.module_scope(node)?);
        Ok(())
    }

    pub fn begin_consequent(&mut self, binder: &Binder, node: NodeId) -> Result<(), InternalError> {
        self.begin_scope(binder.consequent_scope(node)?);
        Ok(())
    }

    /// Enters the else block of `node`. Returns `false`, leaving the cursor in place,
    /// when the alternate has no scope of its own.
    pub fn begin_alternate(&mut self, binder: &Binder, node: NodeId) -> Result<bool, InternalError> {
        match binder.alternate_scope(node)? {
            Some(scope) => {
                self.begin_scope(scope);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn begin_loop_body(&mut self, binder: &Binder, node: NodeId) -> Result<(), InternalError> {
        self.begin_scope(binder.loop_scope(node)?);
        Ok(())
    }

    /// Jumps straight to a recorded scope, keeping only the root beneath it.
    pub fn restore(&mut self, scope: ScopeId) {
        self.stack.truncate(1);
        if scope != self.stack[0] {
            self.stack.push(scope);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        ast::ast::NodeId,
        errors::errors::InternalError,
        semantic::{
            binder::{binder::Binder, bound::BoundFact},
            symbols::ids::ScopeId,
        },
    };

    use super::ScopeNavigator;

    #[test]
    fn test_end_scope_on_root_underflows() {
        let mut navigator = ScopeNavigator::new(ScopeId(0));
        assert_eq!(navigator.end_scope(), Err(InternalError::ScopeUnderflow));

        navigator.begin_scope(ScopeId(4));
        assert_eq!(navigator.current(), ScopeId(4));
        assert_eq!(navigator.end_scope(), Ok(ScopeId(4)));
        assert_eq!(navigator.current(), ScopeId(0));
    }

    #[test]
    fn test_node_scopes_come_from_the_binder() {
        let mut binder = Binder::new();
        binder.ensure(
            NodeId(1),
            BoundFact::Conditional {
                then_scope: ScopeId(2),
                else_scope: None,
            },
        );

        let mut navigator = ScopeNavigator::new(ScopeId(0));
        navigator.begin_consequent(&binder, NodeId(1)).unwrap();
        assert_eq!(navigator.current(), ScopeId(2));
        navigator.end_scope().unwrap();

        assert_eq!(navigator.begin_alternate(&binder, NodeId(1)), Ok(false));
        assert_eq!(navigator.current(), ScopeId(0));

        assert!(matches!(
            navigator.begin_function(&binder, NodeId(7)),
            Err(InternalError::NodeNotBound { .. })
        ));
    }

    #[test]
    fn test_restore_resets_the_stack() {
        let mut navigator = ScopeNavigator::new(ScopeId(0));
        navigator.begin_scope(ScopeId(1));
        navigator.begin_scope(ScopeId(2));

        navigator.restore(ScopeId(5));
        assert_eq!(navigator.current(), ScopeId(5));
        assert_eq!(navigator.depth(), 2);

        navigator.restore(ScopeId(0));
        assert_eq!(navigator.depth(), 1);
    }
}
