use std::{fmt::Display, rc::Rc};

use crate::Span;

use super::operators::{AssignmentOperator, BinaryOperator, UnaryOperator};

/// Index of a node in its [`SyntaxTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    Boolean,
    Null,
}

/// Every syntax construct of the language.
///
/// Children are referenced by [`NodeId`]; the tree itself owns all nodes.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    CompilationUnit {
        items: Vec<NodeId>,
    },
    Module {
        path: Vec<String>,
        body: Vec<NodeId>,
    },
    Namespace {
        path: Vec<String>,
        body: Vec<NodeId>,
    },
    Import {
        path: Vec<String>,
    },
    FunctionDef {
        name: String,
        parameters: Vec<NodeId>,
        return_type: Option<NodeId>,
        body: NodeId,
        /// The wrapper synthesized around top-level statements.
        is_implicit: bool,
    },
    Parameter {
        name: String,
        type_annotation: NodeId,
    },
    StructDef {
        name: String,
        members: Vec<NodeId>,
    },
    Field {
        name: String,
        type_annotation: NodeId,
    },
    TypeAlias {
        name: String,
        target: NodeId,
    },
    TypeName {
        name: String,
    },

    Block {
        statements: Vec<NodeId>,
    },
    Let {
        name: String,
        is_constant: bool,
        type_annotation: Option<NodeId>,
        initializer: Option<NodeId>,
    },
    Return {
        value: Option<NodeId>,
        is_implicit: bool,
    },
    Yield {
        value: NodeId,
    },
    ExpressionStatement {
        expression: NodeId,
    },

    Literal {
        kind: LiteralKind,
        lexeme: String,
    },
    Identifier {
        name: String,
    },
    Binary {
        left: NodeId,
        operator: BinaryOperator,
        right: NodeId,
    },
    Unary {
        operator: UnaryOperator,
        operand: NodeId,
    },
    Grouping {
        inner: NodeId,
    },
    Assignment {
        assignee: NodeId,
        operator: AssignmentOperator,
        value: NodeId,
    },
    Call {
        callee: NodeId,
        arguments: Vec<NodeId>,
    },
    MemberAccess {
        target: NodeId,
        member: String,
    },
    StructInit {
        type_name: NodeId,
        fields: Vec<(String, NodeId)>,
    },
    Conditional {
        condition: NodeId,
        consequent: NodeId,
        /// Either a `Block` or a nested `Conditional` (`else if`).
        alternate: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
}

impl NodeKind {
    /// Child nodes in source order.
    pub fn children(&self) -> Vec<NodeId> {
        match self {
            NodeKind::CompilationUnit { items } => items.clone(),
            NodeKind::Module { body, .. } | NodeKind::Namespace { body, .. } => body.clone(),
            NodeKind::Import { .. }
            | NodeKind::TypeName { .. }
            | NodeKind::Literal { .. }
            | NodeKind::Identifier { .. } => vec![],
            NodeKind::FunctionDef {
                parameters,
                return_type,
                body,
                ..
            } => {
                let mut children = parameters.clone();
                children.extend(return_type.iter().copied());
                children.push(*body);
                children
            }
            NodeKind::Parameter {
                type_annotation, ..
            }
            | NodeKind::Field {
                type_annotation, ..
            } => vec![*type_annotation],
            NodeKind::StructDef { members, .. } => members.clone(),
            NodeKind::TypeAlias { target, .. } => vec![*target],
            NodeKind::Block { statements } => statements.clone(),
            NodeKind::Let {
                type_annotation,
                initializer,
                ..
            } => type_annotation
                .iter()
                .chain(initializer.iter())
                .copied()
                .collect(),
            NodeKind::Return { value, .. } => value.iter().copied().collect(),
            NodeKind::Yield { value } => vec![*value],
            NodeKind::ExpressionStatement { expression } => vec![*expression],
            NodeKind::Binary { left, right, .. } => vec![*left, *right],
            NodeKind::Unary { operand, .. } => vec![*operand],
            NodeKind::Grouping { inner } => vec![*inner],
            NodeKind::Assignment {
                assignee, value, ..
            } => vec![*assignee, *value],
            NodeKind::Call { callee, arguments } => {
                let mut children = vec![*callee];
                children.extend(arguments.iter().copied());
                children
            }
            NodeKind::MemberAccess { target, .. } => vec![*target],
            NodeKind::StructInit { type_name, fields } => {
                let mut children = vec![*type_name];
                children.extend(fields.iter().map(|(_, value)| *value));
                children
            }
            NodeKind::Conditional {
                condition,
                consequent,
                alternate,
            } => {
                let mut children = vec![*condition, *consequent];
                children.extend(alternate.iter().copied());
                children
            }
            NodeKind::While { condition, body } => vec![*condition, *body],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            NodeKind::CompilationUnit { .. } => "compilation unit",
            NodeKind::Module { .. } => "module",
            NodeKind::Namespace { .. } => "namespace",
            NodeKind::Import { .. } => "import",
            NodeKind::FunctionDef { .. } => "function definition",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::StructDef { .. } => "struct definition",
            NodeKind::Field { .. } => "field",
            NodeKind::TypeAlias { .. } => "type alias",
            NodeKind::TypeName { .. } => "type name",
            NodeKind::Block { .. } => "block",
            NodeKind::Let { .. } => "let declaration",
            NodeKind::Return { .. } => "return statement",
            NodeKind::Yield { .. } => "yield statement",
            NodeKind::ExpressionStatement { .. } => "expression statement",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::Binary { .. } => "binary expression",
            NodeKind::Unary { .. } => "unary expression",
            NodeKind::Grouping { .. } => "grouping",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Call { .. } => "call",
            NodeKind::MemberAccess { .. } => "member access",
            NodeKind::StructInit { .. } => "struct initializer",
            NodeKind::Conditional { .. } => "conditional",
            NodeKind::While { .. } => "while loop",
        }
    }

    /// Whether this node introduces a named symbol.
    pub fn is_declaration(&self) -> bool {
        matches!(
            self,
            NodeKind::FunctionDef { .. }
                | NodeKind::Parameter { .. }
                | NodeKind::StructDef { .. }
                | NodeKind::Field { .. }
                | NodeKind::TypeAlias { .. }
                | NodeKind::Let { .. }
        )
    }

    pub fn declared_name(&self) -> Option<&str> {
        match self {
            NodeKind::FunctionDef { name, .. }
            | NodeKind::Parameter { name, .. }
            | NodeKind::StructDef { name, .. }
            | NodeKind::Field { name, .. }
            | NodeKind::TypeAlias { name, .. }
            | NodeKind::Let { name, .. } => Some(name),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Arena of syntax nodes for one source file.
///
/// Node ids are stable for the lifetime of the tree; passes that synthesize nodes
/// push new ones and splice their ids into a parent.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<Node>,
    root: Option<NodeId>,
    file: Rc<String>,
}

impl SyntaxTree {
    pub fn new(file: Rc<String>) -> Self {
        SyntaxTree {
            nodes: vec![],
            root: None,
            file,
        }
    }

    pub fn push(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, span });
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.get(id).kind
    }

    pub fn span(&self, id: NodeId) -> &Span {
        &self.get(id).span
    }

    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        self.kind(id).children()
    }

    pub fn set_root(&mut self, id: NodeId) {
        self.root = Some(id);
    }

    /// The compilation unit, once the parser has finished the tree.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn file(&self) -> &Rc<String> {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids reachable from `from`, parents before children.
    pub fn descendants(&self, from: NodeId) -> Vec<NodeId> {
        let mut order = vec![];
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            order.push(id);
            let children = self.children(id);
            stack.extend(children.into_iter().rev());
        }

        order
    }
}
