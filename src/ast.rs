/// AST node types for scripts.
/// Statements carry their source location; expressions are located by the enclosing statement.
use crate::types::PrimitiveType;
use std::ops::BitOr;
use std::rc::Rc;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub line: u32,
    pub file: Option<Rc<str>>,
}

impl Span {
    pub fn new(line: u32, file: Option<Rc<str>>) -> Self {
        Span { line, file }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Program {
    pub file: Option<Rc<str>>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u16);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const PUBLIC: Modifiers = Modifiers(1);
    pub const PRIVATE: Modifiers = Modifiers(1 << 1);
    pub const PROTECTED: Modifiers = Modifiers(1 << 2);
    pub const STATIC: Modifiers = Modifiers(1 << 3);
    pub const FINAL: Modifiers = Modifiers(1 << 4);
    pub const SYNCHRONIZED: Modifiers = Modifiers(1 << 5);
    pub const ABSTRACT: Modifiers = Modifiers(1 << 6);
    pub const TRANSIENT: Modifiers = Modifiers(1 << 7);
    pub const VOLATILE: Modifiers = Modifiers(1 << 8);
    pub const NATIVE: Modifiers = Modifiers(1 << 9);

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn with(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 | other.0)
    }

    pub const fn without(self, other: Modifiers) -> Modifiers {
        Modifiers(self.0 & !other.0)
    }

    pub fn is_static(self) -> bool {
        self.contains(Modifiers::STATIC)
    }

    pub fn is_final(self) -> bool {
        self.contains(Modifiers::FINAL)
    }

    pub fn is_abstract(self) -> bool {
        self.contains(Modifiers::ABSTRACT)
    }

    pub fn is_synchronized(self) -> bool {
        self.contains(Modifiers::SYNCHRONIZED)
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        self.with(rhs)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TypeNode {
    Primitive(PrimitiveType),
    /// Possibly qualified class name, e.g. `String`, `java.util.Map.Entry`.
    Named(String),
    Array(Box<TypeNode>),
}

impl TypeNode {
    pub fn named(name: &str) -> Self {
        TypeNode::Named(name.to_string())
    }

    pub fn array(self) -> Self {
        TypeNode::Array(Box::new(self))
    }

    pub fn with_dimensions(self, dims: usize) -> Self {
        (0..dims).fold(self, |t, _| t.array())
    }

    pub fn base(&self) -> &TypeNode {
        match self {
            TypeNode::Array(inner) => inner.base(),
            other => other,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Statement {
    pub kind: StatementKind,
    pub span: Span,
}

#[derive(Clone, Debug)]
#[allow(clippy::large_enum_variant)]
pub enum StatementKind {
    Empty,
    Expression(Expression),
    Block(Block),
    Variable(VariableDeclaration),
    If(Box<Expression>, Box<Statement>, Option<Box<Statement>>),
    While(Expression, Box<Statement>),
    DoWhile(Box<Statement>, Expression),
    For(ForStatement),
    ForEach(ForEachStatement),
    Switch(SwitchStatement),
    Return(Option<Expression>),
    Break(Option<String>),
    Continue(Option<String>),
    Throw(Expression),
    Try(TryStatement),
    Labeled(String, Box<Statement>),
    Synchronized(Expression, Block),
    MethodDeclaration(Rc<MethodDecl>),
    ClassDeclaration(Rc<ClassDecl>),
    Import(ImportDeclaration),
    Package(String),
}

#[derive(Clone, Debug, Default)]
pub struct Block {
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct VariableDeclaration {
    pub modifiers: Modifiers,
    /// `None` declares a loosely typed variable.
    pub ty: Option<TypeNode>,
    pub declarators: Vec<Declarator>,
}

#[derive(Clone, Debug)]
pub struct Declarator {
    pub name: String,
    /// Extra `[]` after the name, as in `int a[]`.
    pub dims: usize,
    pub init: Option<Expression>,
}

#[derive(Clone, Debug)]
pub enum ForInit {
    Variable(VariableDeclaration),
    Expressions(Vec<Expression>),
}

#[derive(Clone, Debug)]
pub struct ForStatement {
    pub init: Option<ForInit>,
    pub test: Option<Expression>,
    pub update: Vec<Expression>,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct ForEachStatement {
    pub modifiers: Modifiers,
    pub ty: Option<TypeNode>,
    pub name: String,
    pub iterable: Expression,
    pub body: Box<Statement>,
}

#[derive(Clone, Debug)]
pub struct SwitchStatement {
    pub discriminant: Expression,
    pub cases: Vec<SwitchCase>,
}

#[derive(Clone, Debug)]
pub struct SwitchCase {
    /// `None` is the `default` label.
    pub test: Option<Expression>,
    pub body: Vec<Statement>,
}

#[derive(Clone, Debug)]
pub struct TryStatement {
    pub block: Block,
    pub handlers: Vec<CatchClause>,
    pub finalizer: Option<Block>,
}

#[derive(Clone, Debug)]
pub struct CatchClause {
    /// Empty for an untyped catch; several entries for a multi-catch.
    pub types: Vec<TypeNode>,
    pub name: String,
    pub body: Block,
}

#[derive(Clone, Debug)]
pub struct ImportDeclaration {
    pub name: String,
    pub wildcard: bool,
    pub is_static: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum ReturnType {
    Loose,
    Void,
    Typed(TypeNode),
}

#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: Option<TypeNode>,
    pub modifiers: Modifiers,
    pub varargs: bool,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub return_type: ReturnType,
    pub params: Vec<Param>,
    pub throws: Vec<TypeNode>,
    /// `None` for abstract and interface methods.
    pub body: Option<Block>,
    pub span: Span,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClassKind {
    Class,
    Interface,
}

#[derive(Clone, Debug)]
pub struct ClassDecl {
    pub name: String,
    pub modifiers: Modifiers,
    pub kind: ClassKind,
    pub extends: Option<TypeNode>,
    /// Implemented interfaces, or the extended interfaces of an interface.
    pub implements: Vec<TypeNode>,
    pub body: Rc<ClassBody>,
    pub span: Span,
}

#[derive(Clone, Debug, Default)]
pub struct ClassBody {
    pub members: Vec<Member>,
}

#[derive(Clone, Debug)]
pub enum Member {
    Field(VariableDeclaration),
    Method(Rc<MethodDecl>),
    Constructor(Rc<MethodDecl>),
    Initializer { is_static: bool, block: Block },
    Class(Rc<ClassDecl>),
}

#[derive(Clone, Debug)]
pub enum Literal {
    Null,
    Void,
    Boolean(bool),
    Char(u16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(Rc<str>),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Minus,
    Plus,
    Not,
    BitNot,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Minus => "-",
            UnaryOp::Plus => "+",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "~",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Power,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    NullCoalesce,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Power => "**",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::NullCoalesce => "??",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssignOp {
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    PowerAssign,
    LShiftAssign,
    RShiftAssign,
    URShiftAssign,
    BitAndAssign,
    BitOrAssign,
    BitXorAssign,
    NullCoalesceAssign,
}

impl AssignOp {
    pub fn binary_op(self) -> Option<BinaryOp> {
        Some(match self {
            AssignOp::Assign => return None,
            AssignOp::AddAssign => BinaryOp::Add,
            AssignOp::SubAssign => BinaryOp::Sub,
            AssignOp::MulAssign => BinaryOp::Mul,
            AssignOp::DivAssign => BinaryOp::Div,
            AssignOp::ModAssign => BinaryOp::Mod,
            AssignOp::PowerAssign => BinaryOp::Power,
            AssignOp::LShiftAssign => BinaryOp::LShift,
            AssignOp::RShiftAssign => BinaryOp::RShift,
            AssignOp::URShiftAssign => BinaryOp::URShift,
            AssignOp::BitAndAssign => BinaryOp::BitAnd,
            AssignOp::BitOrAssign => BinaryOp::BitOr,
            AssignOp::BitXorAssign => BinaryOp::BitXor,
            AssignOp::NullCoalesceAssign => BinaryOp::NullCoalesce,
        })
    }
}

#[derive(Clone, Debug)]
pub enum Expression {
    Literal(Literal),
    /// Ambiguous, possibly dotted name: variable, field chain, class or package.
    Name(String),
    Field {
        target: Box<Expression>,
        name: String,
        null_safe: bool,
    },
    Index {
        target: Box<Expression>,
        index: Box<Expression>,
        null_safe: bool,
    },
    Slice {
        target: Box<Expression>,
        from: Option<Box<Expression>>,
        to: Option<Box<Expression>>,
        step: Option<Box<Expression>>,
    },
    /// `target{key}` property style access.
    Property {
        target: Box<Expression>,
        key: Box<Expression>,
    },
    /// Invocation through an ambiguous name: `foo()`, `a.b.foo()`, `super.foo()`.
    Call {
        name: String,
        args: Vec<Expression>,
    },
    MethodCall {
        target: Box<Expression>,
        name: String,
        args: Vec<Expression>,
        null_safe: bool,
    },
    Unary(UnaryOp, Box<Expression>),
    Update {
        op: UpdateOp,
        prefix: bool,
        target: Box<Expression>,
    },
    Binary(BinaryOp, Box<Expression>, Box<Expression>),
    InstanceOf(Box<Expression>, TypeNode),
    Assign(AssignOp, Box<Expression>, Box<Expression>),
    Conditional(Box<Expression>, Box<Expression>, Box<Expression>),
    Cast(TypeNode, Box<Expression>),
    New {
        class: TypeNode,
        args: Vec<Expression>,
        body: Option<Rc<ClassBody>>,
    },
    NewArray {
        /// Base element type, never itself an array.
        element: TypeNode,
        dims: Vec<Expression>,
        extra_dims: usize,
        init: Option<ArrayInitializer>,
    },
    ArrayInit(ArrayInitializer),
    MapEntry(Box<Expression>, Box<Expression>),
    ClassLiteral(TypeNode),
    Lambda(Rc<LambdaExpr>),
}

#[derive(Clone, Debug, Default)]
pub struct ArrayInitializer {
    pub elements: Vec<Expression>,
}

#[derive(Clone, Debug)]
pub struct LambdaExpr {
    pub params: Vec<Param>,
    pub body: LambdaBody,
}

#[derive(Clone, Debug)]
pub enum LambdaBody {
    Expression(Expression),
    Block(Block),
}

impl Expression {
    pub fn is_null_literal(&self) -> bool {
        matches!(self, Expression::Literal(Literal::Null))
    }

    /// Explicit `this(...)`/`super(...)` constructor invocation.
    pub fn constructor_call(&self) -> Option<(&str, &[Expression])> {
        match self {
            Expression::Call { name, args } if name == "this" || name == "super" => {
                Some((name.as_str(), args.as_slice()))
            }
            _ => None,
        }
    }
}

/// Constructors for building trees by hand.
pub mod build {
    use super::*;

    pub fn program(body: Vec<Statement>) -> Program {
        Program { file: None, body }
    }

    pub fn stmt(kind: StatementKind) -> Statement {
        Statement {
            kind,
            span: Span::default(),
        }
    }

    pub fn at(line: u32, mut statement: Statement) -> Statement {
        statement.span.line = line;
        statement
    }

    pub fn null() -> Expression {
        Expression::Literal(Literal::Null)
    }

    pub fn int(i: i32) -> Expression {
        Expression::Literal(Literal::Int(i))
    }

    pub fn long(i: i64) -> Expression {
        Expression::Literal(Literal::Long(i))
    }

    pub fn double(d: f64) -> Expression {
        Expression::Literal(Literal::Double(d))
    }

    pub fn boolean(b: bool) -> Expression {
        Expression::Literal(Literal::Boolean(b))
    }

    pub fn char_lit(c: char) -> Expression {
        let mut buf = [0u16; 2];
        Expression::Literal(Literal::Char(c.encode_utf16(&mut buf)[0]))
    }

    pub fn string(s: &str) -> Expression {
        Expression::Literal(Literal::String(Rc::from(s)))
    }

    pub fn name(n: &str) -> Expression {
        Expression::Name(n.to_string())
    }

    pub fn field(target: Expression, name: &str) -> Expression {
        Expression::Field {
            target: Box::new(target),
            name: name.to_string(),
            null_safe: false,
        }
    }

    pub fn safe_field(target: Expression, name: &str) -> Expression {
        Expression::Field {
            target: Box::new(target),
            name: name.to_string(),
            null_safe: true,
        }
    }

    pub fn index(target: Expression, index: Expression) -> Expression {
        Expression::Index {
            target: Box::new(target),
            index: Box::new(index),
            null_safe: false,
        }
    }

    pub fn slice(target: Expression, from: Option<Expression>, to: Option<Expression>) -> Expression {
        Expression::Slice {
            target: Box::new(target),
            from: from.map(Box::new),
            to: to.map(Box::new),
            step: None,
        }
    }

    pub fn property(target: Expression, key: Expression) -> Expression {
        Expression::Property {
            target: Box::new(target),
            key: Box::new(key),
        }
    }

    pub fn call(name: &str, args: Vec<Expression>) -> Expression {
        Expression::Call {
            name: name.to_string(),
            args,
        }
    }

    pub fn method(target: Expression, name: &str, args: Vec<Expression>) -> Expression {
        Expression::MethodCall {
            target: Box::new(target),
            name: name.to_string(),
            args,
            null_safe: false,
        }
    }

    pub fn safe_method(target: Expression, name: &str, args: Vec<Expression>) -> Expression {
        Expression::MethodCall {
            target: Box::new(target),
            name: name.to_string(),
            args,
            null_safe: true,
        }
    }

    pub fn unary(op: UnaryOp, e: Expression) -> Expression {
        Expression::Unary(op, Box::new(e))
    }

    pub fn not(e: Expression) -> Expression {
        unary(UnaryOp::Not, e)
    }

    pub fn neg(e: Expression) -> Expression {
        unary(UnaryOp::Minus, e)
    }

    fn update(op: UpdateOp, prefix: bool, target: Expression) -> Expression {
        Expression::Update {
            op,
            prefix,
            target: Box::new(target),
        }
    }

    pub fn post_inc(target: Expression) -> Expression {
        update(UpdateOp::Increment, false, target)
    }

    pub fn pre_inc(target: Expression) -> Expression {
        update(UpdateOp::Increment, true, target)
    }

    pub fn post_dec(target: Expression) -> Expression {
        update(UpdateOp::Decrement, false, target)
    }

    pub fn binary(op: BinaryOp, l: Expression, r: Expression) -> Expression {
        Expression::Binary(op, Box::new(l), Box::new(r))
    }

    pub fn add(l: Expression, r: Expression) -> Expression {
        binary(BinaryOp::Add, l, r)
    }

    pub fn lt(l: Expression, r: Expression) -> Expression {
        binary(BinaryOp::Lt, l, r)
    }

    pub fn eq(l: Expression, r: Expression) -> Expression {
        binary(BinaryOp::Eq, l, r)
    }

    pub fn and(l: Expression, r: Expression) -> Expression {
        binary(BinaryOp::And, l, r)
    }

    pub fn or(l: Expression, r: Expression) -> Expression {
        binary(BinaryOp::Or, l, r)
    }

    pub fn instance_of(e: Expression, ty: TypeNode) -> Expression {
        Expression::InstanceOf(Box::new(e), ty)
    }

    pub fn assign(target: Expression, value: Expression) -> Expression {
        Expression::Assign(AssignOp::Assign, Box::new(target), Box::new(value))
    }

    pub fn assign_op(op: AssignOp, target: Expression, value: Expression) -> Expression {
        Expression::Assign(op, Box::new(target), Box::new(value))
    }

    pub fn conditional(test: Expression, then: Expression, otherwise: Expression) -> Expression {
        Expression::Conditional(Box::new(test), Box::new(then), Box::new(otherwise))
    }

    pub fn cast(ty: TypeNode, e: Expression) -> Expression {
        Expression::Cast(ty, Box::new(e))
    }

    pub fn new_object(class: &str, args: Vec<Expression>) -> Expression {
        Expression::New {
            class: TypeNode::named(class),
            args,
            body: None,
        }
    }

    pub fn new_anonymous(class: &str, args: Vec<Expression>, members: Vec<Member>) -> Expression {
        Expression::New {
            class: TypeNode::named(class),
            args,
            body: Some(Rc::new(ClassBody { members })),
        }
    }

    pub fn new_array(element: TypeNode, dims: Vec<Expression>, extra_dims: usize) -> Expression {
        Expression::NewArray {
            element,
            dims,
            extra_dims,
            init: None,
        }
    }

    pub fn array(elements: Vec<Expression>) -> Expression {
        Expression::ArrayInit(ArrayInitializer { elements })
    }

    pub fn entry(key: Expression, value: Expression) -> Expression {
        Expression::MapEntry(Box::new(key), Box::new(value))
    }

    pub fn class_literal(ty: TypeNode) -> Expression {
        Expression::ClassLiteral(ty)
    }

    pub fn lambda(params: &[&str], body: Expression) -> Expression {
        Expression::Lambda(Rc::new(LambdaExpr {
            params: params.iter().map(|p| param(p)).collect(),
            body: LambdaBody::Expression(body),
        }))
    }

    pub fn lambda_block(params: &[&str], body: Vec<Statement>) -> Expression {
        Expression::Lambda(Rc::new(LambdaExpr {
            params: params.iter().map(|p| param(p)).collect(),
            body: LambdaBody::Block(Block { body }),
        }))
    }

    pub fn prim(ty: PrimitiveType) -> TypeNode {
        TypeNode::Primitive(ty)
    }

    pub fn int_type() -> TypeNode {
        TypeNode::Primitive(PrimitiveType::Int)
    }

    pub fn named(name: &str) -> TypeNode {
        TypeNode::named(name)
    }

    pub fn expr(e: Expression) -> Statement {
        stmt(StatementKind::Expression(e))
    }

    pub fn block(body: Vec<Statement>) -> Statement {
        stmt(StatementKind::Block(Block { body }))
    }

    pub fn var(ty: TypeNode, name: &str, init: Option<Expression>) -> Statement {
        var_with(Modifiers::NONE, Some(ty), name, init)
    }

    pub fn var_with(
        modifiers: Modifiers,
        ty: Option<TypeNode>,
        name: &str,
        init: Option<Expression>,
    ) -> Statement {
        stmt(StatementKind::Variable(declaration(modifiers, ty, name, init)))
    }

    pub fn declaration(
        modifiers: Modifiers,
        ty: Option<TypeNode>,
        name: &str,
        init: Option<Expression>,
    ) -> VariableDeclaration {
        VariableDeclaration {
            modifiers,
            ty,
            declarators: vec![Declarator {
                name: name.to_string(),
                dims: 0,
                init,
            }],
        }
    }

    pub fn if_else(test: Expression, then: Statement, otherwise: Option<Statement>) -> Statement {
        stmt(StatementKind::If(
            Box::new(test),
            Box::new(then),
            otherwise.map(Box::new),
        ))
    }

    pub fn while_loop(test: Expression, body: Statement) -> Statement {
        stmt(StatementKind::While(test, Box::new(body)))
    }

    pub fn do_while(body: Statement, test: Expression) -> Statement {
        stmt(StatementKind::DoWhile(Box::new(body), test))
    }

    pub fn for_loop(
        init: Option<ForInit>,
        test: Option<Expression>,
        update: Vec<Expression>,
        body: Statement,
    ) -> Statement {
        stmt(StatementKind::For(ForStatement {
            init,
            test,
            update,
            body: Box::new(body),
        }))
    }

    pub fn for_each(ty: Option<TypeNode>, name: &str, iterable: Expression, body: Statement) -> Statement {
        stmt(StatementKind::ForEach(ForEachStatement {
            modifiers: Modifiers::NONE,
            ty,
            name: name.to_string(),
            iterable,
            body: Box::new(body),
        }))
    }

    pub fn switch(discriminant: Expression, cases: Vec<SwitchCase>) -> Statement {
        stmt(StatementKind::Switch(SwitchStatement { discriminant, cases }))
    }

    pub fn case(test: Option<Expression>, body: Vec<Statement>) -> SwitchCase {
        SwitchCase { test, body }
    }

    pub fn ret(value: Option<Expression>) -> Statement {
        stmt(StatementKind::Return(value))
    }

    pub fn brk(label: Option<&str>) -> Statement {
        stmt(StatementKind::Break(label.map(str::to_string)))
    }

    pub fn cont(label: Option<&str>) -> Statement {
        stmt(StatementKind::Continue(label.map(str::to_string)))
    }

    pub fn throw(e: Expression) -> Statement {
        stmt(StatementKind::Throw(e))
    }

    pub fn labeled(label: &str, body: Statement) -> Statement {
        stmt(StatementKind::Labeled(label.to_string(), Box::new(body)))
    }

    pub fn try_catch(body: Vec<Statement>, handlers: Vec<CatchClause>, finalizer: Option<Vec<Statement>>) -> Statement {
        stmt(StatementKind::Try(TryStatement {
            block: Block { body },
            handlers,
            finalizer: finalizer.map(|body| Block { body }),
        }))
    }

    pub fn catch(types: &[&str], name: &str, body: Vec<Statement>) -> CatchClause {
        CatchClause {
            types: types.iter().map(|t| TypeNode::named(t)).collect(),
            name: name.to_string(),
            body: Block { body },
        }
    }

    pub fn synchronized(lock: Expression, body: Vec<Statement>) -> Statement {
        stmt(StatementKind::Synchronized(lock, Block { body }))
    }

    pub fn import(name: &str, wildcard: bool, is_static: bool) -> Statement {
        stmt(StatementKind::Import(ImportDeclaration {
            name: name.to_string(),
            wildcard,
            is_static,
        }))
    }

    pub fn param(name: &str) -> Param {
        Param {
            name: name.to_string(),
            ty: None,
            modifiers: Modifiers::NONE,
            varargs: false,
        }
    }

    pub fn typed_param(name: &str, ty: TypeNode) -> Param {
        Param {
            name: name.to_string(),
            ty: Some(ty),
            modifiers: Modifiers::NONE,
            varargs: false,
        }
    }

    pub fn method_decl(
        name: &str,
        modifiers: Modifiers,
        return_type: ReturnType,
        params: Vec<Param>,
        body: Option<Vec<Statement>>,
    ) -> Rc<MethodDecl> {
        Rc::new(MethodDecl {
            name: name.to_string(),
            modifiers,
            return_type,
            params,
            throws: Vec::new(),
            body: body.map(|body| Block { body }),
            span: Span::default(),
        })
    }

    /// Loose script method: `name(params) { body }`.
    pub fn function(name: &str, params: &[&str], body: Vec<Statement>) -> Statement {
        let params = params.iter().map(|p| param(p)).collect();
        stmt(StatementKind::MethodDeclaration(method_decl(
            name,
            Modifiers::NONE,
            ReturnType::Loose,
            params,
            Some(body),
        )))
    }

    pub fn method_stmt(decl: Rc<MethodDecl>) -> Statement {
        stmt(StatementKind::MethodDeclaration(decl))
    }

    pub fn class_decl(
        name: &str,
        extends: Option<&str>,
        implements: &[&str],
        members: Vec<Member>,
    ) -> Rc<ClassDecl> {
        Rc::new(ClassDecl {
            name: name.to_string(),
            modifiers: Modifiers::NONE,
            kind: ClassKind::Class,
            extends: extends.map(TypeNode::named),
            implements: implements.iter().map(|t| TypeNode::named(t)).collect(),
            body: Rc::new(ClassBody { members }),
            span: Span::default(),
        })
    }

    pub fn interface_decl(name: &str, extends: &[&str], members: Vec<Member>) -> Rc<ClassDecl> {
        Rc::new(ClassDecl {
            name: name.to_string(),
            modifiers: Modifiers::NONE,
            kind: ClassKind::Interface,
            extends: None,
            implements: extends.iter().map(|t| TypeNode::named(t)).collect(),
            body: Rc::new(ClassBody { members }),
            span: Span::default(),
        })
    }

    pub fn class_stmt(decl: Rc<ClassDecl>) -> Statement {
        stmt(StatementKind::ClassDeclaration(decl))
    }

    pub fn field_member(modifiers: Modifiers, ty: Option<TypeNode>, name: &str, init: Option<Expression>) -> Member {
        Member::Field(declaration(modifiers, ty, name, init))
    }

    pub fn method_member(decl: Rc<MethodDecl>) -> Member {
        Member::Method(decl)
    }

    pub fn constructor(params: Vec<Param>, body: Vec<Statement>) -> Member {
        Member::Constructor(method_decl(
            "<init>",
            Modifiers::PUBLIC,
            ReturnType::Void,
            params,
            Some(body),
        ))
    }

    pub fn initializer(is_static: bool, body: Vec<Statement>) -> Member {
        Member::Initializer {
            is_static,
            block: Block { body },
        }
    }
}
