use crate::interpreter::{ClassRef, ObjectRef};
use std::fmt;
use std::rc::Rc;

/// Runtime value flowing through the evaluator.
///
/// `Void` marks "no value" (an unassigned name, a statement with no result) and must never
/// come to rest in a variable or be passed as an argument. `Null` is an explicit null.
#[derive(Clone, Debug)]
pub enum Value {
    Void,
    Null,
    Primitive(Primitive),
    Object(ObjectRef),
}

impl Value {
    pub fn int(i: i32) -> Self {
        Value::Primitive(Primitive::Int(i))
    }

    pub fn long(i: i64) -> Self {
        Value::Primitive(Primitive::Long(i))
    }

    pub fn double(d: f64) -> Self {
        Value::Primitive(Primitive::Double(d))
    }

    pub fn boolean(b: bool) -> Self {
        Value::Primitive(Primitive::Boolean(b))
    }

    pub fn char(c: char) -> Self {
        let mut buf = [0u16; 2];
        let unit = c.encode_utf16(&mut buf)[0];
        Value::Primitive(Primitive::Char(unit))
    }

    /// A `char` holding one UTF-16 code unit, which may be half of a surrogate pair.
    pub fn char_unit(unit: u16) -> Self {
        Value::Primitive(Primitive::Char(unit))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    pub fn as_primitive(&self) -> Option<Primitive> {
        match self {
            Value::Primitive(p) => Some(*p),
            _ => None,
        }
    }

    /// Reference identity for objects, primitive equality otherwise.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) | (Value::Null, Value::Null) => true,
            (Value::Primitive(a), Value::Primitive(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::int(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::long(i)
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Value::double(d)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::boolean(b)
    }
}

impl From<ObjectRef> for Value {
    fn from(o: ObjectRef) -> Self {
        Value::Object(o)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
}

impl PrimitiveType {
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Boolean,
        PrimitiveType::Char,
        PrimitiveType::Byte,
        PrimitiveType::Short,
        PrimitiveType::Int,
        PrimitiveType::Long,
        PrimitiveType::Float,
        PrimitiveType::Double,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Char => "char",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    pub fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "java.lang.Boolean",
            PrimitiveType::Char => "java.lang.Character",
            PrimitiveType::Byte => "java.lang.Byte",
            PrimitiveType::Short => "java.lang.Short",
            PrimitiveType::Int => "java.lang.Integer",
            PrimitiveType::Long => "java.lang.Long",
            PrimitiveType::Float => "java.lang.Float",
            PrimitiveType::Double => "java.lang.Double",
        }
    }

    pub fn from_wrapper_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.wrapper_name() == name)
    }

    pub fn is_numeric(self) -> bool {
        self != PrimitiveType::Boolean
    }

    pub fn is_integral(self) -> bool {
        matches!(
            self,
            PrimitiveType::Char
                | PrimitiveType::Byte
                | PrimitiveType::Short
                | PrimitiveType::Int
                | PrimitiveType::Long
        )
    }

    /// Widening primitive conversion (identity included).
    pub fn widens_to(self, to: PrimitiveType) -> bool {
        use PrimitiveType::*;
        if self == to {
            return true;
        }
        match self {
            Byte => matches!(to, Short | Int | Long | Float | Double),
            Short | Char => matches!(to, Int | Long | Float | Double),
            Int => matches!(to, Long | Float | Double),
            Long => matches!(to, Float | Double),
            Float => to == Double,
            Boolean | Double => false,
        }
    }

    /// Unary numeric promotion.
    pub fn promoted(self) -> Self {
        match self {
            PrimitiveType::Byte | PrimitiveType::Short | PrimitiveType::Char => PrimitiveType::Int,
            other => other,
        }
    }

    /// Binary numeric promotion; `None` when either side is boolean.
    pub fn binary_promotion(a: Self, b: Self) -> Option<Self> {
        use PrimitiveType::*;
        if !a.is_numeric() || !b.is_numeric() {
            return None;
        }
        Some(if a == Double || b == Double {
            Double
        } else if a == Float || b == Float {
            Float
        } else if a == Long || b == Long {
            Long
        } else {
            Int
        })
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Primitive {
    Boolean(bool),
    Char(u16),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
}

impl Primitive {
    pub fn ty(self) -> PrimitiveType {
        match self {
            Primitive::Boolean(_) => PrimitiveType::Boolean,
            Primitive::Char(_) => PrimitiveType::Char,
            Primitive::Byte(_) => PrimitiveType::Byte,
            Primitive::Short(_) => PrimitiveType::Short,
            Primitive::Int(_) => PrimitiveType::Int,
            Primitive::Long(_) => PrimitiveType::Long,
            Primitive::Float(_) => PrimitiveType::Float,
            Primitive::Double(_) => PrimitiveType::Double,
        }
    }

    pub fn default_for(ty: PrimitiveType) -> Self {
        match ty {
            PrimitiveType::Boolean => Primitive::Boolean(false),
            PrimitiveType::Char => Primitive::Char(0),
            PrimitiveType::Byte => Primitive::Byte(0),
            PrimitiveType::Short => Primitive::Short(0),
            PrimitiveType::Int => Primitive::Int(0),
            PrimitiveType::Long => Primitive::Long(0),
            PrimitiveType::Float => Primitive::Float(0.0),
            PrimitiveType::Double => Primitive::Double(0.0),
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Primitive::Boolean(b) => Some(b),
            _ => None,
        }
    }

    /// Integral payload (char included).
    pub fn as_i64(self) -> Option<i64> {
        match self {
            Primitive::Char(c) => Some(c as i64),
            Primitive::Byte(b) => Some(b as i64),
            Primitive::Short(s) => Some(s as i64),
            Primitive::Int(i) => Some(i as i64),
            Primitive::Long(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_f64(self) -> Option<f64> {
        match self {
            Primitive::Float(f) => Some(f as f64),
            Primitive::Double(d) => Some(d),
            other => other.as_i64().map(|i| i as f64),
        }
    }

    /// Casting conversion between primitive types; boolean only converts to itself.
    pub fn cast(self, to: PrimitiveType) -> Option<Primitive> {
        if to == PrimitiveType::Boolean || self.ty() == PrimitiveType::Boolean {
            return if to == self.ty() { Some(self) } else { None };
        }
        if let Some(v) = self.as_i64() {
            return Some(match to {
                PrimitiveType::Char => Primitive::Char(v as u16),
                PrimitiveType::Byte => Primitive::Byte(v as i8),
                PrimitiveType::Short => Primitive::Short(v as i16),
                PrimitiveType::Int => Primitive::Int(v as i32),
                PrimitiveType::Long => Primitive::Long(v),
                PrimitiveType::Float => Primitive::Float(v as f32),
                PrimitiveType::Double => Primitive::Double(v as f64),
                PrimitiveType::Boolean => return None,
            });
        }
        let d = self.as_f64()?;
        Some(match to {
            // narrowing from floating point goes through int first
            PrimitiveType::Char => Primitive::Char(d as i32 as u16),
            PrimitiveType::Byte => Primitive::Byte(d as i32 as i8),
            PrimitiveType::Short => Primitive::Short(d as i32 as i16),
            PrimitiveType::Int => Primitive::Int(d as i32),
            PrimitiveType::Long => Primitive::Long(d as i64),
            PrimitiveType::Float => Primitive::Float(d as f32),
            PrimitiveType::Double => Primitive::Double(d),
            PrimitiveType::Boolean => return None,
        })
    }

    /// Assignment of an int-sized constant to a narrower integral type when it fits.
    pub fn fits_narrowing(self, to: PrimitiveType) -> bool {
        if !matches!(
            self.ty(),
            PrimitiveType::Int | PrimitiveType::Short | PrimitiveType::Char | PrimitiveType::Byte
        ) {
            return false;
        }
        let Some(v) = self.as_i64() else {
            return false;
        };
        match to {
            PrimitiveType::Byte => (i8::MIN as i64..=i8::MAX as i64).contains(&v),
            PrimitiveType::Short => (i16::MIN as i64..=i16::MAX as i64).contains(&v),
            PrimitiveType::Char => (0..=u16::MAX as i64).contains(&v),
            _ => false,
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Primitive::Boolean(b) => write!(f, "{b}"),
            Primitive::Char(c) => {
                let s = String::from_utf16_lossy(&[*c]);
                f.write_str(&s)
            }
            Primitive::Byte(v) => write!(f, "{v}"),
            Primitive::Short(v) => write!(f, "{v}"),
            Primitive::Int(v) => write!(f, "{v}"),
            Primitive::Long(v) => write!(f, "{v}"),
            Primitive::Float(v) => f.write_str(&primitive_ops::float_to_string(*v)),
            Primitive::Double(v) => f.write_str(&primitive_ops::double_to_string(*v)),
        }
    }
}

/// A resolved runtime type.
#[derive(Clone)]
pub enum Type {
    Primitive(PrimitiveType),
    Class(ClassRef),
    Array(Box<Type>),
}

impl Type {
    pub fn name(&self) -> String {
        match self {
            Type::Primitive(p) => p.name().to_string(),
            Type::Class(c) => c.name.clone(),
            Type::Array(e) => format!("{}[]", e.name()),
        }
    }

    pub fn array_of(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn with_dimensions(self, dims: usize) -> Type {
        (0..dims).fold(self, |t, _| Type::array_of(t))
    }

    pub fn dimensions(&self) -> usize {
        match self {
            Type::Array(e) => 1 + e.dimensions(),
            _ => 0,
        }
    }

    pub fn element(&self) -> Option<&Type> {
        match self {
            Type::Array(e) => Some(e),
            _ => None,
        }
    }

    pub fn base(&self) -> &Type {
        match self {
            Type::Array(e) => e.base(),
            other => other,
        }
    }

    pub fn as_class(&self) -> Option<&ClassRef> {
        match self {
            Type::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, Type::Primitive(_))
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Type::Primitive(a), Type::Primitive(b)) => a == b,
            (Type::Class(a), Type::Class(b)) => Rc::ptr_eq(a, b) || a.name == b.name,
            (Type::Array(a), Type::Array(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

pub mod primitive_ops {
    use super::{Primitive, PrimitiveType};
    use crate::ast::{BinaryOp, UnaryOp};

    #[derive(Clone, Debug, PartialEq)]
    pub enum OpError {
        DivideByZero,
        Operand(String),
    }

    fn inappropriate(op: BinaryOp, kind: &str) -> OpError {
        OpError::Operand(format!(
            "Operator: '{}' inappropriate for {kind} operands",
            op.symbol()
        ))
    }

    macro_rules! integral_op {
        ($op:expr, $a:expr, $b:expr, $ctor:path, $kind:expr) => {{
            let (a, b) = ($a, $b);
            Ok(match $op {
                BinaryOp::Add => $ctor(a.wrapping_add(b)),
                BinaryOp::Sub => $ctor(a.wrapping_sub(b)),
                BinaryOp::Mul => $ctor(a.wrapping_mul(b)),
                BinaryOp::Div if b == 0 => return Err(OpError::DivideByZero),
                BinaryOp::Div => $ctor(a.wrapping_div(b)),
                BinaryOp::Mod if b == 0 => return Err(OpError::DivideByZero),
                BinaryOp::Mod => $ctor(a.wrapping_rem(b)),
                BinaryOp::BitAnd => $ctor(a & b),
                BinaryOp::BitOr => $ctor(a | b),
                BinaryOp::BitXor => $ctor(a ^ b),
                BinaryOp::Lt => Primitive::Boolean(a < b),
                BinaryOp::Gt => Primitive::Boolean(a > b),
                BinaryOp::LtEq => Primitive::Boolean(a <= b),
                BinaryOp::GtEq => Primitive::Boolean(a >= b),
                BinaryOp::Eq => Primitive::Boolean(a == b),
                BinaryOp::NotEq => Primitive::Boolean(a != b),
                op => return Err(inappropriate(op, $kind)),
            })
        }};
    }

    macro_rules! floating_op {
        ($op:expr, $a:expr, $b:expr, $ctor:path, $kind:expr) => {{
            let (a, b) = ($a, $b);
            Ok(match $op {
                BinaryOp::Add => $ctor(a + b),
                BinaryOp::Sub => $ctor(a - b),
                BinaryOp::Mul => $ctor(a * b),
                BinaryOp::Div => $ctor(a / b),
                BinaryOp::Mod => $ctor(a % b),
                BinaryOp::Lt => Primitive::Boolean(a < b),
                BinaryOp::Gt => Primitive::Boolean(a > b),
                BinaryOp::LtEq => Primitive::Boolean(a <= b),
                BinaryOp::GtEq => Primitive::Boolean(a >= b),
                BinaryOp::Eq => Primitive::Boolean(a == b),
                BinaryOp::NotEq => Primitive::Boolean(a != b),
                op => return Err(inappropriate(op, $kind)),
            })
        }};
    }

    /// Applies a binary operator to two primitives after numeric promotion.
    pub fn binary(op: BinaryOp, lhs: Primitive, rhs: Primitive) -> Result<Primitive, OpError> {
        if let (Primitive::Boolean(a), Primitive::Boolean(b)) = (lhs, rhs) {
            return boolean_op(op, a, b);
        }
        let Some(ty) = PrimitiveType::binary_promotion(lhs.ty(), rhs.ty()) else {
            return Err(inappropriate(op, "boolean and numeric"));
        };
        match op {
            BinaryOp::LShift | BinaryOp::RShift | BinaryOp::URShift => shift(op, lhs, rhs),
            BinaryOp::Power => Ok(power(lhs, rhs)),
            _ => match ty {
                PrimitiveType::Int => {
                    let a = lhs.as_i64().unwrap_or_default() as i32;
                    let b = rhs.as_i64().unwrap_or_default() as i32;
                    integral_op!(op, a, b, Primitive::Int, "int")
                }
                PrimitiveType::Long => {
                    let a = lhs.as_i64().unwrap_or_default();
                    let b = rhs.as_i64().unwrap_or_default();
                    integral_op!(op, a, b, Primitive::Long, "long")
                }
                PrimitiveType::Float => {
                    let a = lhs.as_f64().unwrap_or_default() as f32;
                    let b = rhs.as_f64().unwrap_or_default() as f32;
                    floating_op!(op, a, b, Primitive::Float, "float")
                }
                _ => {
                    let a = lhs.as_f64().unwrap_or_default();
                    let b = rhs.as_f64().unwrap_or_default();
                    floating_op!(op, a, b, Primitive::Double, "double")
                }
            },
        }
    }

    fn boolean_op(op: BinaryOp, a: bool, b: bool) -> Result<Primitive, OpError> {
        Ok(Primitive::Boolean(match op {
            BinaryOp::And | BinaryOp::BitAnd => a & b,
            BinaryOp::Or | BinaryOp::BitOr => a | b,
            BinaryOp::BitXor => a ^ b,
            BinaryOp::Eq => a == b,
            BinaryOp::NotEq => a != b,
            op => return Err(inappropriate(op, "boolean")),
        }))
    }

    fn shift(op: BinaryOp, lhs: Primitive, rhs: Primitive) -> Result<Primitive, OpError> {
        let (Some(value), Some(distance)) = (lhs.as_i64(), rhs.as_i64()) else {
            return Err(inappropriate(op, "floating point"));
        };
        let distance = distance as u32;
        Ok(if lhs.ty().promoted() == PrimitiveType::Long {
            Primitive::Long(match op {
                BinaryOp::LShift => value.wrapping_shl(distance),
                BinaryOp::RShift => value.wrapping_shr(distance),
                _ => (value as u64).wrapping_shr(distance) as i64,
            })
        } else {
            let value = value as i32;
            Primitive::Int(match op {
                BinaryOp::LShift => value.wrapping_shl(distance),
                BinaryOp::RShift => value.wrapping_shr(distance),
                _ => (value as u32).wrapping_shr(distance) as i32,
            })
        })
    }

    // integral powers stay integral while they fit, widening int -> long -> double
    fn power(lhs: Primitive, rhs: Primitive) -> Primitive {
        if let (Some(base), Some(exp)) = (lhs.as_i64(), rhs.as_i64()) {
            if let Ok(exp) = u32::try_from(exp) {
                if let Some(result) = base.checked_pow(exp) {
                    let both_int = lhs.ty().promoted() == PrimitiveType::Int
                        && rhs.ty().promoted() == PrimitiveType::Int;
                    if both_int {
                        if let Ok(small) = i32::try_from(result) {
                            return Primitive::Int(small);
                        }
                    }
                    return Primitive::Long(result);
                }
            }
        }
        let base = lhs.as_f64().unwrap_or_default();
        let exp = rhs.as_f64().unwrap_or_default();
        Primitive::Double(base.powf(exp))
    }

    pub fn unary(op: UnaryOp, value: Primitive) -> Result<Primitive, OpError> {
        let kind = value.ty();
        if op == UnaryOp::Not {
            return match value {
                Primitive::Boolean(b) => Ok(Primitive::Boolean(!b)),
                _ => Err(OpError::Operand(format!(
                    "Operator '!' inappropriate for type {kind}"
                ))),
            };
        }
        let promoted = match value.cast(kind.promoted()) {
            Some(p) if kind.is_numeric() => p,
            _ => {
                return Err(OpError::Operand(format!(
                    "Operator '{}' inappropriate for type {kind}",
                    op.symbol()
                )));
            }
        };
        match (op, promoted) {
            (UnaryOp::Plus, p) => Ok(p),
            (UnaryOp::Minus, Primitive::Int(i)) => Ok(Primitive::Int(i.wrapping_neg())),
            (UnaryOp::Minus, Primitive::Long(l)) => Ok(Primitive::Long(l.wrapping_neg())),
            (UnaryOp::Minus, Primitive::Float(f)) => Ok(Primitive::Float(-f)),
            (UnaryOp::Minus, Primitive::Double(d)) => Ok(Primitive::Double(-d)),
            (UnaryOp::BitNot, Primitive::Int(i)) => Ok(Primitive::Int(!i)),
            (UnaryOp::BitNot, Primitive::Long(l)) => Ok(Primitive::Long(!l)),
            _ => Err(OpError::Operand(format!(
                "Operator '{}' inappropriate for type {kind}",
                op.symbol()
            ))),
        }
    }

    fn decorate(plain: String, scientific: String, abs: f64) -> String {
        if (1e-3..1e7).contains(&abs) {
            if plain.contains('.') {
                plain
            } else {
                format!("{plain}.0")
            }
        } else {
            let (mantissa, exp) = scientific
                .split_once('e')
                .map(|(m, e)| (m.to_string(), e.to_string()))
                .unwrap_or((scientific.clone(), "0".to_string()));
            if mantissa.contains('.') {
                format!("{mantissa}E{exp}")
            } else {
                format!("{mantissa}.0E{exp}")
            }
        }
    }

    pub fn double_to_string(d: f64) -> String {
        if d.is_nan() {
            return "NaN".to_string();
        }
        if d.is_infinite() {
            return if d > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
        }
        if d == 0.0 {
            return if d.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
        }
        decorate(format!("{d}"), format!("{d:e}"), d.abs())
    }

    pub fn float_to_string(f: f32) -> String {
        if f.is_nan() || f.is_infinite() || f == 0.0 {
            return double_to_string(f as f64);
        }
        decorate(format!("{f}"), format!("{f:e}"), (f as f64).abs())
    }
}

#[cfg(test)]
mod tests {
    use super::primitive_ops::*;
    use super::*;
    use crate::ast::{BinaryOp, UnaryOp};

    #[test]
    fn promotion_lattice() {
        assert!(PrimitiveType::Byte.widens_to(PrimitiveType::Double));
        assert!(PrimitiveType::Char.widens_to(PrimitiveType::Int));
        assert!(!PrimitiveType::Char.widens_to(PrimitiveType::Short));
        assert!(!PrimitiveType::Long.widens_to(PrimitiveType::Int));
        assert!(!PrimitiveType::Boolean.widens_to(PrimitiveType::Int));
        assert_eq!(
            PrimitiveType::binary_promotion(PrimitiveType::Char, PrimitiveType::Byte),
            Some(PrimitiveType::Int)
        );
        assert_eq!(
            PrimitiveType::binary_promotion(PrimitiveType::Long, PrimitiveType::Float),
            Some(PrimitiveType::Float)
        );
    }

    #[test]
    fn integer_arithmetic_wraps() {
        let r = binary(BinaryOp::Add, Primitive::Int(i32::MAX), Primitive::Int(1)).unwrap();
        assert_eq!(r, Primitive::Int(i32::MIN));
        let r = binary(BinaryOp::Mul, Primitive::Char(b'a' as u16), Primitive::Byte(2)).unwrap();
        assert_eq!(r, Primitive::Int(194));
    }

    #[test]
    fn integer_division_by_zero() {
        assert_eq!(
            binary(BinaryOp::Div, Primitive::Int(1), Primitive::Int(0)),
            Err(OpError::DivideByZero)
        );
        let r = binary(BinaryOp::Div, Primitive::Double(1.0), Primitive::Int(0)).unwrap();
        assert_eq!(r, Primitive::Double(f64::INFINITY));
    }

    #[test]
    fn shifts_mask_distance() {
        assert_eq!(
            binary(BinaryOp::LShift, Primitive::Int(1), Primitive::Int(33)).unwrap(),
            Primitive::Int(2)
        );
        assert_eq!(
            binary(BinaryOp::URShift, Primitive::Int(-1), Primitive::Int(28)).unwrap(),
            Primitive::Int(15)
        );
        assert_eq!(
            binary(BinaryOp::RShift, Primitive::Long(-16), Primitive::Int(2)).unwrap(),
            Primitive::Long(-4)
        );
    }

    #[test]
    fn power_stays_integral_while_it_fits() {
        assert_eq!(
            binary(BinaryOp::Power, Primitive::Int(2), Primitive::Int(10)).unwrap(),
            Primitive::Int(1024)
        );
        assert_eq!(
            binary(BinaryOp::Power, Primitive::Int(2), Primitive::Int(40)).unwrap(),
            Primitive::Long(1 << 40)
        );
        assert_eq!(
            binary(BinaryOp::Power, Primitive::Int(2), Primitive::Int(-1)).unwrap(),
            Primitive::Double(0.5)
        );
    }

    #[test]
    fn boolean_and_number_do_not_mix() {
        assert!(binary(BinaryOp::Add, Primitive::Boolean(true), Primitive::Int(1)).is_err());
        assert!(binary(BinaryOp::Add, Primitive::Boolean(true), Primitive::Boolean(true)).is_err());
        assert_eq!(
            binary(BinaryOp::BitXor, Primitive::Boolean(true), Primitive::Boolean(true)).unwrap(),
            Primitive::Boolean(false)
        );
    }

    #[test]
    fn unary_promotes_narrow_types() {
        assert_eq!(unary(UnaryOp::Minus, Primitive::Byte(3)).unwrap(), Primitive::Int(-3));
        assert_eq!(unary(UnaryOp::BitNot, Primitive::Long(0)).unwrap(), Primitive::Long(-1));
        assert!(unary(UnaryOp::Not, Primitive::Int(0)).is_err());
        assert!(unary(UnaryOp::BitNot, Primitive::Double(1.0)).is_err());
    }

    #[test]
    fn casts_follow_narrowing_rules() {
        assert_eq!(Primitive::Int(300).cast(PrimitiveType::Byte), Some(Primitive::Byte(44)));
        assert_eq!(Primitive::Double(3.9).cast(PrimitiveType::Int), Some(Primitive::Int(3)));
        assert_eq!(Primitive::Double(f64::NAN).cast(PrimitiveType::Long), Some(Primitive::Long(0)));
        assert_eq!(Primitive::Boolean(true).cast(PrimitiveType::Int), None);
        assert!(Primitive::Int(100).fits_narrowing(PrimitiveType::Byte));
        assert!(!Primitive::Int(200).fits_narrowing(PrimitiveType::Byte));
        assert!(!Primitive::Long(1).fits_narrowing(PrimitiveType::Byte));
    }

    #[test]
    fn floating_point_text() {
        assert_eq!(double_to_string(1.0), "1.0");
        assert_eq!(double_to_string(0.1), "0.1");
        assert_eq!(double_to_string(1e10), "1.0E10");
        assert_eq!(double_to_string(1.5e-5), "1.5E-5");
        assert_eq!(double_to_string(f64::NEG_INFINITY), "-Infinity");
        assert_eq!(float_to_string(2.5), "2.5");
        assert_eq!(Primitive::Char(b'x' as u16).to_string(), "x");
    }
}
