//! Boolean condition trees and their compilation to condition-expression text.
//!
//! A [`Condition`] is built with the associated constructors, then compiled
//! against an [`ExpressionAttributes`] table which hands out the `#nN` / `:vN`
//! placeholders. Logical nodes validate their arity when they are built, so a
//! tree that exists is always compilable.

use std::fmt;

use dynamap_model::AttributeValue;

use super::ExpressionError;
use super::attributes::ExpressionAttributes;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (`=`).
    Eq,
    /// Not equal (`<>`).
    Ne,
    /// Less than (`<`).
    Lt,
    /// Less than or equal (`<=`).
    Le,
    /// Greater than (`>`).
    Gt,
    /// Greater than or equal (`>=`).
    Ge,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "<>"),
            Self::Lt => write!(f, "<"),
            Self::Le => write!(f, "<="),
            Self::Gt => write!(f, ">"),
            Self::Ge => write!(f, ">="),
        }
    }
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogicalOp {
    /// Logical AND, two or more children.
    And,
    /// Logical OR, two or more children.
    Or,
    /// Logical NOT, exactly one child.
    Not,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And => write!(f, "AND"),
            Self::Or => write!(f, "OR"),
            Self::Not => write!(f, "NOT"),
        }
    }
}

/// Built-in condition functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FunctionName {
    /// `attribute_exists(path)`
    AttributeExists,
    /// `attribute_not_exists(path)`
    AttributeNotExists,
    /// `attribute_type(path, type)`
    AttributeType,
    /// `begins_with(path, substr)`
    BeginsWith,
    /// `contains(path, operand)`
    Contains,
}

impl fmt::Display for FunctionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AttributeExists => write!(f, "attribute_exists"),
            Self::AttributeNotExists => write!(f, "attribute_not_exists"),
            Self::AttributeType => write!(f, "attribute_type"),
            Self::BeginsWith => write!(f, "begins_with"),
            Self::Contains => write!(f, "contains"),
        }
    }
}

/// An operand whose placeholder is resolved at compile time.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A document path such as `info.rating` or `tags[0]`.
    Path(String),
    /// A literal value.
    Value(AttributeValue),
    /// `size(operand)`.
    Size(Box<Operand>),
}

impl Operand {
    /// Path operand.
    #[must_use]
    pub fn path(path: impl Into<String>) -> Self {
        Self::Path(path.into())
    }

    /// Literal value operand.
    #[must_use]
    pub fn value(value: impl Into<AttributeValue>) -> Self {
        Self::Value(value.into())
    }

    /// `size(path)` operand.
    #[must_use]
    pub fn size(path: impl Into<String>) -> Self {
        Self::Size(Box::new(Self::Path(path.into())))
    }

    fn compile(&self, attrs: &mut ExpressionAttributes) -> String {
        match self {
            Self::Path(path) => attrs.add_path(path),
            Self::Value(value) => attrs.add_value(value.clone()),
            Self::Size(inner) => format!("size({})", inner.compile(attrs)),
        }
    }
}

/// Conversion for the left-hand side of a comparison: text means a path.
pub trait IntoPathOperand {
    /// Convert into an operand, treating plain text as an attribute path.
    fn into_path_operand(self) -> Operand;
}

impl IntoPathOperand for Operand {
    fn into_path_operand(self) -> Operand {
        self
    }
}

impl IntoPathOperand for &str {
    fn into_path_operand(self) -> Operand {
        Operand::Path(self.to_owned())
    }
}

impl IntoPathOperand for String {
    fn into_path_operand(self) -> Operand {
        Operand::Path(self)
    }
}

impl IntoPathOperand for &String {
    fn into_path_operand(self) -> Operand {
        Operand::Path(self.clone())
    }
}

/// Conversion for the right-hand side of a comparison: anything convertible to
/// an [`AttributeValue`] means a literal.
pub trait IntoValueOperand {
    /// Convert into an operand, treating plain data as a literal value.
    fn into_value_operand(self) -> Operand;
}

impl IntoValueOperand for Operand {
    fn into_value_operand(self) -> Operand {
        self
    }
}

macro_rules! impl_value_operand {
    ($($t:ty),*) => {
        $(
            impl IntoValueOperand for $t {
                fn into_value_operand(self) -> Operand {
                    Operand::Value(AttributeValue::from(self))
                }
            }
        )*
    };
}

impl_value_operand!(
    AttributeValue,
    &str,
    String,
    bool,
    bytes::Bytes,
    serde_json::Value,
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    u64,
    usize,
    f32,
    f64
);

/// A boolean condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `left op right`.
    Compare {
        /// Comparison operator.
        op: CompareOp,
        /// Left-hand operand.
        left: Operand,
        /// Right-hand operand.
        right: Operand,
    },
    /// `value BETWEEN low AND high`.
    Between {
        /// Value to test.
        value: Operand,
        /// Lower bound (inclusive).
        low: Operand,
        /// Upper bound (inclusive).
        high: Operand,
    },
    /// `value IN (list...)`.
    In {
        /// Value to search for.
        value: Operand,
        /// Candidate values.
        list: Vec<Operand>,
    },
    /// `function(args...)`.
    Function {
        /// Function name.
        name: FunctionName,
        /// Function arguments.
        args: Vec<Operand>,
    },
    /// AND / OR / NOT over child conditions.
    Logical(LogicalNode),
}

/// A logical operator and its children.
///
/// Only built through [`Condition::logical`] and the helpers around it, so
/// the child count always matches the operator.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalNode {
    op: LogicalOp,
    children: Vec<Condition>,
}

impl LogicalNode {
    /// Logical operator.
    #[must_use]
    pub fn op(&self) -> LogicalOp {
        self.op
    }

    /// Child conditions, in order.
    #[must_use]
    pub fn children(&self) -> &[Condition] {
        &self.children
    }
}

impl Condition {
    fn compare(op: CompareOp, left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::Compare {
            op,
            left: left.into_path_operand(),
            right: right.into_value_operand(),
        }
    }

    /// `left = right`
    pub fn eq(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Eq, left, right)
    }

    /// `left <> right`
    pub fn ne(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Ne, left, right)
    }

    /// `left < right`
    pub fn lt(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Lt, left, right)
    }

    /// `left <= right`
    pub fn le(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Le, left, right)
    }

    /// `left > right`
    pub fn gt(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Gt, left, right)
    }

    /// `left >= right`
    pub fn ge(left: impl IntoPathOperand, right: impl IntoValueOperand) -> Self {
        Self::compare(CompareOp::Ge, left, right)
    }

    /// `value BETWEEN low AND high`
    pub fn between(
        value: impl IntoPathOperand,
        low: impl IntoValueOperand,
        high: impl IntoValueOperand,
    ) -> Self {
        Self::Between {
            value: value.into_path_operand(),
            low: low.into_value_operand(),
            high: high.into_value_operand(),
        }
    }

    /// `value IN (a, b, ...)`
    pub fn in_list<I, V>(value: impl IntoPathOperand, list: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: IntoValueOperand,
    {
        Self::In {
            value: value.into_path_operand(),
            list: list.into_iter().map(IntoValueOperand::into_value_operand).collect(),
        }
    }

    /// `begins_with(path, prefix)`
    pub fn begins_with(path: impl IntoPathOperand, prefix: impl IntoValueOperand) -> Self {
        Self::Function {
            name: FunctionName::BeginsWith,
            args: vec![path.into_path_operand(), prefix.into_value_operand()],
        }
    }

    /// `contains(path, operand)`
    pub fn contains(path: impl IntoPathOperand, operand: impl IntoValueOperand) -> Self {
        Self::Function {
            name: FunctionName::Contains,
            args: vec![path.into_path_operand(), operand.into_value_operand()],
        }
    }

    /// `attribute_type(path, type)` where `type` is a descriptor such as `S`
    /// or `SS`.
    pub fn attribute_type(path: impl IntoPathOperand, type_descriptor: &str) -> Self {
        Self::Function {
            name: FunctionName::AttributeType,
            args: vec![
                path.into_path_operand(),
                Operand::Value(AttributeValue::S(type_descriptor.to_owned())),
            ],
        }
    }

    /// `attribute_exists(path)`
    pub fn exists(path: impl IntoPathOperand) -> Self {
        Self::Function {
            name: FunctionName::AttributeExists,
            args: vec![path.into_path_operand()],
        }
    }

    /// `attribute_not_exists(path)`
    pub fn not_exists(path: impl IntoPathOperand) -> Self {
        Self::Function {
            name: FunctionName::AttributeNotExists,
            args: vec![path.into_path_operand()],
        }
    }

    /// Build a logical node, checking the child count for `op`.
    ///
    /// # Errors
    ///
    /// Returns [`ExpressionError::InvalidChildCount`] when AND/OR receive fewer
    /// than two children or NOT does not receive exactly one.
    pub fn logical(op: LogicalOp, children: Vec<Condition>) -> Result<Self, ExpressionError> {
        let valid = match op {
            LogicalOp::And | LogicalOp::Or => children.len() >= 2,
            LogicalOp::Not => children.len() == 1,
        };
        if !valid {
            return Err(ExpressionError::InvalidChildCount {
                op,
                expected: if op == LogicalOp::Not { "exactly 1" } else { "at least 2" },
                actual: children.len(),
            });
        }
        Ok(Self::Logical(LogicalNode { op, children }))
    }

    /// AND over two or more conditions.
    ///
    /// # Errors
    ///
    /// Fails with fewer than two children.
    pub fn and(children: Vec<Condition>) -> Result<Self, ExpressionError> {
        Self::logical(LogicalOp::And, children)
    }

    /// OR over two or more conditions.
    ///
    /// # Errors
    ///
    /// Fails with fewer than two children.
    pub fn or(children: Vec<Condition>) -> Result<Self, ExpressionError> {
        Self::logical(LogicalOp::Or, children)
    }

    /// NOT over one condition.
    #[must_use]
    pub fn not(child: Condition) -> Self {
        Self::Logical(LogicalNode {
            op: LogicalOp::Not,
            children: vec![child],
        })
    }

    /// OR over exactly two conditions.
    pub(crate) fn either(left: Condition, right: Condition) -> Self {
        Self::Logical(LogicalNode {
            op: LogicalOp::Or,
            children: vec![left, right],
        })
    }

    /// Combine accumulated conditions: `None` for none, the condition itself
    /// for one, an AND node otherwise.
    #[must_use]
    pub fn all(mut conditions: Vec<Condition>) -> Option<Self> {
        match conditions.len() {
            0 => None,
            1 => conditions.pop(),
            _ => Some(Self::Logical(LogicalNode {
                op: LogicalOp::And,
                children: conditions,
            })),
        }
    }

    fn is_logical(&self) -> bool {
        matches!(self, Self::Logical(_))
    }

    /// Compile to condition-expression text, registering placeholders in
    /// `attrs` depth-first, left to right.
    pub fn compile(&self, attrs: &mut ExpressionAttributes) -> String {
        match self {
            Self::Compare { op, left, right } => {
                let left = left.compile(attrs);
                let right = right.compile(attrs);
                format!("{left} {op} {right}")
            }
            Self::Between { value, low, high } => {
                let value = value.compile(attrs);
                let low = low.compile(attrs);
                let high = high.compile(attrs);
                format!("{value} BETWEEN {low} AND {high}")
            }
            Self::In { value, list } => {
                let value = value.compile(attrs);
                let list: Vec<String> = list.iter().map(|item| item.compile(attrs)).collect();
                format!("{value} IN ({})", list.join(", "))
            }
            Self::Function { name, args } => {
                let args: Vec<String> = args.iter().map(|arg| arg.compile(attrs)).collect();
                format!("{name}({})", args.join(", "))
            }
            Self::Logical(LogicalNode { op, children }) => {
                if let (LogicalOp::Not, [child]) = (op, children.as_slice()) {
                    return format!("NOT ({})", child.compile(attrs));
                }
                let parts: Vec<String> = children
                    .iter()
                    .map(|child| {
                        let text = child.compile(attrs);
                        if child.is_logical() {
                            format!("({text})")
                        } else {
                            text
                        }
                    })
                    .collect();
                parts.join(&format!(" {op} "))
            }
        }
    }
}
