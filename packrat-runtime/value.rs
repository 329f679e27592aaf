use std::fmt;

/// A result value produced by matching an operator.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Default)]
pub enum Value {
    #[default]
    Nil,
    Bool(bool),
    Int(i64),
    Char(char),
    Str(String),
    /// A `[start, end)` pair of byte offsets.
    Span(usize, usize),
    List(Vec<Value>),
    /// A named tree node, for actions that build syntax trees.
    Node(String, Vec<Value>),
}

impl Value {
    /// Semantic predicates treat `Nil` and `false` as failure.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn node(name: impl Into<String>, children: Vec<Value>) -> Value {
        Value::Node(name.into(), children)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Value {
        Value::Str(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Value {
        Value::Str(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Value {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Value {
        Value::Bool(b)
    }
}

impl From<char> for Value {
    fn from(c: char) -> Value {
        Value::Char(c)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Value {
        Value::List(items)
    }
}

fn write_list(fmt: &mut fmt::Formatter, items: &[Value]) -> fmt::Result {
    let mut iter = items.iter();
    if let Some(first) = iter.next() {
        write!(fmt, "{}", first)?;
        for item in iter {
            write!(fmt, ", {}", item)?;
        }
    }
    Ok(())
}

impl fmt::Display for Value {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(fmt, "nil"),
            Value::Bool(b) => write!(fmt, "{}", b),
            Value::Int(i) => write!(fmt, "{}", i),
            Value::Char(c) => write!(fmt, "{:?}", c),
            Value::Str(s) => write!(fmt, "{:?}", s),
            Value::Span(start, end) => write!(fmt, "{}..{}", start, end),
            Value::List(items) => {
                write!(fmt, "[")?;
                write_list(fmt, items)?;
                write!(fmt, "]")
            }
            Value::Node(name, children) => {
                write!(fmt, "{}(", name)?;
                write_list(fmt, children)?;
                write!(fmt, ")")
            }
        }
    }
}
