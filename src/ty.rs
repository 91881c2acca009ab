//! Declared field types. Scalars are matched exactly; `Union` and `Literal` are the
//! compound descriptors with their own membership tests.
use std::fmt;

use crate::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum Ty {
    Bool,
    Int,
    Float,
    Str,
    /// A registered model type, referenced by name.
    Model(String),
    Union(Union),
    Literal(Literal),
}

/// Accepts any value whose type is one of `members`.
#[derive(Debug, Clone, PartialEq)]
pub struct Union {
    pub members: Vec<Ty>,
    pub discriminator: Option<String>,
}

/// Accepts only values equal to one of `values`.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub values: Vec<Value>,
}

impl Ty {
    pub fn model(name: impl Into<String>) -> Self {
        Ty::Model(name.into())
    }

    /// Membership test. Null is never a member; nullability is a field concern.
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Ty::Bool, Value::Bool(_)) => true,
            (Ty::Int, Value::Int(_)) => true,
            (Ty::Float, Value::Float(_)) => true,
            (Ty::Str, Value::Str(_)) => true,
            (Ty::Model(name), Value::Model(m)) => m.type_name() == name,
            (Ty::Union(u), v) => u.accepts(v),
            (Ty::Literal(l), v) => l.accepts(v),
            _ => false,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Ty::Literal(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&Union> {
        match self {
            Ty::Union(u) => Some(u),
            _ => None,
        }
    }
}

impl Union {
    pub fn of(members: impl IntoIterator<Item = Ty>) -> Self {
        Self { members: members.into_iter().collect(), discriminator: None }
    }

    pub fn discriminated_by(mut self, key: impl Into<String>) -> Self {
        self.discriminator = Some(key.into());
        self
    }

    pub fn accepts(&self, value: &Value) -> bool {
        self.members.iter().any(|member| member.accepts(value))
    }

    /// Names of the model members, in declaration order.
    pub fn model_members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().filter_map(|member| match member {
            Ty::Model(name) => Some(name.as_str()),
            _ => None,
        })
    }
}

impl Literal {
    pub fn of<V: Into<Value>>(values: impl IntoIterator<Item = V>) -> Self {
        Self { values: values.into_iter().map(Into::into).collect() }
    }

    pub fn accepts(&self, value: &Value) -> bool {
        !value.is_null() && self.values.iter().any(|allowed| allowed.loosely_equals(value))
    }
}

impl From<Union> for Ty {
    fn from(u: Union) -> Self {
        Ty::Union(u)
    }
}

impl From<Literal> for Ty {
    fn from(l: Literal) -> Self {
        Ty::Literal(l)
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Bool => f.write_str("bool"),
            Ty::Int => f.write_str("int"),
            Ty::Float => f.write_str("float"),
            Ty::Str => f.write_str("str"),
            Ty::Model(name) => f.write_str(name),
            Ty::Union(u) => write!(f, "{u}"),
            Ty::Literal(l) => write!(f, "{l}"),
        }
    }
}

impl fmt::Display for Union {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Union[")?;
        write_joined(f, &self.members)?;
        f.write_str("]")
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Literal[")?;
        write_joined(f, &self.values)?;
        f.write_str("]")
    }
}

pub(crate) fn write_joined<T: fmt::Display>(
    f: &mut fmt::Formatter<'_>,
    items: &[T],
) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_union_membership() {
        let u = Union::of([Ty::Int, Ty::Float]);
        assert!(u.accepts(&Value::Int(3)));
        assert!(u.accepts(&Value::from(3.0)));
        assert!(!u.accepts(&Value::from("3")));
        assert!(!u.accepts(&Value::Null));
    }

    #[test]
    fn literal_membership_is_by_value() {
        let l = Literal::of(["apple", "banana"]);
        assert!(l.accepts(&Value::from("apple")));
        assert!(l.accepts(&Value::from("banana")));
        assert!(!l.accepts(&Value::from("orange")));

        let one = Literal::of([1]);
        assert!(one.accepts(&Value::Int(1)));
        assert!(one.accepts(&Value::from(1.0)));
        assert!(!one.accepts(&Value::Bool(true)));
    }

    #[test]
    fn scalars_do_not_cross_match() {
        assert!(!Ty::Int.accepts(&Value::from(3.0)));
        assert!(!Ty::Float.accepts(&Value::Int(3)));
        assert!(!Ty::Int.accepts(&Value::Bool(true)));
    }

    #[test]
    fn display_names_compound_types() {
        assert_eq!(Ty::from(Union::of([Ty::Int, Ty::Float])).to_string(), "Union[int, float]");
        assert_eq!(
            Ty::from(Literal::of(["apple", "banana"])).to_string(),
            "Literal['apple', 'banana']"
        );
        assert_eq!(Ty::model("Fruit").to_string(), "Fruit");
    }

    #[test]
    fn union_lists_model_members_in_order() {
        let u = Union::of([Ty::model("B"), Ty::Int, Ty::model("A")]);
        assert_eq!(u.model_members().collect::<Vec<_>>(), vec!["B", "A"]);
    }
}
