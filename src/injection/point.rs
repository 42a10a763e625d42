use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::registry::TypeKey;

/// Metadata attached to a field or parameter, supplied by whoever describes the member.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    kind: String,
    attributes: Map<String, Value>,
}

impl Annotation {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attributes: Map::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Method,
    Constructor,
}

/// Stable identity of a member: the declaring type plus the member's name and kind.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemberHandle {
    declaring_type: String,
    name: String,
    kind: MemberKind,
}

impl MemberHandle {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        kind: MemberKind,
    ) -> Self {
        Self {
            declaring_type: declaring_type.into(),
            name: name.into(),
            kind,
        }
    }

    pub fn field(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(declaring_type, name, MemberKind::Field)
    }

    pub fn method(declaring_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(declaring_type, name, MemberKind::Method)
    }

    pub fn constructor(declaring_type: impl Into<String>) -> Self {
        let declaring_type = declaring_type.into();
        let name = declaring_type.clone();
        Self::new(declaring_type, name, MemberKind::Constructor)
    }

    pub fn declaring_type(&self) -> &str {
        &self.declaring_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> MemberKind {
        self.kind
    }
}

#[derive(Clone, Debug)]
pub struct FieldDescriptor {
    member: MemberHandle,
    declared_type: TypeKey,
    annotations: Arc<[Annotation]>,
}

impl FieldDescriptor {
    pub fn new(
        declaring_type: impl Into<String>,
        name: impl Into<String>,
        declared_type: TypeKey,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            member: MemberHandle::field(declaring_type, name),
            declared_type,
            annotations: Arc::from(annotations),
        }
    }

    pub fn member(&self) -> &MemberHandle {
        &self.member
    }

    pub fn name(&self) -> &str {
        self.member.name()
    }
}

#[derive(Clone, Debug)]
pub struct ParameterDescriptor {
    member: MemberHandle,
    index: usize,
    declared_type: TypeKey,
    annotations: Arc<[Annotation]>,
    member_annotations: Arc<[Annotation]>,
}

impl ParameterDescriptor {
    pub fn new(
        member: MemberHandle,
        index: usize,
        declared_type: TypeKey,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            member,
            index,
            declared_type,
            annotations: Arc::from(annotations),
            member_annotations: Arc::from(Vec::new()),
        }
    }

    /// Annotations declared on the method or constructor itself.
    pub fn with_member_annotations(mut self, annotations: Vec<Annotation>) -> Self {
        self.member_annotations = Arc::from(annotations);
        self
    }

    pub fn member(&self) -> &MemberHandle {
        &self.member
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Where a value is being injected: a field or one parameter of a method or constructor.
///
/// Carries no resolution logic. Two points are equal iff they describe the same member (and,
/// for parameters, the same position); a field never equals a parameter.
#[derive(Clone, Debug)]
pub enum InjectionPoint {
    Field(FieldDescriptor),
    Parameter(ParameterDescriptor),
}

impl InjectionPoint {
    pub fn field(&self) -> Option<&FieldDescriptor> {
        match self {
            InjectionPoint::Field(field) => Some(field),
            InjectionPoint::Parameter(_) => None,
        }
    }

    pub fn parameter(&self) -> Option<&ParameterDescriptor> {
        match self {
            InjectionPoint::Field(_) => None,
            InjectionPoint::Parameter(parameter) => Some(parameter),
        }
    }

    /// Annotations on the field, or on the parameter itself.
    pub fn annotations(&self) -> &[Annotation] {
        match self {
            InjectionPoint::Field(field) => &field.annotations,
            InjectionPoint::Parameter(parameter) => &parameter.annotations,
        }
    }

    pub fn annotation(&self, kind: &str) -> Option<&Annotation> {
        self.annotations()
            .iter()
            .find(|annotation| annotation.kind() == kind)
    }

    /// Annotations on the enclosing element: the field, or the method/constructor declaring
    /// the parameter.
    pub fn element_annotations(&self) -> &[Annotation] {
        match self {
            InjectionPoint::Field(field) => &field.annotations,
            InjectionPoint::Parameter(parameter) => &parameter.member_annotations,
        }
    }

    pub fn declared_type(&self) -> TypeKey {
        match self {
            InjectionPoint::Field(field) => field.declared_type,
            InjectionPoint::Parameter(parameter) => parameter.declared_type,
        }
    }

    pub fn member(&self) -> &MemberHandle {
        match self {
            InjectionPoint::Field(field) => &field.member,
            InjectionPoint::Parameter(parameter) => &parameter.member,
        }
    }
}

impl From<FieldDescriptor> for InjectionPoint {
    fn from(field: FieldDescriptor) -> Self {
        InjectionPoint::Field(field)
    }
}

impl From<ParameterDescriptor> for InjectionPoint {
    fn from(parameter: ParameterDescriptor) -> Self {
        InjectionPoint::Parameter(parameter)
    }
}

impl PartialEq for InjectionPoint {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InjectionPoint::Field(a), InjectionPoint::Field(b)) => a.member == b.member,
            (InjectionPoint::Parameter(a), InjectionPoint::Parameter(b)) => {
                a.member == b.member && a.index == b.index
            }
            _ => false,
        }
    }
}

impl Eq for InjectionPoint {}

impl Hash for InjectionPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        self.member().hash(state);
        if let InjectionPoint::Parameter(parameter) = self {
            parameter.index.hash(state);
        }
    }
}

impl fmt::Display for InjectionPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectionPoint::Field(field) => write!(f, "field '{}'", field.name()),
            InjectionPoint::Parameter(parameter) => {
                let member = &parameter.member;
                match member.kind {
                    MemberKind::Constructor => write!(
                        f,
                        "parameter {} of constructor {}",
                        parameter.index, member.declaring_type
                    ),
                    _ => write!(
                        f,
                        "parameter {} of method {}::{}",
                        parameter.index, member.declaring_type, member.name
                    ),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashSet;

    fn repository_field(annotations: Vec<Annotation>) -> InjectionPoint {
        FieldDescriptor::new("OrderService", "repository", TypeKey::of::<String>(), annotations)
            .into()
    }

    #[test]
    fn equality_follows_the_wrapped_member() {
        let a = repository_field(vec![Annotation::new("autowired")]);
        let b = repository_field(Vec::new());
        assert_eq!(a, b);

        let constructor = MemberHandle::constructor("OrderService");
        let first: InjectionPoint =
            ParameterDescriptor::new(constructor.clone(), 0, TypeKey::of::<String>(), Vec::new())
                .into();
        let second: InjectionPoint =
            ParameterDescriptor::new(constructor, 1, TypeKey::of::<String>(), Vec::new()).into();
        assert_ne!(first, second);

        let set: HashSet<InjectionPoint> = [a.clone(), b, first.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn fields_never_equal_parameters() {
        let field = repository_field(Vec::new());
        let parameter: InjectionPoint = ParameterDescriptor::new(
            MemberHandle::new("OrderService", "repository", MemberKind::Field),
            0,
            TypeKey::of::<String>(),
            Vec::new(),
        )
        .into();
        assert_ne!(field, parameter);
    }

    #[test]
    fn annotation_lookup_by_kind() {
        let point = repository_field(vec![
            Annotation::new("autowired"),
            Annotation::new("qualifier").with_attribute("value", json!("primary")),
        ]);
        assert_eq!(point.annotations().len(), 2);
        let qualifier = point.annotation("qualifier").unwrap();
        assert_eq!(qualifier.attribute("value"), Some(&json!("primary")));
        assert!(point.annotation("lazy").is_none());
        assert_eq!(point.declared_type(), TypeKey::of::<String>());
        assert_eq!(point.member().kind(), MemberKind::Field);
    }

    #[test]
    fn parameter_exposes_member_level_annotations_separately() {
        let point: InjectionPoint = ParameterDescriptor::new(
            MemberHandle::method("OrderService", "set_repository"),
            0,
            TypeKey::of::<u32>(),
            vec![Annotation::new("qualifier")],
        )
        .with_member_annotations(vec![Annotation::new("autowired")])
        .into();
        assert_eq!(point.annotations()[0].kind(), "qualifier");
        assert_eq!(point.element_annotations()[0].kind(), "autowired");
        assert!(point.field().is_none());
        assert_eq!(point.parameter().map(ParameterDescriptor::index), Some(0));
    }

    #[test]
    fn display_names_the_location() {
        assert_eq!(repository_field(Vec::new()).to_string(), "field 'repository'");
        let point: InjectionPoint = ParameterDescriptor::new(
            MemberHandle::constructor("OrderService"),
            2,
            TypeKey::of::<u32>(),
            Vec::new(),
        )
        .into();
        assert_eq!(point.to_string(), "parameter 2 of constructor OrderService");
    }
}
