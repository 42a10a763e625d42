//! Descriptors of injection sites, attached to resolution errors to say where a dependency was
//! requested.

pub mod point;

pub use point::{
    Annotation, FieldDescriptor, InjectionPoint, MemberHandle, MemberKind, ParameterDescriptor,
};
