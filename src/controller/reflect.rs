//! Capability probing for camera controllers.
//!
//! Controllers expose named members (fields, properties, methods) together with
//! their shapes. Callers that do not know the concrete controller type probe a
//! member, check its shape, and only then write. Every method has an "absent"
//! default, so an implementor lists just the members it actually has.

use glam::{Quat, Vec2, Vec3};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Quat(Quat),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Float,
    Vec2,
    Vec3,
    Quat,
}

impl Value {
    pub fn shape(&self) -> Shape {
        match self {
            Value::Float(_) => Shape::Float,
            Value::Vec2(_) => Shape::Vec2,
            Value::Vec3(_) => Shape::Vec3,
            Value::Quat(_) => Shape::Quat,
        }
    }

    /// Zero of a given shape (identity for rotations).
    pub fn zero(shape: Shape) -> Self {
        match shape {
            Shape::Float => Value::Float(0.0),
            Shape::Vec2 => Value::Vec2(Vec2::ZERO),
            Shape::Vec3 => Value::Vec3(Vec3::ZERO),
            Shape::Quat => Value::Quat(Quat::IDENTITY),
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_vec3(&self) -> Option<Vec3> {
        match self {
            Value::Vec3(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_quat(&self) -> Option<Quat> {
        match self {
            Value::Quat(q) => Some(*q),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyInfo {
    pub shape: Shape,
    pub writable: bool,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReflectError {
    #[error("no member named `{0}`")]
    NotFound(String),
    #[error("`{name}` expects {expected:?}, got {got:?}")]
    ShapeMismatch { name: String, expected: Shape, got: Shape },
    #[error("`{0}` is read-only")]
    ReadOnly(String),
    #[error("`{name}` rejected the value: {reason}")]
    Rejected { name: String, reason: String },
}

pub trait Introspect {
    /// Field names in declaration order.
    fn field_names(&self) -> Vec<String> {
        Vec::new()
    }

    fn field_shape(&self, _name: &str) -> Option<Shape> {
        None
    }

    fn set_field(&mut self, name: &str, _value: Value) -> Result<(), ReflectError> {
        Err(ReflectError::NotFound(name.to_string()))
    }

    fn property(&self, _name: &str) -> Option<PropertyInfo> {
        None
    }

    fn set_property(&mut self, name: &str, _value: Value) -> Result<(), ReflectError> {
        Err(ReflectError::NotFound(name.to_string()))
    }

    /// Parameter shapes of a method.
    fn method(&self, _name: &str) -> Option<Vec<Shape>> {
        None
    }

    fn invoke(&mut self, name: &str, _args: &[Value]) -> Result<(), ReflectError> {
        Err(ReflectError::NotFound(name.to_string()))
    }
}

/// Check a value against an expected shape.
pub fn expect_shape(name: &str, expected: Shape, value: &Value) -> Result<(), ReflectError> {
    if value.shape() == expected {
        Ok(())
    } else {
        Err(ReflectError::ShapeMismatch { name: name.to_string(), expected, got: value.shape() })
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Property {
    name: String,
    value: Value,
    writable: bool,
}

/// Data-driven [`Introspect`] for controllers whose layout is only known at runtime.
///
/// Declared methods do nothing on their own; invocations are recorded in order so
/// the owner can replay them against its real state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    fields: Vec<(String, Value)>,
    properties: Vec<Property>,
    methods: Vec<(String, Vec<Shape>)>,
    calls: Vec<(String, Vec<Value>)>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.push((name.to_string(), value));
        self
    }

    pub fn with_property(mut self, name: &str, value: Value, writable: bool) -> Self {
        self.properties.push(Property { name: name.to_string(), value, writable });
        self
    }

    pub fn with_method(mut self, name: &str, params: &[Shape]) -> Self {
        self.methods.push((name.to_string(), params.to_vec()));
        self
    }

    pub fn field(&self, name: &str) -> Option<Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| *v)
    }

    pub fn property_value(&self, name: &str) -> Option<Value> {
        self.properties.iter().find(|p| p.name == name).map(|p| p.value)
    }

    pub fn calls(&self) -> &[(String, Vec<Value>)] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<(String, Vec<Value>)> {
        std::mem::take(&mut self.calls)
    }
}

impl Introspect for PropertyBag {
    fn field_names(&self) -> Vec<String> {
        self.fields.iter().map(|(n, _)| n.clone()).collect()
    }

    fn field_shape(&self, name: &str) -> Option<Shape> {
        self.field(name).map(|v| v.shape())
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        let slot = self
            .fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .ok_or_else(|| ReflectError::NotFound(name.to_string()))?;
        expect_shape(name, slot.1.shape(), &value)?;
        slot.1 = value;
        Ok(())
    }

    fn property(&self, name: &str) -> Option<PropertyInfo> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| PropertyInfo { shape: p.value.shape(), writable: p.writable })
    }

    fn set_property(&mut self, name: &str, value: Value) -> Result<(), ReflectError> {
        let prop = self
            .properties
            .iter_mut()
            .find(|p| p.name == name)
            .ok_or_else(|| ReflectError::NotFound(name.to_string()))?;
        if !prop.writable {
            return Err(ReflectError::ReadOnly(name.to_string()));
        }
        expect_shape(name, prop.value.shape(), &value)?;
        prop.value = value;
        Ok(())
    }

    fn method(&self, name: &str) -> Option<Vec<Shape>> {
        self.methods.iter().find(|(n, _)| n == name).map(|(_, p)| p.clone())
    }

    fn invoke(&mut self, name: &str, args: &[Value]) -> Result<(), ReflectError> {
        let params = self.method(name).ok_or_else(|| ReflectError::NotFound(name.to_string()))?;
        if params.len() != args.len() {
            return Err(ReflectError::Rejected {
                name: name.to_string(),
                reason: format!("expected {} arguments, got {}", params.len(), args.len()),
            });
        }
        for (shape, arg) in params.iter().zip(args) {
            expect_shape(name, *shape, arg)?;
        }
        self.calls.push((name.to_string(), args.to_vec()));
        Ok(())
    }
}
