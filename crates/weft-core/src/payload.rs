use std::any::{Any, TypeId};

use crate::error::{Result, WeftError};

/// Runtime type descriptor for step inputs and outputs.
///
/// Steps are registered with explicit type parameters, so every descriptor
/// is resolved at construction and validated once during lowering — there is
/// no reflection at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeDesc {
    id: TypeId,
    name: &'static str,
}

impl TypeDesc {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `value` is an instance of the described type.
    pub fn describes(&self, value: &dyn Value) -> bool {
        value.as_any().type_id() == self.id
    }
}

impl std::fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Object-safe contract for values travelling through a graph.
///
/// Blanket-implemented for every `T: Any + Send + Clone + PartialEq`.
/// Cloning powers multi-edge fan-out; equality powers the epsilon
/// progress check.
pub trait Value: Any + Send {
    fn clone_value(&self) -> Box<dyn Value>;
    fn value_eq(&self, other: &dyn Value) -> bool;
    fn type_name(&self) -> &'static str;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T> Value for T
where
    T: Any + Send + Clone + PartialEq,
{
    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn value_eq(&self, other: &dyn Value) -> bool {
        other.as_any().downcast_ref::<T>().is_some_and(|o| o == self)
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

impl std::fmt::Debug for dyn Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Value").field(&self.type_name()).finish()
    }
}

impl Clone for Box<dyn Value> {
    fn clone(&self) -> Self {
        self.clone_value()
    }
}

/// A runtime-checked pair of a declared type and a value.
///
/// Payloads only exist inside a lowered graph; they let one interpreter loop
/// carry heterogeneously-typed node outputs. The invariant — the value is an
/// instance of the declared type — is checked eagerly at construction,
/// never at first use.
#[derive(Clone)]
pub struct StepPayload {
    ty: TypeDesc,
    value: Box<dyn Value>,
}

impl StepPayload {
    /// Wrap a value, deriving the declared type from `T`.
    pub fn new<T: Value>(value: T) -> Self {
        Self {
            ty: TypeDesc::of::<T>(),
            value: Box::new(value),
        }
    }

    /// Wrap an erased value under an explicit declared type.
    ///
    /// Fails immediately if the value is not an instance of `ty`.
    pub fn with_type(ty: TypeDesc, value: Box<dyn Value>) -> Result<Self> {
        if !ty.describes(value.as_ref()) {
            return Err(WeftError::PayloadType {
                declared: ty.name().to_string(),
                actual: value.type_name().to_string(),
            });
        }
        Ok(Self { ty, value })
    }

    pub fn type_desc(&self) -> TypeDesc {
        self.ty
    }

    pub fn value(&self) -> &dyn Value {
        self.value.as_ref()
    }

    /// Consume the payload, dropping the type tag.
    pub fn into_value(self) -> Box<dyn Value> {
        self.value
    }

    /// Recover the concrete value.
    pub fn downcast<T: Value>(self) -> Result<T> {
        let declared = self.ty.name().to_string();
        self.value
            .into_any()
            .downcast::<T>()
            .map(|v| *v)
            .map_err(|_| WeftError::PayloadType {
                declared,
                actual: std::any::type_name::<T>().to_string(),
            })
    }

    pub fn downcast_ref<T: Value>(&self) -> Option<&T> {
        self.value.as_any().downcast_ref::<T>()
    }

    /// Value equality between two payloads (false across types).
    pub fn same_value(&self, other: &StepPayload) -> bool {
        self.value.value_eq(other.value.as_ref())
    }
}

impl std::fmt::Debug for StepPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepPayload").field("ty", &self.ty.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_desc_describes() {
        let desc = TypeDesc::of::<i64>();
        let value: Box<dyn Value> = Box::new(42i64);
        assert!(desc.describes(value.as_ref()));

        let other: Box<dyn Value> = Box::new("nope".to_string());
        assert!(!desc.describes(other.as_ref()));
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = StepPayload::new(7i64);
        assert_eq!(payload.type_desc(), TypeDesc::of::<i64>());
        assert_eq!(payload.downcast::<i64>().unwrap(), 7);
    }

    #[test]
    fn test_mismatched_payload_fails_at_construction() {
        let err = StepPayload::with_type(TypeDesc::of::<i64>(), Box::new("oops".to_string()))
            .unwrap_err();
        assert!(matches!(err, WeftError::PayloadType { .. }));
    }

    #[test]
    fn test_downcast_wrong_type() {
        let payload = StepPayload::new(7i64);
        assert!(payload.downcast::<String>().is_err());
    }

    #[test]
    fn test_same_value() {
        let a = StepPayload::new(3i64);
        let b = StepPayload::new(3i64);
        let c = StepPayload::new(4i64);
        let s = StepPayload::new("3".to_string());

        assert!(a.same_value(&b));
        assert!(!a.same_value(&c));
        assert!(!a.same_value(&s));
    }

    #[test]
    fn test_clone_is_independent() {
        let a = StepPayload::new(vec![1i32, 2, 3]);
        let b = a.clone();
        assert!(a.same_value(&b));
        assert_eq!(b.downcast::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
        assert_eq!(a.downcast::<Vec<i32>>().unwrap(), vec![1, 2, 3]);
    }
}
