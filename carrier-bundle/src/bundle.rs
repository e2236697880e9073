use std::fmt;
use std::sync::Arc;

use carrier_model::{
    CheckRequest, CheckResult, CreateRequest, CreateResult, DeleteRequest, DiffRequest, DiffResult,
    ReadRequest, ReadResult, UpdateRequest, UpdateResult,
};

use crate::{Op, Operation};

type Slot<Req, Resp> = Option<Arc<dyn Op<Req, Resp>>>;

/// A resolved, callable handler bundle.
///
/// Built with the `with_*` methods; every slot left empty falls back to the
/// provider's default behavior for that operation (or `NotImplemented` for
/// `create` and `update`).
///
/// ```ignore
/// let bundle = HandlerBundle::new()
///     .with_create(|req: CreateRequest| async move {
///         Ok::<_, HandlerError>(CreateResult { id: "42".into(), outs: req.inputs.without_handler() })
///     });
/// ```
#[derive(Clone, Default)]
pub struct HandlerBundle {
    check: Slot<CheckRequest, CheckResult>,
    diff: Slot<DiffRequest, DiffResult>,
    create: Slot<CreateRequest, CreateResult>,
    read: Slot<ReadRequest, ReadResult>,
    update: Slot<UpdateRequest, UpdateResult>,
    delete: Slot<DeleteRequest, ()>,
}

impl HandlerBundle {
    /// An empty bundle with no operations.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_check(mut self, op: impl Op<CheckRequest, CheckResult> + 'static) -> Self {
        self.check = Some(Arc::new(op));
        self
    }

    pub fn with_diff(mut self, op: impl Op<DiffRequest, DiffResult> + 'static) -> Self {
        self.diff = Some(Arc::new(op));
        self
    }

    pub fn with_create(mut self, op: impl Op<CreateRequest, CreateResult> + 'static) -> Self {
        self.create = Some(Arc::new(op));
        self
    }

    pub fn with_read(mut self, op: impl Op<ReadRequest, ReadResult> + 'static) -> Self {
        self.read = Some(Arc::new(op));
        self
    }

    pub fn with_update(mut self, op: impl Op<UpdateRequest, UpdateResult> + 'static) -> Self {
        self.update = Some(Arc::new(op));
        self
    }

    pub fn with_delete(mut self, op: impl Op<DeleteRequest, ()> + 'static) -> Self {
        self.delete = Some(Arc::new(op));
        self
    }

    // ==================== Slot access ====================

    pub fn check(&self) -> Option<&dyn Op<CheckRequest, CheckResult>> {
        self.check.as_deref()
    }

    pub fn diff(&self) -> Option<&dyn Op<DiffRequest, DiffResult>> {
        self.diff.as_deref()
    }

    pub fn create(&self) -> Option<&dyn Op<CreateRequest, CreateResult>> {
        self.create.as_deref()
    }

    pub fn read(&self) -> Option<&dyn Op<ReadRequest, ReadResult>> {
        self.read.as_deref()
    }

    pub fn update(&self) -> Option<&dyn Op<UpdateRequest, UpdateResult>> {
        self.update.as_deref()
    }

    pub fn delete(&self) -> Option<&dyn Op<DeleteRequest, ()>> {
        self.delete.as_deref()
    }

    /// Whether the slot for `op` is filled.
    pub fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::Check => self.check.is_some(),
            Operation::Diff => self.diff.is_some(),
            Operation::Create => self.create.is_some(),
            Operation::Read => self.read.is_some(),
            Operation::Update => self.update.is_some(),
            Operation::Delete => self.delete.is_some(),
        }
    }

    /// Filled slots, in lifecycle order.
    pub fn operations(&self) -> Vec<Operation> {
        Operation::ALL.into_iter().filter(|op| self.supports(*op)).collect()
    }
}

impl fmt::Debug for HandlerBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBundle")
            .field("operations", &self.operations())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::HandlerError;
    use carrier_model::PropertyBag;
    use serde_json::json;

    #[test]
    fn test_empty_bundle_supports_nothing() {
        let bundle = HandlerBundle::new();
        assert!(bundle.operations().is_empty());
        assert!(bundle.create().is_none());
    }

    #[test]
    fn test_operations_listed_in_lifecycle_order() {
        let bundle = HandlerBundle::new()
            .with_delete(|_req: DeleteRequest| async { Ok::<_, HandlerError>(()) })
            .with_create(|req: CreateRequest| async move {
                Ok::<_, HandlerError>(CreateResult { id: "1".into(), outs: req.inputs })
            });
        assert_eq!(bundle.operations(), vec![Operation::Create, Operation::Delete]);
        assert_eq!(format!("{:?}", bundle), "HandlerBundle { operations: [Create, Delete] }");
    }

    #[tokio::test]
    async fn test_closure_slot_is_callable() {
        let bundle = HandlerBundle::new().with_create(|req: CreateRequest| async move {
            if req.inputs.is_empty() {
                return Err(HandlerError::msg("no inputs"));
            }
            Ok(CreateResult { id: "42".into(), outs: req.inputs })
        });

        let op = bundle.create().unwrap();
        let inputs = PropertyBag::from_iter([("name", json!("foo"))]);
        let out = op
            .call(CreateRequest { urn: "urn1".into(), inputs: inputs.clone() })
            .await
            .unwrap();
        assert_eq!(out.id, "42");
        assert_eq!(out.outs, inputs);

        let err = op
            .call(CreateRequest { urn: "urn1".into(), inputs: PropertyBag::new() })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "no inputs");
    }
}
