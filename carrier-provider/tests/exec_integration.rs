//! Exec handlers end to end: a shell script resolved through the provider.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;

use carrier_provider::model::{CreateRequest, DeleteRequest, HandlerDescriptor, PropertyBag, ReadRequest};
use carrier_provider::{DynamicProvider, ProviderConfig, ProviderError};
use serde_json::json;

const SCRIPT: &str = r#"#!/bin/sh
case "$1" in
  describe)
    echo '{"operations": ["create", "delete"]}'
    ;;
  create)
    cat > /dev/null
    echo "{\"id\": \"bkt-$BUCKET_REGION\", \"outs\": {\"region\": \"$BUCKET_REGION\"}}"
    ;;
  delete)
    cat > /dev/null
    echo "bucket is not empty" >&2
    exit 3
    ;;
  *)
    exit 64
    ;;
esac
"#;

#[tokio::test]
async fn test_exec_handler_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bucket.sh");
    std::fs::write(&path, SCRIPT).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let provider = DynamicProvider::builder()
        .config(ProviderConfig::default().allow_exec(Some(dir.path().to_path_buf())))
        .build();

    let mut descriptor = HandlerDescriptor::exec("bucket.sh");
    if let HandlerDescriptor::Exec { env, .. } = &mut descriptor {
        env.insert("BUCKET_REGION".to_string(), "eu-west-1".to_string());
    }
    let text = descriptor.encode().unwrap();
    let inputs = PropertyBag::from_iter([("name", json!("logs"))]).with_handler(&text);

    let created = provider
        .create(CreateRequest { urn: "urn1".into(), inputs })
        .await
        .unwrap();
    assert_eq!(created.id, "bkt-eu-west-1");
    assert_eq!(created.outs.get("region"), Some(&json!("eu-west-1")));
    assert_eq!(created.outs.handler_text().unwrap(), text);

    // Not described, so read falls back to echoing props.
    let read = provider
        .read(ReadRequest { id: created.id.clone(), urn: "urn1".into(), props: Some(created.outs.clone()) })
        .await
        .unwrap();
    assert_eq!(read.props, created.outs);

    let err = provider
        .delete(DeleteRequest { id: created.id, urn: "urn1".into(), props: created.outs })
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Handler(_)));
    assert_eq!(err.to_string(), "bucket is not empty");

    assert_eq!(provider.cache().len(), 1);
}
