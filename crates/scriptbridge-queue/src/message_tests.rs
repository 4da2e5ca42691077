//! Tests for message types and domain identifiers.

use super::*;

#[test]
fn test_queue_name_validation() {
    assert!(QueueName::new("orders").is_ok());
    assert!(QueueName::new("orders-dead_letter").is_ok());

    assert!(QueueName::new("").is_err());
    assert!(QueueName::new("-orders").is_err());
    assert!(QueueName::new("orders-").is_err());
    assert!(QueueName::new("or--ders").is_err());
    assert!(QueueName::new("orders queue").is_err());
    assert!(QueueName::new("a".repeat(261)).is_err());
}

#[test]
fn test_session_id_validation() {
    assert!(SessionId::new("tenant-1").is_ok());
    assert!(SessionId::new("order/123").is_ok());

    assert!(SessionId::new("").is_err());
    assert!(SessionId::new("a".repeat(129)).is_err());
    assert!(SessionId::new("tab\there").is_err());
}

#[test]
fn test_identifiers_parse_from_str() {
    let queue: QueueName = "orders".parse().unwrap();
    assert_eq!(queue.as_str(), "orders");

    let session: SessionId = "tenant-1".parse().unwrap();
    assert_eq!(session.as_str(), "tenant-1");
}

#[test]
fn test_outbound_message_builders() {
    let message = OutboundMessage::new("payload")
        .with_content_type("application/json")
        .with_session_id(SessionId::new("tenant-1").unwrap())
        .with_property("origin", "test");

    assert_eq!(message.body.as_ref(), b"payload");
    assert_eq!(message.content_type.as_deref(), Some("application/json"));
    assert_eq!(message.session_id.unwrap().as_str(), "tenant-1");
    assert_eq!(message.properties.get("origin"), Some(&"test".to_string()));
}

#[test]
fn test_receipt_handle_carries_receiver_key() {
    let receipt = ReceiptHandle::new("abc-123", "orders::tenant-1");
    assert_eq!(receipt.handle(), "abc-123");
    assert_eq!(receipt.receiver_key(), "orders::tenant-1");
}
