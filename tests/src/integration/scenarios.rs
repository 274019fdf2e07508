//! # Request/Response Scenarios
//!
//! Byte-exact exchanges over real sockets plus LIFO ordering across
//! independent connections.

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::Shutdown;

    use stack_service::{PopReply, PushReply, ServiceConfig, StackError};

    use crate::integration::{client, start};

    fn exchange(server: &stack_service::ServerHandle, request: &[u8]) -> Vec<u8> {
        let mut stream = client(server).connect().unwrap();
        stream.write_all(request).unwrap();
        let mut reply = Vec::new();
        stream.read_to_end(&mut reply).unwrap();
        reply
    }

    #[test]
    fn test_push_hi_then_pop_hi_on_the_wire() {
        let server = start(ServiceConfig::for_testing());

        assert_eq!(exchange(&server, &[0x02, b'h', b'i']), vec![0x00]);
        assert_eq!(exchange(&server, &[0x80]), vec![0x02, b'h', b'i']);
        assert_eq!(server.snapshot().stack_size, 0);
    }

    #[test]
    fn test_pop_ignores_length_bits() {
        let server = start(ServiceConfig::for_testing());
        exchange(&server, &[0x01, b'q']);
        assert_eq!(exchange(&server, &[0xFF]), vec![0x01, b'q']);
    }

    #[test]
    fn test_lifo_order() {
        let server = start(ServiceConfig::for_testing());
        let client = client(&server);

        for payload in [b"A", b"B", b"C"] {
            assert_eq!(client.push(payload).unwrap(), PushReply::Accepted);
        }

        let popped: Vec<Vec<u8>> = (0..3)
            .map(|_| client.pop().unwrap().into_message().unwrap().into_bytes())
            .collect();
        assert_eq!(popped, vec![b"C".to_vec(), b"B".to_vec(), b"A".to_vec()]);
    }

    #[test]
    fn test_max_and_empty_payloads() {
        let server = start(ServiceConfig::for_testing());
        let client = client(&server);
        let largest = vec![0xAB; 127];

        client.push(&[]).unwrap();
        client.push(&largest).unwrap();

        assert_eq!(
            client.pop().unwrap().into_message().unwrap().as_bytes(),
            &largest[..]
        );
        match client.pop().unwrap() {
            PopReply::Message(message) => assert!(message.is_empty()),
            PopReply::Busy => panic!("unexpected busy"),
        }
    }

    #[test]
    fn test_oversized_payload_rejected_before_connecting() {
        let server = start(ServiceConfig::for_testing());
        let err = client(&server).push(&[0u8; 128]).unwrap_err();
        assert!(matches!(err, StackError::PayloadTooLarge { len: 128, .. }));
        assert_eq!(server.snapshot().active_connections, 0);
    }

    #[test]
    fn test_short_payload_is_dropped_without_store_mutation() {
        let server = start(ServiceConfig::for_testing());

        let mut stream = client(&server).connect().unwrap();
        stream.write_all(&[0x05, b'a', b'b']).unwrap();
        stream.shutdown(Shutdown::Write).unwrap();
        let mut reply = Vec::new();
        let _ = stream.read_to_end(&mut reply);

        assert!(reply.is_empty());
        assert_eq!(server.snapshot().stack_size, 0);
    }

    #[test]
    fn test_connect_and_close_without_header() {
        let server = start(ServiceConfig::for_testing());
        drop(client(&server).connect().unwrap());

        // The server keeps serving.
        assert_eq!(client(&server).push(b"ok").unwrap(), PushReply::Accepted);
    }
}
